//! Integration tests for the TF-IDF vectorizer and the k-NN classifier working together.

use resume_classifier::config::{DistanceMetric, KnnConfig, StopWordSet, VectorizerConfig};
use resume_classifier::error::ClassifierError;
use resume_classifier::math::SparseVector;
use resume_classifier::models::{ClassifierModel, KNearestNeighbors};
use resume_classifier::text::TfidfVectorizer;

const TRAIN: [(&str, &str); 8] = [
    ("Python pandas numpy machine learning", "Data Science"),
    ("Deep learning with python and tensorflow", "Data Science"),
    ("Statistics, machine learning, python, SQL", "Data Science"),
    ("Data analysis in python and SQL", "Data Science"),
    ("Java Spring Boot microservices", "Java Developer"),
    ("Java, Hibernate, Spring MVC and REST", "Java Developer"),
    ("Core Java and Spring developer", "Java Developer"),
    ("J2EE Java developer with Spring", "Java Developer"),
];

fn fit() -> (TfidfVectorizer, KNearestNeighbors) {
    let texts: Vec<&str> = TRAIN.iter().map(|(t, _)| *t).collect();
    let labels: Vec<String> = TRAIN.iter().map(|(_, l)| l.to_string()).collect();
    let (vectorizer, x) =
        TfidfVectorizer::fit_transform(&VectorizerConfig::default(), &texts).unwrap();
    let mut knn = KNearestNeighbors::new(KnnConfig::default());
    knn.fit(&x, &labels).unwrap();
    (vectorizer, knn)
}

// ---------------------------------------------------------------------------
// Vectorizer
// ---------------------------------------------------------------------------

#[test]
fn vocabulary_comes_from_training_text_only() {
    let (vectorizer, _) = fit();
    assert!(vectorizer.term_index("python").is_some());
    assert!(vectorizer.term_index("spring").is_some());
    assert!(vectorizer.term_index("kubernetes").is_none());
    let v = vectorizer.transform_one("kubernetes helm terraform");
    assert!(v.is_zero());
    assert_eq!(v.dim(), vectorizer.vocabulary_size());
}

#[test]
fn stop_word_only_document_is_zero_vector() {
    let (vectorizer, _) = fit();
    assert!(vectorizer.transform_one("and the with of").is_zero());
    assert!(vectorizer.transform_one("").is_zero());
}

#[test]
fn disabling_stop_words_keeps_them() {
    let config = VectorizerConfig {
        min_doc_freq: 1,
        max_doc_freq: 1.0,
        stop_words: StopWordSet::None,
        ..VectorizerConfig::default()
    };
    let v = TfidfVectorizer::fit(&config, &["the python", "the java"]).unwrap();
    assert!(v.term_index("the").is_some());
}

#[test]
fn nonzero_rows_have_unit_norm() {
    let (vectorizer, _) = fit();
    for (text, _) in TRAIN {
        let row = vectorizer.transform_one(text);
        if !row.is_zero() {
            assert!((row.norm() - 1.0).abs() < 1e-5);
        }
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

#[test]
fn predicts_categories_of_new_text() {
    let (vectorizer, knn) = fit();
    let x = vectorizer.transform(&[
        "machine learning engineer, python and SQL",
        "spring boot java backend developer",
    ]);
    assert_eq!(
        knn.predict(&x).unwrap(),
        vec!["Data Science".to_string(), "Java Developer".to_string()]
    );
}

#[test]
fn zero_vector_still_predicts_a_known_label() {
    let (vectorizer, knn) = fit();
    let label = knn.predict_one(&vectorizer.transform_one("")).unwrap();
    assert!(knn.classes().contains(&label));
}

#[test]
fn neighbors_are_sorted_by_distance() {
    let (vectorizer, knn) = fit();
    let neighbors = knn.kneighbors(&vectorizer.transform_one("java spring")).unwrap();
    assert_eq!(neighbors.len(), 5);
    for pair in neighbors.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
    assert!(neighbors[0].index >= 4);
}

#[test]
fn wrong_dimension_is_rejected() {
    let (vectorizer, knn) = fit();
    let wrong = SparseVector::zeros(vectorizer.vocabulary_size() + 1);
    assert!(matches!(
        knn.predict(&[wrong]),
        Err(ClassifierError::DimensionMismatch { .. })
    ));
}

#[test]
fn euclidean_metric_agrees_on_unit_vectors() {
    let texts: Vec<&str> = TRAIN.iter().map(|(t, _)| *t).collect();
    let labels: Vec<String> = TRAIN.iter().map(|(_, l)| l.to_string()).collect();
    let (vectorizer, x) =
        TfidfVectorizer::fit_transform(&VectorizerConfig::default(), &texts).unwrap();

    let mut cosine = KNearestNeighbors::new(KnnConfig::default());
    cosine.fit(&x, &labels).unwrap();
    let mut euclid = KNearestNeighbors::new(KnnConfig {
        distance_metric: DistanceMetric::Euclidean,
        ..KnnConfig::default()
    });
    euclid.fit(&x, &labels).unwrap();

    let queries = vectorizer.transform(&["python sql statistics", "java hibernate rest"]);
    assert_eq!(cosine.predict(&queries).unwrap(), euclid.predict(&queries).unwrap());
}
