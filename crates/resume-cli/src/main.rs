use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use resume_cli::predict::inference;
use resume_cli::predict::input::PredictConfig;
use resume_cli::train::input::pipeline_config_from_arguments;
use resume_cli::train::trainer;
use resume_cli::util::exit_code;

fn main() {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("RESUME_SCREEN_LOG", "error,resume=info"))
        .init();

    let matches = Command::new("resume-screen")
        .version(clap::crate_version!())
        .about("\u{1F4C4} resume-screen - TF-IDF + k-NN resume category classifier")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Train a classifier from a labeled resume table and save its artifacts")
                .arg(
                    Arg::new("config")
                        .help("Path to a JSON training configuration file. Missing keys use defaults.")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("data")
                        .short('d')
                        .long("data")
                        .value_parser(clap::value_parser!(PathBuf))
                        .help(
                            "Path to the labeled resume table (*.csv or *.tsv). \
                             Overrides the data path in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_dir")
                        .short('o')
                        .long("output-dir")
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("Directory the model artifacts are written to.")
                        .value_hint(ValueHint::DirPath),
                )
                .arg(
                    Arg::new("k")
                        .long("k")
                        .value_parser(clap::value_parser!(usize))
                        .help("Number of neighbors that vote on a label."),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(clap::value_parser!(u64))
                        .help("Seed for the stratified train/test split."),
                )
                .arg(
                    Arg::new("test_fraction")
                        .long("test-fraction")
                        .value_parser(clap::value_parser!(f32))
                        .help("Fraction of each category held out for evaluation."),
                )
                .arg(
                    Arg::new("max_features")
                        .long("max-features")
                        .value_parser(clap::value_parser!(usize))
                        .help("Upper bound on the TF-IDF vocabulary size."),
                )
                .arg(
                    Arg::new("metric")
                        .long("metric")
                        .value_parser(["cosine", "euclidean"])
                        .help("Distance used by the neighbor search."),
                )
                .arg(
                    Arg::new("jobs")
                        .long("jobs")
                        .value_parser(clap::value_parser!(usize))
                        .help("Worker threads for prediction. Defaults to all cores."),
                )
                .arg(
                    Arg::new("print_config")
                        .long("print-config")
                        .help("Print the effective configuration as JSON and exit.")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("predict")
                .about("Label new resumes with a saved model")
                .arg(
                    Arg::new("model_dir")
                        .short('m')
                        .long("model-dir")
                        .help("Directory holding the artifacts written by `train`")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::DirPath),
                )
                .arg(
                    Arg::new("text")
                        .help("Resume text to classify. Repeat for several resumes.")
                        .num_args(1..)
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("file")
                        .short('f')
                        .long("file")
                        .help("File whose whole contents is one resume. May be repeated.")
                        .action(ArgAction::Append)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    let result = match matches.subcommand() {
        Some(("train", sub_m)) => handle_train(sub_m),
        Some(("predict", sub_m)) => handle_predict(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(exit_code(&e));
    }
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let config_path: Option<&PathBuf> = matches.get_one("config");
    match config_path {
        Some(path) => log::info!("[resume-screen::train] Training from config: {:?}", path),
        None => log::info!("[resume-screen::train] No config file provided; using defaults"),
    }

    let config = pipeline_config_from_arguments(config_path, matches)?;

    if matches.get_flag("print_config") {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let outcome = trainer::run_training(&config)?;
    print!("{}", trainer::render_summary(&outcome));
    Ok(())
}

fn handle_predict(matches: &ArgMatches) -> Result<()> {
    let params = PredictConfig::from_arguments(matches)?;
    let labels = inference::run_inference(&params)?;
    for label in labels {
        println!("{}", label);
    }
    Ok(())
}
