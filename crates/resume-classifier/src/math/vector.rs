use std::fmt;

use serde::{Deserialize, Serialize};

/// Sparse vector of `f32` with strictly increasing indices and no stored zeros.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SparseVectorState", into = "SparseVectorState")]
pub struct SparseVector {
    dim: usize,
    indices: Vec<u32>,
    values: Vec<f32>,
}

#[derive(Serialize, Deserialize)]
struct SparseVectorState {
    dim: usize,
    indices: Vec<u32>,
    values: Vec<f32>,
}

impl From<SparseVector> for SparseVectorState {
    fn from(v: SparseVector) -> Self {
        Self {
            dim: v.dim,
            indices: v.indices,
            values: v.values,
        }
    }
}

impl TryFrom<SparseVectorState> for SparseVector {
    type Error = String;

    fn try_from(state: SparseVectorState) -> Result<Self, Self::Error> {
        if state.indices.len() != state.values.len() {
            return Err(format!(
                "sparse vector has {} indices but {} values",
                state.indices.len(),
                state.values.len()
            ));
        }
        if let Some(w) = state.indices.windows(2).find(|w| w[0] >= w[1]) {
            return Err(format!(
                "sparse vector indices must be strictly increasing, found {} before {}",
                w[0], w[1]
            ));
        }
        if let Some(&i) = state.indices.last() {
            if i as usize >= state.dim {
                return Err(format!(
                    "sparse vector index {} out of range for dim {}",
                    i, state.dim
                ));
            }
        }
        let mut out = Self {
            dim: state.dim,
            indices: state.indices,
            values: state.values,
        };
        out.prune_zeros();
        Ok(out)
    }
}

impl SparseVector {
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from unordered `(index, value)` pairs; duplicate indices are summed.
    ///
    /// Panics if an index is out of range for `dim`.
    pub fn from_pairs(dim: usize, mut pairs: Vec<(u32, f32)>) -> Self {
        pairs.sort_unstable_by_key(|&(i, _)| i);
        let mut indices: Vec<u32> = Vec::with_capacity(pairs.len());
        let mut values: Vec<f32> = Vec::with_capacity(pairs.len());
        for (i, v) in pairs {
            assert!((i as usize) < dim, "index {} out of range for dim {}", i, dim);
            if indices.last() == Some(&i) {
                if let Some(acc) = values.last_mut() {
                    *acc += v;
                }
            } else {
                indices.push(i);
                values.push(v);
            }
        }
        let mut out = Self {
            dim,
            indices,
            values,
        };
        out.prune_zeros();
        out
    }

    pub fn from_dense(dense: &[f32]) -> Self {
        let (indices, values) = dense
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v != 0.0)
            .map(|(i, &v)| (i as u32, v))
            .unzip();
        Self {
            dim: dense.len(),
            indices,
            values,
        }
    }

    fn prune_zeros(&mut self) {
        if self.values.iter().all(|&v| v != 0.0) {
            return;
        }
        let (indices, values) = self
            .indices
            .iter()
            .zip(self.values.iter())
            .filter(|&(_, &v)| v != 0.0)
            .map(|(&i, &v)| (i, v))
            .unzip();
        self.indices = indices;
        self.values = values;
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_zero(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.indices
            .iter()
            .zip(self.values.iter())
            .map(|(&i, &v)| (i as usize, v))
    }

    pub fn get(&self, index: usize) -> f32 {
        match self.indices.binary_search(&(index as u32)) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    pub fn to_dense(&self) -> Vec<f32> {
        let mut out = vec![0.0; self.dim];
        for (i, v) in self.iter() {
            out[i] = v;
        }
        out
    }

    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Scale to unit L2 norm in place. Zero vectors are left untouched.
    pub fn l2_normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for v in self.values.iter_mut() {
                *v /= norm;
            }
        }
    }

    /// Sparse-sparse dot product (merge over sorted indices).
    pub fn dot(&self, other: &SparseVector) -> f32 {
        assert_eq!(
            self.dim, other.dim,
            "Dot product requires equal length vectors"
        );
        let (mut a, mut b) = (0usize, 0usize);
        let mut sum = 0.0f32;
        while a < self.indices.len() && b < other.indices.len() {
            match self.indices[a].cmp(&other.indices[b]) {
                std::cmp::Ordering::Less => a += 1,
                std::cmp::Ordering::Greater => b += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.values[a] * other.values[b];
                    a += 1;
                    b += 1;
                }
            }
        }
        sum
    }

    /// Dot product against a dense buffer of the same dimension.
    pub fn dot_dense(&self, dense: &[f32]) -> f32 {
        debug_assert_eq!(self.dim, dense.len());
        self.iter().map(|(i, v)| v * dense[i]).sum()
    }
}

impl fmt::Display for SparseVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SparseVector(dim={}, {{", self.dim)?;
        for (n, (i, v)) in self.iter().enumerate() {
            write!(f, "{}: {}", i, v)?;
            if n + 1 != self.nnz() {
                write!(f, ", ")?;
            }
        }
        write!(f, "}})")
    }
}
