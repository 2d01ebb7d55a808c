
use serde::{Deserialize, Serialize};
use std::{fs::File, fmt::Display, io::BufReader, path::Path};
use tracing::{info, warn};
use crate::error::{Result, TrainError};

/// Different methods for encoding the position of a co-occurring term.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionalMethod {
    /// Bag-of-words superposition inside the sliding window.
    Basic,
    /// Permutes co-occurring vectors left or right of the focus term.
    Directional,
    /// Permutes co-occurring vectors by their offset from the focus term.
    Permutation,
    /// Superposition of basic and permuted vectors.
    PermutationPlusBasic,
    /// Binds co-occurring vectors to a number vector for their offset.
    Proximity,
    /// Skip-gram with negative sampling.
    Embeddings,
}

impl PositionalMethod {
    pub fn uses_shift_permutations(&self) -> bool {
        matches!(self, Self::Permutation | Self::PermutationPlusBasic)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorType {
    Real,
    Binary,
}

/// Hyper parameters for one training run. Built once, shared by reference.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub dimension: usize,
    pub seed_length: usize,
    pub window_radius: usize,
    pub positional_method: PositionalMethod,
    pub vector_type: VectorType,
    pub training_cycles: usize,
    pub num_threads: usize,
    pub negative_samples: usize,
    pub sampling_threshold: Option<f64>,
    pub subsample_in_window: bool,
    pub initial_learning_rate: f64,
    pub minimum_learning_rate: f64,
    pub contents_fields: Vec<String>,
    pub train_document_vectors: bool,
    pub queue_chunk_size: usize,
    pub seed: Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            dimension: 200,
            seed_length: 10,
            window_radius: 2,
            positional_method: PositionalMethod::Basic,
            vector_type: VectorType::Real,
            training_cycles: 0,
            num_threads: 4,
            negative_samples: 5,
            sampling_threshold: None,
            subsample_in_window: false,
            initial_learning_rate: 0.025,
            minimum_learning_rate: 0.0001,
            contents_fields: vec!["contents".to_string()],
            train_document_vectors: false,
            queue_chunk_size: 100000,
            seed: None,
        }
    }
}

impl Display for TrainConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "training hyper parameters:
        dimension: {},
        seed_length: {},
        window_radius: {},
        positional_method: {:?},
        vector_type: {:?},
        training_cycles: {},
        num_threads: {},
        negative_samples: {},
        sampling_threshold: {:?},
        subsample_in_window: {},
        learning_rate: {} -> {},
        contents_fields: {:?},
        train_document_vectors: {}",
        self.dimension, self.seed_length, self.window_radius, self.positional_method, self.vector_type,
        self.training_cycles, self.num_threads, self.negative_samples, self.sampling_threshold,
        self.subsample_in_window, self.initial_learning_rate, self.minimum_learning_rate,
        self.contents_fields, self.train_document_vectors
        )
    }
}

impl TrainConfig {

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let f = BufReader::new(File::open(path)?);
        let config: TrainConfig = serde_json::from_reader(f)?;
        config.validate()
    }

    /// Checks ranges and applies the adjustments each positional method needs.
    pub fn validate(mut self) -> Result<Self> {

        if self.dimension == 0 {
            return Err(TrainError::invalid_config("dimension must be positive"));
        }
        if self.window_radius == 0 {
            return Err(TrainError::invalid_config("window_radius must be positive"));
        }
        if self.num_threads == 0 {
            return Err(TrainError::invalid_config("num_threads must be positive"));
        }
        if self.queue_chunk_size == 0 {
            return Err(TrainError::invalid_config("queue_chunk_size must be positive"));
        }
        if self.contents_fields.is_empty() {
            return Err(TrainError::invalid_config("at least one contents field is required"));
        }
        if let Some(threshold) = self.sampling_threshold {
            if !(0.0..1.0).contains(&threshold) {
                return Err(TrainError::invalid_config(format!("sampling_threshold {} outside [0, 1)", threshold)));
            }
        }
        if self.minimum_learning_rate > self.initial_learning_rate {
            return Err(TrainError::invalid_config("minimum_learning_rate exceeds initial_learning_rate"));
        }

        if self.positional_method == PositionalMethod::Embeddings {
            // embedding weights start dense
            match self.vector_type {
                VectorType::Real => {
                    self.seed_length = self.dimension;
                    info!("setting seed_length = dimension ({}) to initialize embedding weights", self.dimension);
                }
                VectorType::Binary => warn!("binary vector embeddings are experimental"),
            }
        }

        if self.seed_length == 0 || self.seed_length > self.dimension {
            return Err(TrainError::invalid_config(format!(
                "seed_length {} must be within 1..={}", self.seed_length, self.dimension
            )));
        }

        Ok(self)
    }

    pub fn is_embeddings(&self) -> bool {
        self.positional_method == PositionalMethod::Embeddings
    }
}
