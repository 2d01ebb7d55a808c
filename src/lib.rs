pub mod config;
pub mod corpus;
pub mod embedding;
pub mod encoding;
pub mod error;
pub mod export;
pub mod permutation;
pub mod pipeline;
pub mod queue;
pub mod sampling;
pub mod sigmoid;
pub mod store;
pub mod trainer;
pub mod vectors;
pub mod window;

pub use config::{PositionalMethod, TrainConfig, VectorType};
pub use corpus::{Corpus, DocumentTerms, MemoryCorpus, TermOccurrences, TermPositions, TermWeighting};
pub use error::{Result, TrainError};
pub use pipeline::Pipeline;
pub use store::{DocumentStore, TermStore, VectorStore};
pub use trainer::{TrainedVectors, Trainer};
pub use vectors::{RealVector, Vector};
