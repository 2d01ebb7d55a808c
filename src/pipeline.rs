
use serde::Deserialize;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use crate::config::TrainConfig;
use crate::corpus::{Corpus, MemoryCorpus, TermWeighting};
use crate::error::{Result, TrainError};
use crate::export;
use crate::trainer::Trainer;
use crate::vectors::RealVector;

fn default_weighting() -> TermWeighting {
    TermWeighting::Uniform
}

/// Binary configuration: where the corpus lives, where vectors go, and the training parameters.
#[derive(Clone, Debug, Deserialize)]
pub struct PipelineConfig {
    pub corpus_file: String,
    pub output_dir: String,
    #[serde(default)]
    pub min_frequency: u64,
    #[serde(default = "default_weighting")]
    pub term_weighting: TermWeighting,
    #[serde(flatten)]
    pub train: TrainConfig,
}

impl Display for PipelineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "using hyper-params:
        corpus_file: {}
        output_dir: {}
        min_frequency: {}
        term_weighting: {:?}",
        self.corpus_file, self.output_dir, self.min_frequency, self.term_weighting
        )
    }
}

impl PipelineConfig {

    /// Expects the path of a json config as the single program argument.
    pub fn new(args: &[String]) -> Result<PipelineConfig> {
        match args {
            [_, path] => PipelineConfig::from_json_file(path),
            _ => Err(TrainError::invalid_config("usage: termvec_trainer <config.json>")),
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<PipelineConfig> {
        let f = BufReader::new(File::open(path)?);
        let mut config: PipelineConfig = serde_json::from_reader(f)?;
        config.train = config.train.validate()?;
        Ok(config)
    }
}

// a line is trimmed, lower cased and split on single spaces
fn parse_line(line: &str) -> Vec<String> {
    line.trim()
    .to_lowercase()
    .split(' ')
    .filter(|tok| !tok.is_empty())
    .map(|tok| tok.to_string())
    .collect()
}

/// Reads a plain-text corpus, one document per non-empty line, into `field`.
pub fn load_corpus(file_path: impl AsRef<Path>, field: &str) -> Result<MemoryCorpus> {

    let lines = BufReader::new(File::open(file_path)?).lines();
    let mut corpus = MemoryCorpus::new();
    let mut doc_count = 0;
    for line in lines {
        let tokens = parse_line(&line?);
        if tokens.is_empty() {
            continue;
        }
        corpus.push_document(&format!("doc{}", doc_count), vec![(field.to_string(), tokens)]);
        doc_count += 1;
    }
    Ok(corpus)
}

pub struct Pipeline {}

impl Pipeline {

    // runs the main procedure of 3 steps -
    // -> configuration of arguments
    // -> corpus loading
    // -> training and saving the vectors
    pub fn run(args: &[String]) -> Result<()> {

        info!("building parameters...");
        let params = PipelineConfig::new(args)?;
        info!("{}", params);

        let timer = Instant::now();
        let field = params.train.contents_fields[0].clone();
        if params.train.contents_fields.len() > 1 {
            warn!("plain text corpora fill a single field, training on {} only", field);
        }
        let train_config = TrainConfig { contents_fields: vec![field.clone()], ..params.train.clone() };

        let corpus = load_corpus(&params.corpus_file, &field)?
        .with_min_frequency(params.min_frequency)
        .with_weighting(params.term_weighting);
        info!("loaded corpus of {} documents, took {} seconds ...", corpus.num_docs(), timer.elapsed().as_secs());

        let timer = Instant::now();
        info!("starting training part...");
        let trainer: Trainer<MemoryCorpus, RealVector> = Trainer::new(train_config, Arc::new(corpus))?;
        let trained = trainer.train()?;
        info!("finished training, processed {} documents. Took {} seconds ...", trained.documents_processed, timer.elapsed().as_secs());

        let output_dir = Path::new(&params.output_dir);
        export::write_store(output_dir, "termvectors", &trained.semantic)?;
        export::write_store(output_dir, "elementalvectors", &trained.elemental)?;
        if let Some(documents) = &trained.documents {
            export::write_documents(output_dir, "docvectors", documents)?;
        }
        if let Some(number_vectors) = &trained.number_vectors {
            export::write_number_vectors(output_dir, "numbervectors", number_vectors)?;
        }

        info!("saved vectors to {}", params.output_dir);
        Ok(())
    }
}


#[cfg(test)]
mod tests {

    use std::fs;
    use super::{load_corpus, parse_line, Pipeline, PipelineConfig};
    use crate::config::PositionalMethod;
    use crate::corpus::{Corpus, TermWeighting};

    #[test]
    fn parse_line_test() {
        assert_eq!(parse_line("  Life IS  good \n"), vec!["life", "is", "good"]);
        assert!(parse_line("   ").is_empty());
    }

    #[test]
    fn load_corpus_test() {

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.txt");
        fs::write(&path, "life is good\n\nlife is\n").unwrap();

        let corpus = load_corpus(&path, "contents").unwrap();
        assert_eq!(corpus.num_docs(), 2);
        assert_eq!(corpus.global_term_frequency("contents", "life"), 2);
        assert_eq!(corpus.external_document_id(1), "doc1");
    }

    #[test]
    fn config_test() {

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"corpus_file": "c.txt", "output_dir": "out", "term_weighting": "idf",
            "dimension": 32, "positional_method": "permutation", "seed": 7}"#).unwrap();

        let config = PipelineConfig::new(&["bin".to_string(), path.display().to_string()]).unwrap();
        assert_eq!(config.min_frequency, 0);
        assert_eq!(config.term_weighting, TermWeighting::Idf);
        assert_eq!(config.train.dimension, 32);
        assert_eq!(config.train.positional_method, PositionalMethod::Permutation);
        assert_eq!(config.train.seed, Some(7));
        assert_eq!(config.train.window_radius, 2);

        assert!(PipelineConfig::new(&["bin".to_string()]).is_err());
    }

    #[test]
    fn run_test() {

        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus.txt");
        let output = dir.path().join("out");
        fs::write(&corpus, "life is good\nthe cat is on the mat\ngood cat\n").unwrap();

        let config = dir.path().join("config.json");
        fs::write(&config, serde_json::json!({
            "corpus_file": corpus.display().to_string(),
            "output_dir": output.display().to_string(),
            "dimension": 16,
            "seed_length": 4,
            "window_radius": 1,
            "positional_method": "proximity",
            "num_threads": 2,
            "seed": 11
        }).to_string()).unwrap();

        Pipeline::run(&["bin".to_string(), config.display().to_string()]).unwrap();

        for name in ["termvectors", "elementalvectors", "numbervectors"] {
            assert!(output.join(format!("{}.npy", name)).exists());
            assert!(output.join(format!("{}.json", name)).exists());
        }
        assert!(!output.join("docvectors.npy").exists());
    }
}
