
use std::sync::Arc;
use termvec_trainer::corpus::TermPositions;
use termvec_trainer::permutation::Permutation;
use termvec_trainer::{Corpus, MemoryCorpus, PositionalMethod, RealVector, TermStore, TermWeighting, TrainConfig, TrainError, Trainer};

fn corpus(lines: &[&str]) -> MemoryCorpus {
    let docs = lines.iter()
    .map(|line| line.split(' ').map(|x| x.to_string()).collect())
    .collect();
    MemoryCorpus::from_documents("contents", docs)
}

fn config(method: PositionalMethod) -> TrainConfig {
    TrainConfig {
        dimension: 16,
        seed_length: 4,
        window_radius: 1,
        positional_method: method,
        num_threads: 1,
        seed: Some(42),
        ..TrainConfig::default()
    }
}

fn sum(a: &[f32], b: &[f32]) -> Vec<f32> {
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

#[test]
fn basic_window_sums_left_neighbours() {

    let trainer: Trainer<MemoryCorpus, RealVector> = Trainer::new(config(PositionalMethod::Basic), Arc::new(corpus(&["a b", "a b", "c a"]))).unwrap();
    let trained = trainer.train().unwrap();

    let el = |term: &str| trained.elemental.get(term).unwrap().values();
    let sem = |term: &str| trained.semantic.get(term).unwrap().values();

    // the half-open window [i - 1, i + 1) only reaches the left neighbour
    assert_eq!(sem("b"), sum(&el("a"), &el("a")));
    assert_eq!(sem("a"), el("c"));
    assert!(sem("c").iter().all(|x| *x == 0.0));
    assert_eq!(trained.documents_processed, 3);
}

#[test]
fn idf_weights_scale_neighbours() {

    let corpus = corpus(&["a b", "a b", "c a"]).with_weighting(TermWeighting::Idf);
    let trainer: Trainer<MemoryCorpus, RealVector> = Trainer::new(config(PositionalMethod::Basic), Arc::new(corpus)).unwrap();
    let trained = trainer.train().unwrap();

    let el = |term: &str| trained.elemental.get(term).unwrap().values();
    let sem = |term: &str| trained.semantic.get(term).unwrap().values();

    // "c" is in one of three documents
    let weight = 3f32.ln();
    let expected: Vec<f32> = el("c").iter().map(|x| x * weight).collect();
    assert!(sem("a").iter().zip(&expected).all(|(x, y)| (x - y).abs() < 1e-6));
    assert!(sem("a").iter().any(|x| *x != 0.0));

    // "a" is in every document, so it carries no weight
    assert!(sem("b").iter().all(|x| *x == 0.0));
}

#[test]
fn filtered_terms_get_no_vectors() {

    let corpus = corpus(&["a b", "a b", "c a"]).with_min_frequency(2);
    let trainer: Trainer<MemoryCorpus, RealVector> = Trainer::new(config(PositionalMethod::Basic), Arc::new(corpus)).unwrap();
    let trained = trainer.train().unwrap();

    let mut semantic = trained.semantic.keys();
    let mut elemental = trained.elemental.keys();
    semantic.sort();
    elemental.sort();
    assert_eq!(semantic, vec!["a", "b"]);
    assert_eq!(semantic, elemental);

    // "c" drops out of the reconstructed document, leaving "a" alone
    assert!(trained.semantic.get("a").unwrap().values().iter().all(|x| *x == 0.0));
}

#[test]
fn permutation_window_encodes_order() {

    let elemental: TermStore<RealVector> = TermStore::new();
    let a: Vec<f32> = (0..16).map(|i| i as f32).collect();
    let b: Vec<f32> = (0..16).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
    elemental.insert("a".to_string(), RealVector::from_values(&a));
    elemental.insert("b".to_string(), RealVector::from_values(&b));

    let config = TrainConfig { window_radius: 2, ..config(PositionalMethod::Permutation) };
    let trainer: Trainer<MemoryCorpus, RealVector> = Trainer::retrain(config, Arc::new(corpus(&["a b c"])), elemental, None).unwrap();
    let trained = trainer.train().unwrap();

    // reused elemental vectors are left as given
    assert_eq!(trained.elemental.get("a").unwrap().values(), a);

    let expected = sum(&Permutation::shift(16, -2).apply(&a), &Permutation::shift(16, -1).apply(&b));
    assert_eq!(trained.semantic.get("c").unwrap().values(), expected);

    // "b" sees "a" on its left and "c" on its right
    let c = trained.elemental.get("c").unwrap().values();
    let expected = sum(&Permutation::shift(16, -1).apply(&a), &Permutation::shift(16, 1).apply(&c));
    assert_eq!(trained.semantic.get("b").unwrap().values(), expected);
}

#[test]
fn embeddings_with_document_vectors() {

    let config = TrainConfig {
        negative_samples: 2,
        training_cycles: 1,
        num_threads: 2,
        train_document_vectors: true,
        ..config(PositionalMethod::Embeddings)
    };
    let corpus = corpus(&["the cat sat", "the dog sat", "a cat ran", "a dog ran", "the end"]);
    let trainer: Trainer<MemoryCorpus, RealVector> = Trainer::new(config, Arc::new(corpus)).unwrap();
    assert_eq!(trainer.config().seed_length, 16);

    let trained = trainer.train().unwrap();
    assert_eq!(trained.documents_processed, 10);

    for (_, vector) in trained.semantic.entries() {
        assert!(vector.values().iter().all(|x| x.is_finite()));
    }
    for (_, vector) in trained.elemental.entries() {
        assert!((vector.norm() - 1.0).abs() < 1e-4);
    }

    let documents = trained.documents.unwrap();
    let ids: Vec<&str> = documents.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["doc0", "doc1", "doc2", "doc3", "doc4"]);
    for (_, vector) in &documents {
        assert!((vector.norm() - 1.0).abs() < 1e-4);
    }
}

#[test]
fn proximity_returns_number_vectors() {

    let config = TrainConfig { num_threads: 3, training_cycles: 2, ..config(PositionalMethod::Proximity) };
    let lines: Vec<String> = (0..30).map(|i| format!("w{} x w{}", i % 4, (i + 1) % 5)).collect();
    let lines: Vec<&str> = lines.iter().map(|l| l.as_str()).collect();

    let trainer: Trainer<MemoryCorpus, RealVector> = Trainer::new(config, Arc::new(corpus(&lines))).unwrap();
    let trained = trainer.train().unwrap();

    // every document once per cycle, across all workers
    assert_eq!(trained.documents_processed, 90);
    let number_vectors = trained.number_vectors.unwrap();
    assert_eq!(number_vectors.len(), 4);
    for vector in &number_vectors {
        assert!((vector.norm() - 1.0).abs() < 1e-4);
    }
    assert!(trained.documents.is_none());
}

#[test]
fn subsampled_training_runs() {

    let config = TrainConfig { sampling_threshold: Some(0.01), subsample_in_window: true, window_radius: 2, ..config(PositionalMethod::Directional) };
    let trainer: Trainer<MemoryCorpus, RealVector> = Trainer::new(config, Arc::new(corpus(&["a a a a b", "a a c", "a d"]))).unwrap();
    let trained = trainer.train().unwrap();
    assert_eq!(trained.documents_processed, 3);
    assert_eq!(trained.semantic.len(), 4);
}

/// A corpus indexed without positions.
struct PositionlessCorpus(MemoryCorpus);

impl Corpus for PositionlessCorpus {
    fn num_docs(&self) -> usize { self.0.num_docs() }
    fn has_positions(&self) -> bool { false }
    fn terms(&self, field: &str) -> Vec<String> { self.0.terms(field) }
    fn term_vector(&self, doc_id: usize, field: &str) -> termvec_trainer::Result<Option<TermPositions>> {
        self.0.term_vector(doc_id, field)
    }
    fn global_term_frequency(&self, field: &str, term: &str) -> u64 { self.0.global_term_frequency(field, term) }
    fn global_term_weight(&self, field: &str, term: &str) -> f32 { self.0.global_term_weight(field, term) }
    fn term_passes_filter(&self, field: &str, term: &str) -> bool { self.0.term_passes_filter(field, term) }
    fn external_document_id(&self, doc_id: usize) -> String { self.0.external_document_id(doc_id) }
}

#[test]
fn missing_positions_is_fatal() {

    let result: Result<Trainer<PositionlessCorpus, RealVector>, TrainError> =
        Trainer::new(config(PositionalMethod::Basic), Arc::new(PositionlessCorpus(corpus(&["a b"]))));
    assert!(matches!(result, Err(TrainError::MissingPositions)));
}

#[test]
fn invalid_config_is_rejected() {

    let config = TrainConfig { seed_length: 32, ..config(PositionalMethod::Basic) };
    let result: Result<Trainer<MemoryCorpus, RealVector>, TrainError> = Trainer::new(config, Arc::new(corpus(&["a b"])));
    assert!(matches!(result, Err(TrainError::InvalidConfig { .. })));
}
