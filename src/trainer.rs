
use rand::SeedableRng;
use rand::rngs::StdRng;
use parking_lot::Mutex;
use rayon::ThreadPoolBuilder;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;
use tracing::{error, info, warn};
use crate::config::TrainConfig;
use crate::corpus::Corpus;
use crate::embedding::{MAX_EXP, SIGMOID_TABLE_SIZE};
use crate::encoding::Encoding;
use crate::error::{Result, TrainError};
use crate::queue::DocumentQueue;
use crate::sampling::{SamplingTable, SubsamplingTable};
use crate::sigmoid::SigmoidTable;
use crate::store::{DocumentStore, TermStore};
use crate::vectors::Vector;
use crate::window::WindowProcessor;

const PROGRESS_INTERVAL: usize = 10000;
const EARLY_PROGRESS_INTERVAL: usize = 1000;

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// The learned stores, handed to whoever writes them out.
pub struct TrainedVectors<V> {
    pub semantic: TermStore<V>,
    pub elemental: TermStore<V>,
    /// Normalized document vectors keyed by external document id, in document order.
    pub documents: Option<Vec<(String, Arc<V>)>>,
    /// Proximity number vectors for numbers `1..=2 * radius + 2`.
    pub number_vectors: Option<Vec<V>>,
    pub documents_processed: usize,
}

/// Sliding-window term vector training over a corpus, one worker pool per cycle.
pub struct Trainer<C, V> {
    config: TrainConfig,
    corpus: Arc<C>,
    semantic: TermStore<V>,
    elemental: TermStore<V>,
    documents: Option<DocumentStore<V>>,
    encoding: Encoding<V>,
    subsampling: Option<SubsamplingTable>,
    sigmoid: SigmoidTable,
    retraining: bool,
    learning_rate: AtomicU64,
    processed: AtomicUsize,
}

impl<C: Corpus, V: Vector> Trainer<C, V> {

    /// Fresh random elemental vectors for every term that passes the corpus filter.
    pub fn new(config: TrainConfig, corpus: Arc<C>) -> Result<Trainer<C, V>> {
        Trainer::build(config, corpus, None, None)
    }

    /// Reuses elemental vectors from an earlier run. For embeddings, `semantic`
    /// carries the earlier input weights so training continues from them.
    pub fn retrain(config: TrainConfig, corpus: Arc<C>, elemental: TermStore<V>, semantic: Option<TermStore<V>>) -> Result<Trainer<C, V>> {
        info!("reusing elemental term vectors; number of terms: {}", elemental.len());
        Trainer::build(config, corpus, Some(elemental), semantic)
    }

    fn build(config: TrainConfig, corpus: Arc<C>, elemental: Option<TermStore<V>>, semantic: Option<TermStore<V>>) -> Result<Trainer<C, V>> {

        let config = config.validate()?;
        let stored_type = V::zero(config.dimension).vector_type();
        if config.vector_type != stored_type {
            return Err(TrainError::invalid_config(format!(
                "vector_type {:?} does not match the {:?} vectors being trained", config.vector_type, stored_type)));
        }
        if !corpus.has_positions() {
            return Err(TrainError::MissingPositions);
        }
        info!("{}", config);

        let mut rng = seeded_rng(config.seed);

        let retraining = elemental.is_some();
        let elemental = elemental.unwrap_or_default();
        let semantic = semantic.unwrap_or_default();
        let embeddings = config.is_embeddings();

        // allocate term vectors and, for embeddings, the negative sampling table
        let mut sampling = SamplingTable::new();
        let mut total_count: u64 = 0;
        let mut included = 0;
        for field in &config.contents_fields {
            for term in corpus.terms(field) {
                let frequency = corpus.global_term_frequency(field, &term);
                total_count += frequency;

                if !corpus.term_passes_filter(field, &term) {
                    continue;
                }
                included += 1;

                if !semantic.contains(term.as_str()) {
                    let vector = if embeddings {
                        V::random(config.dimension, config.seed_length, &mut rng)
                    } else {
                        V::zero(config.dimension)
                    };
                    semantic.insert(term.clone(), vector);
                }
                if embeddings {
                    sampling.push(&term, frequency);
                }
                // on retraining only terms the earlier run never saw need a new vector
                elemental.get_or_insert_with(term, || V::random(config.dimension, config.seed_length, &mut rng));
            }
        }

        let subsampling = match config.sampling_threshold {
            Some(threshold) => {
                info!("populating subsampling probabilities, total term count = {} ({} per document)",
                    total_count, total_count / corpus.num_docs().max(1) as u64);
                let mut table = SubsamplingTable::new();
                for field in &config.contents_fields {
                    for term in corpus.terms(field) {
                        if !semantic.contains(term.as_str()) {
                            continue;
                        }
                        table.push(field, &term, corpus.global_term_frequency(field, &term), total_count, threshold);
                    }
                }
                info!("selected {} terms for subsampling", table.len());
                Some(table)
            }
            None => None,
        };

        info!("there are now elemental term vectors for {} terms (and {} docs)", included, corpus.num_docs());

        let encoding = Encoding::build(&config, sampling, &mut rng)?;
        let documents = if embeddings && config.train_document_vectors {
            Some(DocumentStore::new())
        } else {
            None
        };
        let learning_rate = AtomicU64::new(config.initial_learning_rate.to_bits());

        Ok(Trainer {
            config,
            corpus,
            semantic,
            elemental,
            documents,
            encoding,
            subsampling,
            sigmoid: SigmoidTable::new(MAX_EXP, SIGMOID_TABLE_SIZE),
            retraining,
            learning_rate,
            processed: AtomicUsize::new(0),
        })
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn semantic_vectors(&self) -> &TermStore<V> {
        &self.semantic
    }

    pub fn elemental_vectors(&self) -> &TermStore<V> {
        &self.elemental
    }

    pub fn learning_rate(&self) -> f64 {
        f64::from_bits(self.learning_rate.load(Ordering::Relaxed))
    }

    /// Linear decay from the initial rate towards the floor over all cycles.
    fn update_learning_rate(&self) -> f64 {

        let total_cycles = self.config.training_cycles + 1;
        let planned = (total_cycles * self.corpus.num_docs()).max(1) as f64;
        let proportion = self.processed.load(Ordering::Relaxed) as f64 / planned;

        let initial = self.config.initial_learning_rate;
        let minimum = self.config.minimum_learning_rate;
        let rate = (initial - (initial - minimum) * proportion).max(minimum);

        self.learning_rate.store(rate.to_bits(), Ordering::Relaxed);
        rate
    }

    fn processor(&self) -> WindowProcessor<'_, C, V> {
        WindowProcessor {
            config: &self.config,
            corpus: self.corpus.as_ref(),
            semantic: &self.semantic,
            elemental: &self.elemental,
            documents: self.documents.as_ref(),
            encoding: &self.encoding,
            subsampling: self.subsampling.as_ref(),
            sigmoid: &self.sigmoid,
            processed: &self.processed,
        }
    }

    fn worker_rng(&self, cycle: usize, worker: usize) -> StdRng {
        let stream = (cycle * self.config.num_threads + worker + 1) as u64;
        seeded_rng(self.config.seed.map(|seed| seed.wrapping_add(stream)))
    }

    /// Draws and processes documents until the queue reports exhaustion.
    fn run_worker(&self, worker: usize, queue: &DocumentQueue<C>, mut rng: StdRng) -> Result<()> {

        let timer = Instant::now();
        let processor = self.processor();
        let mut count = 0;

        while !queue.is_exhausted() {

            let document = match queue.take_or_refill() {
                Some(document) => document,
                None => continue,
            };
            match processor.process(&document, self.learning_rate(), &mut rng) {
                Err(e) if e.is_recoverable() => warn!("[T{}] skipping document {}: {}", worker, document.doc_id, e),
                Err(e) => return Err(e),
                Ok(()) => {}
            }

            if count % PROGRESS_INTERVAL == 0 || (count < PROGRESS_INTERVAL && count % EARLY_PROGRESS_INTERVAL == 0) {
                info!("[T{}] processed {} documents in {} min", worker, count, timer.elapsed().as_secs() / 60);
                if worker == 0 && count % PROGRESS_INTERVAL == 0 {
                    let rate = self.update_learning_rate();
                    info!("updated learning rate to {}", rate);
                }
            }
            count += 1;
        }
        Ok(())
    }

    /// Runs `training_cycles + 1` passes over the corpus and returns the learned stores.
    pub fn train(self) -> Result<TrainedVectors<V>> {

        let num_threads = self.config.num_threads;
        let pool = ThreadPoolBuilder::new().num_threads(num_threads).build()?;
        let queue = DocumentQueue::new(Arc::clone(&self.corpus), self.config.contents_fields.clone(), self.config.queue_chunk_size);
        let mut rng = seeded_rng(self.config.seed);

        self.processed.store(0, Ordering::SeqCst);

        for cycle in 0..=self.config.training_cycles {

            let timer = Instant::now();
            queue.reset(&mut rng);
            queue.populate();

            let finished = AtomicUsize::new(0);
            let failure: Mutex<Option<TrainError>> = Mutex::new(None);
            pool.in_place_scope(|scope| {

                for worker in 0..num_threads {
                    let worker_rng = self.worker_rng(cycle, worker);
                    let (this, queue, finished, failure) = (&self, &queue, &finished, &failure);
                    scope.spawn(move |_| {
                        if let Err(e) = this.run_worker(worker, queue, worker_rng) {
                            error!("[T{}] stopped: {}", worker, e);
                            failure.lock().get_or_insert(e);
                        }
                        finished.fetch_add(1, Ordering::SeqCst);
                    });
                    info!("started thread {}", worker);
                }

                // keep the queue ahead of the workers until they all run dry
                while finished.load(Ordering::SeqCst) < num_threads {
                    if queue.len() < queue.chunk_size() / 4 {
                        queue.populate();
                    }
                    thread::yield_now();
                }
            });

            if let Some(e) = failure.into_inner() {
                return Err(e);
            }
            info!("training cycle {} took {} ms; queued {} documents",
                cycle, timer.elapsed().as_millis(), queue.documents_queued());
        }

        info!("created {} term vectors", self.semantic.len());
        Ok(self.finish())
    }

    /// Elemental vectors are normalized when they were learned (embeddings) or
    /// when a fresh order-encoding index is built; vectors reused from an
    /// earlier run are returned as given otherwise.
    pub fn normalizes_elemental_vectors(&self) -> bool {
        let learned_elementals = self.config.is_embeddings();
        let fresh_permutation_index = self.config.positional_method.uses_shift_permutations() && !self.retraining;
        learned_elementals || fresh_permutation_index
    }

    fn finish(self) -> TrainedVectors<V> {

        if self.normalizes_elemental_vectors() {
            info!("normalizing elemental vectors");
            self.elemental.normalize_all();
        }

        let documents = self.documents.map(|store| {
            let mut entries = store.entries();
            entries.sort_by_key(|(doc_id, _)| *doc_id);
            entries.into_iter()
            .map(|(doc_id, vector)| {
                vector.normalize();
                (self.corpus.external_document_id(doc_id), vector)
            })
            .collect()
        });

        let number_vectors = match self.encoding {
            Encoding::Proximity { number_vectors } => Some(number_vectors),
            _ => None,
        };

        TrainedVectors {
            semantic: self.semantic,
            elemental: self.elemental,
            documents,
            number_vectors,
            documents_processed: self.processed.load(Ordering::SeqCst),
        }
    }
}
