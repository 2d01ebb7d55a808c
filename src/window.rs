
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use crate::config::TrainConfig;
use crate::corpus::{Corpus, DocumentTerms};
use crate::embedding::{process_embeddings, Context};
use crate::encoding::{direction_permutation, number_vector, order_permutation, Encoding, NegativeSampling};
use crate::error::{Result, TrainError};
use crate::sampling::SubsamplingTable;
use crate::sigmoid::SigmoidTable;
use crate::store::{DocumentStore, TermStore};
use crate::vectors::Vector;

/// Everything a worker needs to slide windows over one document and update
/// the shared stores.
pub struct WindowProcessor<'a, C, V> {
    pub config: &'a TrainConfig,
    pub corpus: &'a C,
    pub semantic: &'a TermStore<V>,
    pub elemental: &'a TermStore<V>,
    pub documents: Option<&'a DocumentStore<V>>,
    pub encoding: &'a Encoding<V>,
    pub subsampling: Option<&'a SubsamplingTable>,
    pub sigmoid: &'a SigmoidTable,
    pub processed: &'a AtomicUsize,
}

impl<'a, C: Corpus, V: Vector> WindowProcessor<'a, C, V> {

    /// Rebuilds the document as a position-sorted sequence of retained terms.
    ///
    /// Terms without a semantic vector and subsampled occurrences are squeezed
    /// out, so neighbours in the sequence need not be neighbours in the text.
    pub fn reconstruct<'d, R: Rng + ?Sized>(&self, document: &'d DocumentTerms, rng: &mut R) -> Vec<(usize, &'d str)> {

        let mut sequence = Vec::new();
        for occurrences in &document.terms {
            let term = occurrences.term.as_str();
            if !self.semantic.contains(term) {
                continue;
            }
            for position in &occurrences.positions {
                if let Some(subsampling) = self.subsampling {
                    if subsampling.discard(&document.field, term, rng) {
                        continue;
                    }
                }
                sequence.push((*position, term));
            }
        }
        sequence.sort_by_key(|(position, _)| *position);
        sequence
    }

    pub fn process<R: Rng + ?Sized>(&self, document: &DocumentTerms, learning_rate: f64, rng: &mut R) -> Result<()> {

        let sequence = self.reconstruct(document, rng);
        let n = sequence.len();
        let embeddings = self.encoding.is_embeddings();

        for focus in 0..n {

            let focus_term = sequence[focus].1;
            let focus_vector = self.semantic.get(focus_term)
            .ok_or_else(|| TrainError::window(document.doc_id, format!("no semantic vector for {}", focus_term)))?;

            // word2vec style dynamic window: radius drawn uniformly from 1..=window_radius
            let radius = if self.config.subsample_in_window {
                rng.gen_range(1..=self.config.window_radius)
            } else {
                self.config.window_radius
            };

            let start = focus.saturating_sub(radius);
            let end = (focus + radius).min(n);

            for cursor in start..end {

                // the focus position only ever trains a document vector
                if cursor == focus && !(embeddings && self.documents.is_some()) {
                    continue;
                }

                let coterm = sequence[cursor].1;
                let offset = cursor as i64 - focus as i64;
                let elemental = self.elemental_vector(coterm, rng);

                match self.encoding {
                    Encoding::Embeddings(sampling) => {
                        let contexts = self.context_set(coterm, elemental, sampling, rng);
                        if cursor != focus {
                            process_embeddings(focus_vector.as_ref(), &contexts, learning_rate, self.sigmoid);
                        }
                        // the focus position itself still trains the document vector
                        if let Some(documents) = self.documents {
                            let doc_vector = documents.get_or_insert_with(document.doc_id, || {
                                V::random(self.config.dimension, self.config.seed_length, rng)
                            });
                            process_embeddings(doc_vector.as_ref(), &contexts, learning_rate, self.sigmoid);
                        }
                    }
                    _ => self.superpose(document, focus_vector.as_ref(), coterm, &elemental, offset)?,
                }
            }
        }

        self.processed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Inserts a random elemental vector for a term seen for the first time,
    /// which happens when retraining over a different corpus.
    fn elemental_vector<R: Rng + ?Sized>(&self, term: &str, rng: &mut R) -> Arc<V> {
        if let Some(vector) = self.elemental.get(term) {
            return vector;
        }
        self.elemental.get_or_insert_with(term.to_string(), || {
            V::random(self.config.dimension, self.config.seed_length, rng)
        })
    }

    /// The observed co-occurring term plus `negative_samples` frequency-weighted draws.
    pub fn context_set<R: Rng + ?Sized>(&self, coterm: &str, elemental: Arc<V>, sampling: &NegativeSampling, rng: &mut R) -> Vec<Context<V>> {

        let mut contexts = Vec::with_capacity(sampling.negative_samples + 1);
        contexts.push(Context { vector: elemental, positive: true });

        while contexts.len() <= sampling.negative_samples {
            let term = match sampling.table.draw(rng, coterm) {
                Some(term) => term,
                None => break,
            };
            let vector = self.elemental_vector(term, rng);
            contexts.push(Context { vector, positive: false });
        }
        contexts
    }

    fn superpose(&self, document: &DocumentTerms, focus: &V, coterm: &str, elemental: &Arc<V>, offset: i64) -> Result<()> {

        let radius = self.config.window_radius;
        let weight = self.corpus.global_term_weight(&document.field, coterm) as f64;
        let out_of_window = || TrainError::window(document.doc_id, format!("offset {} outside radius {}", offset, radius));

        match self.encoding {
            Encoding::Basic => focus.superpose(elemental, weight, None),
            Encoding::Directional { permutations } => {
                focus.superpose(elemental, weight, Some(direction_permutation(permutations, offset)));
            }
            Encoding::Permutation { permutations } => {
                let permutation = order_permutation(permutations, offset, radius).ok_or_else(out_of_window)?;
                focus.superpose(elemental, weight, Some(permutation));
            }
            Encoding::PermutationPlusBasic { permutations } => {
                let permutation = order_permutation(permutations, offset, radius).ok_or_else(out_of_window)?;
                focus.superpose(elemental, weight, None);
                focus.superpose(elemental, weight, Some(permutation));
            }
            Encoding::Proximity { number_vectors } => {
                let number = number_vector(number_vectors, offset, radius).ok_or_else(out_of_window)?;
                let bound = elemental.copy();
                bound.bind(number);
                focus.superpose(&bound, weight, None);
            }
            Encoding::Embeddings(_) => {}
        }
        Ok(())
    }
}
