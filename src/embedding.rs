
use std::sync::Arc;
use crate::config::VectorType;
use crate::sigmoid::SigmoidTable;
use crate::vectors::Vector;

/// Scores beyond this magnitude are skipped rather than trained on.
pub const MAX_EXP: f64 = 6.0;
pub const SIGMOID_TABLE_SIZE: usize = 1000;

/// A context vector paired with its label: the observed co-occurring term is
/// positive, negative samples are not.
pub struct Context<V> {
    pub vector: Arc<V>,
    pub positive: bool,
}

impl<V> Context<V> {
    fn label(&self) -> f64 {
        if self.positive { 1.0 } else { 0.0 }
    }
}

/// One skip-gram negative-sampling step of `embedding` against every context.
///
/// Both sides move by `-learning_rate * error` along the other's value from
/// before this step.
pub fn process_embeddings<V: Vector>(embedding: &V, contexts: &[Context<V>], learning_rate: f64, sigmoid: &SigmoidTable) {

    for context in contexts {

        let context_before = context.vector.copy();
        let score = embedding.scalar_product(&context_before);
        if score.abs() > MAX_EXP {
            continue;
        }

        let error = match embedding.vector_type() {
            VectorType::Real => sigmoid.sigmoid(score) - context.label(),
            // rectified prediction, scaled to the integer steps binary vectors accept
            VectorType::Binary => (100.0 * (score.max(0.0) - context.label())).round(),
        };
        let step = -learning_rate * error;

        context.vector.superpose(embedding, step, None);
        embedding.superpose(&context_before, step, None);
    }
}
