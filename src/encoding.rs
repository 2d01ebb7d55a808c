
use rand::Rng;
use crate::config::{PositionalMethod, TrainConfig};
use crate::error::Result;
use crate::permutation::Permutation;
use crate::sampling::SamplingTable;
use crate::vectors::{orthogonalize_vectors, Vector};

/// Builds vectors for a range of integers such that nearby integers get
/// similar vectors: two orthogonal endpoints, linear interpolation between.
pub struct NumberRepresentation {
    dimension: usize,
}

impl NumberRepresentation {

    pub fn new(dimension: usize) -> NumberRepresentation {
        NumberRepresentation { dimension }
    }

    /// One vector per number in `start..=end`, in order.
    pub fn number_vectors<V: Vector, R: Rng + ?Sized>(&self, start: usize, end: usize, rng: &mut R) -> Result<Vec<V>> {

        let endpoints = [
            V::random(self.dimension, self.dimension, rng),
            V::random(self.dimension, self.dimension, rng),
        ];
        orthogonalize_vectors(&endpoints)?;

        let vectors = (start..=end).map(|i| {
            let v = V::zero(self.dimension);
            v.superpose(&endpoints[0], (end - i) as f64, None);
            v.superpose(&endpoints[1], (i - start) as f64, None);
            v.normalize();
            v
        }).collect();
        Ok(vectors)
    }
}

/// Negative sampling parameters for skip-gram training.
#[derive(Debug)]
pub struct NegativeSampling {
    pub negative_samples: usize,
    pub table: SamplingTable,
}

/// How a co-occurring term's vector is combined into the focus term's vector,
/// with the precomputed data each method needs.
pub enum Encoding<V> {
    Basic,
    /// Shift by -1 for the left context and +1 for the right.
    Directional { permutations: [Permutation; 2] },
    /// One shift per window offset, indexed `offset + radius`.
    Permutation { permutations: Vec<Permutation> },
    PermutationPlusBasic { permutations: Vec<Permutation> },
    /// Number vectors for `1..=2 * radius + 2`; offset `d` binds number `d + radius + 1`.
    Proximity { number_vectors: Vec<V> },
    Embeddings(NegativeSampling),
}

impl<V: Vector> Encoding<V> {

    /// `sampling` is only consulted for embeddings.
    pub fn build<R: Rng + ?Sized>(config: &TrainConfig, sampling: SamplingTable, rng: &mut R) -> Result<Encoding<V>> {

        let radius = config.window_radius as i64;
        let dimension = config.dimension;
        let shifts = || -> Vec<Permutation> {
            (-radius..=radius).map(|d| Permutation::shift(dimension, d)).collect()
        };

        let encoding = match config.positional_method {
            PositionalMethod::Basic => Encoding::Basic,
            PositionalMethod::Directional => Encoding::Directional {
                permutations: [Permutation::shift(dimension, -1), Permutation::shift(dimension, 1)],
            },
            PositionalMethod::Permutation => Encoding::Permutation { permutations: shifts() },
            PositionalMethod::PermutationPlusBasic => Encoding::PermutationPlusBasic { permutations: shifts() },
            PositionalMethod::Proximity => {
                let number_vectors = NumberRepresentation::new(dimension)
                .number_vectors(1, 2 * config.window_radius + 2, rng)?;
                Encoding::Proximity { number_vectors }
            }
            PositionalMethod::Embeddings => Encoding::Embeddings(NegativeSampling {
                negative_samples: config.negative_samples,
                table: sampling,
            }),
        };
        Ok(encoding)
    }

    pub fn is_embeddings(&self) -> bool {
        matches!(self, Encoding::Embeddings(_))
    }

    /// Number vectors to persist alongside the term vectors, keyed by number.
    pub fn number_vectors(&self) -> Option<&[V]> {
        match self {
            Encoding::Proximity { number_vectors } => Some(number_vectors),
            _ => None,
        }
    }
}


/// Shift permutation for a window offset under the order-encoding methods.
pub fn order_permutation(permutations: &[Permutation], offset: i64, radius: usize) -> Option<&Permutation> {
    let i = offset + radius as i64;
    if i < 0 {
        return None;
    }
    permutations.get(i as usize)
}

/// Left or right permutation for directional encoding; offset 0 maps left.
pub fn direction_permutation(permutations: &[Permutation; 2], offset: i64) -> &Permutation {
    &permutations[offset.signum().max(0) as usize]
}

pub fn number_vector<V>(number_vectors: &[V], offset: i64, radius: usize) -> Option<&V> {
    let i = offset + radius as i64;
    if i < 0 {
        return None;
    }
    number_vectors.get(i as usize)
}


#[cfg(test)]
mod tests {

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use super::{direction_permutation, number_vector, order_permutation, Encoding, NumberRepresentation};
    use crate::config::{PositionalMethod, TrainConfig};
    use crate::permutation::Permutation;
    use crate::sampling::SamplingTable;
    use crate::vectors::{RealVector, Vector};

    fn config(method: PositionalMethod) -> TrainConfig {
        TrainConfig { dimension: 16, seed_length: 4, window_radius: 3, positional_method: method, ..TrainConfig::default() }
    }

    #[test]
    fn order_permutations_test() {

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let encoding: Encoding<RealVector> = Encoding::build(&config(PositionalMethod::Permutation), SamplingTable::new(), &mut rng).unwrap();
        let permutations = match &encoding {
            Encoding::Permutation { permutations } => permutations,
            _ => panic!("expected permutation encoding"),
        };
        assert_eq!(permutations.len(), 7);

        let values: Vec<f32> = (0..16).map(|x| x as f32).collect();
        for d in -3i64..=3 {
            let forward = order_permutation(permutations, d, 3).unwrap();
            let backward = order_permutation(permutations, -d, 3).unwrap();
            assert_eq!(*forward, Permutation::shift(16, d));
            assert_eq!(backward.apply(&forward.apply(&values)), values);
        }
        assert!(order_permutation(permutations, 4, 3).is_none());
        assert!(order_permutation(permutations, -4, 3).is_none());
    }

    #[test]
    fn directional_permutations_test() {

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let encoding: Encoding<RealVector> = Encoding::build(&config(PositionalMethod::Directional), SamplingTable::new(), &mut rng).unwrap();
        let permutations = match &encoding {
            Encoding::Directional { permutations } => permutations,
            _ => panic!("expected directional encoding"),
        };

        // only the direction matters, not the distance
        assert_eq!(*direction_permutation(permutations, -3), Permutation::shift(16, -1));
        assert_eq!(*direction_permutation(permutations, -1), Permutation::shift(16, -1));
        assert_eq!(*direction_permutation(permutations, 2), Permutation::shift(16, 1));
    }

    #[test]
    fn proximity_number_vectors_test() {

        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let encoding: Encoding<RealVector> = Encoding::build(&config(PositionalMethod::Proximity), SamplingTable::new(), &mut rng).unwrap();
        let number_vectors = encoding.number_vectors().unwrap();
        assert_eq!(number_vectors.len(), 8);

        let near = number_vectors[3].scalar_product(&number_vectors[4]);
        let far = number_vectors[0].scalar_product(&number_vectors[7]);
        assert!(near > far);
        assert!(number_vectors.iter().all(|v| (v.norm() - 1.0).abs() < 1e-4));

        assert!(number_vector(number_vectors, -3, 3).is_some());
        assert!(number_vector(number_vectors, -4, 3).is_none());
    }

    #[test]
    fn number_endpoints_are_orthogonal_test() {

        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let vectors: Vec<RealVector> = NumberRepresentation::new(32).number_vectors(1, 5, &mut rng).unwrap();
        assert_eq!(vectors.len(), 5);
        assert!(vectors[0].scalar_product(&vectors[4]).abs() < 1e-4);
    }
}
