
use ndarray::Array1;
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Uniform;
use rand::Rng;
use rand::seq::index;
use std::sync::atomic::{AtomicU32, Ordering};
use crate::config::VectorType;
use crate::error::{Result, TrainError};
use crate::permutation::Permutation;

/// The operations training needs from a vector representation.
///
/// Every mutating method takes `&self`: vectors are shared between worker
/// threads and updated without locks. Two threads writing the same vector may
/// lose each other's increments, which asynchronous SGD tolerates, but an
/// implementation must never expose a torn element.
pub trait Vector: Send + Sync + Sized {

    fn zero(dimension: usize) -> Self;

    /// `seed_length` non-zero entries; `seed_length == dimension` gives a dense vector.
    fn random<R: Rng + ?Sized>(dimension: usize, seed_length: usize, rng: &mut R) -> Self;

    fn vector_type(&self) -> VectorType;

    fn dimension(&self) -> usize;

    fn copy(&self) -> Self;

    fn normalize(&self);

    /// Adds `weight * other` into `self`, moving coordinate `i` of `other` to
    /// `permutation[i]` when a permutation is given.
    fn superpose(&self, other: &Self, weight: f64, permutation: Option<&Permutation>);

    fn bind(&self, other: &Self);

    fn scalar_product(&self, other: &Self) -> f64;

    fn to_array(&self) -> Array1<f32>;
}

/// Dense real vector stored as f32 bit patterns in relaxed atomics.
#[derive(Debug)]
pub struct RealVector {
    cells: Box<[AtomicU32]>,
}

impl RealVector {

    pub fn from_values(values: &[f32]) -> RealVector {
        let cells = values.iter().map(|x| AtomicU32::new(x.to_bits())).collect();
        RealVector { cells }
    }

    #[inline]
    fn get(&self, i: usize) -> f32 {
        f32::from_bits(self.cells[i].load(Ordering::Relaxed))
    }

    #[inline]
    fn set(&self, i: usize, value: f32) {
        self.cells[i].store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn values(&self) -> Vec<f32> {
        (0..self.cells.len()).map(|i| self.get(i)).collect()
    }

    pub fn norm(&self) -> f64 {
        self.scalar_product(self).sqrt()
    }
}

impl Vector for RealVector {

    fn zero(dimension: usize) -> Self {
        let cells = (0..dimension).map(|_| AtomicU32::new(0)).collect();
        RealVector { cells }
    }

    fn random<R: Rng + ?Sized>(dimension: usize, seed_length: usize, rng: &mut R) -> Self {

        if seed_length >= dimension {
            // dense initialization, the usual starting point for embedding weights
            let values: Array1<f32> = Array1::random_using(dimension, Uniform::new(-0.5, 0.5), rng) / dimension as f32;
            return RealVector::from_values(&values.to_vec());
        }

        // sparse ternary seed: half the chosen entries +1, the other half -1
        let vector = RealVector::zero(dimension);
        for (k, i) in index::sample(rng, dimension, seed_length).into_iter().enumerate() {
            vector.set(i, if k < seed_length / 2 { 1.0 } else { -1.0 });
        }
        vector
    }

    fn vector_type(&self) -> VectorType {
        VectorType::Real
    }

    fn dimension(&self) -> usize {
        self.cells.len()
    }

    fn copy(&self) -> Self {
        RealVector::from_values(&self.values())
    }

    fn normalize(&self) {
        let norm = self.norm();
        if norm == 0.0 {
            return;
        }
        for i in 0..self.cells.len() {
            self.set(i, (self.get(i) as f64 / norm) as f32);
        }
    }

    fn superpose(&self, other: &Self, weight: f64, permutation: Option<&Permutation>) {
        let weight = weight as f32;
        for i in 0..other.cells.len() {
            let target = permutation.map_or(i, |p| p.target(i));
            self.set(target, self.get(target) + weight * other.get(i));
        }
    }

    fn bind(&self, other: &Self) {
        // elementwise (Hadamard) binding
        for i in 0..self.cells.len() {
            self.set(i, self.get(i) * other.get(i));
        }
    }

    fn scalar_product(&self, other: &Self) -> f64 {
        (0..self.cells.len())
        .map(|i| self.get(i) as f64 * other.get(i) as f64)
        .sum()
    }

    fn to_array(&self) -> Array1<f32> {
        Array1::from(self.values())
    }
}

/// Gram-Schmidt in place: vector `k` ends orthogonal to vectors `0..k`, all normalized.
pub fn orthogonalize_vectors<V: Vector>(vectors: &[V]) -> Result<()> {

    let dimension = match vectors.first() {
        Some(first) => first.dimension(),
        None => return Ok(()),
    };

    for k in 0..vectors.len() {
        let kth = &vectors[k];
        if kth.dimension() != dimension {
            return Err(TrainError::invalid_config("cannot orthogonalize vectors of different dimensions"));
        }
        kth.normalize();
        for jth in &vectors[..k] {
            let overlap = kth.scalar_product(jth);
            kth.superpose(jth, -overlap, None);
            kth.normalize();
        }
    }
    Ok(())
}


#[cfg(test)]
mod tests {

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use super::{orthogonalize_vectors, RealVector, Vector};
    use crate::permutation::Permutation;

    #[test]
    fn sparse_seed_test() {

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let v = RealVector::random(100, 10, &mut rng);
        let values = v.values();

        assert_eq!(values.iter().filter(|x| **x == 1.0).count(), 5);
        assert_eq!(values.iter().filter(|x| **x == -1.0).count(), 5);
        assert_eq!(values.iter().filter(|x| **x == 0.0).count(), 90);
    }

    #[test]
    fn dense_seed_test() {

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let v = RealVector::random(50, 50, &mut rng);
        assert!(v.values().iter().all(|x| x.abs() <= 0.5 / 50.0));
        assert!(v.norm() > 0.0);
    }

    #[test]
    fn superpose_and_permute_test() {

        let target = RealVector::zero(4);
        let other = RealVector::from_values(&[1.0, 2.0, 3.0, 4.0]);

        target.superpose(&other, 0.5, None);
        assert_eq!(target.values(), vec![0.5, 1.0, 1.5, 2.0]);

        target.superpose(&other, 1.0, Some(&Permutation::shift(4, 1)));
        assert_eq!(target.values(), vec![4.5, 2.0, 3.5, 5.0]);
    }

    #[test]
    fn permuted_superposition_round_trip_test() {

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let original = RealVector::random(16, 6, &mut rng);
        for d in -3..=3 {
            let shifted = RealVector::zero(16);
            shifted.superpose(&original, 1.0, Some(&Permutation::shift(16, d)));
            let restored = RealVector::zero(16);
            restored.superpose(&shifted, 1.0, Some(&Permutation::shift(16, -d)));
            assert_eq!(restored.values(), original.values());
        }
    }

    #[test]
    fn normalize_and_bind_test() {

        let v = RealVector::from_values(&[3.0, 4.0]);
        v.normalize();
        assert!((v.norm() - 1.0).abs() < 1e-6);

        let zero = RealVector::zero(2);
        zero.normalize();
        assert_eq!(zero.values(), vec![0.0, 0.0]);

        let a = RealVector::from_values(&[1.0, -2.0, 0.5]);
        a.bind(&RealVector::from_values(&[2.0, 2.0, -2.0]));
        assert_eq!(a.values(), vec![2.0, -4.0, -1.0]);
    }

    #[test]
    fn orthogonalize_test() {

        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let vectors: Vec<RealVector> = (0..3).map(|_| RealVector::random(64, 64, &mut rng)).collect();
        orthogonalize_vectors(&vectors).unwrap();

        for i in 0..3 {
            assert!((vectors[i].norm() - 1.0).abs() < 1e-4);
            for j in 0..i {
                assert!(vectors[i].scalar_product(&vectors[j]).abs() < 1e-4);
            }
        }
    }
}
