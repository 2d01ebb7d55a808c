
/// A permutation of vector coordinates: coordinate `i` moves to `self[i]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Permutation(Vec<usize>);

impl Permutation {

    /// Cyclic shift by `shift` places, negative shifts rotate left.
    pub fn shift(dimension: usize, shift: i64) -> Permutation {
        let n = dimension as i64;
        let indexes = (0..n)
        .map(|i| (i + shift).rem_euclid(n) as usize)
        .collect();
        Permutation(indexes)
    }

    pub fn inverse(&self) -> Permutation {
        let mut inverse = vec![0; self.0.len()];
        for (i, target) in self.0.iter().enumerate() {
            inverse[*target] = i;
        }
        Permutation(inverse)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn target(&self, i: usize) -> usize {
        self.0[i]
    }

    /// Returns `values` with every coordinate moved to its permuted place.
    pub fn apply(&self, values: &[f32]) -> Vec<f32> {
        let mut permuted = vec![0.0; values.len()];
        for (i, value) in values.iter().enumerate() {
            permuted[self.0[i]] = *value;
        }
        permuted
    }
}
