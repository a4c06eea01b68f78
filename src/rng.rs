// RNG capability threaded explicitly through every constructor that needs
// randomness, instead of a hidden thread_rng() singleton.

use std::collections::BTreeSet;
use std::ops::AddAssign;

use num_traits::Float;
use rand::distributions::uniform::SampleUniform;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng};

use crate::error::MotifError;

pub struct Rng(StdRng);

impl Rng {
    pub fn from_seed(seed: u64) -> Self {
        Rng(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Rng(StdRng::from_entropy())
    }

    pub fn uniform_int(&mut self, lo: usize, hi: usize) -> usize {
        self.0.gen_range(lo..=hi)
    }

    // requires at least one strictly positive, non-negative weight
    pub fn discrete<T>(&mut self, weights: &[T]) -> Result<usize, MotifError>
    where
        T: Float + SampleUniform + for<'a> AddAssign<&'a T> + Default,
    {
        let dist = WeightedIndex::new(weights)
            .map_err(|e| MotifError::NumericError(format!("discrete sampling: {e}")))?;
        Ok(dist.sample(&mut self.0))
    }

    // rejection sampling: propose a position, reject if [p, p+width) overlaps
    // a committed offset or runs past max. fails fast rather than looping
    // forever when count * width > max.
    pub fn rand_indices(
        &mut self,
        max: usize,
        width: usize,
        count: usize,
    ) -> Result<Vec<usize>, MotifError> {
        if width == 0 || count.saturating_mul(width) > max {
            return Err(MotifError::InfeasibleLayout { max, width, count });
        }

        let mut committed: BTreeSet<usize> = BTreeSet::new();
        let mut result = Vec::with_capacity(count);

        for _ in 0..count {
            loop {
                let pos = self.uniform_int(0, max - width);
                let range = pos..pos + width;
                if range.end <= max && range.clone().all(|i| !committed.contains(&i)) {
                    committed.extend(range);
                    result.push(pos);
                    break;
                }
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rand_indices_are_disjoint_and_in_range() {
        let mut rng = Rng::from_seed(42);
        let positions = rng.rand_indices(100, 10, 5).unwrap();
        assert_eq!(positions.len(), 5);
        for &p in &positions {
            assert!(p <= 90);
        }
        for (i, &a) in positions.iter().enumerate() {
            for &b in &positions[i + 1..] {
                let (lo, hi) = if a < b { (a, b) } else { (b, a) };
                assert!(hi - lo >= 10, "intervals [{a},{a}+10) and [{b},{b}+10) overlap");
            }
        }
    }

    #[test]
    fn rand_indices_single_draw() {
        let mut rng = Rng::from_seed(1);
        let positions = rng.rand_indices(50, 5, 1).unwrap();
        assert_eq!(positions.len(), 1);
        assert!(positions[0] <= 45);
    }

    #[test]
    fn rand_indices_rejects_infeasible_layouts() {
        let mut rng = Rng::from_seed(1);
        let err = rng.rand_indices(10, 5, 3).unwrap_err();
        assert!(matches!(err, MotifError::InfeasibleLayout { .. }));
    }

    #[test]
    fn discrete_prefers_heavier_weights_over_many_draws() {
        let mut rng = Rng::from_seed(3);
        let weights = [0.01_f64, 0.01, 100.0, 0.01];
        let mut counts = [0usize; 4];
        for _ in 0..2000 {
            counts[rng.discrete(&weights).unwrap()] += 1;
        }
        assert!(counts[2] > counts[0] + counts[1] + counts[3]);
    }

    #[test]
    fn uniform_int_stays_in_bounds() {
        let mut rng = Rng::from_seed(9);
        for _ in 0..500 {
            let v = rng.uniform_int(3, 8);
            assert!((3..=8).contains(&v));
        }
    }
}
