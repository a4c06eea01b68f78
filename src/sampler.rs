// background estimation, PWM construction/update, scoring, consensus
// extraction, ground-truth comparison. SamplerBase owns no loop - that's
// driver::find_motifs's job, this just exposes the building blocks.

use num_traits::{Float, NumCast, One, ToPrimitive, Zero};

use crate::alphabet::{decode, encode};
use crate::data::Dataset;
use crate::error::MotifError;
use crate::rng::Rng;

// k x 4 position weight matrix, flattened row-major: (row, col) lives at
// row * 4 + col. Stores raw per-column observation counts rather than
// pre-divided probabilities, so a row's probabilities can always be derived
// from the *current* number of contributing sequences (`num_contributing`)
// instead of baking in a denominator (e.g. k) that drifts out of sync with
// it as sequences are folded in and withheld.
#[derive(Debug, Clone, PartialEq)]
pub struct Pwm<T> {
    k: usize,
    pseudocount: T,
    num_contributing: usize,
    counts: Vec<T>,
}

impl<T: Float> Pwm<T> {
    #[inline]
    fn idx(row: usize, col: usize) -> usize {
        row * 4 + col
    }

    pub fn k(&self) -> usize {
        self.k
    }

    // denom = num_contributing + 4*pseudocount, so a row's four probabilities
    // (pseudocount + count) / denom always sum to exactly 1.
    fn denom(&self) -> T {
        T::from(self.num_contributing).expect("num_contributing fits in T")
            + T::from(4).unwrap() * self.pseudocount
    }

    pub fn get(&self, row: usize, col: usize) -> T {
        (self.pseudocount + self.counts[Self::idx(row, col)]) / self.denom()
    }

    fn add_count(&mut self, row: usize, col: usize, delta: T) {
        let i = Self::idx(row, col);
        self.counts[i] = self.counts[i] + delta;
    }

    fn shift_contributing(&mut self, sign: i8) {
        if sign > 0 {
            self.num_contributing += 1;
        } else {
            self.num_contributing -= 1;
        }
    }

    pub fn row_sum(&self, row: usize) -> T {
        let mut sum = T::zero();
        for col in 0..4 {
            sum = sum + self.get(row, col);
        }
        sum
    }
}

pub struct SamplerBase<'a, T> {
    dataset: &'a Dataset,
    background: [T; 4],
    rng: Rng,
}

const DEFAULT_BACKGROUND_SAMPLE_SIZE: usize = 100;

impl<'a, T: Float> SamplerBase<'a, T> {
    pub fn new(dataset: &'a Dataset, mut rng: Rng) -> Result<Self, MotifError> {
        let background = Self::calculate_background(dataset, &mut rng, DEFAULT_BACKGROUND_SAMPLE_SIZE)?;
        Ok(SamplerBase {
            dataset,
            background,
            rng,
        })
    }

    pub fn dataset(&self) -> &Dataset {
        self.dataset
    }

    pub fn background(&self) -> [T; 4] {
        self.background
    }

    pub fn rng(&mut self) -> &mut Rng {
        &mut self.rng
    }

    // samples the selected sequence at the freshly drawn position, not the
    // outer loop variable reused as a position
    fn calculate_background(
        dataset: &Dataset,
        rng: &mut Rng,
        sample_size: usize,
    ) -> Result<[T; 4], MotifError> {
        let n = dataset.num_sequences;
        if n == 0 {
            return Err(MotifError::InvalidArgument(
                "dataset has no sequences".into(),
            ));
        }
        let samples_per_seq = (sample_size + n - 1) / n;
        let total_samples = samples_per_seq * n;

        let mut histogram = [0usize; 4];
        for seq in &dataset.sequences {
            let bases: Vec<char> = seq.bases.chars().collect();
            for _ in 0..samples_per_seq {
                let idx = rng.uniform_int(0, dataset.sequence_length - 1);
                let base = bases[idx];
                histogram[encode(base)?] += 1;
            }
        }

        let total = T::from(total_samples).expect("total_samples fits in T");
        let epsilon = T::one() / total;
        let mut background = [T::zero(); 4];
        for i in 0..4 {
            let count = T::from(histogram[i]).expect("histogram count fits in T");
            let p = count / total;
            background[i] = if p > T::zero() { p } else { epsilon };
        }
        Ok(background)
    }

    pub fn init_positions(&mut self, width: usize) -> Result<Vec<usize>, MotifError> {
        if width == 0 || width > self.dataset.sequence_length {
            return Err(MotifError::InvalidK {
                k: width,
                length: self.dataset.sequence_length,
            });
        }
        let hi = self.dataset.sequence_length - width;
        Ok((0..self.dataset.num_sequences)
            .map(|_| self.rng.uniform_int(0, hi))
            .collect())
    }

    pub fn init_pwm(&self, positions: &[usize], k: usize, pseudocount: T) -> Result<Pwm<T>, MotifError> {
        self.validate_k(k)?;
        if pseudocount <= T::zero() {
            return Err(MotifError::InvalidPseudocount(
                pseudocount.to_f64().unwrap_or(f64::NAN),
            ));
        }
        let mut pwm = Pwm {
            k,
            pseudocount,
            num_contributing: 0,
            counts: vec![T::zero(); k * 4],
        };
        for (seq_index, &start) in positions.iter().enumerate() {
            self.update_counts(&mut pwm, seq_index, start, 1)?;
        }
        Ok(pwm)
    }

    // sign = 1 adds a sequence's contribution, sign = -1 removes it. Updates
    // both the raw counts and the contributing-sequence count the PWM's
    // denominator is derived from.
    pub fn update_counts(
        &self,
        pwm: &mut Pwm<T>,
        seq_index: usize,
        start: usize,
        sign: i8,
    ) -> Result<(), MotifError> {
        let k = pwm.k();
        let delta = T::from(sign).expect("sign is -1 or 1");
        let seq = &self.dataset.sequences[seq_index];
        let bases: Vec<char> = seq.bases.chars().collect();
        for j in 0..k {
            let col = encode(bases[start + j])?;
            pwm.add_count(j, col, delta);
        }
        pwm.shift_contributing(sign);
        Ok(())
    }

    // re-includes the previously withheld sequence, removes the new one.
    // returns the pre-update PWM for the convergence check.
    pub fn update_pwm(
        &self,
        pwm: &mut Pwm<T>,
        positions: &[usize],
        old_withheld: usize,
        new_withheld: usize,
    ) -> Result<Pwm<T>, MotifError> {
        let prev = pwm.clone();
        self.update_counts(pwm, old_withheld, positions[old_withheld], 1)?;
        self.update_counts(pwm, new_withheld, positions[new_withheld], -1)?;
        Ok(prev)
    }

    pub fn score(&self, pwm: &Pwm<T>, withheld: usize) -> Result<Vec<T>, MotifError> {
        let k = pwm.k();
        let seq = &self.dataset.sequences[withheld];
        let bases: Vec<char> = seq.bases.chars().collect();
        let len = self.dataset.sequence_length;
        let num_candidates = len - k;

        let mut log_scores = Vec::with_capacity(num_candidates);
        for start in 0..num_candidates {
            let mut acc = T::zero();
            for j in 0..k {
                let col = encode(bases[start + j])?;
                let emission = pwm.get(j, col);
                let background = self.background[col];
                if emission <= T::zero() || background <= T::zero() {
                    return Err(MotifError::NumericError(
                        "non-positive probability reached log()".into(),
                    ));
                }
                acc = acc + (emission.ln() - background.ln());
            }
            log_scores.push(acc);
        }

        let z = log_scores
            .iter()
            .copied()
            .reduce(log_sum_exp)
            .expect("num_candidates > 0 whenever k < L");

        Ok(log_scores.into_iter().map(|s| (s - z).exp()).collect())
    }

    pub fn sample(&mut self, scores: &[T]) -> Result<usize, MotifError>
    where
        T: rand::distributions::uniform::SampleUniform
            + for<'b> std::ops::AddAssign<&'b T>
            + Default,
    {
        self.rng.discrete(scores)
    }

    // argmax per row, ties broken by lowest column index
    pub fn consensus(&self, pwm: &Pwm<T>) -> String {
        (0..pwm.k())
            .map(|row| {
                let mut best_col = 0;
                let mut best_val = pwm.get(row, 0);
                for col in 1..4 {
                    let val = pwm.get(row, col);
                    if val > best_val {
                        best_val = val;
                        best_col = col;
                    }
                }
                decode(best_col)
            })
            .collect()
    }

    // best-matched hit count across motif ids; at most one hit per sequence
    pub fn num_correct(&self, positions: &[usize], k: usize) -> usize {
        let mut hits: std::collections::HashMap<usize, usize> = std::collections::HashMap::new();
        for (i, &pos) in positions.iter().enumerate() {
            for motif in &self.dataset.sequences[i].motifs {
                let diff = pos.abs_diff(motif.start_index);
                if diff < k {
                    *hits.entry(motif.motif_id).or_insert(0) += 1;
                    break;
                }
            }
        }
        hits.values().copied().max().unwrap_or(0)
    }

    fn validate_k(&self, k: usize) -> Result<(), MotifError> {
        if k == 0 || k >= self.dataset.sequence_length {
            return Err(MotifError::InvalidK {
                k,
                length: self.dataset.sequence_length,
            });
        }
        Ok(())
    }
}

fn log_sum_exp<T: Float>(a: T, b: T) -> T {
    let (hi, lo) = if a > b { (a, b) } else { (b, a) };
    hi + (lo - hi).exp().ln_1p()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn dataset() -> Dataset {
        let mut rng = Rng::from_seed(11);
        Dataset::generate(&[6], 12, 120, 0.0, &mut rng).unwrap()
    }

    #[test]
    fn init_pwm_rows_sum_to_one_and_are_strictly_positive() {
        let dataset = dataset();
        let mut base: SamplerBase<f64> = SamplerBase::new(&dataset, Rng::from_seed(1)).unwrap();
        let positions = base.init_positions(6).unwrap();
        let pwm = base.init_pwm(&positions, 6, 0.1).unwrap();
        for row in 0..6 {
            assert_approx_eq!(pwm.row_sum(row), 1.0, 1e-6);
            for col in 0..4 {
                assert!(pwm.get(row, col) > 0.0);
            }
        }
    }

    #[test]
    fn update_pwm_round_trips_to_the_original() {
        let dataset = dataset();
        let base: SamplerBase<f64> = SamplerBase::new(&dataset, Rng::from_seed(2)).unwrap();
        let positions: Vec<usize> = (0..dataset.num_sequences).map(|_| 0).collect();
        let mut pwm = base.init_pwm(&positions, 6, 0.1).unwrap();
        let before = pwm.clone();

        // withhold sequence 1 in favor of sequence 0, then undo by swapping
        // old/new: the two calls are exact inverses of one another.
        let _ = base.update_pwm(&mut pwm, &positions, 0, 1).unwrap();
        let _ = base.update_pwm(&mut pwm, &positions, 1, 0).unwrap();

        for row in 0..6 {
            for col in 0..4 {
                assert_approx_eq!(pwm.get(row, col), before.get(row, col), 1e-9);
            }
        }
    }

    #[test]
    fn score_is_a_probability_distribution() {
        let dataset = dataset();
        let mut base: SamplerBase<f64> = SamplerBase::new(&dataset, Rng::from_seed(3)).unwrap();
        let positions = base.init_positions(6).unwrap();
        let pwm = base.init_pwm(&positions, 6, 0.1).unwrap();
        let scores = base.score(&pwm, 0).unwrap();
        let sum: f64 = scores.iter().sum();
        assert_approx_eq!(sum, 1.0, 1e-6);
        for &s in &scores {
            assert!((0.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn consensus_on_identical_planted_motifs_reproduces_them() {
        let mut rng = Rng::from_seed(4);
        // two sequences, identical planted motif at identical position
        let mut dataset = Dataset::generate(&[10], 2, 50, 0.0, &mut rng).unwrap();
        let shared = "AAAAAAAAAA".to_string();
        for seq in &mut dataset.sequences {
            let start = seq.motifs[0].start_index;
            let bases: Vec<char> = seq.bases.chars().collect();
            let mut new_bases = bases.clone();
            for (i, c) in shared.chars().enumerate() {
                new_bases[start + i] = c;
            }
            seq.bases = new_bases.into_iter().collect();
            seq.motifs[0].pattern = shared.clone();
            seq.motifs[0].base_pattern = shared.clone();
        }
        dataset.consensus_motifs = vec![shared.clone()];

        let base: SamplerBase<f64> = SamplerBase::new(&dataset, Rng::from_seed(5)).unwrap();
        let positions: Vec<usize> = dataset.sequences.iter().map(|s| s.motifs[0].start_index).collect();
        let pwm = base.init_pwm(&positions, 10, 1.0).unwrap();
        assert_eq!(base.consensus(&pwm), shared);
        assert_eq!(base.num_correct(&positions, 10), 2);
    }

    #[test]
    fn num_correct_is_monotone_when_moving_a_position_into_the_overlap_window() {
        let dataset = dataset();
        let base: SamplerBase<f64> = SamplerBase::new(&dataset, Rng::from_seed(6)).unwrap();
        let k = 6;
        let true_start = dataset.sequences[0].motifs[0].start_index;

        let far = (true_start + k + 5).min(dataset.sequence_length - k);
        let mut positions = vec![far; dataset.num_sequences];
        let before = base.num_correct(&positions, k);

        positions[0] = true_start;
        let after = base.num_correct(&positions, k);

        assert!(after >= before + 1);
    }

    #[test]
    fn consensus_is_invariant_under_permuting_the_sequence_order() {
        let dataset = dataset();
        let mut base: SamplerBase<f64> = SamplerBase::new(&dataset, Rng::from_seed(7)).unwrap();
        let positions = base.init_positions(6).unwrap();
        let pwm = base.init_pwm(&positions, 6, 0.1).unwrap();
        let consensus = base.consensus(&pwm);

        let n = dataset.num_sequences;
        let order: Vec<usize> = (0..n).rev().collect();
        let mut shuffled = dataset.clone();
        shuffled.sequences = order.iter().map(|&i| dataset.sequences[i].clone()).collect();
        let shuffled_positions: Vec<usize> = order.iter().map(|&i| positions[i]).collect();

        let shuffled_base: SamplerBase<f64> =
            SamplerBase::new(&shuffled, Rng::from_seed(8)).unwrap();
        let shuffled_pwm = shuffled_base.init_pwm(&shuffled_positions, 6, 0.1).unwrap();
        assert_eq!(shuffled_base.consensus(&shuffled_pwm), consensus);
    }

    #[test]
    fn log_sum_exp_matches_naive_computation() {
        let a = 2.0_f64;
        let b = 5.0_f64;
        let naive = (a.exp() + b.exp()).ln();
        assert_approx_eq!(log_sum_exp(a, b), naive, 1e-9);
    }
}
