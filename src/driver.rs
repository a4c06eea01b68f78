// serial Gibbs driver: withhold-one scheduling, convergence policy, result
// assembly, composed from sampler::SamplerBase's primitives.

use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use num_traits::{Float, NumCast};
use rand::distributions::uniform::SampleUniform;
use rayon::prelude::*;
use tracing::{info, trace};

use crate::data::Dataset;
use crate::error::MotifError;
use crate::rng::Rng;
use crate::sampler::SamplerBase;

#[derive(Debug, Clone, Copy)]
pub struct ConvergencePolicy {
    pub max_iterations: usize,
    // stop early once the consensus stays unchanged for this many
    // consecutive iterations; None means iteration cap only
    pub stable_consensus_window: Option<u32>,
}

impl Default for ConvergencePolicy {
    fn default() -> Self {
        ConvergencePolicy {
            max_iterations: 10_000,
            stable_consensus_window: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotifResult {
    pub positions: Vec<usize>,
    pub num_correct: usize,
    pub consensus: String,
}

#[tracing::instrument(skip(dataset, rng))]
pub fn find_motifs<T>(
    dataset: &Dataset,
    k: usize,
    pseudocount: T,
    policy: ConvergencePolicy,
    rng: Rng,
) -> Result<MotifResult, MotifError>
where
    T: Float + NumCast + SampleUniform + for<'a> std::ops::AddAssign<&'a T> + Default,
{
    if k == 0 || k >= dataset.sequence_length {
        return Err(MotifError::InvalidK {
            k,
            length: dataset.sequence_length,
        });
    }
    if pseudocount <= T::zero() {
        return Err(MotifError::InvalidPseudocount(
            num_traits::ToPrimitive::to_f64(&pseudocount).unwrap_or(f64::NAN),
        ));
    }

    let n = dataset.num_sequences;
    let mut base: SamplerBase<T> = SamplerBase::new(dataset, rng)?;

    info!(n, k, "initializing Gibbs sampler");
    let mut positions = base.init_positions(k)?;
    let mut pwm = base.init_pwm(&positions, k, pseudocount)?;

    let mut withheld = 0usize;
    // Loop entry invariant: `pwm` reflects every sequence except `withheld`.
    base.update_counts(&mut pwm, withheld, positions[withheld], -1)?;

    let mut prev_consensus = base.consensus(&pwm);
    let mut stable_for = 0u32;

    for iteration in 0..policy.max_iterations {
        trace!(iteration, withheld, "gibbs iteration");
        let scores = base.score(&pwm, withheld)?;
        positions[withheld] = base.sample(&scores)?;

        let new_withheld = (withheld + 1) % n;
        let _prev_pwm = base.update_pwm(&mut pwm, &positions, withheld, new_withheld)?;
        withheld = new_withheld;

        if let Some(window) = policy.stable_consensus_window {
            let consensus = base.consensus(&pwm);
            if consensus == prev_consensus {
                stable_for += 1;
                if stable_for >= window {
                    info!(iteration, "converged on a stable consensus");
                    break;
                }
            } else {
                stable_for = 0;
                prev_consensus = consensus;
            }
        }
    }

    let num_correct = base.num_correct(&positions, k);
    let consensus = base.consensus(&pwm);
    info!(num_correct, %consensus, "gibbs sampler finished");

    Ok(MotifResult {
        positions,
        num_correct,
        consensus,
    })
}

// fans out `runs` independent find_motifs calls over the same dataset, each
// with its own seed_fn(run_index)-seeded Rng. each run is itself strictly
// serial, only the set of runs is concurrent.
pub fn find_motifs_parallel<T>(
    dataset: &Dataset,
    k: usize,
    pseudocount: T,
    policy: ConvergencePolicy,
    runs: usize,
    seed_fn: impl Fn(usize) -> u64 + Sync,
) -> Result<Vec<MotifResult>, MotifError>
where
    T: Float + NumCast + SampleUniform + for<'a> std::ops::AddAssign<&'a T> + Default + Send,
{
    let pb = ProgressBar::new(runs as u64);
    if let Ok(sty) = ProgressStyle::with_template(
        "[{elapsed_precise}] {spinner:.green} {bar:40.cyan/blue} {pos:>7}/{len:7} ({eta})",
    ) {
        pb.set_style(sty);
    }

    let results: Vec<MotifResult> = (0..runs)
        .into_par_iter()
        .progress_with(pb.clone())
        .map(|run| {
            let rng = Rng::from_seed(seed_fn(run));
            find_motifs(dataset, k, pseudocount, policy, rng)
        })
        .collect::<Result<Vec<MotifResult>, MotifError>>()?;

    pb.finish_and_clear();
    Ok(results)
}
