// Synthetic benchmark data: sequences with known motifs embedded at known
// positions, giving the sampler a ground truth to score against.

use std::fmt;

use crate::alphabet::{decode, encode, random_nucleotide};
use crate::error::MotifError;
use crate::rng::Rng;

/// One planted motif instance inside a generated [`Sequence`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Motif {
    pub pattern: String,
    pub base_pattern: String,
    pub start_index: usize,
    pub motif_id: usize,
}

#[derive(Debug, Clone)]
pub struct Sequence {
    pub bases: String,
    pub motifs: Vec<Motif>,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub num_sequences: usize,
    pub sequence_length: usize,
    pub motif_lengths: Vec<usize>,
    pub consensus_motifs: Vec<String>,
    pub sequences: Vec<Sequence>,
}

impl Dataset {
    // mutation_rate is the per-base probability that a planted instance
    // diverges from its consensus motif; 0.0 reproduces it exactly.
    pub fn generate(
        motif_lengths: &[usize],
        num_sequences: usize,
        sequence_length: usize,
        mutation_rate: f64,
        rng: &mut Rng,
    ) -> Result<Dataset, MotifError> {
        if motif_lengths.is_empty() {
            return Err(MotifError::InvalidArgument(
                "no motif lengths supplied".into(),
            ));
        }
        if num_sequences == 0 {
            return Err(MotifError::InvalidArgument(
                "num_sequences must be positive".into(),
            ));
        }
        if sequence_length == 0 {
            return Err(MotifError::InvalidArgument(
                "sequence_length must be positive".into(),
            ));
        }
        let max_len = *motif_lengths.iter().max().unwrap();
        if max_len > sequence_length {
            return Err(MotifError::InvalidArgument(format!(
                "motif length {max_len} exceeds sequence length {sequence_length}"
            )));
        }

        let consensus_motifs: Vec<String> = motif_lengths
            .iter()
            .map(|&len| random_sequence(len, rng))
            .collect();

        let mut sequences = Vec::with_capacity(num_sequences);
        for _ in 0..num_sequences {
            sequences.push(generate_sequence(
                &consensus_motifs,
                motif_lengths,
                sequence_length,
                mutation_rate,
                rng,
            )?);
        }

        Ok(Dataset {
            num_sequences,
            sequence_length,
            motif_lengths: motif_lengths.to_vec(),
            consensus_motifs,
            sequences,
        })
    }
}

fn random_sequence(len: usize, rng: &mut Rng) -> String {
    (0..len).map(|_| random_nucleotide(rng)).collect()
}

fn mutate(base_pattern: &str, mutation_rate: f64, rng: &mut Rng) -> String {
    if mutation_rate <= 0.0 {
        return base_pattern.to_string();
    }
    base_pattern
        .chars()
        .map(|c| {
            if rng.uniform_int(0, 999) < (mutation_rate * 1000.0) as usize {
                let original = encode(c).expect("base_pattern is always in-alphabet");
                loop {
                    let candidate = rng.uniform_int(0, 3);
                    if candidate != original {
                        return decode(candidate);
                    }
                }
            } else {
                c
            }
        })
        .collect()
}

fn generate_sequence(
    consensus_motifs: &[String],
    motif_lengths: &[usize],
    sequence_length: usize,
    mutation_rate: f64,
    rng: &mut Rng,
) -> Result<Sequence, MotifError> {
    let mut bases: Vec<char> = (0..sequence_length)
        .map(|_| random_nucleotide(rng))
        .collect();

    let width = *motif_lengths.iter().max().unwrap();
    let starts = rng.rand_indices(sequence_length, width, motif_lengths.len())?;

    let mut motifs = Vec::with_capacity(motif_lengths.len());
    for (motif_id, (&start_index, base_pattern)) in starts.iter().zip(consensus_motifs).enumerate()
    {
        let pattern = mutate(base_pattern, mutation_rate, rng);
        for (offset, c) in pattern.chars().enumerate() {
            bases[start_index + offset] = c;
        }
        motifs.push(Motif {
            pattern,
            base_pattern: base_pattern.clone(),
            start_index,
            motif_id,
        });
    }

    Ok(Sequence {
        bases: bases.into_iter().collect(),
        motifs,
    })
}

const WRAP_WIDTH: usize = 80;

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CONSENSUS MOTIFS:")?;
        for (i, motif) in self.consensus_motifs.iter().enumerate() {
            writeln!(f, "{:02} > {}", i + 1, motif)?;
        }
        for (i, seq) in self.sequences.iter().enumerate() {
            let indices: Vec<String> = seq
                .motifs
                .iter()
                .map(|m| m.start_index.to_string())
                .collect();
            writeln!(
                f,
                "> sequence {} | motif indices: {}",
                i + 1,
                indices.join(", ")
            )?;
            for chunk in seq.bases.as_bytes().chunks(WRAP_WIDTH) {
                writeln!(f, "{}", std::str::from_utf8(chunk).unwrap())?;
            }
        }
        Ok(())
    }
}
