// optional FASTA loading convenience, not on the CLI's path. loaded records
// carry no ground truth, so num_correct is meaningless over them.

use std::fs::File;
use std::path::Path;
use std::str;

use bio::io::fasta;

use crate::error::MotifError;

pub fn load_fasta(path: impl AsRef<Path>, max_entries: usize) -> Result<Vec<String>, MotifError> {
    let file = File::open(path)?;
    let mut sequences = Vec::new();
    for record in fasta::Reader::new(file).records() {
        if sequences.len() >= max_entries {
            break;
        }
        let record = record.map_err(|e| MotifError::FastaParse(e.to_string()))?;
        let seq = str::from_utf8(record.seq())
            .map_err(|e| MotifError::FastaParse(e.to_string()))?
            .to_uppercase();
        sequences.push(seq);
    }
    Ok(sequences)
}
