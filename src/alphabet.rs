// fixed A=0, C=1, G=2, T=3 column order, assumed everywhere a PWM or count
// matrix gets indexed

use crate::error::MotifError;
use crate::rng::Rng;

const SYMBOLS: [char; 4] = ['A', 'C', 'G', 'T'];

pub fn encode(c: char) -> Result<usize, MotifError> {
    match c {
        'A' => Ok(0),
        'C' => Ok(1),
        'G' => Ok(2),
        'T' => Ok(3),
        other => Err(MotifError::InvalidSymbol(other)),
    }
}

pub fn decode(i: usize) -> char {
    SYMBOLS[i]
}

pub fn random_nucleotide(rng: &mut Rng) -> char {
    SYMBOLS[rng.uniform_int(0, 3)]
}
