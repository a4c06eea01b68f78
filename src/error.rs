use thiserror::Error;

#[derive(Error, Debug)]
pub enum MotifError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid nucleotide symbol: '{0}' (expected one of A, C, G, T)")]
    InvalidSymbol(char),

    #[error("invalid motif length k={k} for sequence length L={length}")]
    InvalidK { k: usize, length: usize },

    #[error("invalid pseudocount {0}: must be strictly positive")]
    InvalidPseudocount(f64),

    #[error("cannot place {count} non-overlapping windows of width {width} in a range of {max}")]
    InfeasibleLayout {
        max: usize,
        width: usize,
        count: usize,
    },

    #[error("numeric error: {0}")]
    NumericError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed FASTA record: {0}")]
    FastaParse(String),
}
