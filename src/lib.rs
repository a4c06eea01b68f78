pub mod alphabet;
pub mod cli;
pub mod data;
pub mod driver;
pub mod error;
pub mod fasta;
pub mod rng;
pub mod sampler;

pub use cli::Cli;
pub use data::{Dataset, Motif, Sequence};
pub use driver::{find_motifs, find_motifs_parallel, ConvergencePolicy, MotifResult};
pub use error::MotifError;
pub use rng::Rng;
