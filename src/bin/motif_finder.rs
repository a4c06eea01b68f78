use clap::Parser;

use motif_gibbs::{Cli, MotifError};

fn main() -> Result<(), MotifError> {
    let cli = Cli::parse();

    cli.run()
}
