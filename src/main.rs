//! # cryodrgn-io
//!
//! Command-line front end for writing Relion STAR files from particle sets
//! and for inspecting cryoDRGN inputs and outputs.
//!
//! ## Usage
//!
//! ```bash
//! # Write a STAR file, linking stacks under out/
//! cryodrgn-io write-star particles.json out/particles.star --output-dir out
//!
//! # Summarize a STAR file
//! cryodrgn-io info out/particles.star
//!
//! # Last completed training epoch
//! cryodrgn-io epochs train/
//!
//! # Show the shell line for a cryoDRGN program
//! cryodrgn-io command train_vae --gpus 0,1 -- particles.mrcs --zdim 8
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
