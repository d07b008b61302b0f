use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use cryodrgn_io::particles::{AlignType, ParticleSet};
use cryodrgn_io::writer::write_particle_set;

use super::config::Config;

pub struct Options {
    pub input: PathBuf,
    pub output: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub align_type: Option<AlignType>,
    pub no_ctf: bool,
    pub force_convert: bool,
    pub output_stack: Option<PathBuf>,
    pub print_mapping: bool,
    pub config: Option<PathBuf>,
}

/// Write a JSON particle set as a STAR file
pub fn run(opts: Options) -> Result<()> {
    if !opts.input.exists() {
        anyhow::bail!("Input file does not exist: {}", opts.input.display());
    }

    let file_config = Config::load(opts.config.as_deref())?;
    let mut config = file_config.writer_config();
    if opts.output_dir.is_some() {
        config.output_dir = opts.output_dir;
    }
    if opts.align_type.is_some() {
        config.align_type = opts.align_type;
    }
    if opts.no_ctf {
        config.write_ctf = false;
    }
    if opts.force_convert {
        config.force_convert = true;
    }
    if opts.output_stack.is_some() {
        config.output_stack = opts.output_stack;
    }

    let reader = BufReader::new(
        File::open(&opts.input)
            .with_context(|| format!("Failed to open {}", opts.input.display()))?,
    );
    let set: ParticleSet = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse particle set: {}", opts.input.display()))?;

    info!("Input:  {} ({} particles)", opts.input.display(), set.len());
    info!("Output: {}", opts.output.display());
    if let Some(dir) = &config.output_dir {
        info!("Binaries: {} (.{})", dir.display(), config.target_extension());
    }

    let summary = write_particle_set(&set, &opts.output, config).context("STAR export failed")?;

    println!("{}", summary);
    if opts.print_mapping {
        println!("{}", serde_json::to_string_pretty(&summary.file_mapping)?);
    }

    Ok(())
}
