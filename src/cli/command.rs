use anyhow::{Context, Result};
use log::{info, warn};
use std::path::PathBuf;

use super::config::Config;

/// Print or run the shell line for a cryoDRGN program
pub fn run(
    program: String,
    gpus: Option<Vec<u32>>,
    config: Option<PathBuf>,
    execute: bool,
    args: Vec<String>,
) -> Result<()> {
    let mut launcher = Config::load(config.as_deref())?.launcher;
    if let Some(gpus) = gpus {
        launcher = launcher.with_gpus(gpus);
    }

    let version = launcher
        .active_version()
        .context("Cannot tell the cryoDRGN release from the environment activation")?;
    info!("cryoDRGN {} ({})", version, version.env_name());
    if !version.is_supported() {
        warn!("cryoDRGN {} is not a supported release", version);
    }

    if execute {
        launcher.run(&program, &args)?;
    } else {
        println!("{}", launcher.shell_line(&program, &args));
    }

    Ok(())
}
