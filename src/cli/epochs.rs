use anyhow::Result;
use std::path::PathBuf;

use cryodrgn_io::drgn::{DrgnVersion, TrainingOutput};

/// Print the last completed epoch of a training directory
pub fn run(dir: PathBuf) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Directory does not exist: {}", dir.display());
    }

    let output = TrainingOutput::new(&dir, 1, DrgnVersion::default());
    match output.last_epoch()? {
        Some(epoch) => {
            println!("Last epoch: {} ({} completed)", epoch, epoch + 1);
            println!("  Embeddings: {}", output.z_file(epoch).display());
            println!("  Weights:    {}", output.weights_file(epoch).display());
        }
        None => println!("No completed epochs in {}", dir.display()),
    }

    Ok(())
}
