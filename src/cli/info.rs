use anyhow::{Context, Result};
use std::path::PathBuf;

use cryodrgn_io::star::StarDocument;

/// Display the tables of a STAR file
pub fn run(file: PathBuf, columns: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let doc = StarDocument::read(&file).context("Failed to read STAR file")?;

    println!("STAR File Information");
    println!("=====================");
    println!("File: {}", file.display());
    println!();

    for table in &doc.tables {
        let name = if table.name.is_empty() { "<unnamed>" } else { &table.name };
        println!("data_{}", name);
        println!("  Columns: {}", table.columns.len());
        println!("  Rows:    {}", table.len());
        if columns {
            for (i, label) in table.columns.iter().enumerate() {
                println!("  {:3}. _{}", i + 1, label);
            }
        }
        println!();
    }

    Ok(())
}
