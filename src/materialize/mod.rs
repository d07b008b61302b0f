//! # Binary File Materializer
//!
//! Makes the stacks referenced by a particle set available under an output
//! directory in the format the consumer reads, by linking where the bytes can
//! be used as they are and converting where they cannot.
//!
//! The decision is taken once for the whole set from the common source
//! extension:
//!
//! 1. forced conversion: every stack is rewritten into the output directory
//! 2. source already in the target format: one directory link `input` to the
//!    common root; paths are rewritten by replacing the root
//! 3. single-image `mrc` with target `mrcs`: one link per file under `input`
//! 4. legacy `hdf` stacks: every stack is converted under `input`
//! 5. anything else: nothing is done and the mapping is empty
//!
//! Conversion goes through the [`StackConverter`] seam. [`FormatConverter`] is
//! the default implementation: MRC-family sources go to
//! [`crate::mrc::MrcConverter`], EMAN2 `hdf` stacks to the HDF reader (behind the
//! `hdf` feature).

mod error;
mod formats;
mod mapping;
mod paths;

#[cfg(test)]
mod tests;

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::particles::ImageLocation;

pub use error::MaterializeError;
pub use formats::FormatConverter;
pub use mapping::FileMapping;
pub use paths::{common_root, extension_of, relative_path, unique_destination};

/// Default target format: a multi-image MRC stack
pub const DEFAULT_EXTENSION: &str = "mrcs";

/// Name of the link or directory created under the output directory
pub const INPUT_DIR: &str = "input";

/// Converts binary image data into MRC stacks
pub trait StackConverter {
    /// Rewrite the whole file `src` as a stack at `dst`
    fn convert_stack(&self, src: &Path, dst: &Path) -> Result<(), MaterializeError>;

    /// Write the single image at `src` as frame `index` (1-based) of stack `dst`
    fn append_image(&self, src: &ImageLocation, dst: &Path, index: u32) -> Result<(), MaterializeError>;
}

/// What the materializer does with the whole file set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Convert every file directly into the output directory
    ConvertAll,
    /// Link the common root directory once
    LinkRoot,
    /// Link every file individually, renaming the extension
    LinkEach,
    /// Convert every file under the `input` directory
    ConvertEach,
    /// Leave the original paths in place
    Skip,
}

impl Policy {
    /// Decide from the source extension, the target extension and the force flag
    pub fn decide(source_ext: &str, target_ext: &str, force_convert: bool) -> Self {
        if force_convert {
            Self::ConvertAll
        } else if source_ext == target_ext {
            Self::LinkRoot
        } else if source_ext == "mrc" && target_ext == "mrcs" {
            Self::LinkEach
        } else if source_ext.ends_with("hdf") {
            Self::ConvertEach
        } else {
            Self::Skip
        }
    }
}

/// Materialize `files` under `output_dir` and return the path mapping
///
/// `files` are the distinct stacks of a particle set, in first-seen order.
pub fn materialize(
    files: &[PathBuf],
    output_dir: &Path,
    extension: &str,
    force_convert: bool,
    converter: &dyn StackConverter,
) -> Result<FileMapping, MaterializeError> {
    let mut mapping = FileMapping::new();
    let Some(first) = files.first() else {
        return Ok(mapping);
    };

    let source_ext = extension_of(first);
    let mut found = vec![source_ext.clone()];
    for ext in files.iter().map(|f| extension_of(f)) {
        if !found.contains(&ext) {
            found.push(ext);
        }
    }
    if found.len() > 1 {
        return Err(MaterializeError::MixedExtensions { found });
    }

    let output_root = if force_convert {
        output_dir.to_path_buf()
    } else {
        output_dir.join(INPUT_DIR)
    };

    let policy = Policy::decide(&source_ext, extension, force_convert);
    debug!(
        "Materializing {} {} file(s) as {}: {:?}",
        files.len(),
        source_ext,
        extension,
        policy
    );

    match policy {
        Policy::Skip => return Ok(mapping),
        Policy::LinkRoot => {
            let root = common_root(files).unwrap_or_default();
            link_root(&root, &output_root)?;
            for file in files {
                let rest = file.strip_prefix(&root).unwrap_or(file);
                mapping.insert(file.clone(), output_root.join(rest));
            }
        }
        Policy::LinkEach => {
            info!("Creating soft links (mrcs -> mrc)");
            fs::create_dir_all(&output_root)?;
            for file in files {
                let dst = unique_destination(file, &output_root, extension, &mapping);
                if !paths::entry_exists(&dst) {
                    let target = relative_path(file, &output_root)?;
                    paths::create_link(&target, &dst, false)?;
                    info!("   {} -> {}", dst.display(), file.display());
                }
                mapping.insert(file.clone(), dst);
            }
        }
        Policy::ConvertAll | Policy::ConvertEach => {
            info!("Converting stacks ({} -> {})", source_ext, DEFAULT_EXTENSION);
            fs::create_dir_all(&output_root)?;
            for file in files {
                let dst = unique_destination(file, &output_root, DEFAULT_EXTENSION, &mapping);
                converter.convert_stack(file, &dst)?;
                info!("   {} -> {}", dst.display(), file.display());
                mapping.insert(file.clone(), dst);
            }
        }
    }

    Ok(mapping)
}

fn link_root(root: &Path, output_root: &Path) -> Result<(), MaterializeError> {
    let root = if root.as_os_str().is_empty() {
        Path::new(".")
    } else {
        root
    };
    info!("Creating soft links");
    info!("   Root: {} -> {}", output_root.display(), root.display());

    if paths::entry_exists(output_root) {
        debug!("Reusing existing {}", output_root.display());
        return Ok(());
    }

    let link_parent = output_root
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(link_parent)?;
    let target = relative_path(root, link_parent)?;
    paths::create_link(&target, output_root, true)?;
    Ok(())
}
