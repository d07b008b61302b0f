//! # EMAN2 HDF Stacks
//!
//! EMAN2 keeps each image of a stack as its own dataset,
//! `MDF/images/<i>/image`, with `i` counted from 0 and the pixel size in the
//! `EMAN.apix_x` attribute of the image group. Images are read as 32-bit
//! floats and written out as mode 2 MRC frames.

use std::path::Path;

use byteorder::{WriteBytesExt, LE};
use hdf5::File as HdfFile;
use log::debug;

use crate::materialize::{MaterializeError, StackConverter};
use crate::mrc::{append_frame, MrcHeader};
use crate::particles::ImageLocation;

/// Group holding one subgroup per image
pub const IMAGES_GROUP: &str = "MDF/images";

const APIX_ATTR: &str = "EMAN.apix_x";

/// MRC mode for 32-bit float voxels
const MODE_FLOAT: u32 = 2;

/// Number of images in an EMAN2 stack
pub fn image_count<P: AsRef<Path>>(path: P) -> Result<u32, MaterializeError> {
    let file = HdfFile::open(path)?;
    count_images(&file)
}

fn count_images(file: &HdfFile) -> Result<u32, MaterializeError> {
    let names = file.group(IMAGES_GROUP)?.member_names()?;
    Ok(names.iter().filter(|n| n.parse::<u32>().is_ok()).count() as u32)
}

/// Read the 1-based image `index` as a single-frame header and little-endian float bytes
pub fn read_image<P: AsRef<Path>>(path: P, index: u32) -> Result<(MrcHeader, Vec<u8>), MaterializeError> {
    let path = path.as_ref();
    let file = HdfFile::open(path)?;
    read_image_from(&file, path, index)
}

fn read_image_from(file: &HdfFile, path: &Path, index: u32) -> Result<(MrcHeader, Vec<u8>), MaterializeError> {
    let group = file.group(&format!("{}/{}", IMAGES_GROUP, index.saturating_sub(1)))?;
    let dataset = group.dataset("image")?;

    let (ny, nx) = match dataset.shape().as_slice() {
        [ny, nx] | [1, ny, nx] => (*ny as u32, *nx as u32),
        other => {
            return Err(MaterializeError::Unsupported {
                path: path.to_path_buf(),
                message: format!("image {} has shape {:?}, expected a 2D image", index, other),
            })
        }
    };

    let pixels = dataset.read_raw::<f32>()?;
    let apix = group
        .attr(APIX_ATTR)
        .and_then(|attr| attr.read_scalar::<f32>())
        .unwrap_or(1.0);

    let mut data = Vec::with_capacity(pixels.len() * 4);
    for value in pixels {
        data.write_f32::<LE>(value)?;
    }

    Ok((MrcHeader::stack(nx, ny, 1, MODE_FLOAT, apix), data))
}

/// [`StackConverter`] for EMAN2 `.hdf` sources
#[derive(Debug, Clone, Copy, Default)]
pub struct HdfConverter;

impl StackConverter for HdfConverter {
    fn convert_stack(&self, src: &Path, dst: &Path) -> Result<(), MaterializeError> {
        let file = HdfFile::open(src)?;
        let count = count_images(&file)?;
        if dst.exists() {
            std::fs::remove_file(dst)?;
        }
        for index in 1..=count {
            let (header, data) = read_image_from(&file, src, index)?;
            append_frame(dst, &header, index, &data)?;
        }
        debug!("Converted {} EMAN2 images from {} to {}", count, src.display(), dst.display());
        Ok(())
    }

    fn append_image(&self, src: &ImageLocation, dst: &Path, index: u32) -> Result<(), MaterializeError> {
        let (header, data) = read_image(&src.path, src.index.unwrap_or(1))?;
        append_frame(dst, &header, index, &data)?;
        Ok(())
    }
}
