use std::path::Path;

use crate::mrc::MrcConverter;
use crate::particles::ImageLocation;

use super::error::MaterializeError;
use super::paths::extension_of;
use super::StackConverter;

/// [`StackConverter`] picking the reader from the source extension
///
/// `hdf` sources go to the EMAN2 reader when the crate is built with the `hdf`
/// feature; everything else goes to [`MrcConverter`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatConverter;

impl FormatConverter {
    fn for_source(&self, src: &Path) -> Result<&'static dyn StackConverter, MaterializeError> {
        if extension_of(src).ends_with("hdf") {
            hdf_converter(src)
        } else {
            Ok(&MrcConverter)
        }
    }
}

#[cfg(feature = "hdf")]
fn hdf_converter(_src: &Path) -> Result<&'static dyn StackConverter, MaterializeError> {
    Ok(&crate::hdf::HdfConverter)
}

#[cfg(not(feature = "hdf"))]
fn hdf_converter(src: &Path) -> Result<&'static dyn StackConverter, MaterializeError> {
    Err(MaterializeError::Unsupported {
        path: src.to_path_buf(),
        message: "reading EMAN2 HDF stacks requires building with the `hdf` feature".to_string(),
    })
}

impl StackConverter for FormatConverter {
    fn convert_stack(&self, src: &Path, dst: &Path) -> Result<(), MaterializeError> {
        self.for_source(src)?.convert_stack(src, dst)
    }

    fn append_image(&self, src: &ImageLocation, dst: &Path, index: u32) -> Result<(), MaterializeError> {
        self.for_source(&src.path)?.append_image(src, dst, index)
    }
}
