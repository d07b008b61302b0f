//! # MRC Stacks
//!
//! Minimal MRC2014 support: enough of the 1024-byte header to address frames,
//! frame-level copy, and whole-stack rewrite as an image stack (`.mrcs`).
//! Voxel values are never decoded; frames move as raw bytes in their native mode.
//!
//! Format reference: <https://www.ccpem.ac.uk/mrc_format/mrc2014.php>

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use log::debug;

use crate::materialize::{MaterializeError, StackConverter};
use crate::particles::ImageLocation;

/// Size of the fixed MRC header in bytes
pub const HEADER_SIZE: u64 = 1024;

/// MRC2014 format version stamp (word 28)
const MRC_VERSION: i32 = 20140;

/// Extensions the MRC reader understands
pub const MRC_EXTENSIONS: &[&str] = &["mrc", "mrcs", "map", "st", "ali"];

/// Errors that can occur while reading or writing MRC files
#[derive(Debug, thiserror::Error)]
pub enum MrcError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Voxel mode not handled by this reader
    #[error("Unsupported MRC mode {0}")]
    UnsupportedMode(u32),

    /// Big-endian files are not handled
    #[error("Unsupported byte order in {0}; only little-endian MRC files are handled")]
    UnsupportedByteOrder(String),

    /// Source format is not MRC
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// Frame index outside the stack
    #[error("Frame {index} out of range for {path} ({frames} frames)")]
    FrameOutOfRange {
        /// Stack path
        path: String,
        /// Requested 1-based index
        index: u32,
        /// Frames in the stack
        frames: u32,
    },

    /// Appended frame does not match the destination stack
    #[error("Frame shape {found} does not match stack {path} ({expected})")]
    ShapeMismatch {
        /// Destination stack
        path: String,
        /// Stack frame shape and mode
        expected: String,
        /// Incoming frame shape and mode
        found: String,
    },
}

/// The header fields needed to address and rewrite frames
#[derive(Debug, Clone, PartialEq)]
pub struct MrcHeader {
    /// Columns
    pub nx: u32,
    /// Rows
    pub ny: u32,
    /// Sections (frames for a stack)
    pub nz: u32,
    /// Voxel data type
    pub mode: u32,
    /// Sampling along Z (1 for image stacks)
    pub mz: u32,
    /// Cell lengths in Å
    pub cell: [f32; 3],
    /// Space group: 0 for image stacks, 1 for volumes
    pub ispg: i32,
    /// Bytes of extended header after the main header
    pub nsymbt: u32,
}

impl MrcHeader {
    /// Header for an image stack of `nz` frames
    pub fn stack(nx: u32, ny: u32, nz: u32, mode: u32, pixel_size: f32) -> Self {
        Self {
            nx,
            ny,
            nz,
            mode,
            mz: 1,
            cell: [nx as f32 * pixel_size, ny as f32 * pixel_size, pixel_size],
            ispg: 0,
            nsymbt: 0,
        }
    }

    /// Pixel size derived from the cell and grid sampling along X
    pub fn pixel_size(&self) -> f32 {
        if self.nx == 0 {
            return 0.0;
        }
        self.cell[0] / self.nx as f32
    }

    /// Bytes per voxel for the header's mode
    pub fn bytes_per_voxel(&self) -> Result<u64, MrcError> {
        match self.mode {
            0 => Ok(1),
            1 | 6 | 12 => Ok(2),
            2 | 3 => Ok(4),
            4 => Ok(8),
            other => Err(MrcError::UnsupportedMode(other)),
        }
    }

    /// Bytes of one frame
    pub fn frame_bytes(&self) -> Result<u64, MrcError> {
        Ok(self.nx as u64 * self.ny as u64 * self.bytes_per_voxel()?)
    }

    /// Offset of the first voxel
    pub fn data_offset(&self) -> u64 {
        HEADER_SIZE + self.nsymbt as u64
    }

    fn shape(&self) -> String {
        format!("{}x{} mode {}", self.nx, self.ny, self.mode)
    }

    /// Read a header from the start of a stream
    pub fn read<R: Read + Seek>(r: &mut R) -> Result<Self, MrcError> {
        r.seek(SeekFrom::Start(0))?;

        // the machine stamp lives at word 54; refuse big-endian files up front
        r.seek(SeekFrom::Start(53 * 4))?;
        let mut stamp = [0u8; 4];
        r.read_exact(&mut stamp)?;
        if stamp[0] == 0x11 {
            return Err(MrcError::UnsupportedByteOrder(format!("{:02x?}", stamp)));
        }

        r.seek(SeekFrom::Start(0))?;
        let nx = r.read_u32::<LE>()?;
        let ny = r.read_u32::<LE>()?;
        let nz = r.read_u32::<LE>()?;
        let mode = r.read_u32::<LE>()?;

        // words 8-10: grid sampling (word n starts at byte 4 * (n - 1))
        r.seek(SeekFrom::Start(7 * 4))?;
        let _mx = r.read_u32::<LE>()?;
        let _my = r.read_u32::<LE>()?;
        let mz = r.read_u32::<LE>()?;

        // words 11-13: cell lengths
        let mut cell = [0f32; 3];
        for c in &mut cell {
            *c = r.read_f32::<LE>()?;
        }

        // words 23-24
        r.seek(SeekFrom::Start(22 * 4))?;
        let ispg = r.read_i32::<LE>()?;
        let nsymbt = r.read_u32::<LE>()?;

        Ok(Self {
            nx,
            ny,
            nz,
            mode,
            mz,
            cell,
            ispg,
            nsymbt,
        })
    }

    /// Read the header of a file
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Self, MrcError> {
        let mut file = File::open(path)?;
        Self::read(&mut file)
    }

    /// Write the full 1024-byte header; the extended header is never written
    pub fn write<W: Write>(&self, w: &mut W) -> Result<(), MrcError> {
        // words 1-4
        w.write_u32::<LE>(self.nx)?;
        w.write_u32::<LE>(self.ny)?;
        w.write_u32::<LE>(self.nz)?;
        w.write_u32::<LE>(self.mode)?;

        // words 5-7: start indices
        for _ in 0..3 {
            w.write_i32::<LE>(0)?;
        }

        // words 8-10: grid sampling
        w.write_u32::<LE>(self.nx)?;
        w.write_u32::<LE>(self.ny)?;
        w.write_u32::<LE>(self.mz)?;

        // words 11-16: cell lengths and angles
        for c in self.cell {
            w.write_f32::<LE>(c)?;
        }
        for _ in 0..3 {
            w.write_f32::<LE>(90.0)?;
        }

        // words 17-19: axis order
        w.write_i32::<LE>(1)?;
        w.write_i32::<LE>(2)?;
        w.write_i32::<LE>(3)?;

        // words 20-22: density statistics are not tracked
        for _ in 0..3 {
            w.write_f32::<LE>(0.0)?;
        }

        // words 23-24
        w.write_i32::<LE>(self.ispg)?;
        w.write_u32::<LE>(0)?;

        // words 25-27, then the version stamp at word 28
        w.write_all(&[0u8; 4 * 3])?;
        w.write_i32::<LE>(MRC_VERSION)?;

        // words 29-52: extra space and origin
        w.write_all(&[0u8; 4 * 24])?;

        // word 53: "MAP ", word 54: little-endian machine stamp
        w.write_all(b"MAP ")?;
        w.write_all(&[0x44, 0x44, 0x00, 0x00])?;

        // words 55-256: rms, label count and labels
        w.write_all(&[0u8; 4 * 202])?;

        Ok(())
    }
}

/// Whether an extension (without dot) names an MRC-family file
pub fn is_mrc_extension(ext: &str) -> bool {
    MRC_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
}

fn check_mrc_path(path: &Path) -> Result<(), MrcError> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();
    if is_mrc_extension(&ext) {
        Ok(())
    } else {
        Err(MrcError::UnsupportedFormat(path.display().to_string()))
    }
}

/// Read the raw bytes of a 1-based frame
pub fn read_frame<P: AsRef<Path>>(path: P, index: u32) -> Result<(MrcHeader, Vec<u8>), MrcError> {
    let path = path.as_ref();
    check_mrc_path(path)?;

    let mut file = File::open(path)?;
    let header = MrcHeader::read(&mut file)?;
    if index == 0 || index > header.nz {
        return Err(MrcError::FrameOutOfRange {
            path: path.display().to_string(),
            index,
            frames: header.nz,
        });
    }

    let frame_bytes = header.frame_bytes()?;
    file.seek(SeekFrom::Start(
        header.data_offset() + (index as u64 - 1) * frame_bytes,
    ))?;
    let mut data = vec![0u8; frame_bytes as usize];
    file.read_exact(&mut data)?;

    Ok((header, data))
}

/// Write a frame at a 1-based index, creating the stack from `template` if needed
pub fn append_frame<P: AsRef<Path>>(
    path: P,
    template: &MrcHeader,
    index: u32,
    data: &[u8],
) -> Result<(), MrcError> {
    let path = path.as_ref();

    if !path.exists() {
        let mut header = MrcHeader::stack(
            template.nx,
            template.ny,
            0,
            template.mode,
            template.pixel_size(),
        );
        header.nz = 0;
        let mut writer = BufWriter::new(File::create(path)?);
        header.write(&mut writer)?;
        writer.flush()?;
    }

    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    let header = MrcHeader::read(&mut file)?;
    if header.nx != template.nx || header.ny != template.ny || header.mode != template.mode {
        return Err(MrcError::ShapeMismatch {
            path: path.display().to_string(),
            expected: header.shape(),
            found: template.shape(),
        });
    }

    let frame_bytes = header.frame_bytes()?;
    if data.len() as u64 != frame_bytes {
        return Err(MrcError::ShapeMismatch {
            path: path.display().to_string(),
            expected: format!("{} bytes", frame_bytes),
            found: format!("{} bytes", data.len()),
        });
    }

    let index = index.max(1);
    file.seek(SeekFrom::Start(
        header.data_offset() + (index as u64 - 1) * frame_bytes,
    ))?;
    file.write_all(data)?;

    if index > header.nz {
        // word 3
        file.seek(SeekFrom::Start(8))?;
        file.write_u32::<LE>(index)?;
    }
    file.flush()?;

    Ok(())
}

/// Rewrite an MRC-family file as an image stack (`ispg = 0`, `mz = 1`)
pub fn convert_to_stack<P: AsRef<Path>, Q: AsRef<Path>>(src: P, dst: Q) -> Result<MrcHeader, MrcError> {
    let (src, dst) = (src.as_ref(), dst.as_ref());
    check_mrc_path(src)?;

    let mut input = BufReader::new(File::open(src)?);
    let header = MrcHeader::read(&mut input)?;
    let out_header = MrcHeader::stack(header.nx, header.ny, header.nz, header.mode, header.pixel_size());

    let data_len = header.frame_bytes()? * header.nz as u64;
    input.seek(SeekFrom::Start(header.data_offset()))?;

    let mut output = BufWriter::new(File::create(dst)?);
    out_header.write(&mut output)?;
    let copied = io::copy(&mut input.by_ref().take(data_len), &mut output)?;
    output.flush()?;

    debug!("Rewrote {} frames ({} bytes) from {} as {}", header.nz, copied, src.display(), dst.display());
    Ok(out_header)
}

/// [`StackConverter`] for MRC-family sources
#[derive(Debug, Clone, Copy, Default)]
pub struct MrcConverter;

impl StackConverter for MrcConverter {
    fn convert_stack(&self, src: &Path, dst: &Path) -> Result<(), MaterializeError> {
        convert_to_stack(src, dst)?;
        Ok(())
    }

    fn append_image(&self, src: &ImageLocation, dst: &Path, index: u32) -> Result<(), MaterializeError> {
        let (header, data) = read_frame(&src.path, src.index.unwrap_or(1))?;
        append_frame(dst, &header, index, &data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_stack(path: &Path, nx: u32, ny: u32, frames: &[u8]) {
        let header = MrcHeader::stack(nx, ny, frames.len() as u32, 0, 1.5);
        let mut writer = BufWriter::new(File::create(path).unwrap());
        header.write(&mut writer).unwrap();
        for &value in frames {
            writer
                .write_all(&vec![value; (nx * ny) as usize])
                .unwrap();
        }
        writer.flush().unwrap();
    }

    #[test]
    fn test_header_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stack.mrcs");
        write_stack(&path, 4, 3, &[1, 2]);

        assert_eq!(std::fs::metadata(&path).unwrap().len(), HEADER_SIZE + 2 * 12);
        let header = MrcHeader::read_file(&path).unwrap();
        assert_eq!((header.nx, header.ny, header.nz, header.mode), (4, 3, 2, 0));
        assert_eq!(header.ispg, 0);
        assert!((header.pixel_size() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_non_square_header_keeps_sampling_and_cell() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("stack.mrcs");
        let dst = dir.path().join("copy.mrcs");
        write_stack(&src, 4, 3, &[1]);

        let header = MrcHeader::read_file(&src).unwrap();
        assert_eq!(header.mz, 1);
        assert_eq!(header.cell, [6.0, 4.5, 1.5]);

        let out = convert_to_stack(&src, &dst).unwrap();
        assert_eq!(out.cell, [6.0, 4.5, 1.5]);
        let reread = MrcHeader::read_file(&dst).unwrap();
        assert_eq!(reread, header);
    }

    #[test]
    fn test_read_frame_bounds() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stack.mrcs");
        write_stack(&path, 2, 2, &[7, 9]);

        let (_, data) = read_frame(&path, 2).unwrap();
        assert_eq!(data, vec![9; 4]);
        assert!(matches!(
            read_frame(&path, 3),
            Err(MrcError::FrameOutOfRange { frames: 2, .. })
        ));
        assert!(matches!(read_frame(&path, 0), Err(MrcError::FrameOutOfRange { .. })));
    }

    #[test]
    fn test_append_frames_grows_stack() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src.mrcs");
        let dst = dir.path().join("out.mrcs");
        write_stack(&src, 2, 2, &[3, 5, 8]);

        let converter = MrcConverter;
        for (i, frame) in [3u32, 1].iter().enumerate() {
            converter
                .append_image(&ImageLocation::new(*frame, &src), &dst, i as u32 + 1)
                .unwrap();
        }

        let header = MrcHeader::read_file(&dst).unwrap();
        assert_eq!(header.nz, 2);
        assert_eq!(read_frame(&dst, 1).unwrap().1, vec![8; 4]);
        assert_eq!(read_frame(&dst, 2).unwrap().1, vec![3; 4]);
    }

    #[test]
    fn test_append_rejects_shape_mismatch() {
        let dir = tempdir().unwrap();
        let small = dir.path().join("small.mrcs");
        let big = dir.path().join("big.mrcs");
        let dst = dir.path().join("out.mrcs");
        write_stack(&small, 2, 2, &[1]);
        write_stack(&big, 3, 3, &[1]);

        MrcConverter
            .append_image(&ImageLocation::new(1, &small), &dst, 1)
            .unwrap();
        let err = MrcConverter
            .append_image(&ImageLocation::new(1, &big), &dst, 2)
            .unwrap_err();
        assert!(matches!(err, MaterializeError::Mrc(MrcError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_convert_volume_to_stack() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("vol.mrc");
        let dst = dir.path().join("vol.mrcs");

        let mut header = MrcHeader::stack(2, 2, 2, 0, 2.0);
        header.ispg = 1;
        header.mz = 2;
        let mut writer = BufWriter::new(File::create(&src).unwrap());
        header.write(&mut writer).unwrap();
        writer.write_all(&[1, 1, 1, 1, 2, 2, 2, 2]).unwrap();
        writer.flush().unwrap();
        drop(writer);

        let out = convert_to_stack(&src, &dst).unwrap();
        assert_eq!(out.ispg, 0);
        assert_eq!(out.mz, 1);
        assert_eq!(read_frame(&dst, 2).unwrap().1, vec![2; 4]);
    }

    #[test]
    fn test_non_mrc_source_is_rejected() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("particles.hdf");
        std::fs::write(&src, b"not an mrc").unwrap();
        assert!(matches!(
            convert_to_stack(&src, dir.path().join("out.mrcs")),
            Err(MrcError::UnsupportedFormat(_))
        ));
    }
}
