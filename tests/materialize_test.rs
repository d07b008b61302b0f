//! Integration tests for binary materialization with the MRC converter

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use cryodrgn_io::materialize::{materialize, MaterializeError, INPUT_DIR};
use cryodrgn_io::mrc::{read_frame, MrcConverter, MrcError, MrcHeader};
use tempfile::tempdir;

fn write_volume_like(path: &Path, nz: u32, mz: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut header = MrcHeader::stack(2, 2, nz, 2, 1.2);
    // a volume header: one section per map
    header.ispg = 1;
    header.mz = mz;
    let mut writer = BufWriter::new(File::create(path).unwrap());
    header.write(&mut writer).unwrap();
    for z in 0..nz {
        for _ in 0..4 {
            writer.write_all(&(z as f32).to_le_bytes()).unwrap();
        }
    }
    writer.flush().unwrap();
}

/// Test that forced conversion rewrites files as image stacks
#[test]
fn test_force_convert_rewrites_as_stack() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("maps/run_it025.map");
    write_volume_like(&src, 3, 3);

    let out = dir.path().join("out");
    let mapping = materialize(&[src.clone()], &out, "mrcs", true, &MrcConverter).unwrap();

    let dst = mapping.get(&src).unwrap();
    assert_eq!(dst, out.join("run_it025.mrcs"));
    assert!(!out.join(INPUT_DIR).exists());

    let header = MrcHeader::read_file(dst).unwrap();
    assert_eq!((header.nx, header.ny, header.nz, header.mode), (2, 2, 3, 2));
    assert_eq!(header.ispg, 0);
    assert!((header.pixel_size() - 1.2).abs() < 1e-6);

    let (_, frame) = read_frame(dst, 3).unwrap();
    assert_eq!(&frame[..4], &2f32.to_le_bytes());
}

/// Test that a second run reuses the root link instead of failing
#[test]
fn test_rerun_reuses_root_link() {
    let dir = tempdir().unwrap();
    let files: Vec<PathBuf> = ["Runs/extract/a.mrcs", "Runs/extract/b.mrcs"]
        .iter()
        .map(|f| dir.path().join(f))
        .collect();
    for f in &files {
        write_volume_like(f, 1, 1);
    }

    let out = dir.path().join("out");
    let first = materialize(&files, &out, "mrcs", false, &MrcConverter).unwrap();
    let second = materialize(&files, &out, "mrcs", false, &MrcConverter).unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(
        first.iter().collect::<Vec<_>>(),
        second.iter().collect::<Vec<_>>()
    );

    let linked = first.get(&files[1]).unwrap();
    assert_eq!(linked, out.join(INPUT_DIR).join("b.mrcs"));
    assert!(read_frame(linked, 1).is_ok());
}

/// Test that unreadable formats surface the converter error
#[test]
fn test_hdf_conversion_is_unsupported_by_mrc_converter() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("legacy/particles.hdf");
    fs::create_dir_all(src.parent().unwrap()).unwrap();
    fs::write(&src, b"not an mrc").unwrap();

    let err = materialize(&[src], &dir.path().join("out"), "mrcs", false, &MrcConverter).unwrap_err();
    assert!(matches!(
        err,
        MaterializeError::Mrc(MrcError::UnsupportedFormat(_))
    ));
}
