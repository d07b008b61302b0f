use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::tempdir;

use super::*;

/// Records conversions and writes a marker file instead of real stacks
#[derive(Default)]
struct RecordingConverter {
    converted: RefCell<Vec<(PathBuf, PathBuf)>>,
}

impl StackConverter for RecordingConverter {
    fn convert_stack(&self, src: &Path, dst: &Path) -> Result<(), MaterializeError> {
        fs::write(dst, src.display().to_string())?;
        self.converted
            .borrow_mut()
            .push((src.to_path_buf(), dst.to_path_buf()));
        Ok(())
    }

    fn append_image(&self, _src: &ImageLocation, _dst: &Path, _index: u32) -> Result<(), MaterializeError> {
        Ok(())
    }
}

fn touch(path: &Path) -> PathBuf {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"data").unwrap();
    path.to_path_buf()
}

fn count_symlinks(dir: &Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_symlink()).unwrap_or(false))
        .count()
}

#[test]
fn test_policy_decision() {
    assert_eq!(Policy::decide("mrcs", "mrcs", true), Policy::ConvertAll);
    assert_eq!(Policy::decide("mrcs", "mrcs", false), Policy::LinkRoot);
    assert_eq!(Policy::decide("mrc", "mrcs", false), Policy::LinkEach);
    assert_eq!(Policy::decide("hdf", "mrcs", false), Policy::ConvertEach);
    assert_eq!(Policy::decide("spi", "mrcs", false), Policy::Skip);
}

#[test]
fn test_same_extension_links_root_once() {
    let dir = tempdir().unwrap();
    let a = touch(&dir.path().join("Runs/001/extra/a.mrcs"));
    let b = touch(&dir.path().join("Runs/002/extra/b.mrcs"));
    let out = dir.path().join("job/extra");

    let mapping = materialize(
        &[a.clone(), b.clone()],
        &out,
        DEFAULT_EXTENSION,
        false,
        &RecordingConverter::default(),
    )
    .unwrap();

    let input = out.join(INPUT_DIR);
    assert!(fs::symlink_metadata(&input).unwrap().file_type().is_symlink());
    assert_eq!(count_symlinks(&out), 1);
    assert_eq!(mapping.get(&a), Some(input.join("001/extra/a.mrcs").as_path()));
    assert_eq!(mapping.get(&b), Some(input.join("002/extra/b.mrcs").as_path()));

    // the link is relative and resolves to the real data
    assert!(fs::read_link(&input).unwrap().is_relative());
    assert_eq!(fs::read(mapping.get(&a).unwrap()).unwrap(), b"data");
}

#[test]
fn test_existing_root_link_is_reused() {
    let dir = tempdir().unwrap();
    let a = touch(&dir.path().join("src/a.mrcs"));
    let out = dir.path().join("out");
    let converter = RecordingConverter::default();

    materialize(&[a.clone()], &out, "mrcs", false, &converter).unwrap();
    let mapping = materialize(&[a.clone()], &out, "mrcs", false, &converter).unwrap();
    assert_eq!(mapping.len(), 1);
    assert!(mapping.get(&a).unwrap().exists());
}

#[test]
fn test_single_image_mrc_links_each_file() {
    let dir = tempdir().unwrap();
    let files = vec![
        touch(&dir.path().join("mics/m1.mrc")),
        touch(&dir.path().join("mics/m2.mrc")),
        touch(&dir.path().join("mics/m3.mrc")),
    ];
    let out = dir.path().join("out");

    let mapping = materialize(&files, &out, "mrcs", false, &RecordingConverter::default()).unwrap();

    let input = out.join(INPUT_DIR);
    assert_eq!(count_symlinks(&input), 3);
    assert_eq!(mapping.get(&files[1]), Some(input.join("m2.mrcs").as_path()));
    for (_, dst) in mapping.iter() {
        assert_eq!(fs::read(dst).unwrap(), b"data");
    }
}

#[test]
fn test_colliding_basenames_get_suffix() {
    let dir = tempdir().unwrap();
    let first = touch(&dir.path().join("run1/particles.mrc"));
    let second = touch(&dir.path().join("run2/particles.mrc"));
    let out = dir.path().join("out");

    let mapping = materialize(
        &[first.clone(), second.clone()],
        &out,
        "mrcs",
        false,
        &RecordingConverter::default(),
    )
    .unwrap();

    let input = out.join(INPUT_DIR);
    assert_eq!(mapping.get(&first), Some(input.join("particles.mrcs").as_path()));
    assert_eq!(
        mapping.get(&second),
        Some(input.join("particles_00002.mrcs").as_path())
    );
    assert!(mapping.get(&first).unwrap().exists());
    assert!(mapping.get(&second).unwrap().exists());
}

#[test]
fn test_force_convert_writes_into_output_dir() {
    let dir = tempdir().unwrap();
    let a = touch(&dir.path().join("a/stack.mrcs"));
    let b = touch(&dir.path().join("b/stack.mrcs"));
    let out = dir.path().join("out");
    let converter = RecordingConverter::default();

    let mapping = materialize(&[a.clone(), b.clone()], &out, "mrcs", true, &converter).unwrap();

    assert_eq!(converter.converted.borrow().len(), 2);
    assert_eq!(mapping.get(&a), Some(out.join("stack.mrcs").as_path()));
    assert_eq!(mapping.get(&b), Some(out.join("stack_00002.mrcs").as_path()));
    assert!(!out.join(INPUT_DIR).exists());
}

#[test]
fn test_hdf_sources_are_converted_under_input() {
    let dir = tempdir().unwrap();
    let a = touch(&dir.path().join("eman/ptcls.hdf"));
    let out = dir.path().join("out");
    let converter = RecordingConverter::default();

    let mapping = materialize(&[a.clone()], &out, "mrcs", false, &converter).unwrap();
    assert_eq!(mapping.get(&a), Some(out.join(INPUT_DIR).join("ptcls.mrcs").as_path()));
}

#[test]
fn test_unknown_format_leaves_mapping_empty() {
    let dir = tempdir().unwrap();
    let a = touch(&dir.path().join("spider/stack.spi"));
    let out = dir.path().join("out");

    let mapping = materialize(&[a], &out, "mrcs", false, &RecordingConverter::default()).unwrap();
    assert!(mapping.is_empty());
    assert!(!out.exists());
}

#[test]
fn test_mixed_extensions_fail() {
    let dir = tempdir().unwrap();
    let files = vec![
        touch(&dir.path().join("a.mrcs")),
        touch(&dir.path().join("b.mrc")),
    ];
    let err = materialize(&files, dir.path(), "mrcs", false, &RecordingConverter::default()).unwrap_err();
    match err {
        MaterializeError::MixedExtensions { found } => assert_eq!(found, vec!["mrcs", "mrc"]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_common_root_of_parents() {
    let files = vec![
        PathBuf::from("/data/Runs/1/extra/a.mrcs"),
        PathBuf::from("/data/Runs/2/b.mrcs"),
    ];
    assert_eq!(common_root(&files), Some(PathBuf::from("/data/Runs")));
    assert_eq!(common_root(&files[..1]), Some(PathBuf::from("/data/Runs/1/extra")));
    assert_eq!(common_root(&[]), None);
}

#[test]
fn test_relative_path() {
    assert_eq!(
        relative_path(Path::new("/a/b/c"), Path::new("/a/d")).unwrap(),
        PathBuf::from("../b/c")
    );
    assert_eq!(
        relative_path(Path::new("/a/b"), Path::new("/a/b")).unwrap(),
        PathBuf::from(".")
    );
}

#[test]
fn test_format_converter_routes_by_extension() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing.mrcs");
    let err = FormatConverter
        .convert_stack(&missing, &dir.path().join("out.mrcs"))
        .unwrap_err();
    assert!(matches!(err, MaterializeError::Mrc(_)));

    let hdf = touch(&dir.path().join("eman/ptcls.hdf"));
    let err = FormatConverter
        .convert_stack(&hdf, &dir.path().join("ptcls.mrcs"))
        .unwrap_err();
    if cfg!(feature = "hdf") {
        assert!(!matches!(err, MaterializeError::Mrc(_)));
    } else {
        assert!(matches!(err, MaterializeError::Unsupported { .. }));
    }
}
