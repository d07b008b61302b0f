use std::io;
use std::path::{Component, Path, PathBuf};

use super::FileMapping;

/// Lower-cased extension without the dot, empty when absent
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

/// Longest directory prefix shared by the parent directories of `files`
pub fn common_root(files: &[PathBuf]) -> Option<PathBuf> {
    let mut parents = files.iter().map(|f| f.parent().unwrap_or(Path::new("")));
    let first: Vec<Component<'_>> = parents.next()?.components().collect();

    let shared = parents.fold(first.len(), |shared, parent| {
        first
            .iter()
            .zip(parent.components())
            .take(shared)
            .take_while(|(a, b)| *a == b)
            .count()
    });

    Some(first[..shared].iter().collect())
}

/// Lexical path of `target` as seen from directory `base`
///
/// Both paths are made absolute against the current directory first; symlinks
/// are not resolved.
pub fn relative_path(target: &Path, base: &Path) -> io::Result<PathBuf> {
    let target = normalize(&std::path::absolute(target)?);
    let base = normalize(&std::path::absolute(base)?);

    let t: Vec<_> = target.components().collect();
    let b: Vec<_> = base.components().collect();
    let shared = t.iter().zip(&b).take_while(|(x, y)| x == y).count();

    let mut rel = PathBuf::new();
    for _ in shared..b.len() {
        rel.push("..");
    }
    for c in &t[shared..] {
        rel.push(c.as_os_str());
    }
    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    Ok(rel)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for c in path.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Destination `<dir>/<basename>.<ext>` not yet used in `mapping`
///
/// Collisions get `_00002`, `_00003`, ... appended to the stem.
pub fn unique_destination(src: &Path, dir: &Path, extension: &str, mapping: &FileMapping) -> PathBuf {
    let stem = src
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut candidate = dir.join(format!("{}.{}", stem, extension));
    let mut counter = 1;
    while mapping.is_destination(&candidate) {
        counter += 1;
        candidate = dir.join(format!("{}_{:05}.{}", stem, counter, extension));
    }
    candidate
}

/// Create a symbolic link at `link` pointing to `target`
pub fn create_link(target: &Path, link: &Path, is_dir: bool) -> io::Result<()> {
    #[cfg(unix)]
    {
        let _ = is_dir;
        std::os::unix::fs::symlink(target, link)
    }
    #[cfg(windows)]
    {
        if is_dir {
            std::os::windows::fs::symlink_dir(target, link)
        } else {
            std::os::windows::fs::symlink_file(target, link)
        }
    }
}

/// Whether anything, including a dangling link, exists at `path`
pub fn entry_exists(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}
