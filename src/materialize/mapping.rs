use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Original stack path to materialized path, in the order files were visited
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileMapping {
    entries: Vec<(PathBuf, PathBuf)>,
    #[serde(skip)]
    index: HashMap<PathBuf, usize>,
}

impl FileMapping {
    /// Empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mapping, replacing any previous destination for `src`
    pub fn insert(&mut self, src: PathBuf, dst: PathBuf) {
        match self.index.get(&src) {
            Some(&i) => self.entries[i].1 = dst,
            None => {
                self.index.insert(src.clone(), self.entries.len());
                self.entries.push((src, dst));
            }
        }
    }

    /// Destination for a source file
    pub fn get(&self, src: &Path) -> Option<&Path> {
        self.index.get(src).map(|&i| self.entries[i].1.as_path())
    }

    /// Whether a destination is already taken by some source
    pub fn is_destination(&self, dst: &Path) -> bool {
        self.entries.iter().any(|(_, d)| d == dst)
    }

    /// Number of mapped files
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was materialized
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(source, destination)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.entries.iter().map(|(s, d)| (s.as_path(), d.as_path()))
    }
}
