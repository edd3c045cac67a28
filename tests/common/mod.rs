//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use elmwood::forest::Forest;
use elmwood::syntax::utf16_len;
use tempfile::TempDir;
use tower_lsp::lsp_types::{Position, Url};

/// A workspace written to a temporary `src/` directory and loaded into a
/// [`Forest`] the way an embedding server would.
pub struct Workspace {
    _temp_dir: TempDir,
    pub root: PathBuf,
    pub forest: Forest,
}

impl Workspace {
    pub fn new(files: &[(&str, &str)]) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().to_path_buf();
        let src = root.join("src");

        let mut sources = Vec::new();
        for (name, text) in files {
            let path = src.join(name);
            fs::create_dir_all(path.parent().unwrap()).expect("Failed to create source directory");
            fs::write(&path, text).expect("Failed to write source file");
            sources.push((uri_for(&path), fs::read_to_string(&path).unwrap()));
        }

        Workspace {
            _temp_dir: temp_dir,
            root,
            forest: Forest::from_sources(sources),
        }
    }

    pub fn uri(&self, name: &str) -> Url {
        uri_for(&self.root.join("src").join(name))
    }

    /// Position of the `nth` occurrence of `needle` in `name`.
    pub fn locate(&self, name: &str, needle: &str, nth: usize) -> Position {
        let entry = self.forest.get(&self.uri(name)).expect("file in forest");
        let source = entry.tree.source();
        let (offset, _) = source
            .match_indices(needle)
            .nth(nth)
            .unwrap_or_else(|| panic!("{needle:?} #{nth} not found in {name}"));
        let line = source[..offset].matches('\n').count();
        let line_start = source[..offset].rfind('\n').map_or(0, |index| index + 1);
        Position::new(line as u32, utf16_len(&source[line_start..offset]))
    }
}

fn uri_for(path: &Path) -> Url {
    Url::from_file_path(path).expect("absolute path")
}
