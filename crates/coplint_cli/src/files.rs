//! File discovery.

use std::path::{Component, Path, PathBuf};

use tracing::{info, warn};
use walkdir::{DirEntry, WalkDir};

/// Expands `paths` into the files to inspect, as absolute paths.
///
/// Files named directly are always inspected. Directories are walked for
/// files with one of `extensions`, skipping hidden entries. Symlinks are
/// never followed.
pub fn discover(paths: &[PathBuf], cwd: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        let path = absolute(cwd, path);
        let Ok(metadata) = path.symlink_metadata() else {
            warn!("{} does not exist", path.display());
            continue;
        };
        if metadata.is_file() {
            files.push(path);
        } else if metadata.is_dir() {
            let walker = WalkDir::new(&path)
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e));
            for entry in walker.filter_map(|e| e.ok()) {
                if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
                    files.push(entry.into_path());
                }
            }
        }
    }

    files.sort();
    files.dedup();

    info!("Discovered {} files to inspect", files.len());
    files
}

/// `path` joined to `cwd`, with `.` components removed.
pub fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    cwd.join(path)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// `path` relative to `cwd` when it lies below it.
pub fn display(path: &Path, cwd: &Path) -> String {
    path.strip_prefix(cwd).unwrap_or(path).display().to_string()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_str().is_some_and(|name| name.starts_with('.'))
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}
