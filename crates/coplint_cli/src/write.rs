//! Writing files without following symlinks.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use miette::{IntoDiagnostic, Result, WrapErr, miette};
use tempfile::NamedTempFile;

/// Replaces the contents of an existing regular file.
///
/// The new contents go to a temporary file next to `path`, which is then
/// renamed over it, so an interrupted write leaves the original intact.
/// Fails if `path` is a symlink.
pub fn overwrite(path: &Path, contents: &str) -> Result<()> {
    let metadata = fs::symlink_metadata(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to inspect {}", path.display()))?;
    if !metadata.is_file() {
        return Err(miette!("Refusing to write {}: not a regular file", path.display()));
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to create a temporary file in {}", dir.display()))?;
    temp.write_all(contents.as_bytes()).into_diagnostic()?;
    temp.as_file()
        .set_permissions(metadata.permissions())
        .into_diagnostic()?;
    temp.persist(path)
        .map_err(|e| e.error)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

/// Creates `path`, replacing whatever is there. A symlink at `path` is
/// removed, never written through.
pub fn replace(path: &Path, contents: &str) -> Result<()> {
    loop {
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.custom_flags(libc::O_NOFOLLOW);
        }

        match options.open(path) {
            Ok(mut file) => return file.write_all(contents.as_bytes()).into_diagnostic(),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e).into_diagnostic(),
            },
            Err(e) => return Err(e).into_diagnostic(),
        }
    }
}
