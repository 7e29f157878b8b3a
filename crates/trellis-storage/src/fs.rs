//! Filesystem helpers.

use crate::errors::*;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Owner-only file mode for seeds
pub const PRIVATE_FILE_MODE: u32 = 0o600;

/// Owner-only directory mode for the key store
pub const PRIVATE_DIR_MODE: u32 = 0o700;

/// Create `dir` and its parents
pub fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(io_error(dir))
}

/// Create `dir` and its parents, owner-only on unix
pub fn create_private_dir(dir: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(PRIVATE_DIR_MODE);
    }
    builder.create(dir).map_err(io_error(dir))
}

/// Replace `path` with `contents`.
///
/// The data goes to a temp file in the same directory which is then renamed
/// over the target, so readers see either the old or the new file. The parent
/// directory must exist.
pub fn write_atomic(path: &Path, contents: &[u8], mode: Option<u32>) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| StoreError::InvalidName(path.display().to_string()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_error(dir))?;
    tmp.write_all(contents).map_err(io_error(tmp.path()))?;
    tmp.as_file().sync_all().map_err(io_error(tmp.path()))?;

    #[cfg(unix)]
    if let Some(mode) = mode {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(mode))
            .map_err(io_error(tmp.path()))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    tmp.persist(path)
        .map_err(|e| io_error(path)(e.error))?;
    Ok(())
}

/// Read a file to a string, `Ok(None)` if it does not exist
pub fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(path)(e)),
    }
}
