//! Asynchronous filesystem primitives with errors tagged by operation and path.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use same_file::is_same_file;
use tokio::fs;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{BundleError, Result};

/// Create `dir` and its parents; succeeds when it already exists.
pub async fn ensure_dir(dir: &Path) -> Result<()> {
  fs::create_dir_all(dir)
    .await
    .map_err(|err| BundleError::fs("create directory", dir, err))
}

/// Write `contents` to `path`, replacing any previous file.
pub async fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
  fs::write(path, contents)
    .await
    .map_err(|err| BundleError::fs("write", path, err))
}

/// Read `path` fully into memory.
pub async fn read_file(path: &Path) -> Result<Vec<u8>> {
  fs::read(path)
    .await
    .map_err(|err| BundleError::fs("read", path, err))
}

/// Rename `from` onto `to`. Replaces an existing file at `to`.
pub async fn move_file(from: &Path, to: &Path) -> Result<()> {
  fs::rename(from, to)
    .await
    .map_err(|err| BundleError::fs("move", from, err))
}

/// Recursively delete `dir`; a missing directory is not an error.
pub async fn remove_dir_all_if_exists(dir: &Path) -> Result<()> {
  match fs::remove_dir_all(dir).await {
    Ok(()) => Ok(()),
    Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
    Err(err) => Err(BundleError::fs("remove", dir, err)),
  }
}

/// Copy a file or directory tree from `source` to `destination`.
///
/// Existing destination files are overwritten. Copying a file onto itself is a no-op.
pub async fn copy_recursive(source: &Path, destination: &Path) -> Result<()> {
  let metadata = fs::metadata(source)
    .await
    .map_err(|err| BundleError::fs("copy", source, err))?;

  if metadata.is_dir() {
    let source = source.to_path_buf();
    let destination = destination.to_path_buf();
    return tokio::task::spawn_blocking(move || copy_tree(&source, &destination)).await?;
  }

  if fs::try_exists(destination).await.unwrap_or(false)
    && is_same_file(source, destination).unwrap_or(false)
  {
    debug!(path = %source.display(), "source and destination are the same file");
    return Ok(());
  }

  fs::copy(source, destination)
    .await
    .map(|_| ())
    .map_err(|err| BundleError::fs("copy", source, err))
}

fn copy_tree(source: &Path, destination: &Path) -> Result<()> {
  for entry in WalkDir::new(source) {
    let entry = entry.map_err(|err| BundleError::fs("walk", source, err.into()))?;
    let relative = entry
      .path()
      .strip_prefix(source)
      .map(Path::to_path_buf)
      .unwrap_or_else(|_| PathBuf::new());
    let target = destination.join(&relative);

    if entry.file_type().is_dir() {
      std::fs::create_dir_all(&target)
        .map_err(|err| BundleError::fs("create directory", &target, err))?;
    } else {
      std::fs::copy(entry.path(), &target)
        .map_err(|err| BundleError::fs("copy", entry.path(), err))?;
    }
  }
  Ok(())
}
