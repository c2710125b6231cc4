//! Filesystem utilities.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};

/// Remove a directory and all its contents, if it exists.
///
/// Returns whether anything was removed.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(path)
        .with_context(|| format!("failed to remove directory: {}", path.display()))?;
    Ok(true)
}

/// Remove a file, if it exists.
///
/// Returns whether anything was removed.
pub fn remove_file_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("failed to remove file: {}", path.display())),
    }
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Copy a file, creating the destination's parent directories.
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        ensure_dir(parent)?;
    }
    fs::copy(from, to)
        .with_context(|| format!("failed to copy {} to {}", from.display(), to.display()))?;
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Modification time of a file, or None if it can't be determined.
pub fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Join `path` onto `base` unless it is already absolute.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Resolve `.` and `..` components lexically.
///
/// The path does not have to exist and symlinks are not followed. Leading
/// `..` components of a relative path are kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                } else {
                    components.push(component);
                }
            }
            _ => components.push(component),
        }
    }
    components.iter().collect()
}

/// Check if a path is inside another path.
pub fn is_inside(path: &Path, parent: &Path) -> bool {
    path.starts_with(parent)
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("/work/./src/../build")), PathBuf::from("/work/build"));
        assert_eq!(normalize_path(Path::new("sub/../..")), PathBuf::from(".."));
        assert_eq!(normalize_path(Path::new("./.")), PathBuf::new());

        let root = Path::new("/work/app");
        assert!(is_inside(root, &normalize_path(Path::new("/work/app/."))));
        assert!(is_inside(root, &normalize_path(Path::new("/work/app/src/../.."))));
        assert!(!is_inside(root, &normalize_path(Path::new("/work/app/build"))));
    }

    #[test]
    fn test_remove_file_if_exists() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("artifact.o");
        fs::write(&file, "obj").unwrap();

        assert!(remove_file_if_exists(&file).unwrap());
        assert!(!file.exists());
        // Second removal is a no-op
        assert!(!remove_file_if_exists(&file).unwrap());
    }

    #[test]
    fn test_remove_dir_all_if_exists() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("build");
        fs::create_dir_all(dir.join("debug")).unwrap();

        assert!(remove_dir_all_if_exists(&dir).unwrap());
        assert!(!remove_dir_all_if_exists(&dir).unwrap());
    }

    #[test]
    fn test_copy_file_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("libcore.so");
        fs::write(&src, "elf").unwrap();

        let dst = tmp.path().join("prefix/lib/libcore.so");
        copy_file(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(dst).unwrap(), "elf");
    }

    #[test]
    fn test_absolutize() {
        assert_eq!(
            absolutize(Path::new("build/app"), Path::new("/work")),
            PathBuf::from("/work/build/app")
        );
        assert_eq!(
            absolutize(Path::new("/opt/app"), Path::new("/work")),
            PathBuf::from("/opt/app")
        );
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/work"), Path::new("/work/build/debug/app")),
            PathBuf::from("build/debug/app")
        );
    }
}
