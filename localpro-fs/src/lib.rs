//! Shared filesystem helpers built on `cap-std` and `camino`.
//!
//! Every helper resolves an ambient directory for the parent of the target
//! and then operates on the final component, so callers can pass absolute or
//! relative UTF-8 paths alike.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io;
use std::path::Component;

/// Resolve the ambient parent directory of `path` together with its final
/// component.
pub fn open_dir_and_name(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("{path} should end in a file name")))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, name))
}

/// Create `path` and any missing ancestors.
pub fn ensure_dir(path: &Utf8Path) -> io::Result<()> {
    if path.as_str().is_empty() || path == Utf8Path::new("/") {
        return Ok(());
    }
    let (base_dir, relative) = split_ambient_base(path)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    base_dir.create_dir_all(&relative)
}

/// Write `contents` to `path`, replacing any existing file.
pub fn write_file(path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
    let (dir, name) = open_dir_and_name(path)?;
    dir.write(name.as_str(), contents)
}

/// Read the full contents of `path`.
pub fn read_file(path: &Utf8Path) -> io::Result<Vec<u8>> {
    let (dir, name) = open_dir_and_name(path)?;
    dir.read(name.as_str())
}

/// Return whether a path exists and is a regular file.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = open_dir_and_name(path)?;
    dir.metadata(name.as_str()).map(|meta| meta.is_file())
}

/// Return whether a path exists and is a directory.
pub fn path_is_dir(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = open_dir_and_name(path)?;
    dir.metadata(name.as_str()).map(|meta| meta.is_dir())
}

/// List the names of subdirectories directly inside `path`.
///
/// Names come back sorted so callers see a stable order.
pub fn list_subdirectories(path: &Utf8Path) -> io::Result<Vec<String>> {
    let dir = fs_utf8::Dir::open_ambient_dir(path, ambient_authority())?;
    let mut names = Vec::new();
    for entry in dir.entries()? {
        let item = entry?;
        if item.file_type()?.is_dir() {
            names.push(item.file_name()?);
        }
    }
    names.sort();
    Ok(names)
}

/// Rename `from` to `to`; both must share a parent directory.
pub fn rename_sibling(from: &Utf8Path, to: &Utf8Path) -> io::Result<()> {
    if from.parent() != to.parent() {
        return Err(io::Error::other(format!(
            "{from} and {to} must live in the same directory"
        )));
    }
    let (dir, from_name) = open_dir_and_name(from)?;
    let to_name = to
        .file_name()
        .ok_or_else(|| io::Error::other(format!("{to} should end in a file name")))?;
    dir.rename(from_name.as_str(), &dir, to_name)
}

/// Remove a directory and everything beneath it, ignoring a missing target.
pub fn remove_dir_all_if_present(path: &Utf8Path) -> io::Result<()> {
    let (dir, name) = open_dir_and_name(path)?;
    match dir.remove_dir_all(name.as_str()) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Split a path into an ambient base directory and the suffix relative to it.
///
/// Absolute paths resolve against their root (or Windows prefix); relative
/// paths resolve against the current directory.
fn split_ambient_base(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_path = path.as_std_path();
    let base = match std_path.components().next() {
        Some(Component::Prefix(prefix)) => {
            let prefix_str = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            Utf8PathBuf::from(prefix_str).join(std::path::MAIN_SEPARATOR.to_string())
        }
        Some(Component::RootDir) => Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string()),
        _ => {
            let dir = fs_utf8::Dir::open_ambient_dir(".", ambient_authority())?;
            return Ok((dir, path.to_path_buf()));
        }
    };
    let relative = path
        .strip_prefix(&base)
        .map_err(|_| io::Error::other(format!("failed to strip {base} from {path}")))?
        .to_path_buf();
    let dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    Ok((dir, relative))
}
