#[macro_use]
extern crate log;

use std::path::{Path, PathBuf};
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};

pub use crate::tempdir::{ActualTempDir, TempDir};
mod tempdir;

/// An io error, tagged with the operation and path that caused it.
#[derive(Debug, thiserror::Error)]
#[error("{action}: '{}'", path.display())]
pub struct Error {
    action: &'static str,
    path: PathBuf,
    #[source]
    source: io::Error,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    fn new(action: &'static str, path: &Path, source: io::Error) -> Self
    { Error { action, path: path.to_owned(), source } }

    pub fn path(&self) -> &Path { &self.path }
    pub fn kind(&self) -> io::ErrorKind { self.source.kind() }
}

trait ResultExt<T> {
    fn context(self, action: &'static str, path: &Path) -> Result<T>;
}

impl<T> ResultExt<T> for io::Result<T> {
    fn context(self, action: &'static str, path: &Path) -> Result<T>
    { self.map_err(|e| Error::new(action, path, e)) }
}

/// Wrapper around `File::open` that adds context.
pub fn open<P: AsRef<Path>>(path: P) -> Result<File>
{
    let path = path.as_ref();
    File::open(path).context("while opening file", path)
}

/// Wrapper around `File::open` that adds context and makes a `BufReader`.
pub fn open_text<P: AsRef<Path>>(path: P) -> Result<BufReader<File>>
{ open(path).map(BufReader::new) }

/// Read a whole file into a string.
pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String>
{
    let path = path.as_ref();
    let mut s = String::new();
    open(path)?.read_to_string(&mut s).context("while reading file", path)?;
    Ok(s)
}

/// Wrapper around `File::create` that adds context.
pub fn create<P: AsRef<Path>>(path: P) -> Result<File>
{
    let path = path.as_ref();
    File::create(path).context("could not create file", path)
}

/// Wrapper around `std::fs::create_dir` that adds context.
pub fn create_dir<P: AsRef<Path>>(dir: P) -> Result<()>
{
    let dir = dir.as_ref();
    fs::create_dir(dir).context("could not create directory", dir)
}

/// Wrapper around `std::fs::create_dir_all` that adds context.
pub fn create_dir_all<P: AsRef<Path>>(dir: P) -> Result<()>
{
    let dir = dir.as_ref();
    fs::create_dir_all(dir).context("could not create directory", dir)
}

/// Wrapper around `std::fs::canonicalize` that adds context.
pub fn canonicalize<P: AsRef<Path>>(path: P) -> Result<PathBuf>
{
    let path = path.as_ref();
    fs::canonicalize(path).context("could not normalize", path)
}

/// Wrapper around `std::fs::rename` that adds context.
pub fn rename<P: AsRef<Path>, Q: AsRef<Path>>(src: P, dest: Q) -> Result<()>
{
    let (src, dest) = (src.as_ref(), dest.as_ref());
    fs::rename(src, dest).context("could not rename file", src)
}

/// Wrapper around `std::fs::remove_file` that adds context.
pub fn remove_file<P: AsRef<Path>>(path: P) -> Result<()>
{
    let path = path.as_ref();
    fs::remove_file(path).context("could not remove file", path)
}

/// Write a file so that readers never observe a partial write.
///
/// The data goes to a hidden sibling file first, which is then renamed over
/// the destination. Both live in the same directory, so the rename stays on
/// one filesystem. On failure the temporary file is removed.
pub fn write_atomic<P: AsRef<Path>>(path: P, data: &[u8]) -> Result<()>
{
    let path = path.as_ref();
    let temp = temp_sibling(path);

    let written = File::create(&temp)
        .and_then(|mut file| {
            file.write_all(data)?;
            file.sync_all()
        })
        .context("could not write temporary file", &temp)
        .and_then(|()| rename(&temp, path));

    if written.is_err() {
        if let Err(e) = fs::remove_file(&temp) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("could not clean up '{}': {}", temp.display(), e);
            }
        }
    }
    written
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_name = format!(".{}.tmp{}", name, std::process::id());
    match path.parent() {
        Some(parent) => parent.join(temp_name),
        None => PathBuf::from(temp_name),
    }
}

/// Simulates `rm -rf`.
///
/// Properties:
/// * Deletes files and folders alike.
/// * Does not require the path or its ancestors to exist.
/// * **Does** fail if other problems occur (e.g. insufficient permissions).
/// * Does **not** follow symbolic links.
pub fn rm_rf<P: AsRef<Path>>(path: P) -> Result<()>
{
    let path = path.as_ref();

    // directoryness is only checked *after* failed deletion, to reduce race conditions
    match fs::remove_file(path) {
        Ok(()) => return Ok(()),
        Err(e) => match e.kind() {
            io::ErrorKind::NotFound => return Ok(()),
            _ if path.is_dir() => {},
            _ => return Err(Error::new("could not delete", path, e)),
        },
    }

    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) => match e.kind() {
            io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::new("could not delete", path, e)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_replaces_and_cleans_up() {
        let tmp = TempDir::new("asgrid-fs-util").unwrap();
        let path = tmp.path().join("values.json");

        write_atomic(&path, b"[1.0]").unwrap();
        write_atomic(&path, b"[2.0, 3.0]").unwrap();
        assert_eq!(read_to_string(&path).unwrap(), "[2.0, 3.0]");

        let leftovers: Vec<_> = fs::read_dir(tmp.path()).unwrap()
            .map(|e| e.unwrap().file_name())
            .filter(|name| name.to_string_lossy().contains(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "{:?}", leftovers);
    }

    #[test]
    fn atomic_write_into_missing_dir_fails_with_path() {
        let tmp = TempDir::new("asgrid-fs-util").unwrap();
        let path = tmp.path().join("nope").join("values.json");

        let err = write_atomic(&path, b"[]").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn rm_rf_is_quiet_about_missing_paths() {
        let tmp = TempDir::new("asgrid-fs-util").unwrap();
        let dir = tmp.path().join("a");
        create_dir_all(dir.join("b")).unwrap();
        write_atomic(dir.join("b").join("c"), b"").unwrap();

        rm_rf(&dir).unwrap();
        assert!(!dir.exists());
        rm_rf(&dir).unwrap();
    }
}
