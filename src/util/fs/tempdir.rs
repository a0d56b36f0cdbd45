/* ************************************************************************ **
** This file is part of asgrid, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
**                                                                          **
** Be aware that not all of asgrid is provided under this permissive        **
** license, and that the project as a whole is licensed under the GPL 3.0.  **
** ************************************************************************ */

pub use ::tempdir::TempDir as ActualTempDir;

use std::io::Result as IoResult;
use std::path::{Path, PathBuf};

/// Wrapper around `tempdir::TempDir` that keeps the directory if a panic unwinds
/// through it, so that the files of a failed test or trial can be inspected.
///
/// Set `ASGRID_SAVETEMP` to a directory to have leaked tempdirs moved there.
#[derive(Debug)]
pub struct TempDir(Option<ActualTempDir>);

impl From<ActualTempDir> for TempDir {
    fn from(tmp: ActualTempDir) -> Self { TempDir(Some(tmp)) }
}

impl TempDir {
    pub fn new(prefix: &str) -> IoResult<TempDir> {
        ActualTempDir::new(prefix).map(Self::from)
    }

    pub fn new_in(tmpdir: impl AsRef<Path>, prefix: &str) -> IoResult<TempDir> {
        ActualTempDir::new_in(tmpdir, prefix).map(Self::from)
    }

    pub fn path(&self) -> &Path { self.inner().path() }

    /// Persist the directory, returning its path.
    pub fn into_path(mut self) -> PathBuf {
        match self.0.take() {
            Some(tmp) => tmp.into_path(),
            None => unreachable!("TempDir used after being taken"),
        }
    }

    fn inner(&self) -> &ActualTempDir {
        match &self.0 {
            Some(tmp) => tmp,
            None => unreachable!("TempDir used after being taken"),
        }
    }
}

impl AsRef<Path> for TempDir {
    fn as_ref(&self) -> &Path { self.path() }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            return;
        }
        let temp = match self.0.take() {
            Some(temp) => temp.into_path(),
            None => return,
        };

        let dest_dir = match std::env::var_os("ASGRID_SAVETEMP") {
            Some(s) if !s.is_empty() => PathBuf::from(s),
            _ => {
                info!("leaked tempdir at {}", temp.display());
                return;
            },
        };
        let dest = match temp.file_name() {
            Some(name) => dest_dir.join(name),
            None => return,
        };

        // avoid double-panic; everything below only logs
        if let Err(e) = crate::create_dir_all(&dest_dir) {
            warn!("{}", e);
            return;
        }
        match crate::rename(&temp, &dest) {
            Ok(()) => info!("recovered tempdir during panic: {}", dest.display()),
            Err(e) => warn!("failed to recover tempdir during panic: {}", e),
        }
    }
}
