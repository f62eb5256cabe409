use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::{TEMP_FILE_EXTENSION, TEMP_FILE_PREFIX};

const SUFFIX_LEN: usize = 8;
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Eight distinct random lowercase ASCII letters
pub fn random_suffix<R: Rng + ?Sized>(rng: &mut R) -> String {
    LOWERCASE
        .choose_multiple(rng, SUFFIX_LEN)
        .map(|&b| b as char)
        .collect()
}

/// `<dir>/tmp_io-perf_<hostname>_<suffix>.npy`
pub fn temp_file_path<R: Rng + ?Sized>(dir: &Path, hostname: &str, rng: &mut R) -> PathBuf {
    dir.join(format!(
        "{}_{}_{}.{}",
        TEMP_FILE_PREFIX,
        hostname,
        random_suffix(rng),
        TEMP_FILE_EXTENSION
    ))
}

/// Benchmark data file with scoped handle and cleanup.
///
/// The handle is released by [`TempFile::close`]; [`TempFile::remove`]
/// deletes the file and reports failures. If neither happens (an error
/// aborted the iteration) the file is removed on drop, ignoring errors.
pub struct TempFile {
    path: PathBuf,
    file: Option<File>,
    cleanup_on_drop: bool,
}

impl TempFile {
    /// Create or truncate the file at `path`
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            cleanup_on_drop: true,
        })
    }

    /// Open handle, an error once the file has been closed
    pub fn file_mut(&mut self) -> io::Result<&mut File> {
        self.file.as_mut().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::Other,
                format!("{} is already closed", self.path.display()),
            )
        })
    }

    /// Release the file handle
    pub fn close(&mut self) {
        self.file.take();
    }

    /// Disable automatic cleanup
    pub fn keep_on_drop(&mut self) {
        self.cleanup_on_drop = false;
    }

    /// Close and delete the file. A file that no longer exists is an error.
    pub fn remove(mut self) -> io::Result<()> {
        self.close();
        self.cleanup_on_drop = false;
        fs::remove_file(&self.path)
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        self.close();
        if self.cleanup_on_drop {
            let _ = fs::remove_file(&self.path);
        }
    }
}
