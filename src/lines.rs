//! Line counting, on the calling thread or as a promise.
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;
use crate::{pair::Consumer, task, Error};

/// Counts the lines of the file at `path`.
///
/// Every newline-terminated line counts, and so does a trailing line without
/// a newline. Bytes are not decoded.
pub fn count_lines_sync(path: impl AsRef<Path>) -> Result<usize, Error> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| Error::file_open(path, err))?;
    let count = count_lines_in(BufReader::new(file)).map_err(|err| Error::read(path, err))?;
    debug!(path = %path.display(), count, "done reading");
    Ok(count)
}

/// Counts the lines produced by `reader`.
pub fn count_lines_in<R: BufRead>(reader: R) -> io::Result<usize> {
    let mut count = 0;
    for line in reader.split(b'\n') {
        line?;
        count += 1;
    }
    Ok(count)
}

/// Counts the lines of the file at `path` on a separate thread.
pub fn count_lines_async(path: impl Into<PathBuf>) -> Consumer<usize> {
    let path = path.into();
    task::spawn(move || count_lines_sync(&path))
}

/// Size of the file at `path` in KiB, measured on a separate thread.
pub fn file_length_kb_async(path: impl Into<PathBuf>) -> Consumer<f64> {
    let path = path.into();
    task::spawn(move || file_length_kb(&path))
}

/// Size of the file at `path` in KiB.
pub fn file_length_kb(path: impl AsRef<Path>) -> Result<f64, Error> {
    let path = path.as_ref();
    let metadata = File::open(path)
        .and_then(|file| file.metadata())
        .map_err(|err| Error::file_open(path, err))?;
    Ok(metadata.len() as f64 / 1024.0)
}
