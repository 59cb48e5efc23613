// crates/wbat-trace/src/set.rs

//! On-disk trace sets.
//!
//! A set of `N` recorded executions lives in one directory as
//! `0000.bin … NNNN.bin` (packed bit traces, all of one common byte size),
//! with `NNNN.pt` / `NNNN.ct` holding the 16-byte plaintext and ciphertext
//! of each execution. Traces are streamed through open file handles; only
//! the PT/CT blocks are held in memory.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Violations of the trace directory contract.
#[derive(Debug, Error)]
pub enum InputError {
    /// A required file could not be opened or read.
    #[error("cannot read {path}: {source}")]
    Open {
        /// Offending path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A `.bin` file disagrees with the size established by `0000.bin`.
    #[error("trace {path} is {got} bytes, expected {expected} (trace files must share one size)")]
    SizeMismatch {
        /// Offending path.
        path: PathBuf,
        /// Actual size.
        got: u64,
        /// Size of the first trace.
        expected: u64,
    },

    /// A `.pt` / `.ct` file is not exactly 16 bytes.
    #[error("{path} holds {got} bytes, expected exactly 16")]
    BadBlock {
        /// Offending path.
        path: PathBuf,
        /// Actual size.
        got: usize,
    },

    /// Zero traces requested, or the traces are empty.
    #[error("trace set needs at least one trace with at least one byte")]
    Empty,
}

/// Open handles + metadata for one directory of recorded traces.
#[derive(Debug)]
pub struct TraceSet {
    files: Vec<File>,
    pts: Vec<[u8; 16]>,
    cts: Vec<[u8; 16]>,
    trace_bytes: u64,
}

fn read_block(path: &Path) -> Result<[u8; 16], InputError> {
    let data = fs::read(path).map_err(|source| InputError::Open {
        path: path.to_owned(),
        source,
    })?;
    <[u8; 16]>::try_from(data.as_slice()).map_err(|_| InputError::BadBlock {
        path: path.to_owned(),
        got: data.len(),
    })
}

impl TraceSet {
    /// Filename of trace `i` inside `dir`.
    #[must_use]
    pub fn trace_path(dir: &Path, i: usize) -> PathBuf {
        dir.join(format!("{i:04}.bin"))
    }

    /// Filename of plaintext `i` inside `dir`.
    #[must_use]
    pub fn plaintext_path(dir: &Path, i: usize) -> PathBuf {
        dir.join(format!("{i:04}.pt"))
    }

    /// Filename of ciphertext `i` inside `dir`.
    #[must_use]
    pub fn ciphertext_path(dir: &Path, i: usize) -> PathBuf {
        dir.join(format!("{i:04}.ct"))
    }

    /// Open the first `ntraces` executions recorded under `dir`.
    ///
    /// Validates that every `.bin` shares one size and every `.pt`/`.ct`
    /// holds exactly 16 bytes.
    pub fn open(dir: &Path, ntraces: usize) -> Result<Self, InputError> {
        if ntraces == 0 {
            return Err(InputError::Empty);
        }

        let mut files = Vec::with_capacity(ntraces);
        let mut pts = Vec::with_capacity(ntraces);
        let mut cts = Vec::with_capacity(ntraces);
        let mut trace_bytes: Option<u64> = None;

        for i in 0..ntraces {
            pts.push(read_block(&Self::plaintext_path(dir, i))?);
            cts.push(read_block(&Self::ciphertext_path(dir, i))?);

            let path = Self::trace_path(dir, i);
            let f = File::open(&path).map_err(|source| InputError::Open {
                path: path.clone(),
                source,
            })?;
            let size = f
                .metadata()
                .map_err(|source| InputError::Open {
                    path: path.clone(),
                    source,
                })?
                .len();
            match trace_bytes {
                None => trace_bytes = Some(size),
                Some(expected) if expected != size => {
                    return Err(InputError::SizeMismatch {
                        path,
                        got: size,
                        expected,
                    });
                }
                Some(_) => {}
            }
            files.push(f);
        }

        let trace_bytes = trace_bytes.unwrap_or(0);
        if trace_bytes == 0 {
            return Err(InputError::Empty);
        }

        Ok(Self {
            files,
            pts,
            cts,
            trace_bytes,
        })
    }

    /// Number of traces.
    #[inline]
    #[must_use]
    pub fn ntraces(&self) -> usize {
        self.files.len()
    }

    /// Common byte size of every trace.
    #[inline]
    #[must_use]
    pub fn trace_bytes(&self) -> u64 {
        self.trace_bytes
    }

    /// All plaintexts, in trace order.
    #[inline]
    #[must_use]
    pub fn plaintexts(&self) -> &[[u8; 16]] {
        &self.pts
    }

    /// All ciphertexts, in trace order.
    #[inline]
    #[must_use]
    pub fn ciphertexts(&self) -> &[[u8; 16]] {
        &self.cts
    }

    /// Read the next `buf.len()` bytes of trace `i` at its current position.
    pub(crate) fn read_into(&mut self, i: usize, buf: &mut [u8]) -> std::io::Result<()> {
        self.files[i].read_exact(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_set(dir: &Path, n: usize, trace_bytes: usize) {
        for i in 0..n {
            fs::write(TraceSet::trace_path(dir, i), vec![0xA5; trace_bytes]).unwrap();
            fs::write(TraceSet::plaintext_path(dir, i), [i as u8; 16]).unwrap();
            fs::write(TraceSet::ciphertext_path(dir, i), [0u8; 16]).unwrap();
        }
    }

    #[test]
    fn opens_consistent_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_set(dir.path(), 3, 32);

        let set = TraceSet::open(dir.path(), 3).unwrap();
        assert_eq!(set.ntraces(), 3);
        assert_eq!(set.trace_bytes(), 32);
        assert_eq!(set.plaintexts()[2], [2u8; 16]);
    }

    #[test]
    fn rejects_missing_trace() {
        let dir = tempfile::tempdir().unwrap();
        write_set(dir.path(), 2, 32);

        let err = TraceSet::open(dir.path(), 3).unwrap_err();
        assert!(matches!(err, InputError::Open { .. }), "{err}");
    }

    #[test]
    fn rejects_inconsistent_sizes() {
        let dir = tempfile::tempdir().unwrap();
        write_set(dir.path(), 2, 32);
        fs::write(TraceSet::trace_path(dir.path(), 1), vec![0u8; 16]).unwrap();

        let err = TraceSet::open(dir.path(), 2).unwrap_err();
        assert!(matches!(
            err,
            InputError::SizeMismatch {
                got: 16,
                expected: 32,
                ..
            }
        ));
    }

    #[test]
    fn rejects_short_plaintext() {
        let dir = tempfile::tempdir().unwrap();
        write_set(dir.path(), 1, 8);
        fs::write(TraceSet::plaintext_path(dir.path(), 0), [0u8; 15]).unwrap();

        let err = TraceSet::open(dir.path(), 1).unwrap_err();
        assert!(matches!(err, InputError::BadBlock { got: 15, .. }));
    }

    #[test]
    fn rejects_empty_request() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            TraceSet::open(dir.path(), 0),
            Err(InputError::Empty)
        ));
    }
}
