//! Gzip compression of log files.
//!
//! Files are compressed in place: `<name>` becomes `<name>.gz` and the
//! original is removed. On failure the original is left untouched and no
//! partial archive remains.

use flate2::Compression;
use flate2::write::GzEncoder;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Suffix glog-compatible tools append to compressed files.
pub const GZIP_SUFFIX: &str = ".gz";

const TEMP_SUFFIX: &str = ".tmp";

/// Compresses a single file in place.
pub trait Compressor: Send + Sync {
    /// Compress `path`, returning the path of the compressed file.
    ///
    /// On success `path` no longer exists. On error `path` is untouched.
    fn compress(&self, path: &Path) -> io::Result<PathBuf>;
}

/// `path` with `.gz` appended.
pub fn compressed_path(path: &Path) -> PathBuf {
    with_suffix(path, GZIP_SUFFIX)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// In-process gzip compressor backed by `flate2`.
#[derive(Debug, Clone)]
pub struct GzipCompressor {
    level: u32,
}

impl GzipCompressor {
    /// Create a compressor; `level` is clamped to `1..=9`.
    pub fn new(level: u32) -> Self {
        Self {
            level: level.clamp(1, 9),
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }
}

impl Default for GzipCompressor {
    fn default() -> Self {
        Self::new(6)
    }
}

impl Compressor for GzipCompressor {
    fn compress(&self, path: &Path) -> io::Result<PathBuf> {
        let gz_path = compressed_path(path);
        if gz_path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", gz_path.display()),
            ));
        }

        let tmp_path = with_suffix(&gz_path, TEMP_SUFFIX);
        let written = write_gzip(path, &tmp_path, self.level)
            .and_then(|()| fs::rename(&tmp_path, &gz_path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        if let Err(e) = fs::remove_file(path) {
            let _ = fs::remove_file(&gz_path);
            return Err(e);
        }

        debug!(
            original = %path.display(),
            compressed = %gz_path.display(),
            "Compressed log file"
        );
        Ok(gz_path)
    }
}

fn write_gzip(src: &Path, dst: &Path, level: u32) -> io::Result<()> {
    let input = File::open(src)?;
    let permissions = input.metadata()?.permissions();
    let output = File::create(dst)?;

    let mut reader = BufReader::new(input);
    let mut encoder = GzEncoder::new(BufWriter::new(output), Compression::new(level));
    io::copy(&mut reader, &mut encoder)?;

    let file = encoder.finish()?.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    fs::set_permissions(dst, permissions)
}

/// Compressor that shells out to an external program such as `gzip`.
///
/// The program is invoked as `<program> <path>` and must replace `path` with
/// `path.gz`, as `gzip` does.
#[derive(Debug, Clone)]
pub struct ExternalCompressor {
    program: String,
}

impl ExternalCompressor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Compressor for ExternalCompressor {
    fn compress(&self, path: &Path) -> io::Result<PathBuf> {
        let status = Command::new(&self.program).arg(path).status()?;
        if !status.success() {
            return Err(io::Error::other(format!(
                "{} exited with {}",
                self.program, status
            )));
        }

        let gz_path = compressed_path(path);
        if !gz_path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} did not produce {}", self.program, gz_path.display()),
            ));
        }
        Ok(gz_path)
    }
}
