//! Test fixtures shared by unit tests
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_fixtures::{build_tar_gz, create_temp_dir};
//!
//! #[test]
//! fn my_test() {
//!     let temp = create_temp_dir();
//!     let archive = build_tar_gz(&[("rules.yaml", b"- rule: x")]);
//! }
//! ```

#![allow(clippy::expect_used)]

use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;

/// Create a temporary directory that is removed when dropped
pub fn create_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Build a gzip-compressed tar archive from `(path, contents)` pairs
pub fn build_tar_gz(files: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (name, data) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, *data)
            .expect("Failed to append archive entry");
    }

    builder
        .into_inner()
        .expect("Failed to finish tar archive")
        .finish()
        .expect("Failed to finish gzip stream")
}

/// Write a `.tar.gz` archive into `dir` and return its file name
pub fn write_tar_gz(dir: &Path, filename: &str, files: &[(&str, &[u8])]) -> String {
    std::fs::write(dir.join(filename), build_tar_gz(files)).expect("Failed to write archive");
    filename.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_tar_gz_is_gzip() {
        let archive = build_tar_gz(&[("a.txt", &b"a"[..])]);
        assert_eq!(&archive[..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn test_write_tar_gz() {
        let temp = create_temp_dir();
        let name = write_tar_gz(temp.path(), "x.tar.gz", &[("a.txt", &b"a"[..])]);
        assert!(temp.path().join(name).is_file());
    }
}
