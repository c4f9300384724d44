//! gzip-compressed tar extraction

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use tar::Archive;

/// Extract a `.tar.gz` stream into `dest`, creating it if needed
///
/// Entries that would land outside `dest` (absolute paths, `..`) abort the
/// extraction.
pub fn extract_tar_gz<R: Read>(reader: R, dest: &Path) -> io::Result<()> {
    fs::create_dir_all(dest)?;

    let mut archive = Archive::new(GzDecoder::new(reader));
    archive.set_preserve_permissions(true);
    archive.set_overwrite(true);

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.display().to_string();
        if !entry.unpack_in(dest)? {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("archive entry {path} points outside the destination directory"),
            ));
        }
    }

    Ok(())
}
