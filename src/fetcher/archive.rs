use std::fs;
use std::io::{self, Read, Seek};
use std::path::Path;

use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::model::Ecosystem;

/// Unpacks every entry of a zip archive into `dest`.
///
/// Returns the number of archive entries. Anything wrong with the archive
/// itself, including entry data that fails to inflate or to match its CRC and
/// entry names that would escape `dest`, is a corrupt archive. Only failures
/// writing to `dest` are reported as I/O errors.
pub fn extract<R: Read + Seek>(ecosystem: Ecosystem, reader: R, dest: &Path) -> Result<usize> {
    let corrupt = |source: ZipError| Error::CorruptArchive { ecosystem, source };

    let mut zip = ZipArchive::new(reader).map_err(corrupt)?;
    let entries = zip.len();

    for index in 0..entries {
        let mut entry = zip.by_index(index).map_err(corrupt)?;
        let Some(name) = entry.enclosed_name() else {
            return Err(corrupt(ZipError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("entry {:?} escapes the extraction directory", entry.name()),
            ))));
        };
        let target = dest.join(name);

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }

        // Read the whole entry first so decode errors never leave a partial file.
        let mut content = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut content)
            .map_err(|io| corrupt(ZipError::Io(io)))?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, content)?;
    }

    Ok(entries)
}
