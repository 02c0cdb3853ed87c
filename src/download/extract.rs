use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{Error, ExtractError, LayoutError, Result};
use crate::report::Reporter;

/// Folder macOS archivers add next to the real content
const MACOS_METADATA_DIR: &str = "__MACOSX";

/// Empty `dest_dir`, then extract every entry of the zip file into it
pub fn extract_zip(zip_path: &Path, dest_dir: &Path, reporter: &mut impl Reporter) -> Result<()> {
    let corrupt = |source: ZipError| ExtractError {
        path: zip_path.to_path_buf(),
        source,
    };

    clean_dir(dest_dir)?;

    let file = File::open(zip_path)
        .map_err(|e| Error::io(format!("Failed to open zip file: {:?}", zip_path), e))?;
    let reader = BufReader::new(file);
    let mut archive = ZipArchive::new(reader).map_err(corrupt)?;

    let total_files = archive.len();
    for i in 0..total_files {
        let mut entry = archive.by_index(i).map_err(corrupt)?;

        // Entries escaping the destination (`../`, absolute paths) are rejected
        let relative = entry.enclosed_name().ok_or_else(|| {
            corrupt(ZipError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("entry {:?} escapes the archive root", entry.name()),
            )))
        })?;
        let dest_path = dest_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&dest_path)
                .map_err(|e| Error::io(format!("Failed to create directory: {:?}", dest_path), e))?;
        } else {
            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| Error::io(format!("Failed to create directory: {:?}", parent), e))?;
            }
            let mut dest_file = File::create(&dest_path)
                .map_err(|e| Error::io(format!("Failed to create file: {:?}", dest_path), e))?;

            // A truncated or corrupt entry surfaces as a read error from the decompressor
            io::copy(&mut entry, &mut dest_file).map_err(|e| {
                if e.kind() == io::ErrorKind::InvalidData || e.kind() == io::ErrorKind::UnexpectedEof {
                    Error::from(corrupt(ZipError::Io(e)))
                } else {
                    Error::io(format!("Failed to extract: {:?}", dest_path), e)
                }
            })?;
        }

        reporter.set_progress(i as u64 + 1, total_files as u64, "extracting");
    }

    tracing::info!(archive = ?zip_path, files = total_files, dest = ?dest_dir, "archive extracted");
    Ok(())
}

/// The single data directory inside an extracted archive
pub fn source_root(extract_dir: &Path) -> Result<PathBuf> {
    let entries = fs::read_dir(extract_dir)
        .map_err(|e| Error::io(format!("Failed to list: {:?}", extract_dir), e))?;

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(format!("Failed to list: {:?}", extract_dir), e))?;
        let path = entry.path();
        if path.is_dir() && entry.file_name() != MACOS_METADATA_DIR {
            dirs.push(path);
        }
    }

    match dirs.len() {
        0 => Err(LayoutError::Missing(extract_dir.to_path_buf()).into()),
        1 => Ok(dirs.remove(0)),
        _ => {
            let mut found: Vec<String> = dirs
                .iter()
                .filter_map(|d| d.file_name().map(|n| n.to_string_lossy().into_owned()))
                .collect();
            found.sort();
            Err(LayoutError::Ambiguous {
                root: extract_dir.to_path_buf(),
                found,
            }
            .into())
        }
    }
}

/// Remove `dir` and anything in it, then recreate it empty
fn clean_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)
            .map_err(|e| Error::io(format!("Failed to clear directory: {:?}", dir), e))?;
    }
    fs::create_dir_all(dir)
        .map_err(|e| Error::io(format!("Failed to create directory: {:?}", dir), e))
}
