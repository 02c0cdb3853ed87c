use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// File name the dump is saved under
const ARCHIVE_NAME: &str = "nafstat.zip";

/// Directory the archive is unpacked into, under the download directory
const EXTRACT_SUBDIR: &str = "nafstat";

/// Local directories used by a run
#[derive(Debug, Clone)]
pub struct WorkDirs {
    download_dir: PathBuf,
    extract_dir: PathBuf,
}

impl WorkDirs {
    /// Resolve the directories, falling back to the platform cache directory
    pub fn new(download_dir: Option<PathBuf>, extract_dir: Option<PathBuf>) -> Result<Self> {
        let download_dir = match download_dir {
            Some(dir) => dir,
            None => default_download_dir(),
        };
        let extract_dir = extract_dir.unwrap_or_else(|| download_dir.join(EXTRACT_SUBDIR));

        fs::create_dir_all(&download_dir).map_err(|e| {
            Error::io(format!("Failed to create download directory: {:?}", download_dir), e)
        })?;

        Ok(Self {
            download_dir,
            extract_dir,
        })
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    pub fn extract_dir(&self) -> &Path {
        &self.extract_dir
    }

    /// Where the downloaded archive is written
    pub fn archive_path(&self) -> PathBuf {
        self.download_dir.join(ARCHIVE_NAME)
    }
}

fn default_download_dir() -> PathBuf {
    ProjectDirs::from("", "", "nafstat-sync")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(std::env::temp_dir)
}
