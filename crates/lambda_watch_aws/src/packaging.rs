//! Discovery of deployable function directories and ZIP packaging.

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use thiserror::Error;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::function_config::FUNCTION_CONFIG_FILE;

pub const DEFAULT_PATH_FILTER: &str = "**";
const DEFAULT_FILE_MODE: u32 = 0o644;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDetails {
    pub source_path: PathBuf,
    pub archive_path: PathBuf,
    pub config_path: PathBuf,
}

#[derive(Debug, Error)]
pub enum PackagingError {
    #[error("invalid path filter `{filter}`: {source}")]
    Filter {
        filter: String,
        #[source]
        source: globset::Error,
    },
    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write archive {}: {source}", path.display())]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

fn path_filter(filter: &str) -> Result<GlobMatcher, PackagingError> {
    GlobBuilder::new(filter)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|source| PackagingError::Filter {
            filter: filter.to_string(),
            source,
        })
}

/// Every directory below `base_path` that matches `filter` (relative to
/// `base_path`) and holds a function descriptor, sorted by path.
pub fn discover_functions(
    base_path: &Path,
    deploy_path: &Path,
    filter: &str,
) -> Result<Vec<FunctionDetails>, PackagingError> {
    let matcher = path_filter(filter)?;
    let mut functions = Vec::new();

    for entry in WalkDir::new(base_path)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = entry.map_err(|source| PackagingError::Walk {
            path: base_path.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let source_path = entry.path();
        let config_path = source_path.join(FUNCTION_CONFIG_FILE);
        if !config_path.is_file() {
            continue;
        }

        let Ok(relative) = source_path.strip_prefix(base_path) else {
            continue;
        };
        if !matcher.is_match(relative) {
            continue;
        }

        let mut archive_name = relative.as_os_str().to_os_string();
        archive_name.push(".zip");
        functions.push(FunctionDetails {
            source_path: source_path.to_path_buf(),
            archive_path: deploy_path.join(archive_name),
            config_path,
        });
    }

    Ok(functions)
}

/// Zips every file below the function directory into `archive_path` and
/// returns the archive bytes.
pub fn package_function(details: &FunctionDetails) -> Result<Vec<u8>, PackagingError> {
    let archive = build_archive(&details.source_path)?;

    if let Some(parent) = details.archive_path.parent() {
        fs::create_dir_all(parent).map_err(|source| PackagingError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(&details.archive_path, &archive).map_err(|source| PackagingError::Io {
        path: details.archive_path.clone(),
        source,
    })?;

    Ok(archive)
}

fn build_archive(source_path: &Path) -> Result<Vec<u8>, PackagingError> {
    let zip_error = |source| PackagingError::Zip {
        path: source_path.to_path_buf(),
        source,
    };
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for entry in WalkDir::new(source_path).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|source| PackagingError::Walk {
            path: source_path.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(source_path) else {
            continue;
        };
        let name = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let io_error = |source| PackagingError::Io {
            path: entry.path().to_path_buf(),
            source,
        };
        let metadata = entry.metadata().map_err(|source| PackagingError::Walk {
            path: entry.path().to_path_buf(),
            source,
        })?;
        let body = fs::read(entry.path()).map_err(io_error)?;

        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(file_mode(&metadata));
        zip.start_file(name, options).map_err(zip_error)?;
        zip.write_all(&body).map_err(io_error)?;
    }

    let cursor = zip.finish().map_err(zip_error)?;
    Ok(cursor.into_inner())
}

#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    match metadata.permissions().mode() & 0o777 {
        0 => DEFAULT_FILE_MODE,
        mode => mode,
    }
}

#[cfg(not(unix))]
fn file_mode(_metadata: &fs::Metadata) -> u32 {
    DEFAULT_FILE_MODE
}
