//! Directory enumeration and the data behind a listing page.

use std::{fs::Metadata, io, path::Path, time::SystemTime};

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::fs;
use tracing::warn;

use crate::{error::ServeError, links::UrlPath};

const MODIFIED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Metadata of one child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub is_dir: bool,
    /// Byte size; 0 for directories.
    pub size: u64,
    /// Local time, `YYYY-MM-DD HH:MM:SS`.
    pub modified: String,
}

/// An entry together with its links, ready for rendering.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: String,
    /// Browse link for directories, view link for files.
    pub href: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_href: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ListingPage {
    /// Encoded URL of the listed directory.
    pub path: String,
    pub parent: Option<String>,
    pub entries: Vec<DirectoryEntry>,
}

impl ListingPage {
    pub fn new(location: &UrlPath, entries: Vec<Entry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| {
                let links = location.entry_links(&entry);
                DirectoryEntry {
                    name: entry.name,
                    is_dir: entry.is_dir,
                    size: entry.size,
                    modified: entry.modified,
                    href: links.primary,
                    download_href: links.download,
                }
            })
            .collect();

        Self {
            path: location.dir_url(),
            parent: location.parent_url(),
            entries,
        }
    }
}

/// Directories first, then byte-wise by name.
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
}

pub fn format_modified(time: SystemTime) -> String {
    let datetime: DateTime<Local> = time.into();
    datetime.format(MODIFIED_FORMAT).to_string()
}

/// Reads the immediate children of `dir`, sorted.
pub async fn list_directory(dir: &Path) -> Result<Vec<Entry>, ServeError> {
    let metadata = fs::metadata(dir)
        .await
        .map_err(|e| ServeError::from_io(dir, e))?;
    if !metadata.is_dir() {
        return Err(ServeError::NotADirectory(dir.to_path_buf()));
    }

    let mut reader = fs::read_dir(dir)
        .await
        .map_err(|e| ServeError::from_io(dir, e))?;

    let mut entries = Vec::new();
    while let Some(child) = reader
        .next_entry()
        .await
        .map_err(|e| ServeError::from_io(dir, e))?
    {
        let child_path = child.path();
        let name = match child.file_name().into_string() {
            Ok(n) => n,
            Err(_) => {
                warn!(
                    "Skipping entry with non-UTF8 filename in {}",
                    dir.display()
                );
                continue;
            }
        };

        match entry_metadata(&child_path).await {
            Ok(metadata) => entries.push(entry_from_metadata(&child_path, name, &metadata)),
            Err(e) => {
                warn!("Failed to get metadata for {}: {}", child_path.display(), e);
                continue;
            }
        }
    }

    sort_entries(&mut entries);
    Ok(entries)
}

/// Follows symlinks, falling back to the link itself when it dangles.
async fn entry_metadata(path: &Path) -> std::io::Result<Metadata> {
    match fs::metadata(path).await {
        Ok(metadata) => Ok(metadata),
        Err(_) => fs::symlink_metadata(path).await,
    }
}

fn entry_from_metadata(path: &Path, name: String, metadata: &Metadata) -> Entry {
    let is_dir = metadata.is_dir();
    Entry {
        name,
        is_dir,
        size: if is_dir { 0 } else { metadata.len() },
        modified: modified_or_blank(path, metadata.modified()),
    }
}

/// Formats the modification time, or leaves it blank when the platform
/// cannot report one.
fn modified_or_blank(path: &Path, modified: io::Result<SystemTime>) -> String {
    match modified {
        Ok(time) => format_modified(time),
        Err(e) => {
            warn!(
                "Failed to get modification time for {}: {}",
                path.display(),
                e
            );
            String::new()
        }
    }
}
