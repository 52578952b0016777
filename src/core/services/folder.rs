//! Folder services.
//!
//! There are two services:
//!
//! - [`collect_downloads`]: it resolves a direct download link for every file
//!   in one folder.
//! - [`list_recursive`]: it walks the whole drive and returns every folder
//!   with its contents.
use std::collections::VecDeque;

use tracing::warn;

use crate::core::drive::{self, Drive, DownloadLink, FileEntry, FileId, FolderEntry, FolderId};

/// One file in a folder, with its resolved download link or the reason
/// resolving it failed.
#[derive(Debug)]
pub struct FileDownload {
    pub file_id: FileId,
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    pub link: Result<DownloadLink, drive::Error>,
}

/// Every file of one folder with its download link.
#[derive(Debug)]
pub struct FolderDownloads {
    pub folder_id: FolderId,
    pub files: Vec<FileDownload>,
}

/// One folder and its contents, as returned by [`list_recursive`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct FolderNode {
    pub folder_id: FolderId,
    pub name: String,
    pub folders: Vec<FolderEntry>,
    pub files: Vec<FileEntry>,
}

/// It enumerates the files of one folder and resolves a direct download link
/// for each of them.
///
/// Link resolutions are independent: a failure is recorded on its entry and
/// the remaining files still get their links.
///
/// # Errors
///
/// Will return a `drive::Error` only when the folder itself cannot be listed.
pub async fn collect_downloads(drive: &dyn Drive, folder_id: &FolderId) -> Result<FolderDownloads, drive::Error> {
    let listing = drive.list_folder(folder_id).await?;

    let mut files = Vec::with_capacity(listing.files.len());

    for entry in listing.files {
        let link = drive.fetch_file(&entry.file_id).await;

        if let Err(err) = &link {
            warn!("could not resolve a download link for file {} ({}): {err}", entry.file_id, entry.name);
        }

        files.push(FileDownload {
            file_id: entry.file_id,
            name: entry.name,
            size: entry.size,
            link,
        });
    }

    Ok(FolderDownloads {
        folder_id: folder_id.clone(),
        files,
    })
}

/// It walks the drive breadth-first from the root folder and returns every
/// folder with its contents. The root comes first.
///
/// # Errors
///
/// Will return a `drive::Error` if any folder along the walk cannot be
/// listed.
pub async fn list_recursive(drive: &dyn Drive) -> Result<Vec<FolderNode>, drive::Error> {
    let mut nodes = vec![];

    let mut pending = VecDeque::from([(FolderId::root(), "/".to_owned())]);

    while let Some((folder_id, name)) = pending.pop_front() {
        let listing = drive.list_folder(&folder_id).await?;

        for folder in &listing.folders {
            pending.push_back((folder.folder_id.clone(), folder.name.clone()));
        }

        nodes.push(FolderNode {
            folder_id,
            name,
            folders: listing.folders,
            files: listing.files,
        });
    }

    Ok(nodes)
}
