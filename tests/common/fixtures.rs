use seedbox_gateway::core::drive::{ActiveTransfer, FileEntry, FolderEntry, FolderListing};

/// A root listing with one in-flight transfer at the given progress.
#[allow(dead_code)]
pub fn downloading(name: &str, progress: u8) -> FolderListing {
    FolderListing {
        folders: vec![],
        files: vec![],
        transfers: vec![ActiveTransfer {
            transfer_id: "42".to_owned(),
            info_hash: None,
            name: name.to_owned(),
            progress,
        }],
    }
}

/// A root listing where the download has finished into the given folder.
#[allow(dead_code)]
pub fn finished_into(folder_id: &str, name: &str) -> FolderListing {
    FolderListing {
        folders: vec![FolderEntry {
            folder_id: folder_id.into(),
            name: name.to_owned(),
            size: 700_000_000,
        }],
        files: vec![],
        transfers: vec![],
    }
}

/// The contents of a completed download folder: a single video file.
#[allow(dead_code)]
pub fn single_video(file_id: &str, name: &str) -> FolderListing {
    FolderListing {
        folders: vec![],
        files: vec![FileEntry {
            file_id: file_id.into(),
            name: name.to_owned(),
            size: 700_000_000,
        }],
        transfers: vec![],
    }
}
