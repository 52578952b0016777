//! Scripted in-memory drive implementations for the integration tests.
//!
//! The scripted drive answers every poll of the root folder with the next
//! "frame" from its script, so a test can describe how the remote state
//! evolves over time without any real network or timing dependency. The last
//! frame repeats forever.
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use seedbox_gateway::core::auth::Token;
use seedbox_gateway::core::drive::{
    AccountSettings, Connector, DeviceAuthorization, DownloadLink, Drive, Error, FileId, FolderId, FolderListing,
    TransferReceipt, UsageStats,
};
use seedbox_gateway::core::rotation::RotationHook;

pub struct ScriptedDrive {
    token: Token,
    root_frames: Mutex<VecDeque<FolderListing>>,
    folder_contents: HashMap<String, FolderListing>,
    links: HashMap<String, DownloadLink>,
    receipt: TransferReceipt,
    usage: UsageStats,
    submissions: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
}

impl ScriptedDrive {
    pub fn new(access_token: &str) -> Self {
        Self {
            token: Token::new(access_token),
            root_frames: Mutex::new(VecDeque::new()),
            folder_contents: HashMap::new(),
            links: HashMap::new(),
            receipt: TransferReceipt::default(),
            usage: UsageStats {
                space_used: 0,
                space_max: 100_000_000_000,
                bandwidth_used: 0,
            },
            submissions: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The listings the root folder will show, one per poll.
    #[allow(dead_code)]
    pub fn with_root_frames(self, frames: Vec<FolderListing>) -> Self {
        *self.root_frames.lock().unwrap() = frames.into();
        self
    }

    /// The fixed contents of a non-root folder.
    #[allow(dead_code)]
    pub fn with_folder(mut self, folder_id: &str, contents: FolderListing) -> Self {
        self.folder_contents.insert(folder_id.to_owned(), contents);
        self
    }

    #[allow(dead_code)]
    pub fn with_link(mut self, file_id: &str, name: &str, url: &str) -> Self {
        self.links.insert(
            file_id.to_owned(),
            DownloadLink {
                name: name.to_owned(),
                url: url.parse().unwrap(),
            },
        );
        self
    }

    #[allow(dead_code)]
    pub fn with_receipt(mut self, receipt: TransferReceipt) -> Self {
        self.receipt = receipt;
        self
    }

    #[allow(dead_code)]
    pub fn with_usage(mut self, space_used: u64, space_max: u64) -> Self {
        self.usage = UsageStats {
            space_used,
            space_max,
            bandwidth_used: 0,
        };
        self
    }

    /// A flag that turns true once the connection is closed.
    #[allow(dead_code)]
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        self.closed.clone()
    }

    /// A counter of how many transfers were submitted to this drive.
    #[allow(dead_code)]
    pub fn submission_counter(&self) -> Arc<AtomicUsize> {
        self.submissions.clone()
    }

    fn next_root_frame(&self) -> FolderListing {
        let mut frames = self.root_frames.lock().unwrap();

        if frames.len() > 1 {
            frames.pop_front().unwrap()
        } else {
            frames.front().cloned().unwrap_or_default()
        }
    }
}

#[async_trait]
impl Drive for ScriptedDrive {
    fn current_token(&self) -> Token {
        self.token.clone()
    }

    async fn account_settings(&self) -> Result<AccountSettings, Error> {
        Ok(AccountSettings {
            username: "alice".to_owned(),
            email: None,
        })
    }

    async fn usage(&self) -> Result<UsageStats, Error> {
        Ok(self.usage)
    }

    async fn list_folder(&self, folder_id: &FolderId) -> Result<FolderListing, Error> {
        if *folder_id == FolderId::root() {
            return Ok(self.next_root_frame());
        }

        self.folder_contents
            .get(folder_id.as_str())
            .cloned()
            .ok_or_else(|| Error::Failed {
                reason: format!("unknown folder {folder_id}"),
            })
    }

    async fn fetch_file(&self, file_id: &FileId) -> Result<DownloadLink, Error> {
        self.links.get(file_id.as_str()).cloned().ok_or_else(|| Error::Failed {
            reason: format!("unknown file {file_id}"),
        })
    }

    async fn add_magnet(&self, _magnet_uri: &str, _destination: &FolderId) -> Result<TransferReceipt, Error> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        Ok(self.receipt.clone())
    }

    async fn add_torrent_file(
        &self,
        _file_name: &str,
        _contents: &[u8],
        _destination: &FolderId,
    ) -> Result<TransferReceipt, Error> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        Ok(self.receipt.clone())
    }

    async fn close(&self) -> Result<(), Error> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// A connector that hands out scripted drives, one per successful
/// authentication, and records everything it was asked to do.
#[derive(Default)]
pub struct ScriptedConnector {
    drives: Mutex<VecDeque<ScriptedDrive>>,
    pub password_attempts: AtomicUsize,
    pub token_attempts: AtomicUsize,
    pub seen_tokens: Mutex<Vec<Token>>,
    pub hooks: Mutex<Vec<RotationHook>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_drive(self, drive: ScriptedDrive) -> Self {
        self.drives.lock().unwrap().push_back(drive);
        self
    }

    /// The rotation hook handed out on the most recent connection.
    #[allow(dead_code)]
    pub fn last_hook(&self) -> RotationHook {
        self.hooks.lock().unwrap().last().unwrap().clone()
    }

    fn next_drive(&self) -> Result<Box<dyn Drive>, Error> {
        match self.drives.lock().unwrap().pop_front() {
            Some(drive) => Ok(Box::new(drive)),
            None => Err(Error::CredentialsRejected {
                reason: "no scripted connection left".to_owned(),
            }),
        }
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn request_device_code(&self) -> Result<DeviceAuthorization, Error> {
        Ok(DeviceAuthorization {
            device_code: "scripted-device-code".to_owned(),
            user_code: "ABCD-EFGH".to_owned(),
            verification_url: "https://drive.example.com/devices".parse().unwrap(),
            expires_in: Some(300),
            interval: Some(5),
        })
    }

    async fn connect_with_password(
        &self,
        _username: &str,
        _password: &str,
        on_rotate: RotationHook,
    ) -> Result<Box<dyn Drive>, Error> {
        self.password_attempts.fetch_add(1, Ordering::SeqCst);
        self.hooks.lock().unwrap().push(on_rotate);
        self.next_drive()
    }

    async fn connect_with_device_code(&self, _device_code: &str, on_rotate: RotationHook) -> Result<Box<dyn Drive>, Error> {
        self.hooks.lock().unwrap().push(on_rotate);
        self.next_drive()
    }

    async fn connect_with_refresh_token(&self, _refresh_token: &str, on_rotate: RotationHook) -> Result<Box<dyn Drive>, Error> {
        self.hooks.lock().unwrap().push(on_rotate);
        self.next_drive()
    }

    async fn connect_with_token(&self, token: Token, on_rotate: RotationHook) -> Result<Box<dyn Drive>, Error> {
        self.token_attempts.fetch_add(1, Ordering::SeqCst);
        self.seen_tokens.lock().unwrap().push(token);
        self.hooks.lock().unwrap().push(on_rotate);
        self.next_drive()
    }
}
