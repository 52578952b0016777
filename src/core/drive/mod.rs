//! The drive abstraction.
//!
//! A "drive" is the remote seedbox account this gateway manages: a cloud
//! service that downloads torrents on the user's behalf and stores the
//! results in folders. Everything the rest of the crate knows about the
//! remote side goes through two traits:
//!
//! - [`Connector`]: authenticates and produces connections. One connector is
//!   built per process and injected into the
//!   [`SessionManager`](crate::core::SessionManager).
//! - [`Drive`]: one authenticated connection. It answers listing, transfer
//!   and account queries until it is closed.
//!
//! The traits carry no transport details. A production implementation talks
//! HTTP to the vendor API; tests use mocks or scripted fakes. The value
//! structs below are the gateway's own model of the remote side:
//!
//!  Struct | Remote concept
//! ---|---
//! [`FolderListing`] | contents of one folder, including in-flight transfers
//! [`ActiveTransfer`] | a torrent the drive is still downloading
//! [`TransferReceipt`] | what the drive answered when a job was submitted
//! [`DownloadLink`] | a direct, user-fetchable location for one stored file
//! [`DeviceAuthorization`] | codes for the device pairing flow
//! [`UsageStats`] | storage and bandwidth consumption of the account
pub mod error;

use async_trait::async_trait;
use derive_more::Display;
#[cfg(test)]
use mockall::automock;
use seedbox_gateway_primitives::info_hash::InfoHash;
use serde::{Deserialize, Serialize};
use url::Url;

pub use self::error::Error;
use crate::core::auth::Token;
use crate::core::rotation::RotationHook;

/// Identifier of a folder on the drive.
#[derive(Serialize, Deserialize, Debug, Display, Eq, PartialEq, Clone, Hash)]
pub struct FolderId(String);

/// The folder id of the drive root when listing contents.
const ROOT_FOLDER: &str = "0";

/// The sentinel drives accept as "download into the root folder".
const ROOT_SENTINEL: &str = "-1";

impl FolderId {
    /// The root folder, as used when listing contents.
    #[must_use]
    pub fn root() -> Self {
        Self(ROOT_FOLDER.to_owned())
    }

    /// The sentinel value submissions use to target the root folder.
    #[must_use]
    pub fn root_sentinel() -> Self {
        Self(ROOT_SENTINEL.to_owned())
    }

    /// The folder to list when looking for this folder's contents.
    ///
    /// The submission sentinel is not a listable folder; its contents show up
    /// under the root.
    #[must_use]
    pub fn for_listing(&self) -> Self {
        if self.0 == ROOT_SENTINEL {
            Self::root()
        } else {
            self.clone()
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FolderId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for FolderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier of a file stored on the drive.
#[derive(Serialize, Deserialize, Debug, Display, Eq, PartialEq, Clone, Hash)]
pub struct FileId(String);

impl FileId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FileId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for FileId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One sub-folder inside a folder listing.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct FolderEntry {
    pub folder_id: FolderId,
    pub name: String,
    /// Total size of the folder contents in bytes.
    pub size: u64,
}

/// One file inside a folder listing.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct FileEntry {
    pub file_id: FileId,
    pub name: String,
    /// Size in bytes.
    pub size: u64,
}

/// A torrent the drive is still downloading into a folder.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct ActiveTransfer {
    pub transfer_id: String,
    /// The torrent infohash, when the drive reports one.
    pub info_hash: Option<InfoHash>,
    pub name: String,
    /// Completion percentage, `0..=100`.
    pub progress: u8,
}

/// The contents of one folder: sub-folders, stored files and the transfers
/// currently downloading into it.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Default)]
pub struct FolderListing {
    pub folders: Vec<FolderEntry>,
    pub files: Vec<FileEntry>,
    pub transfers: Vec<ActiveTransfer>,
}

/// What the drive answered when a transfer was submitted.
///
/// Drives are inconsistent about which fields they fill in, so everything
/// beyond acceptance itself is optional.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Default)]
pub struct TransferReceipt {
    pub transfer_id: Option<String>,
    /// The display title the drive assigned to the job.
    pub title: Option<String>,
    pub info_hash: Option<InfoHash>,
}

/// Account profile details.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct AccountSettings {
    pub username: String,
    pub email: Option<String>,
}

/// Storage and bandwidth consumption of the account, in bytes.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub struct UsageStats {
    pub space_used: u64,
    pub space_max: u64,
    pub bandwidth_used: u64,
}

/// Codes for the device pairing flow.
///
/// The caller shows `user_code` and `verification_url` to the user; once the
/// user approves the device, `device_code` can be exchanged for a session.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct DeviceAuthorization {
    pub device_code: String,
    pub user_code: String,
    pub verification_url: Url,
    /// Seconds until the codes expire, when the drive reports it.
    pub expires_in: Option<u64>,
    /// Suggested seconds between exchange attempts.
    pub interval: Option<u64>,
}

/// A direct, user-fetchable location for one stored file.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct DownloadLink {
    pub name: String,
    pub url: Url,
}

/// The authentication factory for a remote drive.
///
/// Every `connect_*` method performs the corresponding authentication flow
/// and, on success, returns a live connection. The [`RotationHook`] is wired
/// into the connection so that tokens the drive replaces later reach the
/// token store.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait Connector: Sync + Send {
    /// Starts the device pairing flow by requesting fresh codes.
    ///
    /// # Errors
    ///
    /// Will return an error if the drive cannot issue codes.
    async fn request_device_code(&self) -> Result<DeviceAuthorization, Error>;

    /// Authenticates with a username and password.
    ///
    /// # Errors
    ///
    /// Will return an error if the drive rejects the credentials.
    async fn connect_with_password(
        &self,
        username: &str,
        password: &str,
        on_rotate: RotationHook,
    ) -> Result<Box<dyn Drive>, Error>;

    /// Authenticates with an approved device code.
    ///
    /// # Errors
    ///
    /// Will return an error if the code is unknown, expired or not yet
    /// approved.
    async fn connect_with_device_code(&self, device_code: &str, on_rotate: RotationHook)
        -> Result<Box<dyn Drive>, Error>;

    /// Authenticates with a refresh token from an earlier session.
    ///
    /// # Errors
    ///
    /// Will return an error if the drive rejects the token.
    async fn connect_with_refresh_token(
        &self,
        refresh_token: &str,
        on_rotate: RotationHook,
    ) -> Result<Box<dyn Drive>, Error>;

    /// Re-establishes a connection from a previously stored token.
    ///
    /// # Errors
    ///
    /// Will return an error if the token is no longer accepted.
    async fn connect_with_token(&self, token: Token, on_rotate: RotationHook) -> Result<Box<dyn Drive>, Error>;
}

/// One authenticated connection to a remote drive.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait Drive: Sync + Send {
    /// The token currently backing this connection. Rotations update it.
    fn current_token(&self) -> Token;

    /// The profile of the authenticated account.
    ///
    /// # Errors
    ///
    /// Will return an error if the drive cannot be queried.
    async fn account_settings(&self) -> Result<AccountSettings, Error>;

    /// Storage and bandwidth consumption of the account.
    ///
    /// # Errors
    ///
    /// Will return an error if the drive cannot be queried.
    async fn usage(&self) -> Result<UsageStats, Error>;

    /// The contents of one folder.
    ///
    /// # Errors
    ///
    /// Will return an error if the folder cannot be listed.
    async fn list_folder(&self, folder_id: &FolderId) -> Result<FolderListing, Error>;

    /// Resolves a direct download link for one stored file.
    ///
    /// # Errors
    ///
    /// Will return an error if the drive refuses to hand out a link.
    async fn fetch_file(&self, file_id: &FileId) -> Result<DownloadLink, Error>;

    /// Submits a magnet link for remote download into the given folder.
    ///
    /// # Errors
    ///
    /// Will return an error if the drive rejects the submission.
    async fn add_magnet(&self, magnet_uri: &str, destination: &FolderId) -> Result<TransferReceipt, Error>;

    /// Submits the contents of a `.torrent` file for remote download into the
    /// given folder.
    ///
    /// # Errors
    ///
    /// Will return an error if the drive rejects the submission.
    async fn add_torrent_file(
        &self,
        file_name: &str,
        contents: &[u8],
        destination: &FolderId,
    ) -> Result<TransferReceipt, Error>;

    /// Releases the resources held by this connection.
    ///
    /// # Errors
    ///
    /// Will return an error if the drive could not be notified; the
    /// connection is unusable afterwards either way.
    async fn close(&self) -> Result<(), Error>;
}

#[cfg(test)]
mod tests {

    mod a_folder_id {
        use crate::core::drive::FolderId;

        #[test]
        fn should_list_the_submission_sentinel_as_the_root_folder() {
            assert_eq!(FolderId::root_sentinel().for_listing(), FolderId::root());
        }

        #[test]
        fn should_list_a_regular_folder_as_itself() {
            let folder_id = FolderId::from("1234");

            assert_eq!(folder_id.for_listing(), folder_id);
        }

        #[test]
        fn should_display_its_raw_identifier() {
            assert_eq!(FolderId::root().to_string(), "0");
            assert_eq!(FolderId::root_sentinel().to_string(), "-1");
        }
    }
}
