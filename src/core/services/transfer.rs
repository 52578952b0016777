//! Transfer services.
//!
//! There are three services:
//!
//! - [`submit`]: it hands a torrent to the drive and returns immediately.
//! - [`submit_checked`]: like [`submit`], but only when the drive has room
//!   for the download.
//! - [`add_and_wait`]: it submits a torrent and polls the drive until the
//!   download finishes, the wait budget runs out or the caller halts it.
//!
//! # Completion polling
//!
//! The drive downloads in the background and offers no push notification, so
//! completion has to be reconciled by polling. Each tick lists the
//! destination folder once and reads it as follows:
//!
//! 1. If the in-flight transfers contain a job matching the submission (by
//!    infohash, or by exact title) and its progress is below 100%, the
//!    download is still running.
//! 2. Otherwise, if a sub-folder matches the submitted title, the download is
//!    finished: every file in that folder gets a download link resolved and
//!    the wait ends.
//! 3. Otherwise nothing is known yet and the wait continues.
//!
//! Drives rewrite some characters when they turn a torrent title into a
//! folder name, so step 2 tries the exact title first and the known rewrites
//! after it.
//!
//! Transient drive failures during a tick are logged and treated as "no new
//! information". The caller-supplied poll interval and wait budget are
//! clamped by the configured [`PollPolicy`] before the loop starts.
use std::time::Duration;

use derive_more::Display;
use seedbox_gateway_configuration::PollPolicy;
use seedbox_gateway_primitives::info_hash::InfoHash;
use seedbox_gateway_primitives::magnet::MagnetLink;
use tokio::sync::oneshot;
use tokio::time::{interval, Instant};
use tracing::{debug, info, warn};

use crate::core::drive::{self, ActiveTransfer, Drive, FolderEntry, FolderId, TransferReceipt};
use crate::core::services::capacity;
use crate::core::services::folder::{collect_downloads, FileDownload};
use crate::core::session::Session;

/// What to submit to the drive.
#[derive(Debug, Clone)]
pub enum TransferSource {
    /// A magnet URI.
    Magnet { uri: String },
    /// The raw contents of a `.torrent` file.
    TorrentFile { file_name: String, contents: Vec<u8> },
}

/// The identity used to find a submitted job again in drive listings.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct JobDescriptor {
    pub title: Option<String>,
    pub info_hash: Option<InfoHash>,
}

/// A transfer the drive has accepted.
#[derive(Debug)]
pub struct SubmittedTransfer {
    pub receipt: TransferReceipt,
    pub descriptor: JobDescriptor,
    pub destination: FolderId,
}

/// The outcome of a space-checked submission.
#[derive(Debug)]
pub enum CheckedSubmission {
    Accepted(SubmittedTransfer),
    /// The drive does not have room for the download; nothing was submitted.
    InsufficientSpace { required_bytes: u64, available_bytes: u64 },
}

/// The message a caller sends to stop a running wait early.
#[derive(Copy, Clone, Debug, Display)]
pub enum Halted {
    Normal,
}

/// The effective polling parameters for one wait, after clamping.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct WaitPlan {
    /// Time between two drive polls. Must not be zero.
    pub poll_interval: Duration,
    /// Total time budget for the wait.
    pub max_wait: Duration,
}

impl WaitPlan {
    /// The plan a wait gets when the caller supplies no parameters.
    #[must_use]
    pub fn new(policy: &PollPolicy) -> Self {
        Self::new_with_options(policy, None, None)
    }

    /// Builds a plan from caller-supplied parameters, in seconds.
    ///
    /// The policy wins over the caller: an interval below the configured
    /// floor is raised to the floor and a wait budget above the configured
    /// ceiling is capped at the ceiling. The floor itself is never below one
    /// second, so the interval stays nonzero even under a degenerate policy.
    #[must_use]
    pub fn new_with_options(policy: &PollPolicy, interval_option: Option<u32>, max_wait_option: Option<u32>) -> Self {
        let interval = match interval_option {
            Some(interval) => interval,
            None => policy.interval,
        }
        .max(policy.interval_min.max(1));

        let max_wait = match max_wait_option {
            Some(max_wait) => max_wait,
            None => policy.max_wait,
        }
        .min(policy.max_wait_ceiling);

        Self {
            poll_interval: Duration::from_secs(u64::from(interval)),
            max_wait: Duration::from_secs(u64::from(max_wait)),
        }
    }
}

/// How a wait ended. All three are successful service calls; only the drive
/// failing is an error.
#[derive(Debug)]
pub enum WaitOutcome {
    /// The download finished and its folder was found.
    Completed {
        folder_id: FolderId,
        folder_name: String,
        files: Vec<FileDownload>,
        elapsed: Duration,
    },
    /// The wait budget ran out. The download may still finish later.
    TimedOut {
        descriptor: JobDescriptor,
        /// Completion percentage of the last matching in-flight transfer.
        last_progress: Option<u8>,
        elapsed: Duration,
    },
    /// The caller halted the wait.
    Cancelled { descriptor: JobDescriptor, elapsed: Duration },
}

/// It submits a transfer to the drive and returns the receipt, without
/// waiting for the download.
///
/// # Errors
///
/// Will return a `drive::Error` if the drive rejects the submission.
pub async fn submit(session: &Session, source: TransferSource, destination: FolderId) -> Result<SubmittedTransfer, drive::Error> {
    let receipt = match &source {
        TransferSource::Magnet { uri } => session.drive().add_magnet(uri, &destination).await?,
        TransferSource::TorrentFile { file_name, contents } => {
            session.drive().add_torrent_file(file_name, contents, &destination).await?
        }
    };

    let descriptor = job_descriptor(&source, &receipt);

    debug!("transfer accepted by the drive: {descriptor:?}");

    Ok(SubmittedTransfer {
        receipt,
        descriptor,
        destination,
    })
}

/// It submits a transfer only when the drive has room for the download.
///
/// # Errors
///
/// Will return a `drive::Error` if the usage query fails or the drive rejects
/// the submission.
pub async fn submit_checked(
    session: &Session,
    source: TransferSource,
    destination: FolderId,
    required_bytes: u64,
) -> Result<CheckedSubmission, drive::Error> {
    let report = capacity::space_report(session.drive()).await?;

    if !report.can_fit(required_bytes) {
        return Ok(CheckedSubmission::InsufficientSpace {
            required_bytes,
            available_bytes: report.available(),
        });
    }

    Ok(CheckedSubmission::Accepted(submit(session, source, destination).await?))
}

/// It submits a transfer and polls the drive until the download finishes,
/// the wait budget runs out or the caller halts the wait through `rx_halt`.
///
/// Dropping the halt sender does not halt the wait; it only means the caller
/// gave up the ability to.
///
/// # Errors
///
/// Will return a `drive::Error` if the drive rejects the submission, or if a
/// non-transient failure happens while polling.
pub async fn add_and_wait(
    session: &Session,
    source: TransferSource,
    destination: FolderId,
    plan: WaitPlan,
    rx_halt: oneshot::Receiver<Halted>,
) -> Result<WaitOutcome, drive::Error> {
    let submitted = submit(session, source, destination).await?;

    let halt = async move {
        match rx_halt.await {
            Ok(reason) => reason,
            // A dropped sender never halts.
            Err(_) => std::future::pending().await,
        }
    };
    tokio::pin!(halt);

    let started = Instant::now();
    let mut poll = interval(plan.poll_interval);
    let mut last_progress = None;

    loop {
        tokio::select! {
            biased;
            reason = &mut halt => {
                info!("wait for transfer {:?} halted: {reason}", submitted.descriptor);
                return Ok(WaitOutcome::Cancelled {
                    descriptor: submitted.descriptor,
                    elapsed: started.elapsed(),
                });
            }
            _ = poll.tick() => {}
        }

        if started.elapsed() >= plan.max_wait {
            info!("transfer {:?} did not complete within the wait budget", submitted.descriptor);
            return Ok(WaitOutcome::TimedOut {
                descriptor: submitted.descriptor,
                last_progress,
                elapsed: started.elapsed(),
            });
        }

        match observe(session.drive(), &submitted).await {
            Ok(Observation::Downloading { progress }) => {
                debug!("transfer {:?} at {progress}%", submitted.descriptor);
                last_progress = Some(progress);
            }
            Ok(Observation::FolderReady { folder }) => match collect_downloads(session.drive(), &folder.folder_id).await {
                Ok(downloads) => {
                    info!("transfer {:?} completed into folder {}", submitted.descriptor, folder.name);
                    return Ok(WaitOutcome::Completed {
                        folder_id: downloads.folder_id,
                        folder_name: folder.name,
                        files: downloads.files,
                        elapsed: started.elapsed(),
                    });
                }
                Err(err) if err.is_transient() => {
                    warn!("folder {} matched but could not be listed: {err}; retrying", folder.name);
                }
                Err(err) => return Err(err),
            },
            Ok(Observation::NothingYet) => {
                debug!("no matching transfer or folder for {:?} yet", submitted.descriptor);
            }
            Err(err) if err.is_transient() => {
                warn!("transient drive failure while polling: {err}");
            }
            Err(err) => return Err(err),
        }
    }
}

/// One reading of the remote state for a submitted transfer.
enum Observation {
    Downloading { progress: u8 },
    FolderReady { folder: FolderEntry },
    NothingYet,
}

async fn observe(drive: &dyn Drive, submitted: &SubmittedTransfer) -> Result<Observation, drive::Error> {
    let listing = drive.list_folder(&submitted.destination.for_listing()).await?;

    if let Some(transfer) = find_active_transfer(&listing.transfers, &submitted.descriptor) {
        if transfer.progress < 100 {
            return Ok(Observation::Downloading {
                progress: transfer.progress,
            });
        }
        // At 100% the drive is about to replace the transfer with a folder;
        // fall through and look for it.
    }

    match find_completed_folder(&listing.folders, &submitted.descriptor) {
        Some(folder) => Ok(Observation::FolderReady { folder: folder.clone() }),
        None => Ok(Observation::NothingYet),
    }
}

/// It derives the identity of a job from the drive's receipt, falling back to
/// what the magnet link itself carries when the receipt is bare.
fn job_descriptor(source: &TransferSource, receipt: &TransferReceipt) -> JobDescriptor {
    let mut title = receipt.title.clone();
    let mut info_hash = receipt.info_hash;

    if let TransferSource::Magnet { uri } = source {
        if let Ok(link) = uri.parse::<MagnetLink>() {
            title = title.or(link.display_name);
            info_hash = info_hash.or(link.exact_topic);
        }
    }

    JobDescriptor { title, info_hash }
}

fn find_active_transfer<'a>(transfers: &'a [ActiveTransfer], descriptor: &JobDescriptor) -> Option<&'a ActiveTransfer> {
    if let Some(info_hash) = descriptor.info_hash {
        if let Some(transfer) = transfers.iter().find(|transfer| transfer.info_hash == Some(info_hash)) {
            return Some(transfer);
        }
    }

    let title = descriptor.title.as_deref()?;

    transfers.iter().find(|transfer| transfer.name == title)
}

fn find_completed_folder<'a>(folders: &'a [FolderEntry], descriptor: &JobDescriptor) -> Option<&'a FolderEntry> {
    let title = descriptor.title.as_deref()?;

    let rewritten = drive_folder_name(title);
    let underscored = title.replace(' ', "_");

    folders
        .iter()
        .find(|folder| folder.name == title)
        .or_else(|| folders.iter().find(|folder| folder.name == rewritten))
        .or_else(|| folders.iter().find(|folder| folder.name == underscored))
        .or_else(|| {
            folders
                .iter()
                .find(|folder| folder.name.replace('&', "_") == title.replace('&', "_"))
        })
}

/// The folder name the drive is known to produce for a submitted title:
/// ampersands become underscores, colons become spaces and question marks
/// disappear.
fn drive_folder_name(title: &str) -> String {
    title.replace('&', "_").replace(':', " ").replace('?', "")
}
