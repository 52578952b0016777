use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::{Credentials, PollPolicy};

/// Core configuration for the gateway.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct Core {
    /// Path to the token file. The file contains one JSON object keyed by
    /// user identity; it is created on the first save, for example:
    /// `./storage/gateway/lib/tokens.json`.
    #[serde(default = "Core::default_token_file")]
    pub token_file: Utf8PathBuf,

    /// If enabled, every session lookup resolves to the fixed `default`
    /// identity, authenticated once with [`Core::default_account`]. Use it
    /// when the gateway fronts a single drive account for all callers.
    #[serde(default = "Core::default_single_tenant")]
    pub single_tenant: bool,

    /// Credentials for the default account. Only read when
    /// [`Core::single_tenant`] is enabled; leaving it unset disables the
    /// lazy default authentication with a logged warning.
    #[serde(default)]
    pub default_account: Option<Credentials>,

    /// Policy for the transfer completion poll loop.
    #[serde(default = "Core::default_polling")]
    pub polling: PollPolicy,
}

impl Default for Core {
    fn default() -> Self {
        Self {
            token_file: Self::default_token_file(),
            single_tenant: Self::default_single_tenant(),
            default_account: None,
            polling: Self::default_polling(),
        }
    }
}

impl Core {
    fn default_token_file() -> Utf8PathBuf {
        Utf8PathBuf::from("./storage/gateway/lib/tokens.json")
    }

    fn default_single_tenant() -> bool {
        false
    }

    fn default_polling() -> PollPolicy {
        PollPolicy::default()
    }
}
