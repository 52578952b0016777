//! Magnet URI parsing.
//!
//! The remote drive is the one that actually resolves a submitted magnet
//! link; locally the gateway only needs the `xt` topic (to match the job
//! against transfer listings by info-hash) and the decoded `dn` display
//! name (the title the drive will give the resulting folder).
use std::panic::Location;
use std::str::FromStr;

use percent_encoding::percent_decode_str;
use thiserror::Error;

use crate::info_hash::InfoHash;

const MAGNET_SCHEME: &str = "magnet:?";
const BTIH_URN_PREFIX: &str = "urn:btih:";

/// The parts of a magnet link the gateway cares about.
///
/// Both fields are optional: a magnet link without a `dn` parameter is
/// common, and an `xt` topic in base32 form is left unparsed (the drive
/// still accepts the link; matching falls back to the title).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MagnetLink {
    /// The v1 info-hash from the `xt` parameter, when it is a hex topic.
    pub exact_topic: Option<InfoHash>,
    /// The percent-decoded `dn` parameter.
    pub display_name: Option<String>,
}

/// Error returned when the input is not a magnet URI at all.
#[derive(Error, Debug)]
pub enum ParseMagnetError {
    #[error("unsupported scheme in uri: {uri}, {location}")]
    UnsupportedScheme {
        location: &'static Location<'static>,
        uri: String,
    },
}

impl FromStr for MagnetLink {
    type Err = ParseMagnetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(query) = s.strip_prefix(MAGNET_SCHEME) else {
            return Err(ParseMagnetError::UnsupportedScheme {
                location: Location::caller(),
                uri: s.to_owned(),
            });
        };

        let mut link = MagnetLink::default();

        for pair in query.split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            match key {
                "xt" => {
                    if let Some(hex) = value.strip_prefix(BTIH_URN_PREFIX) {
                        link.exact_topic = hex.parse().ok();
                    }
                }
                "dn" => link.display_name = Some(decode_component(value)),
                _ => {}
            }
        }

        Ok(link)
    }
}

// Magnet links use form-style encoding: '+' means space.
fn decode_component(value: &str) -> String {
    let spaced = value.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
