//! The `BitTorrent` v1 info-hash.
//!
//! Remote drives report the info-hash of every active transfer; the gateway
//! parses those values (and the `xt` topic of submitted magnet links) into
//! [`InfoHash`] so that job matching compares binary hashes instead of
//! string-formatted ones.
use serde::{Deserialize, Serialize};

/// `BitTorrent` Info Hash v1 (20 bytes, rendered as 40 lowercase hex chars).
#[derive(PartialEq, Eq, Hash, Clone, Copy, Default, Debug)]
pub struct InfoHash(pub [u8; 20]);

/// Number of bytes in an info-hash.
pub const INFO_HASH_BYTES: usize = 20;

impl InfoHash {
    /// Returns the internal byte array.
    #[must_use]
    pub fn bytes(&self) -> [u8; 20] {
        self.0
    }

    /// Returns the hash as a 40 character lowercase hex string.
    #[must_use]
    pub fn to_hex_string(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for InfoHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut chars = [0u8; 40];
        binascii::bin2hex(&self.0, &mut chars).expect("failed to hexlify");
        write!(f, "{}", std::str::from_utf8(&chars).expect("hex is ascii"))
    }
}

impl std::str::FromStr for InfoHash {
    type Err = binascii::ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut hash = Self([0u8; INFO_HASH_BYTES]);
        if s.len() != 40 {
            return Err(binascii::ConvertError::InvalidInputLength);
        }
        binascii::hex2bin(s.as_bytes(), &mut hash.0)?;
        Ok(hash)
    }
}

impl std::convert::From<[u8; 20]> for InfoHash {
    fn from(val: [u8; 20]) -> Self {
        InfoHash(val)
    }
}

impl Serialize for InfoHash {
    fn serialize<S: serde::ser::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for InfoHash {
    fn deserialize<D: serde::de::Deserializer<'de>>(des: D) -> Result<Self, D::Error> {
        des.deserialize_str(InfoHashVisitor)
    }
}

struct InfoHashVisitor;

impl<'v> serde::de::Visitor<'v> for InfoHashVisitor {
    type Value = InfoHash;

    fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "a 40 character long hash")
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(|_| {
            serde::de::Error::invalid_value(serde::de::Unexpected::Str(v), &"a 40 character long hexadecimal string")
        })
    }
}

#[cfg(test)]
mod tests {
    mod the_info_hash {
        use crate::info_hash::InfoHash;

        #[test]
        fn should_be_parsed_from_a_40_char_hex_string() {
            let hash: InfoHash = "9c38422213e30bff212b30c360d26f9a02136422".parse().expect("hex should parse");

            assert_eq!(hash.to_hex_string(), "9c38422213e30bff212b30c360d26f9a02136422");
        }

        #[test]
        fn should_accept_uppercase_hex_but_render_lowercase() {
            let hash: InfoHash = "9C38422213E30BFF212B30C360D26F9A02136422".parse().expect("hex should parse");

            assert_eq!(hash.to_string(), "9c38422213e30bff212b30c360d26f9a02136422");
        }

        #[test]
        fn should_reject_strings_that_are_not_40_chars_long() {
            assert!("9c3842".parse::<InfoHash>().is_err());
        }

        #[test]
        fn should_reject_non_hexadecimal_strings() {
            assert!("zz38422213e30bff212b30c360d26f9a02136422".parse::<InfoHash>().is_err());
        }
    }
}
