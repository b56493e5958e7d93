use std::fmt::{Display, Formatter};
use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::constants::{GITHUB_SIGNATURE_HEADER, GITHUB_SIGNATURE_HEADER_256};

/// The digest a signature is computed with.
///
/// Each variant pairs a hash function with the tag written in front of the hex
/// digest, e.g. `sha256=757107ea…`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Validator {
    #[default]
    Sha1,
    Sha256,
}

impl Validator {
    pub const fn prefix(self) -> &'static str {
        match self {
            Validator::Sha1 => "sha1",
            Validator::Sha256 => "sha256",
        }
    }

    /// Header GitHub sends this kind of signature in.
    pub const fn default_header(self) -> &'static str {
        match self {
            Validator::Sha1 => GITHUB_SIGNATURE_HEADER,
            Validator::Sha256 => GITHUB_SIGNATURE_HEADER_256,
        }
    }

    /// Computes the signature string `<prefix>=<lowercase hex>` for `body`.
    pub fn sign(self, body: &[u8], secret: &[u8]) -> Result<String> {
        let digest = match self {
            Validator::Sha1 => hex_digest::<Hmac<Sha1>>(body, secret)?,
            Validator::Sha256 => hex_digest::<Hmac<Sha256>>(body, secret)?,
        };

        Ok(format!("{}={}", self.prefix(), digest))
    }

    /// Checks the `claimed` header value against the signature of `body`.
    ///
    /// The comparison runs in constant time over the whole signature string.
    pub fn verify(self, body: &[u8], claimed: &[u8], secret: &[u8]) -> bool {
        match self.sign(body, secret) {
            Ok(expected) => constant_time_eq(expected.as_bytes(), claimed),
            Err(_) => false,
        }
    }
}

impl Display for Validator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for Validator {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" => Ok(Validator::Sha1),
            "sha256" => Ok(Validator::Sha256),
            _ => bail!("Unknown signature algorithm: {}", s),
        }
    }
}

fn hex_digest<M: Mac + KeyInit>(body: &[u8], secret: &[u8]) -> Result<String> {
    let mut mac = <M as KeyInit>::new_from_slice(secret)
        .map_err(|err| anyhow!("Could not key the hmac: {}", err))?;
    mac.update(body);

    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Byte equality that doesn't return early on the first differing byte.
///
/// Only the length is compared up front, the length of a signature string
/// depends on the algorithm alone and isn't secret.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.ct_eq(b).into()
}
