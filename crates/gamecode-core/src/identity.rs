//! Client identity fingerprints.
//!
//! A fingerprint pins down "this client, from this address, with this
//! version, platform, language and mod list". It keys pending reservations,
//! so anything that changes one of those attributes (including reordering
//! mods) is treated as a different client.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::net::IpAddr;

/// Number of hex characters kept by [`Fingerprint::digest`].
const DIGEST_LEN: usize = 12;

/// A mod installed on a connecting client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModInfo {
    pub id: String,
    pub version: String,
}

impl ModInfo {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
        }
    }
}

/// Connection metadata reported by the session protocol stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    /// Remote address (port excluded; it changes on every reconnect).
    pub remote_addr: IpAddr,
    pub username: String,
    pub client_version: String,
    /// Platform tag, e.g. `"StandaloneSteamPC"`.
    pub platform: String,
    pub language: u32,
    /// Installed mods in the order the client reported them.
    #[serde(default)]
    pub mods: Vec<ModInfo>,
}

/// Identity key for a client connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short SHA-256 prefix, safe to put in logs.
    pub fn digest(&self) -> String {
        let hash = Sha256::digest(self.0.as_bytes());
        let mut hex = hex::encode(hash);
        hex.truncate(DIGEST_LEN);
        hex
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the fingerprint of a client.
///
/// Fields are joined with `:` in a fixed order, followed by `:{id}:{version}`
/// for each mod. IPv6 addresses are bracketed and free-text fields have `\`
/// and `:` escaped, so two different clients never produce the same string.
pub fn fingerprint(info: &ClientInfo) -> Fingerprint {
    let mut key = String::with_capacity(64 + info.mods.len() * 32);
    match info.remote_addr {
        IpAddr::V4(v4) => key.push_str(&v4.to_string()),
        IpAddr::V6(v6) => {
            key.push('[');
            key.push_str(&v6.to_string());
            key.push(']');
        }
    }
    for field in [&info.username, &info.client_version, &info.platform] {
        key.push(':');
        push_escaped(&mut key, field);
    }
    key.push(':');
    key.push_str(&info.language.to_string());

    for m in &info.mods {
        key.push(':');
        push_escaped(&mut key, &m.id);
        key.push(':');
        push_escaped(&mut key, &m.version);
    }

    Fingerprint(key)
}

fn push_escaped(out: &mut String, field: &str) {
    for c in field.chars() {
        if c == '\\' || c == ':' {
            out.push('\\');
        }
        out.push(c);
    }
}
