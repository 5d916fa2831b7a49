//! `gamecode fingerprint`: show the reservation key for a client.

use anyhow::{bail, Result};
use gamecode_core::{fingerprint, ClientInfo, ModInfo};
use std::net::IpAddr;

pub fn run(
    addr: IpAddr,
    username: String,
    client_version: String,
    platform: String,
    language: u32,
    mods: &[String],
) -> Result<()> {
    let mods = mods
        .iter()
        .map(|m| parse_mod(m))
        .collect::<Result<Vec<_>>>()?;

    let info = ClientInfo {
        remote_addr: addr,
        username,
        client_version,
        platform,
        language,
        mods,
    };
    let fp = fingerprint(&info);
    println!("fingerprint: {fp}");
    println!("digest:      {}", fp.digest());
    Ok(())
}

/// Parse an `ID=VERSION` argument.
fn parse_mod(arg: &str) -> Result<ModInfo> {
    match arg.split_once('=') {
        Some((id, version)) if !id.is_empty() && !version.is_empty() => {
            Ok(ModInfo::new(id, version))
        }
        _ => bail!("invalid mod '{arg}', expected ID=VERSION"),
    }
}
