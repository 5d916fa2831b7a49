//! `gamecode encode` / `gamecode decode`.

use anyhow::{Context, Result};
use gamecode_core::GameCode;

pub fn run_encode(code: &str) -> Result<()> {
    let parsed = GameCode::parse(code).with_context(|| format!("cannot encode '{code}'"))?;
    println!("{}", parsed.raw());
    Ok(())
}

pub fn run_decode(value: i32) -> Result<()> {
    let code = GameCode::from_raw(value)
        .to_code_string()
        .with_context(|| format!("{value} is not a valid game code"))?;
    println!("{code}");
    Ok(())
}
