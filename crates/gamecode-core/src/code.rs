//! Game code codec.
//!
//! Game codes travel on the wire as a signed 32-bit integer. Two textual
//! forms map into that space:
//!
//! - **V1**: four letters, stored as their little-endian ASCII bytes.
//!   Always non-negative.
//! - **V2**: six letters, packed through a shuffled 26-letter alphabet
//!   with the sign bit set. Always negative.
//!
//! The reserved [`CANCEL_CODE`] is the V2 encoding of `"CANCEL"`.

use crate::error::{GamecodeError, GamecodeResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Alphabet used by six-letter codes, indexed by digit value.
const V2_ALPHABET: &[u8; 26] = b"QWXRTYLPESDFGHUJKZOCVBINMA";

/// Number of values the four high V2 digits can take.
const V2_HIGH_LIMIT: u32 = 26 * 26 * 26 * 26;

/// The sentinel a client submits to abandon a pending reservation.
pub const CANCEL_CODE: GameCode = match encode_v2(*b"CANCEL") {
    Some(raw) => GameCode(raw),
    None => panic!("CANCEL must be a valid V2 code"),
};

/// A game code in its wire (integer) form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameCode(i32);

impl GameCode {
    /// Wrap a raw wire value without validation.
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// The raw wire value.
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Parse a textual code (case-insensitive, surrounding whitespace ignored).
    pub fn parse(code: &str) -> GamecodeResult<Self> {
        let upper = code.trim().to_ascii_uppercase();
        let bytes = upper.as_bytes();

        if let Some(bad) = upper.chars().find(|c| !c.is_ascii_uppercase()) {
            return Err(GamecodeError::InvalidCode(format!(
                "'{}' contains non-letter character {bad:?}",
                code.trim()
            )));
        }

        match bytes.len() {
            4 => Ok(Self(i32::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3],
            ]))),
            6 => {
                let letters = [bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5]];
                encode_v2(letters).map(Self).ok_or_else(|| {
                    GamecodeError::InvalidCode(format!("'{}' is not encodable", code.trim()))
                })
            }
            n => Err(GamecodeError::InvalidCode(format!(
                "'{}' has {n} letters, expected 4 or 6",
                code.trim()
            ))),
        }
    }

    /// Whether this is a six-letter code.
    pub fn is_v2(self) -> bool {
        self.0 < 0
    }

    /// Decode back to letters, if the raw value is a well-formed code.
    pub fn to_code_string(self) -> Option<String> {
        if self.is_v2() {
            decode_v2(self.0 as u32)
        } else {
            let bytes = self.0.to_le_bytes();
            if bytes.iter().all(|b| b.is_ascii_uppercase()) {
                Some(bytes.iter().map(|&b| b as char).collect())
            } else {
                None
            }
        }
    }
}

impl fmt::Display for GameCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_code_string() {
            Some(code) => f.write_str(&code),
            None => write!(f, "#{}", self.0),
        }
    }
}

impl FromStr for GameCode {
    type Err = GamecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<GameCode> for i32 {
    fn from(code: GameCode) -> Self {
        code.0
    }
}

const fn v2_digit(letter: u8) -> Option<u32> {
    let mut i = 0;
    while i < V2_ALPHABET.len() {
        if V2_ALPHABET[i] == letter {
            return Some(i as u32);
        }
        i += 1;
    }
    None
}

const fn encode_v2(letters: [u8; 6]) -> Option<i32> {
    let mut digits = [0u32; 6];
    let mut i = 0;
    while i < 6 {
        match v2_digit(letters[i]) {
            Some(d) => digits[i] = d,
            None => return None,
        }
        i += 1;
    }

    let low = (digits[0] + 26 * digits[1]) & 0x3FF;
    let high = digits[2] + 26 * (digits[3] + 26 * (digits[4] + 26 * digits[5]));
    Some((low | ((high << 10) & 0x3FFF_FC00) | 0x8000_0000) as i32)
}

fn decode_v2(raw: u32) -> Option<String> {
    let low = raw & 0x3FF;
    let high = (raw >> 10) & 0xF_FFFF;

    // Low ten bits hold two digits; anything past 26*26 is not a code.
    if low / 26 >= 26 {
        return None;
    }
    // Same for the high field: extra digit values would not re-encode.
    if high >= V2_HIGH_LIMIT {
        return None;
    }

    let digits = [
        low % 26,
        low / 26,
        high % 26,
        (high / 26) % 26,
        (high / 676) % 26,
        high / 17_576,
    ];
    Some(
        digits
            .iter()
            .map(|&d| V2_ALPHABET[d as usize] as char)
            .collect(),
    )
}
