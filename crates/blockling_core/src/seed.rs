//! Seed derivation from block data.
//!
//! With hash and timestamp present the seed is
//! `nonce ^ u32(hash[0..8], hex) ^ timestamp`, all truncated to 32 bits.
//! Otherwise it is the nonce truncated to 32 bits.

use crate::error::{CoreError, Result};
use blockling_data::BlockSeed;
use serde_json::Value;

/// 32-bit root seed of every random stream in a session.
pub type Seed = u32;

const HASH_PREFIX_LEN: usize = 8;

pub fn derive_seed(block: &BlockSeed) -> Result<Seed> {
    let nonce = block
        .nonce
        .ok_or_else(|| CoreError::invalid_seed("block nonce is missing"))?;
    let nonce = nonce as u32;

    match (&block.hash, block.timestamp_seconds) {
        (Some(hash), Some(ts)) => {
            let prefix = hash_prefix(hash)?;
            Ok(nonce ^ prefix ^ ts as u32)
        }
        _ => Ok(nonce),
    }
}

/// Integer value of the first eight hex characters of a block hash.
fn hash_prefix(hash: &str) -> Result<u32> {
    let hash = hash.strip_prefix("0x").unwrap_or(hash);
    let prefix = hash.get(..HASH_PREFIX_LEN).ok_or_else(|| {
        CoreError::invalid_seed(format!(
            "block hash '{hash}' is shorter than {HASH_PREFIX_LEN} hex characters"
        ))
    })?;
    if !prefix.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CoreError::invalid_seed(format!(
            "block hash prefix '{prefix}' is not hex"
        )));
    }
    u32::from_str_radix(prefix, 16).map_err(|e| {
        CoreError::invalid_seed(format!("block hash prefix '{prefix}' is not hex: {e}"))
    })
}

/// Parses a block record from JSON, reporting a missing or non-integer nonce
/// as [`CoreError::InvalidSeed`] instead of a deserialization error.
pub fn parse_block(json: &str) -> Result<BlockSeed> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| CoreError::invalid_seed(format!("block record is not JSON: {e}")))?;

    let nonce = match value.get("nonce") {
        None | Some(Value::Null) => {
            return Err(CoreError::invalid_seed("block nonce is missing"));
        }
        Some(Value::Number(n)) => match (n.as_i64(), n.as_u64()) {
            (Some(v), _) => v,
            (None, Some(v)) => v as i64,
            _ => {
                return Err(CoreError::invalid_seed(format!(
                    "block nonce {n} is not an integer"
                )))
            }
        },
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| {
            CoreError::invalid_seed(format!("block nonce '{s}' is not an integer"))
        })?,
        Some(other) => {
            return Err(CoreError::invalid_seed(format!(
                "block nonce {other} is not an integer"
            )))
        }
    };

    let hash = value
        .get("hash")
        .and_then(Value::as_str)
        .map(str::to_owned);
    let timestamp_seconds = ["timestampSeconds", "timestamp_seconds", "timestamp"]
        .iter()
        .find_map(|k| value.get(*k).and_then(Value::as_i64));

    Ok(BlockSeed {
        nonce: Some(nonce),
        hash,
        timestamp_seconds,
    })
}
