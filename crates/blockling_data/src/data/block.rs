use serde::{Deserialize, Serialize};

/// Block record handed over by the chain collaborator.
///
/// `nonce` is optional on the wire so that a missing value can be reported as
/// a seed error instead of failing deserialization with a generic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockSeed {
    pub nonce: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(
        default,
        rename = "timestampSeconds",
        alias = "timestamp_seconds",
        alias = "timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp_seconds: Option<i64>,
}

impl BlockSeed {
    pub fn from_nonce(nonce: i64) -> Self {
        Self {
            nonce: Some(nonce),
            hash: None,
            timestamp_seconds: None,
        }
    }

    pub fn with_hash(mut self, hash: impl Into<String>, timestamp_seconds: i64) -> Self {
        self.hash = Some(hash.into());
        self.timestamp_seconds = Some(timestamp_seconds);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_seed_accepts_camel_case_timestamp() {
        let json = r#"{"nonce": 7, "hash": "00ab", "timestampSeconds": 12}"#;
        let block: BlockSeed = serde_json::from_str(json).unwrap();
        assert_eq!(block.nonce, Some(7));
        assert_eq!(block.timestamp_seconds, Some(12));
    }

    #[test]
    fn test_block_seed_missing_nonce_deserializes_as_none() {
        let block: BlockSeed = serde_json::from_str("{}").unwrap();
        assert!(block.nonce.is_none());
        assert!(block.hash.is_none());
    }
}
