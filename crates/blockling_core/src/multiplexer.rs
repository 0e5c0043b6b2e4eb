//! Named, independently seeded random streams derived from one base seed.
//!
//! A stream's seed is `base_seed ^ fnv1a32(name)`. Streams are created on
//! first use and never reseeded; asking for the same name again hands back the
//! same generator, continuing where it left off.
//!
//! Streams stay with whoever owns the multiplexer. Work sent to the worker
//! pool carries the values drawn from a stream, never the stream itself.

use crate::rng::Mulberry32;
use crate::seed::Seed;
use std::collections::BTreeMap;

pub type RngStream = Mulberry32;

const FNV_OFFSET_BASIS: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a over the UTF-8 bytes of `name`.
pub fn stream_hash(name: &str) -> u32 {
    name.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

#[derive(Debug, Clone)]
pub struct Multiplexer {
    base_seed: Seed,
    streams: BTreeMap<String, RngStream>,
}

impl Multiplexer {
    pub fn new(base_seed: Seed) -> Self {
        Self {
            base_seed,
            streams: BTreeMap::new(),
        }
    }

    pub fn base_seed(&self) -> Seed {
        self.base_seed
    }

    /// Seed the stream called `name` is (or would be) created with.
    pub fn stream_seed(&self, name: &str) -> Seed {
        self.base_seed ^ stream_hash(name)
    }

    /// Returns the stream called `name`, creating it on first request.
    pub fn get_stream(&mut self, name: &str) -> &mut RngStream {
        let seed = self.stream_seed(name);
        self.streams.entry(name.to_owned()).or_insert_with(|| {
            tracing::trace!(stream = name, seed, "Creating RNG stream");
            Mulberry32::new(seed)
        })
    }

    pub fn has_stream(&self, name: &str) -> bool {
        self.streams.contains_key(name)
    }

    pub fn stream_names(&self) -> impl Iterator<Item = &str> {
        self.streams.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_reference_values() {
        assert_eq!(stream_hash(""), 0x811C_9DC5);
        assert_eq!(stream_hash("a"), 0xE40C_292C);
        assert_eq!(stream_hash("physics"), 0x8723_1CA2);
        assert_eq!(stream_hash("traits"), 0x8861_2808);
        assert_eq!(stream_hash("formation"), 0x8983_26EC);
    }

    #[test]
    fn test_same_name_returns_same_stream() {
        let mut mux = Multiplexer::new(2_083_236_893);
        let first = mux.get_stream("physics").next_u32();
        let second = mux.get_stream("physics").next_u32();
        assert_ne!(first, second, "second request must continue the sequence");
        assert_eq!(mux.get_stream("physics").draws(), 2);
        assert_eq!(mux.stream_names().count(), 1);
    }

    #[test]
    fn test_physics_stream_first_pick() {
        let mut mux = Multiplexer::new(2_083_236_893);
        let stream = mux.get_stream("physics");
        assert_eq!(stream.seed(), 2_083_236_893 ^ 0x8723_1CA2);
        assert_eq!(stream.next_int(0, 4).unwrap(), 4);
    }

    #[test]
    fn test_streams_are_lazily_created() {
        let mut mux = Multiplexer::new(1);
        assert!(!mux.has_stream("traits"));
        mux.get_stream("traits");
        assert!(mux.has_stream("traits"));
    }
}
