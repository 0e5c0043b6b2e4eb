//! Mulberry32 deterministic stream generator.
//!
//! All state is a single `u32`; every step uses wrapping 32-bit integer
//! arithmetic and the float output is an exact `u32 / 2^32` conversion, so a
//! given seed yields the same sequence on every platform and matches the
//! reference JavaScript implementation bit for bit.

use crate::error::{CoreError, Result};
use crate::seed::Seed;
use blockling_data::Vec3;
use rand_core::{impls, RngCore, SeedableRng};

const INCREMENT: u32 = 0x6D2B_79F5;
const TWO_POW_32: f64 = 4_294_967_296.0;
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mulberry32 {
    seed: Seed,
    state: u32,
    draws: u64,
}

impl Mulberry32 {
    pub fn new(seed: Seed) -> Self {
        Self {
            seed,
            state: seed,
            draws: 0,
        }
    }

    /// Seed this generator was created with.
    pub fn seed(&self) -> Seed {
        self.seed
    }

    /// Number of 32-bit outputs consumed so far.
    pub fn draws(&self) -> u64 {
        self.draws
    }

    #[inline]
    fn advance(&mut self) -> u32 {
        self.draws += 1;
        self.state = self.state.wrapping_add(INCREMENT);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Raw 32-bit output; consumes one step.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        self.advance()
    }

    /// Uniform float in `[0, 1)`; consumes one step.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.advance()) / TWO_POW_32
    }

    /// Uniform integer in `[min, max]` (inclusive), computed as
    /// `floor(next_f64() * (max - min + 1)) + min`.
    pub fn next_int(&mut self, min: i64, max: i64) -> Result<i64> {
        if min > max {
            return Err(CoreError::InvalidRange { min, max });
        }
        Ok(self.int_inclusive(min, max))
    }

    #[inline]
    fn int_inclusive(&mut self, min: i64, max: i64) -> i64 {
        let span = (i128::from(max) - i128::from(min) + 1) as f64;
        let offset = (self.next_f64() * span).floor() as i128;
        (i128::from(min) + offset).min(i128::from(max)) as i64
    }

    /// `true` with probability `p`.
    #[inline]
    pub fn next_bool(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Fair coin flip.
    #[inline]
    pub fn coin(&mut self) -> bool {
        self.next_bool(0.5)
    }

    pub fn next_item<'a, T>(&mut self, items: &'a [T]) -> Result<&'a T> {
        if items.is_empty() {
            return Err(CoreError::EmptyCollection);
        }
        let idx = self.int_inclusive(0, items.len() as i64 - 1) as usize;
        Ok(&items[idx])
    }

    /// `count` distinct elements (by position), chosen by shuffling a copy and
    /// truncating. Asking for more than `items.len()` returns every element.
    pub fn next_items<T: Clone>(&mut self, items: &[T], count: usize) -> Vec<T> {
        let mut pool = items.to_vec();
        self.shuffle(&mut pool);
        pool.truncate(count);
        pool
    }

    /// In-place Fisher-Yates shuffle. Empty and single-element slices are left
    /// untouched without consuming any steps.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.int_inclusive(0, i as i64) as usize;
            items.swap(i, j);
        }
    }

    /// Uniform float in `[min, max)`.
    #[inline]
    pub fn next_range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }

    /// Uniform float in `[-1, 1)`.
    #[inline]
    pub fn next_signed(&mut self) -> f64 {
        self.next_f64() * 2.0 - 1.0
    }

    /// Unit vector spread on the sphere via cylindrical projection. Uses two
    /// steps.
    pub fn next_unit_vector(&mut self) -> Vec3 {
        let z = self.next_signed();
        let theta = self.next_f64() * std::f64::consts::TAU;
        let r = (1.0 - z * z).max(0.0).sqrt();
        Vec3::new(r * theta.cos(), r * theta.sin(), z)
    }
}

/// Fixed unit direction for the `n`-th item of a golden-angle spiral. Used
/// where a direction is needed without drawing from any stream.
pub fn spiral_direction(n: u32, total: u32) -> Vec3 {
    let total = f64::from(total.max(1));
    let i = f64::from(n) + 0.5;
    let z = 1.0 - 2.0 * i / total;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let theta = GOLDEN_ANGLE * f64::from(n);
    Vec3::new(r * theta.cos(), r * theta.sin(), z)
}

impl RngCore for Mulberry32 {
    fn next_u32(&mut self) -> u32 {
        self.advance()
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Mulberry32 {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_matches_reference_sequence() {
        let mut rng = Mulberry32::new(0);
        assert_eq!(rng.next_u32(), 1_144_304_738);
        assert_eq!(rng.next_u32(), 1_416_247);
        assert_eq!(rng.next_u32(), 958_946_056);

        let mut rng = Mulberry32::new(42);
        assert_eq!(rng.next_u32(), 2_581_720_956);
        assert_eq!(rng.next_u32(), 1_925_393_290);
        assert_eq!(rng.next_u32(), 3_661_312_704);
    }

    #[test]
    fn test_next_f64_is_exact_u32_ratio() {
        let mut rng = Mulberry32::new(42);
        assert_eq!(rng.next_f64(), 2_581_720_956.0 / 4_294_967_296.0);
    }

    #[test]
    fn test_next_f64_in_unit_interval() {
        let mut rng = Mulberry32::new(7);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_next_int_rejects_inverted_range() {
        let mut rng = Mulberry32::new(1);
        assert_eq!(
            rng.next_int(5, 4),
            Err(CoreError::InvalidRange { min: 5, max: 4 })
        );
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_next_int_degenerate_range() {
        let mut rng = Mulberry32::new(1);
        assert_eq!(rng.next_int(3, 3).unwrap(), 3);
        assert_eq!(rng.draws(), 1);
    }

    #[test]
    fn test_next_int_extreme_bounds() {
        let mut rng = Mulberry32::new(99);
        for _ in 0..1000 {
            rng.next_int(i64::MIN, i64::MAX).unwrap();
        }
        for _ in 0..1000 {
            let v = rng.next_int(-3, 3).unwrap();
            assert!((-3..=3).contains(&v));
        }
    }

    #[test]
    fn test_next_bool_extremes() {
        let mut rng = Mulberry32::new(3);
        for _ in 0..100 {
            assert!(!rng.next_bool(0.0));
            assert!(rng.next_bool(1.0));
        }
    }

    #[test]
    fn test_next_item_empty_fails() {
        let mut rng = Mulberry32::new(3);
        let empty: [u8; 0] = [];
        assert_eq!(rng.next_item(&empty), Err(CoreError::EmptyCollection));
    }

    #[test]
    fn test_next_items_truncates_and_keeps_distinct_positions() {
        let mut rng = Mulberry32::new(11);
        let items: Vec<u32> = (0..10).collect();
        let picked = rng.next_items(&items, 4);
        assert_eq!(picked.len(), 4);
        let mut sorted = picked.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 4);

        let all = rng.next_items(&items, 50);
        assert_eq!(all.len(), 10);
        assert!(rng.next_items(&items, 0).is_empty());
    }

    #[test]
    fn test_shuffle_empty_is_noop() {
        let mut rng = Mulberry32::new(5);
        let mut empty: Vec<i32> = Vec::new();
        rng.shuffle(&mut empty);
        assert!(empty.is_empty());
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_unit_vector_is_normalized() {
        let mut rng = Mulberry32::new(8);
        for _ in 0..100 {
            let v = rng.next_unit_vector();
            assert!((v.length() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_spiral_direction_is_normalized() {
        for n in 0..32 {
            assert!((spiral_direction(n, 32).length() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_drives_rand_distributions() {
        let mut a = Mulberry32::from_seed(7u32.to_le_bytes());
        let mut b = Mulberry32::new(7);
        let x: u32 = a.gen_range(0..100);
        let y: u32 = b.gen_range(0..100);
        assert_eq!(x, y);
    }
}
