//! Injectable random sources for variant selection.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::VariantList;

/// Source of uniformly distributed indices.
///
/// Implementations must return a value in `[0, len)` whenever `len > 0`.
pub trait RandomSource: Send + Sync {
    fn pick(&self, len: usize) -> usize;
}

/// Process-wide thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Deterministic generator for reproducible selection.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn pick(&self, len: usize) -> usize {
        // A poisoned lock still holds a usable generator.
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen_range(0..len)
    }
}

/// Pick one variant uniformly at random.
pub fn select_random<'a>(list: &'a VariantList, random: &dyn RandomSource) -> &'a str {
    let index = random.pick(list.len()).min(list.len() - 1);
    list.get(index).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn list_of(n: usize) -> VariantList {
        VariantList::new((0..n).map(|i| format!("http://v/{i}")).collect()).unwrap()
    }

    #[test]
    fn test_pick_in_range() {
        let random = SeededRandom::new(7);
        for len in 1..=100 {
            for _ in 0..20 {
                assert!(random.pick(len) < len);
            }
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let a = SeededRandom::new(42);
        let b = SeededRandom::new(42);
        let seq_a: Vec<usize> = (0..32).map(|_| a.pick(10)).collect();
        let seq_b: Vec<usize> = (0..32).map(|_| b.pick(10)).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn test_every_variant_reachable() {
        let random = SeededRandom::new(1);
        for n in [1usize, 2, 3, 10, 100] {
            let list = list_of(n);
            let mut seen = HashSet::new();
            for _ in 0..(n * 200) {
                seen.insert(select_random(&list, &random).to_string());
            }
            assert_eq!(seen.len(), n, "not every variant selected for n={n}");
        }
    }

    #[test]
    fn test_single_variant() {
        let list = list_of(1);
        assert_eq!(select_random(&list, &ThreadRandom), "http://v/0");
    }

    #[test]
    fn test_out_of_range_source_is_clamped() {
        struct Broken;
        impl RandomSource for Broken {
            fn pick(&self, len: usize) -> usize {
                len + 5
            }
        }
        let list = list_of(3);
        assert_eq!(select_random(&list, &Broken), "http://v/2");
    }
}
