//! Randomness seam used by exercise generation.
//!
//! Generators draw through [`RandomSource`] so tests can script exact operand
//! sequences while production code uses a seeded or entropy-backed RNG.
use hmac::{Hmac, Mac};
use rand::{Rng, RngCore, SeedableRng, rngs::SmallRng};
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;
use std::collections::VecDeque;
use std::ops::Range;

/// Uniform integer draws for exercise generation.
pub trait RandomSource {
    /// Draw an integer uniformly from `range` (upper bound exclusive).
    ///
    /// An empty range yields `range.start`.
    fn int_in(&mut self, range: Range<i64>) -> i64;

    /// Draw an index in `0..len`. Returns 0 when `len` is 0.
    fn index(&mut self, len: usize) -> usize {
        let upper = i64::try_from(len).unwrap_or(i64::MAX);
        usize::try_from(self.int_in(0..upper)).unwrap_or(0)
    }

    /// Index draw used when choosing which exercise kind comes next.
    fn pick_kind(&mut self, len: usize) -> usize {
        self.index(len)
    }
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn int_in(&mut self, range: Range<i64>) -> i64 {
        if range.is_empty() {
            return range.start;
        }
        self.gen_range(range)
    }
}

/// Replays a fixed sequence of draws.
///
/// Values falling outside the requested range are folded into it, and an
/// exhausted script yields the lower bound.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    values: VecDeque<i64>,
    draws: u64,
}

impl ScriptedSource {
    #[must_use]
    pub fn new(values: impl IntoIterator<Item = i64>) -> Self {
        Self {
            values: values.into_iter().collect(),
            draws: 0,
        }
    }

    /// Number of draws served so far, including those past the end of the script.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl RandomSource for ScriptedSource {
    fn int_in(&mut self, range: Range<i64>) -> i64 {
        self.draws = self.draws.saturating_add(1);
        let Some(value) = self.values.pop_front() else {
            return range.start;
        };
        if range.is_empty() {
            return range.start;
        }
        if range.contains(&value) {
            return value;
        }
        let span = range.end.saturating_sub(range.start);
        range.start + value.saturating_sub(range.start).rem_euclid(span)
    }
}

/// Deterministic pair of generation streams derived from one user seed.
///
/// Kind selection and operand draws live on separate streams so changing how
/// many operands a kind consumes never shifts which kinds come next.
#[derive(Debug, Clone)]
pub struct GenerationStreams {
    kinds: CountingRng<ChaCha20Rng>,
    operands: CountingRng<ChaCha20Rng>,
}

impl GenerationStreams {
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            kinds: CountingRng::seeded(derive_stream_seed(seed, b"kinds")),
            operands: CountingRng::seeded(derive_stream_seed(seed, b"operands")),
        }
    }

    pub fn kinds(&mut self) -> &mut CountingRng<ChaCha20Rng> {
        &mut self.kinds
    }

    pub fn operands(&mut self) -> &mut CountingRng<ChaCha20Rng> {
        &mut self.operands
    }
}

impl RandomSource for GenerationStreams {
    fn int_in(&mut self, range: Range<i64>) -> i64 {
        self.operands.int_in(range)
    }

    fn pick_kind(&mut self, len: usize) -> usize {
        self.kinds.index(len)
    }
}

/// RNG wrapper that counts draw calls.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl<R: SeedableRng> CountingRng<R> {
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: R::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: RngCore> CountingRng<R> {
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

/// Fresh entropy-seeded RNG used for identifiers.
#[must_use]
pub fn id_rng() -> SmallRng {
    SmallRng::from_entropy()
}

/// Derive an independent stream seed for `domain_tag` from the user seed.
#[must_use]
pub fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubRng {
        value: u32,
        calls: u32,
    }

    impl RngCore for StubRng {
        fn next_u32(&mut self) -> u32 {
            self.calls = self.calls.saturating_add(1);
            self.value
        }

        fn next_u64(&mut self) -> u64 {
            u64::from(self.next_u32())
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            let value = self.next_u32().to_le_bytes();
            for (idx, byte) in dest.iter_mut().enumerate() {
                *byte = value[idx % value.len()];
            }
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    #[test]
    fn scripted_source_replays_and_folds() {
        let mut source = ScriptedSource::new([48, 18, 12, -7]);
        assert_eq!(source.int_in(10..60), 48);
        assert_eq!(source.int_in(10..60), 18);
        // 12 folded into 0..5
        assert_eq!(source.int_in(0..5), 2);
        // -7 folded into 0..3
        assert_eq!(source.int_in(0..3), 2);
        assert_eq!(source.remaining(), 0);
        assert_eq!(source.int_in(5..9), 5);
        assert_eq!(source.draws(), 5);
    }

    #[test]
    fn empty_ranges_yield_start() {
        let mut source = ScriptedSource::new([4]);
        assert_eq!(source.int_in(3..3), 3);
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(rng.int_in(7..7), 7);
        assert_eq!(rng.index(0), 0);
    }

    #[test]
    fn rng_draws_stay_in_range() {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..500 {
            let value = rng.int_in(-5..5);
            assert!((-5..5).contains(&value));
            assert!(rng.index(4) < 4);
        }
    }

    #[test]
    fn stub_rng_drives_blanket_impl() {
        let mut rng = StubRng { value: 0, calls: 0 };
        assert_eq!(rng.int_in(10..20), 10);
        assert!(rng.calls >= 1);
    }

    #[test]
    fn streams_are_deterministic_and_independent() {
        let mut a = GenerationStreams::from_seed(7);
        let mut b = GenerationStreams::from_seed(7);
        let draws_a: Vec<i64> = (0..8).map(|_| a.operands().int_in(0..1000)).collect();
        let draws_b: Vec<i64> = (0..8).map(|_| b.operands().int_in(0..1000)).collect();
        assert_eq!(draws_a, draws_b);
        assert!(a.operands().draws() >= 8);
        assert_eq!(a.kinds().draws(), 0);
        assert_ne!(derive_stream_seed(7, b"kinds"), derive_stream_seed(7, b"operands"));
        assert_ne!(derive_stream_seed(7, b"kinds"), derive_stream_seed(8, b"kinds"));
    }

    #[test]
    fn kind_picks_do_not_consume_operand_draws() {
        let mut streams = GenerationStreams::from_seed(3);
        for _ in 0..5 {
            assert!(streams.pick_kind(8) < 8);
        }
        assert_eq!(streams.operands().draws(), 0);
        let _ = streams.int_in(0..10);
        assert!(streams.operands().draws() >= 1);
    }
}
