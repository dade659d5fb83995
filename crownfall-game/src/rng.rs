//! Seeded randomness: per-domain RNG streams and the challenge oracle.
use hmac::{Hmac, Mac};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::Sha256;
use std::cell::{RefCell, RefMut};

/// Deterministic bundle of RNG streams segregated by game domain.
///
/// Streams are independent so that, for example, an extra dice roll never
/// shifts the order in which decks were shuffled.
#[derive(Debug, Clone)]
pub struct RngBundle {
    dice: RefCell<CountingRng<ChaCha8Rng>>,
    decks: RefCell<CountingRng<ChaCha8Rng>>,
    tiebreak: RefCell<CountingRng<ChaCha8Rng>>,
    setup: RefCell<CountingRng<ChaCha8Rng>>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            dice: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"dice"))),
            decks: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"decks"))),
            tiebreak: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"tiebreak"))),
            setup: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"setup"))),
        }
    }

    /// Campaign rolls and audit strength.
    #[must_use]
    pub fn dice(&self) -> RefMut<'_, CountingRng<ChaCha8Rng>> {
        self.dice.borrow_mut()
    }

    /// Deck shuffles.
    #[must_use]
    pub fn decks(&self) -> RefMut<'_, CountingRng<ChaCha8Rng>> {
        self.decks.borrow_mut()
    }

    /// Shuffle applied to candidate actions before ranking.
    #[must_use]
    pub fn tiebreak(&self) -> RefMut<'_, CountingRng<ChaCha8Rng>> {
        self.tiebreak.borrow_mut()
    }

    /// Genders, names, initial placement and random priorities.
    #[must_use]
    pub fn setup(&self) -> RefMut<'_, CountingRng<ChaCha8Rng>> {
        self.setup.borrow_mut()
    }

    /// Roll one six-sided die.
    pub fn roll_d6(&self) -> u8 {
        self.dice().gen_range(1..=6)
    }
}

/// A game stream that tallies its draws, so two replays of one seed can be
/// compared stream by stream.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<ChaCha8Rng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: RngCore> CountingRng<R> {
    /// Draws taken from this stream so far.
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

/// Seed for the stream named `domain_tag`, keyed by the game seed.
pub(crate) fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    // HMAC accepts keys of any length, so this branch is never taken.
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

/// Decides whether a challenge succeeds.
pub trait ChallengeOracle {
    fn challenge(&mut self) -> bool;
}

/// Fair coin flip on its own seeded stream.
#[derive(Debug, Clone)]
pub struct CoinFlip {
    rng: CountingRng<ChaCha8Rng>,
}

impl CoinFlip {
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            rng: CountingRng::new(derive_stream_seed(seed, b"challenge")),
        }
    }

    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.rng.draws()
    }
}

impl ChallengeOracle for CoinFlip {
    fn challenge(&mut self) -> bool {
        self.rng.gen_bool(0.5)
    }
}

/// Oracle that always returns the same outcome. Used to pin tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedOutcome(pub bool);

impl ChallengeOracle for FixedOutcome {
    fn challenge(&mut self) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_crownfall_stream_gets_its_own_seed() {
        let seed = 0xFEED_CAFE_u64;
        let tags: [&[u8]; 6] = [b"dice", b"decks", b"tiebreak", b"setup", b"names", b"challenge"];
        let seeds: std::collections::HashSet<u64> =
            tags.iter().map(|tag| derive_stream_seed(seed, tag)).collect();
        assert_eq!(seeds.len(), tags.len());
        assert_ne!(derive_stream_seed(seed, b"names"), derive_stream_seed(seed + 1, b"names"));
    }

    #[test]
    fn challenges_follow_the_challenge_stream() {
        let seed = 77;
        let mut coin = CoinFlip::from_user_seed(seed);
        let mut expected = ChaCha8Rng::seed_from_u64(derive_stream_seed(seed, b"challenge"));
        for _ in 0..32 {
            assert_eq!(coin.challenge(), expected.gen_bool(0.5));
        }
        assert_eq!(coin.draws(), 32);

        let bundle = RngBundle::from_user_seed(seed);
        let mut dice = bundle.dice();
        let mut on_dice = ChaCha8Rng::seed_from_u64(derive_stream_seed(seed, b"dice"));
        assert_eq!(dice.next_u32(), on_dice.next_u32());
        assert_eq!(dice.draws(), 1);
    }

    #[test]
    fn same_seed_replays_same_rolls() {
        let a = RngBundle::from_user_seed(9);
        let b = RngBundle::from_user_seed(9);
        let rolls_a: Vec<u8> = (0..20).map(|_| a.roll_d6()).collect();
        let rolls_b: Vec<u8> = (0..20).map(|_| b.roll_d6()).collect();
        assert_eq!(rolls_a, rolls_b);
        assert!(rolls_a.iter().all(|r| (1..=6).contains(r)));
    }

    #[test]
    fn fixed_outcome_never_flips() {
        let mut yes = FixedOutcome(true);
        assert!((0..50).all(|_| yes.challenge()));
        let mut coin = CoinFlip::from_user_seed(1);
        let heads = (0..200).filter(|_| coin.challenge()).count();
        assert!(heads > 50 && heads < 150);
        assert_eq!(coin.draws(), 200);
    }
}
