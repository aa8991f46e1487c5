// ============================================
// File: crates/cryptoserve-exercises/src/red_dog.rs
// ============================================
//! # Red Dog
//!
//! ## Creation Reason
//! A card game dealt from a weak 8-bit LCG. Winning it reliably means
//! recovering the generator from the dealt cards and predicting the
//! third card.
//!
//! ## Round
//! ```text
//! peer   ◄──────────────── bankroll (u16) ──  server
//! peer   ── bet (i16) ──────────────────────►  server
//! peer   ◄──────── card₁ (u32) ‖ card₂ (u32) ──  server   (value(card₁) + 2 ≤ value(card₂))
//! peer   ── "inside" | "outside" ───────────►  server
//! peer   ◄─────── card₃ (u32), flag WIN|LOSE ──  server
//! ```
//! Rounds repeat while the bankroll is strictly between 0 and the target
//! and fewer than 10 rounds were played. The final bankroll is sent as a
//! u32; ending below the target fails the exercise.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Each deal picks fresh LCG parameters and reseeds from the wall clock
//! - Card value: `((card mod 52) + 1) mod 13 + 1`
//!
//! ## Last Modified
//! v0.1.0 - Initial exercise

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use cryptoserve_core::protocol::ServerFlags;
use cryptoserve_core::report::ExerciseError;
use cryptoserve_transport::{Channel, Result};

use crate::error::RegistryError;
use crate::exercise::Exercise;
use crate::registry::StaticUnit;
use crate::tables::{Lcg, Tables};

/// Bankroll at the start of a game.
pub const STARTING_BANKROLL: i32 = 100;
/// Bankroll needed to win.
pub const TARGET_BANKROLL: i32 = 1_000;
/// Round limit.
pub const MAX_ROUNDS: usize = 10;

const CARDS_PER_DECK: u8 = 52;
const CARDS_PER_SUIT: u8 = 13;

/// Exercise flag on the third card when the guess was right.
pub const WIN: u8 = 0x01;
/// Exercise flag on the third card when the guess was wrong.
pub const LOSE: u8 = 0x02;

const NAME: &str = "red_dog";

/// Registration for this module.
pub const UNIT: StaticUnit = StaticUnit::new(NAME, load);

fn load(tables: &Arc<Tables>) -> crate::error::Result<Vec<Arc<dyn Exercise>>> {
    if tables.lcg_parameters.is_empty() {
        return Err(RegistryError::missing_table(NAME, "lcg_parameters"));
    }
    Ok(vec![Arc::new(RedDog::new(Arc::clone(tables)))])
}

// ============================================
// Cards
// ============================================

/// Rank of a card, 1 through 13.
#[must_use]
pub const fn card_value(card: u8) -> u8 {
    ((card % CARDS_PER_DECK) + 1) % CARDS_PER_SUIT + 1
}

/// Source of cards.
pub trait Deck: Send {
    /// Prepares a new deal.
    fn shuffle(&mut self);

    /// Draws the next card.
    fn draw(&mut self) -> u8;
}

/// Deck backed by an LCG with randomly chosen full-period parameters.
#[derive(Debug)]
pub struct LcgDeck<R> {
    tables: Arc<Tables>,
    rng: R,
    lcg: Lcg,
}

impl<R: Rng + Send> LcgDeck<R> {
    /// Creates a deck. Returns `None` if no LCG parameters are available.
    pub fn new(tables: Arc<Tables>, mut rng: R) -> Option<Self> {
        let params = *tables.lcg_parameters.choose(&mut rng)?;
        Some(Self {
            lcg: Lcg::new(params, clock_seed()),
            tables,
            rng,
        })
    }
}

impl<R: Rng + Send> Deck for LcgDeck<R> {
    fn shuffle(&mut self) {
        if let Some(&params) = self.tables.lcg_parameters.choose(&mut self.rng) {
            self.lcg = Lcg::new(params, clock_seed());
        }
    }

    fn draw(&mut self) -> u8 {
        self.lcg.next_value()
    }
}

/// Low byte of the current Unix time in seconds.
fn clock_seed() -> u8 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    secs.to_be_bytes()[7]
}

/// Deals `[low, high, third]`, re-dealing until the first two card values
/// differ by at least 2.
pub fn deal<D: Deck + ?Sized>(deck: &mut D) -> [u8; 3] {
    loop {
        deck.shuffle();
        let mut pair = [deck.draw(), deck.draw()];
        pair.sort_by_key(|&card| card_value(card));

        if card_value(pair[1]) - card_value(pair[0]) >= 2 {
            return [pair[0], pair[1], deck.draw()];
        }
    }
}

/// A peer's call on the third card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guess {
    /// Strictly between the two dealt values.
    Inside,
    /// Anywhere else.
    Outside,
}

impl Guess {
    /// The correct call for a deal.
    #[must_use]
    pub const fn for_deal(low: u8, high: u8, third: u8) -> Self {
        let (low, high, third) = (card_value(low), card_value(high), card_value(third));
        if low < third && third < high {
            Self::Inside
        } else {
            Self::Outside
        }
    }

    fn parse(payload: &[u8]) -> std::result::Result<Self, ExerciseError> {
        let guess = std::str::from_utf8(payload)
            .map(str::to_lowercase)
            .unwrap_or_default();

        match guess.as_str() {
            "inside" => Ok(Self::Inside),
            "outside" => Ok(Self::Outside),
            _ => Err(ExerciseError::invalid_parameter("guess must be 'inside' or 'outside'")
                .with_explanation(format!(
                    "The server could not understand your guess {:?}.",
                    String::from_utf8_lossy(payload)
                ))),
        }
    }
}

// ============================================
// Exercise
// ============================================

/// The Red Dog exercise.
#[derive(Debug, Clone)]
pub struct RedDog {
    tables: Arc<Tables>,
}

impl RedDog {
    /// Creates the exercise over shared tables.
    #[must_use]
    pub const fn new(tables: Arc<Tables>) -> Self {
        Self { tables }
    }
}

#[async_trait]
impl Exercise for RedDog {
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, channel: &mut Channel) -> Result<()> {
        let Some(mut deck) = LcgDeck::new(Arc::clone(&self.tables), StdRng::from_entropy()) else {
            return Err(ExerciseError::unexpected().into());
        };
        play(channel, &mut deck).await
    }
}

/// Plays one game.
///
/// # Errors
/// Returns an error for an invalid bet or guess, or if the game ends below
/// the target bankroll.
pub async fn play<D: Deck>(channel: &mut Channel, deck: &mut D) -> Result<()> {
    let mut bankroll = STARTING_BANKROLL;
    let mut rounds = 0;

    while 0 < bankroll && bankroll < TARGET_BANKROLL && rounds < MAX_ROUNDS {
        let shown = u16::try_from(bankroll).unwrap_or(u16::MAX);
        channel.send(&shown.to_be_bytes()).await?;

        let bet = channel
            .expect_with(Some(2), |frame| verify_bet(&frame.payload, bankroll))
            .await?;

        let [low, high, third] = deal(deck);
        let mut cards = Vec::with_capacity(8);
        cards.extend_from_slice(&u32::from(low).to_be_bytes());
        cards.extend_from_slice(&u32::from(high).to_be_bytes());
        channel.send(&cards).await?;

        let guess = channel
            .expect_with(None, |frame| Guess::parse(&frame.payload))
            .await?;

        let outcome = if guess == Guess::for_deal(low, high, third) {
            bankroll += bet;
            WIN
        } else {
            bankroll -= bet;
            LOSE
        };

        debug!(round = rounds, bet, bankroll, outcome, "Red Dog round settled");
        channel
            .send_with_flags(&u32::from(third).to_be_bytes(), ServerFlags::NONE, outcome)
            .await?;

        rounds += 1;
    }

    let final_bankroll = u32::try_from(bankroll).unwrap_or(0);
    channel.send(&final_bankroll.to_be_bytes()).await?;

    if bankroll < TARGET_BANKROLL {
        return Err(ExerciseError::exercise("target bankroll not reached")
            .with_explanation(format!(
                "You finished with ${bankroll} after {rounds} rounds, but needed ${TARGET_BANKROLL}."
            ))
            .with_hints([
                "The cards come from a linear congruential generator modulo 256.",
                "Can you recover the generator from the cards you have already seen?",
            ])
            .into());
    }

    Ok(())
}

fn verify_bet(payload: &[u8], bankroll: i32) -> std::result::Result<i32, ExerciseError> {
    let bet = i32::from(i16::from_be_bytes([payload[0], payload[1]]));

    if bet < 0 {
        return Err(ExerciseError::invalid_parameter("bet cannot be negative")
            .with_explanation("You placed an invalid bet. Your bet must be non-negative."));
    }

    if bet > bankroll {
        return Err(ExerciseError::invalid_parameter("bet is too high").with_explanation(format!(
            "You don't have enough money to cover your bet. You tried to place a ${bet} bet with only ${bankroll} remaining."
        )));
    }

    Ok(bet)
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use cryptoserve_core::report::ErrorKind;

    use crate::testing::{assert_kind, spawn};

    /// Cycles through a fixed card sequence.
    struct ScriptedDeck {
        cards: Vec<u8>,
        next: usize,
    }

    impl Deck for ScriptedDeck {
        fn shuffle(&mut self) {}

        fn draw(&mut self) -> u8 {
            let card = self.cards[self.next % self.cards.len()];
            self.next += 1;
            card
        }
    }

    fn start() -> (Channel, tokio::task::JoinHandle<Result<()>>) {
        spawn(|mut channel| async move {
            let mut deck = ScriptedDeck {
                cards: vec![0, 11, 2, 2, 6, 7],
                next: 0,
            };
            play(&mut channel, &mut deck).await
        })
    }

    /// Plays one round from the peer side and returns the outcome flag.
    async fn round(peer: &mut Channel, expected_bankroll: u16, bet: i16, guess: &str) -> u8 {
        let bankroll = peer.expect(Some(2)).await.unwrap();
        assert_eq!(u16::from_be_bytes([bankroll[0], bankroll[1]]), expected_bankroll);

        peer.send(&bet.to_be_bytes()).await.unwrap();
        assert_eq!(peer.expect(Some(8)).await.unwrap().len(), 8);
        peer.send(guess.as_bytes()).await.unwrap();

        let third = peer.receive().await.unwrap();
        assert_eq!(third.payload.len(), 4);
        third.exercise_flags
    }

    async fn final_bankroll(peer: &mut Channel) -> u32 {
        let payload = peer.expect(Some(4)).await.unwrap();
        u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]])
    }

    #[test]
    fn test_card_value() {
        assert_eq!(card_value(0), 2);
        assert_eq!(card_value(11), 13);
        assert_eq!(card_value(12), 1);
        assert_eq!(card_value(51), 1);
        assert_eq!(card_value(52), 2);
        assert!((0..=255).all(|c| (1..=13).contains(&card_value(c))));
    }

    #[test]
    fn test_guess_for_deal() {
        assert_eq!(Guess::for_deal(0, 11, 2), Guess::Inside);
        assert_eq!(Guess::for_deal(2, 6, 7), Guess::Outside);
        // equal to an edge is outside
        assert_eq!(Guess::for_deal(2, 6, 2), Guess::Outside);
    }

    #[test]
    fn test_deal_redeals_adjacent_values() {
        let mut deck = ScriptedDeck {
            cards: vec![0, 1, 0, 11, 5],
            next: 0,
        };
        assert_eq!(deal(&mut deck), [0, 11, 5]);
    }

    #[test]
    fn test_lcg_deck_deals_valid_hands() {
        let tables = Arc::new(Tables::compute());
        let mut deck = LcgDeck::new(tables, StdRng::seed_from_u64(5)).unwrap();
        for _ in 0..50 {
            let [low, high, _] = deal(&mut deck);
            assert!(card_value(high) >= card_value(low) + 2);
        }
    }

    #[test]
    fn test_lcg_deck_requires_parameters() {
        assert!(LcgDeck::new(Arc::new(Tables::default()), StdRng::seed_from_u64(0)).is_none());
        assert!(load(&Arc::new(Tables::default())).is_err());
    }

    #[tokio::test]
    async fn test_reaching_target_wins() {
        let (mut peer, server) = start();

        assert_eq!(round(&mut peer, 100, 100, "inside").await, WIN);
        assert_eq!(round(&mut peer, 200, 200, "OUTSIDE").await, WIN);
        assert_eq!(round(&mut peer, 400, 400, "Inside").await, WIN);
        assert_eq!(round(&mut peer, 800, 800, "outside").await, WIN);
        assert_eq!(final_bankroll(&mut peer).await, 1600);

        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_going_broke_fails() {
        let (mut peer, server) = start();

        assert_eq!(round(&mut peer, 100, 100, "outside").await, LOSE);
        assert_eq!(final_bankroll(&mut peer).await, 0);

        assert_kind(server.await.unwrap(), ErrorKind::Exercise);
    }

    #[tokio::test]
    async fn test_round_limit() {
        let (mut peer, server) = start();

        for _ in 0..MAX_ROUNDS {
            round(&mut peer, 100, 0, "inside").await;
        }
        assert_eq!(final_bankroll(&mut peer).await, 100);

        let err = assert_kind(server.await.unwrap(), ErrorKind::Exercise);
        assert_eq!(err.message(), "target bankroll not reached");
    }

    #[tokio::test]
    async fn test_invalid_bets() {
        for bet in [101i16, -1, i16::MIN] {
            let (mut peer, server) = start();
            peer.expect(Some(2)).await.unwrap();
            peer.send(&bet.to_be_bytes()).await.unwrap();
            assert_kind(server.await.unwrap(), ErrorKind::InvalidParameter);
        }
    }

    #[tokio::test]
    async fn test_invalid_guess() {
        for guess in [&b"sideways"[..], &[0xFF, 0xFE][..], &b""[..]] {
            let (mut peer, server) = start();
            peer.expect(Some(2)).await.unwrap();
            peer.send(&10i16.to_be_bytes()).await.unwrap();
            peer.expect(Some(8)).await.unwrap();
            peer.send(guess).await.unwrap();
            assert_kind(server.await.unwrap(), ErrorKind::InvalidParameter);
        }
    }
}
