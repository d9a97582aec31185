// Giveaways - argument validation and winner selection.
//
// The Discord layer owns the message, the 🎉 reaction and the end timer;
// this file only decides what a valid giveaway is and who wins it.

use crate::core::moderation::{parse_duration_within, TimeoutParseError};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Longest giveaway accepted.
pub const MAX_GIVEAWAY_DURATION: Duration = Duration::from_secs(30 * 24 * 60 * 60);
pub const MAX_WINNERS: u32 = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GiveawayError {
    #[error("Invalid time format! Use: s (seconds), m (minutes), h (hours), d (days)")]
    InvalidDuration,
    #[error("Giveaway duration cannot exceed 30 days!")]
    TooLong,
    #[error("Winners count must be between 1 and 20!")]
    Winners,
    #[error("Please name a prize for the giveaway!")]
    MissingPrize,
}

/// A validated giveaway request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Giveaway {
    pub duration: Duration,
    pub winners: u32,
    pub prize: String,
}

impl Giveaway {
    pub fn parse(duration: &str, winners: u32, prize: &str) -> Result<Self, GiveawayError> {
        let duration =
            parse_duration_within(duration, MAX_GIVEAWAY_DURATION).map_err(|e| match e {
                TimeoutParseError::InvalidFormat => GiveawayError::InvalidDuration,
                TimeoutParseError::TooLong { .. } => GiveawayError::TooLong,
            })?;

        if !(1..=MAX_WINNERS).contains(&winners) {
            return Err(GiveawayError::Winners);
        }

        let prize = prize.trim();
        if prize.is_empty() {
            return Err(GiveawayError::MissingPrize);
        }

        Ok(Self {
            duration,
            winners,
            prize: prize.to_string(),
        })
    }
}

/// Draw up to `count` distinct winners from the entrants. The host can never
/// win; bots are filtered out before this is called.
pub fn pick_winners<R: Rng + ?Sized>(
    entrants: &[u64],
    host_id: u64,
    count: u32,
    rng: &mut R,
) -> Vec<u64> {
    let mut seen = HashSet::new();
    let eligible: Vec<u64> = entrants
        .iter()
        .copied()
        .filter(|id| *id != host_id && seen.insert(*id))
        .collect();

    eligible
        .choose_multiple(rng, count as usize)
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_parse_valid_giveaway() {
        let giveaway = Giveaway::parse("1h", 2, "  Discord Nitro ").unwrap();
        assert_eq!(giveaway.duration, Duration::from_secs(3600));
        assert_eq!(giveaway.winners, 2);
        assert_eq!(giveaway.prize, "Discord Nitro");
    }

    #[test]
    fn test_parse_rejects_bad_arguments() {
        assert_eq!(
            Giveaway::parse("1w", 1, "prize"),
            Err(GiveawayError::InvalidDuration)
        );
        assert_eq!(
            Giveaway::parse("31d", 1, "prize"),
            Err(GiveawayError::TooLong)
        );
        assert_eq!(Giveaway::parse("30d", 1, "prize").unwrap().winners, 1);
        assert_eq!(Giveaway::parse("1h", 0, "prize"), Err(GiveawayError::Winners));
        assert_eq!(Giveaway::parse("1h", 21, "prize"), Err(GiveawayError::Winners));
        assert_eq!(Giveaway::parse("1h", 1, "   "), Err(GiveawayError::MissingPrize));
    }

    #[test]
    fn test_host_never_wins_and_winners_are_distinct() {
        let mut rng = StdRng::seed_from_u64(7);
        let entrants = [1, 2, 2, 3, 99, 4];

        for _ in 0..50 {
            let winners = pick_winners(&entrants, 99, 3, &mut rng);
            assert_eq!(winners.len(), 3);
            assert!(!winners.contains(&99));
            let unique: HashSet<u64> = winners.iter().copied().collect();
            assert_eq!(unique.len(), 3);
        }
    }

    #[test]
    fn test_fewer_entrants_than_winners() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut winners = pick_winners(&[5, 6, 42], 42, 10, &mut rng);
        winners.sort_unstable();
        assert_eq!(winners, vec![5, 6]);

        assert!(pick_winners(&[42], 42, 1, &mut rng).is_empty());
        assert!(pick_winners(&[], 42, 1, &mut rng).is_empty());
    }
}
