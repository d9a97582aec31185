pub mod giveaway;
pub mod poll;

pub use giveaway::{pick_winners, Giveaway, GiveawayError};
pub use poll::{ActivePoll, PollError, PollRegistry, PollRequest, PollResults};
