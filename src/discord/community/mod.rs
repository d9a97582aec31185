// Community engagement commands: giveaways and reaction polls.

pub mod giveaway;
pub mod poll;
