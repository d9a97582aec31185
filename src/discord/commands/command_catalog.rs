// Discord commands module.
// Every command the framework registers is listed here.

use crate::discord::{birthdays, community, moderation, Data, Error};

pub mod general;

pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        general::ping(),
        moderation::antispam::antispam(),
        moderation::warnings::warn(),
        moderation::warnings::removewarn(),
        moderation::warnings::showwarnings(),
        moderation::actions::kick(),
        moderation::actions::ban(),
        moderation::actions::timeout(),
        moderation::actions::untimeout(),
        moderation::actions::mute(),
        moderation::actions::unmute(),
        birthdays::commands::setupbirthdays(),
        birthdays::commands::addbirthday(),
        birthdays::commands::removebirthday(),
        birthdays::commands::birthdays(),
        community::giveaway::giveaway(),
        community::poll::poll(),
    ]
}
