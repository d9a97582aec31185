pub mod birthday_checker;
pub mod commands;
