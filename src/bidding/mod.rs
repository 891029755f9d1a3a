pub mod commands;
pub mod winner;
