mod chat;
pub mod cli;
