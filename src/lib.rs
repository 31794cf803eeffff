pub mod animator;
pub mod audio;
pub mod config;
pub mod error;
pub mod http_client;
pub mod presenter;
pub mod sequencer;
pub mod service;
pub mod symbols;
pub mod table;
pub mod wager;

pub mod test_helpers;
