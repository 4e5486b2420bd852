pub mod backend;
pub mod clock;
pub mod config;
pub mod push;
#[cfg(unix)]
pub mod signal_handler;
