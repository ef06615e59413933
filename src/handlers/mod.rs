//! Command Handlers module
//!
//! CQRS command definitions and the handler that runs them against the
//! event store.

mod account_handler;
mod commands;


pub use account_handler::AccountCommandHandler;
pub use commands::*;
