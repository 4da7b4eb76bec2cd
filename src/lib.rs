pub mod api;
pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod guard;
pub mod http;
pub mod menu;
pub mod router;
pub mod services;
pub mod session;

pub use console::Console;
pub use error::ConsoleError;

#[cfg(test)]
pub mod testing;
