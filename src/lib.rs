mod bot;
pub mod cli;
pub mod config;
pub mod credentials;
mod error;
pub mod logging;
mod runner;
pub mod status;

pub use crate::config::{resolve, AuthService, Config, Mode, PartialConfig};
pub use crate::error::{Error, Result};
pub use bot::{Bot, IdleBot};
pub use runner::Runner;
