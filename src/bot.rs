use crate::{Config, Result};
use std::time::Duration;

/// The game-facing side of the bot, driven by [`Runner`](crate::Runner).
///
/// `start` is called once; `take_step` is then called back to back until the run
/// is cancelled. Implementations pace themselves.
#[allow(async_fn_in_trait)]
pub trait Bot {
    async fn start(&mut self) -> Result<()>;
    async fn take_step(&mut self) -> Result<()>;
}

const IDLE_STEP: Duration = Duration::from_secs(1);

/// A bot that walks through the lifecycle without talking to any server.
pub struct IdleBot {
    config: Config,
    steps: u64,
    step_interval: Duration,
}

impl IdleBot {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            steps: 0,
            step_interval: IDLE_STEP,
        }
    }

    pub fn with_step_interval(mut self, step_interval: Duration) -> Self {
        self.step_interval = step_interval;
        self
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }
}

impl Bot for IdleBot {
    async fn start(&mut self) -> Result<()> {
        let config = &self.config;
        log::info!(
            "{} as {} via {:?}, mode {:?}",
            config.location.as_deref().unwrap_or("cached location"),
            config.username,
            config.auth_service,
            config.mode,
        );
        log::debug!(
            "walk {} m/s, max steps {}, cp {}, potential {}, excluded plugins {:?}",
            config.walk,
            config.max_steps,
            config.cp,
            config.pokemon_potential,
            config.exclude_plugins,
        );
        Ok(())
    }

    async fn take_step(&mut self) -> Result<()> {
        self.steps += 1;
        log::debug!("step {}", self.steps);
        tokio::time::sleep(self.step_interval).await;
        Ok(())
    }
}
