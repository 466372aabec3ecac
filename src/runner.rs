use crate::status::{self, Color};
use crate::{Bot, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Drives a [`Bot`]: one `start`, then `take_step` until the shutdown token is cancelled.
pub struct Runner<B: Bot> {
    bot: B,
    shutdown: CancellationToken,
    started: bool,
}

impl<B: Bot> Runner<B> {
    pub fn new(bot: B) -> Self {
        Self {
            bot,
            shutdown: CancellationToken::new(),
            started: false,
        }
    }

    /// Returns a clone of the shutdown token so callers can stop the loop themselves.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn bot(&self) -> &B {
        &self.bot
    }

    /// Starts the bot if needed, then steps it until the token is cancelled.
    ///
    /// Cancellation is only observed between steps; a step in progress always
    /// completes. The first error from the bot ends the run.
    pub async fn run(&mut self) -> Result<()> {
        if !self.started {
            self.bot.start().await?;
            self.started = true;
            status::log("[x] Starting PokemonGo Bot....", Color::Green);
        }

        let mut steps: u64 = 0;
        while !self.shutdown.is_cancelled() {
            self.bot.take_step().await?;
            steps += 1;
        }

        log::info!("run cancelled after {steps} steps");
        status::log("[x] Exiting PokemonGo Bot", Color::Red);
        Ok(())
    }

    /// Runs until a Ctrl-C (SIGINT) is received or the token is cancelled elsewhere.
    pub async fn run_until_ctrl_c(&mut self) -> Result<()> {
        let shutdown = self.shutdown.clone();
        let listener = tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    log::info!("Ctrl-C received; stopping after the current step");
                    shutdown.cancel();
                }
                Err(e) => log::error!("failed to listen for Ctrl-C: {e}"),
            }
        });

        let result = self.run().await;
        listener.abort();
        result
    }
}
