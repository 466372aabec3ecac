use pokemongo_bot::cli::Cli;
use pokemongo_bot::credentials::TerminalPrompt;
use pokemongo_bot::status::{self, Color};
use pokemongo_bot::{logging, resolve, IdleBot, Runner};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let cli = Cli::parse_args();
    let config = match resolve(cli.overrides(), cli.config_json.as_deref(), &mut TerminalPrompt) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return if e.is_usage() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            };
        }
    };
    if config.debug {
        logging::enable_debug();
    }

    status::log(
        &format!("[x] PokemonGO Bot v{}", env!("CARGO_PKG_VERSION")),
        Color::Green,
    );
    status::log("[x] Configuration initialized", Color::Yellow);

    let mut runner = Runner::new(IdleBot::new(config));
    match runner.run_until_ctrl_c().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
