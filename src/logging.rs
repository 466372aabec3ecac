use env_logger::DEFAULT_FILTER_ENV;
use log::LevelFilter;

/// Installs the logger. `RUST_LOG` wins over the bot's own `debug` switch when set.
pub fn init() {
    if std::env::var_os(DEFAULT_FILTER_ENV).is_some() {
        env_logger::init();
        return;
    }
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module(env!("CARGO_CRATE_NAME"), LevelFilter::Debug)
        .init();
    log::set_max_level(LevelFilter::Info);
}

pub fn enable_debug() {
    if std::env::var_os(DEFAULT_FILTER_ENV).is_none() {
        log::set_max_level(LevelFilter::Debug);
    }
}
