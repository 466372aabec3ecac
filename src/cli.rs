//! Command-line flags.
//!
//! Every option is optional here: whatever the operator leaves out may still come
//! from the config file or the built-in defaults, so switches are only recorded
//! when they are actually passed.

use crate::config::{Mode, PartialConfig};
use clap::{ArgAction, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

/// Multi-letter single-dash spellings accepted for compatibility with older scripts.
const LEGACY_SHORT_FLAGS: [(&str, &str); 10] = [
    ("-lc", "--location-cache"),
    ("-du", "--distance-unit"),
    ("-ms", "--max-steps"),
    ("-cp", "--combat-power"),
    ("-it", "--initial-transfer"),
    ("-ri", "--recycle-items"),
    ("-iv", "--pokemon-potential"),
    ("-ign", "--ign-init-trans"),
    ("-gd", "--google-directions"),
    ("-ep", "--exclude-plugins"),
];

#[derive(Debug, Parser)]
#[command(name = "pokecli", version, about = "PokemonGo bot", long_about = None)]
pub struct Cli {
    /// Load a config JSON file. Arguments given on the command line override those in the file.
    #[arg(short = 'j', long = "config-json", value_name = "PATH")]
    pub config_json: Option<PathBuf>,

    /// Auth service ('ptc' or 'google')
    #[arg(short, long)]
    pub auth_service: Option<String>,

    #[arg(short, long)]
    pub username: Option<String>,

    #[arg(short, long)]
    pub password: Option<String>,

    /// Location (address or 'xx.yyyy,zz.ttttt')
    #[arg(short, long)]
    pub location: Option<String>,

    /// Start at the last known location [-lc]
    #[arg(long, action = ArgAction::SetTrue)]
    pub location_cache: bool,

    /// Farming mode
    #[arg(short, long, value_enum)]
    pub mode: Option<Mode>,

    /// Walk instead of teleport with the given speed in m/s (at most 4.16, i.e. 15 km/h)
    #[arg(short, long)]
    pub walk: Option<f64>,

    /// Unit to display distances in, e.g. km, mi, ft [-du]
    #[arg(long)]
    pub distance_unit: Option<String>,

    /// Steps around the initial location [-ms]
    #[arg(long, allow_negative_numbers = true)]
    pub max_steps: Option<i64>,

    /// Transfer pokemon with CP below this value [-cp]
    #[arg(long = "combat-power", alias = "combat-points", allow_negative_numbers = true)]
    pub cp: Option<i64>,

    /// On start, transfer all pokemon sharing an ID except the highest CP one [-it]
    #[arg(long, action = ArgAction::SetTrue)]
    pub initial_transfer: bool,

    /// Recycle unneeded items automatically [-ri]
    #[arg(long, action = ArgAction::SetTrue)]
    pub recycle_items: bool,

    /// IV ratio under which pokemon get transferred [-iv]
    #[arg(long)]
    pub pokemon_potential: Option<f64>,

    /// Pokemon IDs to keep during the initial transfer, e.g. 017,049,001 [-ign]
    #[arg(long)]
    pub ign_init_trans: Option<String>,

    /// Google Maps API key
    #[arg(short = 'k', long)]
    pub gmapkey: Option<String>,

    /// Navigate with directions from the Google Maps API [-gd]
    #[arg(long, action = ArgAction::SetTrue)]
    pub google_directions: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    pub debug: bool,

    /// Only parse the specified location
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub test: bool,

    /// Plugins to skip while loading, e.g. logger,web [-ep]
    #[arg(long)]
    pub exclude_plugins: Option<String>,
}

impl Cli {
    /// Parses the process arguments, exiting with a usage error on bad input.
    pub fn parse_args() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    /// The command-line layer of the configuration.
    pub fn overrides(&self) -> PartialConfig {
        PartialConfig {
            mode: self.mode,
            walk: self.walk,
            cp: self.cp,
            pokemon_potential: self.pokemon_potential,
            max_steps: self.max_steps,
            distance_unit: self.distance_unit.clone(),
            ign_init_trans: self.ign_init_trans.clone(),
            exclude_plugins: self.exclude_plugins.clone(),
            recycle_items: passed(self.recycle_items),
            item_filter: None,
            location_cache: passed(self.location_cache),
            initial_transfer: passed(self.initial_transfer),
            debug: passed(self.debug),
            test: passed(self.test),
            auth_service: self.auth_service.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            location: self.location.clone(),
            gmapkey: self.gmapkey.clone(),
            google_directions: passed(self.google_directions),
            extra: Default::default(),
        }
    }
}

fn passed(flag: bool) -> Option<bool> {
    flag.then_some(true)
}

/// Rewrites legacy spellings such as `-lc` or `-cp=200` into their long form.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    args.into_iter()
        .map(|arg| {
            let arg = arg.into();
            arg.to_str()
                .and_then(rewrite_legacy)
                .map(OsString::from)
                .unwrap_or(arg)
        })
        .collect()
}

fn rewrite_legacy(arg: &str) -> Option<String> {
    let (flag, value) = match arg.split_once('=') {
        Some((flag, value)) => (flag, Some(value)),
        None => (arg, None),
    };
    let (_, long) = LEGACY_SHORT_FLAGS.iter().find(|(short, _)| *short == flag)?;
    Some(match value {
        Some(value) => format!("{long}={value}"),
        None => long.to_string(),
    })
}
