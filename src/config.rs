use crate::credentials::CredentialProvider;
use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// Walking faster than 15 km/h is flagged by the game servers.
pub const MAX_WALK_SPEED: f64 = 4.16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    All,
    Poke,
    Farm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthService {
    Ptc,
    Google,
}

impl AuthService {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ptc" => Some(Self::Ptc),
            "google" => Some(Self::Google),
            _ => None,
        }
    }
}

/// One layer of configuration. `None` means the layer leaves the field unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialConfig {
    pub mode: Option<Mode>,
    pub walk: Option<f64>,
    pub cp: Option<i64>,
    pub pokemon_potential: Option<f64>,
    pub max_steps: Option<i64>,
    pub distance_unit: Option<String>,
    pub ign_init_trans: Option<String>,
    pub exclude_plugins: Option<String>,
    pub recycle_items: Option<bool>,
    #[serde(default, deserialize_with = "item_filter")]
    pub item_filter: Option<BTreeMap<u32, u32>>,
    pub location_cache: Option<bool>,
    pub initial_transfer: Option<bool>,
    pub debug: Option<bool>,
    pub test: Option<bool>,
    pub auth_service: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub location: Option<String>,
    pub gmapkey: Option<String>,
    pub google_directions: Option<bool>,
    /// Keys of a config file that are not options of this program.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// JSON object keys are always strings, so item ids arrive as "101" and are parsed here.
fn item_filter<'de, D>(deserializer: D) -> std::result::Result<Option<BTreeMap<u32, u32>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<BTreeMap<String, u32>>::deserialize(deserializer)? else {
        return Ok(None);
    };
    raw.into_iter()
        .map(|(id, count)| {
            id.trim()
                .parse::<u32>()
                .map(|id| (id, count))
                .map_err(|_| <D::Error as serde::de::Error>::custom(format!("invalid item id `{id}`")))
        })
        .collect::<std::result::Result<_, _>>()
        .map(Some)
}

impl PartialConfig {
    /// The built-in layer, applied beneath the command line and the config file.
    pub fn defaults() -> Self {
        Self {
            mode: Some(Mode::All),
            walk: Some(2.5),
            cp: Some(100),
            pokemon_potential: Some(0.40),
            max_steps: Some(50),
            distance_unit: Some(String::from("km")),
            ign_init_trans: Some(String::new()),
            exclude_plugins: Some(String::new()),
            recycle_items: Some(false),
            item_filter: Some(BTreeMap::from([
                (1, 100),
                (101, 0),
                (102, 0),
                (103, 10),
                (104, 10),
                (201, 10),
                (202, 10),
            ])),
            location_cache: Some(false),
            initial_transfer: Some(false),
            debug: Some(false),
            test: Some(false),
            google_directions: Some(false),
            ..Default::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Fills every field unset in `self` from `lower`, returning the merged layer.
    pub fn or(self, lower: PartialConfig) -> PartialConfig {
        let mut extra = lower.extra;
        extra.extend(self.extra);
        PartialConfig {
            mode: self.mode.or(lower.mode),
            walk: self.walk.or(lower.walk),
            cp: self.cp.or(lower.cp),
            pokemon_potential: self.pokemon_potential.or(lower.pokemon_potential),
            max_steps: self.max_steps.or(lower.max_steps),
            distance_unit: self.distance_unit.or(lower.distance_unit),
            ign_init_trans: self.ign_init_trans.or(lower.ign_init_trans),
            exclude_plugins: self.exclude_plugins.or(lower.exclude_plugins),
            recycle_items: self.recycle_items.or(lower.recycle_items),
            item_filter: self.item_filter.or(lower.item_filter),
            location_cache: self.location_cache.or(lower.location_cache),
            initial_transfer: self.initial_transfer.or(lower.initial_transfer),
            debug: self.debug.or(lower.debug),
            test: self.test.or(lower.test),
            auth_service: self.auth_service.or(lower.auth_service),
            username: self.username.or(lower.username),
            password: self.password.or(lower.password),
            location: self.location.or(lower.location),
            gmapkey: self.gmapkey.or(lower.gmapkey),
            google_directions: self.google_directions.or(lower.google_directions),
            extra,
        }
    }

    fn redacted(&self) -> Self {
        Self {
            password: self.password.as_ref().map(|_| String::from("********")),
            ..self.clone()
        }
    }
}

/// The resolved, validated run options handed to the bot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub mode: Mode,
    pub walk: f64,
    pub cp: i64,
    pub pokemon_potential: f64,
    pub max_steps: i64,
    pub distance_unit: String,
    pub ign_init_trans: String,
    pub exclude_plugins: Vec<String>,
    pub recycle_items: bool,
    pub item_filter: BTreeMap<u32, u32>,
    pub location_cache: bool,
    pub initial_transfer: bool,
    pub debug: bool,
    pub test: bool,
    pub auth_service: AuthService,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub location: Option<String>,
    pub gmapkey: Option<String>,
    pub google_directions: bool,
    pub extra: Map<String, Value>,
}

/// Resolves the final configuration.
///
/// Values given on the command line win over the config file at `config_json`,
/// which wins over the built-in defaults. Missing credentials are requested
/// from `credentials` once everything else has validated.
pub fn resolve<C>(
    cli: PartialConfig,
    config_json: Option<&Path>,
    credentials: &mut C,
) -> Result<Config>
where
    C: CredentialProvider + ?Sized,
{
    let file = match config_json {
        Some(path) => {
            let file = PartialConfig::load(path)?;
            log::debug!("loaded config file {}", path.display());
            file
        }
        None => PartialConfig::default(),
    };
    finalize(cli.or(file).or(PartialConfig::defaults()), credentials)
}

fn finalize<C>(merged: PartialConfig, credentials: &mut C) -> Result<Config>
where
    C: CredentialProvider + ?Sized,
{
    let exclude_plugins = split_plugins(merged.exclude_plugins.as_deref().unwrap_or_default());

    match render(&merged, &exclude_plugins) {
        Ok(line) => println!("{line}"),
        Err(e) => log::warn!("failed to render configuration: {e}"),
    }

    let PartialConfig {
        mode,
        walk,
        cp,
        pokemon_potential,
        max_steps,
        distance_unit,
        ign_init_trans,
        exclude_plugins: _,
        recycle_items,
        item_filter,
        location_cache,
        initial_transfer,
        debug,
        test,
        auth_service,
        username,
        password,
        location,
        gmapkey,
        google_directions,
        extra,
    } = merged;

    let auth_service = match auth_service.as_deref() {
        Some(name) => AuthService::from_name(name)
            .ok_or_else(|| Error::InvalidAuthService(name.to_string()))?,
        None => return Err(Error::MissingAuthService),
    };
    let location_cache = defaulted(location_cache, "location_cache");
    if location.is_none() && !location_cache {
        return Err(Error::MissingLocation);
    }

    let walk = defaulted(walk, "walk");
    if walk > MAX_WALK_SPEED {
        log::warn!("walk speed {walk} m/s is above {MAX_WALK_SPEED} m/s");
    }

    let username = match username {
        Some(username) => username,
        None => credentials.username().map_err(Error::Prompt)?,
    };
    let password = match password {
        Some(password) => password,
        None => credentials.password().map_err(Error::Prompt)?,
    };

    Ok(Config {
        mode: defaulted(mode, "mode"),
        walk,
        cp: defaulted(cp, "cp"),
        pokemon_potential: defaulted(pokemon_potential, "pokemon_potential"),
        max_steps: defaulted(max_steps, "max_steps"),
        distance_unit: defaulted(distance_unit, "distance_unit"),
        ign_init_trans: defaulted(ign_init_trans, "ign_init_trans"),
        exclude_plugins,
        recycle_items: defaulted(recycle_items, "recycle_items"),
        item_filter: defaulted(item_filter, "item_filter"),
        location_cache,
        initial_transfer: defaulted(initial_transfer, "initial_transfer"),
        debug: defaulted(debug, "debug"),
        test: defaulted(test, "test"),
        auth_service,
        username,
        password,
        location,
        gmapkey,
        google_directions: defaulted(google_directions, "google_directions"),
        extra,
    })
}

// Only called on fields that `PartialConfig::defaults()` fills.
fn defaulted<T>(value: Option<T>, field: &str) -> T {
    value.unwrap_or_else(|| panic!("`{field}` has no built-in default"))
}

/// The merged record as one JSON line, with the plugin list split and the password hidden.
fn render(merged: &PartialConfig, exclude_plugins: &[String]) -> serde_json::Result<String> {
    let mut view = serde_json::to_value(merged.redacted())?;
    if let Value::Object(fields) = &mut view {
        fields.insert("exclude_plugins".into(), serde_json::to_value(exclude_plugins)?);
    }
    serde_json::to_string(&view)
}

fn split_plugins(csv: &str) -> Vec<String> {
    csv.split(',').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::FixedCredentials;
    use std::io;
    use std::io::Write;
    use tempfile::NamedTempFile;

    struct NoPrompt;

    impl CredentialProvider for NoPrompt {
        fn username(&mut self) -> io::Result<String> {
            panic!("username should not be prompted")
        }
        fn password(&mut self) -> io::Result<String> {
            panic!("password should not be prompted")
        }
    }

    fn cli() -> PartialConfig {
        PartialConfig {
            auth_service: Some("ptc".into()),
            username: Some("ash".into()),
            password: Some("pikachu".into()),
            location: Some("1.0,2.0".into()),
            ..Default::default()
        }
    }

    fn json_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_fill_unset_fields() {
        let config = resolve(cli(), None, &mut NoPrompt).unwrap();
        assert_eq!(config.mode, Mode::All);
        assert_eq!(config.walk, 2.5);
        assert_eq!(config.cp, 100);
        assert_eq!(config.pokemon_potential, 0.40);
        assert_eq!(config.max_steps, 50);
        assert_eq!(config.distance_unit, "km");
        assert_eq!(config.ign_init_trans, "");
        assert_eq!(config.exclude_plugins, vec![String::new()]);
        assert!(!config.recycle_items);
        assert!(!config.location_cache);
        assert!(!config.initial_transfer);
        assert!(!config.debug);
        assert!(!config.test);
        assert!(!config.google_directions);
        assert_eq!(config.gmapkey, None);
        assert_eq!(config.item_filter.len(), 7);
        assert_eq!(config.item_filter[&1], 100);
        assert_eq!(config.item_filter[&101], 0);
        assert_eq!(config.item_filter[&202], 10);
        assert_eq!(config.auth_service, AuthService::Ptc);
        assert_eq!(config.location.as_deref(), Some("1.0,2.0"));
        assert!(config.extra.is_empty());
    }

    #[test]
    fn file_fills_fields_absent_from_cli() {
        let file = json_file(
            r#"{"walk": 3.5, "cp": 500, "mode": "farm", "debug": true, "gmapkey": "abc"}"#,
        );
        let config = resolve(cli(), Some(file.path()), &mut NoPrompt).unwrap();
        assert_eq!(config.walk, 3.5);
        assert_eq!(config.cp, 500);
        assert_eq!(config.mode, Mode::Farm);
        assert!(config.debug);
        assert_eq!(config.gmapkey.as_deref(), Some("abc"));
        assert_eq!(config.max_steps, 50);
    }

    #[test]
    fn cli_wins_over_file() {
        let file = json_file(
            r#"{"walk": 3.5, "auth_service": "google", "location": "elsewhere", "debug": false}"#,
        );
        let overrides = PartialConfig {
            walk: Some(1.0),
            debug: Some(true),
            ..cli()
        };
        let config = resolve(overrides, Some(file.path()), &mut NoPrompt).unwrap();
        assert_eq!(config.walk, 1.0);
        assert!(config.debug);
        assert_eq!(config.auth_service, AuthService::Ptc);
        assert_eq!(config.location.as_deref(), Some("1.0,2.0"));
    }

    #[test]
    fn file_can_supply_required_fields() {
        let file = json_file(
            r#"{"auth_service": "google", "username": "misty", "password": "togepi", "location_cache": true}"#,
        );
        let config =
            resolve(PartialConfig::default(), Some(file.path()), &mut NoPrompt).unwrap();
        assert_eq!(config.auth_service, AuthService::Google);
        assert_eq!(config.username, "misty");
        assert_eq!(config.password, "togepi");
        assert!(config.location_cache);
        assert_eq!(config.location, None);
    }

    #[test]
    fn file_nulls_fall_through_to_defaults() {
        let file = json_file(r#"{"walk": null, "recycle_items": null}"#);
        let config = resolve(cli(), Some(file.path()), &mut NoPrompt).unwrap();
        assert_eq!(config.walk, 2.5);
        assert!(!config.recycle_items);
    }

    #[test]
    fn file_item_filter_and_unknown_keys() {
        let file = json_file(
            r#"{"item_filter": {"1": 50, "101": 5}, "plugins_dir": "./plugins", "walk": 3}"#,
        );
        let config = resolve(cli(), Some(file.path()), &mut NoPrompt).unwrap();
        assert_eq!(config.item_filter, BTreeMap::from([(1, 50), (101, 5)]));
        assert_eq!(config.walk, 3.0);
        assert_eq!(
            config.extra.get("plugins_dir"),
            Some(&Value::String("./plugins".into()))
        );
    }

    #[test]
    fn exclude_plugins_split() {
        let overrides = PartialConfig {
            exclude_plugins: Some("logger,web".into()),
            ..cli()
        };
        let config = resolve(overrides, None, &mut NoPrompt).unwrap();
        assert_eq!(config.exclude_plugins, vec!["logger", "web"]);
    }

    #[test]
    fn exclude_plugins_from_file() {
        let file = json_file(r#"{"exclude_plugins": "web"}"#);
        let config = resolve(cli(), Some(file.path()), &mut NoPrompt).unwrap();
        assert_eq!(config.exclude_plugins, vec!["web"]);
    }

    #[test]
    fn missing_auth_service() {
        let overrides = PartialConfig {
            auth_service: None,
            ..cli()
        };
        let err = resolve(overrides, None, &mut NoPrompt).unwrap_err();
        assert!(matches!(err, Error::MissingAuthService));
    }

    #[test]
    fn invalid_auth_service() {
        let overrides = PartialConfig {
            auth_service: Some("facebook".into()),
            ..cli()
        };
        let err = resolve(overrides, None, &mut NoPrompt).unwrap_err();
        assert!(matches!(err, Error::InvalidAuthService(name) if name == "facebook"));
    }

    #[test]
    fn missing_location() {
        let overrides = PartialConfig {
            location: None,
            ..cli()
        };
        let err = resolve(overrides, None, &mut NoPrompt).unwrap_err();
        assert!(matches!(err, Error::MissingLocation));
    }

    #[test]
    fn location_cache_replaces_location() {
        let overrides = PartialConfig {
            location: None,
            location_cache: Some(true),
            ..cli()
        };
        let config = resolve(overrides, None, &mut NoPrompt).unwrap();
        assert!(config.location_cache);
        assert_eq!(config.location, None);
    }

    #[test]
    fn invalid_json_file() {
        let file = json_file("{\"walk\": 3.5,");
        let err = resolve(cli(), Some(file.path()), &mut NoPrompt).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn non_object_json_file() {
        let file = json_file("[1, 2, 3]");
        let err = resolve(cli(), Some(file.path()), &mut NoPrompt).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn mistyped_json_field() {
        let file = json_file(r#"{"cp": "lots"}"#);
        let err = resolve(cli(), Some(file.path()), &mut NoPrompt).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn missing_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = resolve(cli(), Some(&path), &mut NoPrompt).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }

    #[test]
    fn prompts_for_missing_credentials() {
        let overrides = PartialConfig {
            auth_service: Some("ptc".into()),
            location: Some("1.0,2.0".into()),
            ..Default::default()
        };
        let mut credentials = FixedCredentials::new("alice", "secret");
        let config = resolve(overrides, None, &mut credentials).unwrap();
        assert_eq!(config.username, "alice");
        assert_eq!(config.password, "secret");
    }

    #[test]
    fn prompts_only_for_password() {
        let overrides = PartialConfig {
            password: None,
            ..cli()
        };
        let mut credentials = FixedCredentials::new("alice", "secret");
        let config = resolve(overrides, None, &mut credentials).unwrap();
        assert_eq!(config.username, "ash");
        assert_eq!(config.password, "secret");
    }

    #[test]
    fn no_prompt_when_validation_fails() {
        let overrides = PartialConfig {
            auth_service: Some("ptc".into()),
            ..Default::default()
        };
        let err = resolve(overrides, None, &mut NoPrompt).unwrap_err();
        assert!(matches!(err, Error::MissingLocation));
    }

    #[test]
    fn merge_keeps_higher_layer() {
        let high = PartialConfig {
            cp: Some(10),
            ..Default::default()
        };
        let low = PartialConfig {
            cp: Some(20),
            max_steps: Some(5),
            ..Default::default()
        };
        let merged = high.or(low);
        assert_eq!(merged.cp, Some(10));
        assert_eq!(merged.max_steps, Some(5));
        assert_eq!(merged.walk, None);
    }

    #[test]
    fn redaction_hides_password() {
        let redacted = cli().redacted();
        assert_eq!(redacted.password.as_deref(), Some("********"));
        assert_eq!(PartialConfig::default().redacted().password, None);
    }

    #[test]
    fn rendered_record_lists_plugins() {
        let merged = PartialConfig {
            exclude_plugins: Some("logger,web".into()),
            ..cli()
        };
        let line = render(&merged, &split_plugins("logger,web")).unwrap();
        assert!(line.contains(r#""exclude_plugins":["logger","web"]"#), "{line}");
        assert!(line.contains(r#""password":"********""#), "{line}");
        assert!(!line.contains("pikachu"), "{line}");

        let line = render(&PartialConfig::defaults(), &split_plugins("")).unwrap();
        assert!(line.contains(r#""exclude_plugins":[""]"#), "{line}");
    }

    #[test]
    fn defaults_come_from_the_defaults_layer() {
        let defaults = PartialConfig::defaults();
        let config = resolve(cli(), None, &mut NoPrompt).unwrap();
        assert_eq!(Some(config.mode), defaults.mode);
        assert_eq!(Some(config.walk), defaults.walk);
        assert_eq!(Some(config.cp), defaults.cp);
        assert_eq!(Some(config.max_steps), defaults.max_steps);
        assert_eq!(Some(config.distance_unit), defaults.distance_unit);
        assert_eq!(Some(config.item_filter), defaults.item_filter);
        assert_eq!(Some(config.google_directions), defaults.google_directions);
    }

    #[test]
    fn negative_thresholds_are_accepted() {
        let file = json_file(r#"{"cp": -1, "max_steps": -5}"#);
        let config = resolve(cli(), Some(file.path()), &mut NoPrompt).unwrap();
        assert_eq!(config.cp, -1);
        assert_eq!(config.max_steps, -5);
    }

    #[test]
    fn config_serialization_skips_password() {
        let config = resolve(cli(), None, &mut NoPrompt).unwrap();
        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["auth_service"], "ptc");
        assert_eq!(json["mode"], "all");
    }
}
