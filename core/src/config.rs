//! Handles the configuration of ornitag.
//!
//! this module is responsible for parsing the Ornitag.toml file and merging it with environment
//! variables and cli arguments into the explicit [`RunOptions`] handed to each step of a run.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

pub static DEFAULT_CONFIG: &str = include_str!("../Ornitag.toml");

#[derive(Clone, Debug, Deserialize, Default, PartialEq, Eq)]
pub struct Settings {
    /// How photos are found, resolved and uploaded
    #[serde(default)]
    pub upload: UploadSettings,
    /// Where the photo service lives and how to authenticate with it
    #[serde(default)]
    pub service: ServiceSettings,
}

impl Settings {
    /// Load settings from the config file, environment variables, and CLI arguments.
    ///
    /// The environment variables are prefixed with `ORNITAG_`,
    /// and sections are separated with `__`, e.g. `ORNITAG_SERVICE__BASE_URL`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the config file is not found or if the config file is
    /// invalid.
    #[inline]
    pub fn init(
        config: PathBuf,
        token_file: Option<PathBuf>,
        log_level: Option<log::LevelFilter>,
    ) -> Result<Self, ConfigError> {
        Self::init_with_env(config, environment(), token_file, log_level)
    }

    fn init_with_env(
        config: PathBuf,
        environment: Environment,
        token_file: Option<PathBuf>,
        log_level: Option<log::LevelFilter>,
    ) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::from(config))
            .add_source(environment)
            .build()?;

        let mut settings: Self = s.try_deserialize()?;

        if let Some(token_file) = token_file {
            settings.service.token_file = token_file;
        }
        settings.service.token_file = expand_tilde(&settings.service.token_file);
        settings.upload.spreadsheet = expand_tilde(&settings.upload.spreadsheet);

        if let Some(log_level) = log_level {
            settings.upload.log_level = log_level;
        }

        Ok(settings)
    }

    /// Get the (default) path to the config file.
    /// If the config file does not exist at this path, it will be created with the default config.
    ///
    /// See [`crate::get_config_dir`] for more information about where this default path is located.
    ///
    /// # Errors
    ///
    /// This function will return an error if the system config directory (e.g., `~/.config` on linux) could not be found, or if the config file was missing and could not be created.
    #[inline]
    pub fn get_config_path() -> Result<PathBuf, std::io::Error> {
        match crate::get_config_dir() {
            Ok(config_dir) => {
                // if the config directory does not exist, create it
                if !config_dir.exists() {
                    std::fs::create_dir_all(&config_dir)?;
                }
                let config_file = config_dir.join("Ornitag.toml");

                if !config_file.exists() {
                    std::fs::write(&config_file, DEFAULT_CONFIG)?;
                }

                Ok(config_file)
            }
            Err(e) => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                e.to_string(),
            )),
        }
    }

    /// The spreadsheet to read for a run over `photo_dir`.
    ///
    /// A relative `upload.spreadsheet` is taken to live inside the photo directory.
    #[must_use]
    #[inline]
    pub fn spreadsheet_path(&self, photo_dir: &Path) -> PathBuf {
        if self.upload.spreadsheet.is_absolute() {
            self.upload.spreadsheet.clone()
        } else {
            photo_dir.join(&self.upload.spreadsheet)
        }
    }

    /// Build the options for a single run.
    ///
    /// `swap_roles` can only turn the swapped convention on, never off.
    #[must_use]
    #[inline]
    pub fn run_options(&self, dry_run: bool, swap_roles: bool) -> RunOptions {
        RunOptions {
            roles_swapped: swap_roles || self.upload.swap_roles,
            dry_run,
            max_concurrent_uploads: self.upload.max_concurrent_uploads.max(1),
        }
    }
}

/// `ORNITAG_<SECTION>__<KEY>`, e.g. `ORNITAG_UPLOAD__SWAP_ROLES`.
fn environment() -> Environment {
    Environment::with_prefix("ORNITAG")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// The knobs a single run is executed with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunOptions {
    /// `true` when photos live in `<tag code>/<bird code>/`, rather than `<bird code>/<tag code>/`
    pub roles_swapped: bool,
    /// Skip every call that changes something on the photo service
    pub dry_run: bool,
    /// How many file transfers may be in flight at once, at least 1
    pub max_concurrent_uploads: usize,
}

impl Default for RunOptions {
    #[inline]
    fn default() -> Self {
        Self {
            roles_swapped: false,
            dry_run: false,
            max_concurrent_uploads: default_max_concurrent_uploads(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct UploadSettings {
    /// The metadata spreadsheet, relative to the photo directory unless absolute.
    /// Default is "birds.xlsx".
    #[serde(default = "default_spreadsheet")]
    pub spreadsheet: PathBuf,
    /// Whether the directory layout is `<tag code>/<bird code>/` instead of
    /// `<bird code>/<tag code>/`.
    #[serde(default)]
    pub swap_roles: bool,
    /// How many file transfers may run at once.
    /// Album creation and insertion always happen one photo at a time regardless.
    /// Default is 1.
    #[serde(default = "default_max_concurrent_uploads")]
    pub max_concurrent_uploads: usize,
    /// What level of logging to use.
    /// Default is "info".
    #[serde(default = "default_log_level")]
    #[serde(deserialize_with = "de_log_level")]
    pub log_level: log::LevelFilter,
}

fn de_log_level<'de, D>(deserializer: D) -> Result<log::LevelFilter, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(log::LevelFilter::from_str(&s).unwrap_or_else(|_| default_log_level()))
}

fn expand_tilde(path: &Path) -> PathBuf {
    shellexpand::tilde(&path.to_string_lossy())
        .into_owned()
        .into()
}

fn default_spreadsheet() -> PathBuf {
    PathBuf::from("birds.xlsx")
}

const fn default_max_concurrent_uploads() -> usize {
    1
}

const fn default_log_level() -> log::LevelFilter {
    log::LevelFilter::Info
}

impl Default for UploadSettings {
    #[inline]
    fn default() -> Self {
        Self {
            spreadsheet: default_spreadsheet(),
            swap_roles: false,
            max_concurrent_uploads: default_max_concurrent_uploads(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Base URL of the photo service's REST API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// File containing the bearer token for the photo service.
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
    /// Per-request timeout in seconds.
    /// Default is 60.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_token_file() -> PathBuf {
    expand_tilde(Path::new("~/.config/ornitag/token"))
}

const fn default_timeout_secs() -> u64 {
    60
}

impl Default for ServiceSettings {
    #[inline]
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_file: default_token_file(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[derive(Debug, PartialEq, Eq, Deserialize)]
    #[serde(transparent)]
    struct LogLevelTest {
        #[serde(deserialize_with = "de_log_level")]
        log_level: log::LevelFilter,
    }

    #[rstest]
    #[case("debug", log::LevelFilter::Debug)]
    #[case("TRACE", log::LevelFilter::Trace)]
    #[case("off", log::LevelFilter::Off)]
    #[case("nonsense", log::LevelFilter::Info)]
    fn test_de_log_level(#[case] input: &str, #[case] expected: log::LevelFilter) {
        let parsed: LogLevelTest = serde_json::from_value(serde_json::json!(input)).unwrap();
        assert_eq!(parsed.log_level, expected);
    }

    #[test]
    fn test_init_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[upload]
spreadsheet = "/data/birds.ods"
swap_roles = true
max_concurrent_uploads = 4
log_level = "debug"

[service]
base_url = "https://photos.example.com/api"
token_file = "/secrets/token"
timeout_secs = 5
            "#,
        )
        .unwrap();

        let expected = Settings {
            upload: UploadSettings {
                spreadsheet: "/data/birds.ods".into(),
                swap_roles: true,
                max_concurrent_uploads: 4,
                log_level: log::LevelFilter::Debug,
            },
            service: ServiceSettings {
                base_url: "https://photos.example.com/api".into(),
                token_file: "/secrets/token".into(),
                timeout_secs: 5,
            },
        };

        let settings = Settings::init(config_path, None, None).unwrap();

        assert_eq!(settings, expected);
    }

    #[test]
    fn test_flags_override_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[upload]
log_level = "warn"

[service]
token_file = "/secrets/token"
            "#,
        )
        .unwrap();

        let settings = Settings::init(
            config_path,
            Some("/other/token".into()),
            Some(log::LevelFilter::Trace),
        )
        .unwrap();

        assert_eq!(settings.service.token_file, PathBuf::from("/other/token"));
        assert_eq!(settings.upload.log_level, log::LevelFilter::Trace);
        assert_eq!(settings.upload.spreadsheet, PathBuf::from("birds.xlsx"));
    }

    #[rstest]
    #[case("ORNITAG_SERVICE__BASE_URL", "https://env.example.com/api")]
    #[case("ORNITAG_UPLOAD__SPREADSHEET", "/env/birds.ods")]
    fn test_env_overrides_config(#[case] key: &str, #[case] value: &str) {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, DEFAULT_CONFIG).unwrap();
        let env = config::Map::from([(key.to_string(), value.to_string())]);

        let settings =
            Settings::init_with_env(config_path, environment().source(Some(env)), None, None)
                .unwrap();

        let actual = if key.contains("SERVICE") {
            settings.service.base_url
        } else {
            settings.upload.spreadsheet.display().to_string()
        };
        assert_eq!(actual, value);
    }

    #[test]
    fn test_env_parses_values() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, DEFAULT_CONFIG).unwrap();
        let env = config::Map::from([
            ("ORNITAG_UPLOAD__SWAP_ROLES".to_string(), "true".to_string()),
            (
                "ORNITAG_UPLOAD__MAX_CONCURRENT_UPLOADS".to_string(),
                "3".to_string(),
            ),
        ]);

        let settings =
            Settings::init_with_env(config_path, environment().source(Some(env)), None, None)
                .unwrap();

        assert!(settings.upload.swap_roles);
        assert_eq!(settings.upload.max_concurrent_uploads, 3);
    }

    #[test]
    fn test_default_config_works() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, DEFAULT_CONFIG).unwrap();

        let settings = Settings::init(config_path, None, None);

        assert!(settings.is_ok(), "Error: {:?}", settings.err());
        let settings = settings.unwrap();
        assert_eq!(settings.upload, UploadSettings::default());
        assert_eq!(settings.service, ServiceSettings::default());
    }

    #[rstest]
    #[case("birds.xlsx", "/photos/birds.xlsx")]
    #[case("meta/birds.ods", "/photos/meta/birds.ods")]
    #[case("/elsewhere/birds.xlsx", "/elsewhere/birds.xlsx")]
    fn test_spreadsheet_path(#[case] spreadsheet: &str, #[case] expected: &str) {
        let settings = Settings {
            upload: UploadSettings {
                spreadsheet: spreadsheet.into(),
                ..Default::default()
            },
            ..Default::default()
        };

        assert_eq!(
            settings.spreadsheet_path(Path::new("/photos")),
            PathBuf::from(expected)
        );
    }

    #[rstest]
    #[case(false, false, false)]
    #[case(true, false, true)]
    #[case(false, true, true)]
    #[case(true, true, true)]
    fn test_run_options_swap(
        #[case] configured: bool,
        #[case] flag: bool,
        #[case] expected: bool,
    ) {
        let mut settings = Settings::default();
        settings.upload.swap_roles = configured;
        settings.upload.max_concurrent_uploads = 0;

        let options = settings.run_options(true, flag);

        assert_eq!(options.roles_swapped, expected);
        assert!(options.dry_run);
        assert_eq!(options.max_concurrent_uploads, 1);
    }
}
