use std::fs;
use std::path::Path;

use failure::{Error, ResultExt};
use serde_derive::{Deserialize, Serialize};

use crate::bitbucket::DEFAULT_API_ROOT;

/// The tool's configuration, usually loaded from `~/.bucket-backup.toml`.
///
/// Everything is optional; command line flags take precedence over the
/// file, and a missing file just means the defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: General,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct General {
    /// The Bitbucket username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// An app password for the account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_password: Option<String>,
    /// The root of the REST API to talk to.
    #[serde(default = "default_api_root")]
    pub api_root: String,
}

impl Default for General {
    fn default() -> General {
        General {
            username: None,
            app_password: None,
            api_root: default_api_root(),
        }
    }
}

fn default_api_root() -> String {
    DEFAULT_API_ROOT.to_string()
}

impl Config {
    /// Load the config from a TOML file.
    pub fn from_file<P: AsRef<Path>>(filename: P) -> Result<Config, Error> {
        let src =
            fs::read_to_string(filename.as_ref()).context("Unable to read the config file")?;
        let cfg = toml::from_str(&src).context("The config file isn't valid TOML")?;

        Ok(cfg)
    }

    /// A filled-in example, as printed by `--example-config`.
    pub fn example() -> Config {
        Config {
            general: General {
                username: Some(String::from("michael")),
                app_password: Some(String::from("an app password")),
                api_root: default_api_root(),
            },
        }
    }

    pub fn as_toml(&self) -> Result<String, Error> {
        toml::to_string_pretty(self)
            .context("Unable to serialize the config")
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_a_minimal_config() {
        let src = r#"
            [general]
            username = "michael"
            app_password = "hunter2"
        "#;

        let got: Config = toml::from_str(src).unwrap();

        assert_eq!(got.general.username.as_deref(), Some("michael"));
        assert_eq!(got.general.app_password.as_deref(), Some("hunter2"));
        assert_eq!(got.general.api_root, "https://api.bitbucket.org/2.0");
    }

    #[test]
    fn an_empty_file_gives_the_defaults() {
        let got: Config = toml::from_str("").unwrap();

        assert_eq!(got, Config::default());
    }

    #[test]
    fn the_example_config_round_trips() {
        let example = Config::example();

        let parsed: Config = toml::from_str(&example.as_toml().unwrap()).unwrap();

        assert_eq!(parsed, example);
    }
}
