use std::fmt::{Debug, Display, Formatter};
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use hmac_gate::Validator;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DeserializeFromStr, DisplayFromStr, SerializeDisplay};
use tracing::level_filters::LevelFilter;

#[derive(Debug, PartialEq, Eq)]
enum Variable<'a> {
    Env(&'a str),
}

trait ReplaceVariables {
    const VARIABLE_PREFIX: &'static str = "${{";
    const VARIABLE_SUFFIX: &'static str = "}}";

    fn is_variable(value: &str) -> bool {
        value
            .trim()
            .strip_prefix(Self::VARIABLE_PREFIX)
            .and_then(|item| item.strip_suffix(Self::VARIABLE_SUFFIX))
            .is_some()
    }

    fn get_inner(value: &str) -> Result<Option<Variable<'_>>> {
        let Some(inner) = value
            .trim()
            .strip_prefix(Self::VARIABLE_PREFIX)
            .and_then(|item| item.strip_suffix(Self::VARIABLE_SUFFIX))
            .map(|item| item.trim())
        else {
            return Ok(None);
        };

        match inner.strip_prefix("env.") {
            Some(env_key) if !env_key.is_empty() => Ok(Some(Variable::Env(env_key))),
            _ => bail!("Unknown variable: {:?}", inner),
        }
    }

    fn resolve(value: &mut String) -> Result<()> {
        if let Some(variable) = Self::get_inner(value)? {
            let replace_with = match variable {
                Variable::Env(env_key) => std::env::var(env_key).with_context(|| {
                    format!(
                        "Could not find an environment variable with the name: '{:?}'",
                        env_key
                    )
                })?,
            };

            *value = replace_with;
        }

        Ok(())
    }

    fn replace(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, SerializeDisplay, DeserializeFromStr)]
pub enum ConfigVersion {
    V1_0Beta,
}

impl Display for ConfigVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigVersion::V1_0Beta => write!(f, "1.0-beta"),
        }
    }
}

impl FromStr for ConfigVersion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::prelude::v1::Result<Self, Self::Err> {
        match s {
            "1.0-beta" => Ok(ConfigVersion::V1_0Beta),
            _ => bail!("Unknown version: {}", s),
        }
    }
}

fn default_log_level() -> LevelFilter {
    LevelFilter::INFO
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub expose: u16,
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default = "default_log_level")]
    pub log_level: LevelFilter,
}

/// The one route protected by the gate.
#[serde_as]
#[derive(Clone, Serialize, Deserialize)]
pub struct Route {
    pub path: String,
    /// Usually a variable like `${{ env.WEBHOOK_SECRET }}`, a literal value works too.
    pub secret: String,
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default)]
    pub algorithm: Validator,
    /// Defaults to the GitHub header of `algorithm`.
    #[serde(default)]
    pub header: Option<String>,
}

impl Debug for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("secret", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .field("header", &self.header)
            .finish()
    }
}

impl ReplaceVariables for Route {
    fn replace(&mut self) -> Result<()> {
        if Self::is_variable(&self.path) {
            bail!("Variables aren't supported in the route path");
        }

        Self::resolve(&mut self.secret).context("route.secret")?;

        if let Some(header) = &mut self.header {
            Self::resolve(header).context("route.header")?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    pub version: ConfigVersion,
    pub config: Config,
    pub route: Route,
}

impl ConfigFile {
    pub fn parse(path: impl AsRef<Path>) -> Result<ConfigFile> {
        let path = path.as_ref();
        let config_file = std::fs::File::open(path)
            .with_context(|| format!("Could not open the config file {:?}", path))?;

        Self::parse_from_reader(config_file)
    }

    pub fn parse_from_reader<R: std::io::Read>(reader: R) -> Result<ConfigFile> {
        let config = serde_yaml::from_reader(reader)?;

        Ok(config)
    }

    /// Replaces every `${{ env.NAME }}` with the value of the environment variable `NAME`.
    pub fn populate_env_variables(&mut self) -> Result<()> {
        self.route.replace()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe;

    impl ReplaceVariables for Probe {
        fn replace(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn recognises_env_variables() {
        assert_eq!(
            Probe::get_inner("${{ env.WEBHOOK_SECRET }}").unwrap(),
            Some(Variable::Env("WEBHOOK_SECRET"))
        );
        assert_eq!(
            Probe::get_inner("${{env.WEBHOOK_SECRET}}").unwrap(),
            Some(Variable::Env("WEBHOOK_SECRET"))
        );
        assert_eq!(Probe::get_inner("plain value").unwrap(), None);
        assert!(Probe::get_inner("${{ secrets.GITHUB }}").is_err());
        assert!(Probe::get_inner("${{ env. }}").is_err());
    }

    #[test]
    fn resolves_from_the_environment() {
        std::env::set_var("CONFIG_PARSER_TEST_SECRET", "It's a Secret to Everybody");

        let mut value = "${{ env.CONFIG_PARSER_TEST_SECRET }}".to_string();
        Probe::resolve(&mut value).unwrap();

        assert_eq!(value, "It's a Secret to Everybody");
    }

    #[test]
    fn missing_environment_variable_is_an_error() {
        let mut value = "${{ env.CONFIG_PARSER_TEST_NOT_SET }}".to_string();

        assert!(Probe::resolve(&mut value).is_err());
    }

    #[test]
    fn optional_fields_have_defaults() {
        let config = ConfigFile::parse_from_reader(
            r#"
version: 1.0-beta
config:
  expose: 3000
route:
  path: /github
  secret: supersecret
"#
            .as_bytes(),
        )
        .unwrap();

        assert_eq!(config.version, ConfigVersion::V1_0Beta);
        assert_eq!(config.config.log_level, LevelFilter::INFO);
        assert_eq!(config.route.algorithm, Validator::Sha1);
        assert_eq!(config.route.header, None);
        assert!(!format!("{:?}", config).contains("supersecret"));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let result = ConfigFile::parse_from_reader(
            r#"
version: 2.0
config:
  expose: 3000
route:
  path: /github
  secret: supersecret
"#
            .as_bytes(),
        );

        assert!(result.is_err());
    }

    #[test]
    fn unknown_algorithm_is_rejected() {
        let result = ConfigFile::parse_from_reader(
            r#"
version: 1.0-beta
config:
  expose: 3000
route:
  path: /github
  secret: supersecret
  algorithm: md5
"#
            .as_bytes(),
        );

        assert!(result.is_err());
    }
}
