use anyhow::{Context, Result};
use hmac_gate::{GateOptions, Secret};
use http::HeaderName;

use crate::raw::{Config, ConfigFile, ConfigVersion, Route};

#[derive(Debug, Clone)]
pub struct RouteInternal {
    pub path: String,
    pub secret: Secret,
    pub options: GateOptions,
}

impl RouteInternal {
    fn from_route(value: Route) -> Result<RouteInternal> {
        let mut options = GateOptions::for_validator(value.algorithm);

        if let Some(header) = value.header {
            let header = HeaderName::from_bytes(header.as_bytes())
                .with_context(|| format!("Invalid header name: {:?}", header))?;

            options = options.with_header(header);
        }

        Ok(RouteInternal {
            path: value.path,
            secret: Secret::from(value.secret),
            options,
        })
    }
}

/// The config file with every variable resolved, ready to build the server from.
#[derive(Debug, Clone)]
pub struct ConfigFileInternal {
    pub version: ConfigVersion,
    pub config: Config,
    pub route: RouteInternal,
}

impl ConfigFileInternal {
    pub fn from_config(mut value: ConfigFile) -> Result<ConfigFileInternal> {
        value
            .populate_env_variables()
            .context("Could not replace the variables of the config file")?;

        Ok(ConfigFileInternal {
            version: value.version,
            config: value.config,
            route: RouteInternal::from_route(value.route)?,
        })
    }
}
