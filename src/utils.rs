//! Contains glue that is not specific to the command line or the config
//! file.
use anyhow::{Context, Result};
use jmmlink_core::{Credentials, JmmServer};
use log::*;

use super::config::Config;

/// Connects to the server, letting command line overrides win over the
/// config file.
pub(crate) fn connect(
    config: &Config,
    address: Option<&str>,
    port: Option<u16>,
) -> Result<JmmServer> {
    let address = address.unwrap_or(&config.address);
    let port = port.unwrap_or(config.port);

    let credentials = Credentials::new(config.username.as_deref(), config.password.as_deref());
    if let Credentials::Anonymous = credentials {
        debug!("No credentials configured, calling anonymously");
    }

    info!("Connecting to {}:{}", address, port);
    JmmServer::connect(address, port, credentials)
        .with_context(|| format!("Failed to connect to the server at {}:{}", address, port))
}
