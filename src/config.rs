use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::clone::Clone;
use validator::{Validate, ValidationError};
use validator_derive::Validate;

lazy_static! {
    static ref RE_ADDRESS: Regex = Regex::new(r"^[0-9A-Za-z.\-]+$").unwrap();
}

#[derive(Debug, Deserialize, Validate, Clone)]
#[validate(schema(function = "validate_credentials"))]
pub(crate) struct Config {
    #[validate(regex(
        path = "RE_ADDRESS",
        message = "Invalid server address",
        code = "address"
    ))]
    #[serde(default = "default_address")]
    pub(crate) address: String,

    #[validate(range(min = 1, max = 65535, message = "Invalid port", code = "port"))]
    #[serde(default = "default_port")]
    pub(crate) port: u16,

    pub(crate) username: Option<String>,
    pub(crate) password: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            address: default_address(),
            port: default_port(),
            username: None,
            password: None,
        }
    }
}

fn default_address() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8111
}

fn validate_credentials(config: &Config) -> Result<(), ValidationError> {
    match (&config.username, &config.password) {
        (Some(_), None) | (None, Some(_)) => Err(ValidationError::new(
            "username and password must be given together",
        )),
        _ => Ok(()),
    }
}

#[test]
fn test_defaults() {
    let config: Config = toml::from_str("").unwrap();
    config.validate().unwrap();
    assert_eq!(config.address, "localhost");
    assert_eq!(config.port, 8111);
    assert_eq!(config.username, None);
}

#[test]
fn test_half_credentials_fail_validation() {
    let config: Config = toml::from_str(r#"username = "admin""#).unwrap();
    assert!(config.validate().is_err());
}
