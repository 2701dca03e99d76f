#![warn(missing_docs)]
//!
//! # Jmmlink
//!
//! Jmmlink is a small program that triggers maintenance actions on a JMM
//! media server over its binary SOAP endpoint.
//!
//! By default it asks the server to scan its drop folders for new files;
//! any other operation the server advertises can be selected by name.
//!
use anyhow::{Context, Result};
use clap::Parser;
use log::*;
use std::fs;
use validator::Validate;

mod cmdline;
mod config;
mod utils;

use cmdline::Opt;
use config::Config;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!(
        "Jmmlink {} {}",
        env!("JMMLINK_VERSION"),
        env!("JMMLINK_PROFILE")
    );

    let opt = Opt::parse();

    let config: Config = match &opt.config {
        Some(path) => toml::from_str(
            &fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?,
        )
        .with_context(|| format!("Failed to parse the {:?} config file", path))?,
        None => Config::default(),
    };
    config
        .validate()
        .context("Failed to validate the config")?;

    let server = utils::connect(&config, opt.address.as_deref(), opt.port)?;

    if opt.list {
        let mut operations: Vec<&str> = server.operations().collect();
        operations.sort_unstable();
        for operation in operations {
            println!("{}", operation);
        }
        return Ok(());
    }

    let reply = server
        .call(&opt.action)
        .with_context(|| format!("Failed to invoke {}", opt.action))?;
    println!("{}", reply);

    Ok(())
}
