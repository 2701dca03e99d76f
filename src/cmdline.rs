use clap::{crate_version, Parser};
use std::path::PathBuf;
use std::str::FromStr;

/// A remote trigger for JMM media servers
///
/// Jmmlink asks a running server to perform one of the maintenance actions
/// it advertises, such as scanning its drop folders for new files.
#[derive(Parser, Debug)]
#[command(name = "jmmlink", version = crate_version!())]
pub struct Opt {
    /// Path to a toml config file with the server address and credentials
    #[arg(short, long, value_parser = PathBuf::from_str)]
    pub config: Option<PathBuf>,
    /// Address of the server, overriding the config file
    pub address: Option<String>,
    /// Port of the server's binary SOAP endpoint, overriding the config file
    pub port: Option<u16>,
    /// Name of the service operation to invoke
    #[arg(short, long, default_value = "ScanDropFolders")]
    pub action: String,
    /// List the operations the server advertises instead of calling one
    #[arg(short, long)]
    pub list: bool,
}

#[test]
fn test_positional_override() {
    let opt = Opt::parse_from(["jmmlink", "10.0.0.5", "9000"]);
    assert_eq!(opt.address.as_deref(), Some("10.0.0.5"));
    assert_eq!(opt.port, Some(9000));
    assert_eq!(opt.action, "ScanDropFolders");
}

#[test]
fn test_defaults() {
    let opt = Opt::parse_from(["jmmlink"]);
    assert_eq!(opt.address, None);
    assert_eq!(opt.port, None);
    assert!(!opt.list);
}

#[test]
fn test_action_selection() {
    let opt = Opt::parse_from(["jmmlink", "--action", "GetServerStatus"]);
    assert_eq!(opt.action, "GetServerStatus");
}
