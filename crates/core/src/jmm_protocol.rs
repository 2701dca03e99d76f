//! High level client for the server's binary SOAP endpoint.

use crate::soap::credentials::Credentials;
use crate::soap::envelope::{Envelope, EnvelopeNs, SoapHeader, ANONYMOUS_ADDRESS};
use crate::soap::plugin::{self, BinaryMessagePlugin, MessagePlugin, TARGET_NS};
use crate::soap::transport::{self, BinaryTransport};
use crate::soap::wsdl;
use err_derive::Error;
use log::{debug, info};
use std::collections::HashSet;

/// Contract name of the service; operation Action URIs hang off it.
pub const SERVICE_CONTRACT: &str = "IJMMServer";

type Result<T> = std::result::Result<T, Error>;

/// This is the primary error type of the library
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when the HTTP layer or the wire transcoding fails
    #[error(display = "Transport error")]
    Transport(#[error(source)] transport::Error),

    /// Raised when a reply cannot be decoded into text
    #[error(display = "Reply processing error")]
    Plugin(#[error(source)] plugin::Error),

    /// Raised when the service description cannot be fetched or used
    #[error(display = "WSDL error")]
    Wsdl(#[error(source)] wsdl::Error),

    /// Raised when a call names an operation the server does not advertise
    #[error(display = "Unknown operation {:?}", operation)]
    UnknownOperation {
        /// The name that was requested
        operation: String,
    },
}

/// A connected JMM server.
///
/// Connecting fetches the service description once and derives the set of
/// callable operations from it; calls by name are validated against that set
/// before anything is put on the wire.
pub struct JmmServer {
    service_url: String,
    envns: EnvelopeNs,
    transport: BinaryTransport,
    plugin: BinaryMessagePlugin,
    operations: HashSet<String>,
}

impl JmmServer {
    /// Connects to the binary endpoint at `address:port`.
    pub fn connect(address: &str, port: u16, credentials: Credentials) -> Result<Self> {
        let transport = BinaryTransport::new(credentials)?;

        let wsdl_url = wsdl::wsdl_url(address, port);
        debug!("Fetching service description from {}", wsdl_url);
        let wsdl_text = transport.open(&wsdl_url)?;
        let operations = wsdl::parse_operations(&wsdl_text)?;

        Ok(JmmServer {
            service_url: wsdl::service_url(address, port),
            envns: EnvelopeNs::default(),
            transport,
            plugin: BinaryMessagePlugin,
            operations,
        })
    }

    /// The operations the server advertises, in no particular order.
    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.operations.iter().map(String::as_str)
    }

    /// Invokes the named empty-bodied operation and returns the reply as
    /// text.
    pub fn call(&self, operation: &str) -> Result<String> {
        if !self.operations.contains(operation) {
            return Err(Error::UnknownOperation {
                operation: operation.to_string(),
            });
        }

        let mut envelope = Envelope::new(self.envns.clone(), operation);
        envelope.push_header(SoapHeader::Action {
            uri: action_uri(operation),
            must_understand: true,
        });
        envelope.push_header(SoapHeader::ReplyTo {
            address: ANONYMOUS_ADDRESS.to_string(),
        });
        envelope.push_header(SoapHeader::To {
            uri: self.service_url.clone(),
            must_understand: true,
        });
        self.plugin.marshalled(&mut envelope);

        info!("Calling {}", operation);
        let reply = self.transport.send(&self.service_url, &envelope.to_xml())?;
        Ok(self.plugin.received(&reply)?)
    }

    /// Asks the server to scan its drop folders for new files.
    pub fn scan_drop_folders(&self) -> Result<String> {
        self.call("ScanDropFolders")
    }

    /// Asks the server for its status dump.
    pub fn get_server_status(&self) -> Result<String> {
        self.call("GetServerStatus")
    }

    /// Asks the server to rescan files it could not link.
    pub fn rescan_unlinked_files(&self) -> Result<String> {
        self.call("RescanUnlinkedFiles")
    }
}

/// The WS-Addressing Action URI of an operation.
pub fn action_uri(operation: &str) -> String {
    format!("{}{}/{}", TARGET_NS, SERVICE_CONTRACT, operation)
}

#[test]
fn test_action_uri() {
    assert_eq!(
        action_uri("ScanDropFolders"),
        "http://tempuri.org/IJMMServer/ScanDropFolders"
    );
}
