//! WSDL introspection.  The service publishes its description at a fixed
//! `?singleWsdl` location; the operation names found there form the registry
//! calls are validated against.

use err_derive::Error;
use log::debug;
use std::collections::HashSet;
use xml::reader::{EventReader, XmlEvent};

/// Path of the binary SOAP endpoint on the server.
pub const SERVICE_PATH: &str = "ServiceBinary";

/// Raised when the service description cannot be used.
#[derive(Debug, Error)]
pub enum Error {
    /// The document is not well formed XML.
    #[error(display = "WSDL parsing error")]
    Xml(#[error(source)] xml::reader::Error),
    /// The document is XML but advertises no operations at all.
    #[error(display = "The WSDL advertises no operations")]
    NoOperations,
}

/// Where the service publishes its WSDL.
pub fn wsdl_url(address: &str, port: u16) -> String {
    format!("http://{}:{}/{}?singleWsdl", address, port, SERVICE_PATH)
}

/// The service endpoint calls are POSTed to.
pub fn service_url(address: &str, port: u16) -> String {
    format!("http://{}:{}/{}", address, port, SERVICE_PATH)
}

/// Collects the operation names a WSDL document advertises.  Port type and
/// binding sections repeat the names; the set folds them together.
pub fn parse_operations(wsdl: &str) -> Result<HashSet<String>, Error> {
    let reader = EventReader::new(wsdl.as_bytes());

    let mut operations = HashSet::new();
    for event in reader {
        if let XmlEvent::StartElement {
            name, attributes, ..
        } = event?
        {
            if name.local_name == "operation" {
                if let Some(attr) = attributes.iter().find(|a| a.name.local_name == "name") {
                    operations.insert(attr.value.clone());
                }
            }
        }
    }

    if operations.is_empty() {
        return Err(Error::NoOperations);
    }
    debug!("Service advertises {} operations", operations.len());
    Ok(operations)
}

#[cfg(test)]
use assert_matches::assert_matches;
#[cfg(test)]
use indoc::indoc;

#[test]
fn test_urls() {
    assert_eq!(
        wsdl_url("localhost", 8111),
        "http://localhost:8111/ServiceBinary?singleWsdl"
    );
    assert_eq!(
        service_url("10.0.0.5", 9000),
        "http://10.0.0.5:9000/ServiceBinary"
    );
}

#[test]
fn test_parse_operations() {
    let sample = indoc! {r#"
        <wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
                          targetNamespace="http://tempuri.org/">
          <wsdl:portType name="IJMMServer">
            <wsdl:operation name="ScanDropFolders"/>
            <wsdl:operation name="GetServerStatus"/>
          </wsdl:portType>
          <wsdl:binding name="BinaryBinding" type="tns:IJMMServer">
            <wsdl:operation name="ScanDropFolders"/>
            <wsdl:operation name="GetServerStatus"/>
          </wsdl:binding>
        </wsdl:definitions>"#};

    let operations = parse_operations(sample).unwrap();
    assert_eq!(operations.len(), 2);
    assert!(operations.contains("ScanDropFolders"));
    assert!(operations.contains("GetServerStatus"));
}

#[test]
fn test_empty_wsdl() {
    let sample = r#"<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"/>"#;

    assert_matches!(parse_operations(sample), Err(Error::NoOperations));
}
