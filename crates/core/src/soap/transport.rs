//! The HTTP transport bound to the binary SOAP protocol variant.  There is
//! no negotiation: every request body is transcoded to the binary encoding
//! and credentials are attached up front on every request.

use super::credentials::Credentials;
use crate::nbfx::{ser, xml};
use err_derive::Error;
use log::{debug, trace};
use reqwest::blocking::{Client, Request, RequestBuilder};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

/// Media type of the compact binary SOAP encoding.
pub const BINARY_CONTENT_TYPE: &str = "application/soap+msbin1";

/// Raised when a request cannot be built or carried out.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP layer failed; connection errors, timeouts and error statuses
    /// all land here.
    #[error(display = "HTTP error")]
    Http(#[error(source)] reqwest::Error),
    /// The outgoing envelope could not be parsed into records.
    #[error(display = "Envelope encoding error")]
    Encode(#[error(source)] xml::Error),
    /// The records could not be written in their binary form.
    #[error(display = "Envelope serialization error")]
    Serialize(#[error(source)] ser::Error),
}

/// An HTTP transport that speaks the binary protocol variant.
pub struct BinaryTransport {
    http: Client,
    credentials: Credentials,
}

impl BinaryTransport {
    /// A transport using the given credentials on every request.
    pub fn new(credentials: Credentials) -> Result<Self, Error> {
        Ok(BinaryTransport {
            http: Client::builder().build()?,
            credentials,
        })
    }

    /// Plain GET with credentials attached; used for the WSDL fetch.
    pub fn open(&self, url: &str) -> Result<String, Error> {
        debug!("GET {}", url);
        let request = self.add_credentials(self.http.get(url));
        Ok(request.send()?.error_for_status()?.text()?)
    }

    /// Encodes the textual envelope and POSTs it, returning the raw reply
    /// bytes.  The body is transcoded exactly once, and the content type is
    /// forced to the binary media type whatever the caller set.
    pub fn send(&self, url: &str, envelope_xml: &str) -> Result<Vec<u8>, Error> {
        let request = self.binary_request(url, envelope_xml)?;
        debug!(
            "POST {} ({} bytes)",
            url,
            request
                .body()
                .and_then(|body| body.as_bytes())
                .map(|bytes| bytes.len())
                .unwrap_or(0)
        );

        let reply = self.http.execute(request)?.error_for_status()?.bytes()?;
        trace!("Reply carried {} bytes", reply.len());
        Ok(reply.to_vec())
    }

    fn binary_request(&self, url: &str, envelope_xml: &str) -> Result<Request, Error> {
        let records = xml::xml_to_records(envelope_xml)?;
        let body = ser::dump_records(&records, Vec::new())?;

        let request = self
            .add_credentials(self.http.post(url))
            .header(CONTENT_TYPE, BINARY_CONTENT_TYPE)
            .body(body);
        Ok(request.build()?)
    }

    fn add_credentials(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.authorization() {
            Some(value) => request.header(AUTHORIZATION, value),
            None => request,
        }
    }
}

#[test]
fn test_binary_request() {
    let transport = BinaryTransport::new(Credentials::new(Some("user"), Some("pass"))).unwrap();
    let request = transport
        .binary_request(
            "http://localhost:8111/ServiceBinary",
            "<s:Envelope xmlns:s=\"http://www.w3.org/2003/05/soap-envelope\"/>",
        )
        .unwrap();

    assert_eq!(
        request.headers().get(CONTENT_TYPE).unwrap(),
        BINARY_CONTENT_TYPE
    );
    assert_eq!(
        request.headers().get(AUTHORIZATION).unwrap(),
        "Basic dXNlcjpwYXNz"
    );
    let body = request.body().unwrap().as_bytes().unwrap();
    assert_eq!(body, [0x56, 0x02, 0x0B, 0x01, 0x73, 0x04, 0x01]);
}

#[test]
fn test_anonymous_request_has_no_authorization() {
    let transport = BinaryTransport::new(Credentials::Anonymous).unwrap();
    let request = transport
        .binary_request(
            "http://localhost:8111/ServiceBinary",
            "<s:Envelope xmlns:s=\"http://www.w3.org/2003/05/soap-envelope\"/>",
        )
        .unwrap();

    assert!(request.headers().get(AUTHORIZATION).is_none());
    assert_eq!(
        request.headers().get(CONTENT_TYPE).unwrap(),
        BINARY_CONTENT_TYPE
    );
}
