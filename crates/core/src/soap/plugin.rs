//! Hooks run around a call: once on the envelope after it is built but
//! before it goes on the wire, and once on the raw reply bytes.

use super::envelope::Envelope;
use crate::nbfx::model::Record;
use crate::nbfx::{de, xml};
use err_derive::Error;

/// The namespace the service expects on the body's operation element.
pub const TARGET_NS: &str = "http://tempuri.org/";

/// Raised when a reply cannot be turned into text.
#[derive(Debug, Error)]
pub enum Error {
    /// The reply bytes are not a well formed record stream.
    #[error(display = "Reply decoding error")]
    Decode(#[error(source)] de::Error),
    /// The records do not describe a well formed document.
    #[error(display = "Reply rendering error")]
    Render(#[error(source)] xml::Error),
}

/// Message hooks.  The default `marshalled` leaves the envelope alone.
pub trait MessagePlugin {
    /// Runs after the envelope is built, before it is serialized.
    fn marshalled(&self, _envelope: &mut Envelope) {}

    /// Turns the raw reply bytes into the text handed to the caller.
    fn received(&self, reply: &[u8]) -> Result<String, Error>;
}

/// Adapts messages for the binary endpoint: stamps the service namespace on
/// the body's operation element, and renders binary replies as a textual
/// dump.  Callers get a printable string, not a typed response.
#[derive(Debug, Default)]
pub struct BinaryMessagePlugin;

impl MessagePlugin for BinaryMessagePlugin {
    fn marshalled(&self, envelope: &mut Envelope) {
        envelope.set_body_namespace(TARGET_NS);
    }

    fn received(&self, reply: &[u8]) -> Result<String, Error> {
        let records = Record::parse_document(reply)?;
        Ok(xml::records_to_xml(&records)?)
    }
}

#[cfg(test)]
use super::envelope::EnvelopeNs;
#[cfg(test)]
use assert_matches::assert_matches;

#[test]
fn test_marshalled_sets_the_body_namespace() {
    let plugin = BinaryMessagePlugin;
    let mut envelope = Envelope::new(EnvelopeNs::default(), "RescanUnlinkedFiles");
    assert_eq!(envelope.body_namespace(), None);

    plugin.marshalled(&mut envelope);
    assert_eq!(envelope.body_namespace(), Some(TARGET_NS));
}

#[test]
fn test_received_is_deterministic() {
    // <s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"/>
    let reply = [0x56, 0x02, 0x0B, 0x01, 0x73, 0x04, 0x01];

    let plugin = BinaryMessagePlugin;
    let first = plugin.received(&reply).unwrap();
    let second = plugin.received(&reply).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first,
        "<s:Envelope xmlns:s=\"http://www.w3.org/2003/05/soap-envelope\"/>"
    );
}

#[test]
fn test_received_rejects_garbage() {
    let plugin = BinaryMessagePlugin;
    assert_matches!(plugin.received(&[0xFF, 0x00]), Err(Error::Decode(_)));
}
