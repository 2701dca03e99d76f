//! The compact binary XML format the service speaks on the wire (the
//! `application/soap+msbin1` media type).  A document is a flat sequence of
//! typed records: element starts, attributes, namespace declarations, typed
//! text values and end-element markers.  Names and common strings are
//! compressed through a static dictionary shared by both peers; everything
//! else is length-prefixed inline, with lengths and dictionary references
//! carried as 7-bit little-endian variable length integers.
//!
//! The split follows the rest of the wire code: [`model`] holds the record
//! structures, [`de`] parses bytes into records, [`ser`] writes records back
//! out choosing the most compact wire form, and [`xml`] bridges records to
//! and from text XML.

pub mod model;

pub mod de;
pub mod ser;
pub mod xml;

pub mod dictionary;
