use super::model::*;
use crate::NomErrorType;
use err_derive::Error;
use nom::bytes::complete::take;
use nom::combinator::{map, map_res};
use nom::error::{context, VerboseErrorKind};
use nom::number::complete::{
    le_f32, le_f64, le_i16, le_i32, le_i64, le_i8, le_u16, le_u32, le_u64, le_u8,
};
use nom::IResult;

type NomResult<'a, O> = IResult<&'a [u8], O, NomErrorType<'a>>;

/// Raised when a record stream cannot be parsed.
#[derive(Debug, Error)]
pub enum Error {
    /// The stream is malformed; the message names the offending construct.
    #[error(display = "Parsing error: {}", _0)]
    NomError(String),
}

impl<'a> From<nom::Err<NomErrorType<'a>>> for Error {
    fn from(e: nom::Err<NomErrorType<'a>>) -> Self {
        let reason = match e {
            nom::Err::Incomplete(_) => "unexpected end of stream".to_string(),
            nom::Err::Error(e) | nom::Err::Failure(e) => e
                .errors
                .iter()
                .rev()
                .find_map(|(_, kind)| match kind {
                    VerboseErrorKind::Context(c) => Some((*c).to_string()),
                    _ => None,
                })
                .unwrap_or_else(|| "malformed record stream".to_string()),
        };
        Error::NomError(reason)
    }
}

impl Record {
    /// Parses a complete document.  Every byte of `buf` must belong to a
    /// record; trailing garbage is a parse error, not a partial success.
    pub fn parse_document(buf: &[u8]) -> Result<Vec<Record>, Error> {
        let mut records = Vec::new();
        let mut rest = buf;
        while !rest.is_empty() {
            let (next, rec) = record(rest)?;
            records.push(rec);
            rest = next;
        }
        Ok(records)
    }
}

fn record(buf: &[u8]) -> NomResult<'_, Record> {
    let (buf, rtype) = le_u8(buf)?;
    match rtype {
        END_ELEMENT => Ok((buf, Record::EndElement)),
        COMMENT => map(string, Record::Comment)(buf),
        ARRAY => context("array records are not supported", nom::combinator::fail)(buf),
        SHORT_ATTRIBUTE => {
            let (buf, name) = string(buf)?;
            let (buf, value) = attribute_value(buf)?;
            Ok((
                buf,
                Record::Attribute {
                    prefix: None,
                    name: Name::Str(name),
                    value,
                },
            ))
        }
        ATTRIBUTE => {
            let (buf, prefix) = string(buf)?;
            let (buf, name) = string(buf)?;
            let (buf, value) = attribute_value(buf)?;
            Ok((
                buf,
                Record::Attribute {
                    prefix: Some(prefix),
                    name: Name::Str(name),
                    value,
                },
            ))
        }
        SHORT_DICT_ATTRIBUTE => {
            let (buf, name) = dict_ref(buf)?;
            let (buf, value) = attribute_value(buf)?;
            Ok((
                buf,
                Record::Attribute {
                    prefix: None,
                    name: Name::Dict(name),
                    value,
                },
            ))
        }
        DICT_ATTRIBUTE => {
            let (buf, prefix) = string(buf)?;
            let (buf, name) = dict_ref(buf)?;
            let (buf, value) = attribute_value(buf)?;
            Ok((
                buf,
                Record::Attribute {
                    prefix: Some(prefix),
                    name: Name::Dict(name),
                    value,
                },
            ))
        }
        SHORT_XMLNS_ATTRIBUTE => {
            let (buf, uri) = string(buf)?;
            Ok((
                buf,
                Record::Xmlns {
                    prefix: None,
                    uri: Name::Str(uri),
                },
            ))
        }
        XMLNS_ATTRIBUTE => {
            let (buf, prefix) = string(buf)?;
            let (buf, uri) = string(buf)?;
            Ok((
                buf,
                Record::Xmlns {
                    prefix: Some(prefix),
                    uri: Name::Str(uri),
                },
            ))
        }
        SHORT_DICT_XMLNS_ATTRIBUTE => {
            let (buf, uri) = dict_ref(buf)?;
            Ok((
                buf,
                Record::Xmlns {
                    prefix: None,
                    uri: Name::Dict(uri),
                },
            ))
        }
        DICT_XMLNS_ATTRIBUTE => {
            let (buf, prefix) = string(buf)?;
            let (buf, uri) = dict_ref(buf)?;
            Ok((
                buf,
                Record::Xmlns {
                    prefix: Some(prefix),
                    uri: Name::Dict(uri),
                },
            ))
        }
        PREFIX_DICT_ATTRIBUTE_A..=PREFIX_DICT_ATTRIBUTE_Z => {
            let (buf, name) = dict_ref(buf)?;
            let (buf, value) = attribute_value(buf)?;
            Ok((
                buf,
                Record::Attribute {
                    prefix: Some(prefix_letter(rtype - PREFIX_DICT_ATTRIBUTE_A)),
                    name: Name::Dict(name),
                    value,
                },
            ))
        }
        PREFIX_ATTRIBUTE_A..=PREFIX_ATTRIBUTE_Z => {
            let (buf, name) = string(buf)?;
            let (buf, value) = attribute_value(buf)?;
            Ok((
                buf,
                Record::Attribute {
                    prefix: Some(prefix_letter(rtype - PREFIX_ATTRIBUTE_A)),
                    name: Name::Str(name),
                    value,
                },
            ))
        }
        SHORT_ELEMENT => {
            let (buf, name) = string(buf)?;
            Ok((
                buf,
                Record::Element {
                    prefix: None,
                    name: Name::Str(name),
                },
            ))
        }
        ELEMENT => {
            let (buf, prefix) = string(buf)?;
            let (buf, name) = string(buf)?;
            Ok((
                buf,
                Record::Element {
                    prefix: Some(prefix),
                    name: Name::Str(name),
                },
            ))
        }
        SHORT_DICT_ELEMENT => {
            let (buf, name) = dict_ref(buf)?;
            Ok((
                buf,
                Record::Element {
                    prefix: None,
                    name: Name::Dict(name),
                },
            ))
        }
        DICT_ELEMENT => {
            let (buf, prefix) = string(buf)?;
            let (buf, name) = dict_ref(buf)?;
            Ok((
                buf,
                Record::Element {
                    prefix: Some(prefix),
                    name: Name::Dict(name),
                },
            ))
        }
        PREFIX_DICT_ELEMENT_A..=PREFIX_DICT_ELEMENT_Z => {
            let (buf, name) = dict_ref(buf)?;
            Ok((
                buf,
                Record::Element {
                    prefix: Some(prefix_letter(rtype - PREFIX_DICT_ELEMENT_A)),
                    name: Name::Dict(name),
                },
            ))
        }
        PREFIX_ELEMENT_A..=PREFIX_ELEMENT_Z => {
            let (buf, name) = string(buf)?;
            Ok((
                buf,
                Record::Element {
                    prefix: Some(prefix_letter(rtype - PREFIX_ELEMENT_A)),
                    name: Name::Str(name),
                },
            ))
        }
        0x80..=0xBD => {
            let (buf, value) = text_payload(rtype & 0xFE, buf)?;
            Ok((
                buf,
                Record::Text {
                    value,
                    terminal: rtype & 0x01 != 0,
                },
            ))
        }
        _ => context("unknown record type", nom::combinator::fail)(buf),
    }
}

/// Attribute values are plain text structures; the "with end element" forms
/// are not allowed there.
fn attribute_value(buf: &[u8]) -> NomResult<'_, Text> {
    let (buf, code) = le_u8(buf)?;
    if code & 0x01 != 0 || !(0x80..=0xBC).contains(&code) {
        return context("invalid attribute value record", nom::combinator::fail)(buf);
    }
    text_payload(code, buf)
}

fn text_payload(code: u8, buf: &[u8]) -> NomResult<'_, Text> {
    match code {
        TEXT_ZERO => Ok((buf, Text::Zero)),
        TEXT_ONE => Ok((buf, Text::One)),
        TEXT_FALSE => Ok((buf, Text::False)),
        TEXT_TRUE => Ok((buf, Text::True)),
        TEXT_INT8 => map(le_i8, Text::Int8)(buf),
        TEXT_INT16 => map(le_i16, Text::Int16)(buf),
        TEXT_INT32 => map(le_i32, Text::Int32)(buf),
        TEXT_INT64 => map(le_i64, Text::Int64)(buf),
        TEXT_UINT64 => map(le_u64, Text::UInt64)(buf),
        TEXT_FLOAT => map(le_f32, Text::Float)(buf),
        TEXT_DOUBLE => map(le_f64, Text::Double)(buf),
        TEXT_DATETIME => map(le_u64, |v| Text::DateTime {
            ticks: v & DATETIME_TICKS_MASK,
            zone: TimeZone::from_bits(v >> 62),
        })(buf),
        TEXT_TIMESPAN => map(le_i64, Text::TimeSpan)(buf),
        TEXT_CHARS8 => {
            let (buf, len) = le_u8(buf)?;
            map(utf8(len as usize), Text::Chars)(buf)
        }
        TEXT_CHARS16 => {
            let (buf, len) = le_u16(buf)?;
            map(utf8(len as usize), Text::Chars)(buf)
        }
        TEXT_CHARS32 => {
            let (buf, len) = le_u32(buf)?;
            map(utf8(len as usize), Text::Chars)(buf)
        }
        TEXT_BYTES8 => {
            let (buf, len) = le_u8(buf)?;
            map(take(len as usize), |raw: &[u8]| Text::Bytes(raw.to_vec()))(buf)
        }
        TEXT_BYTES16 => {
            let (buf, len) = le_u16(buf)?;
            map(take(len as usize), |raw: &[u8]| Text::Bytes(raw.to_vec()))(buf)
        }
        TEXT_BYTES32 => {
            let (buf, len) = le_u32(buf)?;
            map(take(len as usize), |raw: &[u8]| Text::Bytes(raw.to_vec()))(buf)
        }
        TEXT_EMPTY => Ok((buf, Text::Empty)),
        TEXT_DICT => map(multi_byte_int31, Text::Dict)(buf),
        TEXT_UNIQUE_ID => map(take(16usize), |raw: &[u8]| {
            Text::UniqueId(raw.try_into().expect("slice with incorrect length"))
        })(buf),
        TEXT_UUID => map(take(16usize), |raw: &[u8]| {
            Text::Uuid(raw.try_into().expect("slice with incorrect length"))
        })(buf),
        TEXT_BOOL => map(le_u8, |b| if b == 0 { Text::False } else { Text::True })(buf),
        TEXT_UNICODE_CHARS8 => {
            let (buf, len) = le_u8(buf)?;
            map(utf16(len as usize), Text::Unicode)(buf)
        }
        TEXT_UNICODE_CHARS16 => {
            let (buf, len) = le_u16(buf)?;
            map(utf16(len as usize), Text::Unicode)(buf)
        }
        TEXT_UNICODE_CHARS32 => {
            let (buf, len) = le_u32(buf)?;
            map(utf16(len as usize), Text::Unicode)(buf)
        }
        TEXT_QNAME_DICT => {
            let (buf, prefix) = le_u8(buf)?;
            if prefix >= 26 {
                return context("invalid qname prefix", nom::combinator::fail)(buf);
            }
            let (buf, name) = multi_byte_int31(buf)?;
            Ok((
                buf,
                Text::QName {
                    prefix: (b'a' + prefix) as char,
                    name,
                },
            ))
        }
        TEXT_DECIMAL | TEXT_START_LIST | TEXT_END_LIST => {
            context("unsupported text record", nom::combinator::fail)(buf)
        }
        _ => context("unknown text record", nom::combinator::fail)(buf),
    }
}

fn utf8<'a>(len: usize) -> impl FnMut(&'a [u8]) -> NomResult<'a, String> {
    map_res(take(len), |raw: &[u8]| String::from_utf8(raw.to_vec()))
}

fn utf16<'a>(len: usize) -> impl FnMut(&'a [u8]) -> NomResult<'a, String> {
    map_res(take(len), |raw: &[u8]| -> Result<String, ()> {
        if raw.len() % 2 != 0 {
            return Err(());
        }
        let units: Vec<u16> = raw
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16(&units).map_err(|_| ())
    })
}

/// 7-bit little-endian variable length integer, at most 31 bits of payload.
fn multi_byte_int31(buf: &[u8]) -> NomResult<'_, u32> {
    let mut value: u32 = 0;
    let mut shift = 0;
    let mut rest = buf;
    loop {
        let (next, byte) = le_u8(rest)?;
        rest = next;
        value |= ((byte & 0x7F) as u32) << shift;
        if byte & 0x80 == 0 {
            return Ok((rest, value));
        }
        shift += 7;
        if shift > 28 {
            return context("oversized multi-byte integer", nom::combinator::fail)(buf);
        }
    }
}

/// Length-prefixed inline UTF-8 string.
fn string(buf: &[u8]) -> NomResult<'_, String> {
    let (buf, len) = multi_byte_int31(buf)?;
    utf8(len as usize)(buf)
}

fn dict_ref(buf: &[u8]) -> NomResult<'_, u32> {
    multi_byte_int31(buf)
}

fn prefix_letter(index: u8) -> String {
    ((b'a' + index) as char).to_string()
}

#[test]
fn test_dict_element_with_xmlns() {
    // <s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"/>
    let sample = [0x56, 0x02, 0x0B, 0x01, 0x73, 0x04, 0x01];

    let records = Record::parse_document(&sample).unwrap();
    assert_eq!(
        records,
        vec![
            Record::Element {
                prefix: Some("s".to_string()),
                name: Name::Dict(2),
            },
            Record::Xmlns {
                prefix: Some("s".to_string()),
                uri: Name::Dict(4),
            },
            Record::EndElement,
        ]
    );
}

#[test]
fn test_terminal_text() {
    // <foo>bar</foo>
    let sample = [0x40, 0x03, b'f', b'o', b'o', 0x99, 0x03, b'b', b'a', b'r'];

    let records = Record::parse_document(&sample).unwrap();
    assert_eq!(
        records,
        vec![
            Record::Element {
                prefix: None,
                name: Name::Str("foo".to_string()),
            },
            Record::Text {
                value: Text::Chars("bar".to_string()),
                terminal: true,
            },
        ]
    );
}

#[test]
fn test_multi_byte_dictionary_reference() {
    let sample = [0xAA, 0xB9, 0x02];

    let records = Record::parse_document(&sample).unwrap();
    assert_eq!(
        records,
        vec![Record::Text {
            value: Text::Dict(313),
            terminal: false,
        }]
    );
}

#[test]
fn test_unknown_record_type() {
    let sample = [0xFF];

    let err = Record::parse_document(&sample).unwrap_err();
    let Error::NomError(reason) = err;
    assert_eq!(reason, "unknown record type");
}

#[test]
fn test_truncated_string() {
    let sample = [0x40, 0x10, b'f'];

    assert!(Record::parse_document(&sample).is_err());
}
