use super::model::*;
use cookie_factory::bytes::{le_f32, le_f64, le_i16, le_i32, le_i64, le_i8, le_u16, le_u32, le_u64, le_u8};
use cookie_factory::combinator::slice;
use cookie_factory::multi::all;
use cookie_factory::sequence::tuple;
use cookie_factory::{gen, GenError, SerializeFn, WriteContext};
use std::io::Write;

/// Raised when a record stream cannot be written.
pub type Error = GenError;

/// Serializes a record stream into its binary wire form.
pub fn dump_records<W: Write>(records: &[Record], w: W) -> Result<W, Error> {
    let (w, _len) = gen(all(records.iter().map(record)), w)?;
    Ok(w)
}

fn record<'a, W: Write + 'a>(r: &'a Record) -> impl SerializeFn<W> + 'a {
    move |out: WriteContext<W>| match r {
        Record::EndElement => le_u8(END_ELEMENT)(out),
        Record::Comment(s) => tuple((le_u8(COMMENT), string(s)))(out),
        Record::Element { prefix, name } => element(prefix.as_deref(), name)(out),
        Record::Attribute {
            prefix,
            name,
            value,
        } => attribute(prefix.as_deref(), name, value)(out),
        Record::Xmlns { prefix, uri } => xmlns(prefix.as_deref(), uri)(out),
        Record::Text { value, terminal } => text(value, *terminal)(out),
    }
}

fn element<'a, W: Write + 'a>(prefix: Option<&'a str>, name: &'a Name) -> impl SerializeFn<W> + 'a {
    move |out: WriteContext<W>| match (prefix, name) {
        (None, Name::Str(n)) => tuple((le_u8(SHORT_ELEMENT), string(n)))(out),
        (None, Name::Dict(id)) => tuple((le_u8(SHORT_DICT_ELEMENT), multi_byte_int31(*id)))(out),
        (Some(p), Name::Dict(id)) => match prefix_index(p) {
            Some(i) => tuple((le_u8(PREFIX_DICT_ELEMENT_A + i), multi_byte_int31(*id)))(out),
            None => tuple((le_u8(DICT_ELEMENT), string(p), multi_byte_int31(*id)))(out),
        },
        (Some(p), Name::Str(n)) => match prefix_index(p) {
            Some(i) => tuple((le_u8(PREFIX_ELEMENT_A + i), string(n)))(out),
            None => tuple((le_u8(ELEMENT), string(p), string(n)))(out),
        },
    }
}

fn attribute<'a, W: Write + 'a>(
    prefix: Option<&'a str>,
    name: &'a Name,
    value: &'a Text,
) -> impl SerializeFn<W> + 'a {
    move |out: WriteContext<W>| {
        let out = match (prefix, name) {
            (None, Name::Str(n)) => tuple((le_u8(SHORT_ATTRIBUTE), string(n)))(out)?,
            (None, Name::Dict(id)) => {
                tuple((le_u8(SHORT_DICT_ATTRIBUTE), multi_byte_int31(*id)))(out)?
            }
            (Some(p), Name::Dict(id)) => match prefix_index(p) {
                Some(i) => tuple((le_u8(PREFIX_DICT_ATTRIBUTE_A + i), multi_byte_int31(*id)))(out)?,
                None => tuple((le_u8(DICT_ATTRIBUTE), string(p), multi_byte_int31(*id)))(out)?,
            },
            (Some(p), Name::Str(n)) => match prefix_index(p) {
                Some(i) => tuple((le_u8(PREFIX_ATTRIBUTE_A + i), string(n)))(out)?,
                None => tuple((le_u8(ATTRIBUTE), string(p), string(n)))(out)?,
            },
        };
        text(value, false)(out)
    }
}

fn xmlns<'a, W: Write + 'a>(prefix: Option<&'a str>, uri: &'a Name) -> impl SerializeFn<W> + 'a {
    move |out: WriteContext<W>| match (prefix, uri) {
        (None, Name::Str(u)) => tuple((le_u8(SHORT_XMLNS_ATTRIBUTE), string(u)))(out),
        (Some(p), Name::Str(u)) => tuple((le_u8(XMLNS_ATTRIBUTE), string(p), string(u)))(out),
        (None, Name::Dict(id)) => {
            tuple((le_u8(SHORT_DICT_XMLNS_ATTRIBUTE), multi_byte_int31(*id)))(out)
        }
        (Some(p), Name::Dict(id)) => {
            tuple((le_u8(DICT_XMLNS_ATTRIBUTE), string(p), multi_byte_int31(*id)))(out)
        }
    }
}

fn text<'a, W: Write + 'a>(value: &'a Text, terminal: bool) -> impl SerializeFn<W> + 'a {
    let end = terminal as u8;
    move |out: WriteContext<W>| match value {
        Text::Zero => le_u8(TEXT_ZERO | end)(out),
        Text::One => le_u8(TEXT_ONE | end)(out),
        Text::False => le_u8(TEXT_FALSE | end)(out),
        Text::True => le_u8(TEXT_TRUE | end)(out),
        Text::Int8(v) => tuple((le_u8(TEXT_INT8 | end), le_i8(*v)))(out),
        Text::Int16(v) => tuple((le_u8(TEXT_INT16 | end), le_i16(*v)))(out),
        Text::Int32(v) => tuple((le_u8(TEXT_INT32 | end), le_i32(*v)))(out),
        Text::Int64(v) => tuple((le_u8(TEXT_INT64 | end), le_i64(*v)))(out),
        Text::UInt64(v) => tuple((le_u8(TEXT_UINT64 | end), le_u64(*v)))(out),
        Text::Float(v) => tuple((le_u8(TEXT_FLOAT | end), le_f32(*v)))(out),
        Text::Double(v) => tuple((le_u8(TEXT_DOUBLE | end), le_f64(*v)))(out),
        Text::DateTime { ticks, zone } => tuple((
            le_u8(TEXT_DATETIME | end),
            le_u64((ticks & DATETIME_TICKS_MASK) | (zone.bits() << 62)),
        ))(out),
        Text::TimeSpan(v) => tuple((le_u8(TEXT_TIMESPAN | end), le_i64(*v)))(out),
        Text::Chars(s) => chars(s, end)(out),
        Text::Unicode(s) => unicode(s, end)(out),
        Text::Bytes(b) => bytes(b, end)(out),
        Text::Dict(id) => tuple((le_u8(TEXT_DICT | end), multi_byte_int31(*id)))(out),
        Text::UniqueId(b) => tuple((le_u8(TEXT_UNIQUE_ID | end), slice(&b[..])))(out),
        Text::Uuid(b) => tuple((le_u8(TEXT_UUID | end), slice(&b[..])))(out),
        Text::QName { prefix, name } => tuple((
            le_u8(TEXT_QNAME_DICT | end),
            le_u8(*prefix as u8 - b'a'),
            multi_byte_int31(*name),
        ))(out),
        Text::Empty => le_u8(TEXT_EMPTY | end)(out),
    }
}

/// UTF-8 text under the narrowest length prefix that fits.
fn chars<'a, W: Write + 'a>(s: &'a str, end: u8) -> impl SerializeFn<W> + 'a {
    move |out: WriteContext<W>| {
        let raw = s.as_bytes();
        if raw.len() <= u8::MAX as usize {
            tuple((le_u8(TEXT_CHARS8 | end), le_u8(raw.len() as u8), slice(raw)))(out)
        } else if raw.len() <= u16::MAX as usize {
            tuple((le_u8(TEXT_CHARS16 | end), le_u16(raw.len() as u16), slice(raw)))(out)
        } else {
            tuple((le_u8(TEXT_CHARS32 | end), le_u32(raw.len() as u32), slice(raw)))(out)
        }
    }
}

/// UTF-16 text; the length prefix counts bytes, not code units.
fn unicode<'a, W: Write + 'a>(s: &'a str, end: u8) -> impl SerializeFn<W> + 'a {
    move |out: WriteContext<W>| {
        let raw: Vec<u8> = s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        if raw.len() <= u8::MAX as usize {
            tuple((
                le_u8(TEXT_UNICODE_CHARS8 | end),
                le_u8(raw.len() as u8),
                slice(raw),
            ))(out)
        } else if raw.len() <= u16::MAX as usize {
            tuple((
                le_u8(TEXT_UNICODE_CHARS16 | end),
                le_u16(raw.len() as u16),
                slice(raw),
            ))(out)
        } else {
            tuple((
                le_u8(TEXT_UNICODE_CHARS32 | end),
                le_u32(raw.len() as u32),
                slice(raw),
            ))(out)
        }
    }
}

fn bytes<'a, W: Write + 'a>(b: &'a [u8], end: u8) -> impl SerializeFn<W> + 'a {
    move |out: WriteContext<W>| {
        if b.len() <= u8::MAX as usize {
            tuple((le_u8(TEXT_BYTES8 | end), le_u8(b.len() as u8), slice(b)))(out)
        } else if b.len() <= u16::MAX as usize {
            tuple((le_u8(TEXT_BYTES16 | end), le_u16(b.len() as u16), slice(b)))(out)
        } else {
            tuple((le_u8(TEXT_BYTES32 | end), le_u32(b.len() as u32), slice(b)))(out)
        }
    }
}

/// 7-bit little-endian variable length integer.
fn multi_byte_int31<W: Write>(value: u32) -> impl SerializeFn<W> {
    let mut encoded = Vec::with_capacity(5);
    let mut v = value;
    loop {
        let byte = (v & 0x7F) as u8;
        v >>= 7;
        if v == 0 {
            encoded.push(byte);
            break;
        }
        encoded.push(byte | 0x80);
    }
    slice(encoded)
}

/// Length-prefixed inline UTF-8 string.
fn string<'a, W: Write + 'a>(s: &'a str) -> impl SerializeFn<W> + 'a {
    tuple((multi_byte_int31(s.len() as u32), slice(s.as_bytes())))
}

#[test]
fn test_dict_element_with_xmlns() {
    // <s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"/>
    let records = vec![
        Record::Element {
            prefix: Some("s".to_string()),
            name: Name::Dict(2),
        },
        Record::Xmlns {
            prefix: Some("s".to_string()),
            uri: Name::Dict(4),
        },
        Record::EndElement,
    ];

    let buf = dump_records(&records, vec![]).unwrap();
    assert_eq!(buf, vec![0x56, 0x02, 0x0B, 0x01, 0x73, 0x04, 0x01]);
}

#[test]
fn test_terminal_text() {
    let records = vec![
        Record::Element {
            prefix: None,
            name: Name::Str("foo".to_string()),
        },
        Record::Text {
            value: Text::Chars("bar".to_string()),
            terminal: true,
        },
    ];

    let buf = dump_records(&records, vec![]).unwrap();
    assert_eq!(buf, vec![0x40, 0x03, b'f', b'o', b'o', 0x99, 0x03, b'b', b'a', b'r']);
}

#[test]
fn test_multi_byte_dictionary_reference() {
    let records = vec![Record::Text {
        value: Text::Dict(313),
        terminal: false,
    }];

    let buf = dump_records(&records, vec![]).unwrap();
    assert_eq!(buf, vec![0xAA, 0xB9, 0x02]);
}

#[test]
fn test_roundtrip() {
    let records = vec![
        Record::Element {
            prefix: Some("s".to_string()),
            name: Name::Dict(2),
        },
        Record::Xmlns {
            prefix: Some("s".to_string()),
            uri: Name::Dict(4),
        },
        Record::Element {
            prefix: None,
            name: Name::Str("Status".to_string()),
        },
        Record::Attribute {
            prefix: None,
            name: Name::Str("uptime".to_string()),
            value: Text::Int32(90_000),
        },
        Record::Text {
            value: Text::Chars("running".to_string()),
            terminal: true,
        },
        Record::EndElement,
    ];

    let buf = dump_records(&records, vec![]).unwrap();
    let parsed = Record::parse_document(&buf).unwrap();
    assert_eq!(records, parsed);
}
