use super::dictionary;

// Structural records.  The single-character prefix forms cover one letter
// each from 'a' to 'z'.
pub(super) const END_ELEMENT: u8 = 0x01;
pub(super) const COMMENT: u8 = 0x02;
pub(super) const ARRAY: u8 = 0x03;
pub(super) const SHORT_ATTRIBUTE: u8 = 0x04;
pub(super) const ATTRIBUTE: u8 = 0x05;
pub(super) const SHORT_DICT_ATTRIBUTE: u8 = 0x06;
pub(super) const DICT_ATTRIBUTE: u8 = 0x07;
pub(super) const SHORT_XMLNS_ATTRIBUTE: u8 = 0x08;
pub(super) const XMLNS_ATTRIBUTE: u8 = 0x09;
pub(super) const SHORT_DICT_XMLNS_ATTRIBUTE: u8 = 0x0A;
pub(super) const DICT_XMLNS_ATTRIBUTE: u8 = 0x0B;
pub(super) const PREFIX_DICT_ATTRIBUTE_A: u8 = 0x0C;
pub(super) const PREFIX_DICT_ATTRIBUTE_Z: u8 = 0x25;
pub(super) const PREFIX_ATTRIBUTE_A: u8 = 0x26;
pub(super) const PREFIX_ATTRIBUTE_Z: u8 = 0x3F;
pub(super) const SHORT_ELEMENT: u8 = 0x40;
pub(super) const ELEMENT: u8 = 0x41;
pub(super) const SHORT_DICT_ELEMENT: u8 = 0x42;
pub(super) const DICT_ELEMENT: u8 = 0x43;
pub(super) const PREFIX_DICT_ELEMENT_A: u8 = 0x44;
pub(super) const PREFIX_DICT_ELEMENT_Z: u8 = 0x5D;
pub(super) const PREFIX_ELEMENT_A: u8 = 0x5E;
pub(super) const PREFIX_ELEMENT_Z: u8 = 0x77;

// Text records.  Bit 0 is the "with end element" flag, so only the even
// codes are listed here.
pub(super) const TEXT_ZERO: u8 = 0x80;
pub(super) const TEXT_ONE: u8 = 0x82;
pub(super) const TEXT_FALSE: u8 = 0x84;
pub(super) const TEXT_TRUE: u8 = 0x86;
pub(super) const TEXT_INT8: u8 = 0x88;
pub(super) const TEXT_INT16: u8 = 0x8A;
pub(super) const TEXT_INT32: u8 = 0x8C;
pub(super) const TEXT_INT64: u8 = 0x8E;
pub(super) const TEXT_FLOAT: u8 = 0x90;
pub(super) const TEXT_DOUBLE: u8 = 0x92;
pub(super) const TEXT_DECIMAL: u8 = 0x94;
pub(super) const TEXT_DATETIME: u8 = 0x96;
pub(super) const TEXT_CHARS8: u8 = 0x98;
pub(super) const TEXT_CHARS16: u8 = 0x9A;
pub(super) const TEXT_CHARS32: u8 = 0x9C;
pub(super) const TEXT_BYTES8: u8 = 0x9E;
pub(super) const TEXT_BYTES16: u8 = 0xA0;
pub(super) const TEXT_BYTES32: u8 = 0xA2;
pub(super) const TEXT_START_LIST: u8 = 0xA4;
pub(super) const TEXT_END_LIST: u8 = 0xA6;
pub(super) const TEXT_EMPTY: u8 = 0xA8;
pub(super) const TEXT_DICT: u8 = 0xAA;
pub(super) const TEXT_UNIQUE_ID: u8 = 0xAC;
pub(super) const TEXT_TIMESPAN: u8 = 0xAE;
pub(super) const TEXT_UUID: u8 = 0xB0;
pub(super) const TEXT_UINT64: u8 = 0xB2;
pub(super) const TEXT_BOOL: u8 = 0xB4;
pub(super) const TEXT_UNICODE_CHARS8: u8 = 0xB6;
pub(super) const TEXT_UNICODE_CHARS16: u8 = 0xB8;
pub(super) const TEXT_UNICODE_CHARS32: u8 = 0xBA;
pub(super) const TEXT_QNAME_DICT: u8 = 0xBC;

/// DateTime values carry their ticks in the low 62 bits of the wire word.
pub(super) const DATETIME_TICKS_MASK: u64 = (1 << 62) - 1;

/// An element or attribute name: either inline UTF-8 or a reference into the
/// static dictionary.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Name {
    /// An inline, length-prefixed string.
    Str(String),
    /// A reference into the static dictionary.
    Dict(u32),
}

impl Name {
    /// Picks the dictionary form whenever the string is in the static table.
    pub fn new(s: &str) -> Name {
        match dictionary::id_of(s) {
            Some(id) => Name::Dict(id),
            None => Name::Str(s.to_string()),
        }
    }
}

/// The timezone flag carried by DateTime text values.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TimeZone {
    /// No timezone information.
    None,
    /// The ticks are UTC.
    Utc,
    /// The ticks are in the sender's local time.
    Local,
}

impl TimeZone {
    pub(super) fn bits(self) -> u64 {
        match self {
            TimeZone::None => 0,
            TimeZone::Utc => 1,
            TimeZone::Local => 2,
        }
    }

    pub(super) fn from_bits(bits: u64) -> TimeZone {
        match bits {
            1 => TimeZone::Utc,
            2 => TimeZone::Local,
            _ => TimeZone::None,
        }
    }
}

/// A typed text value.  The wire carries each variant under its own record
/// code; string and byte variants additionally pick a width by length.
#[derive(Debug, PartialEq, Clone)]
pub enum Text {
    /// The literal `0`.
    Zero,
    /// The literal `1`.
    One,
    /// The literal `false`.
    False,
    /// The literal `true`.
    True,
    /// A signed 8-bit integer.
    Int8(i8),
    /// A signed 16-bit integer.
    Int16(i16),
    /// A signed 32-bit integer.
    Int32(i32),
    /// A signed 64-bit integer.
    Int64(i64),
    /// An unsigned 64-bit integer.
    UInt64(u64),
    /// A 32-bit float.
    Float(f32),
    /// A 64-bit float.
    Double(f64),
    /// 100ns ticks since 0001-01-01, plus a timezone flag.
    DateTime {
        /// Ticks since 0001-01-01T00:00:00.
        ticks: u64,
        /// What the ticks are relative to.
        zone: TimeZone,
    },
    /// A duration in 100ns ticks.
    TimeSpan(i64),
    /// UTF-8 text.
    Chars(String),
    /// Text carried as UTF-16 on the wire.
    Unicode(String),
    /// Raw bytes, rendered as base64 in text form.
    Bytes(Vec<u8>),
    /// A reference into the static dictionary.
    Dict(u32),
    /// A GUID rendered in `urn:uuid:` form.
    UniqueId([u8; 16]),
    /// A bare GUID.
    Uuid([u8; 16]),
    /// A `prefix:name` pair with the name in the static dictionary.
    QName {
        /// The one-letter prefix, 'a' to 'z'.
        prefix: char,
        /// Dictionary id of the local name.
        name: u32,
    },
    /// The empty string.
    Empty,
}

/// One node of a binary XML document.  A document is a flat record sequence;
/// nesting is implied by element starts and end-element markers, and
/// attribute records always directly follow the element they belong to.
#[derive(Debug, PartialEq, Clone)]
pub enum Record {
    /// The start of an element.
    Element {
        /// Namespace prefix, if any.
        prefix: Option<String>,
        /// Local name.
        name: Name,
    },
    /// An attribute of the preceding element start.
    Attribute {
        /// Namespace prefix, if any.
        prefix: Option<String>,
        /// Local name.
        name: Name,
        /// The attribute value.
        value: Text,
    },
    /// An `xmlns` or `xmlns:prefix` declaration on the preceding element.
    Xmlns {
        /// The declared prefix; `None` for the default namespace.
        prefix: Option<String>,
        /// The namespace URI.
        uri: Name,
    },
    /// Character data.
    Text {
        /// The value.
        value: Text,
        /// Whether this record also closes the current element (the "with
        /// end element" wire forms).
        terminal: bool,
    },
    /// Closes the current element.
    EndElement,
    /// A comment.
    Comment(String),
}

/// Index of a single-letter prefix into the per-letter record type ranges,
/// when the optimized form applies.
pub(super) fn prefix_index(prefix: &str) -> Option<u8> {
    let mut chars = prefix.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_lowercase() => Some(c as u8 - b'a'),
        _ => None,
    }
}
