//! Bridges between text XML and the binary record form.  Outbound envelopes
//! are parsed from text into records before serialization; inbound replies
//! are rendered from records into a deterministic textual dump.

use super::dictionary;
use super::model::{Name, Record, Text};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use err_derive::Error;
use std::fmt::Write as _;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use xml::namespace::Namespace;
use xml::reader::{EventReader, ParserConfig, XmlEvent};

/// Ticks between 0001-01-01 and the unix epoch.
const UNIX_EPOCH_TICKS: i128 = 621_355_968_000_000_000;

/// Raised when text cannot be converted to records or back.
#[derive(Debug, Error)]
pub enum Error {
    /// The source text is not well formed XML.
    #[error(display = "XML reading error")]
    XmlRead(#[error(source)] xml::reader::Error),
    /// A record references a dictionary string this build does not carry.
    #[error(display = "Unknown dictionary string {}", _0)]
    UnknownDictionary(u32),
    /// The record sequence does not describe a well formed document.
    #[error(display = "Malformed record stream: {}", _0)]
    Malformed(&'static str),
    /// Raised when assembling the output text fails.
    #[error(display = "Text formatting error")]
    Fmt(#[error(source)] std::fmt::Error),
    /// A DateTime value is outside the representable range.
    #[error(display = "Timestamp out of range")]
    TimestampRange(#[error(source)] time::error::ComponentRange),
    /// A DateTime value failed to format.
    #[error(display = "Timestamp formatting error")]
    TimestampFormat(#[error(source)] time::error::Format),
}

/// Parses text XML into the flat record form.  Element and attribute names
/// and text values that match the static dictionary are emitted as
/// dictionary references; everything else travels inline.
pub fn xml_to_records(xml_text: &str) -> Result<Vec<Record>, Error> {
    let config = ParserConfig::new()
        .trim_whitespace(true)
        .cdata_to_characters(true)
        .ignore_comments(false);
    let reader = EventReader::new_with_config(xml_text.as_bytes(), config);

    let mut records = Vec::new();
    let mut scopes: Vec<Namespace> = vec![Namespace::empty()];
    let mut pending_text: Option<Text> = None;

    for event in reader {
        match event? {
            XmlEvent::StartElement {
                name,
                attributes,
                namespace,
            } => {
                flush_text(&mut records, &mut pending_text);
                records.push(Record::Element {
                    prefix: name.prefix.clone(),
                    name: Name::new(&name.local_name),
                });
                for attr in &attributes {
                    records.push(Record::Attribute {
                        prefix: attr.name.prefix.clone(),
                        name: Name::new(&attr.name.local_name),
                        value: text_of(&attr.value),
                    });
                }
                // The reader hands us the full in-scope mapping; only the
                // declarations new to this element go on the wire.
                let parent = scopes.last().expect("scope stack is never empty");
                for (prefix, uri) in namespace.iter() {
                    if prefix == "xml" || prefix == "xmlns" || uri.is_empty() {
                        continue;
                    }
                    if parent.get(prefix) != Some(uri) {
                        records.push(Record::Xmlns {
                            prefix: if prefix.is_empty() {
                                None
                            } else {
                                Some(prefix.to_string())
                            },
                            uri: Name::new(uri),
                        });
                    }
                }
                scopes.push(namespace);
            }
            XmlEvent::Characters(s) => {
                flush_text(&mut records, &mut pending_text);
                pending_text = Some(text_of(&s));
            }
            XmlEvent::EndElement { .. } => {
                scopes.pop();
                match pending_text.take() {
                    Some(value) => records.push(Record::Text {
                        value,
                        terminal: true,
                    }),
                    None => records.push(Record::EndElement),
                }
            }
            XmlEvent::Comment(s) => {
                flush_text(&mut records, &mut pending_text);
                records.push(Record::Comment(s));
            }
            _ => {}
        }
    }

    Ok(records)
}

/// Renders a record sequence as text.  The rendering is deterministic: the
/// same records always produce the same string.
pub fn records_to_xml(records: &[Record]) -> Result<String, Error> {
    let mut out = String::new();
    let mut stack: Vec<String> = Vec::new();
    let mut index = 0;

    while index < records.len() {
        match &records[index] {
            Record::Element { prefix, name } => {
                let tag = qname(prefix.as_deref(), name)?;
                if !out.is_empty() {
                    newline(&mut out, stack.len());
                }
                write!(out, "<{}", tag)?;
                index += 1;
                // Attribute records always directly follow their element.
                while index < records.len() {
                    match &records[index] {
                        Record::Attribute {
                            prefix,
                            name,
                            value,
                        } => {
                            write!(
                                out,
                                " {}=\"{}\"",
                                qname(prefix.as_deref(), name)?,
                                escape_attr(&render_text(value)?)
                            )?;
                        }
                        Record::Xmlns { prefix, uri } => match prefix {
                            Some(p) => write!(
                                out,
                                " xmlns:{}=\"{}\"",
                                p,
                                escape_attr(resolve(uri)?)
                            )?,
                            None => {
                                write!(out, " xmlns=\"{}\"", escape_attr(resolve(uri)?))?
                            }
                        },
                        _ => break,
                    }
                    index += 1;
                }
                match records.get(index) {
                    Some(Record::Text {
                        value,
                        terminal: true,
                    }) => {
                        write!(
                            out,
                            ">{}</{}>",
                            escape_text(&render_text(value)?),
                            tag
                        )?;
                        index += 1;
                    }
                    Some(Record::EndElement) => {
                        out.push_str("/>");
                        index += 1;
                    }
                    _ => {
                        out.push('>');
                        stack.push(tag);
                    }
                }
            }
            Record::Text { value, terminal } => {
                out.push_str(&escape_text(&render_text(value)?));
                if *terminal {
                    let tag = stack
                        .pop()
                        .ok_or(Error::Malformed("end element without a matching start"))?;
                    write!(out, "</{}>", tag)?;
                }
                index += 1;
            }
            Record::EndElement => {
                let tag = stack
                    .pop()
                    .ok_or(Error::Malformed("end element without a matching start"))?;
                newline(&mut out, stack.len());
                write!(out, "</{}>", tag)?;
                index += 1;
            }
            Record::Comment(s) => {
                if !out.is_empty() {
                    newline(&mut out, stack.len());
                }
                write!(out, "<!--{}-->", s)?;
                index += 1;
            }
            Record::Attribute { .. } | Record::Xmlns { .. } => {
                return Err(Error::Malformed("attribute record outside an element start"));
            }
        }
    }

    if !stack.is_empty() {
        return Err(Error::Malformed("unclosed element"));
    }

    Ok(out)
}

pub(crate) fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub(crate) fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

fn flush_text(records: &mut Vec<Record>, pending: &mut Option<Text>) {
    if let Some(value) = pending.take() {
        records.push(Record::Text {
            value,
            terminal: false,
        });
    }
}

fn text_of(s: &str) -> Text {
    match dictionary::id_of(s) {
        Some(id) => Text::Dict(id),
        None => Text::Chars(s.to_string()),
    }
}

fn newline(out: &mut String, depth: usize) {
    out.push('\n');
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn qname(prefix: Option<&str>, name: &Name) -> Result<String, Error> {
    let local = resolve(name)?;
    Ok(match prefix {
        Some(p) => format!("{}:{}", p, local),
        None => local.to_string(),
    })
}

fn resolve<'a>(name: &'a Name) -> Result<&'a str, Error> {
    match name {
        Name::Str(s) => Ok(s),
        Name::Dict(id) => dictionary::str_by_id(*id).ok_or(Error::UnknownDictionary(*id)),
    }
}

fn render_text(value: &Text) -> Result<String, Error> {
    Ok(match value {
        Text::Zero => "0".to_string(),
        Text::One => "1".to_string(),
        Text::False => "false".to_string(),
        Text::True => "true".to_string(),
        Text::Int8(v) => v.to_string(),
        Text::Int16(v) => v.to_string(),
        Text::Int32(v) => v.to_string(),
        Text::Int64(v) => v.to_string(),
        Text::UInt64(v) => v.to_string(),
        Text::Float(v) => v.to_string(),
        Text::Double(v) => v.to_string(),
        Text::DateTime { ticks, zone: _ } => {
            let nanos = (*ticks as i128 - UNIX_EPOCH_TICKS) * 100;
            OffsetDateTime::from_unix_timestamp_nanos(nanos)?.format(&Rfc3339)?
        }
        Text::TimeSpan(ticks) => render_timespan(*ticks),
        Text::Chars(s) => s.clone(),
        Text::Unicode(s) => s.clone(),
        Text::Bytes(b) => BASE64.encode(b),
        Text::Dict(id) => dictionary::str_by_id(*id)
            .ok_or(Error::UnknownDictionary(*id))?
            .to_string(),
        Text::UniqueId(b) => format!("urn:uuid:{}", render_guid(b)),
        Text::Uuid(b) => render_guid(b),
        Text::QName { prefix, name } => format!(
            "{}:{}",
            prefix,
            dictionary::str_by_id(*name).ok_or(Error::UnknownDictionary(*name))?
        ),
        Text::Empty => String::new(),
    })
}

/// The first three GUID fields are little-endian on the wire.
fn render_guid(b: &[u8; 16]) -> String {
    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        b[3], b[2], b[1], b[0], b[5], b[4], b[7], b[6], b[8], b[9], b[10], b[11], b[12], b[13],
        b[14], b[15],
    )
}

/// Days, time of day and the fractional tick remainder, as the service
/// renders durations.
fn render_timespan(ticks: i64) -> String {
    let t = ticks.unsigned_abs();
    let days = t / 864_000_000_000;
    let hours = t / 36_000_000_000 % 24;
    let minutes = t / 600_000_000 % 60;
    let seconds = t / 10_000_000 % 60;
    let fraction = t % 10_000_000;

    let mut out = format!("{:02}:{:02}:{:02}", hours, minutes, seconds);
    if days > 0 {
        out = format!("{}.{}", days, out);
    }
    if fraction > 0 {
        out = format!("{}.{:07}", out, fraction);
    }
    if ticks < 0 {
        out = format!("-{}", out);
    }
    out
}

#[cfg(test)]
use super::model::TimeZone;
#[cfg(test)]
use indoc::indoc;

#[test]
fn test_envelope_to_records() {
    let sample = r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"/>"#;

    let records = xml_to_records(sample).unwrap();
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
fn test_known_text_uses_the_dictionary() {
    let sample = r#"<a:Address xmlns:a="http://www.w3.org/2005/08/addressing">http://www.w3.org/2005/08/addressing/anonymous</a:Address>"#;

    let records = xml_to_records(sample).unwrap();
    assert_eq!(
        records,
        vec![
            Record::Element {
                prefix: Some("a".to_string()),
                name: Name::Dict(42),
            },
            Record::Xmlns {
                prefix: Some("a".to_string()),
                uri: Name::Dict(6),
            },
            Record::Text {
                value: Text::Dict(20),
                terminal: true,
            },
        ]
    );
}

#[test]
fn test_nested_namespaces_declared_once() {
    let sample = r#"<a xmlns="urn:one"><b><c xmlns="urn:two"/></b></a>"#;

    let records = xml_to_records(sample).unwrap();
    let declarations: Vec<&Record> = records
        .iter()
        .filter(|r| matches!(r, Record::Xmlns { .. }))
        .collect();
    assert_eq!(
        declarations,
        vec![
            &Record::Xmlns {
                prefix: None,
                uri: Name::Str("urn:one".to_string()),
            },
            &Record::Xmlns {
                prefix: None,
                uri: Name::Str("urn:two".to_string()),
            },
        ]
    );
}

#[test]
fn test_records_to_xml() {
    let sample = r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"><s:Body><Status busy="true">idle &amp; ready</Status></s:Body></s:Envelope>"#;

    let records = xml_to_records(sample).unwrap();
    let rendered = records_to_xml(&records).unwrap();
    assert_eq!(
        rendered,
        indoc! {r#"
            <s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope">
              <s:Body>
                <Status busy="true">idle &amp; ready</Status>
              </s:Body>
            </s:Envelope>"#}
    );
}

#[test]
fn test_rendering_is_deterministic() {
    let records = vec![
        Record::Element {
            prefix: None,
            name: Name::Str("Status".to_string()),
        },
        Record::Attribute {
            prefix: None,
            name: Name::Str("stamp".to_string()),
            value: Text::DateTime {
                ticks: 638_000_000_000_000_000,
                zone: TimeZone::Utc,
            },
        },
        Record::Text {
            value: Text::Bytes(vec![0xDE, 0xAD, 0xBE, 0xEF]),
            terminal: true,
        },
    ];

    let first = records_to_xml(&records).unwrap();
    let second = records_to_xml(&records).unwrap();
    assert_eq!(first, second);
    assert!(first.contains("3q2+7w=="));
}

#[test]
fn test_unknown_dictionary_reference() {
    let records = vec![Record::Element {
        prefix: None,
        name: Name::Dict(94),
    }];

    assert_matches::assert_matches!(
        records_to_xml(&records),
        Err(Error::UnknownDictionary(94))
    );
}

#[test]
fn test_unbalanced_records() {
    let records = vec![Record::EndElement];

    assert_matches::assert_matches!(records_to_xml(&records), Err(Error::Malformed(_)));
}
