//! SOAP 1.2 envelope construction with WS-Addressing headers.

use crate::nbfx::xml::{escape_attr, escape_text};

/// The SOAP 1.2 envelope namespace.
pub const SOAP_ENVELOPE_NS: &str = "http://www.w3.org/2003/05/soap-envelope";
/// The WS-Addressing namespace; its headers use the `a` prefix on the wire.
pub const ADDRESSING_NS: &str = "http://www.w3.org/2005/08/addressing";
/// The WS-Addressing anonymous reply address.
pub const ANONYMOUS_ADDRESS: &str = "http://www.w3.org/2005/08/addressing/anonymous";

const ADDRESSING_PREFIX: &str = "a";

/// The envelope namespace binding.  Every client owns one of these; it is
/// never process-global, so concurrent clients cannot interfere with each
/// other's envelopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeNs {
    /// The prefix bound to the envelope namespace.
    pub prefix: String,
    /// The envelope namespace URI.
    pub uri: String,
}

impl Default for EnvelopeNs {
    fn default() -> Self {
        EnvelopeNs {
            prefix: "s".to_string(),
            uri: SOAP_ENVELOPE_NS.to_string(),
        }
    }
}

/// A WS-Addressing SOAP header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoapHeader {
    /// The Action URI of the call.
    Action {
        /// The action URI.
        uri: String,
        /// Whether the receiver must understand the header.
        must_understand: bool,
    },
    /// Where the reply should go.
    ReplyTo {
        /// The reply address.
        address: String,
    },
    /// The destination of the message.
    To {
        /// The destination URI.
        uri: String,
        /// Whether the receiver must understand the header.
        must_understand: bool,
    },
}

/// An envelope for a single empty-bodied operation call.
#[derive(Debug, Clone)]
pub struct Envelope {
    envns: EnvelopeNs,
    headers: Vec<SoapHeader>,
    operation: String,
    body_ns: Option<String>,
}

impl Envelope {
    /// A headerless envelope whose body is the named empty operation
    /// element.
    pub fn new<T: Into<String>>(envns: EnvelopeNs, operation: T) -> Self {
        Envelope {
            envns,
            headers: Vec::new(),
            operation: operation.into(),
            body_ns: None,
        }
    }

    /// Appends a header; headers are written in insertion order.
    pub fn push_header(&mut self, header: SoapHeader) {
        self.headers.push(header);
    }

    /// Stamps a namespace onto the body's operation element.  The envelope
    /// writer does not infer the service's default namespace, so the message
    /// plugin sets this before the envelope goes on the wire.
    pub fn set_body_namespace<T: Into<String>>(&mut self, uri: T) {
        self.body_ns = Some(uri.into());
    }

    /// The namespace currently stamped on the body's operation element.
    pub fn body_namespace(&self) -> Option<&str> {
        self.body_ns.as_deref()
    }

    /// The operation this envelope invokes.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Writes the envelope as text XML.
    pub fn to_xml(&self) -> String {
        let s = &self.envns.prefix;
        let mut out = String::new();

        out.push_str(&format!(
            "<{}:Envelope xmlns:{}=\"{}\" xmlns:{}=\"{}\">",
            s,
            s,
            escape_attr(&self.envns.uri),
            ADDRESSING_PREFIX,
            ADDRESSING_NS,
        ));

        out.push_str(&format!("<{}:Header>", s));
        for header in &self.headers {
            out.push_str(&self.header_xml(header));
        }
        out.push_str(&format!("</{}:Header>", s));

        out.push_str(&format!("<{}:Body>", s));
        match &self.body_ns {
            Some(uri) => out.push_str(&format!(
                "<{} xmlns=\"{}\"/>",
                self.operation,
                escape_attr(uri)
            )),
            None => out.push_str(&format!("<{}/>", self.operation)),
        }
        out.push_str(&format!("</{}:Body></{}:Envelope>", s, s));

        out
    }

    fn header_xml(&self, header: &SoapHeader) -> String {
        let a = ADDRESSING_PREFIX;
        match header {
            SoapHeader::Action {
                uri,
                must_understand,
            } => format!(
                "<{}:Action{}>{}</{}:Action>",
                a,
                self.must_understand_xml(*must_understand),
                escape_text(uri),
                a,
            ),
            SoapHeader::ReplyTo { address } => format!(
                "<{}:ReplyTo><{}:Address>{}</{}:Address></{}:ReplyTo>",
                a,
                a,
                escape_text(address),
                a,
                a,
            ),
            SoapHeader::To {
                uri,
                must_understand,
            } => format!(
                "<{}:To{}>{}</{}:To>",
                a,
                self.must_understand_xml(*must_understand),
                escape_text(uri),
                a,
            ),
        }
    }

    fn must_understand_xml(&self, must_understand: bool) -> String {
        if must_understand {
            format!(" {}:mustUnderstand=\"1\"", self.envns.prefix)
        } else {
            String::new()
        }
    }
}

#[test]
fn test_envelope_xml() {
    let mut envelope = Envelope::new(EnvelopeNs::default(), "ScanDropFolders");
    envelope.push_header(SoapHeader::Action {
        uri: "http://tempuri.org/IJMMServer/ScanDropFolders".to_string(),
        must_understand: true,
    });
    envelope.push_header(SoapHeader::ReplyTo {
        address: ANONYMOUS_ADDRESS.to_string(),
    });
    envelope.push_header(SoapHeader::To {
        uri: "http://localhost:8111/ServiceBinary".to_string(),
        must_understand: true,
    });
    envelope.set_body_namespace("http://tempuri.org/");

    assert_eq!(
        envelope.to_xml(),
        concat!(
            "<s:Envelope xmlns:s=\"http://www.w3.org/2003/05/soap-envelope\"",
            " xmlns:a=\"http://www.w3.org/2005/08/addressing\">",
            "<s:Header>",
            "<a:Action s:mustUnderstand=\"1\">http://tempuri.org/IJMMServer/ScanDropFolders</a:Action>",
            "<a:ReplyTo><a:Address>http://www.w3.org/2005/08/addressing/anonymous</a:Address></a:ReplyTo>",
            "<a:To s:mustUnderstand=\"1\">http://localhost:8111/ServiceBinary</a:To>",
            "</s:Header>",
            "<s:Body><ScanDropFolders xmlns=\"http://tempuri.org/\"/></s:Body>",
            "</s:Envelope>",
        )
    );
}

#[test]
fn test_body_without_namespace() {
    let envelope = Envelope::new(EnvelopeNs::default(), "Ping");
    assert!(envelope.to_xml().contains("<s:Body><Ping/></s:Body>"));
    assert_eq!(envelope.body_namespace(), None);
}
