//! The static string table shared by both peers.  Ids are even; odd ids
//! would reference a per-session dictionary, which this endpoint never
//! negotiates.  The table covers the SOAP, WS-Addressing and WS-Security
//! strings an envelope can reference; anything else travels inline.

use lazy_static::lazy_static;
use std::collections::HashMap;

static STRINGS: &[(u32, &str)] = &[
    (0, "mustUnderstand"),
    (2, "Envelope"),
    (4, "http://www.w3.org/2003/05/soap-envelope"),
    (6, "http://www.w3.org/2005/08/addressing"),
    (8, "Header"),
    (10, "Action"),
    (12, "To"),
    (14, "Body"),
    (16, "Algorithm"),
    (18, "RelatesTo"),
    (20, "http://www.w3.org/2005/08/addressing/anonymous"),
    (22, "URI"),
    (24, "Reference"),
    (26, "MessageID"),
    (28, "Id"),
    (30, "Identifier"),
    (32, "http://schemas.xmlsoap.org/ws/2005/02/rm"),
    (34, "Transforms"),
    (36, "Transform"),
    (38, "DigestMethod"),
    (40, "DigestValue"),
    (42, "Address"),
    (44, "ReplyTo"),
    (46, "SequenceAcknowledgement"),
    (48, "AcknowledgementRange"),
    (50, "Upper"),
    (52, "Lower"),
    (54, "BufferRemaining"),
    (56, "http://schemas.microsoft.com/ws/2006/05/rm"),
    (58, "http://schemas.xmlsoap.org/ws/2005/02/rm/SequenceAcknowledgement"),
    (60, "SecurityTokenReference"),
    (62, "Sequence"),
    (64, "MessageNumber"),
    (66, "http://www.w3.org/2000/09/xmldsig#"),
    (68, "http://www.w3.org/2000/09/xmldsig#enveloped-signature"),
    (70, "KeyInfo"),
    (
        72,
        "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd",
    ),
    (74, "http://www.w3.org/2001/04/xmlenc#"),
    (76, "http://schemas.xmlsoap.org/ws/2005/02/sc"),
    (78, "DerivedKeyToken"),
    (80, "Nonce"),
    (82, "Signature"),
    (84, "SignedInfo"),
    (86, "CanonicalizationMethod"),
    (88, "SignatureMethod"),
    (90, "SignatureValue"),
    (92, "KeyIdentifier"),
];

lazy_static! {
    static ref IDS: HashMap<&'static str, u32> =
        STRINGS.iter().map(|&(id, s)| (s, id)).collect();
}

/// Looks up the string behind a dictionary id.
pub fn str_by_id(id: u32) -> Option<&'static str> {
    STRINGS
        .binary_search_by_key(&id, |&(id, _)| id)
        .ok()
        .map(|index| STRINGS[index].1)
}

/// The dictionary id of a string, if the table carries it.
pub fn id_of(s: &str) -> Option<u32> {
    IDS.get(s).copied()
}

#[test]
fn test_lookups_are_inverses() {
    for &(id, s) in STRINGS {
        assert_eq!(str_by_id(id), Some(s));
        assert_eq!(id_of(s), Some(id));
    }
}

#[test]
fn test_unknown_entries() {
    assert_eq!(str_by_id(1), None);
    assert_eq!(str_by_id(94), None);
    assert_eq!(id_of("http://tempuri.org/"), None);
}
