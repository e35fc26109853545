//! Lenient analysis of server responses.
//!
//! [`extract_result_code`] walks just far enough into an `LDAPMessage` to read
//! the `resultCode` of an `LDAPResult`-shaped response. It accepts things the
//! encoder never produces (long-form lengths with redundant octets, declared
//! lengths that disagree with the buffer) and answers `None` for anything it
//! cannot follow. It never panics on arbitrary input.

use crate::codec::{self, DeclaredLength, Tag, TagClass};
use crate::walk;
use serde::Serialize;
use std::fmt;

pub const SUCCESS: u64 = 0;
pub const PROTOCOL_ERROR: u64 = 2;

/// RFC 4511 result code names for the codes this tool reports on.
pub fn result_code_name(code: u64) -> Option<&'static str> {
    Some(match code {
        0 => "success",
        1 => "operationsError",
        2 => "protocolError",
        3 => "timeLimitExceeded",
        4 => "sizeLimitExceeded",
        5 => "compareFalse",
        6 => "compareTrue",
        7 => "authMethodNotSupported",
        8 => "strongerAuthRequired",
        10 => "referral",
        11 => "adminLimitExceeded",
        12 => "unavailableCriticalExtension",
        13 => "confidentialityRequired",
        14 => "saslBindInProgress",
        49 => "invalidCredentials",
        51 => "busy",
        52 => "unavailable",
        53 => "unwillingToPerform",
        _ => return None,
    })
}

/// `name (code)`, or just the number for codes without a name.
pub fn describe_result_code(code: u64) -> String {
    match result_code_name(code) {
        Some(name) => format!("{} ({})", name, code),
        None => format!("result code {}", code),
    }
}

/// Reads one identifier and one length at `*pos`, advancing past both.
fn header_at(buf: &[u8], pos: &mut usize) -> Option<(Tag, DeclaredLength)> {
    let header = codec::read_header(buf.get(*pos..)?)?;
    *pos += header.len();
    Some((header.tag, header.length))
}

/// Result code of the first message in `response`, if it has the shape
/// `SEQUENCE { INTEGER, [APPLICATION n] { ENUMERATED, ... } }`.
///
/// The enumerated content is read as an unsigned big-endian number; leading zero
/// octets are ignored and a value wider than 64 bits is unparseable. Empty content
/// reads as 0.
pub fn extract_result_code(response: &[u8]) -> Option<u64> {
    let mut pos = 0;

    let (tag, _) = header_at(response, &mut pos)?;
    if tag != Tag::SEQUENCE {
        return None;
    }

    let (tag, length) = header_at(response, &mut pos)?;
    if tag != Tag::INTEGER {
        return None;
    }
    match length {
        DeclaredLength::Definite(n) => pos = pos.checked_add(usize::try_from(n).ok()?)?,
        DeclaredLength::Indefinite => return None,
    }

    let (tag, _) = header_at(response, &mut pos)?;
    if tag.class != TagClass::Application {
        return None;
    }

    let (tag, length) = header_at(response, &mut pos)?;
    if tag != Tag::ENUMERATED {
        return None;
    }
    let n = match length {
        DeclaredLength::Definite(n) => usize::try_from(n).ok()?,
        DeclaredLength::Indefinite => return None,
    };
    let content = response.get(pos..pos.checked_add(n)?)?;

    let significant = content.iter().skip_while(|&&b| b == 0);
    let mut code: u64 = 0;
    for &b in significant {
        code = code.checked_mul(256)?.checked_add(b as u64)?;
    }
    Some(code)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Nothing came back before the deadline.
    Timeout,
    /// Zero bytes: the peer closed the connection.
    ConnectionClosed,
    /// Bytes arrived but no result code could be read.
    Malformed,
    Success,
    ProtocolError,
    OtherError,
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnalysisKind::Timeout => "timeout",
            AnalysisKind::ConnectionClosed => "connection_closed",
            AnalysisKind::Malformed => "malformed",
            AnalysisKind::Success => "success",
            AnalysisKind::ProtocolError => "protocol_error",
            AnalysisKind::OtherError => "other_error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub kind: AnalysisKind,
    pub result_code: Option<u64>,
    pub notes: String,
}

/// Classify a response. `None` means nothing was received at all.
pub fn analyze_response(response: Option<&[u8]>) -> Analysis {
    let Some(bytes) = response else {
        return Analysis {
            kind: AnalysisKind::Timeout,
            result_code: None,
            notes: "No response received (timeout)".to_string(),
        };
    };
    if bytes.is_empty() {
        return Analysis {
            kind: AnalysisKind::ConnectionClosed,
            result_code: None,
            notes: "Connection closed by server".to_string(),
        };
    }

    let Some(code) = extract_result_code(bytes) else {
        return Analysis {
            kind: AnalysisKind::Malformed,
            result_code: None,
            notes: format!("Could not parse response ({} bytes)", bytes.len()),
        };
    };

    let kind = match code {
        SUCCESS => AnalysisKind::Success,
        PROTOCOL_ERROR => AnalysisKind::ProtocolError,
        _ => AnalysisKind::OtherError,
    };
    let mut notes = describe_result_code(code);
    if walk::message_extent(bytes).is_none() {
        notes.push_str(", message truncated");
    }
    Analysis { kind, result_code: Some(code), notes }
}
