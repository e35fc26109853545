//! Static catalog of adversarial test cases.
//!
//! Cases are grouped into six suites across two sections. Section 1 attacks the
//! BER layer (lengths, identifiers, values); section 2 attacks the LDAP envelope
//! (message id, protocolOp choice, controls). Every suite is generated on demand
//! and always yields the same ordered list.

use crate::codec::{self, Element, Length, Tag, END_OF_CONTENTS};
use crate::malform::{self, IntegerFault, LengthFault, TagFault, UNKNOWN_APPLICATION_TAG};
use crate::message::{oid, op, BindRequest, Control, Envelope, ProtocolOp, SearchRequest};
use std::fmt;

/// Distinguished name used by the cases that need a non-empty bind name.
pub const TEST_DN: &str = "cn=test,dc=example,dc=com";
/// Password used by the cases that need non-empty simple credentials.
pub const TEST_PASSWORD: &[u8] = b"password";
/// Content size announced by the oversized control value.
pub const OVERSIZED_CONTROL_DECLARED: u32 = 1024 * 1024;
/// Content actually sent after the oversized control value header.
pub const OVERSIZED_CONTROL_SENT: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// Hierarchical id, e.g. `1.1.1.4`.
    pub id: String,
    pub name: String,
    pub description: String,
    /// One payload, or several correlated payloads sent in order.
    pub payloads: Vec<Vec<u8>>,
    /// Free-text hint of what a conforming server does. Not enforced.
    pub expected: String,
}

impl TestCase {
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>, payload: Vec<u8>, expected: impl Into<String>) -> Self {
        TestCase::multi(id, name, description, vec![payload], expected)
    }

    pub fn multi(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        payloads: Vec<Vec<u8>>,
        expected: impl Into<String>,
    ) -> Self {
        TestCase {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            payloads,
            expected: expected.into(),
        }
    }

    pub fn is_multi_payload(&self) -> bool {
        self.payloads.len() > 1
    }

    /// Same case with the id and name relabelled, payloads untouched.
    pub fn relabel(&self, id: impl Into<String>, name: impl Into<String>) -> TestCase {
        TestCase { id: id.into(), name: name.into(), ..self.clone() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    /// BER encoding rules.
    Encoding,
    /// LDAPMessage envelope rules.
    Envelope,
}

impl Section {
    pub const ALL: [Section; 2] = [Section::Encoding, Section::Envelope];

    pub fn number(self) -> u32 {
        match self {
            Section::Encoding => 1,
            Section::Envelope => 2,
        }
    }

    pub fn from_number(number: u32) -> Option<Section> {
        Section::ALL.into_iter().find(|s| s.number() == number)
    }

    pub fn suites(self) -> Vec<Suite> {
        Suite::ALL.into_iter().filter(|s| s.section() == self).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Suite {
    LengthEncoding,
    TypeEncoding,
    ValueEncoding,
    MessageId,
    ProtocolOp,
    Controls,
}

impl Suite {
    pub const ALL: [Suite; 6] = [
        Suite::LengthEncoding,
        Suite::TypeEncoding,
        Suite::ValueEncoding,
        Suite::MessageId,
        Suite::ProtocolOp,
        Suite::Controls,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Suite::LengthEncoding => "1.1.1",
            Suite::TypeEncoding => "1.1.2",
            Suite::ValueEncoding => "1.1.3",
            Suite::MessageId => "2.1.1",
            Suite::ProtocolOp => "2.1.2",
            Suite::Controls => "2.1.3",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Suite::LengthEncoding => "Length Encoding Attacks",
            Suite::TypeEncoding => "Type Encoding Violations",
            Suite::ValueEncoding => "Value Encoding Issues",
            Suite::MessageId => "MessageID Tests",
            Suite::ProtocolOp => "ProtocolOp Field Tests",
            Suite::Controls => "Controls Tests",
        }
    }

    pub fn section(self) -> Section {
        match self {
            Suite::LengthEncoding | Suite::TypeEncoding | Suite::ValueEncoding => Section::Encoding,
            Suite::MessageId | Suite::ProtocolOp | Suite::Controls => Section::Envelope,
        }
    }

    pub fn from_id(id: &str) -> Option<Suite> {
        Suite::ALL.into_iter().find(|s| s.id() == id.trim())
    }

    pub fn cases(self) -> Vec<TestCase> {
        match self {
            Suite::LengthEncoding => length_encoding_cases(),
            Suite::TypeEncoding => type_encoding_cases(),
            Suite::ValueEncoding => value_encoding_cases(),
            Suite::MessageId => message_id_cases(),
            Suite::ProtocolOp => protocol_op_cases(),
            Suite::Controls => controls_cases(),
        }
    }
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id(), self.name())
    }
}

/// Ordered selection of suites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    suites: Vec<Suite>,
}

impl Catalog {
    /// Every suite of the given sections, in declaration order.
    pub fn for_sections(sections: &[Section]) -> Self {
        Catalog { suites: Suite::ALL.into_iter().filter(|s| sections.contains(&s.section())).collect() }
    }

    pub fn all() -> Self {
        Catalog::for_sections(&Section::ALL)
    }

    /// Selected suites, sorted into declaration order and deduplicated.
    pub fn from_suites(suites: impl IntoIterator<Item = Suite>) -> Self {
        let mut suites: Vec<Suite> = suites.into_iter().collect();
        suites.sort();
        suites.dedup();
        Catalog { suites }
    }

    pub fn suites(&self) -> &[Suite] {
        &self.suites
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }

    /// All cases of all selected suites, flattened in order.
    pub fn cases(&self) -> Vec<TestCase> {
        self.suites.iter().flat_map(|s| s.cases()).collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::all()
    }
}

fn bind_envelope(message_id: i64, op: impl Into<ProtocolOp>) -> Vec<u8> {
    Envelope::new(message_id, op).encode()
}

fn named_bind() -> BindRequest {
    BindRequest::simple(TEST_DN, TEST_PASSWORD)
}

fn length_encoding_cases() -> Vec<TestCase> {
    let anonymous = BindRequest::anonymous();
    vec![
        TestCase::new(
            "1.1.1.1",
            "Indefinite Length Encoding",
            "Send indefinite length encoding (0x80) - should be rejected per RFC 4511",
            indefinite_length(),
            "protocolError (2) or connection close",
        ),
        TestCase::new(
            "1.1.1.2",
            "Length Too Short",
            "Send length value shorter than actual data",
            bind_envelope(1, named_bind().to_element().with_length(Length::Malformed(LengthFault::TooShort))),
            "protocolError (2) or connection close",
        ),
        TestCase::new(
            "1.1.1.3",
            "Length Too Long",
            "Send length value longer than actual data",
            bind_envelope(1, anonymous.to_element().with_length(Length::Malformed(LengthFault::TooLong))),
            "protocolError (2) or connection close",
        ),
        TestCase::new(
            "1.1.1.4",
            "MaxInt Length (2147483647)",
            "Send length equal to maxInt (2^31-1)",
            Envelope::new(1, anonymous.clone()).encode_with_length(Length::Malformed(LengthFault::MaxInt32)),
            "protocolError (2), busy (51), or connection close",
        ),
        TestCase::new(
            "1.1.1.5",
            "32-bit Integer Overflow",
            "Send length 0xFFFFFFFF to trigger potential overflow",
            Envelope::new(1, anonymous.clone()).encode_with_length(Length::Malformed(LengthFault::Overflow32)),
            "protocolError (2) or connection close",
        ),
        TestCase::new(
            "1.1.1.6",
            "Length Beyond Packet Boundary",
            "Send huge length value (64-bit) beyond any reasonable packet",
            Envelope::new(1, anonymous).encode_with_length(Length::Malformed(LengthFault::BeyondPacket64)),
            "protocolError (2) or connection close",
        ),
    ]
}

/// Envelope and bind both use the indefinite form, each closed by end-of-contents.
fn indefinite_length() -> Vec<u8> {
    let mut content = BindRequest::anonymous().to_element().content;
    content.extend_from_slice(&END_OF_CONTENTS);
    let bind = Element::new(Tag::application(op::BIND_REQUEST, true), content)
        .with_length(Length::Malformed(LengthFault::Indefinite));
    let mut packet = Envelope::new(1, bind).encode_with_length(Length::Malformed(LengthFault::Indefinite));
    packet.extend_from_slice(&END_OF_CONTENTS);
    packet
}

fn type_encoding_cases() -> Vec<TestCase> {
    let invalid_tag = malform::with_tag_fault(&codec::octet_string(b"AAAAA"), TagFault::InvalidNumber);

    let constructed_name = codec::application_constructed(
        op::BIND_REQUEST,
        &[
            codec::integer(3),
            malform::constructed_octet_string(TEST_DN.as_bytes()),
            codec::context_primitive(0, TEST_PASSWORD),
        ],
    );

    let primitive_sequence = codec::application_constructed(
        op::BIND_REQUEST,
        &[malform::primitive_sequence(&BindRequest::anonymous().fields())],
    );

    let unknown_application =
        Element::with_children(Tag::application(UNKNOWN_APPLICATION_TAG, true), &[codec::integer(12345)]);

    let unknown_context = codec::application_constructed(
        op::BIND_REQUEST,
        &[codec::integer(3), codec::octet_string(b""), codec::context_primitive(99, TEST_PASSWORD)],
    );

    vec![
        TestCase::new(
            "1.1.2.1",
            "Invalid Tag Number",
            "Send message with invalid/reserved tag number (0xFF)",
            Envelope::new(1, ProtocolOp::Raw(invalid_tag)).encode(),
            "protocolError (2) or connection close",
        ),
        TestCase::new(
            "1.1.2.2",
            "Constructed OCTET STRING",
            "Use constructed encoding for primitive type (OCTET STRING)",
            bind_envelope(1, constructed_name),
            "protocolError (2) or connection close",
        ),
        TestCase::new(
            "1.1.2.3",
            "Primitive SEQUENCE",
            "Use primitive encoding for constructed type (SEQUENCE)",
            bind_envelope(1, primitive_sequence),
            "protocolError (2) or connection close",
        ),
        TestCase::new(
            "1.1.2.4",
            "Unrecognized APPLICATION Tag",
            "Send unrecognized APPLICATION tag (e.g., 99)",
            bind_envelope(1, unknown_application),
            "protocolError (2) or connection close",
        ),
        TestCase::new(
            "1.1.2.5",
            "Unknown Context Tag",
            "Send unknown context-specific tag in BindRequest",
            bind_envelope(1, unknown_context),
            "protocolError (2) or connection close",
        ),
    ]
}

/// Search request fields with one field replaced.
fn search_with_field(index: usize, element: Element) -> Element {
    let mut fields = SearchRequest::default().fields();
    fields[index] = element;
    codec::application_constructed(op::SEARCH_REQUEST, &fields)
}

fn value_encoding_cases() -> Vec<TestCase> {
    let anonymous = BindRequest::anonymous();
    let with_message_id = |fault: IntegerFault| {
        Envelope::new(1, anonymous.clone()).with_message_id(&fault.element(1)).encode()
    };

    vec![
        TestCase::new(
            "1.1.3.1",
            "Invalid BOOLEAN Value",
            "Send BOOLEAN with value other than 0x00 or 0xFF (e.g., 0x42)",
            Envelope::new(1, search_with_field(SearchRequest::TYPES_ONLY_FIELD, malform::boolean_with_octet(0x42)))
                .encode(),
            "protocolError (2) or connection close",
        ),
        TestCase::new(
            "1.1.3.2",
            "INTEGER with Leading Zeros",
            "Send INTEGER with unnecessary leading zero bytes",
            with_message_id(IntegerFault::LeadingZeros),
            "protocolError (2) or accept (lenient)",
        ),
        TestCase::new(
            "1.1.3.3",
            "Empty INTEGER",
            "Send INTEGER with zero-length value",
            with_message_id(IntegerFault::Empty),
            "protocolError (2) or connection close",
        ),
        TestCase::new(
            "1.1.3.4",
            "Out-of-range ENUMERATED",
            "Send ENUMERATED with value outside valid range for scope",
            Envelope::new(1, search_with_field(SearchRequest::SCOPE_FIELD, malform::enumerated_out_of_range()))
                .encode(),
            "protocolError (2) or specific error for invalid scope",
        ),
        TestCase::new(
            "1.1.3.5",
            "Oversized INTEGER",
            "Send INTEGER with unnecessarily many bytes",
            with_message_id(IntegerFault::TooManyOctets),
            "protocolError (2) or accept (lenient)",
        ),
    ]
}

fn message_id_cases() -> Vec<TestCase> {
    let anonymous = BindRequest::anonymous();
    let with_raw_id = |content: Vec<u8>| {
        Envelope::new(1, anonymous.clone())
            .with_message_id(&malform::integer_with_content(content))
            .encode()
    };

    vec![
        TestCase::new(
            "2.1.1.1",
            "MessageID Zero (Reserved)",
            "Send request with messageID=0 (reserved for server unsolicited notifications)",
            bind_envelope(0, anonymous.clone()),
            "protocolError (2) or accept (some servers may allow)",
        ),
        TestCase::multi(
            "2.1.1.2",
            "Duplicate MessageIDs",
            "Send two requests with the same messageID on one connection (bind, then search)",
            vec![bind_envelope(42, anonymous.clone()), bind_envelope(42, SearchRequest::default())],
            "Server should handle gracefully, may reject or process both",
        ),
        TestCase::new(
            "2.1.1.3",
            "MessageID Greater Than MaxInt",
            "Send messageID > 2147483647 (maxInt)",
            bind_envelope(0xFFFF_FFFF, anonymous.clone()),
            "protocolError (2) or connection close",
        ),
        TestCase::new(
            "2.1.1.4",
            "Negative MessageID",
            "Send negative messageID value",
            bind_envelope(-1, anonymous.clone()),
            "protocolError (2) or connection close",
        ),
        TestCase::new(
            "2.1.1.5",
            "Extremely Large MessageID (64-bit)",
            "Send messageID as 64-bit value (0xFFFFFFFFFFFFFFFF)",
            with_raw_id(vec![0xFF; 8]),
            "protocolError (2) or connection close",
        ),
        TestCase::new(
            "2.1.1.6",
            "MessageID with Leading Zeros",
            "Send messageID with unnecessary leading zero bytes",
            with_raw_id(vec![0x00, 0x00, 0x00, 0x01]),
            "protocolError (2) or accept (lenient)",
        ),
    ]
}

fn protocol_op_cases() -> Vec<TestCase> {
    let unknown_op = Element::new(Tag::application(UNKNOWN_APPLICATION_TAG, true), b"test data".to_vec());

    let mut two_ops = BindRequest::anonymous().to_element().encode();
    two_ops.extend(SearchRequest::default().to_element().encode());

    let bind_response = codec::application_constructed(
        op::BIND_RESPONSE,
        &[codec::enumerated(0), codec::octet_string(b""), codec::octet_string(b"")],
    );

    vec![
        TestCase::new(
            "2.1.2.1",
            "Unrecognized ProtocolOp Tag",
            "Send message with invalid APPLICATION tag (e.g., 99)",
            bind_envelope(1, unknown_op),
            "protocolError (2)",
        ),
        TestCase::new(
            "2.1.2.2",
            "Missing ProtocolOp Field",
            "Send LDAP message with messageID but no protocolOp",
            Envelope::new(1, ProtocolOp::Raw(Vec::new())).encode(),
            "protocolError (2) or connection close",
        ),
        TestCase::new(
            "2.1.2.3",
            "Multiple ProtocolOp Fields",
            "Send message with two protocolOp choices (e.g., BindRequest + SearchRequest)",
            Envelope::new(1, ProtocolOp::Raw(two_ops)).encode(),
            "protocolError (2)",
        ),
        TestCase::new(
            "2.1.2.4",
            "Empty ProtocolOp",
            "Send protocolOp with zero-length content",
            bind_envelope(1, Element::new(Tag::application(op::BIND_REQUEST, true), Vec::new())),
            "protocolError (2)",
        ),
        TestCase::new(
            "2.1.2.5",
            "Response Operation As Request",
            "Send BindResponse (APPLICATION 1) from client instead of BindRequest",
            bind_envelope(1, bind_response),
            "protocolError (2) or ignore",
        ),
    ]
}

fn controls_cases() -> Vec<TestCase> {
    let bind = || Envelope::new(1, BindRequest::anonymous());

    let malformed_control = Element::new(Tag::context(0, true), vec![0x30, 0x05, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);

    let invalid_criticality = codec::context_constructed(
        0,
        &[codec::sequence(&[codec::octet_string(b"1.2.3.4"), malform::boolean_with_octet(0x42)])],
    );

    let mut oversized = codec::octet_string(b"1.2.3.4").encode();
    oversized.extend(codec::boolean(false).encode());
    oversized.extend(Tag::OCTET_STRING.encode());
    oversized.extend(malform::long_form_u32(OVERSIZED_CONTROL_DECLARED));
    oversized.extend(vec![b'A'; OVERSIZED_CONTROL_SENT]);
    let oversized = codec::context_constructed(0, &[Element::new(Tag::SEQUENCE, oversized)]);

    let sort = Control::new(oid::SERVER_SIDE_SORT).critical(true);

    vec![
        TestCase::new(
            "2.1.3.1",
            "Malformed Control Structure",
            "Send control with invalid BER structure",
            bind().with_controls_bytes(malformed_control.encode()).encode(),
            "protocolError (2)",
        ),
        TestCase::new(
            "2.1.3.2",
            "Unrecognized Control Type OID",
            "Send control with unrecognized/invalid OID",
            bind().with_controls(&[Control::new("9.9.9.9.9").critical(true)]).encode(),
            "unavailableCriticalExtension (12) if critical, or accept if non-critical",
        ),
        TestCase::new(
            "2.1.3.3",
            "Invalid Criticality Value",
            "Send control with invalid criticality value (not TRUE/FALSE)",
            bind().with_controls_bytes(invalid_criticality.encode()).encode(),
            "protocolError (2)",
        ),
        TestCase::new(
            "2.1.3.4",
            "Missing Required ControlValue",
            "Send known control type without required controlValue",
            bind().with_controls(&[Control::new(oid::PAGED_RESULTS).critical(true)]).encode(),
            "unavailableCriticalExtension (12) or protocolError (2)",
        ),
        TestCase::new(
            "2.1.3.5",
            "Oversized ControlValue",
            "Send control with extremely large controlValue field",
            bind().with_controls_bytes(oversized.encode()).encode(),
            "sizeLimitExceeded (4) or protocolError (2)",
        ),
        TestCase::new(
            "2.1.3.6",
            "Multiple Conflicting Controls",
            "Send multiple controls with conflicting semantics",
            Envelope::new(1, SearchRequest::default()).with_controls(&[sort.clone(), sort]).encode(),
            "unavailableCriticalExtension (12) or accept one",
        ),
        TestCase::new(
            "2.1.3.7",
            "Controls on UnbindRequest",
            "Send UnbindRequest with controls (should be rejected per RFC)",
            Envelope::new(1, ProtocolOp::Unbind).with_controls(&[Control::new("1.2.3.4")]).encode(),
            "Server should ignore (Unbind has no response) or close connection",
        ),
    ]
}
