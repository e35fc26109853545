//! LDAPv3 message model (RFC 4511) on top of the BER codec.
//!
//! Requests are plain structs that know how to produce their [`Element`]. The
//! [`Envelope`] holds each part as encoded bytes rather than elements so that
//! test cases can substitute any part with arbitrary octets (a reserved tag
//! octet, two operations, nothing at all) and still get a correct outer length.

use crate::codec::{self, Element, Length, Tag};
use crate::filter::{self, Filter, FilterError};

/// Application tag numbers of protocol operations.
pub mod op {
    pub const BIND_REQUEST: u32 = 0;
    pub const BIND_RESPONSE: u32 = 1;
    pub const UNBIND_REQUEST: u32 = 2;
    pub const SEARCH_REQUEST: u32 = 3;
    pub const SEARCH_RESULT_ENTRY: u32 = 4;
    pub const SEARCH_RESULT_DONE: u32 = 5;
    pub const MODIFY_REQUEST: u32 = 6;
    pub const MODIFY_RESPONSE: u32 = 7;
    pub const ADD_REQUEST: u32 = 8;
    pub const ADD_RESPONSE: u32 = 9;
    pub const DEL_REQUEST: u32 = 10;
    pub const DEL_RESPONSE: u32 = 11;
    pub const MOD_DN_REQUEST: u32 = 12;
    pub const MOD_DN_RESPONSE: u32 = 13;
    pub const COMPARE_REQUEST: u32 = 14;
    pub const COMPARE_RESPONSE: u32 = 15;
    pub const ABANDON_REQUEST: u32 = 16;
    pub const SEARCH_RESULT_REFERENCE: u32 = 19;
    pub const EXTENDED_REQUEST: u32 = 23;
    pub const EXTENDED_RESPONSE: u32 = 24;
    pub const INTERMEDIATE_RESPONSE: u32 = 25;

    /// Operations whose body is an `LDAPResult` (result code first).
    pub fn carries_result(number: u32) -> bool {
        matches!(
            number,
            BIND_RESPONSE
                | SEARCH_RESULT_DONE
                | MODIFY_RESPONSE
                | ADD_RESPONSE
                | DEL_RESPONSE
                | MOD_DN_RESPONSE
                | COMPARE_RESPONSE
                | EXTENDED_RESPONSE
        )
    }

    pub fn name(number: u32) -> Option<&'static str> {
        Some(match number {
            BIND_REQUEST => "bindRequest",
            BIND_RESPONSE => "bindResponse",
            UNBIND_REQUEST => "unbindRequest",
            SEARCH_REQUEST => "searchRequest",
            SEARCH_RESULT_ENTRY => "searchResEntry",
            SEARCH_RESULT_DONE => "searchResDone",
            MODIFY_REQUEST => "modifyRequest",
            MODIFY_RESPONSE => "modifyResponse",
            ADD_REQUEST => "addRequest",
            ADD_RESPONSE => "addResponse",
            DEL_REQUEST => "delRequest",
            DEL_RESPONSE => "delResponse",
            MOD_DN_REQUEST => "modDNRequest",
            MOD_DN_RESPONSE => "modDNResponse",
            COMPARE_REQUEST => "compareRequest",
            COMPARE_RESPONSE => "compareResponse",
            ABANDON_REQUEST => "abandonRequest",
            SEARCH_RESULT_REFERENCE => "searchResRef",
            EXTENDED_REQUEST => "extendedReq",
            EXTENDED_RESPONSE => "extendedResp",
            INTERMEDIATE_RESPONSE => "intermediateResponse",
            _ => return None,
        })
    }
}

/// Object identifiers of extended operations and controls.
pub mod oid {
    pub const START_TLS: &str = "1.3.6.1.4.1.1466.20037";
    pub const MODIFY_PASSWORD: &str = "1.3.6.1.4.1.4203.1.11.1";
    pub const WHO_AM_I: &str = "1.3.6.1.4.1.4203.1.11.3";
    pub const PAGED_RESULTS: &str = "1.2.840.113556.1.4.319";
    pub const SERVER_SIDE_SORT: &str = "1.2.840.113556.1.4.473";
}

pub const PROTOCOL_VERSION: i64 = 3;
pub const MAX_MESSAGE_ID: i64 = 2_147_483_647;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    /// `[0]` primitive password.
    Simple(Vec<u8>),
    /// `[3]` constructed `SaslCredentials`.
    Sasl { mechanism: String, credentials: Option<Vec<u8>> },
}

impl Authentication {
    pub fn to_element(&self) -> Element {
        match self {
            Authentication::Simple(password) => codec::context_primitive(0, password),
            Authentication::Sasl { mechanism, credentials } => {
                let mut parts = vec![codec::octet_string(mechanism)];
                if let Some(credentials) = credentials {
                    parts.push(codec::octet_string(credentials));
                }
                codec::context_constructed(3, &parts)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindRequest {
    pub version: i64,
    pub name: String,
    pub authentication: Authentication,
}

impl BindRequest {
    pub fn simple(name: impl Into<String>, password: impl Into<Vec<u8>>) -> Self {
        BindRequest {
            version: PROTOCOL_VERSION,
            name: name.into(),
            authentication: Authentication::Simple(password.into()),
        }
    }

    pub fn anonymous() -> Self {
        BindRequest::simple("", Vec::new())
    }

    pub fn sasl(name: impl Into<String>, mechanism: impl Into<String>, credentials: Option<Vec<u8>>) -> Self {
        BindRequest {
            version: PROTOCOL_VERSION,
            name: name.into(),
            authentication: Authentication::Sasl { mechanism: mechanism.into(), credentials },
        }
    }

    pub fn with_version(self, version: i64) -> Self {
        BindRequest { version, ..self }
    }

    pub fn fields(&self) -> Vec<Element> {
        vec![
            codec::integer(self.version),
            codec::octet_string(&self.name),
            self.authentication.to_element(),
        ]
    }

    pub fn to_element(&self) -> Element {
        codec::application_constructed(op::BIND_REQUEST, &self.fields())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    BaseObject = 0,
    SingleLevel = 1,
    WholeSubtree = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerefAliases {
    Never = 0,
    InSearching = 1,
    FindingBaseObj = 2,
    Always = 3,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub base_dn: String,
    pub scope: SearchScope,
    pub deref_aliases: DerefAliases,
    pub size_limit: i64,
    pub time_limit: i64,
    pub types_only: bool,
    pub filter: Filter,
    pub attributes: Vec<String>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        SearchRequest {
            base_dn: String::new(),
            scope: SearchScope::BaseObject,
            deref_aliases: DerefAliases::Never,
            size_limit: 0,
            time_limit: 0,
            types_only: false,
            filter: Filter::present("objectClass"),
            attributes: Vec::new(),
        }
    }
}

impl SearchRequest {
    /// Index of `scope` in [`SearchRequest::fields`].
    pub const SCOPE_FIELD: usize = 1;
    /// Index of `typesOnly` in [`SearchRequest::fields`].
    pub const TYPES_ONLY_FIELD: usize = 5;

    pub fn new(base_dn: impl Into<String>) -> Self {
        SearchRequest { base_dn: base_dn.into(), ..Default::default() }
    }

    pub fn with_filter(self, filter: Filter) -> Self {
        SearchRequest { filter, ..self }
    }

    pub fn with_filter_str(self, source: &str) -> Result<Self, FilterError> {
        Ok(self.with_filter(filter::parse(source)?))
    }

    pub fn with_attributes<S: Into<String>>(self, attributes: impl IntoIterator<Item = S>) -> Self {
        SearchRequest { attributes: attributes.into_iter().map(Into::into).collect(), ..self }
    }

    /// The eight request fields in wire order.
    pub fn fields(&self) -> Vec<Element> {
        let attributes: Vec<Element> = self.attributes.iter().map(codec::octet_string).collect();
        vec![
            codec::octet_string(&self.base_dn),
            codec::enumerated(self.scope as i64),
            codec::enumerated(self.deref_aliases as i64),
            codec::integer(self.size_limit),
            codec::integer(self.time_limit),
            codec::boolean(self.types_only),
            self.filter.to_element(),
            codec::sequence(&attributes),
        ]
    }

    pub fn to_element(&self) -> Element {
        codec::application_constructed(op::SEARCH_REQUEST, &self.fields())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedRequest {
    pub name: String,
    pub value: Option<Vec<u8>>,
}

impl ExtendedRequest {
    pub fn new(name: impl Into<String>) -> Self {
        ExtendedRequest { name: name.into(), value: None }
    }

    pub fn with_value(self, value: impl Into<Vec<u8>>) -> Self {
        ExtendedRequest { value: Some(value.into()), ..self }
    }

    pub fn to_element(&self) -> Element {
        let mut parts = vec![codec::context_primitive(0, self.name.as_bytes())];
        if let Some(value) = &self.value {
            parts.push(codec::context_primitive(1, value));
        }
        codec::application_constructed(op::EXTENDED_REQUEST, &parts)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub control_type: String,
    pub criticality: bool,
    pub value: Option<Vec<u8>>,
}

impl Control {
    pub fn new(control_type: impl Into<String>) -> Self {
        Control { control_type: control_type.into(), criticality: false, value: None }
    }

    pub fn critical(self, criticality: bool) -> Self {
        Control { criticality, ..self }
    }

    pub fn with_value(self, value: impl Into<Vec<u8>>) -> Self {
        Control { value: Some(value.into()), ..self }
    }

    /// Criticality is omitted when false (DEFAULT FALSE).
    pub fn to_element(&self) -> Element {
        let mut parts = vec![codec::octet_string(&self.control_type)];
        if self.criticality {
            parts.push(codec::boolean(true));
        }
        if let Some(value) = &self.value {
            parts.push(codec::octet_string(value));
        }
        codec::sequence(&parts)
    }
}

/// `[0]` constructed holding the control sequences directly.
pub fn controls_element(controls: &[Control]) -> Element {
    let elements: Vec<Element> = controls.iter().map(Control::to_element).collect();
    codec::context_constructed(0, &elements)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolOp {
    Bind(BindRequest),
    Search(SearchRequest),
    Unbind,
    /// Message id of the operation to abandon.
    Abandon(i64),
    Extended(ExtendedRequest),
    /// Any other element, canonical or not.
    Element(Element),
    /// Pre-encoded octets, used verbatim.
    Raw(Vec<u8>),
}

impl ProtocolOp {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            ProtocolOp::Bind(req) => req.to_element().encode(),
            ProtocolOp::Search(req) => req.to_element().encode(),
            ProtocolOp::Unbind => codec::application_primitive(op::UNBIND_REQUEST, b"").encode(),
            ProtocolOp::Abandon(id) => {
                codec::application_primitive(op::ABANDON_REQUEST, codec::integer_content(*id)).encode()
            }
            ProtocolOp::Extended(req) => req.to_element().encode(),
            ProtocolOp::Element(element) => element.encode(),
            ProtocolOp::Raw(bytes) => bytes.clone(),
        }
    }
}

impl From<BindRequest> for ProtocolOp {
    fn from(req: BindRequest) -> Self {
        ProtocolOp::Bind(req)
    }
}

impl From<SearchRequest> for ProtocolOp {
    fn from(req: SearchRequest) -> Self {
        ProtocolOp::Search(req)
    }
}

impl From<ExtendedRequest> for ProtocolOp {
    fn from(req: ExtendedRequest) -> Self {
        ProtocolOp::Extended(req)
    }
}

impl From<Element> for ProtocolOp {
    fn from(element: Element) -> Self {
        ProtocolOp::Element(element)
    }
}

/// `LDAPMessage`: SEQUENCE of message id, protocol operation and optional controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub message_id: Vec<u8>,
    pub op: Vec<u8>,
    pub controls: Option<Vec<u8>>,
}

impl Envelope {
    pub fn new(message_id: i64, op: impl Into<ProtocolOp>) -> Self {
        Envelope {
            message_id: codec::integer(message_id).encode(),
            op: op.into().encode(),
            controls: None,
        }
    }

    pub fn with_message_id(self, element: &Element) -> Self {
        Envelope { message_id: element.encode(), ..self }
    }

    pub fn with_message_id_bytes(self, message_id: impl Into<Vec<u8>>) -> Self {
        Envelope { message_id: message_id.into(), ..self }
    }

    pub fn with_op(self, op: impl Into<ProtocolOp>) -> Self {
        Envelope { op: op.into().encode(), ..self }
    }

    pub fn with_op_bytes(self, op: impl Into<Vec<u8>>) -> Self {
        Envelope { op: op.into(), ..self }
    }

    pub fn with_controls(self, controls: &[Control]) -> Self {
        Envelope { controls: Some(controls_element(controls).encode()), ..self }
    }

    pub fn with_controls_bytes(self, controls: impl Into<Vec<u8>>) -> Self {
        Envelope { controls: Some(controls.into()), ..self }
    }

    fn content(&self) -> Vec<u8> {
        let mut content = self.message_id.clone();
        content.extend_from_slice(&self.op);
        if let Some(controls) = &self.controls {
            content.extend_from_slice(controls);
        }
        content
    }

    /// Outer header is computed from the total size of the parts.
    pub fn encode(&self) -> Vec<u8> {
        self.encode_with_length(Length::Definite(self.content_len()))
    }

    /// Same parts under an arbitrary declared outer length.
    pub fn encode_with_length(&self, length: Length) -> Vec<u8> {
        let content = self.content();
        let mut out = codec::encode_header(Tag::SEQUENCE, length, content.len());
        out.extend(content);
        out
    }

    pub fn content_len(&self) -> usize {
        self.message_id.len() + self.op.len() + self.controls.as_ref().map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abandon_is_primitive_with_integer_content() {
        assert_eq!(ProtocolOp::Abandon(5).encode(), vec![0x50, 0x01, 0x05]);
    }

    #[test]
    fn result_bearing_operations() {
        assert!(op::carries_result(op::BIND_RESPONSE));
        assert!(op::carries_result(op::SEARCH_RESULT_DONE));
        assert!(!op::carries_result(op::SEARCH_RESULT_ENTRY));
        assert!(!op::carries_result(op::INTERMEDIATE_RESPONSE));
    }
}
