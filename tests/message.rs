//! LDAP message model tests: request encodings, controls, the envelope and filters.

use ldapprobe::codec::{self, Length};
use ldapprobe::filter::{self, FilterError};
use ldapprobe::malform::{IntegerFault, LengthFault};
use ldapprobe::message::{oid, op, BindRequest, Control, Envelope, ExtendedRequest, ProtocolOp, SearchRequest};
use ldapprobe::Filter;

fn concat(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}

#[test]
fn test_anonymous_bind_envelope() {
    let bytes = Envelope::new(1, BindRequest::anonymous()).encode();
    assert_eq!(bytes, vec![0x30, 0x0c, 0x02, 0x01, 0x01, 0x60, 0x07, 0x02, 0x01, 0x03, 0x04, 0x00, 0x80, 0x00]);
}

#[test]
fn test_simple_bind_with_credentials() {
    let bind = BindRequest::simple("cn=test,dc=example,dc=com", b"password".to_vec());
    let bytes = Envelope::new(1, bind).encode();
    let expected = concat(&[
        &[0x30, 0x2D, 0x02, 0x01, 0x01, 0x60, 0x28, 0x02, 0x01, 0x03, 0x04, 0x19],
        b"cn=test,dc=example,dc=com",
        &[0x80, 0x08],
        b"password",
    ]);
    assert_eq!(bytes, expected);
}

#[test]
fn test_bind_version_override() {
    let bytes = BindRequest::anonymous().with_version(2).to_element().encode();
    assert_eq!(bytes, vec![0x60, 0x07, 0x02, 0x01, 0x02, 0x04, 0x00, 0x80, 0x00]);
}

#[test]
fn test_sasl_bind() {
    let without = BindRequest::sasl("", "EXTERNAL", None).to_element().encode();
    assert_eq!(without, concat(&[&[0x60, 0x11, 0x02, 0x01, 0x03, 0x04, 0x00, 0xA3, 0x0A, 0x04, 0x08], b"EXTERNAL"]));

    let with = BindRequest::sasl("", "EXTERNAL", Some(b"x".to_vec())).to_element().encode();
    assert_eq!(
        with,
        concat(&[&[0x60, 0x14, 0x02, 0x01, 0x03, 0x04, 0x00, 0xA3, 0x0D, 0x04, 0x08], b"EXTERNAL", &[0x04, 0x01, b'x']])
    );
}

#[test]
fn test_default_search_request() {
    let bytes = Envelope::new(2, SearchRequest::default()).encode();
    let expected = concat(&[
        &[0x30, 0x25, 0x02, 0x01, 0x02, 0x63, 0x20],
        &[0x04, 0x00],
        &[0x0A, 0x01, 0x00],
        &[0x0A, 0x01, 0x00],
        &[0x02, 0x01, 0x00],
        &[0x02, 0x01, 0x00],
        &[0x01, 0x01, 0x00],
        &[0x87, 0x0B],
        b"objectClass",
        &[0x30, 0x00],
    ]);
    assert_eq!(bytes, expected);
}

#[test]
fn test_search_fields_are_indexed() {
    let fields = SearchRequest::default().fields();
    assert_eq!(fields.len(), 8);
    assert_eq!(fields[SearchRequest::SCOPE_FIELD].tag, codec::Tag::ENUMERATED);
    assert_eq!(fields[SearchRequest::TYPES_ONLY_FIELD].tag, codec::Tag::BOOLEAN);
}

#[test]
fn test_search_with_attributes_and_filter() {
    let req = SearchRequest::new("dc=example,dc=com")
        .with_filter_str("(cn=*)")
        .expect("filter")
        .with_attributes(["cn", "mail"]);
    assert_eq!(req.filter, Filter::present("cn"));
    let fields = req.fields();
    assert_eq!(fields[6].encode(), vec![0x87, 0x02, b'c', b'n']);
    assert_eq!(fields[7].encode(), concat(&[&[0x30, 0x0A, 0x04, 0x02], b"cn", &[0x04, 0x04], b"mail"]));
}

#[test]
fn test_unbind_and_abandon() {
    assert_eq!(Envelope::new(3, ProtocolOp::Unbind).encode(), vec![0x30, 0x05, 0x02, 0x01, 0x03, 0x42, 0x00]);
    assert_eq!(ProtocolOp::Abandon(5).encode(), vec![0x50, 0x01, 0x05]);
    assert_eq!(ProtocolOp::Abandon(300).encode(), vec![0x50, 0x02, 0x01, 0x2C]);
}

#[test]
fn test_extended_request() {
    let bytes = ExtendedRequest::new(oid::START_TLS).to_element().encode();
    assert_eq!(bytes, concat(&[&[0x77, 0x18, 0x80, 0x16], oid::START_TLS.as_bytes()]));

    let with_value = ExtendedRequest::new("1.2.3").with_value(b"v".to_vec()).to_element().encode();
    assert_eq!(with_value, vec![0x77, 0x0A, 0x80, 0x05, b'1', b'.', b'2', b'.', b'3', 0x81, 0x01, b'v']);
}

#[test]
fn test_controls() {
    let plain = Control::new("1.2.3.4").to_element().encode();
    assert_eq!(plain, concat(&[&[0x30, 0x09, 0x04, 0x07], b"1.2.3.4"]));

    let critical = Control::new("1.2.3.4").critical(true).with_value(b"v".to_vec()).to_element().encode();
    assert_eq!(critical, concat(&[&[0x30, 0x0F, 0x04, 0x07], b"1.2.3.4", &[0x01, 0x01, 0xFF, 0x04, 0x01, b'v']]));

    let bytes = Envelope::new(1, BindRequest::anonymous()).with_controls(&[Control::new("1.2.3.4")]).encode();
    assert_eq!(bytes[1] as usize, bytes.len() - 2);
    assert_eq!(&bytes[14..18], &[0xA0, 0x0B, 0x30, 0x09]);
}

#[test]
fn test_envelope_overrides() {
    let base = Envelope::new(1, BindRequest::anonymous());
    let bytes = base.clone().with_message_id(&IntegerFault::Empty.element(1)).encode();
    assert_eq!(&bytes[..4], &[0x30, 0x0B, 0x02, 0x00]);

    let raw = base.clone().with_message_id_bytes(vec![0x02, 0x01, 0x07]).with_op_bytes(Vec::new()).encode();
    assert_eq!(raw, vec![0x30, 0x03, 0x02, 0x01, 0x07]);

    let search = base.with_op(SearchRequest::default());
    assert_eq!(search.op[0], 0x63);
}

#[test]
fn test_envelope_with_malformed_outer_length() {
    let env = Envelope::new(1, BindRequest::anonymous());
    assert_eq!(env.content_len(), 12);
    let bytes = env.encode_with_length(Length::Malformed(LengthFault::TooLong));
    assert_eq!(&bytes[..4], &[0x30, 0x82, 0x03, 0xF4]);
    assert_eq!(bytes.len(), 4 + 12);
    let bytes = env.encode_with_length(Length::Definite(3));
    assert_eq!(&bytes[..2], &[0x30, 0x03]);
}

#[test]
fn test_operation_names() {
    assert_eq!(op::name(op::BIND_REQUEST), Some("bindRequest"));
    assert_eq!(op::name(op::EXTENDED_RESPONSE), Some("extendedResp"));
    assert_eq!(op::name(99), None);
}

#[test]
fn test_filter_parsing() {
    assert_eq!("(objectClass=*)".parse::<Filter>().expect("parse"), Filter::present("objectClass"));
    assert_eq!(filter::parse(" (mail=*) ").expect("parse").attribute(), "mail");
    assert!(matches!(filter::parse("(cn>=a)"), Err(FilterError::Unsupported(_))));
    assert!(matches!(filter::parse("(cn=*"), Err(FilterError::Parse(_))));
}
