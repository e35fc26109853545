//! Test catalog: suite selection, case identity and the exact bytes of
//! representative malformed payloads.

use ldapprobe::catalog::{Catalog, Section, Suite, TestCase};
use ldapprobe::config::parse_suites;
use std::collections::HashSet;

fn case(id: &str) -> TestCase {
    Catalog::all().cases().into_iter().find(|c| c.id == id).expect("case id")
}

fn payload(id: &str) -> Vec<u8> {
    let case = case(id);
    assert_eq!(case.payloads.len(), 1, "{} is single-payload", id);
    case.payloads.into_iter().next().expect("payload")
}

#[test]
fn test_catalog_shape() {
    let per_suite: Vec<usize> = Suite::ALL.iter().map(|s| s.cases().len()).collect();
    assert_eq!(per_suite, vec![6, 5, 5, 6, 5, 7]);
    assert_eq!(Catalog::all().cases().len(), 34);
    assert_eq!(Catalog::for_sections(&[Section::Encoding]).cases().len(), 16);
    assert_eq!(Catalog::for_sections(&[Section::Envelope]).cases().len(), 18);
}

#[test]
fn test_ids_are_unique_and_prefixed() {
    let mut seen = HashSet::new();
    for suite in Suite::ALL {
        for c in suite.cases() {
            assert!(c.id.starts_with(&format!("{}.", suite.id())), "{} in {}", c.id, suite);
            assert!(seen.insert(c.id.clone()), "duplicate {}", c.id);
            assert!(!c.payloads.is_empty() && c.payloads.iter().all(|p| !p.is_empty()), "{}", c.id);
            assert!(!c.name.is_empty() && !c.expected.is_empty());
        }
    }
}

#[test]
fn test_generation_is_deterministic() {
    assert_eq!(Catalog::all().cases(), Catalog::all().cases());
}

#[test]
fn test_suite_lookup_and_display() {
    assert_eq!(Suite::from_id("2.1.3"), Some(Suite::Controls));
    assert_eq!(Suite::from_id(" 1.1.1 "), Some(Suite::LengthEncoding));
    assert_eq!(Suite::from_id("9.9.9"), None);
    assert_eq!(Suite::LengthEncoding.to_string(), "1.1.1 Length Encoding Attacks");
    assert_eq!(Section::from_number(2), Some(Section::Envelope));
    assert_eq!(Section::from_number(3), None);
}

#[test]
fn test_catalog_selection_order() {
    let catalog = Catalog::from_suites([Suite::Controls, Suite::LengthEncoding, Suite::Controls]);
    assert_eq!(catalog.suites(), &[Suite::LengthEncoding, Suite::Controls]);
    assert_eq!(catalog.cases()[0].id, "1.1.1.1");
    assert!(Catalog::from_suites(Vec::<Suite>::new()).is_empty());
    assert_eq!(parse_suites("1").expect("section").suites().len(), 3);
}

#[test]
fn test_indefinite_length_payload() {
    assert_eq!(
        payload("1.1.1.1"),
        vec![
            0x30, 0x80, 0x02, 0x01, 0x01, 0x60, 0x80, 0x02, 0x01, 0x03, 0x04, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00
        ]
    );
}

#[test]
fn test_short_and_long_bind_lengths() {
    let short = payload("1.1.1.2");
    assert_eq!(&short[..7], &[0x30, 0x2D, 0x02, 0x01, 0x01, 0x60, 0x14]);
    assert_eq!(short.len(), 47);

    let long = payload("1.1.1.3");
    assert_eq!(&long[..9], &[0x30, 0x0E, 0x02, 0x01, 0x01, 0x60, 0x82, 0x03, 0xEF]);
    assert_eq!(long.len(), 16);
}

#[test]
fn test_outer_length_faults() {
    let bind: [u8; 12] = [0x02, 0x01, 0x01, 0x60, 0x07, 0x02, 0x01, 0x03, 0x04, 0x00, 0x80, 0x00];
    let max_int = payload("1.1.1.4");
    assert_eq!(&max_int[..6], &[0x30, 0x84, 0x7F, 0xFF, 0xFF, 0xFF]);
    assert_eq!(&max_int[6..], &bind);

    let overflow = payload("1.1.1.5");
    assert_eq!(&overflow[..6], &[0x30, 0x84, 0xFF, 0xFF, 0xFF, 0xFF]);

    let beyond = payload("1.1.1.6");
    assert_eq!(beyond[1], 0x88);
    assert!(beyond[2..10].iter().all(|&b| b == 0xFF));
    assert_eq!(&beyond[10..], &bind);
}

#[test]
fn test_type_encoding_payloads() {
    assert_eq!(
        payload("1.1.2.1"),
        vec![0x30, 0x0A, 0x02, 0x01, 0x01, 0xFF, 0x05, b'A', b'A', b'A', b'A', b'A']
    );
    let constructed = payload("1.1.2.2");
    assert_eq!(constructed[10], 0x24);
    let primitive = payload("1.1.2.3");
    assert_eq!(&primitive[5..9], &[0x60, 0x09, 0x10, 0x07]);
    let unknown = payload("1.1.2.4");
    assert_eq!(&unknown[5..8], &[0x7F, 0x63, 0x04]);
    let context = payload("1.1.2.5");
    assert_eq!(&context[12..14], &[0x9F, 0x63]);
}

#[test]
fn test_value_encoding_payloads() {
    let boolean = payload("1.1.3.1");
    assert!(boolean.windows(3).any(|w| w == [0x01, 0x01, 0x42]));
    let empty = payload("1.1.3.3");
    assert_eq!(&empty[..4], &[0x30, 0x0B, 0x02, 0x00]);
    let scope = payload("1.1.3.4");
    assert!(scope.windows(5).any(|w| w == [0x0A, 0x03, 0x0F, 0x42, 0x3F]));
}

#[test]
fn test_message_id_payloads() {
    assert_eq!(&payload("2.1.1.1")[2..5], &[0x02, 0x01, 0x00]);
    assert_eq!(&payload("2.1.1.3")[..9], &[0x30, 0x10, 0x02, 0x05, 0x00, 0xFF, 0xFF, 0xFF, 0xFF]);
    assert_eq!(&payload("2.1.1.4")[2..5], &[0x02, 0x01, 0xFF]);
    let wide = payload("2.1.1.5");
    assert_eq!(&wide[2..4], &[0x02, 0x08]);
    assert!(wide[4..12].iter().all(|&b| b == 0xFF));
    assert_eq!(&payload("2.1.1.6")[2..8], &[0x02, 0x04, 0x00, 0x00, 0x00, 0x01]);
}

#[test]
fn test_duplicate_message_id_case_has_two_payloads() {
    let dup = case("2.1.1.2");
    assert!(dup.is_multi_payload());
    assert_eq!(dup.payloads.len(), 2);
    for p in &dup.payloads {
        assert_eq!(&p[2..5], &[0x02, 0x01, 0x2A]);
    }
    assert_eq!(dup.payloads[0][5], 0x60);
    assert_eq!(dup.payloads[1][5], 0x63);
}

#[test]
fn test_protocol_op_payloads() {
    assert_eq!(&payload("2.1.2.1")[5..7], &[0x7F, 0x63]);
    assert_eq!(payload("2.1.2.2"), vec![0x30, 0x03, 0x02, 0x01, 0x01]);
    let two = payload("2.1.2.3");
    assert_eq!(two[5], 0x60);
    assert_eq!(two[14], 0x63);
    assert_eq!(payload("2.1.2.4"), vec![0x30, 0x05, 0x02, 0x01, 0x01, 0x60, 0x00]);
    assert_eq!(&payload("2.1.2.5")[5..9], &[0x61, 0x07, 0x0A, 0x01]);
}

#[test]
fn test_control_payloads() {
    let malformed = payload("2.1.3.1");
    assert_eq!(&malformed[14..], &[0xA0, 0x07, 0x30, 0x05, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);

    let oversized = payload("2.1.3.5");
    assert_eq!(&oversized[..4], &[0x30, 0x82, 0x04, 0x0E]);
    assert_eq!(oversized.len(), 4 + 0x040E);
    assert!(oversized.windows(6).any(|w| w == [0x04, 0x84, 0x00, 0x10, 0x00, 0x00]));

    let unbind = payload("2.1.3.7");
    assert_eq!(&unbind[..7], &[0x30, 0x12, 0x02, 0x01, 0x01, 0x42, 0x00]);
    assert_eq!(&unbind[7..9], &[0xA0, 0x0B]);
}

#[test]
fn test_relabel_keeps_payloads() {
    let base = case("1.1.1.1");
    let copy = base.relabel("1.1.1.1.iter2", "Indefinite Length Encoding (Iteration 2)");
    assert_eq!(copy.payloads, base.payloads);
    assert_eq!(copy.expected, base.expected);
    assert_eq!(copy.id, "1.1.1.1.iter2");
}
