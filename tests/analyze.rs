//! Response analyzer tests: result-code extraction from well-formed, lenient and
//! hostile responses.

use ldapprobe::analyze::{self, analyze_response, extract_result_code, AnalysisKind};

const BIND_SUCCESS: [u8; 14] = [0x30, 0x0c, 0x02, 0x01, 0x01, 0x61, 0x07, 0x0a, 0x01, 0x00, 0x04, 0x00, 0x04, 0x00];

fn bind_response(code: u8) -> Vec<u8> {
    let mut bytes = BIND_SUCCESS.to_vec();
    bytes[9] = code;
    bytes
}

#[test]
fn test_success_response() {
    assert_eq!(extract_result_code(&BIND_SUCCESS), Some(0));
    let analysis = analyze_response(Some(&BIND_SUCCESS[..]));
    assert_eq!(analysis.kind, AnalysisKind::Success);
    assert_eq!(analysis.result_code, Some(0));
    assert_eq!(analysis.notes, "success (0)");
}

#[test]
fn test_error_codes() {
    let analysis = analyze_response(Some(bind_response(2).as_slice()));
    assert_eq!(analysis.kind, AnalysisKind::ProtocolError);
    assert_eq!(analysis.result_code, Some(analyze::PROTOCOL_ERROR));

    let analysis = analyze_response(Some(bind_response(49).as_slice()));
    assert_eq!(analysis.kind, AnalysisKind::OtherError);
    assert_eq!(analysis.notes, "invalidCredentials (49)");

    let analysis = analyze_response(Some(bind_response(80).as_slice()));
    assert_eq!(analysis.kind, AnalysisKind::OtherError);
    assert_eq!(analysis.notes, "result code 80");
}

#[test]
fn test_no_response_and_closed() {
    let timeout = analyze_response(None);
    assert_eq!(timeout.kind, AnalysisKind::Timeout);
    assert_eq!(timeout.result_code, None);

    let nothing: &[u8] = &[];
    let closed = analyze_response(Some(nothing));
    assert_eq!(closed.kind, AnalysisKind::ConnectionClosed);
    assert_eq!(closed.result_code, None);
}

#[test]
fn test_unparseable_responses() {
    assert_eq!(extract_result_code(&BIND_SUCCESS[..3]), None);
    assert_eq!(analyze_response(Some(&BIND_SUCCESS[..3])).kind, AnalysisKind::Malformed);
    // not a SEQUENCE
    assert_eq!(extract_result_code(&[0x31, 0x03, 0x02, 0x01, 0x01]), None);
    // message id is not an INTEGER
    assert_eq!(extract_result_code(&[0x30, 0x08, 0x04, 0x01, 0x01, 0x61, 0x03, 0x0a, 0x01, 0x00]), None);
    // protocolOp is not APPLICATION-class
    assert_eq!(extract_result_code(&[0x30, 0x08, 0x02, 0x01, 0x01, 0x30, 0x03, 0x0a, 0x01, 0x00]), None);
    // first field of the operation is not ENUMERATED
    assert_eq!(extract_result_code(&[0x30, 0x08, 0x02, 0x01, 0x01, 0x64, 0x03, 0x04, 0x01, 0x00]), None);
}

#[test]
fn test_search_entry_has_no_result_code() {
    let entry = [0x30, 0x0b, 0x02, 0x01, 0x02, 0x64, 0x06, 0x04, 0x00, 0x30, 0x00, 0x30, 0x00];
    let analysis = analyze_response(Some(&entry[..]));
    assert_eq!(analysis.kind, AnalysisKind::Malformed);
}

#[test]
fn test_lenient_lengths() {
    // long-form lengths with redundant octets everywhere
    let lenient = [
        0x30, 0x84, 0x00, 0x00, 0x00, 0x0f, 0x02, 0x81, 0x01, 0x01, 0x61, 0x82, 0x00, 0x07, 0x0a, 0x01, 0x00, 0x04,
        0x00, 0x04, 0x00,
    ];
    assert_eq!(extract_result_code(&lenient), Some(0));

    // outer length disagrees with the buffer; the code is still readable
    let mut truncated = BIND_SUCCESS.to_vec();
    truncated[1] = 0x7F;
    let analysis = analyze_response(Some(truncated.as_slice()));
    assert_eq!(analysis.kind, AnalysisKind::Success);
    assert!(analysis.notes.ends_with("message truncated"));
}

#[test]
fn test_enumerated_value_forms() {
    // leading zero octets are ignored
    let padded = [0x30, 0x0e, 0x02, 0x01, 0x01, 0x61, 0x09, 0x0a, 0x03, 0x00, 0x00, 0x35, 0x04, 0x00, 0x04, 0x00];
    assert_eq!(extract_result_code(&padded), Some(53));
    // empty enumerated reads as zero
    let empty = [0x30, 0x0b, 0x02, 0x01, 0x01, 0x61, 0x06, 0x0a, 0x00, 0x04, 0x00, 0x04, 0x00];
    assert_eq!(extract_result_code(&empty), Some(0));
    // enumerated reaching past the buffer
    let short = [0x30, 0x07, 0x02, 0x01, 0x01, 0x61, 0x02, 0x0a, 0x05, 0x01];
    assert_eq!(extract_result_code(&short), None);
}

#[test]
fn test_hostile_lengths_do_not_panic() {
    let huge_id = [0x30, 0x0c, 0x02, 0x88, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x61, 0x00];
    assert_eq!(extract_result_code(&huge_id), None);
    let indefinite_id = [0x30, 0x80, 0x02, 0x80, 0x01, 0x00, 0x00];
    assert_eq!(extract_result_code(&indefinite_id), None);
    for len in 0..BIND_SUCCESS.len() {
        let _ = analyze_response(Some(&BIND_SUCCESS[..len]));
    }
}

#[test]
fn test_analysis_kind_names() {
    assert_eq!(AnalysisKind::ProtocolError.to_string(), "protocol_error");
    assert_eq!(AnalysisKind::ConnectionClosed.to_string(), "connection_closed");
    let json = serde_json::to_string(&analyze_response(Some(&BIND_SUCCESS[..]))).expect("json");
    assert!(json.contains("\"kind\":\"success\""));
}
