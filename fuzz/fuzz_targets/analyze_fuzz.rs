//! Analyzer fuzz target: feed arbitrary bytes as a server response.
//! Extraction must not panic; it returns a result code or None.
//! Build with: cargo fuzz run analyze_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let analysis = ldapprobe::analyze_response(Some(data));
    assert_eq!(analysis.result_code, ldapprobe::extract_result_code(data));
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run analyze_fuzz");
}
