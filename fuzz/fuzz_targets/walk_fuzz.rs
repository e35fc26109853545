//! Walker fuzz target: scan arbitrary bytes and corrupt what it finds.
//! Spans must stay inside the buffer and targeted corruption must not panic.
//! Build with: cargo fuzz run walk_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    use ldapprobe::mutate::{apply_targeted, TargetedOp};

    let spans = ldapprobe::scan(data);
    for span in &spans {
        assert!(span.end() <= data.len());
        for op in TargetedOp::all() {
            let _ = apply_targeted(data, &spans, span, op);
        }
    }
    if let Some(extent) = ldapprobe::message_extent(data) {
        assert!(extent <= data.len());
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run walk_fuzz");
}
