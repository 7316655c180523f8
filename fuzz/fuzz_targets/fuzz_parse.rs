#![no_main]

use libfuzzer_sys::fuzz_target;

use correlation_vector::{CorrelationVector, ParseOptions};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Lenient parse must accept anything without panicking, and the
        // result must survive its own mutators.
        if let Ok(cv) = CorrelationVector::parse(Some(s)) {
            let _ = cv.increment();
            let _ = CorrelationVector::extend(Some(&cv.value()));
        }
        let _ = CorrelationVector::parse_with(Some(s), &ParseOptions::strict());
    }
});
