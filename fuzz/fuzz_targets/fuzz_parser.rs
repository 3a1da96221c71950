//! Fuzz the joinspace reader
//!
//! This target exercises the lexer and parser to find edge cases
//! and potential panics in the parsing code.

#![no_main]

use libfuzzer_sys::fuzz_target;

use joinspace::types::TypeRegistry;

fuzz_target!(|data: &[u8]| {
    // Try to interpret the data as UTF-8
    if let Ok(input) = std::str::from_utf8(data) {
        // The reader should never panic, even on malformed input
        // It should return an error instead
        let types = TypeRegistry::bootstrap();
        let _ = joinspace::read_terms(&types, input);
    }
});
