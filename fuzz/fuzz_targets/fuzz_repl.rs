//! Fuzz the joinspace REPL execution
//!
//! This target exercises the full pipeline: parsing, interning, and
//! query execution. It should never panic on any input.

#![no_main]

use joinspace::repl::ReplState;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Try to interpret the data as UTF-8
    if let Ok(input) = std::str::from_utf8(data) {
        // Create a fresh REPL state for each fuzz input
        let mut state = ReplState::new();

        // Execution should never panic on any input
        // It should return a Result<_, String> error instead
        let _ = state.execute_source(input);
    }
});
