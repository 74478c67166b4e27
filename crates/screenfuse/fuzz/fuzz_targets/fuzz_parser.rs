//! Fuzz target for the delimited table parser.
//!
//! The parser must never panic on malformed input, whatever delimiter
//! detection settles on.

#![no_main]

use libfuzzer_sys::fuzz_target;
use screenfuse::DelimitedBackend;

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }

    if let Ok(table) = DelimitedBackend::new().parse_slice(data) {
        // Accepted tables are always rectangular.
        assert!(table.rows().iter().all(|row| row.len() == table.column_count()));
    }
});
