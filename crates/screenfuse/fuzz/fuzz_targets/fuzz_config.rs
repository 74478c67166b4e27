//! Fuzz target for configuration loading.
//!
//! Both parsers must reject bad documents with errors, never panics, and
//! anything they accept must pass the configuration checks.

#![no_main]

use libfuzzer_sys::fuzz_target;
use screenfuse::config::{JsonConfigParser, TomlConfigParser};
use screenfuse::{Configuration, ConfigurationLoader};

fuzz_target!(|data: &[u8]| {
    if data.len() > 10_000 {
        return;
    }

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    for loader in [
        ConfigurationLoader::with_parser(JsonConfigParser),
        ConfigurationLoader::with_parser(TomlConfigParser),
    ] {
        if let Ok(config) = loader.load::<Configuration>(text, "fuzz") {
            assert!(!config.reviewers.is_empty());
            assert!(!config.is_decision_column(&config.index));
        }
    }
});
