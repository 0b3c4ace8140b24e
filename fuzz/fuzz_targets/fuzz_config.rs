//! Fuzz target: `CarConfig::from_json_str`
//!
//! Drives arbitrary text into the configuration loader and asserts that it
//! never panics and that anything it accepts re-validates and survives a
//! serialise / parse cycle unchanged.
//!
//! cargo fuzz run fuzz_config

#![no_main]

use libfuzzer_sys::fuzz_target;
use starcar::config::CarConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(config) = CarConfig::from_json_str(text) else {
        return;
    };

    assert!(config.validate().is_ok(), "accepted config must validate");

    let json = serde_json::to_string(&config).expect("accepted config serialises");
    let reparsed = CarConfig::from_json_str(&json).expect("serialised config parses");
    assert_eq!(reparsed, config);
});
