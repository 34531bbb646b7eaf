//! Fuzz target for config.toml parsing.
//!
//! Tests that server configuration parsing and validation handle arbitrary
//! input without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pc_core::config::ServerConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = toml::from_str::<ServerConfig>(text) {
        let _ = config.validate();
    }
});
