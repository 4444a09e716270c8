//! Fuzz target for connection configuration parsing.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_config_parser
//! ```

#![no_main]

use std::collections::HashMap;

use docket::ConnectionConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (String, Vec<(String, String)>)| {
    let (source, pairs) = input;

    if let Ok(config) = ConnectionConfig::from_toml(&source) {
        let uri = config.connection_uri();
        assert!(uri.starts_with("mongodb://"));
    }

    let map: HashMap<String, String> = pairs.into_iter().take(20).collect();
    if let Ok(config) = ConnectionConfig::from_map(&map) {
        assert!(config.validate().is_ok());
        let _ = config.connection_uri();
    }
});
