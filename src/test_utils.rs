//! Test utilities for Redtape
//!
//! Helpers for managing environment variables in tests to prevent
//! pollution between tests.

use std::collections::HashMap;
use std::env;
use std::sync::Mutex;

/// Global mutex to ensure all config-related tests run serially
pub static GLOBAL_CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

/// Remove every REDTAPE_ environment variable and return the original values
pub fn clean_redtape_env() -> HashMap<String, String> {
    let original_values: HashMap<String, String> = env::vars()
        .filter(|(key, _)| key.starts_with("REDTAPE_"))
        .collect();

    for key in original_values.keys() {
        env::remove_var(key);
    }

    original_values
}

/// Restore environment variables captured by [`clean_redtape_env`]
pub fn restore_env(original_values: HashMap<String, String>) {
    for (key, _) in env::vars() {
        if key.starts_with("REDTAPE_") {
            env::remove_var(&key);
        }
    }

    for (key, value) in original_values {
        env::set_var(key, value);
    }
}
