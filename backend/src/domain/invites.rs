//! Invite-code text handling for the educator connection protocol.
//!
//! Codes look like `LEO-2024`: an uppercased prefix taken from the
//! child's name plus a four-digit suffix. The format is illustrative
//! only; redemption compares exact normalized strings, never patterns.

use std::time::{SystemTime, UNIX_EPOCH};

/// Canonical form used at both generation and redemption: trimmed and
/// uppercased, so codes are case-insensitive at every boundary.
pub fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Generate a fresh invite code for `child_name`, retrying until
/// `is_taken` clears it. A short random suffix alone cannot guarantee
/// uniqueness, so the collision check here is load-bearing: two live
/// profiles must never share a code.
pub fn generate(child_name: &str, is_taken: impl Fn(&str) -> bool) -> String {
    let prefix = name_prefix(child_name);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_nanos();

    let mut attempt: u128 = 0;
    loop {
        let code = if attempt < 9000 {
            // Four-digit suffix in 1000..=9999.
            format!("{}-{}", prefix, 1000 + (nanos + attempt * 7919) % 9000)
        } else {
            // Suffix space exhausted for this prefix; widen to hex.
            format!("{}-{:08x}", prefix, (nanos + attempt) % 0x1_0000_0000)
        };
        if !is_taken(&code) {
            return code;
        }
        attempt += 1;
    }
}

fn name_prefix(child_name: &str) -> String {
    let prefix: String = child_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(5)
        .collect::<String>()
        .to_uppercase();

    if prefix.is_empty() {
        "CHILD".to_string()
    } else {
        prefix
    }
}
