//! Identifier generation for domain records.
//!
//! Ids are sortable `kind::<epoch_millis>-<suffix>` strings. The suffix
//! keeps two records created in the same millisecond distinct.

use std::time::{SystemTime, UNIX_EPOCH};

pub fn user_id(timestamp_millis: i64) -> String {
    format!("user::{}", timestamp_millis)
}

pub fn child_id(timestamp_millis: i64) -> String {
    format!("child::{}-{}", timestamp_millis, random_suffix(4))
}

pub fn entry_id(timestamp_millis: i64) -> String {
    format!("log::{}-{}", timestamp_millis, random_suffix(4))
}

/// Generate a short hex suffix from the sub-second clock.
pub fn random_suffix(len: usize) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_nanos();
    format!("{:x}", now % (16_u128.pow(len as u32)))
        .chars()
        .take(len)
        .collect()
}
