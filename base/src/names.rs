//! Globally-unique name generation.
//!
//! 16K atomic counters, indexed by the hash of a sanitised prefix, make names
//! unique without any central registry. A hash collision only means two
//! prefixes share a counter, so a name that was already unique may pick up a
//! suffix; nothing breaks, the printed IR is just slightly noisier to read.
//!
//! There are three families of returned names:
//!
//! 1. char pattern: a single non-`$` char + number (e.g. `v234`)
//! 2. string pattern: a `$`-free string + `$` + number (e.g. `fr_nk82$42`)
//! 3. any string that matches neither pattern, returned verbatim the first
//!    time its counter is consulted
//!
//! There are no collisions within a family thanks to the counters, and none
//! across families by construction of the patterns.

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicI32, Ordering};

const NUM_UNIQUE_NAME_COUNTERS: usize = 1 << 14;

static UNIQUE_NAME_COUNTERS: [AtomicI32; NUM_UNIQUE_NAME_COUNTERS] =
    [const { AtomicI32::new(0) }; NUM_UNIQUE_NAME_COUNTERS];

fn unique_count(h: u64) -> i32 {
    let idx = (h as usize) & (NUM_UNIQUE_NAME_COUNTERS - 1);
    UNIQUE_NAME_COUNTERS[idx].fetch_add(1, Ordering::Relaxed)
}

fn hash_str(s: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

/// Single-char prefix family: `prefix` + decimal counter.
pub fn unique_name_char(prefix: char) -> String {
    let prefix = if prefix == '$' { '_' } else { prefix };
    format!("{prefix}{}", unique_count(prefix as u64))
}

/// String prefix family. `$` in the prefix is rewritten to `_`, then a
/// counter suffix keyed by the hash of the sanitised name is appended. A
/// prefix that cannot be mistaken for a previously returned name is passed
/// through verbatim when its counter is still zero.
pub fn unique_name(prefix: &str) -> String {
    let mut sanitized: Vec<char> = prefix.chars().collect();

    // Does the input look like something unique_name_char returned?
    let mut matches_char_pattern = true;
    // Does the input look like something unique_name returned?
    let mut matches_string_pattern = true;

    let mut num_dollars = 0;
    for i in 0..sanitized.len() {
        if sanitized[i] == '$' {
            num_dollars += 1;
            sanitized[i] = '_';
        }
        if i > 0 && !sanitized[i].is_ascii_digit() {
            // Found a non-digit after the first char.
            matches_char_pattern = false;
            if num_dollars > 0 {
                matches_string_pattern = false;
            }
        }
    }
    matches_string_pattern &= num_dollars == 1;
    matches_char_pattern &= prefix.chars().count() > 1;

    let sanitized: String = sanitized.into_iter().collect();

    // Add a suffix that's globally unique relative to the hash of the
    // sanitised name.
    let count = unique_count(hash_str(&sanitized));
    if count == 0 && !matches_char_pattern && !matches_string_pattern {
        // No risk of the name looking like anything unique_name has ever
        // returned or will ever return.
        return prefix.to_string();
    }

    format!("{sanitized}${count}")
}
