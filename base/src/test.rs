use std::collections::HashSet;

use crate::names::{unique_name, unique_name_char};

#[test]
fn char_family_is_prefix_plus_counter() {
    let a = unique_name_char('q');
    let b = unique_name_char('q');
    assert!(a.starts_with('q') && a[1..].chars().all(|c| c.is_ascii_digit()));
    assert!(b.starts_with('q'));
    assert_ne!(a, b);
}

#[test]
fn dollar_prefix_is_sanitised() {
    let n = unique_name_char('$');
    assert!(n.starts_with('_'));

    // A dollar disqualifies the prefix from both counter families, so the
    // first request passes through verbatim; after that the sanitised name
    // carries the counter.
    let first = unique_name("st$ge");
    assert_eq!(first, "st$ge");
    let second = unique_name("st$ge");
    assert_eq!(second, "st_ge$1");
}

#[test]
fn passthrough_family_returns_verbatim_once() {
    // A name with internal structure that matches neither pattern.
    let n = unique_name("buf_input_luma");
    assert_eq!(n, "buf_input_luma");
    // Second request for the same prefix must disambiguate.
    let m = unique_name("buf_input_luma");
    assert_ne!(m, "buf_input_luma");
    assert!(m.starts_with("buf_input_luma$"));
}

#[test]
fn char_shaped_string_prefix_gets_a_suffix() {
    // "v234" could have been returned by unique_name_char('v'), so the
    // string family must never return it verbatim.
    let n = unique_name("v234");
    assert!(n.starts_with("v234$"), "got {n}");
}

#[test]
fn families_stay_disjoint() {
    let mut seen = HashSet::new();
    for _ in 0..100 {
        assert!(seen.insert(unique_name_char('z')));
    }
    for _ in 0..100 {
        assert!(seen.insert(unique_name("z")));
    }
    for _ in 0..100 {
        assert!(seen.insert(unique_name("pipeline_stage")));
    }
}

#[test]
#[should_panic(expected = "Internal error")]
fn internal_error_reports_and_unwinds() {
    crate::internal_error!("registry corrupted: {}", 7);
}

#[test]
#[should_panic(expected = "Condition failed: 1 + 1 == 3")]
fn internal_assert_names_the_condition() {
    crate::internal_assert!(1 + 1 == 3, "arithmetic is broken");
}

#[test]
fn internal_assert_passes_silently() {
    crate::internal_assert!(1 + 1 == 2, "never printed");
}

#[test]
#[should_panic(expected = "Error:")]
fn user_error_is_attributed_to_the_user() {
    crate::user_error!("allocation too large");
}
