//! Property-based tests for subnet allocation, logical IDs and config
//! validation.
//!
//! Uses `proptest` to verify invariants across many random inputs.

#![allow(clippy::expect_used)]

use std::collections::HashSet;

use proptest::prelude::*;

use ecsbase_cli::domain::cidr::Ipv4Cidr;
use ecsbase_cli::domain::config::{validate_config_key, validate_config_value};
use ecsbase_cli::domain::stack::allocate_logical_id;

// ============================================================================
// Ipv4Cidr::split() property tests
// ============================================================================

fn vpc_cidr() -> impl Strategy<Value = Ipv4Cidr> {
    (16u8..=28, any::<u32>()).prop_map(|(prefix, raw)| {
        let mask = u32::MAX << (32 - u32::from(prefix));
        let network = std::net::Ipv4Addr::from(raw & mask);
        format!("{network}/{prefix}")
            .parse()
            .expect("masked network is valid")
    })
}

proptest! {
    /// Split blocks are disjoint, equal-sized and inside the parent.
    #[test]
    fn prop_split_blocks_are_disjoint_and_contained(cidr in vpc_cidr(), count in 1usize..=12) {
        let Ok(blocks) = cidr.split(count) else {
            return Ok(());
        };
        prop_assert_eq!(blocks.len(), count);

        let start = u64::from(u32::from(cidr.network()));
        let end = start + cidr.size();
        let mut seen = HashSet::new();
        for block in &blocks {
            prop_assert_eq!(block.size(), blocks[0].size());
            let b_start = u64::from(u32::from(block.network()));
            prop_assert!(b_start >= start && b_start + block.size() <= end, "{} outside {}", block, cidr);
            prop_assert!(seen.insert(block.network()), "duplicate block {}", block);
        }
    }

    /// Splitting fails exactly when the blocks would be smaller than /28.
    #[test]
    fn prop_split_fails_only_below_slash_28(cidr in vpc_cidr(), count in 1usize..=12) {
        let extra = count.next_power_of_two().trailing_zeros();
        let fits = u32::from(cidr.prefix()) + extra <= 28;
        prop_assert_eq!(cidr.split(count).is_ok(), fits);
    }

    /// Printing then parsing a CIDR gives the same block.
    #[test]
    fn prop_cidr_display_parses_back(cidr in vpc_cidr()) {
        let parsed: Ipv4Cidr = cidr.to_string().parse().expect("display output parses");
        prop_assert_eq!(parsed, cidr);
    }
}

// ============================================================================
// allocate_logical_id() property tests
// ============================================================================

fn path_component() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,12}"
}

proptest! {
    /// Logical IDs are always alphanumeric, whatever the construct IDs hold.
    #[test]
    fn prop_logical_id_is_alphanumeric(path in prop::collection::vec(path_component(), 1..5)) {
        let id = allocate_logical_id(&path);
        prop_assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()), "{}", id);
    }

    /// Nested paths end in an 8-digit uppercase hex digest.
    #[test]
    fn prop_nested_logical_id_ends_in_digest(path in prop::collection::vec(path_component(), 2..5)) {
        let id = allocate_logical_id(&path);
        let s = id.as_str();
        prop_assert!(s.len() >= 8);
        let digest = &s[s.len() - 8..];
        prop_assert!(
            digest.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()),
            "bad digest in {}", s
        );
        prop_assert!(digest.chars().all(|c| c.is_ascii_hexdigit()), "bad digest in {}", s);
    }

    /// Two nested paths that sanitize to the same text still get different IDs.
    #[test]
    fn prop_sanitized_collisions_are_disambiguated(a in "[A-Za-z]{1,6}", b in "[A-Za-z]{1,6}") {
        let plain = vec![format!("{a}{b}"), "X".to_string()];
        let dashed = vec![format!("{a}-{b}"), "X".to_string()];
        prop_assert_ne!(allocate_logical_id(&plain), allocate_logical_id(&dashed));
    }

    /// Allocation is a pure function of the path.
    #[test]
    fn prop_logical_id_is_deterministic(path in prop::collection::vec(path_component(), 1..5)) {
        prop_assert_eq!(allocate_logical_id(&path), allocate_logical_id(&path));
    }
}

// ============================================================================
// Config validation property tests
// ============================================================================

proptest! {
    /// Keys outside the whitelist are always rejected.
    #[test]
    fn prop_unknown_config_keys_rejected(key in "[a-z]{1,8}\\.[a-z_]{1,12}") {
        let known = ecsbase_cli::domain::config::VALID_CONFIG_KEYS.contains(&key.as_str());
        prop_assert_eq!(validate_config_key(&key).is_ok(), known);
    }

    /// `network.max_azs` accepts exactly 1..=6.
    #[test]
    fn prop_max_azs_range(n in 0u32..20) {
        let ok = validate_config_value("network.max_azs", &n.to_string()).is_ok();
        prop_assert_eq!(ok, (1..=6).contains(&n));
    }
}
