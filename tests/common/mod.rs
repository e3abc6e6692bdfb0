//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use stagegraph::{Node, NodeSet};
use std::time::Duration;

/// Create a test delay duration
pub fn test_delay(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Collect node references into a set
pub fn node_set(nodes: &[&Node]) -> NodeSet {
    nodes.iter().copied().collect()
}

/// Assert a node set holds exactly the given labels, in any order
pub fn assert_labels(set: &NodeSet, expected: &[&str]) {
    let mut actual = set.labels();
    actual.sort_unstable();
    let mut expected = expected.to_vec();
    expected.sort_unstable();
    assert_eq!(actual, expected, "Node set {} has unexpected members", set);
}
