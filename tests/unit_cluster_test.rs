use std::time::{Duration, Instant};

use admind::model::cluster::Cluster;
use admind::model::node::Node;

#[test]
fn inserting_a_duplicate_node_id_is_rejected() {
    let mut cluster = Cluster::new();
    cluster.insert(Node::new(0, "node0", 1)).unwrap();
    assert!(cluster.insert(Node::new(0, "node0-again", 1)).is_err());
}

#[test]
fn set_self_requires_a_known_node() {
    let mut cluster = Cluster::new();
    assert!(cluster.set_self(0).is_err());
    cluster.insert(Node::new(0, "node0", 1)).unwrap();
    assert!(cluster.set_self(0).is_ok());
    assert_eq!(cluster.self_id(), Some(0));
}

#[test]
fn a_node_not_heard_from_within_the_timeout_is_not_alive() {
    let mut node = Node::new(1, "node1", 1);
    let now = Instant::now();
    let timeout = Duration::from_millis(100);
    assert!(!node.is_alive(timeout, now), "never seen yet must not be alive");

    node.last_seen = Some(now);
    assert!(node.is_alive(timeout, now + Duration::from_millis(50)));
    assert!(!node.is_alive(timeout, now + Duration::from_millis(200)));
}

#[test]
fn a_fenced_node_is_never_considered_alive() {
    let mut node = Node::new(2, "node2", 1);
    let now = Instant::now();
    node.last_seen = Some(now);
    node.fenced = true;
    assert!(!node.is_alive(Duration::from_secs(10), now));
}

#[test]
fn removing_an_unknown_node_fails() {
    let mut cluster = Cluster::new();
    assert!(cluster.remove(7).is_err());
}
