//! B+ tree scenario tests.
//!
//! Exercises the tree through the public API against a real pager
//! (buffer pool + disk manager over a temp directory), checking the
//! structural invariants after every interesting step:
//! - all leaves at the same depth, reachable from the root
//! - keys strictly increasing within every node
//! - non-root nodes meet their minimum occupancy
//! - internal slot i >= 1 partitions its children: every key in child
//!   i's subtree is >= key[i], every key in child i-1's subtree is below
//!   it (on insert-only workloads key[i] is exactly child i's minimum;
//!   deletions may leave it a strict lower bound)
//! - the leaf chain visits every key in ascending order exactly once

use std::sync::Arc;

use lattice_buffer::{BufferPool, BufferPoolConfig};
use lattice_common::page::{PageHeader, PageId, PageType};
use lattice_index::btree::node::{InternalNode, LeafNode};
use lattice_index::{
    BPlusTree, BytewiseComparator, DiskManager, DiskManagerConfig, IndexKey, Int64Comparator,
    Pager, RecordId,
};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tempfile::{tempdir, TempDir};

const KEY_SIZE: usize = 8;

type TestTree = BPlusTree<KEY_SIZE, Int64Comparator>;

fn key(v: i64) -> IndexKey<KEY_SIZE> {
    IndexKey::from_integer(v)
}

fn rid(v: i64) -> RecordId {
    RecordId::from_integer(v)
}

fn create_tree(leaf_max: u16, internal_max: u16) -> (TestTree, TempDir) {
    let dir = tempdir().unwrap();
    let disk = DiskManager::new(DiskManagerConfig {
        data_dir: dir.path().to_path_buf(),
        fsync_enabled: false,
    })
    .unwrap();
    let pool = BufferPool::new(BufferPoolConfig { num_frames: 512 });
    let pager = Arc::new(Pager::new(disk, pool, 0).unwrap());

    let (header_pid, guard) = pager.allocate_page().unwrap();
    drop(guard);

    let tree = BPlusTree::new(
        "test_index",
        header_pid,
        pager,
        Int64Comparator,
        leaf_max,
        internal_max,
    )
    .unwrap();
    (tree, dir)
}

/// Collects every key by scanning the cursor from the start.
fn scan(tree: &TestTree) -> Vec<i64> {
    tree.iter()
        .unwrap()
        .map(|entry| entry.unwrap().0.to_integer())
        .collect()
}

/// Collects the keys of each leaf, in chain order.
fn leaves_by_chain(tree: &TestTree) -> Vec<Vec<i64>> {
    let mut result = Vec::new();
    let root = tree.root_page_id().unwrap();
    if !root.is_valid() {
        return result;
    }

    // Descend to the leftmost leaf
    let pager = tree.pager();
    let mut pid = root;
    loop {
        let guard = pager.fetch_read(pid).unwrap();
        if PageHeader::page_type_of(guard.data()) == PageType::BTreeLeaf {
            break;
        }
        let node = InternalNode::<KEY_SIZE>::from_page(guard.data()).unwrap();
        pid = node.child_at(0);
    }

    // Walk the chain
    loop {
        let guard = pager.fetch_read(pid).unwrap();
        let leaf = LeafNode::<KEY_SIZE>::from_page(guard.data()).unwrap();
        result.push((0..leaf.size()).map(|i| leaf.key_at(i).to_integer()).collect());
        let next = leaf.next_leaf();
        if !next.is_valid() {
            break;
        }
        pid = next;
    }
    result
}

/// Recursively checks structure; returns (subtree min key, subtree max
/// key, leaf depth, leaves in order).
fn check_subtree(
    tree: &TestTree,
    pid: PageId,
    depth: usize,
    is_root: bool,
) -> (i64, i64, usize, Vec<PageId>) {
    let pager = tree.pager();
    let guard = pager.fetch_read(pid).unwrap();

    if PageHeader::page_type_of(guard.data()) == PageType::BTreeLeaf {
        let leaf = LeafNode::<KEY_SIZE>::from_page(guard.data()).unwrap();
        assert!(leaf.size() >= 1, "leaf {} is empty", pid);
        if !is_root {
            assert!(
                leaf.size() >= leaf.min_size(),
                "leaf {} under-full: {} < {}",
                pid,
                leaf.size(),
                leaf.min_size()
            );
        }
        assert!(leaf.size() <= leaf.max_size());
        for i in 1..leaf.size() {
            assert!(
                leaf.key_at(i - 1).to_integer() < leaf.key_at(i).to_integer(),
                "leaf {} keys not strictly increasing",
                pid
            );
        }
        return (
            leaf.key_at(0).to_integer(),
            leaf.key_at(leaf.size() - 1).to_integer(),
            depth,
            vec![pid],
        );
    }

    let node = InternalNode::<KEY_SIZE>::from_page(guard.data()).unwrap();
    if is_root {
        assert!(node.size() >= 2, "root internal {} has < 2 children", pid);
    } else {
        assert!(
            node.size() >= node.min_size(),
            "internal {} under-full: {} < {}",
            pid,
            node.size(),
            node.min_size()
        );
    }
    assert!(node.size() <= node.max_size());
    for i in 2..node.size() {
        assert!(
            node.key_at(i - 1).to_integer() < node.key_at(i).to_integer(),
            "internal {} keys not strictly increasing",
            pid
        );
    }

    let slots: Vec<(i64, PageId)> = (0..node.size())
        .map(|i| (node.key_at(i).to_integer(), node.child_at(i)))
        .collect();
    drop(guard);

    let mut leaves = Vec::new();
    let mut leaf_depth = None;
    let mut subtree_min = None;
    let mut prev_max = None;
    for (i, (slot_key, child)) in slots.iter().enumerate() {
        let (child_min, child_max, child_depth, child_leaves) =
            check_subtree(tree, *child, depth + 1, false);
        if i >= 1 {
            // The separator partitions the siblings. Deletions may leave
            // it below the exact subtree minimum, never above it.
            assert!(
                child_min >= *slot_key,
                "internal {} slot {}: child min {} below separator {}",
                pid, i, child_min, slot_key
            );
            assert!(
                prev_max.unwrap() < *slot_key,
                "internal {} slot {}: left subtree reaches past separator {}",
                pid, i, slot_key
            );
        } else {
            subtree_min = Some(child_min);
        }
        prev_max = Some(child_max);
        match leaf_depth {
            None => leaf_depth = Some(child_depth),
            Some(d) => assert_eq!(d, child_depth, "leaves at different depths under {}", pid),
        }
        leaves.extend(child_leaves);
    }

    (
        subtree_min.unwrap(),
        prev_max.unwrap(),
        leaf_depth.unwrap(),
        leaves,
    )
}

/// Full structural check; returns the leaf depth.
fn check_invariants(tree: &TestTree) -> usize {
    let root = tree.root_page_id().unwrap();
    if !root.is_valid() {
        return 0;
    }
    let (_, _, depth, leaves) = check_subtree(tree, root, 0, true);

    // The chain must visit exactly the in-order leaves
    let chain = leaves_by_chain(tree);
    assert_eq!(chain.len(), leaves.len(), "leaf chain skips or repeats leaves");

    // And yield globally ascending keys
    let flat: Vec<i64> = chain.into_iter().flatten().collect();
    for w in flat.windows(2) {
        assert!(w[0] < w[1], "leaf chain out of order");
    }
    depth
}

// ===========================================================================
// Concrete scenarios (leaf_max = internal_max = 4)
// ===========================================================================

#[test]
fn scenario_single_leaf_root() {
    let (tree, _dir) = create_tree(4, 4);

    assert!(tree.is_empty().unwrap());
    for v in 1..=4 {
        assert!(tree.insert(key(v), rid(v)).unwrap());
    }
    assert!(!tree.is_empty().unwrap());

    // Still a single leaf root
    let root = tree.root_page_id().unwrap();
    let guard = tree.pager().fetch_read(root).unwrap();
    assert_eq!(PageHeader::page_type_of(guard.data()), PageType::BTreeLeaf);
    drop(guard);

    assert_eq!(tree.get(&key(3)).unwrap(), Some(rid(3)));
    assert_eq!(tree.get(&key(5)).unwrap(), None);
    assert_eq!(scan(&tree), vec![1, 2, 3, 4]);
    check_invariants(&tree);
}

#[test]
fn scenario_first_split() {
    let (tree, _dir) = create_tree(4, 4);

    for v in 1..=5 {
        tree.insert(key(v), rid(v)).unwrap();
    }

    // The root leaf split into an internal root over two leaves
    let root = tree.root_page_id().unwrap();
    let guard = tree.pager().fetch_read(root).unwrap();
    assert_eq!(
        PageHeader::page_type_of(guard.data()),
        PageType::BTreeInternal
    );
    let node = InternalNode::<KEY_SIZE>::from_page(guard.data()).unwrap();
    assert_eq!(node.size(), 2);
    assert_eq!(node.key_at(1).to_integer(), 3);
    drop(guard);

    assert_eq!(leaves_by_chain(&tree), vec![vec![1, 2], vec![3, 4, 5]]);
    assert_eq!(scan(&tree), vec![1, 2, 3, 4, 5]);
    check_invariants(&tree);
}

#[test]
fn scenario_three_leaves() {
    let (tree, _dir) = create_tree(4, 4);

    for v in [1, 2, 3, 4, 5, 0, 6, 7] {
        tree.insert(key(v), rid(v)).unwrap();
    }

    // The ⌊size/2⌋ pivot gives the right-hand leaf the larger half
    assert_eq!(
        leaves_by_chain(&tree),
        vec![vec![0, 1, 2], vec![3, 4], vec![5, 6, 7]]
    );
    assert_eq!(scan(&tree), vec![0, 1, 2, 3, 4, 5, 6, 7]);
    check_invariants(&tree);
}

#[test]
fn scenario_remove_within_min() {
    let (tree, _dir) = create_tree(4, 4);

    for v in [1, 2, 3, 4, 5, 0, 6, 7] {
        tree.insert(key(v), rid(v)).unwrap();
    }
    tree.remove(&key(1)).unwrap();

    assert_eq!(tree.get(&key(1)).unwrap(), None);
    assert_eq!(scan(&tree), vec![0, 2, 3, 4, 5, 6, 7]);
    check_invariants(&tree);
}

#[test]
fn scenario_ascending_insert_descending_remove() {
    let (tree, _dir) = create_tree(4, 4);

    for v in 1..=100 {
        assert!(tree.insert(key(v), rid(v)).unwrap());
    }
    check_invariants(&tree);
    assert_eq!(scan(&tree), (1..=100).collect::<Vec<_>>());

    for v in (1..=100).rev() {
        tree.remove(&key(v)).unwrap();
        check_invariants(&tree);
    }

    assert!(tree.is_empty().unwrap());
    assert_eq!(tree.root_page_id().unwrap(), PageId::INVALID);
    assert_eq!(scan(&tree), Vec::<i64>::new());
}

#[test]
fn scenario_random_permutation() {
    let (tree, _dir) = create_tree(4, 4);
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x1a77);

    let mut values: Vec<i64> = (1..=1000).collect();
    values.shuffle(&mut rng);

    for (i, v) in values.iter().enumerate() {
        assert!(tree.insert(key(*v), rid(*v)).unwrap());
        if i % 100 == 99 {
            check_invariants(&tree);
        }
    }

    let depth = check_invariants(&tree);
    // Fan-out >= 2 everywhere: 1000 keys stay within a short tree
    assert!(depth <= 9, "tree too tall: {}", depth);

    assert_eq!(scan(&tree), (1..=1000).collect::<Vec<_>>());
    for v in 1..=1000 {
        assert_eq!(tree.get(&key(v)).unwrap(), Some(rid(v)));
    }
    assert_eq!(tree.get(&key(0)).unwrap(), None);
    assert_eq!(tree.get(&key(1001)).unwrap(), None);
}

// ===========================================================================
// Round-trips and idempotence
// ===========================================================================

#[test]
fn test_duplicate_insert_rejected_until_removed() {
    let (tree, _dir) = create_tree(4, 4);

    assert!(tree.insert(key(7), rid(7)).unwrap());
    assert!(!tree.insert(key(7), rid(99)).unwrap());
    // The original value is untouched
    assert_eq!(tree.get(&key(7)).unwrap(), Some(rid(7)));

    tree.remove(&key(7)).unwrap();
    assert!(tree.insert(key(7), rid(99)).unwrap());
    assert_eq!(tree.get(&key(7)).unwrap(), Some(rid(99)));
}

#[test]
fn test_insert_remove_permutation_roundtrip() {
    let (tree, _dir) = create_tree(4, 4);
    let mut rng = rand::rngs::StdRng::seed_from_u64(0xbee5);

    let mut values: Vec<i64> = (1..=300).collect();
    values.shuffle(&mut rng);
    for v in &values {
        tree.insert(key(*v), rid(*v)).unwrap();
    }

    values.shuffle(&mut rng);
    for (i, v) in values.iter().enumerate() {
        tree.remove(&key(*v)).unwrap();
        if i % 50 == 49 {
            check_invariants(&tree);
        }
    }

    assert!(tree.is_empty().unwrap());
    assert_eq!(tree.root_page_id().unwrap(), PageId::INVALID);
}

#[test]
fn test_remove_absent_is_noop() {
    let (tree, _dir) = create_tree(4, 4);

    // Empty tree
    tree.remove(&key(1)).unwrap();
    assert!(tree.is_empty().unwrap());

    for v in 1..=10 {
        tree.insert(key(v), rid(v)).unwrap();
    }
    tree.remove(&key(42)).unwrap();
    assert_eq!(scan(&tree), (1..=10).collect::<Vec<_>>());
    check_invariants(&tree);
}

// ===========================================================================
// Boundary behaviours
// ===========================================================================

#[test]
fn test_insert_into_empty_creates_leaf_root() {
    let (tree, _dir) = create_tree(4, 4);

    assert_eq!(tree.root_page_id().unwrap(), PageId::INVALID);
    tree.insert(key(1), rid(1)).unwrap();

    let root = tree.root_page_id().unwrap();
    assert!(root.is_valid());
    let guard = tree.pager().fetch_read(root).unwrap();
    assert_eq!(PageHeader::page_type_of(guard.data()), PageType::BTreeLeaf);
    let leaf = LeafNode::<KEY_SIZE>::from_page(guard.data()).unwrap();
    assert_eq!(leaf.size(), 1);
}

#[test]
fn test_split_at_exactly_max_plus_one() {
    let (tree, _dir) = create_tree(4, 4);

    for v in 1..=5 {
        tree.insert(key(v), rid(v)).unwrap();
    }

    let chain = leaves_by_chain(&tree);
    assert_eq!(chain.len(), 2);
    // Both halves meet leaf_min = 2
    assert!(chain[0].len() >= 2);
    assert!(chain[1].len() >= 2);
    check_invariants(&tree);
}

#[test]
fn test_remove_empties_leaf_root() {
    let (tree, _dir) = create_tree(4, 4);

    tree.insert(key(1), rid(1)).unwrap();
    tree.insert(key(2), rid(2)).unwrap();
    tree.remove(&key(1)).unwrap();
    tree.remove(&key(2)).unwrap();

    assert_eq!(tree.root_page_id().unwrap(), PageId::INVALID);
    assert!(tree.is_empty().unwrap());
}

#[test]
fn test_root_collapse_to_single_child() {
    let (tree, _dir) = create_tree(4, 4);

    // Two leaves under an internal root
    for v in 1..=5 {
        tree.insert(key(v), rid(v)).unwrap();
    }
    let old_root = tree.root_page_id().unwrap();
    let guard = tree.pager().fetch_read(old_root).unwrap();
    assert_eq!(
        PageHeader::page_type_of(guard.data()),
        PageType::BTreeInternal
    );
    drop(guard);

    // Draining the left leaf merges the chain back to one leaf and
    // collapses the root
    tree.remove(&key(1)).unwrap();
    tree.remove(&key(2)).unwrap();

    let root = tree.root_page_id().unwrap();
    assert_ne!(root, old_root);
    let guard = tree.pager().fetch_read(root).unwrap();
    assert_eq!(PageHeader::page_type_of(guard.data()), PageType::BTreeLeaf);
    drop(guard);
    assert_eq!(scan(&tree), vec![3, 4, 5]);
    check_invariants(&tree);
}

#[test]
fn test_leftmost_leaf_underflow_uses_right_sibling() {
    let (tree, _dir) = create_tree(4, 4);

    // Leaves {0,1,2} {3,4} {5,6,7}; removing from the leftmost child
    // exercises the slot-0 rebalancing path
    for v in [1, 2, 3, 4, 5, 0, 6, 7] {
        tree.insert(key(v), rid(v)).unwrap();
    }

    tree.remove(&key(0)).unwrap();
    check_invariants(&tree);
    tree.remove(&key(1)).unwrap();
    check_invariants(&tree);
    tree.remove(&key(2)).unwrap();
    check_invariants(&tree);

    assert_eq!(scan(&tree), vec![3, 4, 5, 6, 7]);
}

// ===========================================================================
// Cursors
// ===========================================================================

#[test]
fn test_iter_crosses_leaf_boundaries() {
    let (tree, _dir) = create_tree(4, 4);

    for v in 1..=50 {
        tree.insert(key(v), rid(v)).unwrap();
    }
    assert!(leaves_by_chain(&tree).len() > 1);

    let collected: Vec<(i64, i64)> = tree
        .iter()
        .unwrap()
        .map(|entry| {
            let (k, r) = entry.unwrap();
            (k.to_integer(), r.to_integer())
        })
        .collect();
    assert_eq!(collected.len(), 50);
    for (i, (k, r)) in collected.iter().enumerate() {
        assert_eq!(*k, i as i64 + 1);
        assert_eq!(*r, i as i64 + 1);
    }
}

#[test]
fn test_iter_on_empty_tree_is_end() {
    let (tree, _dir) = create_tree(4, 4);

    let mut cursor = tree.iter().unwrap();
    assert!(cursor.is_end());
    assert!(cursor.next().is_none());
    assert!(cursor == tree.end());
}

#[test]
fn test_iter_from_present_key() {
    let (tree, _dir) = create_tree(4, 4);

    for v in (2..=40).step_by(2) {
        tree.insert(key(v), rid(v)).unwrap();
    }

    let keys: Vec<i64> = tree
        .iter_from(&key(20))
        .unwrap()
        .map(|entry| entry.unwrap().0.to_integer())
        .collect();
    assert_eq!(keys, (20..=40).step_by(2).collect::<Vec<_>>());
}

#[test]
fn test_iter_from_absent_key_starts_at_successor() {
    let (tree, _dir) = create_tree(4, 4);

    for v in (2..=40).step_by(2) {
        tree.insert(key(v), rid(v)).unwrap();
    }

    let keys: Vec<i64> = tree
        .iter_from(&key(21))
        .unwrap()
        .map(|entry| entry.unwrap().0.to_integer())
        .collect();
    assert_eq!(keys, (22..=40).step_by(2).collect::<Vec<_>>());
}

#[test]
fn test_iter_from_past_maximum_is_end() {
    let (tree, _dir) = create_tree(4, 4);

    for v in 1..=4 {
        tree.insert(key(v), rid(v)).unwrap();
    }

    let cursor = tree.iter_from(&key(100)).unwrap();
    assert!(cursor.is_end());
    assert!(cursor == tree.end());
}

#[test]
fn test_cursor_manual_advance() {
    let (tree, _dir) = create_tree(4, 4);

    for v in 1..=6 {
        tree.insert(key(v), rid(v)).unwrap();
    }

    let mut cursor = tree.iter().unwrap();
    let mut seen = Vec::new();
    while !cursor.is_end() {
        seen.push(cursor.entry().unwrap().0.to_integer());
        cursor.advance().unwrap();
    }
    assert_eq!(seen, vec![1, 2, 3, 4, 5, 6]);

    // Advancing the end cursor stays at end
    cursor.advance().unwrap();
    assert!(cursor.is_end());
}

// ===========================================================================
// Bulk drivers and debug surface
// ===========================================================================

#[test]
fn test_bulk_drivers() {
    let (tree, dir) = create_tree(4, 4);

    let insert_file = dir.path().join("insert.txt");
    std::fs::write(&insert_file, "1\n2\n3\n4\n5\n6\n7\n8\n").unwrap();
    assert_eq!(tree.insert_from_file(&insert_file).unwrap(), 8);
    assert_eq!(scan(&tree), (1..=8).collect::<Vec<_>>());

    let batch_file = dir.path().join("batch.txt");
    std::fs::write(&batch_file, "i 9\nd 1\nd 2\ni 10\n").unwrap();
    tree.batch_ops_from_file(&batch_file).unwrap();
    assert_eq!(scan(&tree), (3..=10).collect::<Vec<_>>());

    let remove_file = dir.path().join("remove.txt");
    std::fs::write(&remove_file, "3\n4\n5\n6\n7\n8\n9\n10\n").unwrap();
    assert_eq!(tree.remove_from_file(&remove_file).unwrap(), 8);
    assert!(tree.is_empty().unwrap());
}

#[test]
fn test_dot_and_dump_render() {
    let (tree, _dir) = create_tree(4, 4);

    assert_eq!(tree.dump().unwrap(), "()");

    for v in 1..=10 {
        tree.insert(key(v), rid(v)).unwrap();
    }

    let dot = tree.to_dot().unwrap();
    assert!(dot.starts_with("digraph G {"));
    assert!(dot.contains("LEAF_"));
    assert!(dot.contains("INT_"));

    let dump = tree.dump().unwrap();
    assert!(dump.contains("Internal["));
    assert!(dump.contains("Leaf["));
    assert!(dump.contains("keys: 1, 2"));
}

// ===========================================================================
// Other key widths and comparators
// ===========================================================================

#[test]
fn test_wide_keys_bytewise() {
    let dir = tempdir().unwrap();
    let disk = DiskManager::new(DiskManagerConfig {
        data_dir: dir.path().to_path_buf(),
        fsync_enabled: false,
    })
    .unwrap();
    let pool = BufferPool::new(BufferPoolConfig { num_frames: 128 });
    let pager = Arc::new(Pager::new(disk, pool, 0).unwrap());
    let (header_pid, guard) = pager.allocate_page().unwrap();
    drop(guard);

    let tree: BPlusTree<32, BytewiseComparator> = BPlusTree::new(
        "wide_index",
        header_pid,
        pager,
        BytewiseComparator,
        4,
        4,
    )
    .unwrap();

    for v in 0..64 {
        assert!(tree
            .insert(IndexKey::from_integer(v), RecordId::from_integer(v))
            .unwrap());
    }
    for v in 0..64 {
        assert_eq!(
            tree.get(&IndexKey::from_integer(v)).unwrap(),
            Some(RecordId::from_integer(v))
        );
    }
    let keys: Vec<i64> = tree
        .iter()
        .unwrap()
        .map(|entry| entry.unwrap().0.to_integer())
        .collect();
    assert_eq!(keys, (0..64).collect::<Vec<_>>());
}

#[test]
fn test_fanout_validation() {
    let dir = tempdir().unwrap();
    let disk = DiskManager::new(DiskManagerConfig {
        data_dir: dir.path().to_path_buf(),
        fsync_enabled: false,
    })
    .unwrap();
    let pool = BufferPool::new(BufferPoolConfig { num_frames: 16 });
    let pager = Arc::new(Pager::new(disk, pool, 0).unwrap());
    let (header_pid, guard) = pager.allocate_page().unwrap();
    drop(guard);

    let too_small: lattice_common::Result<TestTree> = BPlusTree::new(
        "bad_index",
        header_pid,
        pager,
        Int64Comparator,
        2,
        4,
    );
    assert!(too_small.is_err());
}

#[test]
fn test_tree_from_configs() {
    let dir = tempdir().unwrap();
    let storage = lattice_common::StorageConfig {
        data_dir: dir.path().to_path_buf(),
        fsync_enabled: false,
        buffer_pool_pages: 128,
        ..Default::default()
    };
    let pager = Arc::new(Pager::open(&storage, 0).unwrap());
    let (header_pid, guard) = pager.allocate_page().unwrap();
    drop(guard);

    let tree: TestTree = BPlusTree::with_config(
        "configured_index",
        header_pid,
        pager,
        Int64Comparator,
        lattice_common::BTreeConfig {
            leaf_max: 8,
            internal_max: 8,
        },
    )
    .unwrap();

    for v in 1..=100 {
        tree.insert(key(v), rid(v)).unwrap();
    }
    assert_eq!(scan(&tree), (1..=100).collect::<Vec<_>>());
    assert_eq!(tree.name(), "configured_index");
}

// ===========================================================================
// Larger fan-out sanity
// ===========================================================================

#[test]
fn test_default_fanout_bulk() {
    let (tree, _dir) = {
        let dir = tempdir().unwrap();
        let disk = DiskManager::new(DiskManagerConfig {
            data_dir: dir.path().to_path_buf(),
            fsync_enabled: false,
        })
        .unwrap();
        let pool = BufferPool::new(BufferPoolConfig { num_frames: 512 });
        let pager = Arc::new(Pager::new(disk, pool, 0).unwrap());
        let (header_pid, guard) = pager.allocate_page().unwrap();
        drop(guard);
        let tree: TestTree = BPlusTree::new(
            "bulk_index",
            header_pid,
            pager,
            Int64Comparator,
            64,
            64,
        )
        .unwrap();
        (tree, dir)
    };

    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    let mut values: Vec<i64> = (0..5000).collect();
    values.shuffle(&mut rng);

    for v in &values {
        tree.insert(key(*v), rid(*v)).unwrap();
    }
    assert_eq!(scan(&tree), (0..5000).collect::<Vec<_>>());

    values.shuffle(&mut rng);
    for v in values.iter().take(2500) {
        tree.remove(&key(*v)).unwrap();
    }
    let remaining: std::collections::BTreeSet<i64> =
        values.iter().skip(2500).copied().collect();
    assert_eq!(scan(&tree), remaining.into_iter().collect::<Vec<_>>());
}
