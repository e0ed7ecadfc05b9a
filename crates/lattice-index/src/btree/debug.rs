//! Debug emitters: DOT graphs and a textual tree dump.
//!
//! These walk the tree under read guards and never mutate it; they exist
//! for inspecting structure in tests and tooling.

use super::key::KeyComparator;
use super::node::{InternalNode, LeafNode};
use super::tree::BPlusTree;
use lattice_common::page::{PageHeader, PageId, PageType};
use lattice_common::Result;

impl<const N: usize, C: KeyComparator<N>> BPlusTree<N, C> {
    /// Renders the tree as a Graphviz DOT digraph.
    pub fn to_dot(&self) -> Result<String> {
        let mut out = String::from("digraph G {\n");
        let root = self.root_page_id()?;
        if root.is_valid() {
            self.dot_node(root, &mut out)?;
        }
        out.push_str("}\n");
        Ok(out)
    }

    fn dot_node(&self, pid: PageId, out: &mut String) -> Result<()> {
        let guard = self.pager().fetch_read(pid)?;

        if PageHeader::page_type_of(guard.data()) == PageType::BTreeLeaf {
            let leaf = LeafNode::<N>::from_page(guard.data())?;
            let keys: Vec<String> = (0..leaf.size()).map(|i| leaf.key_at(i).to_string()).collect();
            out.push_str(&format!(
                "  LEAF_{} [shape=record label=\"P={} size={}/{}|{}\"];\n",
                pid.page_num,
                pid.page_num,
                leaf.size(),
                leaf.max_size(),
                keys.join("|")
            ));
            if leaf.next_leaf().is_valid() {
                out.push_str(&format!(
                    "  LEAF_{} -> LEAF_{};\n  {{rank=same LEAF_{} LEAF_{}}};\n",
                    pid.page_num,
                    leaf.next_leaf().page_num,
                    pid.page_num,
                    leaf.next_leaf().page_num
                ));
            }
            return Ok(());
        }

        let node = InternalNode::<N>::from_page(guard.data())?;
        let mut cells = Vec::with_capacity(node.size());
        let mut children = Vec::with_capacity(node.size());
        for i in 0..node.size() {
            // Slot 0's key is a routing placeholder
            let label = if i == 0 {
                format!("(-, {})", node.child_at(i).page_num)
            } else {
                format!("({}, {})", node.key_at(i), node.child_at(i).page_num)
            };
            cells.push(label);
            children.push(node.child_at(i));
        }
        out.push_str(&format!(
            "  INT_{} [shape=record label=\"P={} size={}/{}|{}\"];\n",
            pid.page_num,
            pid.page_num,
            node.size(),
            node.max_size(),
            cells.join("|")
        ));
        drop(guard);

        for child in children {
            let child_guard = self.pager().fetch_read(child)?;
            let prefix = if PageHeader::page_type_of(child_guard.data()) == PageType::BTreeLeaf {
                "LEAF"
            } else {
                "INT"
            };
            drop(child_guard);
            out.push_str(&format!(
                "  INT_{} -> {}_{};\n",
                pid.page_num, prefix, child.page_num
            ));
            self.dot_node(child, out)?;
        }
        Ok(())
    }

    /// Renders the tree as indented text, one node per line.
    pub fn dump(&self) -> Result<String> {
        let root = self.root_page_id()?;
        if !root.is_valid() {
            return Ok("()".to_string());
        }
        let mut out = String::new();
        self.dump_node(root, 0, &mut out)?;
        Ok(out)
    }

    fn dump_node(&self, pid: PageId, depth: usize, out: &mut String) -> Result<()> {
        let indent = "  ".repeat(depth);
        let guard = self.pager().fetch_read(pid)?;

        if PageHeader::page_type_of(guard.data()) == PageType::BTreeLeaf {
            let leaf = LeafNode::<N>::from_page(guard.data())?;
            let keys: Vec<String> = (0..leaf.size()).map(|i| leaf.key_at(i).to_string()).collect();
            let next = if leaf.next_leaf().is_valid() {
                leaf.next_leaf().to_string()
            } else {
                "-".to_string()
            };
            out.push_str(&format!(
                "{}Leaf[{}] next={} keys: {}\n",
                indent,
                guard.page_id(),
                next,
                keys.join(", ")
            ));
            return Ok(());
        }

        let node = InternalNode::<N>::from_page(guard.data())?;
        let mut cells = Vec::with_capacity(node.size());
        let mut children = Vec::with_capacity(node.size());
        for i in 0..node.size() {
            let label = if i == 0 {
                format!("(-, {})", node.child_at(i))
            } else {
                format!("({}, {})", node.key_at(i), node.child_at(i))
            };
            cells.push(label);
            children.push(node.child_at(i));
        }
        out.push_str(&format!(
            "{}Internal[{}] slots: {}\n",
            indent,
            guard.page_id(),
            cells.join(" ")
        ));
        drop(guard);

        for child in children {
            self.dump_node(child, depth + 1, out)?;
        }
        Ok(())
    }
}
