//! Radix Index Module
//!
//! Fixed-depth trie over digest digit groups, stored in an arena.
//!
//! Nodes reference their parent and children by [`NodeId`] rather than by
//! pointer. The arena owns every node; a parent link is only an index, so the
//! upward pruning walk never holds a reference into the structure it edits.

use std::num::NonZeroU32;

use crate::cache::DigitWidth;

// == Node Id ==
/// Stable identity of a trie node inside the arena.
///
/// A leaf's id is the key of its row in the leaf registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// The root node. Never freed.
    pub const ROOT: NodeId = NodeId(NonZeroU32::MIN);

    /// # Panics
    /// If the arena outgrows `u32::MAX - 1` nodes.
    fn from_index(index: usize) -> Self {
        u32::try_from(index)
            .ok()
            .and_then(|i| i.checked_add(1))
            .and_then(NonZeroU32::new)
            .map(Self)
            .expect("trie arena exceeded u32::MAX - 1 nodes")
    }

    fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    /// Position of this node in its parent's slot array
    slot: usize,
    children: Box<[Option<NodeId>]>,
    occupied: usize,
}

impl Node {
    fn new(fan_out: usize, parent: Option<NodeId>, slot: usize) -> Self {
        Self {
            parent,
            slot,
            children: vec![None; fan_out].into_boxed_slice(),
            occupied: 0,
        }
    }
}

// == Radix Index ==
/// Arena-backed radix trie.
#[derive(Debug)]
pub struct RadixIndex {
    width: DigitWidth,
    nodes: Vec<Node>,
    /// Detached arena slots available for reuse
    free: Vec<NodeId>,
}

impl RadixIndex {
    // == Constructor ==
    /// Creates an index holding only the root node.
    pub fn new(width: DigitWidth) -> Self {
        Self {
            width,
            nodes: vec![Node::new(width.fan_out(), None, 0)],
            free: Vec::new(),
        }
    }

    // == Ensure Path ==
    /// Walks `digits` from the root, creating any missing child on the way,
    /// and returns the node at the final level.
    ///
    /// Takes `&mut self`, so the whole check-and-create walk happens under
    /// whatever exclusive guard the caller holds.
    pub fn ensure_path(&mut self, digits: impl IntoIterator<Item = usize>) -> NodeId {
        let mut current = NodeId::ROOT;
        for digit in digits {
            let slot = self.nodes[current.index()].children[digit];
            current = match slot {
                Some(child) => child,
                None => self.attach(current, digit),
            };
        }
        current
    }

    // == Lookup Path ==
    /// Walks `digits` from the root, stopping at the first empty slot.
    pub fn lookup_path(&self, digits: impl IntoIterator<Item = usize>) -> Option<NodeId> {
        let mut current = NodeId::ROOT;
        for digit in digits {
            current = self.nodes[current.index()].children[digit]?;
        }
        Some(current)
    }

    // == Prune ==
    /// Detaches `leaf` and every ancestor left without children, stopping at
    /// the first ancestor that still has an occupied slot or at the root.
    ///
    /// The caller must already have removed the leaf's registry row.
    /// Returns the number of nodes freed.
    pub fn prune(&mut self, leaf: NodeId) -> usize {
        let mut current = leaf;
        let mut freed = 0;

        while current != NodeId::ROOT {
            let node = &self.nodes[current.index()];
            if node.occupied > 0 {
                break;
            }
            let Some(parent) = node.parent else {
                break;
            };
            let slot = node.slot;

            let parent_node = &mut self.nodes[parent.index()];
            parent_node.children[slot] = None;
            parent_node.occupied -= 1;

            self.release(current);
            freed += 1;
            current = parent;
        }

        freed
    }

    // == Node Count ==
    /// Number of live nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Number of occupied child slots of `node`.
    #[cfg(test)]
    pub fn child_count(&self, node: NodeId) -> usize {
        self.nodes[node.index()].occupied
    }

    fn attach(&mut self, parent: NodeId, slot: usize) -> NodeId {
        let child = match self.free.pop() {
            Some(id) => {
                let node = &mut self.nodes[id.index()];
                node.parent = Some(parent);
                node.slot = slot;
                id
            }
            None => {
                let id = NodeId::from_index(self.nodes.len());
                self.nodes
                    .push(Node::new(self.width.fan_out(), Some(parent), slot));
                id
            }
        };

        let parent_node = &mut self.nodes[parent.index()];
        parent_node.children[slot] = Some(child);
        parent_node.occupied += 1;
        child
    }

    fn release(&mut self, id: NodeId) {
        // Only childless nodes are released, so the slot array is already clear
        self.nodes[id.index()].parent = None;
        self.free.push(id);
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn path(width: DigitWidth, digest: u64) -> impl Iterator<Item = usize> {
        width.digits(digest)
    }

    #[test]
    fn test_new_index_has_only_root() {
        let index = RadixIndex::new(DigitWidth::Four);
        assert_eq!(index.node_count(), 1);
        assert_eq!(index.child_count(NodeId::ROOT), 0);
    }

    #[test]
    fn test_ensure_path_creates_full_depth() {
        let mut index = RadixIndex::new(DigitWidth::Four);
        let leaf = index.ensure_path(path(DigitWidth::Four, 0xdead_beef));

        assert_ne!(leaf, NodeId::ROOT);
        assert_eq!(index.node_count(), 1 + DigitWidth::Four.depth());
        assert_eq!(index.lookup_path(path(DigitWidth::Four, 0xdead_beef)), Some(leaf));
    }

    #[test]
    fn test_ensure_path_is_idempotent() {
        let mut index = RadixIndex::new(DigitWidth::Eight);
        let first = index.ensure_path(path(DigitWidth::Eight, 42));
        let nodes = index.node_count();
        let second = index.ensure_path(path(DigitWidth::Eight, 42));

        assert_eq!(first, second);
        assert_eq!(index.node_count(), nodes);
    }

    #[test]
    fn test_shared_prefix_shares_nodes() {
        let mut index = RadixIndex::new(DigitWidth::Four);
        // Same low 60 bits, different top digit
        let a = 0x0fff_ffff_ffff_ffff_u64;
        let b = 0x1fff_ffff_ffff_ffff_u64;
        let leaf_a = index.ensure_path(path(DigitWidth::Four, a));
        let leaf_b = index.ensure_path(path(DigitWidth::Four, b));

        assert_ne!(leaf_a, leaf_b);
        assert_eq!(index.node_count(), 1 + 16 + 1);
    }

    #[test]
    fn test_lookup_missing_path() {
        let mut index = RadixIndex::new(DigitWidth::Four);
        assert_eq!(index.lookup_path(path(DigitWidth::Four, 7)), None);

        index.ensure_path(path(DigitWidth::Four, 7));
        // Diverges in the last digit only
        assert_eq!(
            index.lookup_path(path(DigitWidth::Four, 0x7000_0000_0000_0007)),
            None
        );
    }

    #[test]
    fn test_prune_single_path_collapses_to_root() {
        let mut index = RadixIndex::new(DigitWidth::Four);
        let leaf = index.ensure_path(path(DigitWidth::Four, 0x1234));

        let freed = index.prune(leaf);

        assert_eq!(freed, 16);
        assert_eq!(index.node_count(), 1);
        assert_eq!(index.child_count(NodeId::ROOT), 0);
        assert_eq!(index.lookup_path(path(DigitWidth::Four, 0x1234)), None);
    }

    #[test]
    fn test_prune_stops_at_branching_ancestor() {
        let mut index = RadixIndex::new(DigitWidth::Four);
        let a = 0x0fff_ffff_ffff_ffff_u64;
        let b = 0x1fff_ffff_ffff_ffff_u64;
        let leaf_a = index.ensure_path(path(DigitWidth::Four, a));
        let leaf_b = index.ensure_path(path(DigitWidth::Four, b));

        assert_eq!(index.prune(leaf_a), 1);
        assert_eq!(index.lookup_path(path(DigitWidth::Four, a)), None);
        assert_eq!(index.lookup_path(path(DigitWidth::Four, b)), Some(leaf_b));
        assert_eq!(index.node_count(), 1 + 16);
    }

    #[test]
    fn test_prune_branch_near_root() {
        let mut index = RadixIndex::new(DigitWidth::Eight);
        let leaf_a = index.ensure_path(path(DigitWidth::Eight, 0x01));
        index.ensure_path(path(DigitWidth::Eight, 0x02));

        assert_eq!(index.prune(leaf_a), 8);
        assert_eq!(index.child_count(NodeId::ROOT), 1);
        assert_eq!(index.node_count(), 1 + 8);
    }

    #[test]
    fn test_prune_root_is_noop() {
        let mut index = RadixIndex::new(DigitWidth::Four);
        assert_eq!(index.prune(NodeId::ROOT), 0);
        assert_eq!(index.node_count(), 1);
    }

    #[test]
    fn test_node_id_round_trips_index() {
        assert_eq!(NodeId::from_index(0), NodeId::ROOT);
        let last = u32::MAX as usize - 1;
        assert_eq!(NodeId::from_index(last).index(), last);
    }

    #[test]
    #[should_panic(expected = "trie arena exceeded")]
    fn test_node_id_rejects_overflow() {
        NodeId::from_index(u32::MAX as usize);
    }

    #[test]
    fn test_released_nodes_are_reused() {
        let mut index = RadixIndex::new(DigitWidth::Sixteen);
        let leaf = index.ensure_path(path(DigitWidth::Sixteen, 99));
        let allocated = index.nodes.len();
        index.prune(leaf);

        let again = index.ensure_path(path(DigitWidth::Sixteen, 0xffff_0000_0000_0063));
        assert_eq!(index.nodes.len(), allocated);
        assert_eq!(
            index.lookup_path(path(DigitWidth::Sixteen, 0xffff_0000_0000_0063)),
            Some(again)
        );
        assert_eq!(index.lookup_path(path(DigitWidth::Sixteen, 99)), None);
    }
}
