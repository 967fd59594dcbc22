//! Outer/hole nesting of a clipping result.

use slotmap::SlotMap;

use crate::math::{Path, Paths};

slotmap::new_key_type! {
    /// Unique identifier for a node of a [`PolyTree`].
    pub struct PolyNodeId;
}

/// One contour of a [`PolyTree`] with its nested children.
#[derive(Debug, Clone, Default)]
pub struct PolyNode {
    contour: Path,
    parent: Option<PolyNodeId>,
    children: Vec<PolyNodeId>,
    index: usize,
    is_open: bool,
}

impl PolyNode {
    /// Vertices of the contour, in output orientation.
    #[must_use]
    pub fn contour(&self) -> &[crate::math::IntPoint] {
        &self.contour
    }

    /// Enclosing node, `None` for top-level contours.
    #[must_use]
    pub fn parent(&self) -> Option<PolyNodeId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[PolyNodeId] {
        &self.children
    }

    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Position among the parent's children (or among the top-level nodes).
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether the contour is an open polyline. Open nodes are always
    /// top-level and never have children.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.is_open
    }
}

/// Nested result of [`Clipper::execute_tree`](super::Clipper::execute_tree).
///
/// Top-level nodes are outers; each level below alternates between holes and
/// outers. Nodes live in an arena and refer to each other by [`PolyNodeId`].
#[derive(Debug, Clone, Default)]
pub struct PolyTree {
    nodes: SlotMap<PolyNodeId, PolyNode>,
    roots: Vec<PolyNodeId>,
}

impl PolyTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn new_node(&mut self, contour: Path, is_open: bool) -> PolyNodeId {
        self.nodes.insert(PolyNode {
            contour,
            is_open,
            ..PolyNode::default()
        })
    }

    /// Appends `child` under `parent`, or at the top level for `None`.
    pub(crate) fn add_child(&mut self, parent: Option<PolyNodeId>, child: PolyNodeId) {
        let siblings = match parent.and_then(|p| self.nodes.get_mut(p)) {
            Some(node) => &mut node.children,
            None => &mut self.roots,
        };
        let index = siblings.len();
        siblings.push(child);
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = parent;
            node.index = index;
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
    }

    /// Number of nodes at every level.
    #[must_use]
    pub fn total(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level nodes in output order.
    #[must_use]
    pub fn roots(&self) -> &[PolyNodeId] {
        &self.roots
    }

    #[must_use]
    pub fn node(&self, id: PolyNodeId) -> Option<&PolyNode> {
        self.nodes.get(id)
    }

    /// Whether the node is a hole, i.e. sits at an odd depth.
    #[must_use]
    pub fn is_hole(&self, id: PolyNodeId) -> bool {
        let mut hole = false;
        let mut parent = self.node(id).and_then(PolyNode::parent);
        while let Some(p) = parent {
            hole = !hole;
            parent = self.node(p).and_then(PolyNode::parent);
        }
        hole
    }

    /// First node of a depth-first walk.
    #[must_use]
    pub fn first(&self) -> Option<PolyNodeId> {
        self.roots.first().copied()
    }

    /// Node after `id` in a depth-first walk: its first child, else the
    /// next sibling of it or of its nearest ancestor that has one.
    #[must_use]
    pub fn next(&self, id: PolyNodeId) -> Option<PolyNodeId> {
        let node = self.node(id)?;
        match node.children.first() {
            Some(&child) => Some(child),
            None => self.next_sibling_up(id),
        }
    }

    fn next_sibling_up(&self, mut id: PolyNodeId) -> Option<PolyNodeId> {
        loop {
            let node = self.node(id)?;
            let siblings = match node.parent {
                Some(p) => &self.node(p)?.children,
                None => &self.roots,
            };
            if let Some(&sibling) = siblings.get(node.index + 1) {
                return Some(sibling);
            }
            id = node.parent?;
        }
    }

    /// Every node in depth-first order.
    pub fn iter(&self) -> impl Iterator<Item = PolyNodeId> + '_ {
        std::iter::successors(self.first(), move |&id| self.next(id))
    }

    fn collect_paths(&self, ids: &[PolyNodeId], closed_only: bool, out: &mut Paths) {
        for &id in ids {
            let Some(node) = self.node(id) else {
                continue;
            };
            if !(closed_only && node.is_open) && !node.contour.is_empty() {
                out.push(node.contour.clone());
            }
            self.collect_paths(&node.children, closed_only, out);
        }
    }
}

/// Contours of every node, parents before children.
#[must_use]
pub fn poly_tree_to_paths(tree: &PolyTree) -> Paths {
    let mut paths = Vec::with_capacity(tree.total());
    tree.collect_paths(&tree.roots, false, &mut paths);
    paths
}

/// Contours of the closed nodes, parents before children.
#[must_use]
pub fn closed_paths_from_tree(tree: &PolyTree) -> Paths {
    let mut paths = Vec::with_capacity(tree.total());
    tree.collect_paths(&tree.roots, true, &mut paths);
    paths
}

/// Contours of the open nodes.
#[must_use]
pub fn open_paths_from_tree(tree: &PolyTree) -> Paths {
    tree.roots
        .iter()
        .filter_map(|&id| tree.node(id))
        .filter(|node| node.is_open)
        .map(|node| node.contour.clone())
        .collect()
}
