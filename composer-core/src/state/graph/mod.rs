//! # Graph
//!
//! The layers of a sprite folder form a graph, with leaves on the lowest level (one per image file)
//! and groups forming upper levels. Leaves are not allowed to have children.
//!
//! Child order is compositing order: the first child is the bottom-most layer. Every node carries its
//! own visibility toggle, and a node is only *effectively* visible if it and all of its ancestors are.
//! Effective visibility is evaluated on read and never cached, so hiding a group and showing it again
//! restores whatever its children were set to.

mod stable_id;

pub use stable_id::{AnyID, GraphNamespace, GroupID, LeafID};
use stable_id::RawID;

#[derive(Clone, PartialEq, Debug)]
enum NodeDataTy {
    Root,
    Group,
    Leaf { path: std::path::PathBuf },
}

#[derive(Clone, Debug)]
pub struct NodeData {
    // NOT public, as users could break the tree by mutating these!
    ty: NodeDataTy,
    id: RawID,
    visible: bool,
    pub name: String,
}
impl NodeData {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    /// The node's own toggle. See [`LayerGraph::effective_visible`] for the value that
    /// takes ancestors into account.
    #[must_use]
    pub fn visible(&self) -> bool {
        self.visible
    }
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self.ty, NodeDataTy::Leaf { .. })
    }
    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self.ty, NodeDataTy::Group)
    }
    /// Backing image of a leaf. Always `Some` for leaves, always `None` for groups.
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        match &self.ty {
            NodeDataTy::Leaf { path } => Some(path),
            NodeDataTy::Group | NodeDataTy::Root => None,
        }
    }
    fn any_id(&self) -> Option<AnyID> {
        match self.ty {
            NodeDataTy::Leaf { .. } => Some(AnyID::Leaf(LeafID(self.id))),
            NodeDataTy::Group => Some(AnyID::Group(GroupID(self.id))),
            NodeDataTy::Root => None,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetError {
    #[error("ID not found")]
    TargetNotFound,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReparentError {
    #[error("target not found: {}", .0)]
    TargetError(TargetError),
    #[error("destination not found: {}", .0)]
    DestinationError(TargetError),
    #[error("can't reparent to the node's own [grand]children")]
    WouldCycle,
}

#[derive(Copy, Clone, Debug)]
pub enum Location {
    /// Take the place of this node among its siblings, pushing it one step later.
    BeforeSibling(AnyID),
    /// Set as the nth child of this group, where bottom layer = 0
    ///
    /// An index too large will be clamped to the last position.
    IndexIntoGroup(GroupID, usize),
    /// Set as the nth child of the root, where bottom layer = 0
    ///
    /// An index too large will be clamped to the last position.
    IndexIntoRoot(usize),
}

/// A row of a depth-first listing of the graph, see [`LayerGraph::iter`].
#[derive(Clone, Copy, Debug)]
pub struct Row<'a> {
    /// Zero for children of the root.
    pub depth: usize,
    pub id: AnyID,
    pub data: &'a NodeData,
}

pub struct LayerGraph {
    tree: id_tree::Tree<NodeData>,
    root: id_tree::NodeId,
    ids: hashbrown::HashMap<RawID, id_tree::NodeId>,
}
impl Default for LayerGraph {
    fn default() -> Self {
        let mut tree = id_tree::TreeBuilder::new().build();
        // Inserting a root into an empty tree has no failure modes.
        let root = tree
            .insert(
                id_tree::Node::new(NodeData {
                    name: String::new(),
                    ty: NodeDataTy::Root,
                    id: RawID::next(),
                    visible: true,
                }),
                id_tree::InsertBehavior::AsRoot,
            )
            .expect("inserting root into an empty tree");
        Self {
            tree,
            root,
            ids: hashbrown::HashMap::new(),
        }
    }
}
impl LayerGraph {
    /// Number of groups and leaves, not counting the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
    fn tree_id(&self, id: impl Into<AnyID>) -> Result<&id_tree::NodeId, TargetError> {
        self.ids
            .get(&id.into().raw())
            .ok_or(TargetError::TargetNotFound)
    }
    fn children_of(&self, tree_id: &id_tree::NodeId) -> &[id_tree::NodeId] {
        self.tree
            .get(tree_id)
            .map(|node| node.children().as_slice())
            .unwrap_or(&[])
    }
    /// Iterate the children of this raw ID. A helper method for all various iters!
    fn iter_children_of_raw<'s>(
        &'s self,
        tree_id: &id_tree::NodeId,
    ) -> impl Iterator<Item = (AnyID, &'s NodeData)> + 's {
        self.children_of(tree_id).iter().filter_map(move |child| {
            let data = self.tree.get(child).ok()?.data();
            Some((data.any_id()?, data))
        })
    }
    /// Iterate the children of the root node, bottom layer first.
    pub fn iter_top_level(&self) -> impl Iterator<Item = (AnyID, &NodeData)> + '_ {
        self.iter_children_of_raw(&self.root)
    }
    /// Iterate the children of this group, bottom layer first.
    #[must_use]
    pub fn iter_group(&self, group: GroupID) -> Option<impl Iterator<Item = (AnyID, &NodeData)> + '_> {
        let tree_id = self.ids.get(&group.0)?;
        Some(self.iter_children_of_raw(tree_id))
    }
    /// Every node in depth-first pre-order, i.e. the order a tree view lists them in.
    #[must_use]
    pub fn iter(&self) -> Vec<Row<'_>> {
        fn visit<'s>(graph: &'s LayerGraph, tree_id: &id_tree::NodeId, depth: usize, out: &mut Vec<Row<'s>>) {
            for child in graph.children_of(tree_id) {
                let Ok(node) = graph.tree.get(child) else {
                    continue;
                };
                let data = node.data();
                let Some(id) = data.any_id() else {
                    continue;
                };
                out.push(Row { depth, id, data });
                visit(graph, child, depth + 1, out);
            }
        }
        let mut rows = Vec::with_capacity(self.len());
        visit(self, &self.root, 0, &mut rows);
        rows
    }
    pub fn get(&self, id: impl Into<AnyID>) -> Option<&NodeData> {
        let tree_id = self.tree_id(id).ok()?;
        self.tree.get(tree_id).ok().map(id_tree::Node::data)
    }
    fn get_mut(&mut self, id: impl Into<AnyID>) -> Result<&mut NodeData, TargetError> {
        let tree_id = self.tree_id(id)?.clone();
        self.tree
            .get_mut(&tree_id)
            .map(id_tree::Node::data_mut)
            .map_err(|_| TargetError::TargetNotFound)
    }
    /// Find a node by its name segments from the root, e.g. `["bg", "sky"]`.
    #[must_use]
    pub fn find<S: AsRef<str>>(&self, segments: &[S]) -> Option<AnyID> {
        let mut current = &self.root;
        for segment in segments {
            current = self.children_of(current).iter().find(|child| {
                self.tree
                    .get(child)
                    .is_ok_and(|node| node.data().name == segment.as_ref())
            })?;
        }
        self.tree.get(current).ok()?.data().any_id()
    }
    /// Convert a location to a parent and child idx.
    fn find_location(&self, location: Location) -> Result<(id_tree::NodeId, usize), TargetError> {
        match location {
            Location::BeforeSibling(sibling) => {
                let sibling_tree_id = self.tree_id(sibling)?;
                let (parent, idx) = self.raw_location_of(sibling_tree_id)?;
                Ok((parent.clone(), idx))
            }
            Location::IndexIntoGroup(group, idx) => Ok((self.tree_id(group)?.clone(), idx)),
            Location::IndexIntoRoot(idx) => Ok((self.root.clone(), idx)),
        }
    }
    /// Get the (parent, idx) of this tree node.
    fn raw_location_of(
        &self,
        tree_id: &id_tree::NodeId,
    ) -> Result<(&id_tree::NodeId, usize), TargetError> {
        let node = self
            .tree
            .get(tree_id)
            .map_err(|_| TargetError::TargetNotFound)?;
        // User has no access to the root, so every reachable node has a parent.
        let parent = node.parent().ok_or(TargetError::TargetNotFound)?;
        let idx = self
            .children_of(parent)
            .iter()
            .position(|child| child == tree_id)
            .ok_or(TargetError::TargetNotFound)?;
        Ok((parent, idx))
    }
    /// Get the (parent, idx) of the node. Parent is None if root is the parent.
    pub fn location_of(&self, id: impl Into<AnyID>) -> Result<(Option<GroupID>, usize), TargetError> {
        let (parent, idx) = self.raw_location_of(self.tree_id(id)?)?;
        let parent = self
            .tree
            .get(parent)
            .ok()
            .and_then(|parent| parent.data().any_id())
            .and_then(AnyID::group);
        Ok((parent, idx))
    }
    fn insert(&mut self, location: Location, name: String, ty: NodeDataTy, visible: bool) -> Result<RawID, TargetError> {
        let (parent_id, idx) = self.find_location(location)?;
        let id = RawID::next();
        let new_node = self
            .tree
            .insert(
                id_tree::Node::new(NodeData {
                    name,
                    ty,
                    id,
                    visible,
                }),
                id_tree::InsertBehavior::UnderNode(&parent_id),
            )
            .map_err(|_| TargetError::TargetNotFound)?;
        let last = self.children_of(&parent_id).len().saturating_sub(1);
        self.tree
            .make_nth_sibling(&new_node, idx.min(last))
            .map_err(|_| TargetError::TargetNotFound)?;
        self.ids.insert(id, new_node);
        Ok(id)
    }
    /// Add a group. Groups start out visible.
    pub fn add_group(&mut self, location: Location, name: String) -> Result<GroupID, TargetError> {
        self.insert(location, name, NodeDataTy::Group, true)
            .map(GroupID)
    }
    /// Add a leaf backed by the image at `path`. Leaves start out hidden.
    pub fn add_leaf(
        &mut self,
        location: Location,
        name: String,
        path: std::path::PathBuf,
    ) -> Result<LeafID, TargetError> {
        self.insert(location, name, NodeDataTy::Leaf { path }, false)
            .map(LeafID)
    }
    /// Flip the node's own toggle, returning the new value. Descendants and ancestors are untouched.
    pub fn toggle(&mut self, id: impl Into<AnyID>) -> Result<bool, TargetError> {
        let node = self.get_mut(id)?;
        node.visible = !node.visible;
        Ok(node.visible)
    }
    /// Set the node's own toggle. Returns whether it changed.
    pub fn set_visible(&mut self, id: impl Into<AnyID>, visible: bool) -> Result<bool, TargetError> {
        let node = self.get_mut(id)?;
        let changed = node.visible != visible;
        node.visible = visible;
        Ok(changed)
    }
    /// Whether this node and every ancestor is toggled visible.
    pub fn effective_visible(&self, id: impl Into<AnyID>) -> Result<bool, TargetError> {
        let tree_id = self.tree_id(id)?;
        let own = self
            .tree
            .get(tree_id)
            .map_err(|_| TargetError::TargetNotFound)?
            .data()
            .visible;
        let ancestors = self
            .tree
            .ancestor_ids(tree_id)
            .map_err(|_| TargetError::TargetNotFound)?;
        Ok(own
            && ancestors
                .filter_map(|ancestor| self.tree.get(ancestor).ok())
                .all(|ancestor| ancestor.data().visible))
    }
    /// Swap the node with its previous sibling. Returns false if it is already first.
    pub fn move_up(&mut self, id: impl Into<AnyID>) -> Result<bool, TargetError> {
        let tree_id = self.tree_id(id)?.clone();
        let (_, idx) = self.raw_location_of(&tree_id)?;
        if idx == 0 {
            return Ok(false);
        }
        self.tree
            .make_nth_sibling(&tree_id, idx - 1)
            .map_err(|_| TargetError::TargetNotFound)?;
        Ok(true)
    }
    /// Swap the node with its next sibling. Returns false if it is already last.
    pub fn move_down(&mut self, id: impl Into<AnyID>) -> Result<bool, TargetError> {
        let tree_id = self.tree_id(id)?.clone();
        let (parent, idx) = self.raw_location_of(&tree_id)?;
        if idx + 1 >= self.children_of(parent).len() {
            return Ok(false);
        }
        self.tree
            .make_nth_sibling(&tree_id, idx + 1)
            .map_err(|_| TargetError::TargetNotFound)?;
        Ok(true)
    }
    /// Reparent the target onto a new parent.
    /// Children are brought along for the ride!
    pub fn reparent(&mut self, target: impl Into<AnyID>, destination: Location) -> Result<(), ReparentError> {
        let target_tree_id = self
            .tree_id(target)
            .map_err(ReparentError::TargetError)?
            .clone();
        let (destination_id, idx) = self
            .find_location(destination)
            .map_err(ReparentError::DestinationError)?;
        // Are we trying to reparent to one of this node's own children
        // or itself?
        let ancestors = self
            .tree
            .ancestor_ids(&destination_id)
            .map_err(|_| ReparentError::DestinationError(TargetError::TargetNotFound))?;
        if std::iter::once(&destination_id)
            .chain(ancestors)
            .any(|ancestor| *ancestor == target_tree_id)
        {
            return Err(ReparentError::WouldCycle);
        }
        // A node can't be a child of a leaf.
        if self
            .tree
            .get(&destination_id)
            .is_ok_and(|node| node.data().is_leaf())
        {
            return Err(ReparentError::DestinationError(TargetError::TargetNotFound));
        }

        self.tree
            .move_node(&target_tree_id, id_tree::MoveBehavior::ToParent(&destination_id))
            .map_err(|_| ReparentError::TargetError(TargetError::TargetNotFound))?;
        // The target itself may have been counted before the sibling.
        let idx = match destination {
            Location::BeforeSibling(sibling) => self
                .tree_id(sibling)
                .ok()
                .and_then(|sibling| {
                    self.children_of(&destination_id)
                        .iter()
                        .filter(|child| **child != target_tree_id)
                        .position(|child| child == sibling)
                })
                .unwrap_or(idx),
            _ => idx,
        };
        let last = self.children_of(&destination_id).len().saturating_sub(1);
        self.tree
            .make_nth_sibling(&target_tree_id, idx.min(last))
            .map_err(|_| ReparentError::TargetError(TargetError::TargetNotFound))?;
        Ok(())
    }
    /// Every effectively visible leaf, in compositing order (first = bottom layer).
    ///
    /// Hidden groups are skipped along with their entire subtree.
    #[must_use]
    pub fn visible_leaves(&self) -> Vec<(LeafID, &std::path::Path)> {
        fn visit<'s>(
            graph: &'s LayerGraph,
            tree_id: &id_tree::NodeId,
            out: &mut Vec<(LeafID, &'s std::path::Path)>,
        ) {
            for child in graph.children_of(tree_id) {
                let Ok(node) = graph.tree.get(child) else {
                    continue;
                };
                let data = node.data();
                if !data.visible {
                    continue;
                }
                match &data.ty {
                    NodeDataTy::Leaf { path } => out.push((LeafID(data.id), path)),
                    NodeDataTy::Group => visit(graph, child, out),
                    // Root is never a child.
                    NodeDataTy::Root => (),
                }
            }
        }
        let mut leaves = Vec::new();
        visit(self, &self.root, &mut leaves);
        leaves
    }
}
