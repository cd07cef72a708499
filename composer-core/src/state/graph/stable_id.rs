//! Process-unique IDs for graph nodes. `id_tree`'s own `NodeId`s are an implementation detail of the
//! current graph, these stay valid for as long as the node exists and never resolve in a different graph.

/// Namespace marker for layer graph IDs.
pub struct GraphNamespace;

pub(super) type RawID = crate::FuzzID<GraphNamespace>;

// Shhh.. they're secretly the same type >:3c
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct LeafID(pub(super) RawID);
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct GroupID(pub(super) RawID);
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnyID {
    Leaf(LeafID),
    Group(GroupID),
}
impl std::hash::Hash for AnyID {
    // Forego including type in the hash, as a Leaf and Group may never share an ID.
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw().hash(state);
    }
}
impl From<LeafID> for AnyID {
    fn from(value: LeafID) -> Self {
        Self::Leaf(value)
    }
}
impl From<GroupID> for AnyID {
    fn from(value: GroupID) -> Self {
        Self::Group(value)
    }
}
impl AnyID {
    pub(super) fn raw(self) -> RawID {
        match self {
            AnyID::Leaf(LeafID(id)) | AnyID::Group(GroupID(id)) => id,
        }
    }
    #[must_use]
    pub fn leaf(self) -> Option<LeafID> {
        match self {
            AnyID::Leaf(id) => Some(id),
            AnyID::Group(_) => None,
        }
    }
    #[must_use]
    pub fn group(self) -> Option<GroupID> {
        match self {
            AnyID::Group(id) => Some(id),
            AnyID::Leaf(_) => None,
        }
    }
}
impl std::fmt::Display for AnyID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnyID::Leaf(LeafID(id)) => write!(f, "leaf {}", id.id()),
            AnyID::Group(GroupID(id)) => write!(f, "group {}", id.id()),
        }
    }
}
