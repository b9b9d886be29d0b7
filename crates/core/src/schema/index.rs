//! Index type descriptors.

/// Access path implemented by an index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// Unordered full walk over every row. Every table has exactly one.
    Scan,
    /// Ordered tree index.
    BTree,
    /// Hash index for point lookups.
    Hash,
}

/// Index type: the access path plus whether its entries are durable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IndexType {
    kind: IndexKind,
    persistent: bool,
}

impl IndexType {
    /// Creates the type of a table scan index.
    pub fn scan(persistent: bool) -> Self {
        Self {
            kind: IndexKind::Scan,
            persistent,
        }
    }

    /// Creates an index type of the given kind.
    pub fn new(kind: IndexKind, persistent: bool) -> Self {
        Self { kind, persistent }
    }

    /// Returns the access path.
    #[inline]
    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    /// Returns whether this is a table scan.
    #[inline]
    pub fn is_scan(&self) -> bool {
        self.kind == IndexKind::Scan
    }

    /// Returns whether entries are backed by durable storage.
    #[inline]
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }
}
