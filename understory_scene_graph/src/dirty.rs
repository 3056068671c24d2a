// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Full-bounds cache state.

/// Validity of a node's cached full bounds.
///
/// Ordered by how much work validation needs; marking never downgrades.
/// Invariant: every ancestor of a `ChildDirty` node is `ChildDirty`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum BoundsState {
    /// The cache matches the subtree.
    #[default]
    Clean,
    /// The node's own bounds, transform, or child list changed. Children's
    /// caches are valid; only the union needs recomputing.
    SelfDirty,
    /// Some descendant's cache is stale. Validation descends into non-clean
    /// children before recomputing the union.
    ChildDirty,
}

impl BoundsState {
    pub(crate) fn mark(&mut self, state: Self) {
        if state > *self {
            *self = state;
        }
    }

    pub(crate) fn is_clean(self) -> bool {
        self == Self::Clean
    }
}
