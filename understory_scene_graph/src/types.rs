// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the scene graph: node identifiers, flags, kinds, and local geometry.

use kurbo::Affine;

use crate::bounds::Bounds;

/// Identifier for a node in a [`Scene`](crate::Scene) (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Node flags controlling visibility and picking.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node is visible. Invisible nodes and their subtrees are never picked
        /// and are skipped by intersection queries, but still contribute to
        /// their ancestors' full bounds.
        const VISIBLE           = 0b0000_0001;
        /// Node itself may be reported as a pick result.
        const PICKABLE          = 0b0000_0010;
        /// Picking descends into this node's children (and, for cameras, layers).
        const CHILDREN_PICKABLE = 0b0000_0100;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::PICKABLE | Self::CHILDREN_PICKABLE
    }
}

/// How a node participates in picking.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// An ordinary node.
    #[default]
    Plain,
    /// A grouping node: a pick that lands on any descendant is reported as
    /// landing on the composite itself.
    Composite,
    /// A camera: views an ordered list of layers through a view transform.
    Camera,
}

/// Initial data for a node.
#[derive(Clone, Debug)]
pub struct LocalNode {
    /// The node's own extent in its local space, excluding children.
    ///
    /// Grouping nodes usually leave this [`Bounds::EMPTY`]; cameras use it as
    /// their viewport.
    pub local_bounds: Bounds,
    /// Maps the node's local space into its parent's space.
    pub local_transform: Affine,
    /// Visibility and picking flags.
    pub flags: NodeFlags,
    /// Pick behavior of the node.
    pub kind: NodeKind,
}

impl Default for LocalNode {
    fn default() -> Self {
        Self {
            local_bounds: Bounds::EMPTY,
            local_transform: Affine::IDENTITY,
            flags: NodeFlags::default(),
            kind: NodeKind::Plain,
        }
    }
}
