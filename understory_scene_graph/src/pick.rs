// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hit testing.
//!
//! Picking walks depth-first from a start node, usually a camera. At each
//! node the query region is mapped into local space and compared with the
//! cached full bounds; a miss prunes the whole subtree. Children are tried
//! top-most first and the first hit wins. A node that is pickable is hit
//! only if no child was, and only where the region touches its own local
//! bounds.
//!
//! Cameras try their own children first, then their layers (top-most first,
//! through the view transform and only inside the camera's local bounds),
//! and finally themselves. Composite nodes report any hit in their subtree as
//! a hit on themselves.
//!
//! A subtree whose accumulated transform is not invertible cannot be hit; it
//! is logged at `warn` level and skipped.

use kurbo::{Affine, Point, Rect};
use smallvec::SmallVec;

use crate::bounds::Bounds;
use crate::error::Error;
use crate::tree::Scene;
use crate::types::{NodeFlags, NodeId, NodeKind};
use crate::util::try_invert;

/// One step of a [`PickPath`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PathEntry {
    node: NodeId,
    transform: Affine,
    is_camera: bool,
}

impl PathEntry {
    /// The node at this step.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Maps this node's local space into pick space (the space of the start
    /// node's parent), including the view transforms of every camera above.
    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// Returns `true` if this node is a camera.
    pub fn is_camera(&self) -> bool {
        self.is_camera
    }
}

/// The result of a successful pick: the chain of nodes from the start node
/// down to the picked node, with the transform accumulated at each step.
///
/// A path is a snapshot. It holds identifiers only and stays usable after the
/// scene changes, although its transforms then describe the scene as it was.
#[derive(Clone, Debug, PartialEq)]
pub struct PickPath {
    entries: SmallVec<[PathEntry; 8]>,
    region: Rect,
}

impl PickPath {
    /// The picked node: the last entry of the path.
    pub fn picked_node(&self) -> NodeId {
        self.entries[self.entries.len() - 1].node
    }

    /// All entries, start node first.
    pub fn entries(&self) -> &[PathEntry] {
        &self.entries
    }

    /// The nodes on the path, start node first.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.iter().map(|e| e.node)
    }

    /// The query region, in pick space.
    pub fn pick_region(&self) -> Rect {
        self.region
    }

    /// Returns `true` if `node` is on the path.
    pub fn contains(&self, node: NodeId) -> bool {
        self.entries.iter().any(|e| e.node == node)
    }

    /// The outermost camera on the path, normally the one picking started at.
    pub fn top_camera(&self) -> Option<NodeId> {
        self.entries.iter().find(|e| e.is_camera).map(|e| e.node)
    }

    /// The innermost camera on the path: the one that views the picked node.
    pub fn bottom_camera(&self) -> Option<NodeId> {
        self.entries.iter().rev().find(|e| e.is_camera).map(|e| e.node)
    }

    /// The transform from `node`'s local space into pick space.
    pub fn transform_to(&self, node: NodeId) -> Option<Affine> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.node == node)
            .map(|e| e.transform)
    }

    /// Map a point from `node`'s local space into pick space.
    pub fn local_to_pick(&self, node: NodeId, point: Point) -> Result<Point, Error> {
        Ok(self.entry_transform(node)? * point)
    }

    /// Map a point from pick space into `node`'s local space.
    ///
    /// For the picked node this answers "where in my own coordinates was I
    /// hit".
    pub fn pick_to_local(&self, node: NodeId, point: Point) -> Result<Point, Error> {
        Ok(try_invert(self.entry_transform(node)?)? * point)
    }

    /// Map a rectangle from pick space into `node`'s local space.
    pub fn pick_rect_to_local(&self, node: NodeId, rect: Rect) -> Result<Bounds, Error> {
        let inverse = try_invert(self.entry_transform(node)?)?;
        Ok(Bounds::from_rect(rect).transformed(inverse))
    }

    fn entry_transform(&self, node: NodeId) -> Result<Affine, Error> {
        self.transform_to(node).ok_or(Error::NotFound(node))
    }
}

impl Scene {
    /// Find the top-most node under `point`, grown by `halo` on every side.
    ///
    /// `point` is given in the space of `start`'s parent; for a root camera
    /// that is device space. Returns `Ok(None)` when nothing is hit.
    ///
    /// ```rust
    /// use kurbo::Point;
    /// use understory_scene_graph::{Bounds, LocalNode, Scene};
    ///
    /// let mut scene = Scene::new();
    /// let root = scene.insert(None, LocalNode::default()).unwrap();
    /// let a = scene
    ///     .insert(
    ///         Some(root),
    ///         LocalNode {
    ///             local_bounds: Bounds::new(0.0, 0.0, 50.0, 50.0),
    ///             ..LocalNode::default()
    ///         },
    ///     )
    ///     .unwrap();
    ///
    /// let path = scene.pick(root, Point::new(10.0, 10.0), 0.0).unwrap().unwrap();
    /// assert_eq!(path.picked_node(), a);
    /// assert!(scene.pick(root, Point::new(500.0, 500.0), 0.0).unwrap().is_none());
    /// ```
    pub fn pick(
        &mut self,
        start: NodeId,
        point: Point,
        halo: f64,
    ) -> Result<Option<PickPath>, Error> {
        if !point.is_finite() || !halo.is_finite() || halo < 0.0 {
            return Err(Error::InvalidNumeric);
        }
        let region = Rect::new(point.x - halo, point.y - halo, point.x + halo, point.y + halo);
        self.pick_rect(start, region)
    }

    /// Find the top-most node touching `region`, given in the space of
    /// `start`'s parent. An empty region never hits.
    pub fn pick_rect(
        &mut self,
        start: NodeId,
        region: impl Into<Bounds>,
    ) -> Result<Option<PickPath>, Error> {
        let region = region.into();
        self.live(start)?;
        if !region.is_finite() {
            return Err(Error::InvalidNumeric);
        }
        let Some(rect) = region.rect() else {
            return Ok(None);
        };
        let mut path = PickPath {
            entries: SmallVec::new(),
            region: rect,
        };
        if self.full_pick(start, Affine::IDENTITY, &mut path) {
            Ok(Some(path))
        } else {
            Ok(None)
        }
    }

    /// Try `id` and its subtree. On a hit the path ends at the picked node;
    /// on a miss it is left as it was.
    fn full_pick(&mut self, id: NodeId, parent_transform: Affine, path: &mut PickPath) -> bool {
        let node = self.node(id);
        let flags = node.local.flags;
        if !flags.contains(NodeFlags::VISIBLE)
            || !flags.intersects(NodeFlags::PICKABLE | NodeFlags::CHILDREN_PICKABLE)
        {
            return false;
        }
        let kind = node.local.kind;
        let transform = parent_transform * node.local.local_transform;
        let inverse = match try_invert(transform) {
            Ok(inverse) => inverse,
            Err(err) => {
                log::warn!("skipping {id:?} while picking: {err}");
                return false;
            }
        };
        let local_region = Bounds::from_rect(path.region).transformed(inverse);
        if !self.validate_full_bounds(id).intersects(local_region) {
            return false;
        }

        path.entries.push(PathEntry {
            node: id,
            transform,
            is_camera: kind == NodeKind::Camera,
        });
        let depth = path.entries.len();
        let hit = (flags.contains(NodeFlags::CHILDREN_PICKABLE)
            && self.pick_children(id, transform, path))
            || self.pick_after_children(id, transform, local_region, flags, path);
        if !hit {
            path.entries.truncate(depth - 1);
            return false;
        }
        if kind == NodeKind::Composite && path.entries.len() > depth {
            path.entries.truncate(depth);
        }
        true
    }

    fn pick_children(&mut self, id: NodeId, transform: Affine, path: &mut PickPath) -> bool {
        let mut i = self.node(id).children.len();
        while i > 0 {
            i -= 1;
            let child = self.node(id).children[i];
            if self.full_pick(child, transform, path) {
                return true;
            }
        }
        false
    }

    /// Hit the node itself, or for cameras, its layers and then itself.
    fn pick_after_children(
        &mut self,
        id: NodeId,
        transform: Affine,
        local_region: Bounds,
        flags: NodeFlags,
        path: &mut PickPath,
    ) -> bool {
        if !self.node(id).local.local_bounds.intersects(local_region) {
            return false;
        }
        if flags.contains(NodeFlags::CHILDREN_PICKABLE)
            && let Some(view) = self.node(id).camera.as_ref().map(|c| c.view_transform)
        {
            let layer_transform = transform * view;
            let mut i = self.node(id).camera.as_ref().map_or(0, |c| c.layers.len());
            while i > 0 {
                i -= 1;
                let Some(layer) = self.node(id).camera.as_ref().map(|c| c.layers[i]) else {
                    break;
                };
                if !self.is_alive(layer) {
                    log::debug!("camera {id:?} skipping stale layer {layer:?}");
                    continue;
                }
                if self.layer_contains_path_camera(layer, path) {
                    log::debug!("camera {id:?} skipping layer {layer:?}: it contains a picking camera");
                    continue;
                }
                if self.full_pick(layer, layer_transform, path) {
                    return true;
                }
            }
        }
        flags.contains(NodeFlags::PICKABLE)
    }

    /// Picking into `layer` would reach a camera already on the path again.
    fn layer_contains_path_camera(&self, layer: NodeId, path: &PickPath) -> bool {
        path.entries
            .iter()
            .filter(|e| e.is_camera)
            .any(|e| e.node == layer || self.is_ancestor_of(layer, e.node))
    }
}
