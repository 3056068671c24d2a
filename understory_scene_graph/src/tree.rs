// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core scene implementation: structure, mutation, and the full-bounds cache.

use alloc::vec::Vec;
use hashbrown::HashMap;
use kurbo::{Affine, Point, Rect, Vec2};
use smallvec::SmallVec;

use crate::bounds::Bounds;
use crate::camera::CameraState;
use crate::damage::DamageLog;
use crate::dirty::BoundsState;
use crate::error::Error;
use crate::types::{LocalNode, NodeFlags, NodeId, NodeKind};
use crate::util::try_invert;

/// A forest of nodes with cached subtree bounds.
///
/// Every node owns its children exclusively; a node has at most one parent,
/// and removing it from that parent makes it a root again. Cameras add a
/// second, non-owning relationship on top of the forest: they observe layers
/// (see [`Scene::add_layer`]).
///
/// Mutations never recompute bounds eagerly. They mark the changed node and
/// walk up the parent chain, stopping at the first ancestor that is already
/// marked, so a burst of sibling edits costs `O(depth)` in total rather than
/// per edit. [`Scene::full_bounds`] then recomputes only the stale part of the
/// subtree and caches the result.
///
/// ## Example
///
/// ```rust
/// use kurbo::{Affine, Rect};
/// use understory_scene_graph::{Bounds, LocalNode, Scene};
///
/// let mut scene = Scene::new();
/// let root = scene.insert(None, LocalNode::default()).unwrap();
/// let child = scene
///     .insert(
///         Some(root),
///         LocalNode {
///             local_bounds: Bounds::new(0.0, 0.0, 10.0, 10.0),
///             local_transform: Affine::translate((100.0, 0.0)),
///             ..LocalNode::default()
///         },
///     )
///     .unwrap();
///
/// assert_eq!(
///     scene.full_bounds(root).unwrap().rect(),
///     Some(Rect::new(100.0, 0.0, 110.0, 10.0))
/// );
///
/// scene.set_local_bounds(child, Bounds::new(0.0, 0.0, 20.0, 20.0)).unwrap();
/// assert_eq!(
///     scene.full_bounds(root).unwrap().rect(),
///     Some(Rect::new(100.0, 0.0, 120.0, 20.0))
/// );
/// ```
pub struct Scene {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    /// layer -> cameras observing it, one entry per observation
    pub(crate) observers: HashMap<NodeId, SmallVec<[NodeId; 2]>>,
    pub(crate) damage: DamageLog,
    full_bounds_recomputes: u64,
    invalidation_steps: u64,
}

impl core::fmt::Debug for Scene {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        let free = self.free_list.len();
        f.debug_struct("Scene")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &free)
            .field("observed_layers", &self.observers.len())
            .field("full_bounds_recomputes", &self.full_bounds_recomputes)
            .finish_non_exhaustive()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters for inspecting cache behavior.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SceneStats {
    /// Number of live nodes.
    pub nodes_alive: usize,
    /// Number of full-bounds recomputations since the scene was created.
    pub full_bounds_recomputes: u64,
    /// Number of ancestors visited while propagating invalidation, including
    /// the already-marked ancestor each walk stops at.
    pub invalidation_steps: u64,
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    generation: u32,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) local: LocalNode,
    /// Local bounds unioned with every child's full bounds, in local space.
    pub(crate) full_bounds: Bounds,
    pub(crate) bounds_state: BoundsState,
    pub(crate) camera: Option<CameraState>,
}

impl Node {
    fn new(generation: u32, local: LocalNode) -> Self {
        let camera = (local.kind == NodeKind::Camera).then(CameraState::default);
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            local,
            full_bounds: Bounds::EMPTY,
            bounds_state: BoundsState::SelfDirty,
            camera,
        }
    }
}

impl Scene {
    /// Create a new empty scene.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            observers: HashMap::new(),
            damage: DamageLog::default(),
            full_bounds_recomputes: 0,
            invalidation_steps: 0,
        }
    }

    /// Create a node, appended as the last (top-most) child of `parent`, or as
    /// a new root if `parent` is `None`.
    ///
    /// Fails with [`Error::InvalidNumeric`] if the transform or bounds are not
    /// finite, and with [`Error::NotFound`] if `parent` is stale.
    pub fn insert(&mut self, parent: Option<NodeId>, local: LocalNode) -> Result<NodeId, Error> {
        if !local.local_transform.is_finite() || !local.local_bounds.is_finite() {
            return Err(Error::InvalidNumeric);
        }
        if let Some(p) = parent
            && !self.is_alive(p)
        {
            return Err(Error::NotFound(p));
        }
        let id = self.alloc(local);
        if let Some(p) = parent {
            self.link(p, None, id);
        }
        self.record_damage(id);
        Ok(id)
    }

    fn alloc(&mut self, local: LocalNode) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, local));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, local)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        NodeId::new(idx, generation)
    }

    /// Append `child` as the last (top-most) child of `parent`.
    ///
    /// `child` must not already have a parent and must not be `parent` or one
    /// of its ancestors; otherwise [`Error::StructuralConflict`] is returned.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), Error> {
        let len = self.live(parent)?.children.len();
        self.insert_child(parent, len, child)
    }

    /// Insert `child` into `parent`'s child list at `index`.
    ///
    /// Later children paint on top of and are picked before earlier ones.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<(), Error> {
        let len = self.live(parent)?.children.len();
        if let Some(existing) = self.live(child)?.parent {
            return Err(Error::StructuralConflict {
                node: child,
                parent: existing,
            });
        }
        self.check_no_cycle(parent, child)?;
        if index > len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        self.record_damage(child);
        self.link(parent, Some(index), child);
        Ok(())
    }

    /// Detach `child` from `parent`. The child and its subtree stay alive as a
    /// new root.
    ///
    /// Fails with [`Error::NotFound`] if `child` is not currently a child of
    /// `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), Error> {
        self.live(parent)?;
        if self.live(child)?.parent != Some(parent) {
            return Err(Error::NotFound(child));
        }
        self.record_damage(child);
        self.unlink(child);
        Ok(())
    }

    /// Detach `id` from its parent, if any, returning the former parent.
    pub fn remove_from_parent(&mut self, id: NodeId) -> Result<Option<NodeId>, Error> {
        let parent = self.live(id)?.parent;
        if let Some(parent) = parent {
            self.remove_child(parent, id)?;
        }
        Ok(parent)
    }

    /// Destroy a node and its entire subtree.
    ///
    /// The node is detached from its parent, dropped from every camera that
    /// observes it as a layer, and, if it is a camera, stops observing its
    /// layers. All identifiers in the subtree become stale.
    pub fn remove(&mut self, id: NodeId) -> Result<(), Error> {
        self.live(id)?;
        self.record_damage(id);
        if self.node(id).parent.is_some() {
            self.unlink(id);
        }
        let mut stack = alloc::vec![id];
        let mut forgotten = false;
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes[current.idx()].take() else {
                continue;
            };
            stack.extend(node.children.iter().copied());
            self.forget_observations(current, &node);
            forgotten |= self.damage.forget(current);
            self.free_list.push(current.idx());
        }
        if forgotten {
            self.damage.prune();
        }
        Ok(())
    }

    /// Move `id` under `new_parent` (or make it a root), detaching it from its
    /// current parent in the same step. The local transform is kept, so the
    /// node moves along with its new parent.
    ///
    /// All checks happen before anything is changed.
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> Result<(), Error> {
        self.live(id)?;
        if let Some(p) = new_parent {
            self.live(p)?;
            self.check_no_cycle(p, id)?;
        }
        self.record_damage(id);
        if self.node(id).parent.is_some() {
            self.unlink(id);
        }
        if let Some(p) = new_parent {
            self.link(p, None, id);
        }
        Ok(())
    }

    /// Move `id` under `new_parent`, rewriting its local transform so that it
    /// does not move in global space.
    ///
    /// Fails with [`Error::DegenerateTransform`] if `new_parent`'s global
    /// transform cannot be inverted; nothing is changed in that case.
    pub fn reparent_preserving_global(&mut self, id: NodeId, new_parent: NodeId) -> Result<(), Error> {
        self.live(id)?;
        self.live(new_parent)?;
        self.check_no_cycle(new_parent, id)?;
        let global = self.global_transform(id).ok_or(Error::NotFound(id))?;
        let parent_global = self
            .global_transform(new_parent)
            .ok_or(Error::NotFound(new_parent))?;
        let local = try_invert(parent_global)? * global;
        if !local.is_finite() {
            return Err(Error::InvalidNumeric);
        }
        self.reparent(id, Some(new_parent))?;
        self.set_local_transform(id, local)
    }

    /// Replace the local transform of `id`.
    ///
    /// Non-finite transforms are rejected with [`Error::InvalidNumeric`] and
    /// leave the node unchanged.
    pub fn set_local_transform(&mut self, id: NodeId, transform: Affine) -> Result<(), Error> {
        if self.live(id)?.local.local_transform == transform {
            return Ok(());
        }
        if !transform.is_finite() {
            return Err(Error::InvalidNumeric);
        }
        self.record_damage(id);
        self.node_mut(id).local.local_transform = transform;
        self.mark_self_dirty(id);
        Ok(())
    }

    /// Post-multiply the local transform by `transform` (applied in the node's
    /// local space, before the existing transform).
    pub fn transform_by(&mut self, id: NodeId, transform: Affine) -> Result<(), Error> {
        let current = self.live(id)?.local.local_transform;
        self.set_local_transform(id, current * transform)
    }

    /// Translate in the node's local space.
    pub fn translate(&mut self, id: NodeId, delta: Vec2) -> Result<(), Error> {
        self.transform_by(id, Affine::translate(delta))
    }

    /// Scale uniformly about the local origin.
    pub fn scale(&mut self, id: NodeId, factor: f64) -> Result<(), Error> {
        self.transform_by(id, Affine::scale(factor))
    }

    /// Scale uniformly about a point in the node's local space.
    pub fn scale_about_point(&mut self, id: NodeId, factor: f64, point: Point) -> Result<(), Error> {
        let p = point.to_vec2();
        self.transform_by(
            id,
            Affine::translate(p) * Affine::scale(factor) * Affine::translate(-p),
        )
    }

    /// Rotate about the local origin by `radians`.
    pub fn rotate(&mut self, id: NodeId, radians: f64) -> Result<(), Error> {
        self.transform_by(id, Affine::rotate(radians))
    }

    /// Move the node by `delta` in its parent's space, regardless of its own
    /// scale or rotation.
    pub fn offset(&mut self, id: NodeId, delta: Vec2) -> Result<(), Error> {
        let current = self.live(id)?.local.local_transform;
        self.set_local_transform(id, Affine::translate(delta) * current)
    }

    /// Replace the node's own extent.
    ///
    /// Node kinds that draw content call this whenever their content's extent
    /// changes.
    pub fn set_local_bounds(&mut self, id: NodeId, bounds: impl Into<Bounds>) -> Result<(), Error> {
        let bounds = bounds.into();
        if self.live(id)?.local.local_bounds == bounds {
            return Ok(());
        }
        if !bounds.is_finite() {
            return Err(Error::InvalidNumeric);
        }
        self.record_damage(id);
        self.node_mut(id).local.local_bounds = bounds;
        self.mark_self_dirty(id);
        Ok(())
    }

    /// Mark the full bounds of `id` stale and record it for repaint.
    ///
    /// This is the entry point for content that changes without going through
    /// [`Scene::set_local_bounds`].
    pub fn invalidate_full_bounds(&mut self, id: NodeId) -> Result<(), Error> {
        self.live(id)?;
        self.record_damage(id);
        self.mark_self_dirty(id);
        Ok(())
    }

    /// Replace the node flags.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) -> Result<(), Error> {
        let old = self.live(id)?.local.flags;
        if old == flags {
            return Ok(());
        }
        if old.contains(NodeFlags::VISIBLE) != flags.contains(NodeFlags::VISIBLE) {
            self.record_damage(id);
        }
        self.node_mut(id).local.flags = flags;
        Ok(())
    }

    /// Show or hide the node and its subtree.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<(), Error> {
        self.update_flag(id, NodeFlags::VISIBLE, visible)
    }

    /// Allow or forbid the node itself to be picked.
    pub fn set_pickable(&mut self, id: NodeId, pickable: bool) -> Result<(), Error> {
        self.update_flag(id, NodeFlags::PICKABLE, pickable)
    }

    /// Allow or forbid picking to descend into the node's children.
    pub fn set_children_pickable(&mut self, id: NodeId, pickable: bool) -> Result<(), Error> {
        self.update_flag(id, NodeFlags::CHILDREN_PICKABLE, pickable)
    }

    fn update_flag(&mut self, id: NodeId, flag: NodeFlags, value: bool) -> Result<(), Error> {
        let mut flags = self.live(id)?.local.flags;
        flags.set(flag, value);
        self.set_flags(id, flags)
    }

    /// Move `id` to position `index` among its siblings.
    ///
    /// This changes paint and pick order only; bounds are unaffected.
    pub fn set_child_index(&mut self, id: NodeId, index: usize) -> Result<(), Error> {
        let parent = self.live(id)?.parent.ok_or(Error::NotFound(id))?;
        let siblings = &self.node(parent).children;
        let len = siblings.len();
        if index >= len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        let pos = siblings
            .iter()
            .position(|&c| c == id)
            .ok_or(Error::NotFound(id))?;
        if pos == index {
            return Ok(());
        }
        self.record_damage(id);
        let siblings = &mut self.node_mut(parent).children;
        siblings.remove(pos);
        siblings.insert(index, id);
        Ok(())
    }

    /// Make `id` the top-most of its siblings.
    pub fn move_to_front(&mut self, id: NodeId) -> Result<(), Error> {
        let parent = self.live(id)?.parent.ok_or(Error::NotFound(id))?;
        let last = self.node(parent).children.len() - 1;
        self.set_child_index(id, last)
    }

    /// Make `id` the bottom-most of its siblings.
    pub fn move_to_back(&mut self, id: NodeId) -> Result<(), Error> {
        self.set_child_index(id, 0)
    }

    /// Return the full bounds of `id` in its local space, recomputing the
    /// stale parts of the subtree first.
    ///
    /// Calling this twice without an intervening mutation performs no work
    /// the second time. Returns `None` for stale identifiers.
    pub fn full_bounds(&mut self, id: NodeId) -> Option<Bounds> {
        if !self.is_alive(id) {
            return None;
        }
        Some(self.validate_full_bounds(id))
    }

    /// Return the full bounds of `id` mapped into the space of its root.
    pub fn global_full_bounds(&mut self, id: NodeId) -> Option<Bounds> {
        let full = self.full_bounds(id)?;
        Some(full.transformed(self.global_transform(id)?))
    }

    pub(crate) fn validate_full_bounds(&mut self, id: NodeId) -> Bounds {
        let state = self.node(id).bounds_state;
        match state {
            BoundsState::Clean => return self.node(id).full_bounds,
            BoundsState::ChildDirty => {
                for i in 0..self.node(id).children.len() {
                    let child = self.node(id).children[i];
                    if !self.node(child).bounds_state.is_clean() {
                        self.validate_full_bounds(child);
                    }
                }
            }
            BoundsState::SelfDirty => {
                debug_assert!(
                    self.node(id)
                        .children
                        .iter()
                        .all(|&c| self.node(c).bounds_state.is_clean()),
                    "a dirty child must have marked its parent child-dirty"
                );
            }
        }
        let node = self.node(id);
        let mut full = node.local.local_bounds;
        for &child in &node.children {
            let c = self.node(child);
            full = full.union(c.full_bounds.transformed(c.local.local_transform));
        }
        let node = self.node_mut(id);
        node.full_bounds = full;
        node.bounds_state = BoundsState::Clean;
        self.full_bounds_recomputes += 1;
        log::trace!("recomputed full bounds of {id:?}: {full:?}");
        full
    }

    /// Return the transform from the local space of `id` into the space of
    /// its root (the product of every local transform up the parent chain).
    pub fn global_transform(&self, id: NodeId) -> Option<Affine> {
        let mut node = self.node_opt(id)?;
        let mut transform = node.local.local_transform;
        while let Some(parent) = node.parent {
            node = self.node(parent);
            transform = node.local.local_transform * transform;
        }
        Some(transform)
    }

    /// Map a point from the local space of `id` into its parent's space.
    pub fn local_to_parent(&self, id: NodeId, point: Point) -> Result<Point, Error> {
        Ok(self.live(id)?.local.local_transform * point)
    }

    /// Map a point from the parent's space into the local space of `id`.
    ///
    /// Fails with [`Error::DegenerateTransform`] if the local transform cannot
    /// be inverted.
    pub fn parent_to_local(&self, id: NodeId, point: Point) -> Result<Point, Error> {
        Ok(try_invert(self.live(id)?.local.local_transform)? * point)
    }

    /// Map a point from the local space of `id` into root space.
    pub fn local_to_global(&self, id: NodeId, point: Point) -> Result<Point, Error> {
        let transform = self.global_transform(id).ok_or(Error::NotFound(id))?;
        Ok(transform * point)
    }

    /// Map a point from root space into the local space of `id`.
    pub fn global_to_local(&self, id: NodeId, point: Point) -> Result<Point, Error> {
        let transform = self.global_transform(id).ok_or(Error::NotFound(id))?;
        Ok(try_invert(transform)? * point)
    }

    /// Collect the visible nodes under `root` whose own bounds intersect
    /// `rect`, given in the space of `root`'s parent.
    ///
    /// Subtrees whose cached full bounds miss `rect` are skipped. Results are
    /// in paint order (parents before children, earlier siblings first).
    pub fn intersecting(&mut self, root: NodeId, rect: Rect) -> Result<Vec<NodeId>, Error> {
        self.live(root)?;
        if !rect.is_finite() {
            return Err(Error::InvalidNumeric);
        }
        let mut out = Vec::new();
        self.collect_intersecting(root, Affine::IDENTITY, Bounds::from_rect(rect), &mut out);
        Ok(out)
    }

    fn collect_intersecting(
        &mut self,
        id: NodeId,
        parent_transform: Affine,
        region: Bounds,
        out: &mut Vec<NodeId>,
    ) {
        let node = self.node(id);
        if !node.local.flags.contains(NodeFlags::VISIBLE) {
            return;
        }
        let transform = parent_transform * node.local.local_transform;
        let inverse = match try_invert(transform) {
            Ok(inverse) => inverse,
            Err(err) => {
                log::warn!("skipping {id:?} in intersection query: {err}");
                return;
            }
        };
        let local = region.transformed(inverse);
        if !self.validate_full_bounds(id).intersects(local) {
            return;
        }
        if self.node(id).local.local_bounds.intersects(local) {
            out.push(id);
        }
        for i in 0..self.node(id).children.len() {
            let child = self.node(id).children[i];
            self.collect_intersecting(child, transform, region, out);
        }
    }

    /// Snapshot of cache counters.
    pub fn stats(&self) -> SceneStats {
        SceneStats {
            nodes_alive: self.nodes.iter().filter(|n| n.is_some()).count(),
            full_bounds_recomputes: self.full_bounds_recomputes,
            invalidation_steps: self.invalidation_steps,
        }
    }
}

impl Scene {
    // --- accessors ---

    /// Returns true if `id` refers to a live node.
    ///
    /// A `NodeId` is considered live if its slot exists and its generation matches
    /// the current generation stored in that slot.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some()
    }

    /// Returns the parent of a node if live, or `None` for roots or stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|node| node.parent)
    }

    /// Get the children of a node in paint order, or empty slice if node is stale.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.node_opt(id).map_or(&[], |node| &node.children)
    }

    /// Returns the root of the tree containing `id`.
    pub fn root_of(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        let mut node = self.node_opt(id)?;
        while let Some(parent) = node.parent {
            current = parent;
            node = self.node(parent);
        }
        Some(current)
    }

    /// Returns true if `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.parent_of(id);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent_of(p);
        }
        false
    }

    /// Returns the flags of a node if the identifier is live.
    pub fn flags(&self, id: NodeId) -> Option<NodeFlags> {
        self.node_opt(id).map(|node| node.local.flags)
    }

    /// Returns the kind of a node if the identifier is live.
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node_opt(id).map(|node| node.local.kind)
    }

    /// Returns the local transform of a node if the identifier is live.
    pub fn local_transform(&self, id: NodeId) -> Option<Affine> {
        self.node_opt(id).map(|node| node.local.local_transform)
    }

    /// Returns the local bounds of a node if the identifier is live.
    pub fn local_bounds(&self, id: NodeId) -> Option<Bounds> {
        self.node_opt(id).map(|node| node.local.local_bounds)
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free_list.len()
    }

    /// Returns true if the scene has no live nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // --- internals ---

    /// Access a live node; panics if `id` is stale.
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        self.node_opt(id).expect("dangling NodeId")
    }

    /// Access a live node mutably; panics if `id` is stale.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.node_opt_mut(id).expect("dangling NodeId")
    }

    pub(crate) fn node_opt(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    pub(crate) fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    pub(crate) fn live(&self, id: NodeId) -> Result<&Node, Error> {
        self.node_opt(id).ok_or(Error::NotFound(id))
    }

    fn check_no_cycle(&self, parent: NodeId, child: NodeId) -> Result<(), Error> {
        if parent == child || self.is_ancestor_of(child, parent) {
            return Err(Error::StructuralConflict {
                node: child,
                parent,
            });
        }
        Ok(())
    }

    fn link(&mut self, parent: NodeId, index: Option<usize>, child: NodeId) {
        let children = &mut self.node_mut(parent).children;
        match index {
            Some(i) => children.insert(i, child),
            None => children.push(child),
        }
        self.node_mut(child).parent = Some(parent);
        self.mark_child_dirty(parent);
    }

    fn unlink(&mut self, child: NodeId) {
        let Some(parent) = self.node_mut(child).parent.take() else {
            return;
        };
        self.node_mut(parent).children.retain(|&c| c != child);
        self.mark_self_dirty(parent);
    }

    /// The node's own contribution changed: its union must be recomputed and
    /// every ancestor must learn that a descendant is stale.
    pub(crate) fn mark_self_dirty(&mut self, id: NodeId) {
        let node = self.node_mut(id);
        node.bounds_state.mark(BoundsState::SelfDirty);
        let parent = node.parent;
        if let Some(parent) = parent {
            self.mark_child_dirty(parent);
        }
    }

    /// Mark `id` and its ancestors child-dirty, stopping at the first node that
    /// already is: its ancestors are marked too.
    fn mark_child_dirty(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(id) = current {
            self.invalidation_steps += 1;
            let node = self.node_mut(id);
            if node.bounds_state == BoundsState::ChildDirty {
                break;
            }
            node.bounds_state = BoundsState::ChildDirty;
            current = node.parent;
        }
    }

    fn forget_observations(&mut self, id: NodeId, node: &Node) {
        if let Some(camera) = &node.camera {
            for layer in &camera.layers {
                self.unregister_observer(*layer, id);
            }
        }
        if let Some(cameras) = self.observers.remove(&id) {
            for camera in cameras {
                if let Some(state) = self.node_opt_mut(camera).and_then(|n| n.camera.as_mut()) {
                    state.layers.retain(|&l| l != id);
                }
            }
        }
    }
}
