// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Repaint bookkeeping drained with [`Scene::take_damage`].

use alloc::vec::Vec;
use hashbrown::HashSet;
use kurbo::{Affine, Rect};

use crate::tree::Scene;
use crate::types::{NodeFlags, NodeId};

/// Regions and cameras affected by mutations since the last drain.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Damage {
    /// Root-space rectangles that should be repainted: the previous and the
    /// current full bounds of every changed node that is rendered.
    pub dirty_rects: Vec<Rect>,
    /// Cameras whose view may have changed: cameras observing a layer that
    /// contains a changed node, plus cameras whose view or layers changed.
    pub cameras: Vec<NodeId>,
}

impl Damage {
    /// Returns the union of all damage rects.
    pub fn union_rect(&self) -> Option<Rect> {
        let mut it = self.dirty_rects.iter().copied();
        let first = it.next()?;
        Some(it.fold(first, |acc, r| acc.union(r)))
    }

    /// Returns `true` if nothing needs repainting.
    pub fn is_empty(&self) -> bool {
        self.dirty_rects.is_empty() && self.cameras.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct DamageLog {
    enabled: bool,
    /// Changed nodes in first-change order.
    pending: Vec<NodeId>,
    seen: HashSet<NodeId>,
    /// Root-space bounds captured before the first change of each node.
    old_rects: Vec<Rect>,
    cameras: Vec<NodeId>,
}

impl DamageLog {
    /// Forget a destroyed node. Returns true if it was pending.
    pub(crate) fn forget(&mut self, id: NodeId) -> bool {
        self.seen.remove(&id)
    }

    /// Remove forgotten nodes from the pending list.
    pub(crate) fn prune(&mut self) {
        let Self { pending, seen, .. } = self;
        pending.retain(|id| seen.contains(id));
    }
}

impl Scene {
    /// Start or stop recording damage.
    ///
    /// Tracking is off for a new scene, and mutations then do nothing beyond
    /// dirty marking. Turning it off discards anything not yet drained. A host
    /// that enables tracking should drain with [`Scene::take_damage`] once per
    /// frame, and should enable it before the first frame is painted: the old
    /// rectangle of a change is read from the cached bounds left by the last
    /// drain.
    pub fn set_damage_tracking(&mut self, enabled: bool) {
        if !enabled {
            self.damage = DamageLog::default();
        }
        self.damage.enabled = enabled;
    }

    /// Returns true if mutations are being recorded for [`Scene::take_damage`].
    pub fn is_tracking_damage(&self) -> bool {
        self.damage.enabled
    }

    /// Record that `id` is about to change in a way that affects painting.
    ///
    /// Only the first call per node between drains does anything. It reads the
    /// cached full bounds as they stand and never recomputes them: a stale
    /// cache still describes what was last painted. If an ancestor already
    /// changed in this frame, the ancestor's old rectangle covers this node's.
    pub(crate) fn record_damage(&mut self, id: NodeId) {
        if !self.damage.enabled || !self.damage.seen.insert(id) {
            return;
        }
        self.damage.pending.push(id);
        let Some(node) = self.node_opt(id) else {
            return;
        };
        let old = node.full_bounds;
        let mut cameras = core::mem::take(&mut self.damage.cameras);
        let mut transform = Affine::IDENTITY;
        let mut rendered = true;
        let mut current = Some(id);
        while let Some(n) = current {
            let node = self.node(n);
            transform = node.local.local_transform * transform;
            rendered &= node.local.flags.contains(NodeFlags::VISIBLE);
            // Cameras that see the old position; transitive ones are added on drain.
            if let Some(observers) = self.observers.get(&n) {
                for &camera in observers {
                    if !cameras.contains(&camera) {
                        cameras.push(camera);
                    }
                }
            }
            current = node.parent;
        }
        self.damage.cameras = cameras;
        if rendered && let Some(rect) = old.transformed(transform).rect() {
            self.damage.old_rects.push(rect);
        }
    }

    /// Record a change to a camera's view: the camera itself must repaint.
    pub(crate) fn record_camera_damage(&mut self, camera: NodeId) {
        if !self.damage.enabled {
            return;
        }
        self.record_damage(camera);
        if !self.damage.cameras.contains(&camera) {
            self.damage.cameras.push(camera);
        }
    }

    /// Drain everything recorded since the previous call.
    ///
    /// Stale bounds of changed nodes are recomputed here, so the reported
    /// rectangles reflect the current scene. Returns an empty [`Damage`] when
    /// tracking is off.
    pub fn take_damage(&mut self) -> Damage {
        let log = core::mem::take(&mut self.damage);
        self.damage.enabled = log.enabled;
        let mut dirty_rects = log.old_rects;
        let mut cameras = Vec::new();
        for camera in log.cameras {
            if self.is_alive(camera) {
                if !cameras.contains(&camera) {
                    cameras.push(camera);
                }
                self.collect_observing_cameras(camera, &mut cameras);
            }
        }
        for id in log.pending {
            if !self.is_alive(id) {
                continue;
            }
            if self.is_rendered(id)
                && let Some(rect) = self.global_full_bounds(id).and_then(|b| b.rect())
                && !dirty_rects.contains(&rect)
            {
                dirty_rects.push(rect);
            }
            self.collect_observing_cameras(id, &mut cameras);
        }
        log::trace!(
            "drained damage: {} rects, {} cameras",
            dirty_rects.len(),
            cameras.len()
        );
        Damage {
            dirty_rects,
            cameras,
        }
    }

    /// Returns true if `id` and all of its ancestors are visible.
    fn is_rendered(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current.and_then(|id| self.node_opt(id)) {
            if !node.local.flags.contains(NodeFlags::VISIBLE) {
                return false;
            }
            current = node.parent;
        }
        true
    }

    /// Append every camera that (transitively) sees `id` through a layer.
    fn collect_observing_cameras(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let mut work = alloc::vec![id];
        while let Some(start) = work.pop() {
            let mut current = Some(start);
            while let Some(node) = current {
                if let Some(cameras) = self.observers.get(&node) {
                    for &camera in cameras {
                        if !out.contains(&camera) {
                            out.push(camera);
                            work.push(camera);
                        }
                    }
                }
                current = self.parent_of(node);
            }
        }
    }
}
