// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cameras: nodes that view an ordered list of layers through a view transform.
//!
//! A camera is an ordinary node in its own tree (it has a parent, children,
//! and a local transform) and additionally observes layers. Observation is
//! not ownership: a layer may be observed by many cameras, or several times by
//! the same camera, and destroying either side only drops the observation.
//!
//! Three spaces meet at a camera:
//!
//! - *camera-local* space, where the camera's local bounds act as its
//!   viewport;
//! - *view* space, the parent space of the observed layers;
//! - the camera's *parent* space, reached through its local transform as for
//!   any other node.
//!
//! The view transform maps view space into camera-local space. Panning and
//! zooming a camera change the view transform and leave the layers untouched.

use alloc::vec::Vec;
use kurbo::{Affine, Point, Vec2};
use smallvec::SmallVec;

use crate::bounds::Bounds;
use crate::error::Error;
use crate::tree::Scene;
use crate::types::NodeId;
use crate::util::try_invert;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct CameraState {
    pub(crate) view_transform: Affine,
    /// Bottom-most first, like children.
    pub(crate) layers: Vec<NodeId>,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            view_transform: Affine::IDENTITY,
            layers: Vec::new(),
        }
    }
}

impl Scene {
    /// Returns the view transform of `camera`.
    pub fn view_transform(&self, camera: NodeId) -> Result<Affine, Error> {
        Ok(self.camera(camera)?.view_transform)
    }

    /// Replace the view transform of `camera`.
    ///
    /// The camera's own bounds are unaffected; only what it shows changes.
    pub fn set_view_transform(&mut self, camera: NodeId, transform: Affine) -> Result<(), Error> {
        if self.camera(camera)?.view_transform == transform {
            return Ok(());
        }
        if !transform.is_finite() {
            return Err(Error::InvalidNumeric);
        }
        self.record_camera_damage(camera);
        self.camera_mut(camera)?.view_transform = transform;
        Ok(())
    }

    /// Pan by `delta`, given in view space.
    pub fn translate_view(&mut self, camera: NodeId, delta: Vec2) -> Result<(), Error> {
        let view = self.view_transform(camera)?;
        self.set_view_transform(camera, view * Affine::translate(delta))
    }

    /// Zoom by `factor`, keeping `anchor` (in camera-local space) fixed.
    pub fn scale_view_about_point(
        &mut self,
        camera: NodeId,
        factor: f64,
        anchor: Point,
    ) -> Result<(), Error> {
        if !factor.is_finite() || !anchor.is_finite() {
            return Err(Error::InvalidNumeric);
        }
        let view = self.view_transform(camera)?;
        let a = anchor.to_vec2();
        self.set_view_transform(
            camera,
            Affine::translate(a) * Affine::scale(factor) * Affine::translate(-a) * view,
        )
    }

    /// Map a point from view space (the layers' parent space) into
    /// camera-local space.
    pub fn view_to_local(&self, camera: NodeId, point: Point) -> Result<Point, Error> {
        Ok(self.camera(camera)?.view_transform * point)
    }

    /// Map a point from camera-local space into view space.
    ///
    /// Fails with [`Error::DegenerateTransform`] when the view transform
    /// cannot be inverted.
    pub fn local_to_view(&self, camera: NodeId, point: Point) -> Result<Point, Error> {
        Ok(try_invert(self.camera(camera)?.view_transform)? * point)
    }

    /// The region of view space currently visible through the camera's local
    /// bounds.
    pub fn view_bounds(&self, camera: NodeId) -> Result<Bounds, Error> {
        let view = self.camera(camera)?.view_transform;
        let bounds = self.node(camera).local.local_bounds;
        Ok(bounds.transformed(try_invert(view)?))
    }

    /// Append `layer` as the top-most layer of `camera`.
    ///
    /// Observing the same layer more than once is allowed; each observation is
    /// removed separately.
    pub fn add_layer(&mut self, camera: NodeId, layer: NodeId) -> Result<(), Error> {
        let len = self.camera(camera)?.layers.len();
        self.insert_layer(camera, len, layer)
    }

    /// Insert `layer` at `index` in the layer list of `camera`.
    pub fn insert_layer(&mut self, camera: NodeId, index: usize, layer: NodeId) -> Result<(), Error> {
        let len = self.camera(camera)?.layers.len();
        self.live(layer)?;
        if index > len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        self.record_camera_damage(camera);
        self.camera_mut(camera)?.layers.insert(index, layer);
        self.observers.entry(layer).or_default().push(camera);
        Ok(())
    }

    /// Stop observing one occurrence of `layer`.
    ///
    /// Fails with [`Error::NotFound`] if `camera` does not observe `layer`.
    pub fn remove_layer(&mut self, camera: NodeId, layer: NodeId) -> Result<(), Error> {
        let pos = self
            .camera(camera)?
            .layers
            .iter()
            .position(|&l| l == layer)
            .ok_or(Error::NotFound(layer))?;
        self.record_camera_damage(camera);
        self.camera_mut(camera)?.layers.remove(pos);
        self.unregister_observer(layer, camera);
        Ok(())
    }

    /// The layers of `camera`, bottom-most first.
    pub fn layers_of(&self, camera: NodeId) -> Result<&[NodeId], Error> {
        Ok(&self.camera(camera)?.layers)
    }

    /// Cameras observing `layer`, each listed once.
    pub fn cameras_observing(&self, layer: NodeId) -> SmallVec<[NodeId; 2]> {
        let mut out = SmallVec::new();
        if let Some(cameras) = self.observers.get(&layer) {
            for &camera in cameras {
                if !out.contains(&camera) {
                    out.push(camera);
                }
            }
        }
        out
    }

    /// Drop one `layer -> camera` entry from the observer index.
    pub(crate) fn unregister_observer(&mut self, layer: NodeId, camera: NodeId) {
        let Some(cameras) = self.observers.get_mut(&layer) else {
            return;
        };
        if let Some(pos) = cameras.iter().position(|&c| c == camera) {
            cameras.remove(pos);
        }
        if cameras.is_empty() {
            self.observers.remove(&layer);
        }
    }

    pub(crate) fn camera(&self, camera: NodeId) -> Result<&CameraState, Error> {
        self.live(camera)?
            .camera
            .as_ref()
            .ok_or(Error::NotACamera(camera))
    }

    fn camera_mut(&mut self, camera: NodeId) -> Result<&mut CameraState, Error> {
        self.node_opt_mut(camera)
            .ok_or(Error::NotFound(camera))?
            .camera
            .as_mut()
            .ok_or(Error::NotACamera(camera))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LocalNode, NodeKind};
    use kurbo::Rect;

    fn camera(scene: &mut Scene, w: f64, h: f64) -> NodeId {
        scene
            .insert(None, LocalNode {
                local_bounds: Bounds::new(0.0, 0.0, w, h),
                kind: NodeKind::Camera,
                ..LocalNode::default()
            })
            .unwrap()
    }

    #[test]
    fn view_mapping_round_trips() {
        let mut scene = Scene::new();
        let cam = camera(&mut scene, 100.0, 100.0);
        scene
            .set_view_transform(cam, Affine::translate((10.0, 10.0)) * Affine::scale(2.0))
            .unwrap();

        let p = Point::new(3.0, 4.0);
        assert_eq!(scene.view_to_local(cam, p).unwrap(), Point::new(16.0, 18.0));
        let back = scene
            .view_to_local(cam, scene.local_to_view(cam, p).unwrap())
            .unwrap();
        assert!((back - p).hypot() < 1e-12);
    }

    #[test]
    fn view_bounds_inverts_view_transform() {
        let mut scene = Scene::new();
        let cam = camera(&mut scene, 100.0, 50.0);
        scene.set_view_transform(cam, Affine::scale(2.0)).unwrap();
        assert_eq!(
            scene.view_bounds(cam).unwrap().rect(),
            Some(Rect::new(0.0, 0.0, 50.0, 25.0))
        );

        scene.set_view_transform(cam, Affine::scale(0.0)).unwrap();
        assert!(matches!(
            scene.view_bounds(cam),
            Err(Error::DegenerateTransform(_))
        ));
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut scene = Scene::new();
        let cam = camera(&mut scene, 100.0, 100.0);
        scene.translate_view(cam, Vec2::new(-20.0, 0.0)).unwrap();
        let anchor = Point::new(40.0, 30.0);
        let under_anchor = scene.local_to_view(cam, anchor).unwrap();

        scene.scale_view_about_point(cam, 3.0, anchor).unwrap();
        let after = scene.view_to_local(cam, under_anchor).unwrap();
        assert!((after - anchor).hypot() < 1e-9);
    }

    #[test]
    fn duplicate_layers_are_removed_one_at_a_time() {
        let mut scene = Scene::new();
        let cam = camera(&mut scene, 10.0, 10.0);
        let layer = scene.insert(None, LocalNode::default()).unwrap();

        scene.add_layer(cam, layer).unwrap();
        scene.add_layer(cam, layer).unwrap();
        assert_eq!(scene.layers_of(cam).unwrap(), &[layer, layer]);
        assert_eq!(scene.cameras_observing(layer).as_slice(), &[cam]);

        scene.remove_layer(cam, layer).unwrap();
        assert_eq!(scene.layers_of(cam).unwrap(), &[layer]);
        assert_eq!(scene.cameras_observing(layer).as_slice(), &[cam]);

        scene.remove_layer(cam, layer).unwrap();
        assert!(scene.layers_of(cam).unwrap().is_empty());
        assert!(scene.cameras_observing(layer).is_empty());
        assert_eq!(scene.remove_layer(cam, layer), Err(Error::NotFound(layer)));
        assert!(scene.is_alive(layer));
    }

    #[test]
    fn layers_are_not_children() {
        let mut scene = Scene::new();
        let cam = camera(&mut scene, 10.0, 10.0);
        let layer = scene
            .insert(None, LocalNode {
                local_bounds: Bounds::new(500.0, 500.0, 10.0, 10.0),
                ..LocalNode::default()
            })
            .unwrap();
        scene.add_layer(cam, layer).unwrap();
        assert_eq!(scene.parent_of(layer), None);
        assert_eq!(
            scene.full_bounds(cam).unwrap().rect(),
            Some(Rect::new(0.0, 0.0, 10.0, 10.0))
        );
    }

    #[test]
    fn destroying_either_side_drops_observation() {
        let mut scene = Scene::new();
        let cam = camera(&mut scene, 10.0, 10.0);
        let other = camera(&mut scene, 10.0, 10.0);
        let layer = scene.insert(None, LocalNode::default()).unwrap();
        let keep = scene.insert(None, LocalNode::default()).unwrap();
        scene.add_layer(cam, layer).unwrap();
        scene.add_layer(cam, keep).unwrap();
        scene.add_layer(other, layer).unwrap();

        scene.remove(layer).unwrap();
        assert_eq!(scene.layers_of(cam).unwrap(), &[keep]);
        assert!(scene.layers_of(other).unwrap().is_empty());

        scene.remove(cam).unwrap();
        assert!(scene.cameras_observing(keep).is_empty());
    }

    #[test]
    fn camera_operations_need_a_camera() {
        let mut scene = Scene::new();
        let plain = scene.insert(None, LocalNode::default()).unwrap();
        let cam = camera(&mut scene, 10.0, 10.0);
        assert_eq!(scene.view_transform(plain), Err(Error::NotACamera(plain)));
        assert_eq!(scene.add_layer(plain, cam), Err(Error::NotACamera(plain)));
        assert_eq!(
            scene.insert_layer(cam, 2, plain),
            Err(Error::IndexOutOfBounds { index: 2, len: 0 })
        );

        let nan = Affine::new([1.0, 0.0, 0.0, 1.0, f64::NAN, 0.0]);
        assert_eq!(scene.set_view_transform(cam, nan), Err(Error::InvalidNumeric));
        assert_eq!(scene.view_transform(cam), Ok(Affine::IDENTITY));
    }
}
