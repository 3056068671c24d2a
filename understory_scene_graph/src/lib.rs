// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_scene_graph --heading-base-level=0

//! Understory Scene Graph: a Kurbo-native retained-mode 2D scene graph.
//!
//! Understory Scene Graph is the geometric core of zoomable canvases, diagram editors, and
//! other retained-mode 2D surfaces.
//!
//! - Represents a forest of nodes with local transforms, local bounds, and visibility/picking flags.
//! - Caches each node's full bounds (its own bounds united with its subtree) and recomputes them
//!   lazily after mutation.
//! - Views shared layers through cameras with their own pan/zoom transform.
//! - Hit tests through cameras and layers, returning a [`PickPath`] usable for coordinate conversion.
//!
//! ## Coordinate spaces
//!
//! Every node has a local space. Its local transform maps local space into its parent's space; the
//! product of the transforms up to a root maps into *root* (global) space.
//!
//! A camera is an ordinary node that additionally observes an ordered list of layers. Layers are
//! ordinary nodes, usually roots; observing a layer does not make it a child. The camera's view
//! transform maps the layers' parent space (*view* space) into the camera's local space, where the
//! camera's local bounds act as its viewport. A layer may be observed by several cameras, and by
//! the same camera more than once.
//!
//! ## Bounds caching
//!
//! Mutations only mark state. Changing a node's transform or bounds, or its child list, marks it
//! and walks the parent chain, stopping at the first ancestor that is already marked. Asking for
//! [`Scene::full_bounds`] then recomputes exactly the stale nodes, bottom-up, and caches the
//! result; asking again without mutation does no work.
//!
//! Bounds are axis-aligned and loose under rotation and shear: a transformed box is replaced by
//! the axis-aligned box containing it. [`Bounds`] has an explicit empty state, so a grouping node
//! with no content of its own is sized by its children alone.
//!
//! ## Picking
//!
//! [`Scene::pick`] walks depth-first from a start node. Subtrees whose full bounds miss the query
//! are pruned. Later children are on top and are tried first; the first hit wins, and a node is
//! hit only when no child was. Cameras try their children, then their layers through the view
//! transform, then themselves. [`NodeKind::Composite`] nodes report hits on any descendant as hits
//! on themselves. Subtrees with a non-invertible transform cannot be hit and are skipped with a
//! logged warning.
//!
//! ## API overview
//!
//! - [`Scene`]: arena owning every node; all operations go through it.
//! - [`LocalNode`]: initial data for a node (bounds, transform, flags, kind).
//! - [`NodeFlags`]: visibility and picking controls.
//! - [`NodeKind`]: plain nodes, composites, and cameras.
//! - [`NodeId`]: generational handle of a node.
//! - [`Bounds`]: axis-aligned bounds with an empty state.
//! - [`PickPath`] / [`PathEntry`]: result of a pick.
//! - [`Damage`]: repaint regions and affected cameras.
//! - [`Error`]: why an operation was rejected. A rejected operation changes nothing.
//!
//! Key operations:
//! - [`Scene::insert`] → [`NodeId`]; [`Scene::add_child`], [`Scene::insert_child`],
//!   [`Scene::remove_child`], [`Scene::reparent`], [`Scene::remove`].
//! - [`Scene::set_local_transform`] / [`Scene::set_local_bounds`] / [`Scene::set_flags`].
//! - [`Scene::full_bounds`] and [`Scene::global_full_bounds`].
//! - [`Scene::local_to_parent`] / [`Scene::parent_to_local`] and their global counterparts.
//! - [`Scene::set_view_transform`], [`Scene::view_to_local`], [`Scene::local_to_view`],
//!   [`Scene::view_bounds`], [`Scene::add_layer`], [`Scene::remove_layer`].
//! - [`Scene::pick`] / [`Scene::pick_rect`] and [`Scene::intersecting`].
//! - [`Scene::set_damage_tracking`] opts in to repaint bookkeeping, and
//!   [`Scene::take_damage`] drains what changed since the previous call.
//!
//! ## Example
//!
//! ```rust
//! use kurbo::{Affine, Point};
//! use understory_scene_graph::{Bounds, LocalNode, NodeKind, Scene};
//!
//! let mut scene = Scene::new();
//!
//! // A layer holding a single rectangle.
//! let layer = scene.insert(None, LocalNode::default()).unwrap();
//! let rect = scene
//!     .insert(
//!         Some(layer),
//!         LocalNode {
//!             local_bounds: Bounds::new(0.0, 0.0, 50.0, 50.0),
//!             ..LocalNode::default()
//!         },
//!     )
//!     .unwrap();
//!
//! // An 800x600 camera, zoomed in 2x.
//! let camera = scene
//!     .insert(
//!         None,
//!         LocalNode {
//!             local_bounds: Bounds::new(0.0, 0.0, 800.0, 600.0),
//!             kind: NodeKind::Camera,
//!             ..LocalNode::default()
//!         },
//!     )
//!     .unwrap();
//! scene.add_layer(camera, layer).unwrap();
//! scene.set_view_transform(camera, Affine::scale(2.0)).unwrap();
//!
//! let path = scene.pick(camera, Point::new(90.0, 90.0), 0.0).unwrap().unwrap();
//! assert_eq!(path.picked_node(), rect);
//! assert_eq!(
//!     path.pick_to_local(rect, Point::new(90.0, 90.0)).unwrap(),
//!     Point::new(45.0, 45.0)
//! );
//! ```
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`] facade; this crate never installs a logger.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod bounds;
mod camera;
mod damage;
mod dirty;
mod error;
mod pick;
mod tree;
mod types;
mod util;

pub use bounds::Bounds;
pub use damage::Damage;
pub use error::{DegenerateTransform, Error};
pub use pick::{PathEntry, PickPath};
pub use tree::{Scene, SceneStats};
pub use types::{LocalNode, NodeFlags, NodeId, NodeKind};
