// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by scene graph operations.

use core::fmt;

use crate::types::NodeId;

/// A transform that cannot be inverted (zero or non-finite determinant).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DegenerateTransform {
    /// Determinant of the offending transform.
    pub determinant: f64,
}

impl fmt::Display for DegenerateTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "transform is not invertible (determinant {})",
            self.determinant
        )
    }
}

impl core::error::Error for DegenerateTransform {}

/// Error returned by [`Scene`](crate::Scene) operations.
///
/// None of these leave the scene in a partially mutated state: a rejected
/// call has no effect.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Error {
    /// `node` cannot be attached under `parent`: it already has a parent, or
    /// `parent` is `node` itself or one of its descendants.
    StructuralConflict {
        /// The node being attached.
        node: NodeId,
        /// The current parent (when already attached) or the requested one.
        parent: NodeId,
    },
    /// An inverse mapping was requested through a non-invertible transform.
    DegenerateTransform(DegenerateTransform),
    /// A transform, bounds, point, or radius contained NaN or infinity.
    InvalidNumeric,
    /// The node is stale, or is not a child / layer / path entry where one was
    /// required.
    NotFound(NodeId),
    /// A camera operation was applied to a node that is not a camera.
    NotACamera(NodeId),
    /// An insertion index past the end of a child or layer list.
    IndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Length of the list.
        len: usize,
    },
}

impl From<DegenerateTransform> for Error {
    fn from(err: DegenerateTransform) -> Self {
        Self::DegenerateTransform(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StructuralConflict { node, parent } => {
                write!(f, "cannot attach {node:?} under {parent:?}")
            }
            Self::DegenerateTransform(err) => err.fmt(f),
            Self::InvalidNumeric => f.write_str("non-finite numeric input"),
            Self::NotFound(id) => write!(f, "{id:?} not found"),
            Self::NotACamera(id) => write!(f, "{id:?} is not a camera"),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for length {len}")
            }
        }
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::DegenerateTransform(err) => Some(err),
            _ => None,
        }
    }
}
