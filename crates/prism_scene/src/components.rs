//! # Scene Components
//!
//! Plain data attached to scene entities. `Transform` is `Pod` so it can be
//! copied straight into upload buffers.

use bytemuck::{Pod, Zeroable};
use prism_core::Component;

/// Opaque handle to a mesh owned by the asset layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct MeshHandle(pub u32);

/// Opaque handle to a material owned by the asset layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct MaterialHandle(pub u32);

/// Position, orientation and scale of an entity.
///
/// Memory layout: 40 bytes, no padding.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Transform {
    /// World-space translation.
    pub translation: [f32; 3],
    /// Unit quaternion, `[x, y, z, w]`.
    pub rotation: [f32; 4],
    /// Per-axis scale.
    pub scale: [f32; 3],
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        translation: [0.0; 3],
        rotation: [0.0, 0.0, 0.0, 1.0],
        scale: [1.0; 3],
    };

    /// Identity rotation and scale at `translation`.
    #[inline]
    #[must_use]
    pub const fn from_translation(translation: [f32; 3]) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Replaces the rotation with `angle` radians about `axis`.
    ///
    /// A zero-length axis leaves the rotation unchanged.
    #[must_use]
    pub fn with_axis_angle(mut self, axis: [f32; 3], angle: f32) -> Self {
        let length = (axis[0] * axis[0] + axis[1] * axis[1] + axis[2] * axis[2]).sqrt();
        if length > f32::EPSILON {
            let (sin, cos) = (angle * 0.5).sin_cos();
            let k = sin / length;
            self.rotation = [axis[0] * k, axis[1] * k, axis[2] * k, cos];
        }
        self
    }

    /// Replaces the scale.
    #[inline]
    #[must_use]
    pub const fn with_scale(mut self, scale: [f32; 3]) -> Self {
        self.scale = scale;
        self
    }

    /// Moves the transform by `delta`.
    #[inline]
    pub fn translate(&mut self, delta: [f32; 3]) {
        for (axis, d) in self.translation.iter_mut().zip(delta) {
            *axis += d;
        }
    }

    /// Model matrix (translation * rotation * scale), column-major.
    #[must_use]
    pub fn model_matrix(&self) -> [f32; 16] {
        let [x, y, z, w] = self.rotation;
        let [sx, sy, sz] = self.scale;
        let [tx, ty, tz] = self.translation;

        let (xx, yy, zz) = (x * x, y * y, z * z);
        let (xy, xz, yz) = (x * y, x * z, y * z);
        let (wx, wy, wz) = (w * x, w * y, w * z);

        [
            (1.0 - 2.0 * (yy + zz)) * sx,
            2.0 * (xy + wz) * sx,
            2.0 * (xz - wy) * sx,
            0.0,
            2.0 * (xy - wz) * sy,
            (1.0 - 2.0 * (xx + zz)) * sy,
            2.0 * (yz + wx) * sy,
            0.0,
            2.0 * (xz + wy) * sz,
            2.0 * (yz - wx) * sz,
            (1.0 - 2.0 * (xx + yy)) * sz,
            0.0,
            tx,
            ty,
            tz,
            1.0,
        ]
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Component for Transform {}

/// What to draw for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshRenderer {
    /// Mesh to draw.
    pub mesh: MeshHandle,
    /// Material to draw it with.
    pub material: MaterialHandle,
    /// Hidden renderers keep their cache slot but emit no draw.
    pub visible: bool,
}

impl MeshRenderer {
    /// A visible renderer.
    #[must_use]
    pub const fn new(mesh: MeshHandle, material: MaterialHandle) -> Self {
        Self {
            mesh,
            material,
            visible: true,
        }
    }
}

impl Component for MeshRenderer {}

/// Human-readable entity name, for reports and tooling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(pub String);

impl Component for Name {}
