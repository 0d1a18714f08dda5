//! The embedded 3D renderer collaborator.
//!
//! The renderer draws into the host's graphics context. It owns its scene
//! objects and camera; it never clears the host's framebuffer and only
//! resets the state it depends on, right before its own draw calls.

use std::fmt;

use foundation::math::{Mat4, Vec3};
use layers::GraphicsContext;

use crate::mesh::MeshDesc;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Light {
    Ambient { intensity: f32 },
    Directional { intensity: f32, position: Vec3 },
}

pub const AMBIENT_INTENSITY: f32 = 0.8;
pub const DIRECTIONAL_INTENSITY: f32 = 0.6;
pub const DIRECTIONAL_POSITION: Vec3 = Vec3 {
    x: 100.0,
    y: -100.0,
    z: 200.0,
};

/// The lights every facility scene starts with.
pub fn default_lights() -> [Light; 2] {
    [
        Light::Ambient {
            intensity: AMBIENT_INTENSITY,
        },
        Light::Directional {
            intensity: DIRECTIONAL_INTENSITY,
            position: DIRECTIONAL_POSITION,
        },
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub enum RendererError {
    /// The context cannot back a 3D renderer.
    Unsupported { reason: String },
    UnknownObject(ObjectId),
    Disposed,
}

impl fmt::Display for RendererError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RendererError::Unsupported { reason } => write!(f, "renderer unavailable: {reason}"),
            RendererError::UnknownObject(id) => write!(f, "unknown scene object {}", id.0),
            RendererError::Disposed => write!(f, "renderer already disposed"),
        }
    }
}

impl std::error::Error for RendererError {}

pub trait EmbeddedRenderer {
    fn add_light(&mut self, light: Light) -> Result<ObjectId, RendererError>;
    fn add_mesh(&mut self, mesh: MeshDesc) -> Result<ObjectId, RendererError>;
    fn set_object_transform(&mut self, id: ObjectId, transform: Mat4) -> Result<(), RendererError>;
    fn remove_object(&mut self, id: ObjectId) -> Result<(), RendererError>;

    /// Clip-space projection of scene meters, replacing the camera's own.
    fn set_camera_projection(&mut self, projection: Mat4);

    /// Reset only the renderer's own cached GL state.
    fn reset_state(&mut self);
    fn render(&mut self) -> Result<(), RendererError>;

    fn object_count(&self) -> usize;

    /// Release every object and GPU resource. Idempotent.
    fn dispose(&mut self);
}

/// Creates renderers on a host-supplied context.
pub trait RendererFactory {
    fn create(&self, ctx: &GraphicsContext) -> Result<Box<dyn EmbeddedRenderer>, RendererError>;
}

impl<F> RendererFactory for F
where
    F: Fn(&GraphicsContext) -> Result<Box<dyn EmbeddedRenderer>, RendererError>,
{
    fn create(&self, ctx: &GraphicsContext) -> Result<Box<dyn EmbeddedRenderer>, RendererError> {
        self(ctx)
    }
}
