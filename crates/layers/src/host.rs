//! The host map collaborator.
//!
//! A host map owns named sources (GeoJSON payloads), layers drawing those
//! sources, overlay markers and custom render targets. Everything runs on the
//! host's UI thread; the only scheduling primitive is the repaint request.

use std::fmt;

use foundation::math::{LonLat, Mat4, PlaneProjection};
use foundation::time::Time;
use serde_json::Value;

use crate::layer::{LayerId, LayerSpec, MarkerId, SourceId};

#[derive(Debug, Clone, PartialEq)]
pub enum HostError {
    DuplicateSource(SourceId),
    DuplicateLayer(LayerId),
    DuplicateMarker(MarkerId),
    MissingSource(SourceId),
    MissingLayer(LayerId),
    MissingMarker(MarkerId),
    /// The source is still drawn by a layer.
    SourceInUse { source: SourceId, layer: LayerId },
    /// A custom layer refused to attach.
    CustomLayerFailed { layer: LayerId, reason: String },
}

impl HostError {
    /// The id the operation targeted does not exist.
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            HostError::MissingSource(_) | HostError::MissingLayer(_) | HostError::MissingMarker(_)
        )
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::DuplicateSource(id) => write!(f, "source `{id}` already exists"),
            HostError::DuplicateLayer(id) => write!(f, "layer `{id}` already exists"),
            HostError::DuplicateMarker(id) => write!(f, "marker `{id}` already exists"),
            HostError::MissingSource(id) => write!(f, "source `{id}` does not exist"),
            HostError::MissingLayer(id) => write!(f, "layer `{id}` does not exist"),
            HostError::MissingMarker(id) => write!(f, "marker `{id}` does not exist"),
            HostError::SourceInUse { source, layer } => {
                write!(f, "source `{source}` is still used by layer `{layer}`")
            }
            HostError::CustomLayerFailed { layer, reason } => {
                write!(f, "custom layer `{layer}` failed to attach: {reason}")
            }
        }
    }
}

impl std::error::Error for HostError {}

/// The host's graphics context, shared with every custom layer.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsContext {
    /// Whether the context can back an embedded 3D renderer.
    pub supports_3d: bool,
    pub label: String,
}

impl GraphicsContext {
    pub fn new(label: impl Into<String>, supports_3d: bool) -> Self {
        Self {
            supports_3d,
            label: label.into(),
        }
    }
}

/// What a custom layer wants after drawing a frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Repaint {
    /// Schedule another repaint; this is what drives the next tick.
    Continue,
    Idle,
}

/// A render target living inside the host's pipeline.
pub trait CustomLayer {
    /// Called synchronously when the layer is added, before any render.
    fn on_add(&mut self, ctx: &mut GraphicsContext) -> Result<(), String>;

    /// Called on every host repaint with the host's projection matrix, which
    /// maps plane units to clip space.
    fn render(&mut self, ctx: &mut GraphicsContext, matrix: &Mat4, now: Time) -> Repaint;

    /// Called when the layer is removed. Must be safe to call repeatedly.
    fn on_remove(&mut self, ctx: &mut GraphicsContext);
}

/// Overlay element pinned to a geographic point.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: MarkerId,
    pub position: LonLat,
    /// `#rrggbb`.
    pub color: String,
    pub label: Option<String>,
}

pub trait HostMap {
    fn add_source(&mut self, id: SourceId, data: Value) -> Result<(), HostError>;
    fn set_source_data(&mut self, id: &SourceId, data: Value) -> Result<(), HostError>;
    fn remove_source(&mut self, id: &SourceId) -> Result<(), HostError>;
    fn has_source(&self, id: &SourceId) -> bool;

    fn add_layer(&mut self, spec: LayerSpec) -> Result<(), HostError>;
    /// Adds and attaches a custom layer. `on_add` has returned by the time
    /// this does; if it failed the layer is not kept.
    fn add_custom_layer(
        &mut self,
        id: LayerId,
        layer: Box<dyn CustomLayer>,
    ) -> Result<(), HostError>;
    /// Removes a styled or custom layer; custom layers get `on_remove`.
    fn remove_layer(&mut self, id: &LayerId) -> Result<(), HostError>;
    fn has_layer(&self, id: &LayerId) -> bool;

    fn add_marker(&mut self, marker: Marker) -> Result<(), HostError>;
    fn remove_marker(&mut self, id: &MarkerId) -> Result<(), HostError>;
    fn has_marker(&self, id: &MarkerId) -> bool;

    fn request_repaint(&mut self);

    /// Geographic to plane units for the current view.
    fn projection(&self) -> &dyn PlaneProjection;
}
