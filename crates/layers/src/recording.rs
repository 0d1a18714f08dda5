//! In-memory host map for tests and headless runs.

use std::collections::BTreeMap;

use foundation::math::{Mat4, PlaneProjection, WebMercator};
use foundation::time::Time;
use serde_json::Value;
use tracing::trace;

use crate::host::{CustomLayer, GraphicsContext, HostError, HostMap, Marker, Repaint};
use crate::layer::{LayerId, LayerSpec, MarkerId, SourceId};

enum LayerEntry {
    Styled(LayerSpec),
    Custom(LayerId, Box<dyn CustomLayer>),
}

impl LayerEntry {
    fn id(&self) -> &LayerId {
        match self {
            LayerEntry::Styled(spec) => &spec.id,
            LayerEntry::Custom(id, _) => id,
        }
    }
}

/// A host map that keeps everything in memory and renders on demand.
///
/// Enforces the same ordering rules as a real host: layers need their
/// source, a source cannot be removed while a layer draws it, and ids are
/// unique.
pub struct RecordingMap {
    sources: BTreeMap<SourceId, Value>,
    layers: Vec<LayerEntry>,
    markers: BTreeMap<MarkerId, Marker>,
    ctx: GraphicsContext,
    projection: WebMercator,
    camera: Mat4,
    repaint_requested: bool,
    frames_rendered: u64,
}

impl Default for RecordingMap {
    fn default() -> Self {
        Self::new(GraphicsContext::new("recording", true))
    }
}

impl RecordingMap {
    pub fn new(ctx: GraphicsContext) -> Self {
        Self {
            sources: BTreeMap::new(),
            layers: Vec::new(),
            markers: BTreeMap::new(),
            ctx,
            projection: WebMercator,
            camera: Mat4::IDENTITY,
            repaint_requested: false,
            frames_rendered: 0,
        }
    }

    /// A host whose context cannot back a 3D renderer.
    pub fn without_3d() -> Self {
        Self::new(GraphicsContext::new("recording-2d", false))
    }

    pub fn set_camera(&mut self, camera: Mat4) {
        self.camera = camera;
    }

    pub fn context(&self) -> &GraphicsContext {
        &self.ctx
    }

    pub fn source(&self, id: &SourceId) -> Option<&Value> {
        self.sources.get(id)
    }

    pub fn layer_ids(&self) -> Vec<&LayerId> {
        self.layers.iter().map(LayerEntry::id).collect()
    }

    pub fn layer_spec(&self, id: &LayerId) -> Option<&LayerSpec> {
        self.layers.iter().find_map(|entry| match entry {
            LayerEntry::Styled(spec) if &spec.id == id => Some(spec),
            _ => None,
        })
    }

    pub fn marker(&self, id: &MarkerId) -> Option<&Marker> {
        self.markers.get(id)
    }

    pub fn custom_layer_count(&self) -> usize {
        self.layers
            .iter()
            .filter(|e| matches!(e, LayerEntry::Custom(..)))
            .count()
    }

    /// Sources, layers and markers currently on the map.
    pub fn resource_count(&self) -> usize {
        self.sources.len() + self.layers.len() + self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resource_count() == 0
    }

    pub fn repaint_requested(&self) -> bool {
        self.repaint_requested
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Draw one frame: every custom layer renders in stacking order. A
    /// `Continue` from any of them schedules the next repaint.
    pub fn render_frame(&mut self, now: Time) {
        self.repaint_requested = false;
        self.frames_rendered += 1;
        let mut again = false;
        for entry in &mut self.layers {
            if let LayerEntry::Custom(_, layer) = entry {
                again |= layer.render(&mut self.ctx, &self.camera, now) == Repaint::Continue;
            }
        }
        self.repaint_requested |= again;
        trace!(frame = self.frames_rendered, again, "rendered frame");
    }

    /// Render while repaints keep being requested, at most `max_frames`
    /// times, `step_s` apart from `start`. Returns the frames drawn.
    pub fn run(&mut self, start: Time, step_s: f64, max_frames: usize) -> usize {
        let mut drawn = 0;
        while drawn < max_frames && self.repaint_requested {
            self.render_frame(Time(start.0 + step_s * drawn as f64));
            drawn += 1;
        }
        drawn
    }

    fn layer_position(&self, id: &LayerId) -> Option<usize> {
        self.layers.iter().position(|e| e.id() == id)
    }
}

impl HostMap for RecordingMap {
    fn add_source(&mut self, id: SourceId, data: Value) -> Result<(), HostError> {
        if self.sources.contains_key(&id) {
            return Err(HostError::DuplicateSource(id));
        }
        self.sources.insert(id, data);
        Ok(())
    }

    fn set_source_data(&mut self, id: &SourceId, data: Value) -> Result<(), HostError> {
        let slot = self
            .sources
            .get_mut(id)
            .ok_or_else(|| HostError::MissingSource(id.clone()))?;
        *slot = data;
        Ok(())
    }

    fn remove_source(&mut self, id: &SourceId) -> Result<(), HostError> {
        if !self.sources.contains_key(id) {
            return Err(HostError::MissingSource(id.clone()));
        }
        let user = self.layers.iter().find_map(|entry| match entry {
            LayerEntry::Styled(spec) if &spec.source == id => Some(spec.id.clone()),
            _ => None,
        });
        if let Some(layer) = user {
            return Err(HostError::SourceInUse {
                source: id.clone(),
                layer,
            });
        }
        self.sources.remove(id);
        Ok(())
    }

    fn has_source(&self, id: &SourceId) -> bool {
        self.sources.contains_key(id)
    }

    fn add_layer(&mut self, spec: LayerSpec) -> Result<(), HostError> {
        if self.has_layer(&spec.id) {
            return Err(HostError::DuplicateLayer(spec.id));
        }
        if !self.sources.contains_key(&spec.source) {
            return Err(HostError::MissingSource(spec.source));
        }
        self.layers.push(LayerEntry::Styled(spec));
        Ok(())
    }

    fn add_custom_layer(
        &mut self,
        id: LayerId,
        mut layer: Box<dyn CustomLayer>,
    ) -> Result<(), HostError> {
        if self.has_layer(&id) {
            return Err(HostError::DuplicateLayer(id));
        }
        if let Err(reason) = layer.on_add(&mut self.ctx) {
            layer.on_remove(&mut self.ctx);
            return Err(HostError::CustomLayerFailed { layer: id, reason });
        }
        self.layers.push(LayerEntry::Custom(id, layer));
        self.repaint_requested = true;
        Ok(())
    }

    fn remove_layer(&mut self, id: &LayerId) -> Result<(), HostError> {
        let index = self
            .layer_position(id)
            .ok_or_else(|| HostError::MissingLayer(id.clone()))?;
        if let LayerEntry::Custom(_, mut layer) = self.layers.remove(index) {
            layer.on_remove(&mut self.ctx);
        }
        Ok(())
    }

    fn has_layer(&self, id: &LayerId) -> bool {
        self.layer_position(id).is_some()
    }

    fn add_marker(&mut self, marker: Marker) -> Result<(), HostError> {
        if self.markers.contains_key(&marker.id) {
            return Err(HostError::DuplicateMarker(marker.id));
        }
        self.markers.insert(marker.id.clone(), marker);
        Ok(())
    }

    fn remove_marker(&mut self, id: &MarkerId) -> Result<(), HostError> {
        self.markers
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| HostError::MissingMarker(id.clone()))
    }

    fn has_marker(&self, id: &MarkerId) -> bool {
        self.markers.contains_key(id)
    }

    fn request_repaint(&mut self) {
        self.repaint_requested = true;
    }

    fn projection(&self) -> &dyn PlaneProjection {
        &self.projection
    }
}
