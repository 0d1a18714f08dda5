//! In-memory renderer that records what it was asked to draw.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use foundation::math::Mat4;
use layers::GraphicsContext;

use crate::mesh::MeshDesc;
use crate::renderer::{EmbeddedRenderer, Light, ObjectId, RendererError, RendererFactory};

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedObject {
    Light(Light),
    Mesh { mesh: MeshDesc, transform: Mat4 },
}

/// Counters shared between a factory and every renderer it created.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RendererLog {
    pub created: usize,
    pub disposed: usize,
    pub frames: u64,
    pub state_resets: u64,
    pub live_objects: usize,
    pub last_camera: Option<Mat4>,
}

pub type SharedLog = Rc<RefCell<RendererLog>>;

pub struct RecordingRenderer {
    objects: BTreeMap<ObjectId, RecordedObject>,
    next_id: u32,
    camera: Mat4,
    disposed: bool,
    log: SharedLog,
}

impl RecordingRenderer {
    pub fn new(log: SharedLog) -> Self {
        log.borrow_mut().created += 1;
        Self {
            objects: BTreeMap::new(),
            next_id: 0,
            camera: Mat4::IDENTITY,
            disposed: false,
            log,
        }
    }

    pub fn object(&self, id: ObjectId) -> Option<&RecordedObject> {
        self.objects.get(&id)
    }

    pub fn camera(&self) -> &Mat4 {
        &self.camera
    }

    fn insert(&mut self, object: RecordedObject) -> Result<ObjectId, RendererError> {
        if self.disposed {
            return Err(RendererError::Disposed);
        }
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects.insert(id, object);
        self.log.borrow_mut().live_objects += 1;
        Ok(id)
    }
}

impl EmbeddedRenderer for RecordingRenderer {
    fn add_light(&mut self, light: Light) -> Result<ObjectId, RendererError> {
        self.insert(RecordedObject::Light(light))
    }

    fn add_mesh(&mut self, mesh: MeshDesc) -> Result<ObjectId, RendererError> {
        let transform = mesh.transform;
        self.insert(RecordedObject::Mesh { mesh, transform })
    }

    fn set_object_transform(&mut self, id: ObjectId, transform: Mat4) -> Result<(), RendererError> {
        match self.objects.get_mut(&id) {
            Some(RecordedObject::Mesh { transform: t, .. }) => {
                *t = transform;
                Ok(())
            }
            _ => Err(RendererError::UnknownObject(id)),
        }
    }

    fn remove_object(&mut self, id: ObjectId) -> Result<(), RendererError> {
        self.objects
            .remove(&id)
            .ok_or(RendererError::UnknownObject(id))?;
        self.log.borrow_mut().live_objects -= 1;
        Ok(())
    }

    fn set_camera_projection(&mut self, projection: Mat4) {
        self.camera = projection;
        self.log.borrow_mut().last_camera = Some(projection);
    }

    fn reset_state(&mut self) {
        self.log.borrow_mut().state_resets += 1;
    }

    fn render(&mut self) -> Result<(), RendererError> {
        if self.disposed {
            return Err(RendererError::Disposed);
        }
        self.log.borrow_mut().frames += 1;
        Ok(())
    }

    fn object_count(&self) -> usize {
        self.objects.len()
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        let mut log = self.log.borrow_mut();
        log.live_objects -= self.objects.len();
        log.disposed += 1;
        self.objects.clear();
    }
}

/// Hands out [`RecordingRenderer`]s that share one log. Refuses contexts
/// without 3D support.
#[derive(Debug, Default, Clone)]
pub struct RecordingFactory {
    log: SharedLog,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> SharedLog {
        self.log.clone()
    }
}

impl RendererFactory for RecordingFactory {
    fn create(&self, ctx: &GraphicsContext) -> Result<Box<dyn EmbeddedRenderer>, RendererError> {
        if !ctx.supports_3d {
            return Err(RendererError::Unsupported {
                reason: format!("context `{}` has no 3D support", ctx.label),
            });
        }
        Ok(Box::new(RecordingRenderer::new(self.log.clone())))
    }
}
