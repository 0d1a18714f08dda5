//! The custom layer that hosts the embedded 3D scene.
//!
//! Geometry is authored in anchor-centred meters. The model matrix places
//! those meters at the anchor in plane units, so the host's projection matrix
//! times the model matrix is the camera projection for the whole scene.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use foundation::math::{LonLat, Mat4, PlaneProjection, Vec3};
use foundation::time::Time;
use layers::{CustomLayer, GraphicsContext, Repaint};
use runtime::AnimationHandle;
use scene::animator::{EntityAnimator, EntityId, EntityPose};
use scene::palette;
use scene::solid::Solid;
use tracing::{debug, warn};

use crate::mesh::{MeshDesc, MeshGeometry, placement};
use crate::renderer::{EmbeddedRenderer, ObjectId, RendererError, RendererFactory, default_lights};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BridgeState {
    Unregistered,
    Registering,
    Active,
    Disposing,
}

/// Read-only view of a bridge's state, usable after the bridge was handed
/// to the host.
#[derive(Debug, Clone)]
pub struct BridgeStatus(Rc<Cell<BridgeState>>);

impl BridgeStatus {
    pub fn state(&self) -> BridgeState {
        self.0.get()
    }
}

/// Everything the embedded scene graph is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeScene {
    pub solids: Vec<Solid>,
    pub vehicle: MeshGeometry,
    pub vehicle_altitude_m: f64,
    /// Scene meters -> plane units, see [`anchor_model_matrix`].
    pub model: Mat4,
}

/// `T(anchor in plane units) * S(s, -s, s)` with `s` plane units per meter.
/// The y flip maps north-up meters into a south-growing plane.
pub fn anchor_model_matrix(projection: &dyn PlaneProjection, anchor: LonLat) -> Mat4 {
    let origin = projection.project(anchor, 0.0);
    let s = projection.meters_to_plane_scale(anchor.lat_deg);
    Mat4::translation(origin).mul(&Mat4::scale(Vec3::new(s, -s, s)))
}

pub struct RenderBridge {
    factory: Rc<dyn RendererFactory>,
    scene: BridgeScene,
    animator: EntityAnimator,
    handle: AnimationHandle,
    state: Rc<Cell<BridgeState>>,
    renderer: Option<Box<dyn EmbeddedRenderer>>,
    vehicles: BTreeMap<EntityId, ObjectId>,
}

impl RenderBridge {
    pub fn new(
        factory: Rc<dyn RendererFactory>,
        scene: BridgeScene,
        animator: EntityAnimator,
        handle: AnimationHandle,
    ) -> Self {
        Self {
            factory,
            scene,
            animator,
            handle,
            state: Rc::new(Cell::new(BridgeState::Unregistered)),
            renderer: None,
            vehicles: BTreeMap::new(),
        }
    }

    pub fn status(&self) -> BridgeStatus {
        BridgeStatus(self.state.clone())
    }

    pub fn state(&self) -> BridgeState {
        self.state.get()
    }

    pub fn animator(&self) -> &EntityAnimator {
        &self.animator
    }

    pub fn object_count(&self) -> usize {
        self.renderer.as_ref().map_or(0, |r| r.object_count())
    }

    /// Release the renderer and stop the loop. Safe in any state.
    pub fn dispose(&mut self) {
        if self.state.get() == BridgeState::Unregistered && self.renderer.is_none() {
            return;
        }
        self.state.set(BridgeState::Disposing);
        runtime::task::stop(&self.handle);
        if let Some(mut renderer) = self.renderer.take() {
            renderer.dispose();
        }
        self.vehicles.clear();
        self.animator.clear();
        self.state.set(BridgeState::Unregistered);
        debug!("render bridge disposed");
    }

    fn vehicle_mesh(&self, pose: &EntityPose) -> MeshDesc {
        MeshDesc {
            label: "vehicle",
            geometry: self.scene.vehicle.clone(),
            color: palette::vehicle(pose.kind),
            opacity: 1.0,
            transform: self.vehicle_transform(pose),
        }
    }

    fn vehicle_transform(&self, pose: &EntityPose) -> Mat4 {
        placement(
            pose.position.extend(self.scene.vehicle_altitude_m),
            pose.heading_rad,
        )
    }

    fn populate(&mut self, renderer: &mut dyn EmbeddedRenderer) -> Result<(), RendererError> {
        for light in default_lights() {
            renderer.add_light(light)?;
        }
        for solid in &self.scene.solids {
            if let Some(mesh) = MeshDesc::from_solid(solid) {
                renderer.add_mesh(mesh)?;
            }
        }
        for pose in self.animator.poses() {
            let id = renderer.add_mesh(self.vehicle_mesh(&pose))?;
            self.vehicles.insert(pose.id, id);
        }
        Ok(())
    }
}

impl CustomLayer for RenderBridge {
    fn on_add(&mut self, ctx: &mut GraphicsContext) -> Result<(), String> {
        if self.state.get() != BridgeState::Unregistered {
            return Err("render bridge is already registered".to_string());
        }
        self.state.set(BridgeState::Registering);

        let mut renderer = match self.factory.create(ctx) {
            Ok(renderer) => renderer,
            Err(err) => {
                self.state.set(BridgeState::Unregistered);
                return Err(err.to_string());
            }
        };
        if let Err(err) = self.populate(renderer.as_mut()) {
            renderer.dispose();
            self.vehicles.clear();
            self.state.set(BridgeState::Unregistered);
            return Err(err.to_string());
        }

        debug!(
            objects = renderer.object_count(),
            vehicles = self.vehicles.len(),
            "render bridge active"
        );
        self.renderer = Some(renderer);
        self.state.set(BridgeState::Active);
        Ok(())
    }

    fn render(&mut self, _ctx: &mut GraphicsContext, matrix: &Mat4, now: Time) -> Repaint {
        if self.state.get() != BridgeState::Active || !self.handle.is_running() {
            return Repaint::Idle;
        }
        let Some(mut renderer) = self.renderer.take() else {
            return Repaint::Idle;
        };

        renderer.set_camera_projection(matrix.mul(&self.scene.model));

        // Advance fully before drawing.
        let poses = self.animator.tick(now);
        for pose in &poses {
            let Some(&object) = self.vehicles.get(&pose.id) else {
                continue;
            };
            if let Err(err) = renderer.set_object_transform(object, self.vehicle_transform(pose)) {
                warn!("vehicle {} not updated: {err}", pose.id.0);
            }
        }

        renderer.reset_state();
        let drawn = renderer.render();
        self.renderer = Some(renderer);
        if let Err(err) = drawn {
            warn!("embedded render failed: {err}");
            return Repaint::Idle;
        }

        if self.animator.is_active() && self.handle.is_running() {
            Repaint::Continue
        } else {
            Repaint::Idle
        }
    }

    fn on_remove(&mut self, _ctx: &mut GraphicsContext) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::{BridgeScene, BridgeState, RenderBridge, anchor_model_matrix};
    use crate::mesh::MeshGeometry;
    use crate::recording::RecordingFactory;
    use formats::Design;
    use foundation::math::{Mat4, PlaneProjection, Vec3, WebMercator};
    use foundation::time::Time;
    use layers::{CustomLayer, GraphicsContext, HostMap, LayerId, RecordingMap, Repaint};
    use scene::animator::{AnimatorOptions, EntityAnimator};
    use scene::solid::{SolidOptions, derive_solids};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn design() -> Design {
        Design::from_json_str(
            r#"{
            "anchor": { "lat": 22.94, "lon": 72.62 },
            "footprint": { "width": 120, "depth": 80, "height": 12 },
            "bays": [ { "rect": [10, 10, 20, 10] } ],
            "truckPaths": {
                "inbound": [[-100, -60], [0, -60]],
                "outbound": [[0, -70], [-100, -70]]
            }
        }"#,
        )
        .expect("design")
    }

    fn bridge(factory: &RecordingFactory) -> (RenderBridge, runtime::AnimationHandle) {
        let design = design();
        let animator = EntityAnimator::from_paths(&design.paths, AnimatorOptions::default());
        let scene = BridgeScene {
            solids: derive_solids(&design, &SolidOptions::default()),
            vehicle: MeshGeometry::vehicle_placeholder(),
            vehicle_altitude_m: 1.5,
            model: anchor_model_matrix(&WebMercator, design.anchor().lon_lat()),
        };
        let handle = runtime::task::start();
        (
            RenderBridge::new(Rc::new(factory.clone()), scene, animator, handle.clone()),
            handle,
        )
    }

    #[test]
    fn model_matrix_places_meters_at_the_anchor() {
        let anchor = foundation::math::LonLat::new(72.62, 22.94);
        let model = anchor_model_matrix(&WebMercator, anchor);
        let origin = WebMercator.project(anchor, 0.0);
        let s = WebMercator.meters_to_plane_scale(anchor.lat_deg);

        assert_eq!(model.transform_point(Vec3::ZERO), origin);
        let east = model.transform_point(Vec3::new(1.0, 0.0, 0.0)) - origin;
        let north = model.transform_point(Vec3::new(0.0, 1.0, 0.0)) - origin;
        assert_close(east.x, s, 1e-15);
        assert_close(north.y, -s, 1e-15);
    }

    #[test]
    fn registers_synchronously_and_builds_the_graph() {
        let factory = RecordingFactory::new();
        let (bridge, _handle) = bridge(&factory);
        let status = bridge.status();
        let solids = bridge.scene.solids.len();
        let mut map = RecordingMap::default();

        map.add_custom_layer(LayerId::new("facility-3d"), Box::new(bridge))
            .expect("custom layer");
        assert_eq!(status.state(), BridgeState::Active);

        // Two lights, every static solid, five vehicles per path.
        let log = factory.log();
        assert_eq!(log.borrow().live_objects, 2 + solids + 10);
        assert_eq!(log.borrow().frames, 0);
    }

    #[test]
    fn renders_with_host_matrix_and_keeps_repainting() {
        let factory = RecordingFactory::new();
        let (bridge, _handle) = bridge(&factory);
        let model = bridge.scene.model;
        let mut map = RecordingMap::default();
        let host = Mat4::scale(Vec3::new(2.0, 2.0, 2.0));
        map.set_camera(host);
        map.add_custom_layer(LayerId::new("facility-3d"), Box::new(bridge))
            .expect("custom layer");

        let drawn = map.run(Time(0.0), 0.016, 4);
        assert_eq!(drawn, 4);
        assert!(map.repaint_requested());

        let log = factory.log();
        assert_eq!(log.borrow().frames, 4);
        assert_eq!(log.borrow().state_resets, 4);
        assert_eq!(log.borrow().last_camera, Some(host.mul(&model)));
    }

    #[test]
    fn vehicles_move_between_frames() {
        let factory = RecordingFactory::new();
        let (mut bridge, _handle) = bridge(&factory);
        let mut ctx = GraphicsContext::new("test", true);
        bridge.on_add(&mut ctx).expect("attach");

        let before: Vec<f64> = bridge.animator().entities().iter().map(|e| e.distance_m).collect();
        bridge.render(&mut ctx, &Mat4::IDENTITY, Time(1.0));
        bridge.render(&mut ctx, &Mat4::IDENTITY, Time(1.04));
        let after: Vec<f64> = bridge.animator().entities().iter().map(|e| e.distance_m).collect();

        for (b, a) in before.iter().zip(&after) {
            // 8 m/s for 40 ms, wrapped on a 100 m path.
            assert_close((a - b).rem_euclid(100.0), 0.32, 1e-9);
        }
    }

    #[test]
    fn stopped_handle_makes_render_a_no_op() {
        let factory = RecordingFactory::new();
        let (mut bridge, handle) = bridge(&factory);
        let mut ctx = GraphicsContext::new("test", true);
        bridge.on_add(&mut ctx).expect("attach");

        runtime::task::stop(&handle);
        assert_eq!(bridge.render(&mut ctx, &Mat4::IDENTITY, Time(0.0)), Repaint::Idle);
        assert_eq!(factory.log().borrow().frames, 0);
    }

    #[test]
    fn dispose_is_idempotent_and_late_renders_are_ignored() {
        let factory = RecordingFactory::new();
        let (mut bridge, handle) = bridge(&factory);
        let mut ctx = GraphicsContext::new("test", true);

        // Never registered.
        bridge.dispose();
        assert_eq!(factory.log().borrow().disposed, 0);

        bridge.on_add(&mut ctx).expect("attach");
        bridge.on_remove(&mut ctx);
        bridge.on_remove(&mut ctx);
        assert_eq!(bridge.state(), BridgeState::Unregistered);
        assert!(!handle.is_running());
        assert_eq!(bridge.object_count(), 0);

        let log = factory.log();
        assert_eq!(log.borrow().disposed, 1);
        assert_eq!(log.borrow().live_objects, 0);

        assert_eq!(bridge.render(&mut ctx, &Mat4::IDENTITY, Time(5.0)), Repaint::Idle);
        assert_eq!(log.borrow().frames, 0);
    }

    #[test]
    fn unsupported_context_leaves_bridge_unregistered() {
        let factory = RecordingFactory::new();
        let (bridge, _handle) = bridge(&factory);
        let status = bridge.status();
        let mut map = RecordingMap::without_3d();

        let err = map
            .add_custom_layer(LayerId::new("facility-3d"), Box::new(bridge))
            .unwrap_err();
        assert!(err.to_string().contains("no 3D support"));
        assert_eq!(status.state(), BridgeState::Unregistered);
        assert_eq!(map.custom_layer_count(), 0);
        assert_eq!(factory.log().borrow().created, 0);
    }
}
