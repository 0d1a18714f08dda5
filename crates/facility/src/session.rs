//! Build and tear down a facility scene on a host map.

use std::rc::Rc;

use formats::Design;
use gpu::bridge::{BridgeScene, BridgeState, BridgeStatus, RenderBridge, anchor_model_matrix};
use gpu::mesh::MeshGeometry;
use gpu::renderer::RendererFactory;
use layers::{HostError, HostMap, LayerId, VectorLayerSet, VehicleLayer};
use runtime::EventBus;
use scene::animator::EntityAnimator;
use scene::builder::SceneBuilder;
use scene::error::SceneError;
use scene::solid::derive_solids;
use tracing::{info, warn};

use crate::config::SceneConfig;
use crate::lifecycle::{ResourceLedger, TeardownReport};

/// Event kinds published on the session's bus.
pub const NOTICE: &str = "notice";
pub const ISSUE: &str = "issue";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RenderMode {
    /// Host-native layers plus the embedded 3D scene.
    ThreeD,
    /// Host-native layers only, vehicles as circles at their start positions.
    TwoD,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub content_hash: String,
    pub mode: RenderMode,
    pub features: usize,
    pub vehicles: usize,
    /// Non-fatal problems; the scene was built anyway.
    pub issues: Vec<SceneError>,
    pub notice: String,
}

/// One facility scene on one host map.
///
/// `build` always clears what the previous build created first; `clear`
/// leaves the host exactly as it was before the first build. Resources
/// the session did not create are never touched.
pub struct SceneSession {
    config: SceneConfig,
    factory: Rc<dyn RendererFactory>,
    vehicle_asset: Option<Result<MeshGeometry, String>>,
    ledger: ResourceLedger,
    bridge: Option<BridgeStatus>,
    content_hash: Option<String>,
    events: EventBus,
}

impl SceneSession {
    pub fn new(config: SceneConfig, factory: Rc<dyn RendererFactory>) -> Self {
        Self {
            config: config.normalized(),
            factory,
            vehicle_asset: None,
            ledger: ResourceLedger::new(),
            bridge: None,
            content_hash: None,
            events: EventBus::new(),
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Outcome of loading the vehicle model, used by later builds. A failure
    /// falls back to the procedural box.
    pub fn set_vehicle_asset(&mut self, asset: Result<MeshGeometry, String>) {
        self.vehicle_asset = Some(asset);
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn bridge_state(&self) -> Option<BridgeState> {
        self.bridge.as_ref().map(BridgeStatus::state)
    }

    /// Hash of the design currently on the map.
    pub fn content_hash(&self) -> Option<&str> {
        self.content_hash.as_deref()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Parse `payload` and build it. Fatal document errors leave the map
    /// cleared and are returned.
    pub fn build_from_str(
        &mut self,
        map: &mut dyn HostMap,
        payload: &str,
    ) -> Result<BuildReport, SceneError> {
        self.clear(map);
        match Design::from_json_str(payload) {
            Ok(design) => Ok(self.build(map, &design)),
            Err(err) => {
                let err = SceneError::from(err);
                warn!("facility design rejected: {err}");
                self.events
                    .emit(NOTICE, format!("facility could not be loaded: {err}"));
                Err(err)
            }
        }
    }

    pub fn build(&mut self, map: &mut dyn HostMap, design: &Design) -> BuildReport {
        self.clear(map);
        let prefix = self.config.id_prefix.clone();

        let built = SceneBuilder::new(self.config.build_options()).build(design);
        let mut issues = built.issues;

        let set = VectorLayerSet::from_features(&prefix, &built.features);
        for (id, data) in set.sources {
            match map.add_source(id.clone(), data) {
                Ok(()) => self.ledger.record_source(id),
                Err(err) => warn!("source skipped: {err}"),
            }
        }
        for spec in set.layers {
            let id = spec.id.clone();
            match map.add_layer(spec) {
                Ok(()) => self.ledger.record_layer(id),
                Err(err) => warn!("layer skipped: {err}"),
            }
        }
        if let Some(marker) = set.marker {
            let id = marker.id.clone();
            match map.add_marker(marker) {
                Ok(()) => self.ledger.record_marker(id),
                Err(err) => warn!("anchor marker skipped: {err}"),
            }
        }

        let animator = EntityAnimator::from_paths(&design.paths, self.config.animator_options());
        let initial_poses = animator.poses();
        let vehicle = match &self.vehicle_asset {
            None => MeshGeometry::vehicle_placeholder(),
            Some(Ok(geometry)) => geometry.clone(),
            Some(Err(reason)) => {
                issues.push(SceneError::AssetLoadFailure {
                    asset: "vehicle".to_string(),
                    reason: reason.clone(),
                });
                MeshGeometry::vehicle_placeholder()
            }
        };

        let mode = if self.config.enable_3d {
            let scene = BridgeScene {
                solids: derive_solids(design, &self.config.solid_options()),
                vehicle,
                vehicle_altitude_m: self.config.vehicle_altitude_m,
                model: anchor_model_matrix(map.projection(), design.anchor().lon_lat()),
            };
            match self.attach_bridge(map, &prefix, scene, animator) {
                Ok(()) => RenderMode::ThreeD,
                Err(err) => {
                    let reason = err.to_string();
                    warn!("falling back to 2D: {reason}");
                    issues.push(SceneError::RendererUnavailable { reason });
                    RenderMode::TwoD
                }
            }
        } else {
            RenderMode::TwoD
        };

        if mode == RenderMode::TwoD && !initial_poses.is_empty() {
            let vehicles = VehicleLayer::new(&prefix);
            let data = vehicles.extract(&design.frame, &initial_poses);
            match map.add_source(vehicles.source_id().clone(), data) {
                Ok(()) => {
                    self.ledger.record_source(vehicles.source_id().clone());
                    match map.add_layer(vehicles.spec()) {
                        Ok(()) => self.ledger.record_layer(vehicles.layer_id().clone()),
                        Err(err) => warn!("vehicle layer skipped: {err}"),
                    }
                }
                Err(err) => warn!("vehicle source skipped: {err}"),
            }
        }

        let notice = notice(design, mode, initial_poses.len());
        for issue in &issues {
            self.events.emit(ISSUE, issue.to_string());
        }
        self.events.emit(NOTICE, notice.clone());
        self.content_hash = Some(design.content_hash.clone());

        info!(
            hash = %design.content_hash,
            resources = self.ledger.len(),
            issues = issues.len(),
            three_d = mode == RenderMode::ThreeD,
            "facility scene built"
        );

        BuildReport {
            content_hash: design.content_hash.clone(),
            mode,
            features: built.features.len(),
            vehicles: initial_poses.len(),
            issues,
            notice,
        }
    }

    /// Stop the animation and remove everything the last build created.
    pub fn clear(&mut self, map: &mut dyn HostMap) -> TeardownReport {
        let report = self.ledger.teardown(map);
        self.bridge = None;
        if let Some(hash) = self.content_hash.take() {
            info!(hash = %hash, removed = report.removed, "facility scene cleared");
        }
        report
    }

    fn attach_bridge(
        &mut self,
        map: &mut dyn HostMap,
        prefix: &str,
        scene: BridgeScene,
        animator: EntityAnimator,
    ) -> Result<(), HostError> {
        let handle = runtime::task::start();
        let bridge = RenderBridge::new(self.factory.clone(), scene, animator, handle.clone());
        let status = bridge.status();
        let id = LayerId(format!("{prefix}-3d"));

        if let Err(err) = map.add_custom_layer(id.clone(), Box::new(bridge)) {
            runtime::task::stop(&handle);
            return Err(err);
        }
        self.ledger.record_animation(handle);
        self.ledger.record_custom_layer(id);
        self.bridge = Some(status);
        map.request_repaint();
        Ok(())
    }
}

fn notice(design: &Design, mode: RenderMode, vehicles: usize) -> String {
    let what = format!(
        "{} bays, {} conveyors, {} docks, {} vehicles",
        design.bays.len(),
        design.conveyors.len(),
        design.docks.len(),
        vehicles
    );
    match mode {
        RenderMode::ThreeD => format!("3D facility loaded: {what}"),
        RenderMode::TwoD => format!("2D facility loaded: {what}"),
    }
}
