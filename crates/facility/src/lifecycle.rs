//! Everything a build put on the host, and how to take it off again.

use layers::{HostError, HostMap, LayerId, MarkerId, SourceId};
use runtime::AnimationHandle;
use tracing::{debug, warn};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TeardownReport {
    pub removed: usize,
    /// Ids that were already gone from the host.
    pub missing: usize,
    /// Removals the host refused; logged and skipped.
    pub failed: usize,
}

/// Ids of every resource a build created.
///
/// Teardown stops the animation first, then removes custom layers, styled
/// layers, markers and finally sources, each group newest first.
#[derive(Debug, Default)]
pub struct ResourceLedger {
    animation: Option<AnimationHandle>,
    custom_layers: Vec<LayerId>,
    layers: Vec<LayerId>,
    markers: Vec<MarkerId>,
    sources: Vec<SourceId>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_animation(&mut self, handle: AnimationHandle) {
        if let Some(previous) = self.animation.replace(handle) {
            runtime::task::stop(&previous);
        }
    }

    pub fn record_custom_layer(&mut self, id: LayerId) {
        self.custom_layers.push(id);
    }

    pub fn record_layer(&mut self, id: LayerId) {
        self.layers.push(id);
    }

    pub fn record_marker(&mut self, id: MarkerId) {
        self.markers.push(id);
    }

    pub fn record_source(&mut self, id: SourceId) {
        self.sources.push(id);
    }

    pub fn animation(&self) -> Option<&AnimationHandle> {
        self.animation.as_ref()
    }

    pub fn sources(&self) -> &[SourceId] {
        &self.sources
    }

    pub fn layers(&self) -> impl Iterator<Item = &LayerId> + '_ {
        self.custom_layers.iter().chain(&self.layers)
    }

    pub fn markers(&self) -> &[MarkerId] {
        &self.markers
    }

    /// Host resources tracked (the animation handle is not one).
    pub fn len(&self) -> usize {
        self.custom_layers.len() + self.layers.len() + self.markers.len() + self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0 && self.animation.is_none()
    }

    /// Remove everything recorded. Never fails; ids already absent are
    /// counted and skipped.
    pub fn teardown(&mut self, map: &mut dyn HostMap) -> TeardownReport {
        let mut report = TeardownReport::default();

        if let Some(handle) = self.animation.take() {
            runtime::task::stop(&handle);
        }

        for id in self.custom_layers.drain(..).rev() {
            tally(&mut report, "custom layer", map.remove_layer(&id));
        }
        for id in self.layers.drain(..).rev() {
            tally(&mut report, "layer", map.remove_layer(&id));
        }
        for id in self.markers.drain(..).rev() {
            tally(&mut report, "marker", map.remove_marker(&id));
        }
        for id in self.sources.drain(..).rev() {
            tally(&mut report, "source", map.remove_source(&id));
        }

        debug!(
            removed = report.removed,
            missing = report.missing,
            failed = report.failed,
            "ledger torn down"
        );
        report
    }
}

fn tally(report: &mut TeardownReport, what: &str, result: Result<(), HostError>) {
    match result {
        Ok(()) => report.removed += 1,
        Err(err) if err.is_missing() => report.missing += 1,
        Err(err) => {
            warn!("could not remove {what}: {err}");
            report.failed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ResourceLedger, TeardownReport};
    use foundation::math::LonLat;
    use layers::{
        HostMap, LayerId, LayerKind, LayerSpec, LayerStyle, Marker, MarkerId, RecordingMap,
        SourceId,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn populate(map: &mut RecordingMap, ledger: &mut ResourceLedger) {
        for name in ["a", "b"] {
            let source = SourceId::new(format!("src-{name}"));
            map.add_source(source.clone(), json!({})).expect("source");
            ledger.record_source(source.clone());

            let layer = LayerId::new(format!("layer-{name}"));
            map.add_layer(LayerSpec::new(
                layer.clone(),
                source,
                LayerKind::Fill,
                LayerStyle::default(),
            ))
            .expect("layer");
            ledger.record_layer(layer);
        }
        let marker = Marker {
            id: MarkerId::new("pin"),
            position: LonLat::new(1.0, 2.0),
            color: "#00d08a".into(),
            label: None,
        };
        ledger.record_marker(marker.id.clone());
        map.add_marker(marker).expect("marker");
    }

    #[test]
    fn removes_layers_before_their_sources() {
        let mut map = RecordingMap::default();
        let mut ledger = ResourceLedger::new();
        populate(&mut map, &mut ledger);
        assert_eq!(ledger.len(), 5);

        let report = ledger.teardown(&mut map);
        assert_eq!(
            report,
            TeardownReport {
                removed: 5,
                missing: 0,
                failed: 0
            }
        );
        assert!(map.is_empty());
        assert!(ledger.is_empty());
    }

    #[test]
    fn tolerates_ids_already_removed() {
        let mut map = RecordingMap::default();
        let mut ledger = ResourceLedger::new();
        populate(&mut map, &mut ledger);

        map.remove_layer(&LayerId::new("layer-a")).expect("remove");
        map.remove_source(&SourceId::new("src-a")).expect("remove");
        map.remove_marker(&MarkerId::new("pin")).expect("remove");

        let report = ledger.teardown(&mut map);
        assert_eq!(report.removed, 2);
        assert_eq!(report.missing, 3);
        assert!(map.is_empty());

        // A second teardown has nothing left to do.
        assert_eq!(ledger.teardown(&mut map), TeardownReport::default());
    }

    #[test]
    fn stops_the_animation_first() {
        let mut map = RecordingMap::default();
        let mut ledger = ResourceLedger::new();
        let first = runtime::task::start();
        let second = runtime::task::start();
        ledger.record_animation(first.clone());
        ledger.record_animation(second.clone());
        assert!(!first.is_running());
        assert!(second.is_running());

        ledger.teardown(&mut map);
        assert!(!second.is_running());
        assert!(ledger.animation().is_none());
    }
}
