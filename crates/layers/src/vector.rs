use foundation::math::LonLat;
use scene::feature::{Feature, FeatureKind, Geometry, feature_collection};
use scene::palette;
use serde_json::Value;

use crate::host::Marker;
use crate::layer::{LayerId, LayerKind, LayerSpec, MarkerId, SourceId};
use crate::symbology::LayerStyle;

/// Host-native sources, layers and the anchor marker for a feature list.
///
/// One source and one layer per feature kind present, in [`FeatureKind::ALL`]
/// order. The anchor is an overlay marker, not a layer.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VectorLayerSet {
    pub sources: Vec<(SourceId, Value)>,
    pub layers: Vec<LayerSpec>,
    pub marker: Option<Marker>,
}

impl VectorLayerSet {
    pub fn from_features(prefix: &str, features: &[Feature]) -> Self {
        let mut out = Self::default();

        for kind in FeatureKind::ALL {
            if kind == FeatureKind::Anchor {
                continue;
            }
            let of_kind: Vec<&Feature> = features.iter().filter(|f| f.kind == kind).collect();
            if of_kind.is_empty() {
                continue;
            }
            let source = source_id(prefix, kind);
            let (layer_kind, style) = style_for(kind);
            out.layers.push(LayerSpec::new(
                layer_id(prefix, kind),
                source.clone(),
                layer_kind,
                style,
            ));
            out.sources.push((source, feature_collection(of_kind)));
        }

        out.marker = features
            .iter()
            .find_map(|f| match (&f.kind, &f.geometry) {
                (FeatureKind::Anchor, Geometry::Point { position }) => Some(*position),
                _ => None,
            })
            .map(|position| anchor_marker(prefix, position));

        out
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() && self.layers.is_empty() && self.marker.is_none()
    }
}

pub fn source_id(prefix: &str, kind: FeatureKind) -> SourceId {
    SourceId(format!("{prefix}-{}", kind.as_str()))
}

pub fn layer_id(prefix: &str, kind: FeatureKind) -> LayerId {
    LayerId(format!("{prefix}-{}-layer", kind.as_str()))
}

pub fn anchor_marker(prefix: &str, position: LonLat) -> Marker {
    Marker {
        id: MarkerId(format!("{prefix}-anchor")),
        position,
        color: palette::ANCHOR.to_hex_string(),
        label: Some("anchor".to_string()),
    }
}

fn style_for(kind: FeatureKind) -> (LayerKind, LayerStyle) {
    match kind {
        FeatureKind::Halo => (LayerKind::Fill, LayerStyle::by_attribute(0.35, 0.0)),
        FeatureKind::Building => (LayerKind::FillExtrusion, LayerStyle::by_attribute(0.85, 0.0)),
        FeatureKind::Bay => (LayerKind::Fill, LayerStyle::by_attribute(0.6, 0.0)),
        FeatureKind::Conveyor => (LayerKind::Line, LayerStyle::by_attribute(1.0, 4.0)),
        FeatureKind::Dock => (LayerKind::Circle, LayerStyle::by_attribute(1.0, 6.0)),
        FeatureKind::Path => (LayerKind::Line, LayerStyle::by_attribute(0.8, 3.0)),
        FeatureKind::Anchor => (LayerKind::Circle, LayerStyle::by_attribute(1.0, 5.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::{VectorLayerSet, layer_id, source_id};
    use crate::layer::{LayerKind, MarkerId};
    use formats::Design;
    use pretty_assertions::assert_eq;
    use scene::{BuildOptions, FeatureKind, SceneBuilder};

    fn features(doc: &str) -> Vec<scene::Feature> {
        let design = Design::from_json_str(doc).expect("design");
        SceneBuilder::new(BuildOptions::default()).build(&design).features
    }

    #[test]
    fn one_source_and_layer_per_kind() {
        let features = features(
            r#"{
                "anchor": {"lat": 22.94, "lon": 72.62},
                "footprint": {"width": 120, "depth": 80, "height": 12},
                "bays": [{"rect": [10, 10, 20, 10]}, {"rect": [40, 10, 20, 10]}],
                "conveyors": [{"points": [[0, 0], [50, 0]], "type": "manual"}],
                "docks": [{"side": "north", "type": "inbound"}],
                "truckPaths": {"inbound": [[-100, 0], [0, 0]]}
            }"#,
        );
        let set = VectorLayerSet::from_features("facility", &features);

        let kinds: Vec<LayerKind> = set.layers.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LayerKind::Fill,
                LayerKind::FillExtrusion,
                LayerKind::Fill,
                LayerKind::Line,
                LayerKind::Circle,
                LayerKind::Line,
            ]
        );
        assert_eq!(set.sources.len(), set.layers.len());
        for (layer, (source, _)) in set.layers.iter().zip(&set.sources) {
            assert_eq!(&layer.source, source);
        }

        let (_, bays) = &set.sources[2];
        assert_eq!(bays["features"].as_array().map(Vec::len), Some(2));
        assert_eq!(set.layers[2].id, layer_id("facility", FeatureKind::Bay));
        assert_eq!(set.sources[2].0, source_id("facility", FeatureKind::Bay));

        let marker = set.marker.expect("anchor marker");
        assert_eq!(marker.id, MarkerId::new("facility-anchor"));
        assert_eq!(marker.position.lat_deg, 22.94);
    }

    #[test]
    fn skips_empty_kinds() {
        let features = features(r#"{"anchor": {"lat": 10.0, "lon": 20.0}}"#);
        let set = VectorLayerSet::from_features("x", &features);
        assert!(set.layers.is_empty());
        assert!(set.sources.is_empty());
        assert!(set.marker.is_some());
        assert!(!set.is_empty());
    }
}
