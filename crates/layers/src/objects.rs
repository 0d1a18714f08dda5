//! Vehicles as host-native circles, for scenes without the embedded renderer.

use foundation::math::LocalFrame;
use scene::animator::EntityPose;
use scene::palette;
use serde_json::{Map, Value, json};

use crate::layer::{LayerId, LayerKind, LayerSpec, SourceId};
use crate::symbology::LayerStyle;

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleLayer {
    source: SourceId,
    layer: LayerId,
}

impl VehicleLayer {
    pub fn new(prefix: &str) -> Self {
        Self {
            source: SourceId(format!("{prefix}-vehicles")),
            layer: LayerId(format!("{prefix}-vehicles-layer")),
        }
    }

    pub fn source_id(&self) -> &SourceId {
        &self.source
    }

    pub fn layer_id(&self) -> &LayerId {
        &self.layer
    }

    pub fn spec(&self) -> LayerSpec {
        LayerSpec::new(
            self.layer.clone(),
            self.source.clone(),
            LayerKind::Circle,
            LayerStyle::by_attribute(1.0, 5.0),
        )
    }

    /// Point collection for `poses`, which are in anchor-centred meters.
    pub fn extract(&self, frame: &LocalFrame, poses: &[EntityPose]) -> Value {
        let features: Vec<Value> = poses
            .iter()
            .map(|pose| {
                let p = frame.centered_to_geo(pose.position);
                let mut properties = Map::new();
                properties.insert("id".to_string(), Value::from(pose.id.0));
                properties.insert("flow".to_string(), Value::from(pose.kind.as_str()));
                properties.insert(
                    "color".to_string(),
                    Value::from(palette::vehicle(pose.kind).to_hex_string()),
                );
                json!({
                    "type": "Feature",
                    "properties": properties,
                    "geometry": { "type": "Point", "coordinates": [p.lon_deg, p.lat_deg] },
                })
            })
            .collect();
        json!({ "type": "FeatureCollection", "features": features })
    }
}
