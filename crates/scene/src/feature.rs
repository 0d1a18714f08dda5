use foundation::math::LonLat;
use serde_json::{Map, Value};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureKind {
    Halo,
    Building,
    Bay,
    Conveyor,
    Dock,
    Path,
    Anchor,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 7] = [
        FeatureKind::Halo,
        FeatureKind::Building,
        FeatureKind::Bay,
        FeatureKind::Conveyor,
        FeatureKind::Dock,
        FeatureKind::Path,
        FeatureKind::Anchor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FeatureKind::Halo => "halo",
            FeatureKind::Building => "building",
            FeatureKind::Bay => "bay",
            FeatureKind::Conveyor => "conveyor",
            FeatureKind::Dock => "dock",
            FeatureKind::Path => "path",
            FeatureKind::Anchor => "anchor",
        }
    }
}

/// Geometry in geographic degrees. Polygon rings are closed.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point { position: LonLat },
    Line { vertices: Vec<LonLat> },
    Polygon { ring: Vec<LonLat> },
    /// Polygon extruded from `base_m` to `base_m + height_m`.
    Volume {
        ring: Vec<LonLat>,
        base_m: f64,
        height_m: f64,
    },
}

/// A normalized renderable primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub kind: FeatureKind,
    pub geometry: Geometry,
    pub attributes: Map<String, Value>,
}

impl Feature {
    pub fn new(kind: FeatureKind, geometry: Geometry) -> Self {
        Self {
            kind,
            geometry,
            attributes: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// GeoJSON `Feature`; volume base/height go into the properties.
    pub fn to_geojson_value(&self) -> Value {
        let mut properties = self.attributes.clone();
        properties.insert("kind".to_string(), Value::from(self.kind.as_str()));

        let geometry = match &self.geometry {
            Geometry::Point { position } => geometry_value("Point", coords(*position)),
            Geometry::Line { vertices } => geometry_value("LineString", coord_list(vertices)),
            Geometry::Polygon { ring } => {
                geometry_value("Polygon", Value::Array(vec![coord_list(ring)]))
            }
            Geometry::Volume {
                ring,
                base_m,
                height_m,
            } => {
                properties.insert("base".to_string(), Value::from(*base_m));
                properties.insert("height".to_string(), Value::from(base_m + height_m));
                geometry_value("Polygon", Value::Array(vec![coord_list(ring)]))
            }
        };

        let mut obj = Map::new();
        obj.insert("type".to_string(), Value::from("Feature"));
        obj.insert("properties".to_string(), Value::Object(properties));
        obj.insert("geometry".to_string(), geometry);
        Value::Object(obj)
    }
}

/// GeoJSON `FeatureCollection` of `features`.
pub fn feature_collection<'a>(features: impl IntoIterator<Item = &'a Feature>) -> Value {
    let mut root = Map::new();
    root.insert("type".to_string(), Value::from("FeatureCollection"));
    root.insert(
        "features".to_string(),
        Value::Array(features.into_iter().map(Feature::to_geojson_value).collect()),
    );
    Value::Object(root)
}

fn geometry_value(ty: &str, coordinates: Value) -> Value {
    let mut obj = Map::new();
    obj.insert("type".to_string(), Value::from(ty));
    obj.insert("coordinates".to_string(), coordinates);
    Value::Object(obj)
}

fn coords(p: LonLat) -> Value {
    Value::Array(vec![Value::from(p.lon_deg), Value::from(p.lat_deg)])
}

fn coord_list(points: &[LonLat]) -> Value {
    Value::Array(points.iter().copied().map(coords).collect())
}
