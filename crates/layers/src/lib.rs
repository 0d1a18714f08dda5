pub mod host;
pub mod layer;
pub mod objects;
pub mod recording;
pub mod symbology;
pub mod vector;

pub use host::*;
pub use layer::*;
pub use objects::VehicleLayer;
pub use recording::RecordingMap;
pub use symbology::*;
pub use vector::VectorLayerSet;
