pub mod bridge;
pub mod mesh;
pub mod recording;
pub mod renderer;

pub use bridge::*;
pub use mesh::{MeshDesc, MeshGeometry};
pub use recording::{RecordingFactory, RecordingRenderer, RendererLog};
pub use renderer::*;
