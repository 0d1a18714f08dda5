pub mod geodesy;
pub mod local;
pub mod mat4;
pub mod projection;
pub mod vec;

pub use geodesy::*;
pub use local::*;
pub use mat4::*;
pub use projection::*;
pub use vec::*;
