pub mod animator;
pub mod builder;
pub mod error;
pub mod feature;
pub mod palette;
pub mod path;
pub mod solid;

pub use animator::*;
pub use builder::*;
pub use error::SceneError;
pub use feature::*;
pub use path::*;
pub use solid::*;
