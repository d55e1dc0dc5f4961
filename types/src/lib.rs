pub mod dim;
pub mod direction;
pub mod tile;

pub use dim::*;
pub use direction::*;
pub use tile::*;
