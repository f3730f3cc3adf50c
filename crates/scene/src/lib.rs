pub mod picking;
pub mod region;
pub mod selection;

pub use region::*;
pub use selection::*;
