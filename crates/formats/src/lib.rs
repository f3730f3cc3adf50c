pub mod boundaries;
pub mod geojson;
pub mod load;
pub mod map_config;
pub mod region_join;
pub mod table;
pub mod topojson;

pub use boundaries::*;
pub use geojson::*;
pub use load::*;
pub use map_config::*;
pub use region_join::*;
pub use table::*;
