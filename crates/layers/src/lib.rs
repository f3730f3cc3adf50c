pub mod choropleth;
pub mod extrusion;
pub mod layer;
pub mod lighting;
pub mod symbology;
pub mod tooltip;
pub mod transition;

pub use choropleth::*;
pub use extrusion::*;
pub use layer::*;
pub use lighting::Lighting;
pub use symbology::*;
pub use tooltip::*;
pub use transition::Transitions;
