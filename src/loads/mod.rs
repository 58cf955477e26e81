//! Load cases, loads and load combinations

mod distributed;
mod load_case;
mod load_combo;
mod node_load;
mod point_load;
mod settlement;

pub use distributed::{DistributedLoad, ElementLoad};
pub use load_case::{LoadCase, LoadType};
pub use load_combo::LoadCombination;
pub use node_load::{Force, NodalLoad};
pub use point_load::{LoadDirection, PointLoad};
pub use settlement::{Displacement, Settlement};
