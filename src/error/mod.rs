//===========================
// region:      --- modules

mod box_error;
mod caught;
mod config_error;
mod tagged;
mod utils;

// endregion:   --- modules

//===========================
// region:      --- flattened

pub use box_error::*;
pub use caught::*;
pub use config_error::*;
pub use tagged::*;
pub use utils::*;

// endregion:   --- flattened
