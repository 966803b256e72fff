//! Launcher configuration: well-known names, the on-disk layout and the launch context.

mod context;
mod defaults;
mod env_pair;
mod layout;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use context::*;
pub use defaults::*;
pub use env_pair::*;
pub use layout::*;
