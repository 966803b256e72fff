//! Launch request dispatch.
//!
//! The launcher's first argument is a launch request such as `shebang_exec /usr/bin/python3 -u`.
//! The dispatcher turns it, together with the remaining arguments, into an [`ExecPlan`]: the
//! resolved target and the exact argument vector to replace the process with.

mod dispatcher;
mod plan;
mod request;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use dispatcher::*;
pub use plan::*;
pub use request::*;
