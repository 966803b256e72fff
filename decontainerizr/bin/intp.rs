use std::env;

use decontainerizr::{init_logging, launcher, DecontainerizrResult};

//--------------------------------------------------------------------------------------------------
// Function: main
//--------------------------------------------------------------------------------------------------

/// Entry point for the launcher.
///
/// # Arguments
///
/// ```text
/// intp <launch_request> [operand] [args...]
/// ```
///
/// Usually not called by hand: the kernel runs it for scripts whose interpreter line names it.
/// On success the process is replaced by the resolved target. On failure the error is printed to
/// stderr and the exit status is 1.
fn main() -> DecontainerizrResult<()> {
    init_logging();

    let never = launcher::run(env::args_os())?;
    match never {}
}
