//! The launcher's top-level flow.
//!
//! ```text
//! parse request ─► discover layout ─► [lock ─► relocate scripts ─► export env] ─► resolve ─► exec
//! ```
//!
//! The bracketed steps only run in the first launcher of a process tree. They are skipped once
//! the initialization marker is in the environment.

use std::{convert::Infallible, env, ffi::OsString};

use crate::{
    config::{self, LaunchContext, LauncherLayout, PATH_ENV_VAR},
    dispatch::{self, Invocation},
    environment::Environment,
    lock::ExecutionLock,
    relocate::relocate_scripts,
    DecontainerizrResult,
};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Runs the launcher with the given process arguments, including the invocation name.
///
/// Only returns on failure; on success the process has been replaced by the target.
pub fn run(args: impl IntoIterator<Item = OsString>) -> DecontainerizrResult<Infallible> {
    let invocation = Invocation::from_args(args)?;
    let request = invocation.launch_request()?;
    tracing::debug!("launch request {:?}", request);

    let layout = LauncherLayout::from_env(invocation.get_argv0())?;
    let initialized = config::is_initialized();

    // Held until exec closes it.
    let _lock = initialize(&layout)?;

    let ctx = LaunchContext::from_env(&layout, initialized);
    let plan = dispatch::dispatch(&request, &invocation, &ctx)?;

    plan.exec()
}

/// Prepares the relocated environment unless an ancestor launcher already did.
///
/// Takes the execution lock, points the relocatable scripts at the launcher and exports the
/// configured environment. Returns the lock, which the caller must keep until it execs.
pub fn initialize(layout: &LauncherLayout) -> DecontainerizrResult<Option<ExecutionLock>> {
    if config::is_initialized() {
        tracing::debug!("environment already initialized");
        return Ok(None);
    }

    let lock = ExecutionLock::acquire(layout.get_self_exe())?;

    let summary = relocate_scripts(
        layout.get_cfg_dir(),
        layout.get_fs_root(),
        layout.get_self_exe(),
    )?;
    tracing::debug!(
        "relocated {} script(s), {} already relocated, {} skipped",
        summary.get_rewritten().len(),
        summary.get_already_relocated().len(),
        summary.get_warnings().len()
    );

    let inherited_path = match env::var(PATH_ENV_VAR) {
        Ok(path) => Some(path).filter(|path| !path.is_empty()),
        Err(env::VarError::NotPresent) => None,
        Err(env::VarError::NotUnicode(path)) => {
            tracing::warn!(
                "ignoring inherited {} {}, not valid UTF-8",
                PATH_ENV_VAR,
                path.to_string_lossy()
            );
            None
        }
    };
    let environment = Environment::load(
        layout.get_cfg_dir(),
        layout.get_fs_root(),
        layout.get_root(),
        inherited_path.as_deref(),
    )?;
    environment.export();

    Ok(Some(lock))
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
