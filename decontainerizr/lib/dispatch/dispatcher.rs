use std::{fs, path::Path};

use crate::{config::LaunchContext, DecontainerizrResult, DispatchError};

use super::{ExecMode, ExecPlan, Invocation, LaunchRequest};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Turns a launch request into an [`ExecPlan`].
///
/// - `shebang_exec <name> [args]` runs `[<name>, args?, operand, trailing...]`. The operand is the
///   script path the kernel appended when it ran a relocated script.
/// - `ld_exec <linker> <relative_path>` resolves the operand as the program being run and starts
///   `[<linker>, --argv0, <program>, --library-path, <library path>, <program dir>/<relative_path>,
///   trailing...]`, where the program directory is the canonical location of the program.
/// - `static_exec <name>` runs `[<name>, trailing...]`. The operand is consumed but not
///   forwarded, and an argument string in the request is ignored.
///
/// Nothing is executed here; see [`ExecPlan::exec`].
pub fn dispatch(
    request: &LaunchRequest,
    invocation: &Invocation,
    ctx: &LaunchContext,
) -> DecontainerizrResult<ExecPlan> {
    let mode = *request.get_mode();
    let plan = match mode {
        ExecMode::ShebangExec => {
            let script = invocation.require_operand(mode)?;
            let target = ctx.resolve(request.get_short_name())?;

            ExecPlan::new(target)
                .args(request.get_args().iter())
                .arg(script)
        }
        ExecMode::LdExec => {
            let program = invocation.require_operand(mode)?;
            let relative_path = request
                .get_args()
                .as_deref()
                .ok_or(DispatchError::MissingRequestArgument(mode))?;

            let linker = ctx.resolve(request.get_short_name())?;
            let program = ctx.resolve(program)?;
            let program_dir = fs::canonicalize(&program)?
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| "/".into());

            let plan = ExecPlan::new(linker)
                .arg("--argv0")
                .arg(program.as_os_str());

            let plan = match ctx.get_library_path() {
                Some(library_path) => plan.arg("--library-path").arg(library_path),
                None => {
                    tracing::warn!("no library path set, starting the dynamic linker without one");
                    plan
                }
            };

            plan.arg(program_dir.join(relative_path))
        }
        ExecMode::StaticExec => {
            if let Some(args) = request.get_args() {
                tracing::warn!("ignoring arguments '{}' of {}", args, mode);
            }

            ExecPlan::new(ctx.resolve(request.get_short_name())?)
        }
    };

    Ok(plan.args(invocation.get_trailing()))
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
