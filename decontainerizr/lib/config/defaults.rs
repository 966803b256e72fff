//--------------------------------------------------------------------------------------------------
// Constants: Environment
//--------------------------------------------------------------------------------------------------

/// The environment variable holding the relocated root.
///
/// Its presence tells a launcher that a parent already ran initialization.
pub const FS_ROOT_ENV_VAR: &str = "DECONTAINERIZR_FS_ROOT";

/// The environment variable that overrides the launcher root directory.
pub const ROOT_OVERRIDE_ENV_VAR: &str = "DECONTAINERIZR_ROOT_OVERRIDE";

/// The environment variable holding the library path handed to the dynamic linker in `ld_exec` mode.
pub const LD_LIBRARY_PATH_ENV_VAR: &str = "DECONTAINERIZR_LD_LIBRARY_PATH";

/// The environment variable holding the log filter directive.
pub const LOG_ENV_VAR: &str = "DECONTAINERIZR_LOG";

/// The search path environment variable.
pub const PATH_ENV_VAR: &str = "PATH";

/// The placeholder in `env_vars` values that expands to the relocated root.
pub const FS_ROOT_PLACEHOLDER: &str = "$DECONTAINERIZR_FS_ROOT";

/// The log filter used when [`LOG_ENV_VAR`] is not set.
pub const DEFAULT_LOG_FILTER: &str = "warn";

//--------------------------------------------------------------------------------------------------
// Constants: Layout
//--------------------------------------------------------------------------------------------------

/// The sub directory of the launcher root holding configuration files.
pub const CFG_SUBDIR: &str = "cfg";

/// The sub directory of the launcher root holding the relocated filesystem.
pub const FS_ROOT_SUBDIR: &str = "fs_root";

/// The sub directory of the launcher root holding the launcher and its shims.
pub const BIN_SUBDIR: &str = "bin";

/// The configuration file listing root-relative scripts to relocate, one per line.
pub const RELOCATABLE_SCRIPTS_FILENAME: &str = "relocatable_scripts";

/// The configuration file holding NUL-separated `NAME=value` records.
pub const ENV_VARS_FILENAME: &str = "env_vars";

/// The prefix of the shared lock object name.
pub const LOCK_NAME_PREFIX: &str = "/decontainerizr-";
