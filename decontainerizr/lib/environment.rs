//! The environment handed down to every relocated program.
//!
//! Assignments come from `cfg/env_vars` as NUL-separated `NAME=value` records. Values may refer
//! to the relocated root through `$DECONTAINERIZR_FS_ROOT`. `PATH` is not overwritten but rebuilt
//! so the launcher's shims come first, then the relocated copies of the configured directories,
//! then whatever the caller already had.

use std::{
    env, fs, io,
    path::Path,
};

use getset::Getters;

use crate::{
    config::{
        EnvPair, BIN_SUBDIR, ENV_VARS_FILENAME, FS_ROOT_ENV_VAR, FS_ROOT_PLACEHOLDER, PATH_ENV_VAR,
    },
    ConfigWarning, DecontainerizrError, DecontainerizrResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The ordered assignments to export before dispatching.
///
/// The last assignment is always the initialization marker, [`FS_ROOT_ENV_VAR`].
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub with_prefix")]
pub struct Environment {
    /// The assignments in the order they are applied.
    assignments: Vec<EnvPair>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Environment {
    /// Loads `<cfg_dir>/env_vars` and builds the environment for `fs_root`.
    ///
    /// A missing file yields an environment holding only the marker. Both roots end up in exported
    /// values, so they must be valid UTF-8.
    pub fn load(
        cfg_dir: &Path,
        fs_root: &Path,
        launcher_root: &Path,
        inherited_path: Option<&str>,
    ) -> DecontainerizrResult<Self> {
        let env_vars_path = cfg_dir.join(ENV_VARS_FILENAME);
        let records = match fs::read(&env_vars_path) {
            Ok(records) => records,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("no env vars at {}", env_vars_path.display());
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self::from_records(
            &records,
            utf8_path(fs_root)?,
            utf8_path(launcher_root)?,
            inherited_path,
        ))
    }

    /// Builds the environment from raw `env_vars` content.
    pub fn from_records(
        records: &[u8],
        fs_root: &str,
        launcher_root: &str,
        inherited_path: Option<&str>,
    ) -> Self {
        let (pairs, warnings) = parse_env_records(records);
        for warning in warnings {
            tracing::warn!("{}", warning);
        }

        let mut current_path = inherited_path.map(str::to_string);
        let mut assignments = Vec::with_capacity(pairs.len() + 1);
        for pair in pairs {
            let value = expand_placeholder(pair.get_value(), fs_root);
            let value = if pair.get_var() == PATH_ENV_VAR {
                let path = build_search_path(
                    &value,
                    fs_root,
                    launcher_root,
                    current_path.as_deref(),
                );
                current_path = Some(path.clone());
                path
            } else {
                value
            };

            assignments.push(pair.with_value(value));
        }

        assignments.push(EnvPair::new(FS_ROOT_ENV_VAR, fs_root));
        Self { assignments }
    }

    /// Writes every assignment to the process environment.
    ///
    /// Must run before any other thread exists; the launcher is single threaded.
    pub fn export(&self) {
        for pair in &self.assignments {
            tracing::debug!("export {}", pair);
            unsafe {
                env::set_var(pair.get_var(), pair.get_value());
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Splits NUL-separated `NAME=value` records.
///
/// Empty records are ignored. Records that are not UTF-8, lack `=` or lack a name are returned as
/// warnings.
pub fn parse_env_records(records: &[u8]) -> (Vec<EnvPair>, Vec<ConfigWarning>) {
    let mut pairs = Vec::new();
    let mut warnings = Vec::new();

    for record in records.split(|b| *b == 0) {
        if record.is_empty() {
            continue;
        }

        let Ok(record) = std::str::from_utf8(record) else {
            let record = String::from_utf8_lossy(record).into_owned();
            warnings.push(ConfigWarning::NonUtf8EnvRecord(record));
            continue;
        };

        match record.parse::<EnvPair>() {
            Ok(pair) => pairs.push(pair),
            Err(warning) => warnings.push(warning),
        }
    }

    (pairs, warnings)
}

/// Replaces every `$DECONTAINERIZR_FS_ROOT` in `value` with `fs_root`.
pub fn expand_placeholder(value: &str, fs_root: &str) -> String {
    value.replace(FS_ROOT_PLACEHOLDER, fs_root)
}

/// Builds the search path for a configured `PATH` value.
///
/// The result is `<launcher_root>/bin`, then `fs_root` followed by each configured entry, then
/// the inherited search path. Entries are appended to `fs_root` as strings, the same way the
/// configured value was written for the container's root.
///
/// ## Examples
///
/// ```
/// use decontainerizr::environment::build_search_path;
///
/// let path = build_search_path("/usr/bin:/bin", "/fsroot", "/launcher", Some("/orig"));
/// assert_eq!(path, "/launcher/bin:/fsroot/usr/bin:/fsroot/bin:/orig");
/// ```
pub fn build_search_path(
    configured: &str,
    fs_root: &str,
    launcher_root: &str,
    inherited: Option<&str>,
) -> String {
    let mut search_path = format!("{}/{}", launcher_root.trim_end_matches('/'), BIN_SUBDIR);

    for entry in configured.split(':').filter(|entry| !entry.is_empty()) {
        search_path.push(':');
        search_path.push_str(fs_root);
        search_path.push_str(entry);
    }

    if let Some(inherited) = inherited.filter(|inherited| !inherited.is_empty()) {
        search_path.push(':');
        search_path.push_str(inherited);
    }

    search_path
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn utf8_path(path: &Path) -> DecontainerizrResult<&str> {
    path.to_str()
        .ok_or_else(|| DecontainerizrError::NonUtf8Path(path.to_path_buf()))
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
