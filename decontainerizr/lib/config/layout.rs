use std::{
    env,
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
};

use anyhow::anyhow;
use getset::Getters;

use crate::{resolve::resolve_target, DecontainerizrError, DecontainerizrResult};

use super::{CFG_SUBDIR, FS_ROOT_SUBDIR, PATH_ENV_VAR, ROOT_OVERRIDE_ENV_VAR};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Where the launcher lives and where it finds its configuration and relocated root.
///
/// ```text
/// <root>/
/// ├── bin/intp        the launcher and its shims
/// ├── cfg/            relocatable_scripts, env_vars
/// └── fs_root/        the relocated filesystem
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub with_prefix")]
pub struct LauncherLayout {
    /// The resolved launcher binary.
    self_exe: PathBuf,

    /// The launcher root directory.
    root: PathBuf,

    /// The configuration directory.
    cfg_dir: PathBuf,

    /// The relocated root.
    fs_root: PathBuf,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl LauncherLayout {
    /// Creates a layout for a launcher binary at `self_exe` rooted at `root`.
    pub fn new(self_exe: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            self_exe: self_exe.into(),
            cfg_dir: root.join(CFG_SUBDIR),
            fs_root: root.join(FS_ROOT_SUBDIR),
            root,
        }
    }

    /// Discovers the layout from the launcher's invocation name and the process environment.
    ///
    /// The invocation name is resolved like any other short name against `/` and `PATH`, then
    /// canonicalized, so every spelling of the same binary yields the same launcher. The root is
    /// `DECONTAINERIZR_ROOT_OVERRIDE` when set, otherwise the directory above the launcher's `bin`
    /// directory.
    pub fn from_env(argv0: &OsStr) -> DecontainerizrResult<Self> {
        let search_path = env::var_os(PATH_ENV_VAR).unwrap_or_default();
        let root_override = env::var_os(ROOT_OVERRIDE_ENV_VAR)
            .filter(|root| !root.is_empty())
            .map(PathBuf::from);

        Self::discover(argv0, &search_path, root_override)
    }

    /// Discovers the layout from explicit inputs.
    pub fn discover(
        argv0: &OsStr,
        search_path: &OsStr,
        root_override: Option<PathBuf>,
    ) -> DecontainerizrResult<Self> {
        let self_exe = match resolve_target(argv0, "/", search_path) {
            Ok(self_exe) => self_exe,
            Err(e) => {
                tracing::debug!("{}, using the current executable instead", e);
                env::current_exe()?
            }
        };

        let self_exe = match fs::canonicalize(&self_exe) {
            Ok(canonical) => canonical,
            Err(e) => {
                tracing::debug!("unable to canonicalize {}: {}", self_exe.display(), e);
                self_exe
            }
        };

        let root = match root_override {
            Some(root) => root,
            None => self_exe
                .parent()
                .and_then(Path::parent)
                .map(Path::to_path_buf)
                .ok_or_else(|| {
                    DecontainerizrError::custom(anyhow!(
                        "launcher {} is not inside a <root>/bin directory",
                        self_exe.display()
                    ))
                })?,
        };

        tracing::debug!(
            "launcher {} with root {}",
            self_exe.display(),
            root.display()
        );

        Ok(Self::new(self_exe, root))
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
