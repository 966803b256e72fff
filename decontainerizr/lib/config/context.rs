use std::{
    env,
    ffi::{OsStr, OsString},
    path::PathBuf,
};

use getset::Getters;

use crate::{resolve::resolve_target, ResolutionError};

use super::{LauncherLayout, FS_ROOT_ENV_VAR, LD_LIBRARY_PATH_ENV_VAR, PATH_ENV_VAR};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Everything the dispatcher needs to know about the environment it runs in.
///
/// Built once, after initialization, and passed explicitly from there on. Only the
/// initialization marker travels to descendant processes, through the real environment.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub with_prefix")]
pub struct LaunchContext {
    /// The relocated root every resolved target must live under.
    fs_root: PathBuf,

    /// The `:`-separated search path for bare command names.
    search_path: OsString,

    /// The library path handed to the dynamic linker in `ld_exec` mode.
    library_path: Option<OsString>,

    /// Whether initialization had already run in an ancestor process.
    #[getset(skip)]
    initialized: bool,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl LaunchContext {
    /// Creates a context from explicit values.
    pub fn new(
        fs_root: impl Into<PathBuf>,
        search_path: impl Into<OsString>,
        library_path: Option<OsString>,
        initialized: bool,
    ) -> Self {
        Self {
            fs_root: fs_root.into(),
            search_path: search_path.into(),
            library_path,
            initialized,
        }
    }

    /// Builds the context from the process environment.
    ///
    /// The relocated root comes from the initialization marker when an ancestor set it, and from
    /// the layout otherwise.
    pub fn from_env(layout: &LauncherLayout, initialized: bool) -> Self {
        let fs_root = env::var_os(FS_ROOT_ENV_VAR)
            .filter(|fs_root| !fs_root.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| layout.get_fs_root().clone());

        Self::new(
            fs_root,
            env::var_os(PATH_ENV_VAR).unwrap_or_default(),
            env::var_os(LD_LIBRARY_PATH_ENV_VAR),
            initialized,
        )
    }

    /// Whether initialization had already run in an ancestor process.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Resolves a short name against this context's relocated root and search path.
    pub fn resolve(&self, short_name: impl AsRef<OsStr>) -> Result<PathBuf, ResolutionError> {
        resolve_target(short_name, &self.fs_root, &self.search_path)
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Checks whether an ancestor process already initialized the environment.
pub fn is_initialized() -> bool {
    env::var_os(FS_ROOT_ENV_VAR).is_some_and(|fs_root| !fs_root.is_empty())
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
