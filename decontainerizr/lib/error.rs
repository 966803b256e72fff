use std::{
    error::Error,
    fmt::{self, Display},
    path::PathBuf,
};

use thiserror::Error;

use crate::dispatch::ExecMode;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result of a decontainerizr-related operation.
pub type DecontainerizrResult<T> = Result<T, DecontainerizrError>;

/// An error that ends the current launcher invocation.
#[derive(pretty_error_debug::Debug, Error)]
pub enum DecontainerizrError {
    /// An I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A short name could not be resolved to a target.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// The launch request could not be dispatched.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// A path that has to be written into the environment is not valid UTF-8.
    #[error("path {} is not valid UTF-8", .0.display())]
    NonUtf8Path(PathBuf),

    /// The execution lock could not be created or acquired.
    #[error("unable to acquire execution lock {name}: {source}")]
    Lock {
        /// The name of the shared lock object.
        name: String,

        /// The underlying OS error.
        source: nix::Error,
    },

    /// The final process replacement failed.
    #[error("failed to start target {}, error: {}", .target.display(), .source)]
    Exec {
        /// The target that could not be started.
        target: PathBuf,

        /// The underlying OS error.
        source: nix::Error,
    },

    /// An error that can represent any error.
    #[error(transparent)]
    Custom(#[from] AnyError),
}

/// An error that occurred while resolving a short name.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolutionError {
    /// The short name was empty.
    #[error("unable to resolve empty target")]
    EmptyTarget,

    /// No executable was found for the short name.
    #[error("unable to resolve {0}")]
    Unresolved(String),
}

/// An error that occurred while interpreting the launch request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The launcher was started without a launch request.
    #[error("missing launch request")]
    MissingLaunchRequest,

    /// The launch request is not valid UTF-8.
    #[error("launch request is not valid UTF-8: {0}")]
    NonUtf8LaunchRequest(String),

    /// The launch request names a mode that does not exist.
    #[error("unknown exec_type {0}")]
    UnknownExecType(String),

    /// The mode needs the positional argument following the launch request.
    #[error("{0} requires a target operand after the launch request")]
    MissingOperand(ExecMode),

    /// The launch request lacks the argument string the mode needs.
    #[error("{0} requires an argument after the target in the launch request")]
    MissingRequestArgument(ExecMode),

    /// An argument cannot be passed to exec because it contains a NUL byte.
    #[error("argument contains a nul byte: {0}")]
    NulByte(String),
}

/// A problem with a configuration record.
///
/// These never end the invocation; they are logged and the record is skipped.
#[derive(Debug, Error)]
pub enum ConfigWarning {
    /// An `env_vars` record without `=` or without a name.
    #[error("unable to process env var {0}")]
    MalformedEnvRecord(String),

    /// An `env_vars` record that is not valid UTF-8.
    #[error("unable to process env var {0}, not valid UTF-8")]
    NonUtf8EnvRecord(String),

    /// A relocatable script given as an absolute path.
    #[error("unable to relocate {0}, must be relative")]
    AbsoluteRelocation(String),

    /// A relocatable script that does not exist under the relocated root.
    #[error("unable to relocate {0}, is absent")]
    MissingRelocation(String),

    /// A relocatable script that leaves the relocated root through a symlink.
    #[error("unable to relocate {0}, resolves outside the relocated root")]
    OutsideRelocation(String),

    /// A relocatable script that could not be rewritten.
    #[error("unable to relocate {0}: {1}")]
    RelocationFailed(String, std::io::Error),
}

/// An error that can represent any error.
#[derive(Debug)]
pub struct AnyError {
    error: anyhow::Error,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl DecontainerizrError {
    /// Creates a new `Err` result.
    pub fn custom(error: impl Into<anyhow::Error>) -> DecontainerizrError {
        DecontainerizrError::Custom(AnyError {
            error: error.into(),
        })
    }
}

impl AnyError {
    /// Downcasts the error to a `T`.
    pub fn downcast<T>(&self) -> Option<&T>
    where
        T: Display + fmt::Debug + Send + Sync + 'static,
    {
        self.error.downcast_ref::<T>()
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl PartialEq for AnyError {
    fn eq(&self, other: &Self) -> bool {
        self.error.to_string() == other.error.to_string()
    }
}

impl Display for AnyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl Error for AnyError {}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
