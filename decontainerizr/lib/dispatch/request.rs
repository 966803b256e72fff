use std::{
    ffi::{OsStr, OsString},
    fmt,
    str::FromStr,
};

use getset::Getters;

use crate::DispatchError;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// How the resolved target is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// `shebang_exec <short_name> [args]`: run an interpreter for a script the kernel handed over.
    ShebangExec,

    /// `ld_exec <linker> <relative_path>`: run a program through an explicit dynamic linker.
    LdExec,

    /// `static_exec <short_name>`: run a program directly, without synthetic arguments.
    StaticExec,
}

/// The parsed launch request.
///
/// ## Examples
///
/// ```
/// use decontainerizr::dispatch::{ExecMode, LaunchRequest};
///
/// let request = LaunchRequest::parse("shebang_exec /usr/bin/python3 -u -X dev").unwrap();
///
/// assert_eq!(*request.get_mode(), ExecMode::ShebangExec);
/// assert_eq!(request.get_short_name(), "/usr/bin/python3");
/// assert_eq!(request.get_args().as_deref(), Some("-u -X dev"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub with_prefix")]
pub struct LaunchRequest {
    /// The launch mode.
    mode: ExecMode,

    /// The program to resolve.
    short_name: String,

    /// The rest of the request, passed on as a single argument.
    args: Option<String>,
}

/// The launcher's own arguments.
///
/// ```text
/// intp <launch_request> [operand] [trailing...]
/// ```
///
/// When the kernel runs a relocated script, the operand is the script path and the trailing
/// arguments are the ones the script was called with.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub with_prefix")]
pub struct Invocation {
    /// The name the launcher was invoked as.
    argv0: OsString,

    /// The raw launch request.
    request: OsString,

    /// The argument following the launch request.
    operand: Option<OsString>,

    /// Everything after the operand, passed through verbatim.
    trailing: Vec<OsString>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl LaunchRequest {
    /// Creates a launch request from its parts.
    pub fn new(mode: ExecMode, short_name: impl Into<String>, args: Option<String>) -> Self {
        Self {
            mode,
            short_name: short_name.into(),
            args,
        }
    }

    /// Parses a launch request.
    ///
    /// The keyword runs up to the first space. The short name runs from there to the next space
    /// and the trimmed remainder, if any, becomes the argument string. An empty short name is
    /// accepted here and rejected by resolution.
    pub fn parse(request: &str) -> Result<Self, DispatchError> {
        let unknown = || DispatchError::UnknownExecType(request.to_string());

        let (keyword, rest) = request.split_once(' ').ok_or_else(unknown)?;
        let mode = keyword.parse::<ExecMode>().map_err(|_| unknown())?;

        let (short_name, args) = rest.split_once(' ').unwrap_or((rest, ""));
        let args = args.trim();

        Ok(Self::new(
            mode,
            short_name.trim(),
            (!args.is_empty()).then(|| args.to_string()),
        ))
    }
}

impl Invocation {
    /// Creates an invocation from its parts.
    pub fn new(
        argv0: impl Into<OsString>,
        request: impl Into<OsString>,
        operand: Option<OsString>,
        trailing: Vec<OsString>,
    ) -> Self {
        Self {
            argv0: argv0.into(),
            request: request.into(),
            operand,
            trailing,
        }
    }

    /// Splits the process arguments, including the invocation name.
    pub fn from_args(args: impl IntoIterator<Item = OsString>) -> Result<Self, DispatchError> {
        let mut args = args.into_iter();
        let argv0 = args.next().unwrap_or_default();
        let request = args.next().ok_or(DispatchError::MissingLaunchRequest)?;
        let operand = args.next();

        Ok(Self::new(argv0, request, operand, args.collect()))
    }

    /// Parses the launch request.
    ///
    /// A request that is not valid UTF-8 is rejected rather than guessed at.
    pub fn launch_request(&self) -> Result<LaunchRequest, DispatchError> {
        let request = self.request.to_str().ok_or_else(|| {
            DispatchError::NonUtf8LaunchRequest(self.request.to_string_lossy().into_owned())
        })?;

        LaunchRequest::parse(request)
    }

    /// The operand, required by `mode`.
    pub fn require_operand(&self, mode: ExecMode) -> Result<&OsStr, DispatchError> {
        self.operand
            .as_deref()
            .ok_or(DispatchError::MissingOperand(mode))
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl FromStr for ExecMode {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shebang_exec" => Ok(Self::ShebangExec),
            "ld_exec" => Ok(Self::LdExec),
            "static_exec" => Ok(Self::StaticExec),
            _ => Err(DispatchError::UnknownExecType(s.to_string())),
        }
    }
}

impl fmt::Display for ExecMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            Self::ShebangExec => "shebang_exec",
            Self::LdExec => "ld_exec",
            Self::StaticExec => "static_exec",
        };

        write!(f, "{}", keyword)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
