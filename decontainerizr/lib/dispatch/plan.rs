use std::{
    convert::Infallible,
    ffi::{CString, OsStr, OsString},
    os::unix::ffi::OsStrExt,
    path::PathBuf,
};

use getset::Getters;
use nix::unistd::execv;

use crate::{DecontainerizrError, DecontainerizrResult, DispatchError};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The final step of a launch: which binary replaces the launcher and with which arguments.
///
/// `argv[0]` is the resolved target itself.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub with_prefix")]
pub struct ExecPlan {
    /// The binary to execute.
    target: PathBuf,

    /// The complete argument vector.
    argv: Vec<OsString>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ExecPlan {
    /// Creates a plan whose argument vector starts with `target`.
    pub fn new(target: PathBuf) -> Self {
        let argv = vec![target.clone().into_os_string()];
        Self { target, argv }
    }

    /// Appends an argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.argv.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<OsString>,
    {
        self.argv.extend(args.into_iter().map(Into::into));
        self
    }

    /// Replaces the current process with the target.
    ///
    /// Only returns if the replacement fails.
    pub fn exec(self) -> DecontainerizrResult<Infallible> {
        let path = to_cstring(self.target.as_os_str())?;
        let argv = self
            .argv
            .iter()
            .map(|arg| to_cstring(arg))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("exec {} {:?}", self.target.display(), self.argv);

        execv(&path, &argv[..]).map_err(|source| DecontainerizrError::Exec {
            target: self.target,
            source,
        })
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn to_cstring(arg: &OsStr) -> Result<CString, DispatchError> {
    CString::new(arg.as_bytes())
        .map_err(|_| DispatchError::NulByte(arg.to_string_lossy().into_owned()))
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::os::unix::ffi::OsStringExt;

    use super::*;

    #[test]
    fn test_exec_plan_builder() {
        let plan = ExecPlan::new(PathBuf::from("/fsroot/bin/foo"))
            .arg("--flag")
            .args(["a", "b"]);

        assert_eq!(plan.get_target(), &PathBuf::from("/fsroot/bin/foo"));
        assert_eq!(
            plan.get_argv(),
            &["/fsroot/bin/foo", "--flag", "a", "b"]
                .map(OsString::from)
                .to_vec()
        );
    }

    #[test]
    fn test_exec_missing_target_fails() {
        let plan = ExecPlan::new(PathBuf::from("/decontainerizr/definitely/missing"));

        match plan.exec() {
            Err(DecontainerizrError::Exec { target, source }) => {
                assert_eq!(target, PathBuf::from("/decontainerizr/definitely/missing"));
                assert_eq!(source, nix::Error::ENOENT);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_exec_rejects_nul_bytes() {
        let plan =
            ExecPlan::new(PathBuf::from("/bin/true")).arg(OsString::from_vec(b"a\0b".to_vec()));

        assert!(matches!(
            plan.exec(),
            Err(DecontainerizrError::Dispatch(DispatchError::NulByte(_)))
        ));
    }
}
