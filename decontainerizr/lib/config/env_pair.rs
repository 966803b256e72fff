use std::{fmt, str::FromStr};

use getset::Getters;

use crate::ConfigWarning;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// An environment assignment read from the `env_vars` configuration file.
///
/// ## Examples
///
/// ```
/// use decontainerizr::config::EnvPair;
///
/// let env_pair: EnvPair = "LANG=C.UTF-8".parse().unwrap();
///
/// assert_eq!(env_pair.get_var(), "LANG");
/// assert_eq!(env_pair.get_value(), "C.UTF-8");
/// assert_eq!(env_pair.to_string(), "LANG=C.UTF-8");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub with_prefix")]
pub struct EnvPair {
    /// The environment variable name.
    var: String,

    /// The value of the environment variable.
    value: String,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl EnvPair {
    /// Creates a new `EnvPair` with the given variable name and value.
    pub fn new(var: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            var: var.into(),
            value: value.into(),
        }
    }

    /// Returns a copy of this pair with its value replaced.
    pub fn with_value(&self, value: impl Into<String>) -> Self {
        Self::new(self.var.clone(), value)
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl FromStr for EnvPair {
    type Err = ConfigWarning;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (var, value) = s
            .split_once('=')
            .ok_or_else(|| ConfigWarning::MalformedEnvRecord(s.to_string()))?;

        if var.is_empty() {
            return Err(ConfigWarning::MalformedEnvRecord(s.to_string()));
        }

        Ok(Self::new(var, value))
    }
}

impl fmt::Display for EnvPair {
    /// Formats the pair as `<var>=<value>`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.var, self.value)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
