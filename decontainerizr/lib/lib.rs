//! `decontainerizr` runs programs built for a container filesystem directly on the host, against a
//! relocated copy of that filesystem.
//!
//! # Overview
//!
//! Everything goes through a single launcher binary, `intp`. Scripts and shims inside the
//! relocated root carry an interpreter line pointing at the launcher, followed by a launch
//! request:
//!
//! ```text
//! #!/opt/app/bin/intp shebang_exec /usr/bin/python3 -u
//! ```
//!
//! When such a file runs, the launcher:
//!
//! - takes a host-wide lock and relocates every script listed in `cfg/relocatable_scripts`, the
//!   first time only
//! - exports the environment from `cfg/env_vars`, again the first time only
//! - resolves the requested program under the relocated root
//! - replaces itself with it
//!
//! # Layout
//!
//! ```text
//! <root>/
//! ├── bin/intp
//! ├── cfg/relocatable_scripts
//! ├── cfg/env_vars
//! └── fs_root/
//! ```
//!
//! # Modules
//!
//! - [`config`] - Well-known names, the launcher layout and the launch context
//! - [`dispatch`] - Launch request parsing and exec plans
//! - [`environment`] - The exported environment
//! - [`launcher`] - The top-level flow
//! - [`lock`] - The initialization lock
//! - [`relocate`] - Interpreter line rewriting
//! - [`resolve`] - Target resolution under the relocated root
//! - [`utils`] - Path helpers

#![warn(missing_docs)]

mod error;
mod log;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub mod config;
pub mod dispatch;
pub mod environment;
pub mod launcher;
pub mod lock;
pub mod relocate;
pub mod resolve;
pub mod utils;

pub use error::*;
pub use log::*;
