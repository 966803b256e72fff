//! Target resolution.
//!
//! A short name handed to the launcher is either a path (`/usr/bin/python3`, `./run.sh`,
//! `../bin/tool`) or a bare command (`python3`). Paths are forced under the relocated root by
//! re-rooting them until they land there; bare commands are looked up in the search path, which
//! the environment builder already points into the relocated root.

use std::{
    ffi::OsStr,
    os::unix::ffi::OsStrExt,
    path::{Path, PathBuf},
};

use nix::unistd::{access, AccessFlags};

use crate::{
    utils::{is_target_under, normalize_path, root_relative, weakly_canonical},
    ResolutionError,
};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The maximum number of times a path is moved under the relocated root before giving up.
///
/// A plain path needs one step. Every absolute symlink inside the relocated root that points
/// back out of it costs one more.
pub const MAX_REROOT_DEPTH: usize = 8;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Resolves a short name into an absolute path under `fs_root`.
///
/// - Names starting with `/`, `./` or `../` are treated as paths. Relative ones are made absolute
///   against the current directory. A path whose canonical form already lies under `fs_root` is
///   returned as is, otherwise it is re-rooted under `fs_root` and checked again.
/// - Any other name is searched in the `:`-separated `search_path`; the first executable file
///   wins.
///
/// ## Examples
///
/// ```no_run
/// use decontainerizr::resolve::resolve_target;
/// use std::path::Path;
///
/// let fs_root = Path::new("/opt/app/fs_root");
///
/// // Lands under the relocated root
/// let target = resolve_target("/usr/bin/python3", fs_root, "")?;
/// assert_eq!(target, fs_root.join("usr/bin/python3"));
///
/// // Found through the search path
/// let target = resolve_target("python3", fs_root, "/opt/app/fs_root/usr/bin:/usr/bin")?;
/// # Ok::<(), decontainerizr::ResolutionError>(())
/// ```
pub fn resolve_target(
    short_name: impl AsRef<OsStr>,
    fs_root: impl AsRef<Path>,
    search_path: impl AsRef<OsStr>,
) -> Result<PathBuf, ResolutionError> {
    let short_name = short_name.as_ref();
    if short_name.is_empty() {
        return Err(ResolutionError::EmptyTarget);
    }

    if is_path_form(short_name) {
        resolve_path(Path::new(short_name), fs_root.as_ref())
    } else {
        search_command(short_name, search_path.as_ref())
    }
}

/// Checks whether a short name names a path rather than a command to search for.
pub fn is_path_form(short_name: &OsStr) -> bool {
    let bytes = short_name.as_bytes();
    bytes.starts_with(b"/") || bytes.starts_with(b"./") || bytes.starts_with(b"../")
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn resolve_path(short_name: &Path, fs_root: &Path) -> Result<PathBuf, ResolutionError> {
    let unresolved = || ResolutionError::Unresolved(short_name.to_string_lossy().into_owned());

    let canonical_root = weakly_canonical(fs_root);
    let mut candidate = std::path::absolute(short_name).map_err(|_| unresolved())?;

    for depth in 0..=MAX_REROOT_DEPTH {
        let canonical = weakly_canonical(&candidate);
        if is_target_under(&canonical, &canonical_root) {
            tracing::debug!(
                "resolved {} to {} after {} re-rooting step(s)",
                short_name.display(),
                candidate.display(),
                depth
            );
            return Ok(candidate);
        }

        // Outside the root: move the path itself under it. Already under the root but escaping
        // through a symlink: follow the symlink's destination under the root instead.
        let lexical = normalize_path(&candidate);
        let tail = if is_target_under(&lexical, fs_root) {
            canonical
        } else {
            lexical
        };

        candidate = fs_root.join(root_relative(&tail));
    }

    tracing::debug!(
        "giving up on {} after {} re-rooting steps",
        short_name.display(),
        MAX_REROOT_DEPTH
    );

    Err(unresolved())
}

fn search_command(short_name: &OsStr, search_path: &OsStr) -> Result<PathBuf, ResolutionError> {
    for entry in search_path.as_bytes().split(|b| *b == b':') {
        if entry.is_empty() {
            continue;
        }

        let candidate = Path::new(OsStr::from_bytes(entry)).join(short_name);
        if candidate.is_file() && access(candidate.as_path(), AccessFlags::X_OK).is_ok() {
            tracing::debug!(
                "found {} at {}",
                short_name.to_string_lossy(),
                candidate.display()
            );
            return Ok(candidate);
        }
    }

    Err(ResolutionError::Unresolved(
        short_name.to_string_lossy().into_owned(),
    ))
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
