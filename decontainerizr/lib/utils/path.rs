//! `decontainerizr::utils::path` contains the path arithmetic used when resolving targets.

use std::{
    ffi::OsStr,
    fs,
    os::unix::ffi::OsStrExt,
    path::{Component, Path, PathBuf},
};

use typed_path::{UnixComponent, UnixPath};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The maximum number of dangling symlinks followed by [`weakly_canonical`].
pub const MAX_SYMLINK_HOPS: usize = 40;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Checks whether `target` lies under `base`.
///
/// The comparison walks both paths segment by segment, so `/fs/root2` is not under `/fs/root`
/// even though the strings share a prefix.
///
/// ## Examples
///
/// ```
/// use decontainerizr::utils::is_target_under;
/// use std::path::Path;
///
/// assert!(is_target_under(Path::new("/fs/root/bin/sh"), Path::new("/fs/root")));
/// assert!(!is_target_under(Path::new("/fs/root2"), Path::new("/fs/root")));
/// ```
pub fn is_target_under(target: &Path, base: &Path) -> bool {
    let mut target_components = target.components();
    for base_component in base.components() {
        match target_components.next() {
            Some(target_component) if target_component == base_component => continue,
            _ => return false,
        }
    }

    true
}

/// Lexically normalizes a path.
///
/// Rules:
/// - Removes `.` components and redundant separators
/// - Resolves `..` against the preceding component
/// - `..` at the root stays at the root, as the kernel does
/// - Leading `..` components of a relative path are kept
///
/// Symlinks are not consulted. Non UTF-8 paths are handled byte-wise.
pub fn normalize_path(path: &Path) -> PathBuf {
    let path = UnixPath::new(path.as_os_str().as_bytes());
    let mut is_absolute = false;
    let mut normalized: Vec<&[u8]> = Vec::new();

    for component in path.components() {
        match component {
            UnixComponent::RootDir => is_absolute = true,
            UnixComponent::CurDir => continue,
            UnixComponent::ParentDir => {
                let can_pop = normalized
                    .last()
                    .is_some_and(|last| *last != b"..".as_slice());

                if can_pop {
                    normalized.pop();
                } else if !is_absolute {
                    normalized.push(b"..");
                }
            }
            UnixComponent::Normal(name) => normalized.push(name),
        }
    }

    let mut bytes = Vec::new();
    if is_absolute {
        bytes.push(b'/');
    }
    bytes.extend(normalized.join(b"/".as_slice()));

    if bytes.is_empty() {
        bytes.push(b'.');
    }

    PathBuf::from(OsStr::from_bytes(&bytes))
}

/// Canonicalizes the longest existing prefix of `path` and lexically normalizes the rest.
///
/// Unlike [`fs::canonicalize`], the path does not have to exist. Symlinks in the existing part
/// are resolved, including a dangling symlink right after it, so the result is where the kernel
/// would end up looking if the missing part were created.
pub fn weakly_canonical(path: &Path) -> PathBuf {
    weakly_canonical_bounded(path, MAX_SYMLINK_HOPS)
}

fn weakly_canonical_bounded(path: &Path, hops: usize) -> PathBuf {
    for ancestor in path.ancestors() {
        if ancestor.as_os_str().is_empty() {
            break;
        }

        let Ok(canonical) = fs::canonicalize(ancestor) else {
            continue;
        };

        let Ok(rest) = path.strip_prefix(ancestor) else {
            return canonical;
        };

        let mut rest_components = rest.components();
        let Some(next) = rest_components.next() else {
            return canonical;
        };

        if hops > 0 {
            if let Ok(link) = fs::read_link(canonical.join(next)) {
                let followed = canonical.join(link).join(rest_components.as_path());
                return weakly_canonical_bounded(&followed, hops - 1);
            }
        }

        return normalize_path(&canonical.join(rest));
    }

    normalize_path(path)
}

/// Returns the part of `path` that follows the filesystem root.
///
/// `/usr/bin/env` yields `usr/bin/env`; relative paths are returned unchanged.
pub fn root_relative(path: &Path) -> &Path {
    path.strip_prefix(Component::RootDir).unwrap_or(path)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
