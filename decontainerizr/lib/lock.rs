//! The execution lock serializing one-time initialization across launcher processes.

use std::{
    os::fd::{AsRawFd, OwnedFd},
    path::Path,
};

use nix::{
    fcntl::{fcntl, FcntlArg, OFlag},
    sys::{mman::shm_open, stat::Mode},
};
use sha2::{Digest, Sha256};

use crate::{config::LOCK_NAME_PREFIX, DecontainerizrError, DecontainerizrResult};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// An exclusive lock on a shared memory object named after the launcher binary.
///
/// Every launcher started from the same binary contends for the same object. The lock is never
/// released explicitly: the descriptor is close-on-exec, so the kernel drops the lock when the
/// holder replaces itself with its target or exits.
#[derive(Debug)]
pub struct ExecutionLock {
    name: String,
    _fd: OwnedFd,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ExecutionLock {
    /// Blocks until the lock for the launcher at `self_exe` is held by this process.
    pub fn acquire(self_exe: &Path) -> DecontainerizrResult<Self> {
        let name = lock_name(self_exe);
        let lock_error = |source| DecontainerizrError::Lock {
            name: name.clone(),
            source,
        };

        let fd = shm_open(
            name.as_str(),
            OFlag::O_RDWR | OFlag::O_CREAT,
            Mode::from_bits_truncate(0o660),
        )
        .map_err(lock_error)?;

        // SAFETY: `flock` is a plain C struct; all-zero is a valid value (start 0, length 0 means
        // the whole object).
        let mut whole_object: libc::flock = unsafe { std::mem::zeroed() };
        whole_object.l_type = libc::F_WRLCK as libc::c_short;
        whole_object.l_whence = libc::SEEK_SET as libc::c_short;

        tracing::debug!("waiting for execution lock {}", name);
        fcntl(fd.as_raw_fd(), FcntlArg::F_SETLKW(&whole_object)).map_err(lock_error)?;
        tracing::debug!("holding execution lock {}", name);

        Ok(Self { name, _fd: fd })
    }

    /// The name of the shared memory object backing the lock.
    pub fn name(&self) -> &str {
        &self.name
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Derives the shared lock object name for a launcher binary.
///
/// The name only depends on the path, so it is the same for every build of the launcher.
pub fn lock_name(self_exe: &Path) -> String {
    let digest = Sha256::digest(self_exe.as_os_str().as_encoded_bytes());
    format!("{}{}", LOCK_NAME_PREFIX, hex::encode(&digest[..8]))
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
