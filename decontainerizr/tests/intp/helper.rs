use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use tempfile::TempDir;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A launcher root in a temporary directory.
///
/// ```text
/// <root>/bin/
/// <root>/cfg/relocatable_scripts
/// <root>/cfg/env_vars
/// <root>/fs_root/bin/sh
/// ```
pub struct Sandbox {
    _temp_dir: TempDir,
    pub root: PathBuf,
    pub fs_root: PathBuf,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Sandbox {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = fs::canonicalize(temp_dir.path()).expect("Failed to canonicalize temp directory");
        let fs_root = root.join("fs_root");

        fs::create_dir_all(root.join("bin")).unwrap();
        fs::create_dir_all(root.join("cfg")).unwrap();
        fs::create_dir_all(fs_root.join("bin")).unwrap();
        fs::copy("/bin/sh", fs_root.join("bin/sh")).expect("Failed to copy /bin/sh");

        Self {
            _temp_dir: temp_dir,
            root,
            fs_root,
        }
    }

    /// Writes an executable file under the relocated root.
    pub fn write_executable(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.fs_root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    pub fn set_relocatable_scripts(&self, scripts: &[&str]) {
        let mut content = scripts.join("\n");
        content.push('\n');
        fs::write(self.root.join("cfg/relocatable_scripts"), content).unwrap();
    }

    pub fn set_env_vars(&self, records: &[&str]) {
        let mut content = Vec::new();
        for record in records {
            content.extend_from_slice(record.as_bytes());
            content.push(0);
        }
        fs::write(self.root.join("cfg/env_vars"), content).unwrap();
    }

    /// A command running `program` as a fresh process tree would, from outside any launcher.
    pub fn command(&self, program: impl AsRef<Path>) -> Command {
        let mut command = Command::new(program.as_ref());
        command
            .env("DECONTAINERIZR_ROOT_OVERRIDE", &self.root)
            .env("DECONTAINERIZR_LOG", "warn")
            .env_remove("DECONTAINERIZR_FS_ROOT")
            .env_remove("DECONTAINERIZR_LD_LIBRARY_PATH");
        command
    }

    /// A command running the launcher with the given arguments.
    pub fn intp(&self, args: &[&str]) -> Command {
        let mut command = self.command(intp_bin());
        command.args(args);
        command
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.fs_root.join(relative)).unwrap()
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// The launcher binary built for these tests.
pub fn intp_bin() -> &'static str {
    env!("CARGO_BIN_EXE_intp")
}

/// The launcher's canonical path, which is what relocated scripts point at.
pub fn intp_path() -> PathBuf {
    fs::canonicalize(intp_bin()).expect("Failed to canonicalize intp")
}

/// The launcher binary, spelled through a `..` detour.
pub fn intp_bin_detour() -> PathBuf {
    let intp = intp_path();
    let bin_dir = intp.parent().unwrap();

    bin_dir
        .join("..")
        .join(bin_dir.file_name().unwrap())
        .join(intp.file_name().unwrap())
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
