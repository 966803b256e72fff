use std::process::{Child, Stdio};

use serial_test::serial;

use super::helper::{self, Sandbox};

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[test]
#[serial]
fn integration_test_relocated_script_runs_through_launcher() {
    let sandbox = Sandbox::new();
    let script = sandbox.write_executable(
        "bin/hello.sh",
        "#!/old/intp shebang_exec /bin/sh\necho \"hello $1\"\necho \"root $DECONTAINERIZR_FS_ROOT\"\n",
    );
    sandbox.set_relocatable_scripts(&["bin/hello.sh", "/abs/ignored.sh", "bin/missing.sh"]);

    // The first launch relocates the script
    let output = sandbox
        .intp(&["static_exec /bin/sh", "/orig/sh", "-c", "true"])
        .output()
        .expect("Failed to execute intp");
    assert!(output.status.success(), "stderr: {}", helper::stderr(&output));

    assert_eq!(
        sandbox.read("bin/hello.sh"),
        format!(
            "#!{} shebang_exec /bin/sh\necho \"hello $1\"\necho \"root $DECONTAINERIZR_FS_ROOT\"\n",
            helper::intp_path().display()
        )
    );

    // Skipped records are reported, not fatal
    let stderr = helper::stderr(&output);
    assert!(stderr.contains("unable to relocate /abs/ignored.sh, must be relative"), "{stderr}");
    assert!(stderr.contains("unable to relocate bin/missing.sh, is absent"), "{stderr}");

    // Running the script now goes through the launcher
    let output = sandbox
        .command(&script)
        .arg("world")
        .output()
        .expect("Failed to execute script");

    assert!(output.status.success(), "stderr: {}", helper::stderr(&output));
    assert_eq!(
        helper::stdout(&output),
        format!("hello world\nroot {}\n", sandbox.fs_root.display())
    );
}

#[test]
#[serial]
fn integration_test_environment_is_exported() {
    let sandbox = Sandbox::new();
    sandbox.set_env_vars(&[
        "PATH=/usr/bin:/bin",
        "GREETING=hi from $DECONTAINERIZR_FS_ROOT",
        "BROKEN",
    ]);

    let output = sandbox
        .intp(&[
            "static_exec /bin/sh",
            "/orig/sh",
            "-c",
            "echo \"$PATH\"; echo \"$GREETING\"; echo \"$DECONTAINERIZR_FS_ROOT\"",
        ])
        .env("PATH", "/orig/bin")
        .output()
        .expect("Failed to execute intp");

    assert!(output.status.success(), "stderr: {}", helper::stderr(&output));

    let root = sandbox.root.display();
    let fs_root = sandbox.fs_root.display();
    assert_eq!(
        helper::stdout(&output),
        format!(
            "{root}/bin:{fs_root}/usr/bin:{fs_root}/bin:/orig/bin\nhi from {fs_root}\n{fs_root}\n"
        )
    );
    assert!(helper::stderr(&output).contains("unable to process env var BROKEN"));
}

#[test]
#[serial]
fn integration_test_initialized_environment_is_left_alone() {
    let sandbox = Sandbox::new();
    let original = "#!/old/intp shebang_exec /bin/sh\necho hi\n";
    sandbox.write_executable("bin/hello.sh", original);
    sandbox.set_relocatable_scripts(&["bin/hello.sh"]);
    sandbox.set_env_vars(&["GREETING=set"]);

    let output = sandbox
        .intp(&["static_exec /bin/sh", "/orig/sh", "-c", "echo \"[$GREETING]\""])
        .env("DECONTAINERIZR_FS_ROOT", &sandbox.fs_root)
        .output()
        .expect("Failed to execute intp");

    assert!(output.status.success(), "stderr: {}", helper::stderr(&output));
    assert_eq!(helper::stdout(&output), "[]\n");
    assert_eq!(sandbox.read("bin/hello.sh"), original);
}

#[test]
#[serial]
fn integration_test_concurrent_launches_relocate_once() {
    let sandbox = Sandbox::new();
    let scripts = ["bin/a.sh", "bin/b.sh", "bin/c.sh"];
    for script in scripts {
        sandbox.write_executable(script, "#!/old/intp shebang_exec /bin/sh -e\necho hi\n");
    }
    sandbox.set_relocatable_scripts(&scripts);

    // Half of the launchers reach the same binary through a different spelling
    let detour = helper::intp_bin_detour();
    let children: Vec<Child> = (0..8)
        .map(|idx| {
            let mut command = if idx % 2 == 0 {
                sandbox.command(helper::intp_bin())
            } else {
                sandbox.command(&detour)
            };

            command
                .args(["static_exec /bin/sh", "/orig/sh", "-c", "sleep 0.1"])
                .env("DECONTAINERIZR_LOG", "debug")
                .stderr(Stdio::piped())
                .spawn()
                .expect("Failed to spawn intp")
        })
        .collect();

    let mut logs = String::new();
    for child in children {
        let output = child.wait_with_output().expect("Failed to wait for intp");
        assert!(output.status.success(), "stderr: {}", helper::stderr(&output));
        logs.push_str(&helper::stderr(&output));
    }

    let expected = format!(
        "#!{} shebang_exec /bin/sh -e\necho hi\n",
        helper::intp_path().display()
    );
    for script in scripts {
        let rewrite = format!(
            "rewrote interpreter line of {}",
            sandbox.fs_root.join(script).display()
        );
        let rewrites = logs.lines().filter(|line| line.ends_with(&rewrite)).count();

        assert_eq!(rewrites, 1, "{script} rewritten {rewrites} times:\n{logs}");
        assert_eq!(sandbox.read(script), expected);
    }
}
