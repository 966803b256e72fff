use serial_test::serial;

use super::helper::{self, Sandbox};

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[test]
#[serial]
fn integration_test_shebang_exec_runs_interpreter_with_script() {
    let sandbox = Sandbox::new();
    let script = sandbox.write_executable("bin/hello.sh", "echo \"hello $1 $2\"\n");

    let output = sandbox
        .intp(&["shebang_exec /bin/sh", script.to_str().unwrap(), "a", "b c"])
        .output()
        .expect("Failed to execute intp");

    assert!(output.status.success(), "stderr: {}", helper::stderr(&output));
    assert_eq!(helper::stdout(&output), "hello a b c\n");
}

#[test]
#[serial]
fn integration_test_shebang_exec_passes_request_arguments() {
    let sandbox = Sandbox::new();
    let script = sandbox.write_executable("bin/hello.sh", "echo unreachable\n");

    // Runs `sh -c <operand> <trailing>`, so the trailing argument becomes `$0`
    let output = sandbox
        .intp(&["shebang_exec /bin/sh -c", "echo \"from $0\"", script.to_str().unwrap()])
        .output()
        .expect("Failed to execute intp");

    assert!(output.status.success(), "stderr: {}", helper::stderr(&output));
    assert_eq!(
        helper::stdout(&output),
        format!("from {}\n", script.display())
    );
}

#[test]
#[serial]
fn integration_test_static_exec_drops_operand() {
    let sandbox = Sandbox::new();

    let output = sandbox
        .intp(&["static_exec /bin/sh", "/orig/sh", "-c", "echo static"])
        .output()
        .expect("Failed to execute intp");

    assert!(output.status.success(), "stderr: {}", helper::stderr(&output));
    assert_eq!(helper::stdout(&output), "static\n");
}

#[test]
#[serial]
fn integration_test_ld_exec_invokes_linker() {
    let sandbox = Sandbox::new();
    sandbox.write_executable("lib/ld.so", "#!/bin/sh\nprintf '%s\\n' \"$@\"\n");
    sandbox.write_executable("bin/tool", "");
    sandbox.set_env_vars(&["DECONTAINERIZR_LD_LIBRARY_PATH=$DECONTAINERIZR_FS_ROOT/lib"]);

    let output = sandbox
        .intp(&["ld_exec /lib/ld.so ../libexec/tool.real", "/bin/tool", "x"])
        .output()
        .expect("Failed to execute intp");

    assert!(output.status.success(), "stderr: {}", helper::stderr(&output));

    let fs_root = sandbox.fs_root.display();
    assert_eq!(
        helper::stdout(&output),
        format!(
            "--argv0\n{fs_root}/bin/tool\n--library-path\n{fs_root}/lib\n{fs_root}/bin/../libexec/tool.real\nx\n"
        )
    );
}

#[test]
#[serial]
fn integration_test_unknown_exec_type_fails_before_setup() {
    let sandbox = Sandbox::new();
    let original = "#!/old/intp shebang_exec /bin/sh\necho hi\n";
    sandbox.write_executable("bin/hello.sh", original);
    sandbox.set_relocatable_scripts(&["bin/hello.sh"]);

    let output = sandbox
        .intp(&["bogus_exec /bin/sh", "/orig/hello.sh"])
        .output()
        .expect("Failed to execute intp");

    assert_eq!(output.status.code(), Some(1));
    assert!(
        helper::stderr(&output).contains("unknown exec_type bogus_exec /bin/sh"),
        "stderr: {}",
        helper::stderr(&output)
    );
    assert_eq!(sandbox.read("bin/hello.sh"), original);
}

#[test]
#[serial]
fn integration_test_unresolvable_target_fails() {
    let sandbox = Sandbox::new();

    let output = sandbox
        .intp(&["static_exec missing-command"])
        .env("PATH", "/nonexistent")
        .output()
        .expect("Failed to execute intp");

    assert_eq!(output.status.code(), Some(1));
    assert!(
        helper::stderr(&output).contains("unable to resolve missing-command"),
        "stderr: {}",
        helper::stderr(&output)
    );
}

#[test]
#[serial]
fn integration_test_missing_launch_request_fails() {
    let sandbox = Sandbox::new();

    let output = sandbox
        .intp(&[])
        .output()
        .expect("Failed to execute intp");

    assert_eq!(output.status.code(), Some(1));
}
