//! Integration tests for activation command construction.

use std::path::PathBuf;

use venvman::exec::command::{
    CreateOptions, OsFamily, ToolInvocation, build_activation_command, build_create_command,
    env_python,
};

#[test]
/// What: The POSIX activation prologue/epilogue exactly bracket the invocation.
///
/// Inputs:
/// - Install of `example-pkg` into `envA` under `/tmp/envs`.
///
/// Output:
/// - The expected wrapper command, byte for byte.
fn activation_posix_install_scenario() {
    let cmd = build_activation_command(
        OsFamily::Posix,
        &PathBuf::from("/tmp/envs"),
        "envA",
        &ToolInvocation::pip_install("example-pkg"),
    );
    assert_eq!(
        cmd,
        "source /tmp/envs/envA/bin/activate; pip install --no-cache-dir --upgrade example-pkg; deactivate;"
    );
}

#[test]
/// What: Bracketing holds for every fixed pip sub-command on both families.
///
/// Inputs:
/// - list, freeze, uninstall, dependency-tree invocations.
///
/// Output:
/// - Each rendered invocation appears exactly once, directly between the
///   activation prologue and the deactivation epilogue.
fn activation_brackets_every_subcommand() {
    let base = PathBuf::from("/tmp/envs");
    let invocations = [
        ToolInvocation::pip_list(),
        ToolInvocation::pip_freeze(),
        ToolInvocation::pip_uninstall("example-pkg"),
        ToolInvocation::dependency_tree(),
    ];
    for inv in &invocations {
        let posix = build_activation_command(OsFamily::Posix, &base, "envA", inv);
        let inner = inv.rendered(OsFamily::Posix);
        assert_eq!(
            posix,
            format!("source /tmp/envs/envA/bin/activate; {inner}; deactivate;")
        );

        let win = build_activation_command(OsFamily::Windows, &PathBuf::from("C:/envs"), "envA", inv);
        let inner_win = inv.rendered(OsFamily::Windows);
        assert_eq!(
            win,
            format!(
                "C:\\envs\\envA\\Scripts\\activate.bat && {inner_win} && C:\\envs\\envA\\Scripts\\deactivate.bat"
            )
        );
    }
}

#[test]
/// What: Upgrading pip routes through the environment interpreter.
///
/// Inputs:
/// - The self-upgrade invocation on both OS families.
///
/// Output:
/// - The inner command invokes `python -m pip`, never the pip executable,
///   with the family's interpreter layout.
fn activation_self_upgrade_uses_interpreter() {
    let inv = ToolInvocation::pip_self_upgrade();
    let posix = build_activation_command(OsFamily::Posix, &PathBuf::from("/tmp/envs"), "envA", &inv);
    assert!(posix.contains("/tmp/envs/envA/bin/python -m pip install --no-cache-dir --upgrade pip"));
    assert!(!posix.contains("; pip install"));

    let win = build_activation_command(OsFamily::Windows, &PathBuf::from("C:/envs"), "envA", &inv);
    assert!(win.contains("C:\\envs\\envA\\Scripts\\python.exe -m pip install --no-cache-dir --upgrade pip"));
}

#[test]
/// What: Environment creation commands carry the requested flags only.
///
/// Inputs:
/// - Every `CreateOptions` combination.
///
/// Output:
/// - Flags appear if and only if requested, in a fixed order.
fn creation_command_flag_combinations() {
    let python = PathBuf::from("/usr/bin/python3.12");
    let dir = PathBuf::from("/tmp/envs/envA");
    let plain = build_create_command(OsFamily::Posix, &python, &dir, CreateOptions::default());
    assert_eq!(plain, "/usr/bin/python3.12 -m venv /tmp/envs/envA");

    let without_pip = build_create_command(
        OsFamily::Posix,
        &python,
        &dir,
        CreateOptions {
            without_pip: true,
            system_site_packages: false,
        },
    );
    assert_eq!(
        without_pip,
        "/usr/bin/python3.12 -m venv /tmp/envs/envA --without-pip"
    );

    let site = build_create_command(
        OsFamily::Posix,
        &python,
        &dir,
        CreateOptions {
            without_pip: false,
            system_site_packages: true,
        },
    );
    assert_eq!(
        site,
        "/usr/bin/python3.12 -m venv /tmp/envs/envA --system-site-packages"
    );
}

#[test]
/// What: Interpreter layout inside environments differs per family.
///
/// Inputs:
/// - The same base/name rendered for POSIX and Windows.
///
/// Output:
/// - `bin/python` vs `Scripts\python.exe`, with normalized separators.
fn env_python_per_family_layout() {
    assert_eq!(
        env_python(&PathBuf::from("/tmp/envs"), "envA", OsFamily::Posix),
        "/tmp/envs/envA/bin/python"
    );
    assert_eq!(
        env_python(&PathBuf::from("C:/envs"), "envA", OsFamily::Windows),
        "C:\\envs\\envA\\Scripts\\python.exe"
    );
}
