#![cfg(unix)]

use std::{fs, path::Path};

use viewport_ruler::{CompileCommand, CompileError, Compiler, CompilerSettings};

/// Installs a shell script where the compiler script would live and returns
/// a command that runs it with `sh` standing in for `node`.
fn fake_compiler(root: &Path, compiler: Compiler, body: &str) -> CompileCommand {
    let script = compiler.script_path(root);
    fs::create_dir_all(script.parent().unwrap()).unwrap();
    fs::write(&script, body).unwrap();

    CompileCommand::new(compiler, ["-p", "tsconfig.json"])
        .node_binary("sh")
        .package_root(root)
}

#[tokio::test]
async fn resolves_when_the_compiler_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let command = fake_compiler(
        dir.path(),
        Compiler::Tsc,
        "echo \"compiling $1 $2\"\necho 'deprecated option' >&2\nexit 0\n",
    );

    let mut stdout: Vec<u8> = Vec::new();
    let mut stderr: Vec<u8> = Vec::new();
    command.run_with(&mut stdout, &mut stderr).await.unwrap();

    assert_eq!(String::from_utf8(stdout).unwrap(), "compiling -p tsconfig.json\n");
    let stderr = String::from_utf8(stderr).unwrap();
    assert!(stderr.contains("deprecated option"));
}

#[tokio::test]
async fn rejects_with_the_binary_name_on_failure() {
    let dir = tempfile::tempdir().unwrap();
    let command = fake_compiler(
        dir.path(),
        Compiler::Ngc,
        "echo 'error TS2304: Cannot find name' >&2\nexit 2\n",
    );

    let mut stdout: Vec<u8> = Vec::new();
    let mut stderr: Vec<u8> = Vec::new();
    let err = command.run_with(&mut stdout, &mut stderr).await.unwrap_err();

    assert_eq!(err.to_string(), "ngc compilation failure");
    assert!(matches!(
        err,
        CompileError::Failed {
            compiler: Compiler::Ngc,
            code: Some(2)
        }
    ));
    assert!(stdout.is_empty());
    assert!(String::from_utf8(stderr).unwrap().contains("TS2304"));
}

#[tokio::test]
async fn reports_a_missing_launcher() {
    let dir = tempfile::tempdir().unwrap();
    let command = CompileCommand::new(Compiler::Tsc, Vec::<String>::new())
        .node_binary(dir.path().join("no-such-node"))
        .package_root(dir.path());

    let err = command
        .run_with(&mut Vec::<u8>::new(), &mut Vec::<u8>::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CompileError::Spawn { compiler: Compiler::Tsc, .. }));
}

#[tokio::test]
async fn settings_choose_launcher_and_package_root() {
    let dir = tempfile::tempdir().unwrap();
    fake_compiler(dir.path(), Compiler::Tsc, "echo ok\n");

    let settings = CompilerSettings {
        node_binary: "sh".into(),
        package_root: dir.path().to_path_buf(),
    };
    let command = CompileCommand::from_settings(Compiler::Tsc, ["--noEmit"], &settings);

    let mut stdout: Vec<u8> = Vec::new();
    command.run_with(&mut stdout, &mut Vec::<u8>::new()).await.unwrap();
    assert_eq!(stdout, b"ok\n");
    assert_eq!(command.compiler(), Compiler::Tsc);
}

#[tokio::test]
async fn forwards_output_bytes_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let command = fake_compiler(
        dir.path(),
        Compiler::Tsc,
        "printf 'caf\\351.ts(1,1): error\\n' >&2\nprintf 'caf\\351\\n'\nprintf 'no newline'\nexit 0\n",
    );

    let mut stdout: Vec<u8> = Vec::new();
    let mut stderr: Vec<u8> = Vec::new();
    command.run_with(&mut stdout, &mut stderr).await.unwrap();

    assert_eq!(stdout, b"caf\xe9\nno newline");
    let stderr = String::from_utf8(stderr).unwrap();
    assert!(stderr.contains("caf\u{fffd}.ts"));
}
