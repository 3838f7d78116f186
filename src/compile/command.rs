use std::{
    ffi::OsString,
    io,
    path::PathBuf,
    process::{ExitStatus, Stdio},
};

use crossterm::style::Stylize;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    process::Command,
};

use super::{CompileError, Compiler};
use crate::settings::CompilerSettings;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// One compiler invocation: `node <script> <flags...>`.
///
/// `node` is spawned directly instead of through a shell, so the compiler
/// script does not need to be executable or resolvable by the platform.
#[derive(Debug, Clone)]
pub struct CompileCommand {
    compiler: Compiler,
    flags: Vec<OsString>,
    node_binary: OsString,
    package_root: PathBuf,
}

impl CompileCommand {
    pub fn new<I, S>(compiler: Compiler, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            compiler,
            flags: flags.into_iter().map(Into::into).collect(),
            node_binary: OsString::from("node"),
            package_root: PathBuf::from("."),
        }
    }

    pub fn from_settings<I, S>(compiler: Compiler, flags: I, settings: &CompilerSettings) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self::new(compiler, flags)
            .node_binary(&settings.node_binary)
            .package_root(&settings.package_root)
    }

    pub fn node_binary(mut self, node_binary: impl Into<OsString>) -> Self {
        self.node_binary = node_binary.into();
        self
    }

    /// Directory holding `node_modules`. Defaults to the working directory.
    pub fn package_root(mut self, package_root: impl Into<PathBuf>) -> Self {
        self.package_root = package_root.into();
        self
    }

    pub fn compiler(&self) -> Compiler {
        self.compiler
    }

    /// Runs the compiler, mirroring its output to this process' stdout/stderr.
    pub async fn run(&self) -> Result<(), CompileError> {
        let mut stdout = tokio::io::stdout();
        let mut stderr = tokio::io::stderr();
        self.run_with(&mut stdout, &mut stderr).await
    }

    /// Runs the compiler, writing its stdout to `stdout` and its stderr, in
    /// red, to `stderr`.
    pub async fn run_with<O, E>(&self, stdout: &mut O, stderr: &mut E) -> Result<(), CompileError>
    where
        O: AsyncWrite + Unpin,
        E: AsyncWrite + Unpin,
    {
        let script = self.compiler.script_path(&self.package_root);
        log_info!(
            "running {} ({}) with {} flag(s)",
            self.compiler,
            script.display(),
            self.flags.len()
        );

        let mut child = Command::new(&self.node_binary)
            .arg(&script)
            .args(&self.flags)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CompileError::Spawn {
                compiler: self.compiler,
                source,
            })?;

        let child_stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
        let child_stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;

        let (out, err, status) = tokio::join!(
            forward_raw(child_stdout, stdout),
            forward_highlighted(child_stderr, stderr),
            child.wait()
        );
        out.map_err(CompileError::Output)?;
        err.map_err(CompileError::Output)?;
        let status = status.map_err(CompileError::Output)?;

        self.check_status(status)
    }

    fn check_status(&self, status: ExitStatus) -> Result<(), CompileError> {
        if status.success() {
            log_debug!("{} finished successfully", self.compiler);
            Ok(())
        } else {
            log_warn!("{} exited with {status}", self.compiler);
            Err(CompileError::Failed {
                compiler: self.compiler,
                code: status.code(),
            })
        }
    }
}

/// Compiles with `compiler` from the current directory's `node_modules`.
pub async fn ts_compile<I, S>(compiler: Compiler, flags: I) -> Result<(), CompileError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    CompileCommand::new(compiler, flags).run().await
}

/// Copies the child's bytes untouched.
async fn forward_raw<R, W>(mut source: R, sink: &mut W) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    tokio::io::copy(&mut source, sink).await?;
    sink.flush().await
}

/// Copies the child's bytes in red. Invalid UTF-8 is rendered lossily; a
/// character split across reads is held back until it is complete.
async fn forward_highlighted<R, W>(mut source: R, sink: &mut W) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; 8192];
    let mut pending: Vec<u8> = Vec::new();
    loop {
        let n = source.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        pending.extend_from_slice(&buf[..n]);
        let ready = pending.len() - incomplete_utf8_tail(&pending);
        write_red(sink, &pending[..ready]).await?;
        pending.drain(..ready);
    }
    write_red(sink, &pending).await?;
    sink.flush().await
}

async fn write_red<W>(sink: &mut W, bytes: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    if bytes.is_empty() {
        return Ok(());
    }
    let rendered = format!("{}", String::from_utf8_lossy(bytes).red());
    sink.write_all(rendered.as_bytes()).await
}

/// Length of a truncated multi-byte sequence at the end of `bytes`.
fn incomplete_utf8_tail(bytes: &[u8]) -> usize {
    for len in 1..=bytes.len().min(3) {
        match std::str::from_utf8(&bytes[bytes.len() - len..]) {
            Ok(_) => return 0,
            Err(err) if err.valid_up_to() == 0 && err.error_len().is_none() => return len,
            Err(_) => {}
        }
    }
    0
}

fn missing_pipe(stream: &str) -> CompileError {
    CompileError::Output(io::Error::new(
        io::ErrorKind::BrokenPipe,
        format!("child {stream} was not captured"),
    ))
}
