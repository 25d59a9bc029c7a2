//! Script process management

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::task::JoinHandle;

use super::resolver::LaunchSpec;
use carpark_core::prelude::*;

/// Exit information for a process that finished with status zero
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessExit {
    pub code: Option<i32>,
    /// Whatever the process wrote to stderr, lines joined with `\n`
    pub stderr: String,
}

/// A running external program whose stdout is consumed line by line.
///
/// Stdout is exposed through [`next_line`](Self::next_line) so the caller
/// decides when the next line is read. Stderr is drained by a background task
/// into a buffer that [`finish`](Self::finish) returns (or attaches to the
/// [`Error::ProcessFailed`] error).
///
/// The child is spawned with `kill_on_drop(true)`: dropping a `ScriptProcess`
/// before `finish` terminates the program.
pub struct ScriptProcess {
    child: Child,
    stdout: BufReader<ChildStdout>,
    stderr_task: JoinHandle<String>,
    pid: Option<u32>,
}

impl ScriptProcess {
    /// Launch the program described by `spec`
    pub fn spawn(spec: &LaunchSpec) -> Result<Self> {
        let program = locate_program(&spec.program)?;

        info!("Spawning: {}", spec.display());

        let mut command = Command::new(&program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &spec.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| {
            Error::process_spawn(format!("{}: {}", program.display(), e))
        })?;

        let pid = child.id();
        info!("Process started with PID: {:?}", pid);

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::process_spawn("stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::process_spawn("stderr was not captured"))?;

        let stderr_task = tokio::spawn(Self::stderr_collector(stderr, pid));

        Ok(Self {
            child,
            stdout: BufReader::new(stdout),
            stderr_task,
            pid,
        })
    }

    /// Read the next stdout line, without its line terminator.
    ///
    /// Bytes that are not valid UTF-8 are replaced with U+FFFD. Returns
    /// `Ok(None)` once the process closed stdout.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        match read_lossy_line(&mut self.stdout).await? {
            Some(line) => {
                trace!(pid = ?self.pid, "stdout: {}", line);
                Ok(Some(line))
            }
            None => {
                debug!(pid = ?self.pid, "stdout closed");
                Ok(None)
            }
        }
    }

    /// Wait for the process to exit.
    ///
    /// Any stdout not yet read is discarded first so the child cannot stall on
    /// a full pipe. A non-zero exit becomes [`Error::ProcessFailed`] carrying
    /// the captured stderr.
    pub async fn finish(mut self) -> Result<ProcessExit> {
        while let Some(line) = read_lossy_line(&mut self.stdout).await? {
            trace!(pid = ?self.pid, "discarding unread stdout: {}", line);
        }

        let status = self.child.wait().await?;
        let stderr = match self.stderr_task.await {
            Ok(text) => text,
            Err(e) => {
                warn!(pid = ?self.pid, "stderr collector failed: {}", e);
                String::new()
            }
        };

        let code = status.code();
        info!(pid = ?self.pid, ?code, "Process exited with status: {:?}", status);

        if status.success() {
            Ok(ProcessExit { code, stderr })
        } else {
            warn!(pid = ?self.pid, ?code, "Process failed, stderr: {}", stderr);
            Err(Error::process_failed(code, stderr))
        }
    }

    /// Get the process ID
    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    /// Read stderr to completion, logging each line.
    ///
    /// The pipe stays open until EOF even after a read error, so the child
    /// never sees a closed stderr.
    async fn stderr_collector(stderr: ChildStderr, pid: Option<u32>) -> String {
        let mut reader = BufReader::new(stderr);
        let mut captured = Vec::new();

        loop {
            match read_lossy_line(&mut reader).await {
                Ok(Some(line)) => {
                    debug!(?pid, "stderr: {}", line);
                    captured.push(line);
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(?pid, "stderr read failed, discarding the rest: {}", e);
                    if let Err(e) = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await {
                        warn!(?pid, "stderr drain failed: {}", e);
                    }
                    break;
                }
            }
        }

        captured.join("\n")
    }
}

/// Read one `\n`-terminated line, dropping the terminator (and a trailing
/// `\r`) and decoding invalid UTF-8 lossily.
async fn read_lossy_line<R>(reader: &mut R) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf).await? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Find the executable for `program`.
///
/// Bare names are looked up on `PATH`; anything with a path separator is used
/// as given.
fn locate_program(program: &str) -> Result<PathBuf> {
    if Path::new(program).components().count() > 1 {
        return Ok(PathBuf::from(program));
    }

    which::which(program).map_err(|e| Error::process_spawn(format!("{}: {}", program, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::shell_spec;

    async fn collect_lines(process: &mut ScriptProcess) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = process.next_line().await.unwrap() {
            lines.push(line);
        }
        lines
    }

    #[tokio::test]
    async fn test_lines_are_yielded_in_order() {
        let mut process = ScriptProcess::spawn(&shell_spec("echo 10; echo 20; echo 30")).unwrap();

        let lines = collect_lines(&mut process).await;
        assert_eq!(lines, vec!["10", "20", "30"]);

        let exit = process.finish().await.unwrap();
        assert_eq!(exit.code, Some(0));
    }

    #[tokio::test]
    async fn test_nonzero_exit_reports_stderr() {
        let mut process =
            ScriptProcess::spawn(&shell_spec("echo 1; echo 'disk full' >&2; exit 2")).unwrap();

        let lines = collect_lines(&mut process).await;
        assert_eq!(lines, vec!["1"]);

        let err = process.finish().await.unwrap_err();
        match err {
            Error::ProcessFailed { code, stderr } => {
                assert_eq!(code, Some(2));
                assert_eq!(stderr, "disk full");
            }
            other => panic!("expected ProcessFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stderr_kept_on_success() {
        let mut process = ScriptProcess::spawn(&shell_spec("echo warn >&2; echo ok")).unwrap();
        let lines = collect_lines(&mut process).await;
        assert_eq!(lines, vec!["ok"]);

        let exit = process.finish().await.unwrap();
        assert_eq!(exit.stderr, "warn");
    }

    #[tokio::test]
    async fn test_carriage_returns_are_stripped() {
        let mut process = ScriptProcess::spawn(&shell_spec("printf 'a\\r\\nb\\r\\n'")).unwrap();
        let lines = collect_lines(&mut process).await;
        assert_eq!(lines, vec!["a", "b"]);
        process.finish().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_utf8_stdout_keeps_streaming() {
        let mut process =
            ScriptProcess::spawn(&shell_spec("echo 10; printf 'caf\\351\\n'; echo 30")).unwrap();

        let lines = collect_lines(&mut process).await;
        assert_eq!(lines, vec!["10", "caf\u{FFFD}", "30"]);

        let exit = process.finish().await.unwrap();
        assert_eq!(exit.code, Some(0));
    }

    #[tokio::test]
    async fn test_invalid_utf8_stderr_keeps_diagnostics() {
        let mut process = ScriptProcess::spawn(&shell_spec(
            "printf 'caf\\351\\n' >&2; echo 'disk full' >&2; exit 2",
        ))
        .unwrap();
        assert!(collect_lines(&mut process).await.is_empty());

        match process.finish().await.unwrap_err() {
            Error::ProcessFailed { code, stderr } => {
                assert_eq!(code, Some(2));
                assert_eq!(stderr, "caf\u{FFFD}\ndisk full");
            }
            other => panic!("expected ProcessFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_final_line_without_newline() {
        let mut process = ScriptProcess::spawn(&shell_spec("printf 'a\\nb'")).unwrap();
        assert_eq!(collect_lines(&mut process).await, vec!["a", "b"]);
        process.finish().await.unwrap();
    }

    #[tokio::test]
    async fn test_finish_discards_unread_output() {
        let process = ScriptProcess::spawn(&shell_spec("seq 1 20000")).unwrap();
        let exit = process.finish().await.unwrap();
        assert_eq!(exit.code, Some(0));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let spec = LaunchSpec::new("carpark-definitely-not-a-real-program", vec![]);
        let result = ScriptProcess::spawn(&spec);
        assert!(matches!(result, Err(Error::ProcessSpawn { .. })));
    }

    #[tokio::test]
    async fn test_working_dir_is_applied() {
        let temp = tempfile::tempdir().unwrap();
        let spec = shell_spec("pwd").with_working_dir(temp.path());

        let mut process = ScriptProcess::spawn(&spec).unwrap();
        let lines = collect_lines(&mut process).await;
        process.finish().await.unwrap();

        let reported = std::fs::canonicalize(&lines[0]).unwrap();
        let expected = std::fs::canonicalize(temp.path()).unwrap();
        assert_eq!(reported, expected);
    }

    #[test]
    fn test_locate_program_keeps_explicit_paths() {
        let path = locate_program("./scripts/part1.sh").unwrap();
        assert_eq!(path, PathBuf::from("./scripts/part1.sh"));
    }
}
