use anyhow::{Context, Result};
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs `command` to completion, killing it once `timeout` elapses.
///
/// A non-zero exit status or a timeout is an error that includes stderr.
pub fn run_with_timeout(command: &mut Command, timeout: Duration) -> Result<CommandOutput> {
    let program = command.get_program().to_string_lossy().into_owned();
    let mut child = ChildGuard::new(
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to invoke {program}"))?,
    );

    // Drain pipes on helper threads so a chatty child cannot block on a full pipe.
    let mut stdout_pipe = child.inner.stdout.take().context("child stdout not captured")?;
    let mut stderr_pipe = child.inner.stderr.take().context("child stderr not captured")?;
    let stdout_reader = thread::spawn(move || {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).map(|_| buf)
    });
    let stderr_reader = thread::spawn(move || {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).map(|_| buf)
    });

    let started = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if started.elapsed() >= timeout {
            anyhow::bail!("{program} timed out after {:.1}s", timeout.as_secs_f64());
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stdout = join_pipe(stdout_reader).context("failed to read stdout")?;
    let stderr = join_pipe(stderr_reader).context("failed to read stderr")?;
    let stdout = String::from_utf8_lossy(&stdout).into_owned();
    let stderr = String::from_utf8_lossy(&stderr).into_owned();

    if !status.success() {
        anyhow::bail!("{program} failed with {status}: {}", stderr.trim());
    }

    Ok(CommandOutput { stdout, stderr })
}

/// Kills and reaps the child on drop unless it has already exited, so no
/// early return can leave the process running.
struct ChildGuard {
    inner: Child,
    exited: bool,
}

impl ChildGuard {
    fn new(inner: Child) -> Self {
        Self {
            inner,
            exited: false,
        }
    }

    fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
        let status = self.inner.try_wait()?;
        self.exited = status.is_some();
        Ok(status)
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if !self.exited {
            let _ = self.inner.kill();
            let _ = self.inner.wait();
        }
    }
}

fn join_pipe(handle: thread::JoinHandle<std::io::Result<Vec<u8>>>) -> Result<Vec<u8>> {
    match handle.join() {
        Ok(result) => Ok(result?),
        Err(_) => anyhow::bail!("pipe reader thread panicked"),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("printf 'hello\\n  world'");
        let output = run_with_timeout(&mut cmd, Duration::from_secs(10)).unwrap();
        assert_eq!(output.stdout, "hello\n  world");
    }

    #[test]
    fn non_zero_exit_includes_stderr() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo broken >&2; exit 3");
        let err = run_with_timeout(&mut cmd, Duration::from_secs(10)).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn kills_process_after_timeout() {
        let mut cmd = Command::new("sleep");
        cmd.arg("5");
        let started = Instant::now();
        let err = run_with_timeout(&mut cmd, Duration::from_millis(100)).unwrap_err();
        assert!(err.to_string().contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn dropping_guard_reaps_running_child() {
        let child = Command::new("sleep").arg("30").spawn().unwrap();
        let proc_entry = std::path::PathBuf::from(format!("/proc/{}", child.id()));
        assert!(proc_entry.exists());

        drop(ChildGuard::new(child));
        assert!(!proc_entry.exists());
    }

    #[test]
    fn missing_program_is_an_error() {
        let mut cmd = Command::new("definitely-not-an-ocr-binary");
        assert!(run_with_timeout(&mut cmd, Duration::from_secs(1)).is_err());
    }
}
