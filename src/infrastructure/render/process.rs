use std::path::Path;
use std::process::Stdio;

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::domain::models::ProcessOutput;
use crate::domain::models::ProcessRunner;

#[derive(Default)]
pub struct TokioProcessRunner {}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    #[allow(clippy::implicit_return)]
    async fn run(
        &self,
        stdin: &[u8],
        command: &str,
        args: &[String],
        cwd: &Path,
    ) -> Result<ProcessOutput> {
        tracing::debug!(command, ?args, cwd = %cwd.display(), "Running process");

        let mut child = Command::new(command)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut pipe = child.stdin.take();
        let write_stdin = async move {
            if let Some(pipe) = pipe.as_mut() {
                pipe.write_all(stdin).await?;
                pipe.shutdown().await?;
            }
            return Ok::<(), std::io::Error>(());
        };

        // Write stdin while the output is drained.
        let (written, output) = tokio::join!(write_stdin, child.wait_with_output());
        let output = output?;
        if let Err(err) = written {
            // Programs like `ssh` may exit before reading stdin.
            if err.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(err.into());
            }
        }

        let res = ProcessOutput {
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            code: output.status.code().unwrap_or(-1),
        };
        tracing::debug!(command, code = res.code, "Process exited");

        return Ok(res);
    }
}
