#[cfg(test)]
#[path = "ssh_test.rs"]
mod tests;

use std::env;
use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ProcessRunner;
use crate::domain::models::RemoteExecutor;
use crate::infrastructure::render::TokioProcessRunner;

/// Exit code `ssh` uses for its own failures, as opposed to the remote
/// command's.
const SSH_FAILURE_CODE: i32 = 255;

/// Runs commands on a remote host through the system `ssh` client. Auth is
/// left to the user's ssh config and agent.
pub struct Ssh {
    host: String,
    runner: Arc<dyn ProcessRunner>,
}

impl Default for Ssh {
    fn default() -> Ssh {
        return Ssh::new(
            &Config::get(ConfigKey::RemoteHost),
            Arc::new(TokioProcessRunner::default()),
        );
    }
}

impl Ssh {
    pub fn new(host: &str, runner: Arc<dyn ProcessRunner>) -> Ssh {
        return Ssh {
            host: host.to_string(),
            runner,
        };
    }
}

#[async_trait]
impl RemoteExecutor for Ssh {
    #[allow(clippy::implicit_return)]
    async fn exec(&self, command: &str) -> Result<String> {
        if self.host.is_empty() {
            bail!("No remote host configured. Set remote-host in your config or pass --remote-host");
        }

        let args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            self.host.to_string(),
            command.to_string(),
        ];
        let output = self.runner.run(b"", "ssh", &args, &env::temp_dir()).await?;

        if output.code == SSH_FAILURE_CODE {
            tracing::error!(host = %self.host, stderr = %output.stderr, "ssh failed");
            bail!(format!(
                "ssh to {} failed: {}",
                self.host,
                output.stderr.trim()
            ));
        }

        let mut text = String::from_utf8_lossy(&output.stdout).to_string();
        if !output.stderr.trim().is_empty() {
            text = format!("{text}{}", output.stderr);
        }
        if !output.success() {
            text = format!("{text}(exit code {})", output.code);
        }

        return Ok(text);
    }
}
