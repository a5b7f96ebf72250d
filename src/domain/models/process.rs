use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
    pub code: i32,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        return self.code == 0;
    }
}

/// Runs an external program to completion, feeding it `stdin`.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(
        &self,
        stdin: &[u8],
        command: &str,
        args: &[String],
        cwd: &Path,
    ) -> Result<ProcessOutput>;
}

/// Runs a single command on some other machine and captures what it printed.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    async fn exec(&self, command: &str) -> Result<String>;
}
