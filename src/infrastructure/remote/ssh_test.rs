use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use super::Ssh;
use crate::domain::models::ProcessOutput;
use crate::domain::models::ProcessRunner;
use crate::domain::models::RemoteExecutor;

struct FakeRunner {
    output: ProcessOutput,
    args: Mutex<Vec<String>>,
}

impl FakeRunner {
    fn new(stdout: &str, stderr: &str, code: i32) -> FakeRunner {
        return FakeRunner {
            output: ProcessOutput {
                stdout: stdout.as_bytes().to_vec(),
                stderr: stderr.to_string(),
                code,
            },
            args: Mutex::new(vec![]),
        };
    }
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    #[allow(clippy::implicit_return)]
    async fn run(
        &self,
        _stdin: &[u8],
        command: &str,
        args: &[String],
        _cwd: &Path,
    ) -> Result<ProcessOutput> {
        let mut recorded = vec![command.to_string()];
        recorded.extend_from_slice(args);
        *self.args.lock().unwrap() = recorded;

        return Ok(self.output.clone());
    }
}

#[tokio::test]
async fn it_runs_commands_over_ssh() -> Result<()> {
    let runner = Arc::new(FakeRunner::new("Filesystem Size\n", "", 0));
    let ssh = Ssh::new("build-box", runner.clone());

    let res = ssh.exec("df -h").await?;

    assert_eq!(res, "Filesystem Size\n");
    assert_eq!(
        runner.args.lock().unwrap().clone(),
        vec!["ssh", "-o", "BatchMode=yes", "build-box", "df -h"]
    );

    return Ok(());
}

#[tokio::test]
async fn it_keeps_output_of_failing_commands() -> Result<()> {
    let runner = Arc::new(FakeRunner::new("", "ls: /nope: No such file\n", 2));
    let ssh = Ssh::new("build-box", runner);

    let res = ssh.exec("ls /nope").await?;

    insta::assert_snapshot!(res, @r###"
    ls: /nope: No such file
    (exit code 2)
    "###);

    return Ok(());
}

#[tokio::test]
async fn it_fails_when_ssh_fails() {
    let runner = Arc::new(FakeRunner::new("", "Connection refused\n", 255));
    let ssh = Ssh::new("build-box", runner);

    let res = ssh.exec("uptime").await;
    insta::assert_snapshot!(res.unwrap_err().to_string(), @"ssh to build-box failed: Connection refused");
}

#[tokio::test]
async fn it_requires_a_host() {
    let runner = Arc::new(FakeRunner::new("", "", 0));
    let ssh = Ssh::new("", runner);

    assert!(ssh.exec("uptime").await.is_err());
}
