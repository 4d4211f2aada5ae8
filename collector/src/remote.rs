use eyre::{
    eyre,
    Result,
};
use futures::future::BoxFuture;
use std::time::Duration;
use tokio::{
    process::Command,
    time::timeout,
};
use tracing::trace;

/// The opaque remote-execution channel: one read-only command against one
/// host, stdout back. Implementations must treat a timeout as an ordinary
/// failure, never as something fatal.
pub trait RemoteExec: Send + Sync {
    fn execute<'a>(&'a self, host: &'a str, command: &'a str) -> BoxFuture<'a, Result<String>>;
}

/// Runs remote queries through a shell template such as
/// `ssh {host} {command}` or `winexe //{host} {command}`.
///
/// No output at all is reported as a failure: the transports in use here
/// swallow errors into empty stdout more often than they set exit codes.
pub struct ShellExec {
    template: String,
    call_timeout: Duration,
}

impl ShellExec {
    pub fn new(template: impl Into<String>, call_timeout: Duration) -> Self {
        Self {
            template: template.into(),
            call_timeout,
        }
    }

    fn render(&self, host: &str, command: &str) -> String {
        self.template
            .replace("{host}", host)
            .replace("{command}", command)
    }
}

impl RemoteExec for ShellExec {
    fn execute<'a>(&'a self, host: &'a str, command: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let line = self.render(host, command);
            trace!(%host, %line, "remote query");

            let run = Command::new("sh").arg("-c").arg(&line).output();
            let output = timeout(self.call_timeout, run)
                .await
                .map_err(|_| eyre!("query timed out after {:?}", self.call_timeout))??;

            if !output.status.success() {
                return Err(eyre!("query exited with {}", output.status));
            }

            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if stdout.is_empty() {
                return Err(eyre!("query produced no output"));
            }
            Ok(stdout)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_substitutes_host_and_command() {
        let exec = ShellExec::new("ssh {host} {command}", Duration::from_secs(1));
        assert_eq!(exec.render("m1", "uptime"), "ssh m1 uptime");
    }

    #[tokio::test]
    async fn empty_output_counts_as_failure() {
        let exec = ShellExec::new("true # {host} {command}", Duration::from_secs(5));
        assert!(exec.execute("m1", "noop").await.is_err());
    }

    #[tokio::test]
    async fn timeout_is_an_ordinary_failure() {
        let exec = ShellExec::new("sleep 5 # {host} {command}", Duration::from_millis(50));
        let err = exec.execute("m1", "noop").await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
