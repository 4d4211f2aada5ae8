use eyre::{
    eyre,
    Result,
};
use futures::future::BoxFuture;
use tokio::process::Command;
use tracing::debug;

/// Resolves the current membership of the monitored scope to a set of host
/// identifiers. Stateless; the directory service is the source of truth.
pub trait HostDiscovery: Send + Sync {
    fn list_hosts(&self) -> BoxFuture<'_, Result<Vec<String>>>;
}

/// Shells out to a configured directory-listing command (an LDAP search, an
/// AD query, a static inventory dump) expected to print one hostname per
/// line.
pub struct CommandDiscovery {
    command: String,
}

impl CommandDiscovery {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl HostDiscovery for CommandDiscovery {
    fn list_hosts(&self) -> BoxFuture<'_, Result<Vec<String>>> {
        Box::pin(async move {
            let output = Command::new("sh")
                .arg("-c")
                .arg(&self.command)
                .output()
                .await?;

            if !output.status.success() {
                return Err(eyre!("directory command exited with {}", output.status));
            }

            let hosts: Vec<String> = String::from_utf8_lossy(&output.stdout)
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect();

            debug!(count = hosts.len(), "directory scope resolved");
            Ok(hosts)
        })
    }
}
