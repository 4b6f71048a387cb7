//! Docker-backed collector reload.

use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::time::Instant;

use crate::config::ReloadConfig;
use crate::reload::runner::run_command;
use crate::reload::{ReloadController, ReloadError};

/// Restarts the collector container and polls `docker inspect` until it runs.
#[derive(Debug, Clone)]
pub struct DockerReloader {
    docker: String,
    container: String,
    label_filter: String,
    poll_interval: Duration,
}

impl DockerReloader {
    pub fn new(
        docker: impl Into<String>,
        container: impl Into<String>,
        label_filter: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            docker: docker.into(),
            container: container.into(),
            label_filter: label_filter.into(),
            poll_interval,
        }
    }

    pub fn from_config(config: &ReloadConfig) -> Self {
        Self::new(
            config.docker_binary.clone(),
            config.container.clone(),
            config.label_filter.clone(),
            Duration::from_millis(config.poll_interval_ms),
        )
    }

    async fn restart(&self, limit: Duration) -> Result<(), ReloadError> {
        run_command(&self.docker, &["container", "restart", &self.container], limit).await?;
        tracing::info!(container = %self.container, "Collector container restarted");
        Ok(())
    }

    /// Whether the labelled container currently reports running.
    async fn is_running(&self, limit: Duration) -> Result<bool, ReloadError> {
        let filter = format!("label={}", self.label_filter);
        let ids = run_command(&self.docker, &["ps", "--filter", &filter, "--format", "{{.ID}}"], limit).await?;

        // `docker ps` lists running containers only.
        let Some(id) = ids.lines().map(str::trim).find(|line| !line.is_empty()) else {
            return Ok(false);
        };

        let args = ["inspect", "-f", "{{.State.Running}}", id];
        let state = run_command(&self.docker, &args, limit).await?;
        match state.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(ReloadError::ExecFailed {
                command: format!("{} {}", self.docker, args.join(" ")),
                output: format!("unexpected state '{}'", other),
            }),
        }
    }

    async fn run(&self, timeout: Duration) -> Result<(), ReloadError> {
        let deadline = Instant::now() + timeout;
        let remaining = || {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                Err(ReloadError::Timeout(timeout))
            } else {
                Ok(left)
            }
        };

        self.restart(remaining()?).await?;

        let mut polls = 0u32;
        loop {
            polls += 1;
            if self.is_running(remaining()?).await? {
                tracing::debug!(polls, "Collector reports running");
                return Ok(());
            }
            // The next check needs its own slice of time after the sleep.
            if Instant::now() + self.poll_interval * 2 >= deadline {
                tracing::warn!(polls, label = %self.label_filter, "Collector never reported running");
                return Err(ReloadError::NotActive);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

impl ReloadController for DockerReloader {
    fn mode(&self) -> &'static str {
        "docker"
    }

    fn reload_and_verify(&self, timeout: Duration) -> BoxFuture<'_, Result<(), ReloadError>> {
        Box::pin(async move {
            // Per-command limits report what was left; callers care about the total.
            self.run(timeout).await.map_err(|e| match e {
                ReloadError::Timeout(_) => ReloadError::Timeout(timeout),
                other => other,
            })
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    /// Write an executable stand-in for the docker CLI.
    fn fake_docker(dir: &Path, body: &str) -> String {
        let path = dir.join("docker");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn reloader(docker: String) -> DockerReloader {
        DockerReloader::new(docker, "prom", "app=prometheus", Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_restart_and_running() {
        let dir = tempfile::tempdir().unwrap();
        let docker = fake_docker(
            dir.path(),
            r#"case "$1" in
  container) echo "$3" ;;
  ps) echo abc123 ;;
  inspect) echo true ;;
esac"#,
        );

        reloader(docker).reload_and_verify(Duration::from_secs(5)).await.unwrap();
    }

    #[tokio::test]
    async fn test_waits_until_running() {
        let dir = tempfile::tempdir().unwrap();
        let counter = dir.path().join("count");
        let docker = fake_docker(
            dir.path(),
            &format!(
                r#"case "$1" in
  container) echo "$3" ;;
  ps) echo abc123 ;;
  inspect)
    n=$(cat "{0}" 2>/dev/null || echo 0)
    n=$((n+1))
    echo $n > "{0}"
    if [ $n -ge 3 ]; then echo true; else echo false; fi ;;
esac"#,
                counter.display()
            ),
        );

        reloader(docker).reload_and_verify(Duration::from_secs(5)).await.unwrap();
        assert_eq!(fs::read_to_string(&counter).unwrap().trim(), "3");
    }

    #[tokio::test]
    async fn test_not_active() {
        let dir = tempfile::tempdir().unwrap();
        let docker = fake_docker(
            dir.path(),
            r#"case "$1" in
  ps) echo abc123 ;;
  inspect) echo false ;;
esac"#,
        );

        let err = reloader(docker).reload_and_verify(Duration::from_millis(500)).await.unwrap_err();
        assert_eq!(err, ReloadError::NotActive);
    }

    #[tokio::test]
    async fn test_no_container_listed() {
        let dir = tempfile::tempdir().unwrap();
        let docker = fake_docker(dir.path(), "exit 0");

        let err = reloader(docker).reload_and_verify(Duration::from_millis(500)).await.unwrap_err();
        assert_eq!(err, ReloadError::NotActive);
    }

    #[tokio::test]
    async fn test_restart_failure_carries_output() {
        let dir = tempfile::tempdir().unwrap();
        let docker = fake_docker(dir.path(), r#"echo "Error: No such container: prom" >&2; exit 1"#);

        match reloader(docker).reload_and_verify(Duration::from_secs(5)).await.unwrap_err() {
            ReloadError::ExecFailed { command, output } => {
                assert!(command.ends_with("container restart prom"));
                assert_eq!(output, "Error: No such container: prom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unparseable_state() {
        let dir = tempfile::tempdir().unwrap();
        let docker = fake_docker(
            dir.path(),
            r#"case "$1" in
  ps) echo abc123 ;;
  inspect) echo maybe ;;
esac"#,
        );

        let err = reloader(docker).reload_and_verify(Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, ReloadError::ExecFailed { .. }));
    }

    #[tokio::test]
    async fn test_hung_restart_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let docker = fake_docker(dir.path(), "sleep 5");

        let timeout = Duration::from_millis(300);
        let err = reloader(docker).reload_and_verify(timeout).await.unwrap_err();
        assert_eq!(err, ReloadError::Timeout(timeout));
    }
}
