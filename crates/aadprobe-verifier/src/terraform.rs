use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use aadprobe_config::{Fixture, ProbeConfig};
use aadprobe_domain::{ObjectId, StateSnapshot};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::ProvisionError;
use crate::provisioner::Provisioner;

const MAIN_TF: &str = "main.tf";
const PROVIDER_TF: &str = "provider.tf";

/// Default hard limit for a single terraform invocation.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1800);

/// Captured result of one terraform invocation.
struct TfRun {
    code:   i32,
    stdout: String,
    /// Interleaved stdout + stderr.
    log:    String,
}

// ── TerraformProvisioner ──────────────────────────────────────────────────────

/// Applies fixtures by invoking the `terraform` or `tofu` binary.
///
/// Responsibilities:
/// - Own a workspace directory holding `main.tf` (the rendered fixture) and
///   `provider.tf`
/// - Run `init` + `apply`, then read the root module via `show -json`
/// - Re-import a resource with `state rm` + `import`
/// - Tear down with `destroy`
///
/// Provider credentials are passed as `ARM_*` environment variables and are
/// never written to the workspace.
pub struct TerraformProvisioner {
    binary:    String,
    workspace: PathBuf,
    auth_env:  HashMap<String, String>,
    timeout:   Duration,
}

impl TerraformProvisioner {
    pub fn new(binary: impl Into<String>, workspace: impl Into<PathBuf>, config: &ProbeConfig) -> Self {
        Self {
            binary:    binary.into(),
            workspace: workspace.into(),
            auth_env:  auth_env(config),
            timeout:   DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-invocation time limit.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    async fn write_file(&self, name: &str, content: &str) -> Result<(), ProvisionError> {
        let path = self.workspace.join(name);
        tokio::fs::write(&path, content).await.map_err(|e| ProvisionError::Io {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Run a command and fail unless it exits 0.
    async fn run_ok(&self, args: &[&str]) -> Result<TfRun, ProvisionError> {
        let run = self.run_tf(args).await?;
        if run.code != 0 {
            return Err(ProvisionError::CommandFailed {
                command: format!("{} {}", self.binary, args.first().copied().unwrap_or("")),
                code: run.code,
                log: run.log,
            });
        }
        Ok(run)
    }

    async fn run_tf(&self, args: &[&str]) -> Result<TfRun, ProvisionError> {
        let binary = self.binary.as_str();
        info!(binary, ?args, workspace = %self.workspace.display(), "running terraform command");

        let mut child = Command::new(binary)
            .args(args)
            .current_dir(&self.workspace)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Disable interactive prompts and colour
            .env("TF_IN_AUTOMATION", "1")
            .env("TF_INPUT", "0")
            .envs(&self.auth_env)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ProvisionError::Internal(format!("spawn {}: {}", binary, e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProvisionError::Internal("stdout not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ProvisionError::Internal("stderr not captured".into()))?;

        // Both streams feed one channel so the log keeps their interleaving;
        // stdout is also kept on its own for `show -json`.
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<(bool, String)>();

        let tx1 = tx.clone();
        let stdout_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let _ = tx1.send((true, line));
            }
        });

        let tx2 = tx.clone();
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let _ = tx2.send((false, line));
            }
        });

        drop(tx);

        let mut out = String::new();
        let mut log = String::new();
        let collect = async {
            while let Some((is_stdout, line)) = rx.recv().await {
                debug!(target: "aadprobe::terraform", "{}", line);
                if is_stdout {
                    out.push_str(&line);
                    out.push('\n');
                }
                log.push_str(&line);
                log.push('\n');
            }
        };
        let timed_out = tokio::time::timeout(self.timeout, collect).await.is_err();

        if timed_out {
            // Readers end only at EOF, which provider plugins may hold open.
            if let Err(e) = child.kill().await {
                warn!(binary, error = %e, "failed to kill timed-out terraform command");
            }
            stdout_task.abort();
            stderr_task.abort();
            return Err(ProvisionError::Timeout(format!(
                "{} {} after {:?}",
                binary,
                args.first().copied().unwrap_or(""),
                self.timeout,
            )));
        }

        stdout_task.await.ok();
        stderr_task.await.ok();

        let status = child
            .wait()
            .await
            .map_err(|e| ProvisionError::Internal(format!("wait {}: {}", binary, e)))?;

        let code = status.code().unwrap_or(-1);
        if code != 0 {
            warn!(binary, code, "terraform command exited non-zero");
        }
        Ok(TfRun { code, stdout: out, log })
    }

    async fn show(&self) -> Result<StateSnapshot, ProvisionError> {
        let run = self.run_ok(&["show", "-json", "-no-color"]).await?;
        Ok(StateSnapshot::from_show_json(run.stdout.trim())?)
    }
}

/// Provider authentication for the subprocess. Empty when the provider should
/// fall back to the Azure CLI login.
fn auth_env(config: &ProbeConfig) -> HashMap<String, String> {
    let mut env = HashMap::new();
    if let Some(t) = &config.tenant_id {
        env.insert("ARM_TENANT_ID".to_string(), t.clone());
    }
    if let (Some(id), Some(secret)) = (&config.client_id, &config.client_secret) {
        env.insert("ARM_CLIENT_ID".to_string(), id.clone());
        env.insert("ARM_CLIENT_SECRET".to_string(), secret.clone());
    }
    env
}

#[async_trait]
impl Provisioner for TerraformProvisioner {
    fn name(&self) -> &'static str {
        "terraform"
    }

    async fn apply(&self, fixture: &Fixture) -> Result<StateSnapshot, ProvisionError> {
        tokio::fs::create_dir_all(&self.workspace)
            .await
            .map_err(|e| ProvisionError::Io {
                path: self.workspace.display().to_string(),
                source: e,
            })?;

        self.write_file(PROVIDER_TF, "provider \"azuread\" {}\n").await?;
        self.write_file(MAIN_TF, &fixture.render()).await?;

        self.run_ok(&["init", "-input=false", "-no-color"]).await?;
        self.run_ok(&["apply", "-auto-approve", "-input=false", "-no-color"]).await?;
        self.show().await
    }

    async fn reimport(&self, address: &str, id: &ObjectId) -> Result<StateSnapshot, ProvisionError> {
        self.run_ok(&["state", "rm", "-no-color", address]).await?;
        self.run_ok(&["import", "-input=false", "-no-color", address, id.as_str()]).await?;
        self.show().await
    }

    async fn destroy(&self) -> Result<(), ProvisionError> {
        if !self.workspace.join(MAIN_TF).exists() {
            debug!(workspace = %self.workspace.display(), "nothing applied; nothing to destroy");
            return Ok(());
        }
        self.run_ok(&["destroy", "-auto-approve", "-input=false", "-no-color"]).await?;
        Ok(())
    }
}
