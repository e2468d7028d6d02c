//! Advice source: run the external assistant command and collect its answer.
//!
//! The command is invoked once per request with the prompt as its final
//! argument. Stdout is the advice; a non-zero exit or a missed deadline is an
//! [`AdviceError`], which the caller recovers from by rendering with the
//! default recommendation. There are no retries.
//!
//! ## Timeout
//!
//! The child is spawned with `kill_on_drop(true)` and awaited under
//! [`tokio::time::timeout`]. When the deadline fires, the pending
//! `wait_with_output` future (and the `Child` it owns) is dropped, which
//! sends SIGKILL to the process.

use crate::config::ServiceConfig;
use crate::error::AdviceError;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Anything that can answer the advice prompt with free text.
#[async_trait]
pub trait AdviceSource: Send + Sync {
    /// Ask for advice. Must return within a bounded time.
    async fn advise(&self, prompt: &str) -> Result<String, AdviceError>;
}

/// Advice from an external command such as `aws q ask <prompt>`.
#[derive(Debug, Clone)]
pub struct CommandAdvisor {
    program: String,
    args: Vec<String>,
    region: Option<String>,
    timeout: Duration,
}

impl CommandAdvisor {
    /// Advisor running `program args... <prompt>` with a 30 second deadline.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            region: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.advice_program.clone(), config.advice_args.clone())
            .with_region(config.region.clone())
            .with_timeout(Duration::from_secs(config.advice_timeout_secs))
    }

    /// Export `AWS_REGION` to the child.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl AdviceSource for CommandAdvisor {
    async fn advise(&self, prompt: &str) -> Result<String, AdviceError> {
        info!("Consulting advice command '{}'", self.program);

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(ref region) = self.region {
            cmd.env("AWS_REGION", region);
        }

        let child = cmd.spawn().map_err(|e| AdviceError::Spawn {
            program: self.program.clone(),
            source: e,
        })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(AdviceError::Timeout {
                    secs: self.timeout.as_secs(),
                })
            }
        };

        if !output.status.success() {
            return Err(AdviceError::CommandFailed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!("Advice command returned {} bytes", text.len());
        Ok(text)
    }
}

/// Advisor that is always unavailable; used when advice is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAdvice;

#[async_trait]
impl AdviceSource for NoAdvice {
    async fn advise(&self, _prompt: &str) -> Result<String, AdviceError> {
        Err(AdviceError::Disabled)
    }
}
