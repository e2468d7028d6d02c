//! Service configuration.
//!
//! Everything the service needs at startup lives in [`ServiceConfig`],
//! built via [`ServiceConfigBuilder`]. The AWS region in particular is an
//! explicit value handed to the advice command's environment rather than a
//! process-wide setting, so two services with different regions can share
//! one process.

use crate::error::SitePdfError;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Flags passed to Chrome/Chromium on launch.
///
/// Sandbox-less, single-process headless mode: the service usually runs
/// inside a container without user namespaces or a large `/dev/shm`.
pub const DEFAULT_BROWSER_ARGS: [&str; 5] = [
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--single-process",
];

/// Configuration for a [`crate::convert::SitePdf`] service.
///
/// # Example
/// ```rust
/// use sitepdf::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .region("eu-west-1")
///     .advice_timeout_secs(10)
///     .build()
///     .unwrap();
/// assert_eq!(config.region, "eu-west-1");
/// ```
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// AWS region exported to the advice command as `AWS_REGION`. Default: `us-east-1`.
    pub region: String,

    /// Advice executable. Default: `aws`.
    pub advice_program: String,

    /// Arguments placed before the prompt. Default: `["q", "ask"]`.
    pub advice_args: Vec<String>,

    /// Hard deadline for one advice call in seconds. Default: 30.
    ///
    /// On expiry the child process is killed and rendering continues with
    /// the default recommendation.
    pub advice_timeout_secs: u64,

    /// When false the advice command is never run. Default: true.
    pub advice_enabled: bool,

    /// Explicit browser executable. If None, chromiumoxide searches the usual
    /// install locations.
    pub chrome_executable: Option<PathBuf>,

    /// Browser launch flags. Default: [`DEFAULT_BROWSER_ARGS`].
    pub browser_args: Vec<String>,

    /// Address the HTTP service listens on. Default: `0.0.0.0:3000`.
    pub bind: SocketAddr,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            advice_program: "aws".to_string(),
            advice_args: vec!["q".to_string(), "ask".to_string()],
            advice_timeout_secs: 30,
            advice_enabled: true,
            chrome_executable: None,
            browser_args: DEFAULT_BROWSER_ARGS.iter().map(|s| s.to_string()).collect(),
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
        }
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.config.region = region.into();
        self
    }

    pub fn advice_program(mut self, program: impl Into<String>) -> Self {
        self.config.advice_program = program.into();
        self
    }

    pub fn advice_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.advice_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set program and leading arguments from one whitespace-separated
    /// command line, e.g. `"aws q ask"`.
    pub fn advice_command(mut self, command_line: &str) -> Self {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        if let Some(program) = parts.next() {
            self.config.advice_program = program;
            self.config.advice_args = parts.collect();
        }
        self
    }

    pub fn advice_timeout_secs(mut self, secs: u64) -> Self {
        self.config.advice_timeout_secs = secs.max(1);
        self
    }

    pub fn advice_enabled(mut self, enabled: bool) -> Self {
        self.config.advice_enabled = enabled;
        self
    }

    pub fn chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chrome_executable = Some(path.into());
        self
    }

    pub fn browser_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.browser_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.config.bind = addr;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServiceConfig, SitePdfError> {
        let c = &self.config;
        if c.region.trim().is_empty() {
            return Err(SitePdfError::InvalidConfig("region must not be empty".into()));
        }
        if c.advice_enabled && c.advice_program.trim().is_empty() {
            return Err(SitePdfError::InvalidConfig(
                "advice program must not be empty while advice is enabled".into(),
            ));
        }
        if let Some(ref chrome) = c.chrome_executable {
            if chrome.as_os_str().is_empty() {
                return Err(SitePdfError::InvalidConfig(
                    "chrome executable path must not be empty".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ServiceConfig::default();
        assert_eq!(c.region, "us-east-1");
        assert_eq!(c.advice_program, "aws");
        assert_eq!(c.advice_args, vec!["q", "ask"]);
        assert_eq!(c.advice_timeout_secs, 30);
        assert!(c.advice_enabled);
        assert!(c.browser_args.iter().any(|a| a == "--no-sandbox"));
    }

    #[test]
    fn advice_command_splits_program_and_args() {
        let c = ServiceConfig::builder()
            .advice_command("q chat --no-interactive")
            .build()
            .unwrap();
        assert_eq!(c.advice_program, "q");
        assert_eq!(c.advice_args, vec!["chat", "--no-interactive"]);
    }

    #[test]
    fn blank_advice_command_is_ignored() {
        let c = ServiceConfig::builder().advice_command("   ").build().unwrap();
        assert_eq!(c.advice_program, "aws");
    }

    #[test]
    fn timeout_is_clamped_to_one_second() {
        let c = ServiceConfig::builder().advice_timeout_secs(0).build().unwrap();
        assert_eq!(c.advice_timeout_secs, 1);
    }

    #[test]
    fn empty_region_rejected() {
        let err = ServiceConfig::builder().region(" ").build().unwrap_err();
        assert!(matches!(err, SitePdfError::InvalidConfig(_)));
    }

    #[test]
    fn empty_program_allowed_when_advice_disabled() {
        let c = ServiceConfig::builder()
            .advice_program("")
            .advice_enabled(false)
            .build();
        assert!(c.is_ok());
    }
}
