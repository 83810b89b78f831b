//! Deployment platform detection.
//!
//! Maps the process environment onto one of a closed set of hosting
//! platforms by reading a single designated variable.

use serde::Serialize;
use std::fmt;

/// Environment variable that names the hosting platform.
pub const PLATFORM_VAR: &str = "BERTH_PLATFORM";

/// Lookup used to read environment variables.
///
/// Production code passes [`system_env`]; tests pass closures over a map.
pub type EnvLookup = dyn Fn(&str) -> Result<String, std::env::VarError>;

/// Read a variable from the real process environment.
pub fn system_env(key: &str) -> Result<String, std::env::VarError> {
    std::env::var(key)
}

/// The hosting context the application believes it is running in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Local,
    Render,
    Railway,
    Heroku,
    UnknownRemote,
}

impl Platform {
    /// Every platform, in declaration order.
    pub const ALL: [Platform; 5] = [
        Platform::Local,
        Platform::Render,
        Platform::Railway,
        Platform::Heroku,
        Platform::UnknownRemote,
    ];

    /// The identifier accepted in [`PLATFORM_VAR`].
    pub fn identifier(&self) -> &'static str {
        match self {
            Platform::Local => "local",
            Platform::Render => "render",
            Platform::Railway => "railway",
            Platform::Heroku => "heroku",
            Platform::UnknownRemote => "unknown_remote",
        }
    }

    /// Parse an identifier. Unknown identifiers yield `None`.
    pub fn from_identifier(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.identifier().eq_ignore_ascii_case(value))
    }

    /// Whether this platform is a remote host.
    pub fn is_remote(&self) -> bool {
        !matches!(self, Platform::Local)
    }

    /// Detect the platform from the real process environment.
    pub fn detect() -> Self {
        Self::detect_with_env(&system_env)
    }

    /// Detect with a custom env var lookup (for testing).
    ///
    /// Never fails: a missing or unrecognized value resolves to
    /// [`Platform::UnknownRemote`].
    pub fn detect_with_env(env_fn: &EnvLookup) -> Self {
        match env_fn(PLATFORM_VAR) {
            Ok(value) => Self::from_identifier(&value).unwrap_or_else(|| {
                tracing::debug!("Unrecognized {}={:?}, assuming unknown remote", PLATFORM_VAR, value);
                Platform::UnknownRemote
            }),
            Err(_) => Platform::UnknownRemote,
        }
    }

    /// Whether [`PLATFORM_VAR`] is explicitly set to a non-empty value.
    pub fn signal_present_with_env(env_fn: &EnvLookup) -> bool {
        env_fn(PLATFORM_VAR)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}
