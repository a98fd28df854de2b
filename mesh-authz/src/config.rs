//! process-wide authorization settings
//!
//! ```toml
//! console_open = true
//! client_open = true
//! client_strict = true
//! salt = "0123456789abcdef"
//! ```
//!
//! The legacy `strict = true` switch turns both channels strict.
use crate::crypto::Salt;
use crate::error;
use crate::model::Origin;
use crate::token::TokenCodec;
use parking_lot::RwLock;
use serde::Deserialize;
use std::convert::TryFrom;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// immutable authorization settings
///
/// build one with [AuthConfig::from_toml] or [AuthConfig::default], and
/// publish replacements through [SharedConfig::store]
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RawAuthConfig")]
pub struct AuthConfig {
    /// require credentials on the console channel
    pub console_open: bool,
    /// require credentials on the client channel
    pub client_open: bool,
    /// reject unauthenticated console requests instead of downgrading them
    pub console_strict: bool,
    /// reject unauthenticated client requests instead of downgrading them
    pub client_strict: bool,
    pub salt: Salt,
}

/// built-in settings, sealing tokens with the default salt
impl Default for AuthConfig {
    fn default() -> Self {
        RawAuthConfig::default().with_salt(default_salt())
    }
}

fn default_salt() -> Salt {
    warn!("no salt configured, tokens are sealed with the built-in default salt");
    Salt::default()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawAuthConfig {
    console_open: Option<bool>,
    client_open: Option<bool>,
    console_strict: bool,
    client_strict: bool,
    strict: bool,
    salt: Option<String>,
}

impl RawAuthConfig {
    fn with_salt(self, salt: Salt) -> AuthConfig {
        AuthConfig {
            console_open: self.console_open.unwrap_or(true),
            client_open: self.client_open.unwrap_or(false),
            console_strict: self.console_strict || self.strict,
            client_strict: self.client_strict || self.strict,
            salt,
        }
    }
}

impl TryFrom<RawAuthConfig> for AuthConfig {
    type Error = error::Config;

    fn try_from(mut raw: RawAuthConfig) -> Result<Self, Self::Error> {
        let salt = match raw.salt.take() {
            Some(salt) => Salt::try_from(salt)?,
            None => default_salt(),
        };

        Ok(raw.with_salt(salt))
    }
}

impl AuthConfig {
    pub fn from_toml(source: &str) -> Result<Self, error::Config> {
        let raw: RawAuthConfig =
            toml::from_str(source).map_err(|e| error::Config::Parse(e.to_string()))?;
        AuthConfig::try_from(raw)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, error::Config> {
        let source = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            error::Config::Io(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_toml(&source)
    }

    /// whether requests from `origin` must present a valid credential
    ///
    /// requests with no known origin are never strict
    pub fn is_strict(&self, origin: Option<Origin>) -> bool {
        match origin {
            Some(Origin::Client) => self.client_strict,
            Some(Origin::Console) => self.console_strict,
            None => false,
        }
    }

    pub fn codec(&self) -> TokenCodec {
        TokenCodec::new(self.salt.clone())
    }
}

/// a published [AuthConfig] that can be swapped as a whole
///
/// readers take an `Arc` snapshot and never observe a half-updated config
#[derive(Clone, Debug)]
pub struct SharedConfig {
    current: Arc<RwLock<Arc<AuthConfig>>>,
}

impl SharedConfig {
    pub fn new(config: AuthConfig) -> Self {
        SharedConfig {
            current: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    pub fn load(&self) -> Arc<AuthConfig> {
        self.current.read().clone()
    }

    pub fn store(&self, config: AuthConfig) {
        info!(
            console_open = config.console_open,
            client_open = config.client_open,
            console_strict = config.console_strict,
            client_strict = config.client_strict,
            "publishing authorization config"
        );
        *self.current.write() = Arc::new(config);
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        SharedConfig::new(AuthConfig::default())
    }
}
