//! authorization entry points
//!
//! Every check runs against a single config snapshot taken when it starts,
//! so a concurrent [AuthChecker::reload] never affects a request half-way.
use crate::config::{AuthConfig, SharedConfig};
use crate::context::AcquireContext;
use crate::directory::PrincipalDirectory;
use crate::error;
use crate::evaluator::{Evaluation, PermissionEvaluator};
use crate::model::{Module, Origin};
use crate::verifier::CredentialVerifier;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// bounds applied to a single check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CheckLimits {
    /// maximum time spent waiting on a forced directory resync
    pub force_sync_timeout: Duration,
}

impl Default for CheckLimits {
    fn default() -> Self {
        CheckLimits {
            force_sync_timeout: Duration::from_secs(5),
        }
    }
}

/// decides whether a request may proceed
///
/// every method returns `Ok(())` when the request is allowed, and a typed
/// error describing the denial otherwise
pub struct AuthChecker<D> {
    directory: D,
    config: SharedConfig,
    limits: CheckLimits,
}

impl<D: PrincipalDirectory> AuthChecker<D> {
    pub fn new(directory: D, config: AuthConfig) -> Self {
        Self::with_shared_config(directory, SharedConfig::new(config))
    }

    /// builds a checker reading from a config published elsewhere
    pub fn with_shared_config(directory: D, config: SharedConfig) -> Self {
        AuthChecker {
            directory,
            config,
            limits: CheckLimits::default(),
        }
    }

    pub fn set_limits(&mut self, limits: CheckLimits) {
        self.limits = limits;
    }

    pub fn limits(&self) -> CheckLimits {
        self.limits
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// the config snapshot currently in effect
    pub fn config(&self) -> Arc<AuthConfig> {
        self.config.load()
    }

    /// replaces the whole configuration
    pub fn reload(&self, config: AuthConfig) {
        self.config.store(config);
    }

    pub fn is_console_open(&self) -> bool {
        self.config.load().console_open
    }

    pub fn is_client_open(&self) -> bool {
        self.config.load().client_open
    }

    /// resolves the request's credential and attaches the operator to `ctx`
    pub fn verify_credential(&self, ctx: &mut AcquireContext) -> Result<(), error::Auth> {
        let config = self.config.load();
        CredentialVerifier::new(&self.directory, &config).verify(ctx)?;
        Ok(())
    }

    /// checks a request received on the client channel
    pub fn check_client_permission(&self, ctx: &mut AcquireContext) -> Result<(), error::Auth> {
        ctx.set_origin(Origin::Client);
        let config = self.config.load();
        if !config.client_open {
            return Ok(());
        }

        self.check_permission_with(&config, ctx)
    }

    /// checks a request received on the console channel
    pub fn check_console_permission(&self, ctx: &mut AcquireContext) -> Result<(), error::Auth> {
        ctx.set_origin(Origin::Console);
        let config = self.config.load();
        if !config.console_open {
            return Ok(());
        }

        if ctx.module() == Module::Maintain {
            return self.check_maintain_permission(&config, ctx);
        }

        self.check_permission_with(&config, ctx)
    }

    /// verifies the credential then evaluates write permissions
    pub fn check_permission(&self, ctx: &mut AcquireContext) -> Result<(), error::Auth> {
        let config = self.config.load();
        self.check_permission_with(&config, ctx)
    }

    fn check_permission_with(
        &self,
        config: &AuthConfig,
        ctx: &mut AcquireContext,
    ) -> Result<(), error::Auth> {
        let operator = CredentialVerifier::new(&self.directory, config).verify(ctx)?;

        if operator.is_anonymous() || ctx.operation().is_read() {
            return Ok(());
        }

        if operator.disabled {
            return Err(error::Auth::TokenDisabled);
        }

        if !config.is_strict(ctx.origin()) {
            let directory = &self.directory;
            ctx.retain_resources(|resource_type, entry| {
                !resource_type.is_governed()
                    || directory.is_resource_protected(resource_type, &entry.id)
            });
        }

        let evaluation = PermissionEvaluator::new(&self.directory).evaluate(
            &operator,
            ctx,
            self.limits.force_sync_timeout,
        )?;

        debug!(
            operator = operator.operator_id(),
            evaluation = ?evaluation,
            "permission evaluated"
        );
        match evaluation {
            Evaluation::Allowed => Ok(()),
            Evaluation::DeniedStale | Evaluation::DeniedFinal => Err(error::Auth::NotPermission),
        }
    }

    /// maintenance actions are reserved to enabled owner accounts
    fn check_maintain_permission(
        &self,
        config: &AuthConfig,
        ctx: &mut AcquireContext,
    ) -> Result<(), error::Auth> {
        let operator = CredentialVerifier::new(&self.directory, config).verify(ctx)?;

        if ctx.operation().is_read() {
            return Ok(());
        }

        if operator.disabled {
            return Err(error::Auth::NotAllowedAccess(
                "token is disabled".to_string(),
            ));
        }
        if !operator.is_user_token() {
            return Err(error::Auth::NotAllowedAccess(
                "only user tokens may run maintenance actions".to_string(),
            ));
        }
        if !operator.is_owner() {
            return Err(error::Auth::NotAllowedAccess(
                "only owner accounts may run maintenance actions".to_string(),
            ));
        }

        Ok(())
    }
}
