//! credential verification
//!
//! Turns the raw token of a request into an [OperatorInfo]. A token that
//! cannot be authenticated is either rejected or, under lenient settings,
//! replaced with the anonymous operator.
use crate::config::AuthConfig;
use crate::context::{AcquireContext, OperatorInfo};
use crate::directory::PrincipalDirectory;
use crate::error;
use crate::model::{Module, Principal};
use crate::token::TokenCodec;
use tracing::{debug, warn};

pub struct CredentialVerifier<'a, D> {
    directory: &'a D,
    config: &'a AuthConfig,
    codec: TokenCodec,
}

impl<'a, D: PrincipalDirectory> CredentialVerifier<'a, D> {
    pub fn new(directory: &'a D, config: &'a AuthConfig) -> Self {
        CredentialVerifier {
            directory,
            config,
            codec: config.codec(),
        }
    }

    /// resolves the request's credential and attaches the operator to `ctx`
    pub fn verify(&self, ctx: &mut AcquireContext) -> Result<OperatorInfo, error::Auth> {
        let operator = match self.resolve(ctx.token()) {
            Ok(operator) => operator,
            Err(e) if e.is_downgradable() && self.may_downgrade(ctx) => {
                warn!(
                    error = %e,
                    module = ?ctx.module(),
                    origin = ?ctx.origin(),
                    "credential rejected, continuing as anonymous operator"
                );
                OperatorInfo::anonymous(ctx.token())
            }
            Err(e) => {
                debug!(error = %e, module = ?ctx.module(), "credential rejected");
                return Err(e);
            }
        };

        ctx.attach_operator(operator.clone());
        Ok(operator)
    }

    /// decodes `token` and checks it against the directory, with no
    /// downgrade
    pub fn resolve(&self, token: &str) -> Result<OperatorInfo, error::Auth> {
        let principal = self.codec.decode(token)?.principal;

        match &principal {
            Principal::User(id) => {
                let user = self.directory.resolve_user(id)?.ok_or(error::Auth::NoUser)?;
                if user.token != token {
                    return Err(error::Auth::TokenNotExist);
                }

                Ok(OperatorInfo {
                    origin_token: token.to_string(),
                    owner_id: user.owner_id().to_string(),
                    role: Some(user.role()),
                    disabled: !user.token_enable,
                    anonymous: false,
                    principal: principal.clone(),
                })
            }
            Principal::Group(id) => {
                let group = self
                    .directory
                    .resolve_group(id)?
                    .ok_or(error::Auth::NoUserGroup)?;
                if group.token != token {
                    return Err(error::Auth::TokenNotExist);
                }

                Ok(OperatorInfo {
                    origin_token: token.to_string(),
                    owner_id: group.owner_id().to_string(),
                    role: None,
                    disabled: !group.token_enable,
                    anonymous: false,
                    principal: principal.clone(),
                })
            }
        }
    }

    /// identity and policy data is never reachable anonymously, and strict
    /// channels always require a real credential
    fn may_downgrade(&self, ctx: &AcquireContext) -> bool {
        ctx.module() != Module::Auth && !self.config.is_strict(ctx.origin())
    }
}
