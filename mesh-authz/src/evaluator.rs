//! permission evaluation
//!
//! A request is allowed when, for each governed resource type, the operator
//! may edit every requested entry of that type. Types with no requested
//! entries pass.
//!
//! A denial may come from a cache that has not observed a freshly granted
//! strategy yet, so the first denial triggers one forced resync followed by
//! one more pass. The second pass is final.
use crate::context::{AcquireContext, OperatorInfo};
use crate::directory::PrincipalDirectory;
use crate::error;
use crate::model::{Principal, ResourceType};
use std::time::Duration;
use tracing::{debug, info};

/// outcome of an evaluation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Evaluation {
    Allowed,
    /// denied on the first pass, the directory may be stale
    DeniedStale,
    /// denied after a resync
    DeniedFinal,
}

impl Evaluation {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Evaluation::Allowed)
    }
}

pub struct PermissionEvaluator<'a, D> {
    directory: &'a D,
}

impl<'a, D: PrincipalDirectory> PermissionEvaluator<'a, D> {
    pub fn new(directory: &'a D) -> Self {
        PermissionEvaluator { directory }
    }

    /// evaluates against the directory as it is, never resyncing
    pub fn first_pass(&self, operator: &OperatorInfo, ctx: &AcquireContext) -> Evaluation {
        self.pass(&operator.principal, ctx, Evaluation::DeniedStale)
    }

    /// evaluates, and on denial resyncs the directory and evaluates once more
    ///
    /// a resync failure is returned as is, without a second pass
    pub fn evaluate(
        &self,
        operator: &OperatorInfo,
        ctx: &AcquireContext,
        sync_timeout: Duration,
    ) -> Result<Evaluation, error::Auth> {
        match self.first_pass(operator, ctx) {
            Evaluation::DeniedStale => {
                info!(
                    operator = operator.operator_id(),
                    "permission denied, resyncing directory before the final pass"
                );
                self.directory.force_sync(sync_timeout)?;
                Ok(self.pass(&operator.principal, ctx, Evaluation::DeniedFinal))
            }
            evaluation => Ok(evaluation),
        }
    }

    fn pass(&self, principal: &Principal, ctx: &AcquireContext, denied: Evaluation) -> Evaluation {
        for resource_type in ResourceType::GOVERNED.iter() {
            if !self.type_satisfied(principal, *resource_type, ctx) {
                return denied;
            }
        }

        Evaluation::Allowed
    }

    fn type_satisfied(
        &self,
        principal: &Principal,
        resource_type: ResourceType,
        ctx: &AcquireContext,
    ) -> bool {
        match ctx.resources(resource_type).iter().find(|entry| {
            !self
                .directory
                .is_resource_editable(principal, resource_type, &entry.id)
        }) {
            Some(entry) => {
                debug!(
                    principal = %principal,
                    resource_type = ?resource_type,
                    resource = %entry.id,
                    "resource not editable"
                );
                false
            }
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::MemoryDirectory;
    use crate::model::{AccessStrategy, Module, Operation, Role, User, WILDCARD};

    const TIMEOUT: Duration = Duration::from_secs(1);

    fn operator(id: &str) -> OperatorInfo {
        OperatorInfo {
            origin_token: String::new(),
            principal: Principal::User(id.to_string()),
            owner_id: "u0".to_string(),
            role: Some(Role::SubAccount),
            disabled: false,
            anonymous: false,
        }
    }

    fn directory() -> MemoryDirectory {
        let directory = MemoryDirectory::new();
        directory.add_user(User::owner("u0", "t0"));
        directory.add_user(User::sub_account("u1", "u0", "t1"));
        directory.register_resource(ResourceType::Namespace, "ns", "u0");
        directory.register_resource(ResourceType::Service, "s0", "u0");
        directory.register_resource(ResourceType::Service, "s1", "u0");
        directory.add_strategy(
            AccessStrategy::new("u1-services", "u0")
                .principal(Principal::User("u1".to_string()))
                .resource(ResourceType::Namespace, "ns")
                .resource(ResourceType::Service, "s0"),
        );
        directory.refresh();
        directory
    }

    #[test]
    fn every_entry_must_be_editable() {
        let directory = directory();
        let evaluator = PermissionEvaluator::new(&directory);

        let ctx = AcquireContext::new("t1", Module::Discover, Operation::Write)
            .resource(ResourceType::Namespace, "ns")
            .resource(ResourceType::Service, "s0");
        assert_eq!(evaluator.first_pass(&operator("u1"), &ctx), Evaluation::Allowed);

        let ctx = ctx.resource(ResourceType::Service, "s1");
        assert_eq!(
            evaluator.first_pass(&operator("u1"), &ctx),
            Evaluation::DeniedStale
        );
    }

    #[test]
    fn empty_and_ungoverned_types_pass() {
        let directory = directory();
        let evaluator = PermissionEvaluator::new(&directory);

        let ctx = AcquireContext::new("t1", Module::Discover, Operation::Delete)
            .resource(ResourceType::RouteRule, "anything");
        assert_eq!(
            evaluator.evaluate(&operator("u1"), &ctx, TIMEOUT),
            Ok(Evaluation::Allowed)
        );
        assert_eq!(directory.force_sync_count(), 0);
    }

    #[test]
    fn stale_denial_is_retried_once() {
        let directory = directory();
        let evaluator = PermissionEvaluator::new(&directory);
        let ctx = AcquireContext::new("t1", Module::Discover, Operation::Write)
            .resource(ResourceType::Service, "s1");

        directory.add_strategy(
            AccessStrategy::new("u1-all", "u0")
                .principal(Principal::User("u1".to_string()))
                .resource(ResourceType::Service, WILDCARD),
        );

        assert_eq!(
            evaluator.first_pass(&operator("u1"), &ctx),
            Evaluation::DeniedStale
        );
        assert_eq!(
            evaluator.evaluate(&operator("u1"), &ctx, TIMEOUT),
            Ok(Evaluation::Allowed)
        );
        assert_eq!(directory.force_sync_count(), 1);
    }

    #[test]
    fn permanent_denial_is_final_after_one_resync() {
        let directory = directory();
        let evaluator = PermissionEvaluator::new(&directory);
        let ctx = AcquireContext::new("t1", Module::Discover, Operation::Write)
            .resource(ResourceType::Service, "s1");

        assert_eq!(
            evaluator.evaluate(&operator("u1"), &ctx, TIMEOUT),
            Ok(Evaluation::DeniedFinal)
        );
        assert_eq!(directory.force_sync_count(), 1);
    }

    #[test]
    fn resync_failure_is_surfaced() {
        let directory = directory();
        let evaluator = PermissionEvaluator::new(&directory);
        let ctx = AcquireContext::new("t1", Module::Discover, Operation::Write)
            .resource(ResourceType::Service, "s1");

        directory.fail_next_sync(error::Directory::Store("unavailable".to_string()));
        assert_eq!(
            evaluator.evaluate(&operator("u1"), &ctx, TIMEOUT),
            Err(error::Auth::Directory(error::Directory::Store(
                "unavailable".to_string()
            )))
        );
    }
}
