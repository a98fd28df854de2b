//! per-request authorization state
use crate::model::{Module, Operation, Origin, Principal, ResourceEntry, ResourceType, Role};
use std::collections::BTreeMap;

/// operator id carried by every anonymous identity
pub const ANONYMOUS_OPERATOR_ID: &str = "__anonymous__";

/// identity resolved from a request's credential
#[derive(Clone, Debug, PartialEq)]
pub struct OperatorInfo {
    pub origin_token: String,
    pub principal: Principal,
    pub owner_id: String,
    /// `None` for group tokens and anonymous operators
    pub role: Option<Role>,
    /// the stored token was disabled at resolution time
    pub disabled: bool,
    pub anonymous: bool,
}

impl OperatorInfo {
    /// sentinel identity substituted for an unauthenticatable credential
    pub fn anonymous(origin_token: &str) -> Self {
        OperatorInfo {
            origin_token: origin_token.to_string(),
            principal: Principal::User(ANONYMOUS_OPERATOR_ID.to_string()),
            owner_id: String::new(),
            role: None,
            disabled: false,
            anonymous: true,
        }
    }

    pub fn operator_id(&self) -> &str {
        self.principal.id()
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    pub fn is_user_token(&self) -> bool {
        !self.anonymous && self.principal.is_user()
    }

    pub fn is_owner(&self) -> bool {
        self.is_user_token() && self.role == Some(Role::Owner)
    }
}

/// data the engine hands to downstream business logic
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attachment {
    pub operator: Option<OperatorInfo>,
}

/// one inbound request as seen by the authorization engine
///
/// ```rust
/// use mesh_authz::context::AcquireContext;
/// use mesh_authz::model::{Module, Operation, ResourceType};
///
/// let ctx = AcquireContext::new("token", Module::Discover, Operation::Write)
///     .resource(ResourceType::Namespace, "default")
///     .resource(ResourceType::Service, "orders");
///
/// assert_eq!(ctx.resources(ResourceType::Service).len(), 1);
/// assert!(ctx.operator().is_none());
/// ```
#[derive(Clone, Debug)]
pub struct AcquireContext {
    token: String,
    module: Module,
    operation: Operation,
    origin: Option<Origin>,
    resources: BTreeMap<ResourceType, Vec<ResourceEntry>>,
    attachment: Attachment,
}

impl AcquireContext {
    pub fn new(token: &str, module: Module, operation: Operation) -> Self {
        AcquireContext {
            token: token.to_string(),
            module,
            operation,
            origin: None,
            resources: BTreeMap::new(),
            attachment: Attachment::default(),
        }
    }

    /// adds a requested resource
    pub fn resource(mut self, resource_type: ResourceType, id: &str) -> Self {
        self.resources
            .entry(resource_type)
            .or_default()
            .push(ResourceEntry::new(id));
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn module(&self) -> Module {
        self.module
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn origin(&self) -> Option<Origin> {
        self.origin
    }

    pub fn set_origin(&mut self, origin: Origin) {
        self.origin = Some(origin);
    }

    pub fn resources(&self, resource_type: ResourceType) -> &[ResourceEntry] {
        self.resources
            .get(&resource_type)
            .map(|entries| entries.as_slice())
            .unwrap_or(&[])
    }

    pub fn attachment(&self) -> &Attachment {
        &self.attachment
    }

    /// the resolved operator, once credentials were verified
    pub fn operator(&self) -> Option<&OperatorInfo> {
        self.attachment.operator.as_ref()
    }

    pub(crate) fn attach_operator(&mut self, operator: OperatorInfo) {
        self.attachment.operator = Some(operator);
    }

    /// drops every requested entry for which `keep` returns false
    pub(crate) fn retain_resources<F>(&mut self, mut keep: F)
    where
        F: FnMut(ResourceType, &ResourceEntry) -> bool,
    {
        for (resource_type, entries) in self.resources.iter_mut() {
            entries.retain(|entry| keep(*resource_type, entry));
        }
    }
}
