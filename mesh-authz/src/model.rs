//! identities, resources and request classification
use std::fmt;

/// wire tag of a token issued for a user
pub const USER_KIND: &str = "uid";
/// wire tag of a token issued for a group
pub const GROUP_KIND: &str = "groupid";

/// who a credential speaks for
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Principal {
    User(String),
    Group(String),
}

impl Principal {
    pub fn id(&self) -> &str {
        match self {
            Principal::User(id) | Principal::Group(id) => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Principal::User(_) => USER_KIND,
            Principal::Group(_) => GROUP_KIND,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Principal::User(_))
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.kind(), self.id())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// primary account, owns sub-accounts, groups and resources
    Owner,
    SubAccount,
}

/// directory record of a user
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: String,
    /// empty for owner accounts, which also decides the [Role]
    pub owner: String,
    pub token: String,
    pub token_enable: bool,
}

impl User {
    /// builds an owner account (self-owned)
    pub fn owner(id: &str, token: &str) -> Self {
        User {
            id: id.to_string(),
            owner: String::new(),
            token: token.to_string(),
            token_enable: true,
        }
    }

    /// builds a sub-account of `owner`
    pub fn sub_account(id: &str, owner: &str, token: &str) -> Self {
        User {
            id: id.to_string(),
            owner: owner.to_string(),
            token: token.to_string(),
            token_enable: true,
        }
    }

    pub fn role(&self) -> Role {
        if self.owner.is_empty() {
            Role::Owner
        } else {
            Role::SubAccount
        }
    }

    /// the account administering this user, which is the user itself for owners
    pub fn owner_id(&self) -> &str {
        if self.owner.is_empty() {
            &self.id
        } else {
            &self.owner
        }
    }
}

/// directory record of a user group
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub id: String,
    pub owner: String,
    pub token: String,
    pub token_enable: bool,
    pub members: Vec<String>,
}

impl Group {
    pub fn new(id: &str, owner: &str, token: &str) -> Self {
        Group {
            id: id.to_string(),
            owner: owner.to_string(),
            token: token.to_string(),
            token_enable: true,
            members: vec![],
        }
    }

    pub fn owner_id(&self) -> &str {
        if self.owner.is_empty() {
            &self.id
        } else {
            &self.owner
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    Namespace,
    Service,
    ConfigGroup,
    RouteRule,
    RateLimitRule,
}

impl ResourceType {
    /// resource types whose editability is decided by policies
    pub const GOVERNED: [ResourceType; 3] = [
        ResourceType::Namespace,
        ResourceType::Service,
        ResourceType::ConfigGroup,
    ];

    pub fn is_governed(&self) -> bool {
        ResourceType::GOVERNED.contains(self)
    }
}

/// id that matches every resource of a type under the policy owner
pub const WILDCARD: &str = "*";

/// a resource a request touches
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceEntry {
    pub id: String,
}

impl ResourceEntry {
    pub fn new(id: &str) -> Self {
        ResourceEntry { id: id.to_string() }
    }
}

/// a policy binding principals to the resources they may edit
///
/// the engine never mutates strategies, it only asks the directory whether
/// one covers a given principal and resource
#[derive(Clone, Debug, PartialEq)]
pub struct AccessStrategy {
    pub id: String,
    pub owner: String,
    pub principals: Vec<Principal>,
    pub resources: Vec<(ResourceType, String)>,
}

impl AccessStrategy {
    pub fn new(id: &str, owner: &str) -> Self {
        AccessStrategy {
            id: id.to_string(),
            owner: owner.to_string(),
            principals: vec![],
            resources: vec![],
        }
    }

    pub fn principal(mut self, principal: Principal) -> Self {
        self.principals.push(principal);
        self
    }

    pub fn resource(mut self, resource_type: ResourceType, id: &str) -> Self {
        self.resources.push((resource_type, id.to_string()));
        self
    }

    /// true if this strategy lists `id`, or a wildcard and the resource
    /// belongs to the strategy owner
    pub fn covers(
        &self,
        resource_type: ResourceType,
        id: &str,
        resource_owner: Option<&str>,
    ) -> bool {
        let owned = resource_owner == Some(self.owner.as_str());
        self.resources
            .iter()
            .any(|(t, entry)| *t == resource_type && (entry == id || (entry == WILDCARD && owned)))
    }
}

/// the business module a request targets
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Module {
    Discover,
    Config,
    /// users, groups and policies
    Auth,
    Maintain,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Read,
    /// create or modify
    Write,
    Delete,
}

impl Operation {
    pub fn is_read(&self) -> bool {
        matches!(self, Operation::Read)
    }
}

/// channel a request arrived on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    /// data plane SDKs and sidecars
    Client,
    /// admin console and open API
    Console,
}
