//! principal directory interface
//!
//! The directory is the read-through cache indexing users, groups and
//! access strategies. The engine only reads from it, except for
//! [PrincipalDirectory::force_sync] which it calls at most once per request
//! when a permission check fails and the cache may be stale.
use crate::error;
use crate::model::{Group, Principal, ResourceType, User};
use std::time::Duration;

mod memory;

pub use memory::MemoryDirectory;

/// lookups and policy queries backing the authorization engine
///
/// Records are returned by value: every field of a `User` or `Group` comes
/// from the same snapshot.
pub trait PrincipalDirectory {
    fn resolve_user(&self, id: &str) -> Result<Option<User>, error::Directory>;

    fn resolve_group(&self, id: &str) -> Result<Option<Group>, error::Directory>;

    /// true if some strategy binds `principal` (directly, or through one of
    /// its groups when it is a user) to `id`, or to the wildcard of
    /// `resource_type` under the resource owner
    fn is_resource_editable(
        &self,
        principal: &Principal,
        resource_type: ResourceType,
        id: &str,
    ) -> bool;

    /// true if any strategy at all covers the resource
    ///
    /// directories that cannot answer keep the default, which treats every
    /// resource as protected
    fn is_resource_protected(&self, _resource_type: ResourceType, _id: &str) -> bool {
        true
    }

    /// refreshes the strategy index from the backing store, blocking for at
    /// most `timeout`
    fn force_sync(&self, timeout: Duration) -> Result<(), error::Directory>;
}

impl<D: PrincipalDirectory + ?Sized> PrincipalDirectory for &D {
    fn resolve_user(&self, id: &str) -> Result<Option<User>, error::Directory> {
        (**self).resolve_user(id)
    }

    fn resolve_group(&self, id: &str) -> Result<Option<Group>, error::Directory> {
        (**self).resolve_group(id)
    }

    fn is_resource_editable(
        &self,
        principal: &Principal,
        resource_type: ResourceType,
        id: &str,
    ) -> bool {
        (**self).is_resource_editable(principal, resource_type, id)
    }

    fn is_resource_protected(&self, resource_type: ResourceType, id: &str) -> bool {
        (**self).is_resource_protected(resource_type, id)
    }

    fn force_sync(&self, timeout: Duration) -> Result<(), error::Directory> {
        (**self).force_sync(timeout)
    }
}

impl<D: PrincipalDirectory + ?Sized> PrincipalDirectory for Box<D> {
    fn resolve_user(&self, id: &str) -> Result<Option<User>, error::Directory> {
        (**self).resolve_user(id)
    }

    fn resolve_group(&self, id: &str) -> Result<Option<Group>, error::Directory> {
        (**self).resolve_group(id)
    }

    fn is_resource_editable(
        &self,
        principal: &Principal,
        resource_type: ResourceType,
        id: &str,
    ) -> bool {
        (**self).is_resource_editable(principal, resource_type, id)
    }

    fn is_resource_protected(&self, resource_type: ResourceType, id: &str) -> bool {
        (**self).is_resource_protected(resource_type, id)
    }

    fn force_sync(&self, timeout: Duration) -> Result<(), error::Directory> {
        (**self).force_sync(timeout)
    }
}

impl<D: PrincipalDirectory + ?Sized> PrincipalDirectory for std::sync::Arc<D> {
    fn resolve_user(&self, id: &str) -> Result<Option<User>, error::Directory> {
        (**self).resolve_user(id)
    }

    fn resolve_group(&self, id: &str) -> Result<Option<Group>, error::Directory> {
        (**self).resolve_group(id)
    }

    fn is_resource_editable(
        &self,
        principal: &Principal,
        resource_type: ResourceType,
        id: &str,
    ) -> bool {
        (**self).is_resource_editable(principal, resource_type, id)
    }

    fn is_resource_protected(&self, resource_type: ResourceType, id: &str) -> bool {
        (**self).is_resource_protected(resource_type, id)
    }

    fn force_sync(&self, timeout: Duration) -> Result<(), error::Directory> {
        (**self).force_sync(timeout)
    }
}
