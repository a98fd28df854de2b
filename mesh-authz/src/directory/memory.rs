use super::PrincipalDirectory;
use crate::error;
use crate::model::{AccessStrategy, Group, Principal, ResourceType, User};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Debug, Default)]
struct Snapshot {
    users: HashMap<String, User>,
    groups: HashMap<String, Group>,
    strategies: Vec<AccessStrategy>,
    /// resource owner by type and id
    resources: HashMap<(ResourceType, String), String>,
}

impl Snapshot {
    fn bound_principals(&self, principal: &Principal) -> Vec<Principal> {
        let mut principals = vec![principal.clone()];
        if let Principal::User(user_id) = principal {
            principals.extend(
                self.groups
                    .values()
                    .filter(|group| group.members.iter().any(|member| member == user_id))
                    .map(|group| Principal::Group(group.id.clone())),
            );
        }
        principals
    }

    fn owner_of(&self, resource_type: ResourceType, id: &str) -> Option<&str> {
        self.resources
            .get(&(resource_type, id.to_string()))
            .map(|owner| owner.as_str())
    }
}

/// in-process directory with an explicit cache layer
///
/// Mutations land in the backing store and only become visible to lookups
/// once [MemoryDirectory::refresh] or [PrincipalDirectory::force_sync]
/// publishes a new snapshot, the way a periodically refreshed cache lags
/// behind its database.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    store: Mutex<Snapshot>,
    cache: RwLock<Arc<Snapshot>>,
    force_syncs: AtomicUsize,
    sync_latency: Mutex<Duration>,
    sync_failure: Mutex<Option<error::Directory>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: User) {
        self.store.lock().users.insert(user.id.clone(), user);
    }

    pub fn add_group(&self, group: Group) {
        self.store.lock().groups.insert(group.id.clone(), group);
    }

    /// adds `user_id` to an existing group, returns false if the group is unknown
    pub fn add_member(&self, group_id: &str, user_id: &str) -> bool {
        match self.store.lock().groups.get_mut(group_id) {
            Some(group) => {
                group.members.push(user_id.to_string());
                true
            }
            None => false,
        }
    }

    /// replaces a user's token, as a token reset does
    pub fn reset_user_token(&self, user_id: &str, token: &str) -> bool {
        match self.store.lock().users.get_mut(user_id) {
            Some(user) => {
                user.token = token.to_string();
                true
            }
            None => false,
        }
    }

    pub fn reset_group_token(&self, group_id: &str, token: &str) -> bool {
        match self.store.lock().groups.get_mut(group_id) {
            Some(group) => {
                group.token = token.to_string();
                true
            }
            None => false,
        }
    }

    pub fn enable_user_token(&self, user_id: &str, enable: bool) -> bool {
        match self.store.lock().users.get_mut(user_id) {
            Some(user) => {
                user.token_enable = enable;
                true
            }
            None => false,
        }
    }

    pub fn enable_group_token(&self, group_id: &str, enable: bool) -> bool {
        match self.store.lock().groups.get_mut(group_id) {
            Some(group) => {
                group.token_enable = enable;
                true
            }
            None => false,
        }
    }

    pub fn add_strategy(&self, strategy: AccessStrategy) {
        let mut store = self.store.lock();
        store.strategies.retain(|s| s.id != strategy.id);
        store.strategies.push(strategy);
    }

    pub fn remove_strategy(&self, id: &str) {
        self.store.lock().strategies.retain(|s| s.id != id);
    }

    /// records which account owns a resource, for wildcard matching
    pub fn register_resource(&self, resource_type: ResourceType, id: &str, owner: &str) {
        self.store
            .lock()
            .resources
            .insert((resource_type, id.to_string()), owner.to_string());
    }

    /// publishes the backing store to the cache
    ///
    /// the store lock is held until the snapshot is published, so concurrent
    /// refreshes publish in store order
    pub fn refresh(&self) {
        let store = self.store.lock();
        *self.cache.write() = Arc::new(store.clone());
    }

    /// number of forced resyncs performed so far
    pub fn force_sync_count(&self) -> usize {
        self.force_syncs.load(Ordering::SeqCst)
    }

    /// makes every following forced resync take `latency`
    pub fn set_sync_latency(&self, latency: Duration) {
        *self.sync_latency.lock() = latency;
    }

    /// makes the next forced resync fail with `failure`
    pub fn fail_next_sync(&self, failure: error::Directory) {
        *self.sync_failure.lock() = Some(failure);
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        self.cache.read().clone()
    }
}

impl PrincipalDirectory for MemoryDirectory {
    fn resolve_user(&self, id: &str) -> Result<Option<User>, error::Directory> {
        Ok(self.snapshot().users.get(id).cloned())
    }

    fn resolve_group(&self, id: &str) -> Result<Option<Group>, error::Directory> {
        Ok(self.snapshot().groups.get(id).cloned())
    }

    fn is_resource_editable(
        &self,
        principal: &Principal,
        resource_type: ResourceType,
        id: &str,
    ) -> bool {
        let snapshot = self.snapshot();
        let owner = snapshot.owner_of(resource_type, id);
        let principals = snapshot.bound_principals(principal);

        snapshot
            .strategies
            .iter()
            .filter(|s| s.principals.iter().any(|p| principals.contains(p)))
            .any(|s| s.covers(resource_type, id, owner))
    }

    fn is_resource_protected(&self, resource_type: ResourceType, id: &str) -> bool {
        let snapshot = self.snapshot();
        let owner = snapshot.owner_of(resource_type, id);

        snapshot
            .strategies
            .iter()
            .any(|s| s.covers(resource_type, id, owner))
    }

    fn force_sync(&self, timeout: Duration) -> Result<(), error::Directory> {
        self.force_syncs.fetch_add(1, Ordering::SeqCst);

        if let Some(failure) = self.sync_failure.lock().take() {
            return Err(failure);
        }

        let latency = *self.sync_latency.lock();
        if latency > timeout {
            std::thread::sleep(timeout);
            return Err(error::Directory::Timeout(timeout));
        }
        if !latency.is_zero() {
            std::thread::sleep(latency);
        }

        self.refresh();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WILDCARD;

    fn user(id: &str) -> Principal {
        Principal::User(id.to_string())
    }

    #[test]
    fn mutations_need_a_refresh() {
        let directory = MemoryDirectory::new();
        directory.add_user(User::owner("u0", "t0"));
        assert_eq!(directory.resolve_user("u0").unwrap(), None);

        directory.refresh();
        assert_eq!(
            directory.resolve_user("u0").unwrap().map(|u| u.token),
            Some("t0".to_string())
        );
    }

    #[test]
    fn wildcard_and_group_inheritance() {
        let directory = MemoryDirectory::new();
        directory.add_user(User::owner("u0", "t0"));
        directory.add_user(User::sub_account("u1", "u0", "t1"));
        directory.add_group(Group::new("g1", "u0", "tg"));
        assert!(directory.add_member("g1", "u1"));
        directory.register_resource(ResourceType::Service, "s0", "u0");
        directory.register_resource(ResourceType::Service, "s9", "u9");
        directory.add_strategy(
            AccessStrategy::new("default-u0", "u0")
                .principal(user("u0"))
                .resource(ResourceType::Service, WILDCARD),
        );
        directory.add_strategy(
            AccessStrategy::new("group", "u0")
                .principal(Principal::Group("g1".to_string()))
                .resource(ResourceType::Namespace, "ns1"),
        );
        directory.refresh();

        assert!(directory.is_resource_editable(&user("u0"), ResourceType::Service, "s0"));
        assert!(!directory.is_resource_editable(&user("u0"), ResourceType::Service, "s9"));
        assert!(!directory.is_resource_editable(&user("u1"), ResourceType::Service, "s0"));
        assert!(directory.is_resource_editable(&user("u1"), ResourceType::Namespace, "ns1"));
        assert!(directory.is_resource_editable(
            &Principal::Group("g1".to_string()),
            ResourceType::Namespace,
            "ns1"
        ));

        assert!(directory.is_resource_protected(ResourceType::Service, "s0"));
        assert!(!directory.is_resource_protected(ResourceType::Service, "s9"));
        assert!(!directory.is_resource_protected(ResourceType::Namespace, "ns2"));
    }

    #[test]
    fn force_sync_publishes_and_counts() {
        let directory = MemoryDirectory::new();
        directory.add_user(User::owner("u0", "t0"));

        directory.force_sync(Duration::from_secs(1)).unwrap();
        assert!(directory.resolve_user("u0").unwrap().is_some());
        assert_eq!(directory.force_sync_count(), 1);
    }

    #[test]
    fn concurrent_syncs_never_publish_an_older_store() {
        let directory = Arc::new(MemoryDirectory::new());
        directory.register_resource(ResourceType::Service, "s0", "u0");

        let writers: Vec<_> = (0..4)
            .map(|t| {
                let directory = directory.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let id = format!("u{}-{}", t, i);
                        directory.add_strategy(
                            AccessStrategy::new(&id, "u0")
                                .principal(user(&id))
                                .resource(ResourceType::Service, "s0"),
                        );
                        directory.force_sync(Duration::from_secs(1)).unwrap();
                        assert!(
                            directory.is_resource_editable(&user(&id), ResourceType::Service, "s0"),
                            "grant for {} lost after its resync",
                            id
                        );
                    }
                })
            })
            .collect();
        let refresher = {
            let directory = directory.clone();
            std::thread::spawn(move || {
                for _ in 0..200 {
                    directory.refresh();
                }
            })
        };

        for writer in writers {
            writer.join().unwrap();
        }
        refresher.join().unwrap();
        assert_eq!(directory.force_sync_count(), 200);
    }

    #[test]
    fn force_sync_failures() {
        let directory = MemoryDirectory::new();
        directory.add_user(User::owner("u0", "t0"));

        directory.fail_next_sync(error::Directory::Store("connection reset".to_string()));
        assert_eq!(
            directory.force_sync(Duration::from_secs(1)),
            Err(error::Directory::Store("connection reset".to_string()))
        );
        assert!(directory.resolve_user("u0").unwrap().is_none());

        directory.set_sync_latency(Duration::from_millis(50));
        assert_eq!(
            directory.force_sync(Duration::from_millis(5)),
            Err(error::Directory::Timeout(Duration::from_millis(5)))
        );
        assert!(directory.resolve_user("u0").unwrap().is_none());

        directory.force_sync(Duration::from_secs(1)).unwrap();
        assert!(directory.resolve_user("u0").unwrap().is_some());
        assert_eq!(directory.force_sync_count(), 3);
    }
}
