//! Authorization engine for a service mesh control plane
//!
//! Every write request reaching the registry, configuration or auth APIs
//! goes through this crate before touching storage. It:
//!
//! * decodes the request's bearer token into the principal (a user or a
//!   group) it was issued for;
//! * checks that token against the principal directory and decides, based
//!   on the channel's strictness, whether an unauthenticatable request is
//!   rejected or continues as the anonymous operator;
//! * evaluates whether the resolved operator may edit every namespace,
//!   service and configuration group the request touches, retrying once
//!   after a forced directory resync to tolerate a stale cache.
//!
//! # Usage
//!
//! The directory is an external collaborator implementing
//! [`PrincipalDirectory`](crate::directory::PrincipalDirectory). Here we use
//! the in-memory [`MemoryDirectory`](crate::directory::MemoryDirectory):
//!
//! ```rust
//! use mesh_authz::{
//!     config::AuthConfig,
//!     context::AcquireContext,
//!     directory::MemoryDirectory,
//!     error,
//!     model::{AccessStrategy, Module, Operation, Principal, ResourceType, User, WILDCARD},
//!     AuthChecker,
//! };
//!
//! fn main() -> Result<(), error::Auth> {
//!     let config = AuthConfig::from_toml(r#"
//!         console_open = true
//!         console_strict = true
//!         salt = "0123456789abcdef"
//!     "#)?;
//!
//!     // tokens are issued when accounts are created
//!     let codec = config.codec();
//!     let owner_token = codec.encode(&Principal::User("owner".to_string()))?;
//!     let sub_token = codec.encode(&Principal::User("dev".to_string()))?;
//!
//!     let directory = MemoryDirectory::new();
//!     directory.add_user(User::owner("owner", &owner_token));
//!     directory.add_user(User::sub_account("dev", "owner", &sub_token));
//!     directory.register_resource(ResourceType::Service, "orders", "owner");
//!     // owners can edit everything they own
//!     directory.add_strategy(
//!         AccessStrategy::new("owner-default", "owner")
//!             .principal(Principal::User("owner".to_string()))
//!             .resource(ResourceType::Service, WILDCARD),
//!     );
//!     directory.refresh();
//!
//!     let checker = AuthChecker::new(directory, config);
//!
//!     let mut request = AcquireContext::new(&owner_token, Module::Discover, Operation::Write)
//!         .resource(ResourceType::Service, "orders");
//!     checker.check_console_permission(&mut request)?;
//!
//!     // the sub-account holds no strategy covering the service
//!     let mut request = AcquireContext::new(&sub_token, Module::Discover, Operation::Write)
//!         .resource(ResourceType::Service, "orders");
//!     assert_eq!(
//!         checker.check_console_permission(&mut request),
//!         Err(error::Auth::NotPermission)
//!     );
//!
//!     // but reads only need a credential
//!     let mut request = AcquireContext::new(&sub_token, Module::Discover, Operation::Read)
//!         .resource(ResourceType::Service, "orders");
//!     checker.check_console_permission(&mut request)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Trust policy
//!
//! An invalid, empty, reset or orphaned token is rejected when:
//!
//! * the request targets the auth module (users, groups and strategies), or
//! * the channel it arrived on is configured strict.
//!
//! Otherwise it continues as the anonymous operator, which skips permission
//! evaluation. A valid but disabled token may read and never write.

pub mod checker;
pub mod config;
pub mod context;
pub mod crypto;
pub mod directory;
pub mod error;
pub mod evaluator;
pub mod model;
pub mod token;
pub mod verifier;

pub use checker::{AuthChecker, CheckLimits};
pub use config::{AuthConfig, SharedConfig};
pub use context::{AcquireContext, OperatorInfo};
pub use directory::{MemoryDirectory, PrincipalDirectory};
pub use token::{DecodedToken, TokenCodec};
