//! Browser session state: the persisted credential, the role it carries and
//! the predicates every other component reads it through.

pub mod predicate;
pub mod role;
pub mod store;
pub mod vault;

pub use predicate::{get_role, is_authenticated, resolve, AuthState};
pub use role::{Role, RoleSet, UnknownRole};
pub use store::{
    CredentialStore, Credentials, MemoryCredentialStore, SessionCredentialStore, StoreError,
};
pub use vault::{spawn_idle_sweeper, CredentialVault};
