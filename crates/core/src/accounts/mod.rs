//! Account registry: the chart of accounts.
//!
//! - `types` - Account kinds, normal balance, subtypes
//! - `registry` - Creation rules and hierarchy building

pub mod registry;
pub mod types;

pub use registry::{AccountNode, build_hierarchy, is_code_unique, validate_new_account};
pub use types::{Account, AccountSubtype, AccountType, CreateAccountInput, NormalBalance};
