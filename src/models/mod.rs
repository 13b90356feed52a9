//! Wire data transfer objects.
//!
//! Every response arrives wrapped in an [`Envelope`]; the rest are the
//! payloads the typed API sends and receives.
//! - `envelope`: Envelope, the `{code, data, msg}` wrapper
//! - `auth`: Credentials, LoginToken
//! - `repository`: Repository (items of `/repos`)
//! - `commit`: Commit, Pager, CommitsQuery, CommitsResult, RevertRequest

pub mod auth;
pub mod commit;
pub mod envelope;
pub mod repository;

pub use auth::*;
pub use commit::*;
pub use envelope::*;
pub use repository::*;
