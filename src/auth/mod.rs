//! Namespace credentials and shared access signatures.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Credentials`] | Endpoint, policy name and access key of a namespace |
//! | [`SasToken`] | A signed, time-scoped `Authorization` token |

mod credentials;
mod signature;

pub use credentials::Credentials;
pub use signature::{sign, sign_at, SasToken};
