pub mod identity;
pub mod middleware;
pub mod rate_limit;
pub mod signing;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use identity::validate_token;
pub use signing::{sign_payload, verify_signature};
