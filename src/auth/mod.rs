//! Credential hashing, signed tokens, the request gate and ownership rules.

pub mod claims;
pub mod error;
pub mod extractors;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod policy;
