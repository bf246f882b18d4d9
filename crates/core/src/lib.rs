//! Business logic for OWR.
//!
//! Each service wraps one or more repositories from `owr-db` and owns the
//! rules for its part of the domain: vote casting, review workflows for
//! certificates and appointments, catalog maintenance, accounts and roles.

pub mod services;

pub use services::*;
