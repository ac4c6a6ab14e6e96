//! Cryptographic utilities for LeadScout Core

pub mod password;

pub use password::{hash_password, verify_password};
