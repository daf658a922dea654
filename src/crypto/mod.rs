//! Cryptographic functions for the inventory
//!
//! Argon2id password hashing and random bearer tokens for sign-in.

pub mod password;

pub use password::{generate_token, hash_password, verify_password};
