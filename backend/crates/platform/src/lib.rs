//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (CSPRNG, hex, constant-time compare)
//! - Password hashing (Argon2id, NIST SP 800-63B compliant)
//! - Cookie management
//! - TLS / reverse-proxy detection helpers

pub mod cookie;
pub mod crypto;
pub mod password;
pub mod proxy;
