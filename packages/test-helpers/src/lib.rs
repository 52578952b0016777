//! Helpers for testing the [Seedbox Gateway](https://docs.rs/seedbox-gateway).
//!
//! Test environments should not share state: every call to
//! [`configuration::ephemeral`] points the token store at a fresh temp
//! file so concurrently running tests cannot observe each other's saves.
pub mod configuration;
pub mod random;
