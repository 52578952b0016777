//! Gateway application bootstrapping.
//!
//! This module includes all the functions to build the application and its dependencies.
//!
//! Bootstrapping is what an embedding application or a delivery layer runs once at startup:
//! it loads the configuration, initializes logging and builds the session manager around the
//! drive connector the embedder provides.
pub mod app;
pub mod logging;
