//! Primitive types for [Seedbox Gateway](https://docs.rs/seedbox-gateway).
//!
//! This module contains the basic data structures shared by the Seedbox
//! Gateway packages: the torrent [`info_hash::InfoHash`] used to match
//! submitted jobs against remote transfer listings, and [`magnet`] link
//! parsing used to derive a job descriptor from a submission source.
pub mod info_hash;
pub mod magnet;
