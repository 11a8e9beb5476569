//! Shared fixtures for integration tests

#![allow(dead_code)]

pub mod fits;

pub use fits::{FitsBuilder, asdf_in_fits};
