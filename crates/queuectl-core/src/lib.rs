//! # queuectl-core
//!
//! Core crate for queuectl. Contains the unified error system, the
//! result alias, and the configuration schemas shared by every binary.
//!
//! This crate has **no** internal dependencies on other queuectl crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
