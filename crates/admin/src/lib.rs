//! Tidewear Admin library.
//!
//! The admin API as a library, so the CLI can reuse password hashing and
//! the session store, and handlers can be tested without a running server.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
