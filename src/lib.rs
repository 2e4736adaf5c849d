//! # Geek News
//!
//! A news portal backend, usable both as a standalone binary and as a library.
//!
//! Visitors browse published articles by section and subscribe to the
//! newsletter; registered users keep a favorites list; an administrator
//! authors articles, manages subscribers, and sends campaigns through a
//! sandboxed mail relay.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! geeknews = "0.1"
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::path::PathBuf;
//! use geeknews::config::DispatchConfig;
//! use geeknews::mail::SandboxMailer;
//! use geeknews::server::{AppState, create_router};
//! use geeknews::store::{SqliteStore, Store, seed_default_admin};
//!
//! let store = SqliteStore::new(&PathBuf::from("./data/geeknews.db")).unwrap();
//! store.initialize().unwrap();
//! seed_default_admin(&store).unwrap();
//!
//! let state = Arc::new(AppState::new(
//!     Arc::new(store),
//!     Arc::new(SandboxMailer::new()),
//!     PathBuf::from("./data"),
//!     DispatchConfig::default(),
//! ));
//! let router = create_router(state);
//! // Serve with axum...
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod mail;
pub mod newsletter;
pub mod server;
pub mod store;
pub mod types;
