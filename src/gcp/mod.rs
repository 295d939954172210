//! GCP API interaction module
//!
//! Core plumbing shared by every block: credential resolution, path
//! templating, and request execution.
//!
//! # Module Structure
//!
//! - [`auth`] - Credential resolution and bearer-token acquisition
//! - [`http`] - Request execution and response normalization
//! - [`template`] - Path template resolution

pub mod auth;
pub mod http;
pub mod template;
