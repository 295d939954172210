//! gcpflow - workflow-automation blocks for Google Cloud REST APIs
//!
//! Every block declares a typed input schema and maps to exactly one REST
//! operation against a Google Cloud service host. One shared executor
//! resolves credentials, builds the request URL from the block's path
//! template, issues the call with a bearer token, and emits the parsed JSON
//! response as an event.
//!
//! ```ignore
//! use gcpflow::{AppConfig, Invoker};
//! use serde_json::json;
//!
//! async fn example() -> Result<(), gcpflow::Error> {
//!     let mut config = AppConfig::load();
//!     config.access_token = Some("tok".to_string());
//!     config.project_id = Some("my-project".to_string());
//!
//!     let invoker = Invoker::new(config)?;
//!     let firewall = invoker
//!         .invoke("compute.firewalls.get", &json!({"firewall": "allow-ssh"}))
//!         .await?;
//!     println!("{}", firewall);
//!     Ok(())
//! }
//! ```

pub mod block;
pub mod config;
pub mod error;
pub mod event;
pub mod gcp;

pub use block::{get_all_endpoint_keys, get_endpoint, get_service_endpoint_keys, Invoker};
pub use config::AppConfig;
pub use error::Error;
pub use event::{BlockEvent, EventSink};

/// Version injected at compile time via GCPFLOW_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("GCPFLOW_VERSION") {
    Some(v) => v,
    None => "dev",
};
