//! Configuration of the Azure authentication provider of the Guard webhook.
//!
//! The flow is always the same: build [`Options`] from the environment and
//! the `--azure.*` flags, [`validate`][Options::validate] them and finally
//! [`apply`][Options::apply] them to the Guard [`Deployment`] to inject the
//! credential secret, its volume, the environment variables and the
//! arguments the running webhook expects.
//!
//! ```
//! use guard_azure::{EnvironmentDefaults, Options};
//!
//! let mut options = Options::new(EnvironmentDefaults {
//!     client_secret: Some("s1".to_owned()),
//!     client_assertion: None,
//! });
//! options.tenant_id = "t1".to_owned();
//!
//! assert!(options.validate().is_ok());
//! ```
//!
//! ## Crate Features
//!
//! - `clap` (default) derives [`clap::Args`] on [`Options`].
//!
//! [`Deployment`]: k8s_openapi::api::apps::v1::Deployment

pub mod auth_mode;
pub mod builder;
pub mod options;
pub mod patch;
pub mod validation;

pub use auth_mode::AuthMode;
pub use options::{EnvironmentDefaults, Options};
pub use patch::{ExtraObject, Patched};

// External re-exports
pub use k8s_openapi;
