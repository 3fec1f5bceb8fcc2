//! Core types shared by the data and view layers.
//!
//! # Modules
//!
//! - `kernel` - the [`Kernel`] collaborator trait with [`CleanMode`] and
//!   [`UrlOptions`]; the only way the core reaches configuration, the
//!   filesystem, URL generation, escaping and event filters
//! - `app_kernel` - [`AppKernel`], a settings-driven [`Kernel`] used by the
//!   CLI and tests
//! - `error` - [`ErrorContext`] and [`user_friendly_error`] for CLI error
//!   reporting
//!
//! # Examples
//!
//! ```rust
//! use quillkit::core::{AppKernel, CleanMode, Kernel};
//! use serde_json::json;
//!
//! let kernel = AppKernel::new(json!({"env": "dev", "route": {"path": "/"}}), vec![]);
//! assert_eq!(kernel.config(Some("route.path")), Some(json!("/")));
//! assert_eq!(kernel.clean(json!("<b>"), CleanMode::Html), json!("&lt;b&gt;"));
//! ```

mod app_kernel;
pub mod error;
mod kernel;

pub use app_kernel::{AppKernel, EventFilter};
pub use error::{ErrorContext, QuillError, user_friendly_error};
pub use kernel::{CleanMode, Kernel, UrlOptions};
