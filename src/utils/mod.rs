//! Shared helpers.
//!
//! - [`escape`] - HTML, JavaScript and URL escaping plus tag stripping

pub mod escape;

pub use escape::{escape_html, escape_js, escape_url, strip_tags};
