//! HTML view layer.
//!
//! A [`View`] renders Tera templates resolved through the [`Kernel`]'s path
//! lookup, keeps the view data shared by every template rendered during one
//! request, and collects page assets in an [`AssetQueue`].
//!
//! # Partial and primary renders
//!
//! A partial render (`primary = false`) resolves the named template, merges
//! the supplied data into the view data and returns the rendered text.
//!
//! A primary render additionally:
//! - swaps the template for the active theme's layout (see [`theme`])
//! - seeds the `js` and `meta` data buckets from configuration
//! - injects queued asset markup and a `window.pageData` script before
//!   `</head>`
//! - passes the page through the kernel's `output.html` event filter
//!
//! # Template functions
//!
//! Templates see the view data as top-level variables and can call the
//! functions listed in [`functions`]: `data`, `url`, `clean`, `queue`,
//! `dequeue` and `tpl`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use quillkit::config::ViewOptions;
//! use quillkit::core::AppKernel;
//! use quillkit::templating::View;
//! use serde_json::{json, Map};
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), quillkit::templating::ViewError> {
//! let kernel = AppKernel::new(json!({"env": "prod"}), vec!["site".into()]);
//! let view = View::new(Arc::new(kernel), ViewOptions::default());
//!
//! view.queue("css", "/assets/app.min.css", vec![])?;
//! let html = view.render("home", Map::new(), true)?;
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod data;
pub mod error;
pub mod functions;
pub mod renderer;
pub mod theme;

pub use assets::{AssetKind, AssetQueue, QueueItem};
pub use data::DataResolver;
pub use error::ViewError;
pub use theme::ThemePlan;

use serde_json::{Map, Value};
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::ViewOptions;
use crate::core::{CleanMode, Kernel, UrlOptions};

/// Renderer, view data and asset queue for one request.
///
/// Cloning a `View` is cheap and yields a handle to the same state; template
/// functions hold such handles while a render is in progress.
#[derive(Clone)]
pub struct View {
    shared: Arc<ViewShared>,
}

struct ViewShared {
    kernel: Arc<dyn Kernel>,
    options: ViewOptions,
    state: Mutex<ViewState>,
    depth: AtomicUsize,
}

#[derive(Default)]
struct ViewState {
    data: Map<String, Value>,
    queue: AssetQueue,
    /// `None` until the first primary render activates the theme.
    theme: Option<Option<Arc<ThemePlan>>>,
}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("View")
            .field("options", &self.shared.options)
            .field("data", &state.data)
            .field("queued", &state.queue.len())
            .finish()
    }
}

impl View {
    pub fn new(kernel: Arc<dyn Kernel>, options: ViewOptions) -> Self {
        let state = ViewState {
            data: options.data.clone(),
            ..ViewState::default()
        };
        Self {
            shared: Arc::new(ViewShared {
                kernel,
                options,
                state: Mutex::new(state),
                depth: AtomicUsize::new(0),
            }),
        }
    }

    pub fn kernel(&self) -> &dyn Kernel {
        self.shared.kernel.as_ref()
    }

    pub fn options(&self) -> &ViewOptions {
        &self.shared.options
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.shared.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve a dot path against the view data (or `config.*`), escaped
    /// with `mode`. Missing paths and `null` values give `None`.
    pub fn data(&self, path: &str, mode: CleanMode) -> Option<Value> {
        let state = self.state();
        DataResolver::new(self.kernel(), &state.data).data(path, mode)
    }

    /// A copy of the current view data.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.state().data.clone()
    }

    /// Merge `data` into the view data; incoming keys win.
    pub fn merge_data(&self, data: Map<String, Value>) {
        self.state().data.extend(data);
    }

    /// URL for `content`, or `None` when it is inline content.
    ///
    /// Without explicit options the `time` cache buster follows
    /// [`ViewOptions::url_time`].
    pub fn url(&self, content: &str, opts: Option<UrlOptions>) -> Option<String> {
        let opts = opts.unwrap_or(UrlOptions {
            time: self.shared.options.url_time,
        });
        self.kernel().url(content, &opts)
    }

    pub fn clean(&self, value: Value, mode: CleanMode) -> Value {
        self.kernel().clean(value, mode)
    }

    /// Queue a page asset by category name; returns its id.
    pub fn queue(&self, kind: &str, content: &str, dependencies: Vec<String>) -> Result<String, ViewError> {
        let kind: AssetKind = kind.parse()?;
        Ok(self.queue_kind(kind, content, dependencies))
    }

    /// [`View::queue`] with an already parsed category.
    pub fn queue_kind(&self, kind: AssetKind, content: &str, dependencies: Vec<String>) -> String {
        let url = self.url(content, None);
        self.state().queue.queue(kind, content, url.as_deref(), dependencies)
    }

    /// Remove a queued asset. Unknown ids are ignored.
    pub fn dequeue(&self, kind: &str, id: &str) -> Result<Option<QueueItem>, ViewError> {
        let kind: AssetKind = kind.parse()?;
        Ok(self.state().queue.dequeue(kind, id))
    }

    /// A copy of the asset queue.
    pub fn assets(&self) -> AssetQueue {
        self.state().queue.clone()
    }

    /// The active theme, activating it on first use.
    pub fn theme(&self) -> Result<Option<Arc<ThemePlan>>, ViewError> {
        let mut state = self.state();
        if let Some(theme) = &state.theme {
            return Ok(theme.clone());
        }
        let theme = ThemePlan::activate(self.kernel(), &self.shared.options)?.map(Arc::new);
        state.theme = Some(theme.clone());
        Ok(theme)
    }

    /// The theme if it has already been activated.
    fn active_theme(&self) -> Option<Arc<ThemePlan>> {
        self.state().theme.clone().flatten()
    }
}
