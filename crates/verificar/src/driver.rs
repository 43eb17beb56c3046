//! Abstract browser automation seam.
//!
//! The scenario runner consumes browsers only through the [`PageDriver`]
//! trait, so the same flow runs against real chromium (feature `browser`)
//! and against the in-memory fake used to test the runner itself.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::dom::DomNode;
use crate::result::VerificarResult;

#[cfg(feature = "browser")]
pub mod chromium;

/// Handle to an element resolved from a snapshot.
///
/// `id` is the element's pre-order index within the snapshot it was resolved
/// from; drivers interpret it against the page's current document order, so a
/// handle goes stale if the page mutates between resolution and use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Pre-order index in the snapshot
    pub id: u64,
    /// Element tag name
    pub tag: String,
    /// End-trimmed visible text at resolution time
    pub text: String,
    /// Whether the element was visible at resolution time
    pub visible: bool,
}

/// Captured page image
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Raw PNG data
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Screenshot {
    /// Create a new screenshot
    #[must_use]
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
        }
    }

    /// Check if the screenshot has data
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.data.is_empty() && self.width > 0 && self.height > 0
    }
}

/// Browser session configuration
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub executable_path: Option<String>,
    /// User agent string
    pub user_agent: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            executable_path: None,
            user_agent: None,
            sandbox: true,
        }
    }
}

impl DriverConfig {
    /// Create a config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set chromium executable path
    #[must_use]
    pub fn with_executable_path(mut self, path: impl Into<String>) -> Self {
        self.executable_path = Some(path.into());
        self
    }

    /// Set user agent
    #[must_use]
    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// Browser automation capability consumed by scenarios.
///
/// One implementor owns one browser page for the lifetime of a scenario.
/// Every operation either completes or returns a `VerificarError`; none
/// retries beyond its own polling.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate the page to a URL
    async fn navigate(&mut self, url: &str) -> VerificarResult<()>;

    /// Capture a snapshot of the current document as a [`DomNode`] tree
    async fn dom_snapshot(&self) -> VerificarResult<DomNode>;

    /// Click the element a handle points at
    async fn click(&mut self, handle: &ElementHandle) -> VerificarResult<()>;

    /// Number of network requests currently in flight
    async fn in_flight_requests(&self) -> VerificarResult<usize>;

    /// Capture the rendered page as PNG
    async fn screenshot(&self) -> VerificarResult<Screenshot>;

    /// URL of the current page
    async fn current_url(&self) -> VerificarResult<String>;

    /// Tear down the session. Further operations fail.
    async fn close(&mut self) -> VerificarResult<()>;
}
