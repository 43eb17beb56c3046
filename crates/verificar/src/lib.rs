//! Verificar: browser-driven UI verification scenarios.
//!
//! Verificar (Catalan: "to verify") runs a fixed browser flow — navigate,
//! click a link by exact text, wait for network idle, assert corrected text
//! is visible, screenshot — and reports how far it got. Browsers are
//! consumed through the [`PageDriver`] trait, so the same scenario runs
//! against headless chromium (feature `browser`) and against the in-memory
//! [`FakeDriver`] used to test the runner itself.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌───────────────────────┐
//! │ Scenario     │────►│ PageDriver   │────►│ ChromiumDriver (CDP)  │
//! │ (5 steps)    │     │ (trait seam) │     │ FakeDriver (in-memory)│
//! └──────────────┘     └──────────────┘     └───────────────────────┘
//!        │                     │
//!        ▼                     ▼
//!   Locator / waits      DomNode snapshot
//! ```
//!
//! # Example
//!
//! ```
//! use verificar::{DomNode, FakeDriver, FakeSite, Scenario, ScenarioConfig, WaitOptions};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let site = FakeSite::new()
//!     .with_page(
//!         "http://localhost:3004/ca/blog",
//!         DomNode::element("body").with_child(
//!             DomNode::element("a")
//!                 .with_attr("href", "/ca/blog/foslog-v0-4-0")
//!                 .with_text("Foslog v0.4.0 - L'Actualització d'Expansió"),
//!         ),
//!     )
//!     .with_page(
//!         "http://localhost:3004/ca/blog/foslog-v0-4-0",
//!         DomNode::element("body")
//!             .with_child(DomNode::element("h2").with_text("Gestió de Dades Optimitzada")),
//!     );
//!
//! let dir = tempfile::tempdir().unwrap();
//! let config = ScenarioConfig::new()
//!     .with_screenshot_path(dir.path().join("ca-blog-post-final-fix.png"))
//!     .with_wait(WaitOptions::new().with_timeout(300).with_idle_threshold(10));
//!
//! let mut driver = FakeDriver::new(site);
//! let report = Scenario::new(config).run(&mut driver).await;
//! assert!(report.passed());
//! # }
//! ```

#![warn(missing_docs)]

mod assertion;
mod dom;
mod driver;
mod fake;
mod locator;
mod result;
mod scenario;
mod wait;

/// Tracing subscriber setup for runnable scenarios
pub mod trace;

pub use assertion::expect_visible;
pub use dom::DomNode;
pub use driver::{DriverConfig, ElementHandle, PageDriver, Screenshot};
pub use fake::{FakeDriver, FakeSite};
pub use locator::{
    Locator, LocatorOptions, MatchPolicy, TextMatch, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS,
};
pub use result::{VerificarError, VerificarResult};
pub use scenario::{Scenario, ScenarioConfig, ScenarioReport, ScenarioStep};
pub use wait::{
    wait_for_match, wait_for_network_idle, WaitOptions, DEFAULT_WAIT_TIMEOUT_MS,
    NETWORK_IDLE_THRESHOLD_MS,
};

#[cfg(feature = "browser")]
pub use driver::chromium::ChromiumDriver;
