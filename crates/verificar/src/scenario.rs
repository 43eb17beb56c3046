//! The blog-fix verification scenario.
//!
//! Five strictly sequential steps over a [`PageDriver`]: navigate to the
//! localized blog listing, click the post link by exact text, wait for
//! network idle, assert the corrected text is visible, and capture a
//! screenshot artifact. Any failure aborts the remaining steps; the report
//! records how far the run got.
//!
//! The screenshot is written only after the visibility assertion has
//! passed: a failed run leaves no new artifact.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::assertion;
use crate::driver::PageDriver;
use crate::locator::{Locator, MatchPolicy};
use crate::result::{VerificarError, VerificarResult};
use crate::wait::{self, WaitOptions};

/// One step of the verification flow, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioStep {
    /// Open the blog listing URL
    Navigate,
    /// Find the post link by exact text and click it
    ClickLink,
    /// Wait for the destination page's network activity to settle
    NetworkIdle,
    /// Assert the corrected text is visible
    AssertVisible,
    /// Write the screenshot artifact
    Screenshot,
}

impl ScenarioStep {
    /// Step name for logs and reports
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Navigate => "navigate",
            Self::ClickLink => "click-link",
            Self::NetworkIdle => "network-idle",
            Self::AssertVisible => "assert-visible",
            Self::Screenshot => "screenshot",
        }
    }
}

impl std::fmt::Display for ScenarioStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration for the scenario.
///
/// Defaults reproduce the original verification: the Catalan blog listing on
/// localhost:3004, the Foslog v0.4.0 post link, and the corrected
/// data-management heading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Scheme, host, and port of the application under test
    pub base_url: String,
    /// Path of the blog listing page
    pub blog_path: String,
    /// Exact visible text of the post link to click
    pub link_text: String,
    /// Text that must be visible on the destination page
    pub expected_text: String,
    /// Where to write the screenshot artifact (overwritten if present)
    pub screenshot_path: PathBuf,
    /// Network-idle wait configuration
    pub wait: WaitOptions,
    /// Policy when the link text matches more than one element
    pub link_policy: MatchPolicy,
    /// Timeout for locator resolution (click and assert), in milliseconds
    pub locator_timeout_ms: u64,
    /// Poll interval for locator resolution, in milliseconds
    pub locator_poll_interval_ms: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3004".to_string(),
            blog_path: "/ca/blog".to_string(),
            link_text: "Foslog v0.4.0 - L'Actualització d'Expansió".to_string(),
            expected_text: "Gestió de Dades Optimitzada".to_string(),
            screenshot_path: PathBuf::from("ca-blog-post-final-fix.png"),
            wait: WaitOptions::default(),
            link_policy: MatchPolicy::Strict,
            locator_timeout_ms: crate::locator::DEFAULT_TIMEOUT_MS,
            locator_poll_interval_ms: crate::locator::DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl ScenarioConfig {
    /// Create a config with the original verification's defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the blog listing path
    #[must_use]
    pub fn with_blog_path(mut self, path: impl Into<String>) -> Self {
        self.blog_path = path.into();
        self
    }

    /// Set the exact link text to click
    #[must_use]
    pub fn with_link_text(mut self, text: impl Into<String>) -> Self {
        self.link_text = text.into();
        self
    }

    /// Set the text expected on the destination page
    #[must_use]
    pub fn with_expected_text(mut self, text: impl Into<String>) -> Self {
        self.expected_text = text.into();
        self
    }

    /// Set the screenshot artifact path
    #[must_use]
    pub fn with_screenshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.screenshot_path = path.into();
        self
    }

    /// Set the network-idle wait options
    #[must_use]
    pub const fn with_wait(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Set the multiple-match policy for the link locator
    #[must_use]
    pub const fn with_link_policy(mut self, policy: MatchPolicy) -> Self {
        self.link_policy = policy;
        self
    }

    /// Set locator timing for the click and assert steps
    #[must_use]
    pub const fn with_locator_timing(mut self, timeout_ms: u64, poll_interval_ms: u64) -> Self {
        self.locator_timeout_ms = timeout_ms;
        self.locator_poll_interval_ms = poll_interval_ms;
        self
    }

    /// URL of the blog listing page
    #[must_use]
    pub fn listing_url(&self) -> String {
        format!("{}{}", self.base_url, self.blog_path)
    }
}

/// Result of a scenario run
#[derive(Debug)]
pub struct ScenarioReport {
    /// Steps that completed, in order
    pub steps_completed: Vec<ScenarioStep>,
    /// The failure that aborted the run, if any
    pub error: Option<VerificarError>,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl ScenarioReport {
    /// Whether every step completed
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.error.is_none()
    }

    /// The last step that completed
    #[must_use]
    pub fn last_completed(&self) -> Option<ScenarioStep> {
        self.steps_completed.last().copied()
    }

    /// Convert to a result, surfacing the failure
    pub fn into_result(self) -> VerificarResult<()> {
        match self.error {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}

/// The scenario runner
#[derive(Debug, Clone, Default)]
pub struct Scenario {
    config: ScenarioConfig,
}

impl Scenario {
    /// Create a scenario from a config
    #[must_use]
    pub const fn new(config: ScenarioConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    #[must_use]
    pub const fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Run the five steps in order against a driver.
    ///
    /// Never panics: failures land in the report's `error` together with the
    /// steps that completed before it.
    pub async fn run<D: PageDriver + ?Sized>(&self, driver: &mut D) -> ScenarioReport {
        let start = Instant::now();
        let mut steps_completed = Vec::with_capacity(5);
        let error = self.drive(driver, &mut steps_completed).await.err();
        if let Some(ref err) = error {
            tracing::warn!(
                last_step = steps_completed.last().map_or("none", |s| s.as_str()),
                %err,
                "scenario failed"
            );
        } else {
            tracing::info!(elapsed_ms = start.elapsed().as_millis() as u64, "scenario passed");
        }
        ScenarioReport {
            steps_completed,
            error,
            elapsed: start.elapsed(),
        }
    }

    async fn drive<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
        completed: &mut Vec<ScenarioStep>,
    ) -> VerificarResult<()> {
        let url = self.config.listing_url();
        tracing::info!(%url, step = %ScenarioStep::Navigate, "open blog listing");
        driver.navigate(&url).await?;
        completed.push(ScenarioStep::Navigate);

        let link = Locator::element("a")
            .with_exact_text(self.config.link_text.as_str())
            .with_timeout(Duration::from_millis(self.config.locator_timeout_ms))
            .with_poll_interval(Duration::from_millis(self.config.locator_poll_interval_ms))
            .with_policy(self.config.link_policy);
        let handle = wait::wait_for_match(driver, &link).await?;
        tracing::info!(text = %handle.text, step = %ScenarioStep::ClickLink, "click post link");
        driver.click(&handle).await?;
        completed.push(ScenarioStep::ClickLink);

        tracing::info!(step = %ScenarioStep::NetworkIdle, "wait for page to settle");
        wait::wait_for_network_idle(driver, &self.config.wait).await?;
        completed.push(ScenarioStep::NetworkIdle);

        let corrected = Locator::any()
            .with_text_contains(self.config.expected_text.as_str())
            .with_timeout(Duration::from_millis(self.config.locator_timeout_ms))
            .with_poll_interval(Duration::from_millis(self.config.locator_poll_interval_ms));
        tracing::info!(step = %ScenarioStep::AssertVisible, "expect corrected text");
        assertion::expect_visible(driver, &corrected).await?;
        completed.push(ScenarioStep::AssertVisible);

        let shot = driver.screenshot().await?;
        std::fs::write(&self.config.screenshot_path, &shot.data)?;
        tracing::info!(
            path = %self.config.screenshot_path.display(),
            bytes = shot.data.len(),
            step = %ScenarioStep::Screenshot,
            "screenshot written"
        );
        completed.push(ScenarioStep::Screenshot);

        Ok(())
    }
}
