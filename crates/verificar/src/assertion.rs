//! Visibility assertions over the driver seam.
//!
//! An assertion failure is a test failure, not a crash: it carries an
//! expected-vs-actual diagnostic built from the page state at the deadline.

use std::time::Instant;

use crate::driver::PageDriver;
use crate::locator::Locator;
use crate::result::{VerificarError, VerificarResult};

/// How much of the page's actual text goes into a failure diagnostic
const DIAGNOSTIC_TEXT_LIMIT: usize = 300;

/// Assert that an element matching the locator is visible, polling until the
/// locator's timeout.
///
/// # Errors
///
/// `AssertionFailed` when no visible match appears in time. The message
/// distinguishes an element that exists but is hidden from one that is
/// absent entirely, and quotes the page's actual visible text.
pub async fn expect_visible<D: PageDriver + ?Sized>(
    driver: &D,
    locator: &Locator,
) -> VerificarResult<()> {
    let start = Instant::now();
    loop {
        let snapshot = driver.dom_snapshot().await?;
        if !locator.resolve(&snapshot).is_empty() {
            return Ok(());
        }

        if start.elapsed() >= locator.options().timeout {
            let hidden_matches = locator
                .clone()
                .with_visible(false)
                .resolve(&snapshot)
                .len();
            let actual = ellipsize(snapshot.visible_text().trim());
            let message = if hidden_matches > 0 {
                format!(
                    "expected {} to be visible, but all {hidden_matches} match(es) are hidden; page shows: {actual:?}",
                    locator.description(),
                )
            } else {
                format!(
                    "expected {} to be visible, but no element matched; page shows: {actual:?}",
                    locator.description(),
                )
            };
            return Err(VerificarError::AssertionFailed { message });
        }
        tokio::time::sleep(locator.options().poll_interval).await;
    }
}

fn ellipsize(text: &str) -> String {
    if text.chars().count() <= DIAGNOSTIC_TEXT_LIMIT {
        return text.to_string();
    }
    let truncated: String = text.chars().take(DIAGNOSTIC_TEXT_LIMIT).collect();
    format!("{truncated}...")
}
