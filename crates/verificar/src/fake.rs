//! In-memory fake for testing scenarios without a browser.
//!
//! [`FakeSite`] maps URLs to [`DomNode`] pages; [`FakeDriver`] implements
//! [`PageDriver`] over it. Clicking an anchor follows its `href`, the
//! in-flight request counter is scriptable so network-idle behavior can be
//! driven from tests, and screenshots are synthesized PNGs.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::dom::DomNode;
use crate::driver::{ElementHandle, PageDriver, Screenshot};
use crate::result::{VerificarError, VerificarResult};

/// An in-memory web application: URL to page tree
#[derive(Debug, Clone, Default)]
pub struct FakeSite {
    pages: HashMap<String, DomNode>,
}

impl FakeSite {
    /// Create an empty site
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a page at a URL
    #[must_use]
    pub fn with_page(mut self, url: impl Into<String>, page: DomNode) -> Self {
        self.pages.insert(url.into(), page);
        self
    }

    /// Look up the page served at a URL
    #[must_use]
    pub fn page(&self, url: &str) -> Option<&DomNode> {
        self.pages.get(url)
    }
}

/// Scheme and host part of a URL, e.g. `http://localhost:3004`
fn origin(url: &str) -> &str {
    url.find("://").map_or(url, |scheme_end| {
        let path_start = url[scheme_end + 3..]
            .find('/')
            .map_or(url.len(), |i| scheme_end + 3 + i);
        &url[..path_start]
    })
}

/// Resolve an href against the URL of the page it appears on
fn resolve_href(current_url: &str, href: &str) -> String {
    if href.contains("://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{}{}", origin(current_url), href)
    } else {
        let base = current_url.rfind('/').map_or(current_url, |i| &current_url[..i]);
        format!("{base}/{href}")
    }
}

/// `PageDriver` over a [`FakeSite`].
///
/// The default viewport is small (64x64) to keep synthesized screenshots
/// cheap in tests.
#[derive(Debug)]
pub struct FakeDriver {
    site: FakeSite,
    current_url: Option<String>,
    inflight_schedule: Mutex<VecDeque<usize>>,
    always_busy: bool,
    viewport_width: u32,
    viewport_height: u32,
    closed: bool,
}

impl FakeDriver {
    /// Create a driver over a site
    #[must_use]
    pub fn new(site: FakeSite) -> Self {
        Self {
            site,
            current_url: None,
            inflight_schedule: Mutex::new(VecDeque::new()),
            always_busy: false,
            viewport_width: 64,
            viewport_height: 64,
            closed: false,
        }
    }

    /// Script the in-flight counter: successive polls consume the values in
    /// order, then report zero.
    #[must_use]
    pub fn with_inflight_schedule(self, schedule: impl IntoIterator<Item = usize>) -> Self {
        {
            let mut guard = self.inflight_schedule.lock().unwrap_or_else(|e| e.into_inner());
            guard.extend(schedule);
        }
        self
    }

    /// Report in-flight activity forever (network never goes idle)
    #[must_use]
    pub const fn with_always_busy(mut self) -> Self {
        self.always_busy = true;
        self
    }

    /// Set the synthesized screenshot dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    fn ensure_open(&self) -> VerificarResult<()> {
        if self.closed {
            return Err(VerificarError::Driver {
                message: "session is closed".to_string(),
            });
        }
        Ok(())
    }

    fn goto(&mut self, url: &str) -> VerificarResult<()> {
        if self.site.page(url).is_none() {
            return Err(VerificarError::Navigation {
                url: url.to_string(),
                message: "no page served at this address".to_string(),
            });
        }
        self.current_url = Some(url.to_string());
        Ok(())
    }

    fn current_page(&self) -> VerificarResult<&DomNode> {
        let url = self.current_url.as_deref().ok_or_else(|| VerificarError::Driver {
            message: "no open page".to_string(),
        })?;
        self.site.page(url).ok_or_else(|| VerificarError::Driver {
            message: format!("page at {url} disappeared"),
        })
    }
}

#[async_trait]
impl PageDriver for FakeDriver {
    async fn navigate(&mut self, url: &str) -> VerificarResult<()> {
        self.ensure_open()?;
        self.goto(url)
    }

    async fn dom_snapshot(&self) -> VerificarResult<DomNode> {
        self.ensure_open()?;
        self.current_page().cloned()
    }

    async fn click(&mut self, handle: &ElementHandle) -> VerificarResult<()> {
        self.ensure_open()?;
        let (tag, href) = {
            let page = self.current_page()?;
            let node = page
                .walk()
                .nth(handle.id as usize)
                .map(|(node, _)| node)
                .ok_or_else(|| VerificarError::Driver {
                    message: format!("stale element index {} ({})", handle.id, handle.tag),
                })?;
            (node.tag.clone(), node.attr("href").map(str::to_string))
        };
        if tag == "a" {
            if let Some(href) = href {
                let current = self.current_url.clone().unwrap_or_default();
                let target = resolve_href(&current, &href);
                return self.goto(&target);
            }
        }
        // Clicks on non-anchors render no observable effect in the fake.
        Ok(())
    }

    async fn in_flight_requests(&self) -> VerificarResult<usize> {
        self.ensure_open()?;
        let mut guard = self.inflight_schedule.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(count) = guard.pop_front() {
            return Ok(count);
        }
        Ok(usize::from(self.always_busy))
    }

    async fn screenshot(&self) -> VerificarResult<Screenshot> {
        self.ensure_open()?;
        self.current_page()?;

        let (width, height) = (self.viewport_width, self.viewport_height);
        let mut data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut data, width, height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder
                .write_header()
                .map_err(|e| VerificarError::Screenshot {
                    message: e.to_string(),
                })?;
            let pixels = vec![0xF5_u8; width as usize * height as usize * 4];
            writer
                .write_image_data(&pixels)
                .map_err(|e| VerificarError::Screenshot {
                    message: e.to_string(),
                })?;
        }
        Ok(Screenshot::new(data, width, height))
    }

    async fn current_url(&self) -> VerificarResult<String> {
        self.ensure_open()?;
        self.current_url.clone().ok_or_else(|| VerificarError::Driver {
            message: "no open page".to_string(),
        })
    }

    async fn close(&mut self) -> VerificarResult<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::locator::Locator;

    fn two_page_site() -> FakeSite {
        FakeSite::new()
            .with_page(
                "http://localhost:3004/ca/blog",
                DomNode::element("body").with_child(
                    DomNode::element("a")
                        .with_attr("href", "/ca/blog/foslog-v0-4-0")
                        .with_text("Foslog v0.4.0 - L'Actualització d'Expansió"),
                ),
            )
            .with_page(
                "http://localhost:3004/ca/blog/foslog-v0-4-0",
                DomNode::element("body").with_child(
                    DomNode::element("h2").with_text("Gestió de Dades Optimitzada"),
                ),
            )
    }

    mod url_tests {
        use super::*;

        #[test]
        fn test_origin() {
            assert_eq!(origin("http://localhost:3004/ca/blog"), "http://localhost:3004");
            assert_eq!(origin("http://localhost:3004"), "http://localhost:3004");
        }

        #[test]
        fn test_resolve_absolute_path_href() {
            assert_eq!(
                resolve_href("http://localhost:3004/ca/blog", "/ca/blog/foslog-v0-4-0"),
                "http://localhost:3004/ca/blog/foslog-v0-4-0"
            );
        }

        #[test]
        fn test_resolve_full_url_href() {
            assert_eq!(
                resolve_href("http://localhost:3004/ca/blog", "http://other.example/p"),
                "http://other.example/p"
            );
        }

        #[test]
        fn test_resolve_relative_href() {
            assert_eq!(
                resolve_href("http://localhost:3004/ca/blog", "foslog-v0-4-0"),
                "http://localhost:3004/ca/foslog-v0-4-0"
            );
        }
    }

    mod driver_tests {
        use super::*;

        #[tokio::test]
        async fn test_navigate_to_served_page() {
            let mut driver = FakeDriver::new(two_page_site());
            driver.navigate("http://localhost:3004/ca/blog").await.unwrap();
            assert_eq!(
                driver.current_url().await.unwrap(),
                "http://localhost:3004/ca/blog"
            );
        }

        #[tokio::test]
        async fn test_navigate_to_missing_page_fails() {
            let mut driver = FakeDriver::new(two_page_site());
            let err = driver.navigate("http://localhost:3004/en/blog").await.unwrap_err();
            assert!(matches!(err, VerificarError::Navigation { .. }));
        }

        #[tokio::test]
        async fn test_click_anchor_navigates() {
            let mut driver = FakeDriver::new(two_page_site());
            driver.navigate("http://localhost:3004/ca/blog").await.unwrap();

            let snapshot = driver.dom_snapshot().await.unwrap();
            let handle = Locator::element("a")
                .with_exact_text("Foslog v0.4.0 - L'Actualització d'Expansió")
                .resolve_single(&snapshot)
                .unwrap()
                .unwrap();
            driver.click(&handle).await.unwrap();

            assert_eq!(
                driver.current_url().await.unwrap(),
                "http://localhost:3004/ca/blog/foslog-v0-4-0"
            );
            let post = driver.dom_snapshot().await.unwrap();
            assert!(post.visible_text().contains("Gestió de Dades Optimitzada"));
        }

        #[tokio::test]
        async fn test_inflight_schedule_then_idle() {
            let driver = FakeDriver::new(two_page_site()).with_inflight_schedule([2, 1]);
            assert_eq!(driver.in_flight_requests().await.unwrap(), 2);
            assert_eq!(driver.in_flight_requests().await.unwrap(), 1);
            assert_eq!(driver.in_flight_requests().await.unwrap(), 0);
        }

        #[tokio::test]
        async fn test_always_busy_never_idles() {
            let driver = FakeDriver::new(two_page_site()).with_always_busy();
            for _ in 0..5 {
                assert_eq!(driver.in_flight_requests().await.unwrap(), 1);
            }
        }

        #[tokio::test]
        async fn test_screenshot_is_valid_png() {
            let mut driver = FakeDriver::new(two_page_site()).with_viewport(8, 8);
            driver.navigate("http://localhost:3004/ca/blog").await.unwrap();
            let shot = driver.screenshot().await.unwrap();
            assert!(shot.is_valid());
            // PNG signature
            assert_eq!(&shot.data[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
        }

        #[tokio::test]
        async fn test_operations_fail_after_close() {
            let mut driver = FakeDriver::new(two_page_site());
            driver.navigate("http://localhost:3004/ca/blog").await.unwrap();
            driver.close().await.unwrap();
            assert!(driver.dom_snapshot().await.is_err());
            assert!(driver.navigate("http://localhost:3004/ca/blog").await.is_err());
        }
    }
}
