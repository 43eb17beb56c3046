//! Real browser control via the Chrome DevTools Protocol.
//!
//! Available with the `browser` feature. Uses chromiumoxide for CDP access;
//! the DOM snapshot and click operations run injected JavaScript so that the
//! locator abstraction stays independent of CDP selector semantics.

use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::page::Page;
use futures::StreamExt;

use crate::dom::DomNode;
use crate::driver::{DriverConfig, ElementHandle, PageDriver, Screenshot};
use crate::result::{VerificarError, VerificarResult};

/// Wraps fetch and XHR to keep an in-flight request counter on the page.
///
/// Installed before page scripts run. Requests issued by the initial
/// document load itself (images, stylesheets) are not counted; the counter
/// covers the dynamic activity the network-idle wait cares about.
const INSTRUMENT_JS: &str = r"
(() => {
    if (window.__verificar_instrumented) { return; }
    window.__verificar_instrumented = true;
    window.__verificar_inflight = 0;
    const origFetch = window.fetch;
    window.fetch = function (...args) {
        window.__verificar_inflight += 1;
        return origFetch.apply(this, args).finally(() => {
            window.__verificar_inflight -= 1;
        });
    };
    const origSend = XMLHttpRequest.prototype.send;
    XMLHttpRequest.prototype.send = function (...args) {
        window.__verificar_inflight += 1;
        this.addEventListener('loadend', () => {
            window.__verificar_inflight -= 1;
        });
        return origSend.apply(this, args);
    };
})();
";

/// Builds a `DomNode` tree from the live document, body-rooted, in the same
/// pre-order the locator uses for element indices.
const SNAPSHOT_JS: &str = r"
(() => {
    const isHidden = (el) => {
        const style = window.getComputedStyle(el);
        return style.display === 'none'
            || style.visibility === 'hidden'
            || el.hidden === true;
    };
    const build = (el) => ({
        tag: el.tagName.toLowerCase(),
        attributes: Array.from(el.attributes).map((a) => [a.name, a.value]),
        text: Array.from(el.childNodes)
            .filter((n) => n.nodeType === Node.TEXT_NODE)
            .map((n) => n.textContent)
            .join(''),
        children: Array.from(el.children).map(build),
        hidden: isHidden(el),
    });
    return build(document.body);
})()
";

/// `PageDriver` backed by a headless chromium instance
#[derive(Debug)]
pub struct ChromiumDriver {
    config: DriverConfig,
    browser: Browser,
    page: Page,
    handle: tokio::task::JoinHandle<()>,
}

impl ChromiumDriver {
    /// Launch chromium and open a blank page.
    ///
    /// # Errors
    ///
    /// Returns `Driver` if the browser cannot be launched.
    pub async fn launch(config: DriverConfig) -> VerificarResult<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(config.viewport_width, config.viewport_height);

        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.executable_path {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder.build().map_err(|message| VerificarError::Driver {
            message,
        })?;

        let (browser, mut handler) =
            Browser::launch(cdp_config)
                .await
                .map_err(|e| VerificarError::Driver {
                    message: e.to_string(),
                })?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page =
            browser
                .new_page("about:blank")
                .await
                .map_err(|e| VerificarError::Driver {
                    message: e.to_string(),
                })?;

        if let Some(ref ua) = config.user_agent {
            page.set_user_agent(ua.as_str())
                .await
                .map_err(|e| VerificarError::Driver {
                    message: e.to_string(),
                })?;
        }

        let instrument = AddScriptToEvaluateOnNewDocumentParams::builder()
            .source(INSTRUMENT_JS)
            .build()
            .map_err(|message| VerificarError::Driver { message })?;
        page.execute(instrument)
            .await
            .map_err(|e| VerificarError::Driver {
                message: e.to_string(),
            })?;

        Ok(Self {
            config,
            browser,
            page,
            handle,
        })
    }

    /// Get the driver configuration
    #[must_use]
    pub const fn config(&self) -> &DriverConfig {
        &self.config
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn navigate(&mut self, url: &str) -> VerificarResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| VerificarError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn dom_snapshot(&self) -> VerificarResult<DomNode> {
        let result =
            self.page
                .evaluate(SNAPSHOT_JS)
                .await
                .map_err(|e| VerificarError::Driver {
                    message: e.to_string(),
                })?;
        result.into_value().map_err(|e| VerificarError::Driver {
            message: format!("snapshot decode: {e}"),
        })
    }

    async fn click(&mut self, handle: &ElementHandle) -> VerificarResult<()> {
        // Re-walk the document in snapshot pre-order and click by index.
        let script = format!(
            r"
            ((idx) => {{
                const flat = [];
                const walk = (el) => {{
                    flat.push(el);
                    for (const child of el.children) {{ walk(child); }}
                }};
                walk(document.body);
                const el = flat[idx];
                if (!el) {{ return false; }}
                el.click();
                return true;
            }})({id})
            ",
            id = handle.id
        );
        let clicked: bool = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| VerificarError::Driver {
                message: e.to_string(),
            })?
            .into_value()
            .map_err(|e| VerificarError::Driver {
                message: e.to_string(),
            })?;
        if clicked {
            Ok(())
        } else {
            Err(VerificarError::Driver {
                message: format!("stale element index {} ({})", handle.id, handle.tag),
            })
        }
    }

    async fn in_flight_requests(&self) -> VerificarResult<usize> {
        let count: u64 = self
            .page
            .evaluate("window.__verificar_inflight || 0")
            .await
            .map_err(|e| VerificarError::Driver {
                message: e.to_string(),
            })?
            .into_value()
            .map_err(|e| VerificarError::Driver {
                message: e.to_string(),
            })?;
        Ok(count as usize)
    }

    async fn screenshot(&self) -> VerificarResult<Screenshot> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let captured =
            self.page
                .execute(params)
                .await
                .map_err(|e| VerificarError::Screenshot {
                    message: e.to_string(),
                })?;
        let data = base64::engine::general_purpose::STANDARD
            .decode(&captured.data)
            .map_err(|e| VerificarError::Screenshot {
                message: e.to_string(),
            })?;
        Ok(Screenshot::new(
            data,
            self.config.viewport_width,
            self.config.viewport_height,
        ))
    }

    async fn current_url(&self) -> VerificarResult<String> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| VerificarError::Driver {
                message: e.to_string(),
            })?;
        url.ok_or_else(|| VerificarError::Driver {
            message: "page has no URL".to_string(),
        })
    }

    async fn close(&mut self) -> VerificarResult<()> {
        self.browser
            .close()
            .await
            .map_err(|e| VerificarError::Driver {
                message: e.to_string(),
            })?;
        self.handle.abort();
        Ok(())
    }
}
