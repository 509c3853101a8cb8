//! PDF rendering through a headless Chromium browser.
//!
//! The browser is an external collaborator reached over the DevTools
//! protocol via `chromiumoxide`. One browser process is launched lazily on
//! the first render and shared for the lifetime of the engine; every render
//! call gets its own isolated page, which is closed again whether the
//! print succeeded or not.
//!
//! ## Data Flow
//!
//! ```text
//! HtmlDocument ──▶ new page ──▶ set_content ──▶ printToPDF ──▶ Vec<u8>
//!                  (per call)    (wait for        (layout
//!                                 resources)       params)
//! ```
//!
//! Every call is bounded by [`PageLayoutOptions::render_timeout_secs`]; an
//! unresponsive browser turns into a [`DocPressError::Render`] instead of a
//! hung request.

use std::future::Future;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::DocPressError;
use crate::options::{css_length_to_inches, PageLayoutOptions};

/// Something that can turn an HTML document into PDF bytes.
///
/// The library is written against this trait so tests can substitute a
/// fake engine and skip the browser entirely.
pub trait RenderEngine: Send + Sync {
    /// Render a complete HTML document to PDF.
    fn render(
        &self,
        html: &str,
        layout: &PageLayoutOptions,
    ) -> impl Future<Output = Result<Vec<u8>, DocPressError>> + Send;

    /// Release any held resources. Idempotent.
    fn shutdown(&self) -> impl Future<Output = ()> + Send;
}

struct BrowserHandle {
    browser: Browser,
    event_loop: JoinHandle<()>,
}

/// [`RenderEngine`] backed by a shared headless Chromium process.
///
/// Requires Chrome or Chromium on the host. Dropping the engine without
/// calling [`RenderEngine::shutdown`] leaves process cleanup to the OS;
/// long-lived callers (the HTTP server, the CLI) shut it down explicitly.
#[derive(Default)]
pub struct ChromiumEngine {
    handle: Mutex<Option<BrowserHandle>>,
}

impl ChromiumEngine {
    pub fn new() -> Self {
        Self::default()
    }

    async fn launch() -> Result<BrowserHandle, DocPressError> {
        let config = BrowserConfig::builder()
            .args([
                "--disable-gpu",
                "--disable-dev-shm-usage",
                "--disable-extensions",
                "--disable-background-networking",
                "--no-first-run",
                "--hide-scrollbars",
            ])
            .build()
            .map_err(|e| DocPressError::Render {
                detail: format!("browser configuration failed: {e}"),
            })?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            DocPressError::Render {
                detail: format!("failed to launch browser: {e}"),
            }
        })?;

        // Drive CDP events until the browser goes away.
        let event_loop = tokio::spawn(async move { while handler.next().await.is_some() {} });

        info!("Launched headless browser");
        Ok(BrowserHandle {
            browser,
            event_loop,
        })
    }

    /// Open a fresh page on the shared browser, launching it first if this
    /// is the first render. The lock is held only while the page is opened.
    async fn open_page(&self) -> Result<Page, DocPressError> {
        let mut guard = self.handle.lock().await;
        if guard.is_none() {
            *guard = Some(Self::launch().await?);
        }
        let handle = guard.as_ref().ok_or_else(|| {
            DocPressError::Internal("browser handle vanished under lock".to_string())
        })?;
        handle
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| DocPressError::Render {
                detail: format!("failed to open page: {e}"),
            })
    }

    async fn print_page(
        page: &Page,
        html: &str,
        layout: &PageLayoutOptions,
    ) -> Result<Vec<u8>, DocPressError> {
        page.set_content(html).await.map_err(|e| DocPressError::Render {
            detail: format!("failed to load document: {e}"),
        })?;
        page.wait_for_navigation()
            .await
            .map_err(|e| DocPressError::Render {
                detail: format!("document did not settle: {e}"),
            })?;

        let bytes = page
            .pdf(print_params(layout))
            .await
            .map_err(|e| DocPressError::Render {
                detail: format!("printToPDF failed: {e}"),
            })?;
        debug!(bytes = bytes.len(), "Printed PDF");
        Ok(bytes)
    }
}

impl RenderEngine for ChromiumEngine {
    async fn render(
        &self,
        html: &str,
        layout: &PageLayoutOptions,
    ) -> Result<Vec<u8>, DocPressError> {
        let budget = Duration::from_secs(layout.render_timeout_secs);

        // The browser handle is stored under the lock before any page call,
        // so a timeout here can only drop an unfinished launch.
        let page = bounded(budget, self.open_page()).await?;

        let result = bounded(budget, Self::print_page(&page, html, layout)).await;
        // The page handle lives outside the timed future: close it on
        // success, failure, and timeout alike. A leaked page stays alive
        // inside the shared browser.
        if let Err(e) = page.close().await {
            warn!("Failed to close page: {e}");
        }
        result
    }

    async fn shutdown(&self) {
        let handle = self.handle.lock().await.take();
        if let Some(mut handle) = handle {
            if let Err(e) = handle.browser.close().await {
                warn!("Failed to close browser: {e}");
            }
            if let Err(e) = handle.browser.wait().await {
                warn!("Browser did not exit cleanly: {e}");
            }
            handle.event_loop.abort();
            info!("Shut down headless browser");
        }
    }
}

/// Run one render phase under the per-render budget, mapping an elapsed
/// timer onto [`DocPressError::Render`].
async fn bounded<T>(
    budget: Duration,
    work: impl Future<Output = Result<T, DocPressError>>,
) -> Result<T, DocPressError> {
    match tokio::time::timeout(budget, work).await {
        Ok(result) => result,
        Err(_) => Err(DocPressError::Render {
            detail: format!("render timed out after {}s", budget.as_secs()),
        }),
    }
}

/// Map layout options onto the DevTools `Page.printToPDF` parameters.
/// Margins fall back to the browser default when a length fails to parse;
/// validated options never hit that path.
fn print_params(layout: &PageLayoutOptions) -> PrintToPdfParams {
    let (paper_width, paper_height) = layout.page_format.dimensions_in();
    let has_chrome = layout.header_template.is_some() || layout.footer_template.is_some();

    PrintToPdfParams {
        print_background: Some(layout.print_background),
        prefer_css_page_size: Some(layout.prefer_css_page_size),
        paper_width: Some(paper_width),
        paper_height: Some(paper_height),
        margin_top: css_length_to_inches(&layout.margins.top),
        margin_bottom: css_length_to_inches(&layout.margins.bottom),
        margin_left: css_length_to_inches(&layout.margins.left),
        margin_right: css_length_to_inches(&layout.margins.right),
        display_header_footer: Some(has_chrome),
        header_template: layout.header_template.clone(),
        footer_template: layout.footer_template.clone(),
        ..Default::default()
    }
}
