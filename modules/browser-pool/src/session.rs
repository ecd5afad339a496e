// One isolated page on a leased worker. The page closes on `close()` or,
// failing that, on drop.

use std::time::Duration;

use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tracing::warn;

use crate::error::{PoolError, Result};
use crate::USER_AGENT;

/// Quiet window that counts as network idle: no request started, finished,
/// or failed on the page for this long after the load event.
const NETWORK_IDLE_WINDOW: Duration = Duration::from_millis(500);

pub struct BrowserSession {
    page: Option<Page>,
}

impl BrowserSession {
    pub(crate) async fn open(browser: &Browser) -> Result<Self> {
        let page = browser.new_page("about:blank").await?;
        page.set_user_agent(USER_AGENT).await?;
        Ok(Self { page: Some(page) })
    }

    fn page(&self) -> &Page {
        self.page.as_ref().expect("session holds a page until close")
    }

    /// Navigate and wait until the network goes idle, bounded by `timeout`.
    ///
    /// Idle means the load event has fired and no network activity was seen
    /// for [`NETWORK_IDLE_WINDOW`]. The listeners attach before navigation so
    /// requests fired during the load are counted.
    pub async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, async {
            let page = self.page();
            let mut requests_started = page.event_listener::<EventRequestWillBeSent>().await?;
            let mut requests_finished = page.event_listener::<EventLoadingFinished>().await?;
            let mut requests_failed = page.event_listener::<EventLoadingFailed>().await?;

            page.goto(url).await?;
            page.wait_for_navigation().await?;

            loop {
                tokio::select! {
                    Some(_) = requests_started.next() => {}
                    Some(_) = requests_finished.next() => {}
                    Some(_) = requests_failed.next() => {}
                    _ = tokio::time::sleep(NETWORK_IDLE_WINDOW) => break,
                }
            }
            Ok::<(), PoolError>(())
        })
        .await
        .map_err(|_| PoolError::NavigationTimeout(timeout))?
    }

    /// Evaluate a JS expression on the page and return its string result.
    pub async fn evaluate_string(&self, expression: &str) -> Result<String> {
        let result = self.page().evaluate(expression).await?;
        result
            .into_value::<String>()
            .map_err(|e| PoolError::Other(anyhow::anyhow!("evaluation result: {e}")))
    }

    pub async fn title(&self) -> Result<Option<String>> {
        Ok(self.page().get_title().await?)
    }

    /// Close the page explicitly. Preferred over relying on drop, which can
    /// only close it out-of-band.
    pub async fn close(mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                warn!(error = %e, "Failed to close browser page");
            }
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    let _ = page.close().await;
                });
            }
        }
    }
}
