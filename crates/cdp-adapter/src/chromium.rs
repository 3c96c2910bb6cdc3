use std::sync::Arc;
use std::time::Duration;

use action_primitives::{PointerEvent, PointerEventKind};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams as NetworkEnableParams, EventLoadingFailed, EventResponseReceived,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, EventFrameStartedLoading, EventLoadEventFired,
};
use chromiumoxide::cdp::js_protocol::runtime::{
    ConsoleApiCalledType, EventConsoleApiCalled, EventExceptionThrown, RemoteObject,
};
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{resolve_chrome_path, CdpConfig};
use crate::error::CdpAdapterError;
use crate::transport::{DocumentState, PageDriver, PageFactory};

/// Owns the Chromium process and its protocol handler task.
pub struct ChromiumLauncher {
    browser: Mutex<Browser>,
    handler_task: JoinHandle<()>,
}

impl ChromiumLauncher {
    pub async fn launch(cfg: &CdpConfig) -> Result<Self, CdpAdapterError> {
        let mut builder = BrowserConfig::builder()
            .user_data_dir(&cfg.user_data_dir)
            .window_size(cfg.window_width, cfg.window_height)
            .request_timeout(Duration::from_millis(cfg.default_deadline_ms));
        if let Some(path) = resolve_chrome_path(cfg) {
            builder = builder.chrome_executable(path);
        }
        if !cfg.headless {
            builder = builder.with_head();
        }
        if cfg.no_sandbox {
            builder = builder.no_sandbox();
        }
        let config = builder.build().map_err(CdpAdapterError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| CdpAdapterError::Launch(err.to_string()))?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(target: "cdp-adapter", %err, "handler stream ended");
                    break;
                }
            }
        });
        info!(headless = cfg.headless, "chromium launched");

        Ok(Self {
            browser: Mutex::new(browser),
            handler_task,
        })
    }

    pub async fn close(&self) {
        let mut browser = self.browser.lock().await;
        if let Err(err) = browser.close().await {
            warn!(%err, "failed to close chromium cleanly");
        }
        self.handler_task.abort();
    }
}

impl Drop for ChromiumLauncher {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

#[async_trait]
impl PageFactory for ChromiumLauncher {
    async fn open_page(
        &self,
        url: &str,
        state: Arc<DocumentState>,
    ) -> Result<Arc<dyn PageDriver>, CdpAdapterError> {
        let page = {
            let browser = self.browser.lock().await;
            browser.new_page("about:blank").await?
        };
        page.execute(NetworkEnableParams::default()).await?;
        let listeners = spawn_listeners(&page, state.clone()).await?;

        state.on_navigation_started();
        page.goto(url).await?;
        // goto resolves after the load lifecycle; the event may already be consumed.
        state.on_load_complete();

        Ok(Arc::new(ChromiumPage { page, listeners }))
    }
}

async fn spawn_listeners(
    page: &Page,
    state: Arc<DocumentState>,
) -> Result<Vec<JoinHandle<()>>, CdpAdapterError> {
    let mut started = page.event_listener::<EventFrameStartedLoading>().await?;
    let mut loaded = page.event_listener::<EventLoadEventFired>().await?;
    let mut console = page.event_listener::<EventConsoleApiCalled>().await?;
    let mut exceptions = page.event_listener::<EventExceptionThrown>().await?;
    let mut failures = page.event_listener::<EventLoadingFailed>().await?;
    let mut responses = page.event_listener::<EventResponseReceived>().await?;

    let lifecycle_state = state.clone();
    let lifecycle = tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(_) = started.next() => lifecycle_state.on_navigation_started(),
                Some(_) = loaded.next() => lifecycle_state.on_load_complete(),
                else => break,
            }
        }
    });

    let console_state = state.clone();
    let console_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(event) = console.next() => {
                    if event.r#type == ConsoleApiCalledType::Error {
                        console_state.push_console_error(console_message(&event.args));
                    }
                }
                Some(event) = exceptions.next() => {
                    let details = &event.exception_details;
                    let message = details
                        .exception
                        .as_ref()
                        .and_then(|obj| obj.description.clone())
                        .unwrap_or_else(|| details.text.clone());
                    console_state.push_console_error(message);
                }
                else => break,
            }
        }
    });

    let network_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(event) = failures.next() => {
                    if event.canceled != Some(true) {
                        state.push_network_error(format!("{} ({:?})", event.error_text, event.r#type));
                    }
                }
                Some(event) = responses.next() => {
                    let response = &event.response;
                    if response.status >= 400 {
                        state.push_network_error(format!("{} {}", response.status, response.url));
                    }
                }
                else => break,
            }
        }
    });

    Ok(vec![lifecycle, console_task, network_task])
}

fn console_message(args: &[RemoteObject]) -> String {
    args.iter()
        .map(|arg| match (&arg.value, &arg.description) {
            (Some(Value::String(text)), _) => text.clone(),
            (Some(value), _) => value.to_string(),
            (None, Some(description)) => description.clone(),
            (None, None) => String::new(),
        })
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

struct ChromiumPage {
    page: Page,
    listeners: Vec<JoinHandle<()>>,
}

#[async_trait]
impl PageDriver for ChromiumPage {
    async fn evaluate(&self, script: &str) -> Result<Value, CdpAdapterError> {
        let result = self.page.evaluate(script).await?;
        result
            .into_value::<Value>()
            .map_err(|err| CdpAdapterError::Script(err.to_string()))
    }

    async fn dispatch_mouse(&self, event: &PointerEvent) -> Result<(), CdpAdapterError> {
        let kind = match event.kind {
            PointerEventKind::Move => DispatchMouseEventType::MouseMoved,
            PointerEventKind::Press => DispatchMouseEventType::MousePressed,
            PointerEventKind::Release => DispatchMouseEventType::MouseReleased,
        };
        let mut builder = DispatchMouseEventParams::builder()
            .r#type(kind)
            .x(event.x)
            .y(event.y);
        if event.kind != PointerEventKind::Move {
            builder = builder.button(MouseButton::Left).buttons(1).click_count(1);
        }
        let params = builder.build().map_err(CdpAdapterError::InvalidParams)?;
        self.page.execute(params).await?;
        Ok(())
    }

    async fn capture_png(&self) -> Result<Vec<u8>, CdpAdapterError> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        Ok(self.page.screenshot(params).await?)
    }

    async fn close(&self) -> Result<(), CdpAdapterError> {
        for listener in &self.listeners {
            listener.abort();
        }
        self.page.clone().close().await?;
        Ok(())
    }
}
