//! Chromium DevTools backend for the webprobe action primitives.
//!
//! [`ChromiumSession`] implements `Navigator`, `Extractor`, `InputInjector`
//! and `VisualCapture` on top of chromiumoxide. Trusted input goes through
//! `Input.dispatchMouseEvent`, snapshots through `Page.captureScreenshot`,
//! and load completion is signalled from `Page.loadEventFired` instead of
//! polling `document.readyState`.

mod chromium;
pub mod config;
pub mod error;
pub mod metrics;
pub mod scripts;
mod session;
pub mod transport;

pub use chromium::ChromiumLauncher;
pub use config::{detect_chrome_executable, CdpConfig};
pub use error::CdpAdapterError;
pub use metrics::AdapterMetricsSnapshot;
pub use session::ChromiumSession;
pub use transport::{DocumentState, PageDriver, PageFactory};
