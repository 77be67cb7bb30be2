//! Tramline Web
//!
//! `BrowserWindow` implements the history `Window` seam over the real
//! browser through `web-sys`. Only built for `wasm32`.

#[cfg(target_arch = "wasm32")]
mod browser;
#[cfg(target_arch = "wasm32")]
mod convert;

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserWindow;
