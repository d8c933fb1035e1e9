//! Asset loading as pollable handles.
//!
//! A loader hands back an `AssetHandle` right away. The frame loop polls
//! it every tick and binds the owning entity the first time it reports
//! `Ready`. Loads are never cancelled and never time out.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::AssetError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Model,
    Texture,
}

/// What a completed load delivers. Decoding is the renderer's business;
/// the simulation only needs to know the load finished.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualPayload {
    pub uri: String,
    pub kind: AssetKind,
    pub byte_len: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Pending,
    Ready(VisualPayload),
    Failed(AssetError),
}

#[derive(Debug, Clone)]
pub struct AssetHandle {
    uri: String,
    state: Rc<RefCell<LoadState>>,
}

impl AssetHandle {
    pub fn pending(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            state: Rc::new(RefCell::new(LoadState::Pending)),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn poll(&self) -> LoadState {
        self.state.borrow().clone()
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.state.borrow(), LoadState::Pending)
    }

    /// First completion wins; later calls are ignored.
    pub fn resolve(&self, payload: VisualPayload) {
        self.settle(LoadState::Ready(payload));
    }

    pub fn fail(&self, err: AssetError) {
        self.settle(LoadState::Failed(err));
    }

    fn settle(&self, outcome: LoadState) {
        let mut state = self.state.borrow_mut();
        if matches!(*state, LoadState::Pending) {
            *state = outcome;
        }
    }
}

pub trait AssetLoader {
    fn load(&mut self, uri: &str, kind: AssetKind) -> AssetHandle;
}

struct ManualEntry {
    handle: AssetHandle,
    kind: AssetKind,
    frames_left: Option<u32>,
}

/// Loader whose completions are driven by the caller: either explicitly
/// (`resolve_all`, `fail`) or after a fixed number of `advance_frame` calls.
#[derive(Default)]
pub struct ManualLoader {
    entries: Vec<ManualEntry>,
    latency_frames: Option<u32>,
}

impl ManualLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every load resolves on the `frames`-th `advance_frame` after it was issued.
    pub fn with_latency(frames: u32) -> Self {
        Self {
            entries: Vec::new(),
            latency_frames: Some(frames),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.entries.iter().filter(|e| e.handle.is_pending()).count()
    }

    pub fn advance_frame(&mut self) {
        for entry in &mut self.entries {
            if let Some(frames) = entry.frames_left.as_mut() {
                *frames = frames.saturating_sub(1);
                if *frames == 0 {
                    entry.frames_left = None;
                    entry.handle.resolve(payload_for(&entry.handle, entry.kind));
                }
            }
        }
    }

    pub fn resolve_all(&mut self) {
        for entry in &mut self.entries {
            entry.frames_left = None;
            entry.handle.resolve(payload_for(&entry.handle, entry.kind));
        }
    }

    pub fn fail(&mut self, uri: &str, err: AssetError) {
        for entry in self.entries.iter_mut().filter(|e| e.handle.uri() == uri) {
            entry.frames_left = None;
            entry.handle.fail(err.clone());
        }
    }
}

impl AssetLoader for ManualLoader {
    fn load(&mut self, uri: &str, kind: AssetKind) -> AssetHandle {
        let handle = AssetHandle::pending(uri);
        self.entries.push(ManualEntry {
            handle: handle.clone(),
            kind,
            frames_left: self.latency_frames.map(|f| f.max(1)),
        });
        handle
    }
}

fn payload_for(handle: &AssetHandle, kind: AssetKind) -> VisualPayload {
    VisualPayload {
        uri: handle.uri().to_string(),
        kind,
        byte_len: 0,
    }
}

#[cfg(target_arch = "wasm32")]
pub use fetch::FetchLoader;

#[cfg(target_arch = "wasm32")]
mod fetch {
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Response, Window};

    use super::{AssetHandle, AssetKind, AssetLoader, VisualPayload};
    use crate::error::AssetError;

    /// Browser loader: issues a `fetch` and settles the handle from a local task.
    pub struct FetchLoader {
        window: Window,
    }

    impl FetchLoader {
        pub fn new(window: Window) -> Self {
            Self { window }
        }
    }

    impl AssetLoader for FetchLoader {
        fn load(&mut self, uri: &str, kind: AssetKind) -> AssetHandle {
            let handle = AssetHandle::pending(uri);
            let task_handle = handle.clone();
            let request = self.window.fetch_with_str(uri);
            let uri = uri.to_string();

            wasm_bindgen_futures::spawn_local(async move {
                match fetch_len(request, &uri).await {
                    Ok(byte_len) => task_handle.resolve(VisualPayload { uri, kind, byte_len }),
                    Err(err) => task_handle.fail(err),
                }
            });
            handle
        }
    }

    async fn fetch_len(request: js_sys::Promise, uri: &str) -> Result<usize, AssetError> {
        let response: Response = JsFuture::from(request)
            .await
            .and_then(|value| value.dyn_into())
            .map_err(|e| fetch_error(uri, e))?;
        if !response.ok() {
            return Err(AssetError::Status {
                uri: uri.to_string(),
                status: response.status(),
            });
        }
        let body = response.array_buffer().map_err(|e| fetch_error(uri, e))?;
        let buffer: js_sys::ArrayBuffer = JsFuture::from(body)
            .await
            .and_then(|value| value.dyn_into())
            .map_err(|e| fetch_error(uri, e))?;
        Ok(buffer.byte_length() as usize)
    }

    fn fetch_error(uri: &str, err: JsValue) -> AssetError {
        AssetError::Fetch {
            uri: uri.to_string(),
            reason: format!("{err:?}"),
        }
    }
}
