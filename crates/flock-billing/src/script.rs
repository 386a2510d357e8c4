//! Checkout Script Loader
//!
//! The provider's inline script is a page-wide singleton. The loader injects
//! it at most once; callers that arrive while the load is in flight await the
//! same attempt instead of adding a second `<script>` tag.

use std::cell::Cell;
use std::rc::Rc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::error::{CheckoutError, Result};
use crate::state::ScriptLoadState;

/// Injects a script resource and resolves on its load or error event
#[async_trait(?Send)]
pub trait ScriptInjector {
    async fn inject(&self, src: &str) -> Result<()>;
}

pub struct ScriptLoader {
    injector: Rc<dyn ScriptInjector>,
    src: String,
    state: Cell<ScriptLoadState>,
    loaded: OnceCell<ScriptLoadState>,
}

impl ScriptLoader {
    pub fn new(injector: Rc<dyn ScriptInjector>, src: impl Into<String>) -> Self {
        Self {
            injector,
            src: src.into(),
            state: Cell::new(ScriptLoadState::NotLoaded),
            loaded: OnceCell::new(),
        }
    }

    pub fn state(&self) -> ScriptLoadState {
        self.state.get()
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    /// Make sure the script is loaded, injecting it on first use.
    ///
    /// The outcome of the first attempt is final for the page lifetime.
    pub async fn ensure_loaded(&self) -> Result<()> {
        let state = *self
            .loaded
            .get_or_init(|| async {
                self.state.set(ScriptLoadState::Loading);
                tracing::debug!(src = %self.src, "Injecting checkout script");

                let state = match self.injector.inject(&self.src).await {
                    Ok(()) => {
                        tracing::info!(src = %self.src, "Checkout script ready");
                        ScriptLoadState::Ready
                    }
                    Err(e) => {
                        tracing::error!(src = %self.src, error = %e, "Checkout script failed to load");
                        ScriptLoadState::FailedToLoad
                    }
                };
                self.state.set(state);
                state
            })
            .await;

        match state {
            ScriptLoadState::Ready => Ok(()),
            _ => Err(CheckoutError::ScriptLoad(format!("could not load {}", self.src))),
        }
    }

    /// Non-blocking precondition check used right before a purchase
    pub fn require_ready(&self) -> Result<()> {
        match self.state() {
            ScriptLoadState::Ready => Ok(()),
            ScriptLoadState::FailedToLoad => {
                Err(CheckoutError::ScriptLoad(format!("could not load {}", self.src)))
            }
            ScriptLoadState::NotLoaded | ScriptLoadState::Loading => {
                Err(CheckoutError::ScriptLoading)
            }
        }
    }
}
