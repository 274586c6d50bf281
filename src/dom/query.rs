use crate::errors::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Lifecycle stage of the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Loading,
    Interactive,
    Complete,
}

impl DocumentState {
    pub fn from_ready_state(state: &str) -> Self {
        match state {
            "loading" => DocumentState::Loading,
            "interactive" => DocumentState::Interactive,
            _ => DocumentState::Complete,
        }
    }
}

/// Address of one matched element: the selector it was found under plus its
/// position among the matches. Valid as long as the host page keeps
/// rendering the same list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef {
    pub selector: String,
    pub index: usize,
}

/// Read-only view of one matched element at query time.
#[derive(Debug, Clone)]
pub struct ElementSnapshot {
    pub element: ElementRef,
    pub text: String,
    pub classes: Vec<String>,
}

impl ElementSnapshot {
    pub fn text_trimmed(&self) -> &str {
        self.text.trim()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// Element-query capability exposed by the host page.
///
/// The crate only consumes this surface; the live implementation delegates
/// to the page's own query runtime ([`crate::browser::ChromePage`]), tests
/// use [`crate::testing::ScriptedPage`].
#[async_trait]
pub trait PageQuery: Send + Sync {
    /// All elements currently matching `selector`, in document order.
    async fn select(&self, selector: &str) -> Result<Vec<ElementSnapshot>>;

    /// Trigger a synthetic click on a previously matched element.
    async fn click(&self, element: &ElementRef) -> Result<()>;

    /// Read the data bag attached to a matched element under `key`.
    async fn read_data(&self, element: &ElementRef, key: &str) -> Result<Option<Value>>;

    /// Merge `value` into the data bag attached to a matched element under
    /// `key`, keeping any reference the host page already holds to it.
    async fn write_data(&self, element: &ElementRef, key: &str, value: Value) -> Result<()>;
}

/// What the bootstrapper sees of the page before the query capability is up.
#[async_trait]
pub trait PageHost: Send + Sync {
    /// The page's query capability, or `None` while its script runtime is
    /// still loading.
    async fn query_engine(&self) -> Option<Arc<dyn PageQuery>>;

    async fn document_state(&self) -> DocumentState;
}
