//! In-memory page double for exercising the adjustment flow without a
//! browser. Scripted per test: which widgets exist, how the player reacts
//! to clicks, and which queries fail outright.

use crate::dom::{DocumentState, ElementRef, ElementSnapshot, PageHost, PageQuery};
use crate::errors::{PilotError, Result};
use crate::player;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

struct QualityEntry {
    label: String,
    bags: HashMap<String, Value>,
}

struct PendingSwitch {
    label: String,
    remaining: u32,
}

struct PageState {
    qualities: Vec<QualityEntry>,
    current: Option<String>,
    pending: Option<PendingSwitch>,
    /// `CURRENT_QUALITY` reads a click takes to show up; `None` never shows.
    switch_latency: Option<u32>,
    theater_present: bool,
    theater_active: bool,
    theater_clicks: usize,
    data_writes: usize,
    quality_clicks: Vec<usize>,
    failing: HashSet<String>,
    select_counts: HashMap<String, usize>,
    engine_delay: u32,
    engine_probes: usize,
    loading_polls: u32,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            qualities: Vec::new(),
            current: Some(String::new()),
            pending: None,
            switch_latency: Some(1),
            theater_present: true,
            theater_active: false,
            theater_clicks: 0,
            data_writes: 0,
            quality_clicks: Vec::new(),
            failing: HashSet::new(),
            select_counts: HashMap::new(),
            engine_delay: 0,
            engine_probes: 0,
            loading_polls: 0,
        }
    }
}

/// A scripted page. Cloning shares the underlying state, so a clone handed
/// to the code under test and the original used for assertions see the same
/// page.
#[derive(Clone, Default)]
pub struct ScriptedPage {
    inner: Arc<Mutex<PageState>>,
}

impl ScriptedPage {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut PageState) -> T) -> T {
        f(&mut self.inner.lock().unwrap())
    }

    /// Add a quality entry carrying a `{"status": ...}` data bag.
    pub fn with_quality(self, label: &str, status: i64) -> Self {
        self.with(|st| {
            st.qualities.push(QualityEntry {
                label: label.to_string(),
                bags: HashMap::from([("data".to_string(), json!({ "status": status }))]),
            })
        });
        self
    }

    /// Add a quality entry with no attached data at all.
    pub fn with_plain_quality(self, label: &str) -> Self {
        self.with(|st| {
            st.qualities.push(QualityEntry {
                label: label.to_string(),
                bags: HashMap::new(),
            })
        });
        self
    }

    pub fn with_current_quality(self, label: &str) -> Self {
        self.with(|st| st.current = Some(label.to_string()));
        self
    }

    pub fn without_current_indicator(self) -> Self {
        self.with(|st| st.current = None);
        self
    }

    /// Clicked switches never reach the active-quality indicator.
    pub fn with_unconfirmable_switch(self) -> Self {
        self.with(|st| st.switch_latency = None);
        self
    }

    pub fn with_theater_active(self) -> Self {
        self.with(|st| st.theater_active = true);
        self
    }

    pub fn without_theater_button(self) -> Self {
        self.with(|st| st.theater_present = false);
        self
    }

    /// Queries for `selector` fail with a scripted error.
    pub fn with_failing_selector(self, selector: &str) -> Self {
        self.with(|st| st.failing.insert(selector.to_string()));
        self
    }

    /// The query engine only turns up after `polls` probes.
    pub fn with_engine_delay(self, polls: u32) -> Self {
        self.with(|st| st.engine_delay = polls);
        self
    }

    /// The document reports `Loading` for the first `polls` checks.
    pub fn with_document_loading(self, polls: u32) -> Self {
        self.with(|st| st.loading_polls = polls);
        self
    }

    pub fn quality_status(&self, label: &str) -> Option<i64> {
        self.with(|st| {
            st.qualities
                .iter()
                .find(|q| q.label == label)
                .and_then(|q| q.bags.get("data"))
                .and_then(|bag| bag.get("status"))
                .and_then(Value::as_i64)
        })
    }

    pub fn current_quality(&self) -> String {
        self.with(|st| st.current.clone().unwrap_or_default())
    }

    /// Labels of the quality entries clicked, in order.
    pub fn clicked_labels(&self) -> Vec<String> {
        self.with(|st| {
            st.quality_clicks
                .iter()
                .filter_map(|&i| st.qualities.get(i).map(|q| q.label.clone()))
                .collect()
        })
    }

    pub fn theater_active(&self) -> bool {
        self.with(|st| st.theater_active)
    }

    pub fn theater_clicks(&self) -> usize {
        self.with(|st| st.theater_clicks)
    }

    pub fn data_writes(&self) -> usize {
        self.with(|st| st.data_writes)
    }

    pub fn select_count(&self, selector: &str) -> usize {
        self.with(|st| st.select_counts.get(selector).copied().unwrap_or(0))
    }

    pub fn engine_probes(&self) -> usize {
        self.with(|st| st.engine_probes)
    }
}

#[async_trait]
impl PageQuery for ScriptedPage {
    async fn select(&self, selector: &str) -> Result<Vec<ElementSnapshot>> {
        self.with(|st| {
            *st.select_counts.entry(selector.to_string()).or_insert(0) += 1;
            if st.failing.contains(selector) {
                return Err(PilotError::JavaScriptFailed(format!(
                    "scripted failure for {selector}"
                )));
            }

            let snapshot = |index: usize, text: &str, classes: Vec<String>| ElementSnapshot {
                element: ElementRef {
                    selector: selector.to_string(),
                    index,
                },
                text: text.to_string(),
                classes,
            };

            Ok(match selector {
                player::QUALITY_LIST => st
                    .qualities
                    .iter()
                    .enumerate()
                    .map(|(i, q)| snapshot(i, &q.label, Vec::new()))
                    .collect(),
                player::CURRENT_QUALITY => {
                    if let Some(pending) = st.pending.take() {
                        if pending.remaining == 0 {
                            st.current = Some(pending.label);
                        } else {
                            st.pending = Some(PendingSwitch {
                                remaining: pending.remaining - 1,
                                ..pending
                            });
                        }
                    }
                    match st.current.clone() {
                        Some(label) => vec![snapshot(0, &label, Vec::new())],
                        None => Vec::new(),
                    }
                }
                player::THEATER_BUTTON => {
                    if st.theater_present {
                        let classes = if st.theater_active {
                            vec![player::NARROW_PAGE_CLASS.to_string()]
                        } else {
                            Vec::new()
                        };
                        vec![snapshot(0, "", classes)]
                    } else {
                        Vec::new()
                    }
                }
                _ => Vec::new(),
            })
        })
    }

    async fn click(&self, element: &ElementRef) -> Result<()> {
        self.with(|st| {
            match element.selector.as_str() {
                player::QUALITY_LIST => {
                    st.quality_clicks.push(element.index);
                    if let (Some(latency), Some(entry)) =
                        (st.switch_latency, st.qualities.get(element.index))
                    {
                        st.pending = Some(PendingSwitch {
                            label: entry.label.clone(),
                            remaining: latency,
                        });
                    }
                }
                player::THEATER_BUTTON => {
                    st.theater_clicks += 1;
                    st.theater_active = true;
                }
                _ => {}
            }
            Ok(())
        })
    }

    async fn read_data(&self, element: &ElementRef, key: &str) -> Result<Option<Value>> {
        self.with(|st| {
            if element.selector != player::QUALITY_LIST {
                return Ok(None);
            }
            Ok(st
                .qualities
                .get(element.index)
                .and_then(|q| q.bags.get(key))
                .cloned())
        })
    }

    async fn write_data(&self, element: &ElementRef, key: &str, value: Value) -> Result<()> {
        self.with(|st| {
            if element.selector == player::QUALITY_LIST {
                if let Some(entry) = st.qualities.get_mut(element.index) {
                    entry.bags.insert(key.to_string(), value);
                    st.data_writes += 1;
                }
            }
            Ok(())
        })
    }
}

#[async_trait]
impl PageHost for ScriptedPage {
    async fn query_engine(&self) -> Option<Arc<dyn PageQuery>> {
        let ready = self.with(|st| {
            st.engine_probes += 1;
            if st.engine_delay > 0 {
                st.engine_delay -= 1;
                false
            } else {
                true
            }
        });
        ready.then(|| Arc::new(self.clone()) as Arc<dyn PageQuery>)
    }

    async fn document_state(&self) -> DocumentState {
        self.with(|st| {
            if st.loading_polls > 0 {
                st.loading_polls -= 1;
                DocumentState::Loading
            } else {
                DocumentState::Complete
            }
        })
    }
}
