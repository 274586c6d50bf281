use crate::dom::{DocumentState, ElementRef, ElementSnapshot, PageHost, PageQuery};
use crate::errors::{PilotError, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde::Deserialize;
use serde_json::Value;
use std::ffi::OsStr;
use std::sync::Arc;

/// A live player page in a browser tab.
///
/// Queries delegate to the page's own `$` runtime via injected scripts, so
/// clicks and attached-data reads behave exactly as the host application
/// expects. The page hands out its [`PageQuery`] capability only once that
/// runtime has loaded.
pub struct ChromePage {
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromePage {
    /// Launch a browser and open `url` in a fresh tab.
    pub fn launch(url: &str, headless: bool) -> Result<Self> {
        let launch_options = LaunchOptions::default_builder()
            .headless(headless)
            .args(vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-dev-shm-usage"),
            ])
            .build()
            .map_err(|e| PilotError::LaunchFailed(e.to_string()))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| PilotError::LaunchFailed(e.to_string()))?;
        let tab = browser.new_tab()?;

        tab.navigate_to(url)
            .map_err(|e| PilotError::NavigationFailed(e.to_string()))?;
        tab.wait_until_navigated()
            .map_err(|e| PilotError::NavigationFailed(e.to_string()))?;

        Ok(Self {
            _browser: browser,
            tab,
        })
    }
}

#[async_trait]
impl PageHost for ChromePage {
    async fn query_engine(&self) -> Option<Arc<dyn PageQuery>> {
        let probe = evaluate(&self.tab, "typeof window.$ !== 'undefined'").ok()?;
        if probe.as_bool().unwrap_or(false) {
            Some(Arc::new(ChromeQuery {
                tab: self.tab.clone(),
            }))
        } else {
            None
        }
    }

    async fn document_state(&self) -> DocumentState {
        match evaluate(&self.tab, "document.readyState") {
            Ok(state) => DocumentState::from_ready_state(state.as_str().unwrap_or("")),
            // An unreadable document is still starting up.
            Err(_) => DocumentState::Loading,
        }
    }
}

/// [`PageQuery`] over a live tab, delegating every call to the page's `$`.
struct ChromeQuery {
    tab: Arc<Tab>,
}

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    text: String,
    classes: Vec<String>,
}

#[async_trait]
impl PageQuery for ChromeQuery {
    async fn select(&self, selector: &str) -> Result<Vec<ElementSnapshot>> {
        let script = format!(
            r#"
            (function() {{
                if (typeof window.$ === 'undefined') return JSON.stringify([]);
                const out = [];
                window.$({selector}).each(function() {{
                    out.push({{
                        text: window.$(this).text(),
                        classes: (this.className || '').split(/\s+/).filter(Boolean)
                    }});
                }});
                return JSON.stringify(out);
            }})()
            "#,
            selector = js_string(selector)?,
        );

        let raw = evaluate(&self.tab, &script)?;
        let snapshots: Vec<RawSnapshot> = serde_json::from_str(raw.as_str().unwrap_or("[]"))?;

        Ok(snapshots
            .into_iter()
            .enumerate()
            .map(|(index, raw)| ElementSnapshot {
                element: ElementRef {
                    selector: selector.to_string(),
                    index,
                },
                text: raw.text,
                classes: raw.classes,
            })
            .collect())
    }

    async fn click(&self, element: &ElementRef) -> Result<()> {
        let script = format!(
            "(function() {{ window.$({selector}).eq({index}).trigger('click'); }})()",
            selector = js_string(&element.selector)?,
            index = element.index,
        );
        evaluate(&self.tab, &script)?;
        Ok(())
    }

    async fn read_data(&self, element: &ElementRef, key: &str) -> Result<Option<Value>> {
        let script = format!(
            r#"
            (function() {{
                const data = window.$({selector}).eq({index}).data({key});
                return data === undefined ? null : JSON.stringify(data);
            }})()
            "#,
            selector = js_string(&element.selector)?,
            index = element.index,
            key = js_string(key)?,
        );

        match evaluate(&self.tab, &script)? {
            Value::Null => Ok(None),
            value => Ok(Some(serde_json::from_str(value.as_str().unwrap_or("null"))?)),
        }
    }

    async fn write_data(&self, element: &ElementRef, key: &str, value: Value) -> Result<()> {
        // Mutate the stored object in place where possible: the host keeps
        // references to it and reads the flags lazily.
        let script = format!(
            r#"
            (function() {{
                const target = window.$({selector}).eq({index});
                const next = {value};
                const existing = target.data({key});
                if (existing && typeof existing === 'object') {{
                    Object.assign(existing, next);
                }} else {{
                    target.data({key}, next);
                }}
            }})()
            "#,
            selector = js_string(&element.selector)?,
            index = element.index,
            key = js_string(key)?,
            value = serde_json::to_string(&value)?,
        );
        evaluate(&self.tab, &script)?;
        Ok(())
    }
}

fn evaluate(tab: &Tab, script: &str) -> Result<Value> {
    let result = tab
        .evaluate(script, false)
        .map_err(|e| PilotError::JavaScriptFailed(e.to_string()))?;
    Ok(result.value.unwrap_or(Value::Null))
}

/// Quote a Rust string as a JavaScript string literal.
fn js_string(s: &str) -> Result<String> {
    Ok(serde_json::to_string(s)?)
}
