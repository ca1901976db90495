use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::providers::{Part, Provider, ProviderError, ProviderFuture, ProviderResponse};

pub(crate) fn with_temp_home<F, R>(func: F) -> R
where
    F: FnOnce(&std::path::Path) -> R,
{
    static HOME_MUTEX: Mutex<()> = Mutex::new(());
    let _guard = HOME_MUTEX.lock().unwrap_or_else(|err| err.into_inner());
    let dir = tempfile::tempdir().expect("tempdir");
    let old_home = std::env::var("HOME").ok();
    // SAFETY: HOME is only touched while HOME_MUTEX is held.
    unsafe { std::env::set_var("HOME", dir.path()) };
    let result = func(dir.path());
    match old_home {
        Some(old) => unsafe { std::env::set_var("HOME", old) },
        None => unsafe { std::env::remove_var("HOME") },
    }
    result
}

/// Provider that answers from a per-model script and records every call.
#[derive(Clone, Default)]
pub(crate) struct ScriptedProvider {
    script: Arc<HashMap<String, Result<String, String>>>,
    calls: Arc<Mutex<Vec<(String, Vec<Part>)>>>,
}

impl ScriptedProvider {
    pub(crate) fn new(script: &[(&str, Result<&str, &str>)]) -> Self {
        let script = script
            .iter()
            .map(|&(model, outcome)| {
                let outcome = match outcome {
                    Ok(text) => Ok(text.to_string()),
                    Err(err) => Err(err.to_string()),
                };
                (model.to_string(), outcome)
            })
            .collect();
        Self {
            script: Arc::new(script),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .map(|(model, _)| model.clone())
            .collect()
    }

    pub(crate) fn parts_for(&self, index: usize) -> Vec<Part> {
        self.calls.lock().expect("calls lock")[index].1.clone()
    }
}

impl Provider for ScriptedProvider {
    fn generate(&self, model: &str, parts: Vec<Part>) -> ProviderFuture {
        self.calls
            .lock()
            .expect("calls lock")
            .push((model.to_string(), parts));
        let outcome = self
            .script
            .get(model)
            .cloned()
            .unwrap_or_else(|| Err(format!("404 model {} is not scripted", model)));
        let model = model.to_string();
        Box::pin(async move {
            outcome
                .map(|text| ProviderResponse { text, model })
                .map_err(ProviderError::from_text)
        })
    }
}
