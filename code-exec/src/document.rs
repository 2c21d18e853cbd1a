use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use crate::{
    error::Error,
    registry::{Language, DEFAULT_LANGUAGE},
    shared::{
        InMemoryMap, InMemorySequence, MapChange, ObserverId, SequenceChange, SharedMap,
        SharedSequence,
    },
    types::ExecutionResult,
};

/// Key of the shared sequence holding execution results
pub const EXECUTIONS_KEY: &str = "executions";
/// Key of the shared settings map
pub const SETTINGS_KEY: &str = "settings";
pub const LANGUAGE_SETTING: &str = "language";

/// The parts of a collaborative document the execution core touches
pub struct SharedDocument {
    id: String,
    executions: Arc<dyn SharedSequence<ExecutionResult>>,
    settings: Arc<dyn SharedMap>,
}

impl SharedDocument {
    pub fn new(
        id: impl Into<String>,
        executions: Arc<dyn SharedSequence<ExecutionResult>>,
        settings: Arc<dyn SharedMap>,
    ) -> Self {
        Self {
            id: id.into(),
            executions,
            settings,
        }
    }

    pub fn in_memory(id: impl Into<String>) -> Self {
        Self::new(
            id,
            Arc::new(InMemorySequence::new()),
            Arc::new(InMemoryMap::new()),
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn results(&self) -> ResultLog {
        ResultLog::new(self.executions.clone())
    }

    pub fn settings(&self) -> DocumentSettings {
        DocumentSettings::new(self.settings.clone())
    }
}

/// Append-only view of a document's execution results.
///
/// Entries are only ever added at the tail or removed wholesale by [`ResultLog::clear`].
#[derive(Clone)]
pub struct ResultLog {
    sequence: Arc<dyn SharedSequence<ExecutionResult>>,
}

impl ResultLog {
    pub fn new(sequence: Arc<dyn SharedSequence<ExecutionResult>>) -> Self {
        Self { sequence }
    }

    pub fn append(&self, result: ExecutionResult) {
        debug!(execution_id = %result.id, status = %result.status, "Appending result");
        self.sequence.push(vec![result]);
    }

    pub fn entries(&self) -> Vec<ExecutionResult> {
        self.sequence.snapshot()
    }

    pub fn latest(&self) -> Option<ExecutionResult> {
        self.sequence.snapshot().pop()
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Delete every current entry, returning how many were removed
    pub fn clear(&self) -> usize {
        let len = self.sequence.len();
        if len > 0 {
            self.sequence.delete(0, len);
        }
        len
    }

    pub fn observe<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&SequenceChange) + Send + Sync + 'static,
    {
        self.sequence.observe(Arc::new(callback))
    }

    pub fn unobserve(&self, id: ObserverId) -> bool {
        self.sequence.unobserve(id)
    }
}

/// Document-wide settings shared by every viewer
#[derive(Clone)]
pub struct DocumentSettings {
    map: Arc<dyn SharedMap>,
}

impl DocumentSettings {
    pub fn new(map: Arc<dyn SharedMap>) -> Self {
        Self { map }
    }

    /// Currently selected language, `javascript` until someone picks one
    pub fn language(&self) -> String {
        self.map
            .get(LANGUAGE_SETTING)
            .unwrap_or_else(|| DEFAULT_LANGUAGE.id().to_string())
    }

    pub fn set_language(&self, language: &str) -> Result<Language, Error> {
        let parsed: Language = language.parse().map_err(Error::Validation)?;
        self.map.set(LANGUAGE_SETTING, parsed.id().to_string());
        Ok(parsed)
    }

    pub fn observe<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&MapChange) + Send + Sync + 'static,
    {
        self.map.observe(Arc::new(callback))
    }

    pub fn unobserve(&self, id: ObserverId) -> bool {
        self.map.unobserve(id)
    }
}

/// Process-local registry of open documents
#[derive(Default)]
pub struct DocumentHub {
    documents: RwLock<HashMap<String, Arc<SharedDocument>>>,
}

impl DocumentHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a document, creating an empty one on first access
    pub fn document(&self, id: &str) -> Arc<SharedDocument> {
        if let Some(document) = self.get(id) {
            return document;
        }

        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        documents
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!(doc_id = id, "Opening shared document");
                Arc::new(SharedDocument::in_memory(id))
            })
            .clone()
    }

    pub fn get(&self, id: &str) -> Option<Arc<SharedDocument>> {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
