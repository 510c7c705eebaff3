//! Knowledge bases: user-named collections of uploaded-file metadata.
//!
//! Files live inside their knowledge-base record, so a file can never exist
//! for an unknown knowledge base. Nothing is sent anywhere on upload; records
//! are tracked locally and vanish on restart.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    TrackedLocally,
}

impl FileStatus {
    pub fn label(&self) -> &'static str {
        match self {
            FileStatus::TrackedLocally => "tracked locally",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub filename: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
    pub status: FileStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub id: String,
    pub name: String,
    pub description: String,
    pub subject: String,
    pub created_at: DateTime<Utc>,
    /// Placeholder context token; no external system is provisioned for it.
    pub context_id: String,
    pub files: Vec<FileRecord>,
    /// Always equal to `files.len()`.
    pub file_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct NewKnowledgeBase {
    pub name: String,
    pub description: String,
    pub subject: String,
}

pub trait KnowledgeBaseStore: Send + Sync {
    fn create(&self, draft: NewKnowledgeBase) -> KnowledgeBase;

    fn get(&self, id: &str) -> Option<KnowledgeBase>;

    /// Newest first.
    fn list(&self) -> Vec<KnowledgeBase>;

    /// Appends a file record; `NotFound` leaves the store untouched.
    fn attach_file(&self, kb_id: &str, filename: &str, content: &[u8]) -> Result<FileRecord, StoreError>;
}

/// Process-wide in-memory store. Each entry is mutated under its shard lock,
/// so concurrent uploads to one knowledge base serialize.
#[derive(Default)]
pub struct InMemoryKnowledgeBaseStore {
    bases: DashMap<String, KnowledgeBase>,
}

impl InMemoryKnowledgeBaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }
}

fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "kb".to_string()
    } else {
        trimmed.to_string()
    }
}

fn context_id_for(name: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("ctx_{}_{}", slug(name), &suffix[..8])
}

impl KnowledgeBaseStore for InMemoryKnowledgeBaseStore {
    fn create(&self, draft: NewKnowledgeBase) -> KnowledgeBase {
        let kb = KnowledgeBase {
            id: Uuid::new_v4().to_string(),
            context_id: context_id_for(&draft.name),
            name: draft.name,
            description: draft.description,
            subject: draft.subject,
            created_at: Utc::now(),
            files: Vec::new(),
            file_count: 0,
        };
        self.bases.insert(kb.id.clone(), kb.clone());
        tracing::info!(
            target: "lore::knowledge_base",
            kb_id = %kb.id,
            name = %kb.name,
            subject = %kb.subject,
            "knowledge base created"
        );
        kb
    }

    fn get(&self, id: &str) -> Option<KnowledgeBase> {
        self.bases.get(id).map(|entry| entry.value().clone())
    }

    fn list(&self) -> Vec<KnowledgeBase> {
        let mut all: Vec<KnowledgeBase> = self.bases.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.name.cmp(&b.name)));
        all
    }

    fn attach_file(&self, kb_id: &str, filename: &str, content: &[u8]) -> Result<FileRecord, StoreError> {
        let mut entry = self
            .bases
            .get_mut(kb_id)
            .ok_or_else(|| StoreError::NotFound(kb_id.to_string()))?;

        let record = FileRecord {
            id: Uuid::new_v4().to_string(),
            filename: filename.to_string(),
            size: content.len() as u64,
            uploaded_at: Utc::now(),
            status: FileStatus::TrackedLocally,
        };
        let kb = entry.value_mut();
        kb.files.push(record.clone());
        kb.file_count = kb.files.len();

        tracing::info!(
            target: "lore::knowledge_base",
            kb_id = %kb_id,
            filename = %record.filename,
            size = record.size,
            file_count = kb.file_count,
            "file tracked locally"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn herbs() -> NewKnowledgeBase {
        NewKnowledgeBase {
            name: "Herbs".into(),
            description: "Garden remedies".into(),
            subject: "natural_health".into(),
        }
    }

    #[test]
    fn create_then_attach_updates_count() {
        let store = InMemoryKnowledgeBaseStore::new();
        let kb = store.create(herbs());
        assert_eq!(kb.file_count, 0);
        assert!(kb.files.is_empty());
        assert!(kb.context_id.starts_with("ctx_herbs_"));

        let record = store.attach_file(&kb.id, "yarrow notes.pdf", b"%PDF-1.4").unwrap();
        assert_eq!(record.filename, "yarrow notes.pdf");
        assert_eq!(record.size, 8);
        assert_eq!(record.status, FileStatus::TrackedLocally);

        let stored = store.get(&kb.id).unwrap();
        assert_eq!(stored.file_count, 1);
        assert_eq!(stored.files.len(), 1);
        assert_eq!(stored.files[0].filename, "yarrow notes.pdf");
    }

    #[test]
    fn attach_to_missing_kb_is_not_found_and_mutates_nothing() {
        let store = InMemoryKnowledgeBaseStore::new();
        let kb = store.create(herbs());
        let before = store.list();

        let err = store.attach_file("nope", "a.txt", b"x").unwrap_err();
        assert_eq!(err, StoreError::NotFound("nope".into()));
        assert_eq!(store.list(), before);
        assert_eq!(store.get(&kb.id).unwrap().file_count, 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn get_unknown_is_none() {
        assert!(InMemoryKnowledgeBaseStore::new().get("missing").is_none());
    }

    #[test]
    fn ids_are_unique() {
        let store = InMemoryKnowledgeBaseStore::new();
        let a = store.create(herbs());
        let b = store.create(herbs());
        assert_ne!(a.id, b.id);
        assert_ne!(a.context_id, b.context_id);
        assert_eq!(store.list().len(), 2);
    }

    #[test]
    fn slug_handles_odd_names() {
        assert_eq!(slug("  Lost  History! "), "lost_history");
        assert_eq!(slug("???"), "kb");
    }

    #[test]
    fn concurrent_uploads_are_all_kept() {
        let store = Arc::new(InMemoryKnowledgeBaseStore::new());
        let kb = store.create(herbs());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                let id = kb.id.clone();
                std::thread::spawn(move || {
                    for j in 0..25 {
                        store
                            .attach_file(&id, &format!("f{}-{}.txt", i, j), b"data")
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let stored = store.get(&kb.id).unwrap();
        assert_eq!(stored.file_count, 200);
        assert_eq!(stored.files.len(), 200);
    }
}
