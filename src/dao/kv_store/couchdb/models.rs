use serde::{Deserialize, Serialize};

/// Document holding one persisted blob; the document ID is the storage key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchValueDocument {
    /// Storage key.
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// Serialized envelope, kept as a string so the document is stored verbatim.
    pub value: String,
}

/// Minimal view of a document used when only the revision matters.
#[derive(Debug, Deserialize)]
pub struct CouchRevision {
    /// Current revision of the document.
    #[serde(rename = "_rev")]
    pub rev: String,
}
