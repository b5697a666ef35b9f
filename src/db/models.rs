use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;

/// Database representation of a stored document
#[derive(Debug, FromRow)]
pub struct DocumentRow {
    pub path: String,
    pub data: Value,
}

/// A document as returned by list queries
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        let id = row
            .path
            .rsplit_once('/')
            .map(|(_, id)| id.to_string())
            .unwrap_or(row.path);
        Document { id, data: row.data }
    }
}
