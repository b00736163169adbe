use super::SqliteFleetStore;
use crate::domain::document::{Document, DocumentMetadata, DocumentPatch};
use crate::repository::document_store::DocumentStore;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

const DOCUMENT_COLUMNS: &str = "document_id, file_name, driver_id, category, doc_type, \
     required, expiration_date, storage_path, archived, uploaded_at, updated_at";

fn map_document_row(row: &Row<'_>) -> rusqlite::Result<Document> {
    Ok(Document {
        document_id: row.get(0)?,
        file_name: row.get(1)?,
        driver_id: row.get(2)?,
        category: row.get(3)?,
        doc_type: row.get(4)?,
        metadata: DocumentMetadata {
            required: row.get(5)?,
            expiration_date: row.get(6)?,
        },
        storage_path: row.get(7)?,
        archived: row.get(8)?,
        uploaded_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn select_document(conn: &Connection, document_id: &str) -> RepositoryResult<Option<Document>> {
    let sql = format!(
        "SELECT {} FROM document WHERE document_id = ?1",
        DOCUMENT_COLUMNS
    );
    Ok(conn
        .query_row(&sql, params![document_id], map_document_row)
        .optional()?)
}

fn write_document(conn: &Connection, doc: &Document) -> RepositoryResult<()> {
    conn.execute(
        r#"
        UPDATE document SET
            category = ?1, doc_type = ?2, required = ?3, expiration_date = ?4,
            archived = ?5, updated_at = ?6
        WHERE document_id = ?7
        "#,
        params![
            doc.category,
            doc.doc_type,
            doc.metadata.required,
            doc.metadata.expiration_date,
            doc.archived,
            doc.updated_at,
            doc.document_id,
        ],
    )?;
    Ok(())
}

#[async_trait]
impl DocumentStore for SqliteFleetStore {
    async fn list_documents(&self, include_archived: bool) -> RepositoryResult<Vec<Document>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM document WHERE (?1 OR archived = 0) ORDER BY uploaded_at DESC, file_name",
            DOCUMENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let docs = stmt
            .query_map(params![include_archived], map_document_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(docs)
    }

    async fn get_document(&self, document_id: &str) -> RepositoryResult<Option<Document>> {
        let conn = self.get_conn()?;
        select_document(&conn, document_id)
    }

    async fn insert_document(&self, document: Document) -> RepositoryResult<Document> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO document (
                document_id, file_name, driver_id, category, doc_type,
                required, expiration_date, storage_path, archived, uploaded_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                document.document_id,
                document.file_name,
                document.driver_id,
                document.category,
                document.doc_type,
                document.metadata.required,
                document.metadata.expiration_date,
                document.storage_path,
                document.archived,
                document.uploaded_at,
                document.updated_at,
            ],
        )?;
        Ok(document)
    }

    async fn update_document_metadata(
        &self,
        document_id: &str,
        patch: DocumentPatch,
    ) -> RepositoryResult<Document> {
        let conn = self.get_conn()?;
        let current = select_document(&conn, document_id)?
            .ok_or_else(|| RepositoryError::not_found("Document", document_id))?;

        let next = patch.apply_to(&current, Utc::now().naive_utc());
        write_document(&conn, &next)?;
        Ok(next)
    }

    async fn archive_document(&self, document_id: &str) -> RepositoryResult<Document> {
        let conn = self.get_conn()?;
        let mut doc = select_document(&conn, document_id)?
            .ok_or_else(|| RepositoryError::not_found("Document", document_id))?;

        doc.archived = true;
        doc.updated_at = Utc::now().naive_utc();
        write_document(&conn, &doc)?;
        Ok(doc)
    }

    async fn delete_document(&self, document_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "DELETE FROM document WHERE document_id = ?1",
            params![document_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found("Document", document_id));
        }
        Ok(())
    }
}
