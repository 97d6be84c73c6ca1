use anyhow::Result;
use rusqlite::Connection;
use tracing::{info, warn};

use super::db::{count_rows, open_read_only, read_metadata};
use crate::cli::StatusArgs;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseStatus {
    pub entries: i64,
    pub refs: i64,
    pub resolved_refs: i64,
    pub unresolved_refs: i64,
    pub schema_version: Option<String>,
    pub updated_at: Option<String>,
    pub source: Option<String>,
}

pub fn run(args: StatusArgs) -> Result<()> {
    info!(db = %args.db_path.display(), "status requested");

    if !args.db_path.exists() {
        warn!(path = %args.db_path.display(), "database missing");
        return Ok(());
    }

    let connection = open_read_only(&args.db_path)?;
    let status = database_status(&connection)?;

    info!(
        path = %args.db_path.display(),
        entries = status.entries,
        refs = status.refs,
        resolved_refs = status.resolved_refs,
        unresolved_refs = status.unresolved_refs,
        schema_version = %status.schema_version.unwrap_or_default(),
        updated_at = %status.updated_at.unwrap_or_default(),
        source = %status.source.unwrap_or_default(),
        "database status"
    );

    Ok(())
}

pub fn database_status(connection: &Connection) -> Result<DatabaseStatus> {
    Ok(DatabaseStatus {
        entries: count_rows(connection, "SELECT COUNT(*) FROM entries")?,
        refs: count_rows(connection, "SELECT COUNT(*) FROM refs")?,
        resolved_refs: count_rows(
            connection,
            "SELECT COUNT(*) FROM refs WHERE target_id IS NOT NULL",
        )?,
        unresolved_refs: count_rows(connection, "SELECT COUNT(*) FROM refs WHERE target_id IS NULL")?,
        schema_version: read_metadata(connection, "db_schema_version")?,
        updated_at: read_metadata(connection, "db_updated_at")?,
        source: read_metadata(connection, "source")?,
    })
}
