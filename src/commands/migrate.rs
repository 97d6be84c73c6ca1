use std::collections::HashMap;
use std::fs;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use tracing::{debug, info};

use super::db::{ensure_schema, open_read_write, touch_updated_at, upsert_metadata};
use crate::cli::MigrateArgs;
use crate::model::{EntryRef, ExtractionOutput};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    pub entries: usize,
    pub refs: usize,
    pub resolved_refs: usize,
    pub unresolved_refs: usize,
}

pub fn run(args: MigrateArgs) -> Result<()> {
    let raw = fs::read(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let output: ExtractionOutput = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse extraction output {}", args.input.display()))?;

    info!(
        input = %args.input.display(),
        db = %args.db_path.display(),
        entries = output.entries.len(),
        "migration requested"
    );

    let mut connection = open_read_write(&args.db_path)?;
    ensure_schema(&connection)?;
    let summary = load_output(&mut connection, &output)?;

    upsert_metadata(&connection, "source", &output.source)?;
    upsert_metadata(&connection, "source_sha256", &output.source_sha256)?;
    upsert_metadata(&connection, "extracted_at", &output.generated_at)?;
    touch_updated_at(&connection)?;

    info!(
        db = %args.db_path.display(),
        entries = summary.entries,
        refs = summary.refs,
        resolved_refs = summary.resolved_refs,
        unresolved_refs = summary.unresolved_refs,
        "migration completed"
    );

    Ok(())
}

/// Replaces every entry and reference with the contents of `output` in one transaction.
///
/// Row ids are record positions, matching the ids written by `extract`.
pub fn load_output(
    connection: &mut Connection,
    output: &ExtractionOutput,
) -> Result<MigrationSummary> {
    let tx = connection
        .transaction()
        .context("failed to start migration transaction")?;
    tx.execute("DELETE FROM refs", [])
        .context("failed to clear refs")?;
    tx.execute("DELETE FROM entries", [])
        .context("failed to clear entries")?;

    let mut summary = MigrationSummary::default();
    let mut first_by_word = HashMap::<&str, usize>::new();
    for (position, record) in output.entries.iter().enumerate() {
        first_by_word.entry(record.word.as_str()).or_insert(position);
    }

    {
        let mut insert_entry = tx.prepare(
            "INSERT INTO entries(id, word, pos, definition, page, column_index, alias, inflection)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for (position, record) in output.entries.iter().enumerate() {
            if record.id != position {
                debug!(
                    id = record.id,
                    position,
                    word = %record.word,
                    "record id differs from its position; using position"
                );
            }
            insert_entry
                .execute(params![
                    position as i64,
                    record.word,
                    record.pos,
                    record.definition,
                    record.page,
                    record.column as i64,
                    record.alias,
                    record.inflection,
                ])
                .with_context(|| format!("failed to insert entry {}", record.word))?;
            summary.entries += 1;
        }

        let mut insert_ref = tx.prepare(
            "INSERT INTO refs(source_id, type, target_word, target_id)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (position, record) in output.entries.iter().enumerate() {
            for entry_ref in record.refs() {
                let target = ref_target_id(&entry_ref, &first_by_word, output.entries.len());
                insert_ref
                    .execute(params![
                        position as i64,
                        entry_ref.kind.as_str(),
                        entry_ref.target_word,
                        target.map(|id| id as i64),
                    ])
                    .with_context(|| format!("failed to insert refs for {}", record.word))?;

                summary.refs += 1;
                if target.is_some() {
                    summary.resolved_refs += 1;
                } else {
                    summary.unresolved_refs += 1;
                }
            }
        }
    }

    tx.execute("INSERT INTO entries_fts(entries_fts) VALUES('rebuild')", [])
        .context("failed to rebuild entries_fts")?;
    tx.commit().context("failed to commit migration")?;

    Ok(summary)
}

fn ref_target_id(
    entry_ref: &EntryRef,
    first_by_word: &HashMap<&str, usize>,
    entry_count: usize,
) -> Option<usize> {
    entry_ref
        .target_id
        .filter(|id| *id < entry_count)
        .or_else(|| first_by_word.get(entry_ref.resolved_word.as_str()).copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntryRecord, ExtractionStats};

    fn record(id: usize, word: &str, definition: &str) -> EntryRecord {
        EntryRecord {
            id,
            word: word.to_string(),
            pos: "m.".to_string(),
            definition: definition.to_string(),
            alias: None,
            inflection: None,
            cross_refs: Vec::new(),
            see_also: Vec::new(),
            cross_ref_targets: Vec::new(),
            see_also_targets: Vec::new(),
            cross_ref_target_ids: Vec::new(),
            see_also_target_ids: Vec::new(),
            page: 1,
            column: 0,
        }
    }

    fn output(entries: Vec<EntryRecord>) -> ExtractionOutput {
        ExtractionOutput {
            source: "fixture.json".to_string(),
            source_sha256: String::new(),
            generated_at: String::new(),
            pages: vec![1],
            count: entries.len(),
            counts: ExtractionStats::default(),
            warnings: Vec::new(),
            entries,
        }
    }

    fn database() -> Connection {
        let connection = Connection::open_in_memory().expect("in-memory db");
        ensure_schema(&connection).expect("schema");
        connection
    }

    #[test]
    fn load_output_inserts_entries_refs_and_fts() {
        let mut roob = record(0, "roob", "biyo cirka ka da'a. eeg daruur");
        roob.cross_refs = vec!["daruur".to_string()];
        roob.cross_ref_targets = vec!["daruur".to_string()];
        roob.cross_ref_target_ids = vec![Some(1)];
        roob.see_also = vec!["xxqyz".to_string()];
        roob.see_also_targets = vec!["xxqyz".to_string()];
        roob.see_also_target_ids = vec![None];
        let daruur = record(1, "daruur", "cir.");

        let mut connection = database();
        let summary = load_output(&mut connection, &output(vec![roob, daruur])).expect("load");
        assert_eq!(
            summary,
            MigrationSummary {
                entries: 2,
                refs: 2,
                resolved_refs: 1,
                unresolved_refs: 1,
            }
        );

        let refs = connection
            .prepare("SELECT type, target_word, target_id FROM refs ORDER BY id")
            .expect("prepare")
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                ))
            })
            .expect("query")
            .collect::<rusqlite::Result<Vec<_>>>()
            .expect("rows");
        assert_eq!(
            refs,
            vec![
                ("see".to_string(), "daruur".to_string(), Some(1)),
                ("seealso".to_string(), "xxqyz".to_string(), None),
            ]
        );

        let hit: i64 = connection
            .query_row(
                "SELECT rowid FROM entries_fts WHERE entries_fts MATCH '\"cir\"*' ORDER BY rowid LIMIT 1",
                [],
                |row| row.get(0),
            )
            .expect("fts hit");
        assert_eq!(hit, 0);
    }

    #[test]
    fn load_output_replaces_previous_rows_and_falls_back_to_words() {
        let mut connection = database();
        load_output(&mut connection, &output(vec![record(0, "old", "gone.")])).expect("first load");

        let mut dhig = record(0, "dhig", "meel saar. eeg qaad");
        dhig.cross_refs = vec!["qaad".to_string()];
        let qaad = record(1, "qaad", "kor u qaad.");
        let summary = load_output(&mut connection, &output(vec![dhig, qaad])).expect("second load");

        assert_eq!(summary.entries, 2);
        assert_eq!(summary.resolved_refs, 1);
        let words: i64 = connection
            .query_row("SELECT COUNT(*) FROM entries WHERE word = 'old'", [], |row| row.get(0))
            .expect("count");
        assert_eq!(words, 0);
        let target: Option<i64> = connection
            .query_row("SELECT target_id FROM refs WHERE source_id = 0", [], |row| row.get(0))
            .expect("target");
        assert_eq!(target, Some(1));
    }

    #[test]
    fn refs_store_the_mention_and_resolve_through_the_target_word() {
        let mut dhig = record(0, "dhig", "meel saar. eeg qaad");
        dhig.cross_refs = vec!["qaad".to_string()];
        dhig.cross_ref_targets = vec!["qaad\u{b9}".to_string()];
        dhig.cross_ref_target_ids = vec![None];
        let qaad = record(1, "qaad\u{b9}", "kor u qaad.");

        let mut connection = database();
        let summary = load_output(&mut connection, &output(vec![dhig, qaad])).expect("load");
        assert_eq!(summary.resolved_refs, 1);

        let (word, target): (String, Option<i64>) = connection
            .query_row(
                "SELECT target_word, target_id FROM refs WHERE source_id = 0",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .expect("ref row");
        assert_eq!(word, "qaad");
        assert_eq!(target, Some(1));
    }
}
