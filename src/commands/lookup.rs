use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, params};
use serde::Serialize;
use tracing::info;

use super::db::open_read_only;
use crate::cli::LookupArgs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Prefix,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupRef {
    pub kind: String,
    pub target_word: String,
    pub target_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferredBy {
    pub source_id: i64,
    pub source_word: String,
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LookupResult {
    pub id: i64,
    pub word: String,
    pub pos: String,
    pub definition: String,
    pub page: Option<i64>,
    pub column: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inflection: Option<String>,
    pub refs: Vec<LookupRef>,
    pub referred_by: Vec<ReferredBy>,
}

#[derive(Debug, Serialize)]
struct LookupResponse<'a> {
    query: &'a str,
    match_kind: MatchKind,
    result_count: usize,
    results: &'a [LookupResult],
}

pub fn run(args: LookupArgs) -> Result<()> {
    let word = args.word.trim();
    if word.is_empty() {
        bail!("--word must not be empty");
    }
    if !args.db_path.exists() {
        bail!(
            "database not found: {} (run `qaam migrate` first)",
            args.db_path.display()
        );
    }

    let connection = open_read_only(&args.db_path)?;
    let (match_kind, results) = lookup(&connection, word, args.limit)?;

    info!(
        word,
        match_kind = ?match_kind,
        results = results.len(),
        "lookup completed"
    );

    if args.json {
        write_json_response(word, match_kind, &results)
    } else {
        write_text_response(word, match_kind, &results)
    }
}

pub fn lookup(
    connection: &Connection,
    word: &str,
    limit: usize,
) -> Result<(MatchKind, Vec<LookupResult>)> {
    let limit = limit.max(1) as i64;

    let exact = query_ids(
        connection,
        "SELECT id FROM entries WHERE word = ?1 COLLATE NOCASE ORDER BY id LIMIT ?2",
        word,
        limit,
    )?;
    let (match_kind, ids) = if !exact.is_empty() {
        (MatchKind::Exact, exact)
    } else {
        let fts_query = to_fts_prefix_query(word);
        if fts_query.is_empty() {
            (MatchKind::None, Vec::new())
        } else {
            let prefix = query_ids(
                connection,
                "SELECT rowid FROM entries_fts WHERE entries_fts MATCH ?1 ORDER BY rowid LIMIT ?2",
                &fts_query,
                limit,
            )?;
            if prefix.is_empty() {
                (MatchKind::None, prefix)
            } else {
                (MatchKind::Prefix, prefix)
            }
        }
    };

    let results = ids
        .into_iter()
        .map(|id| load_result(connection, id))
        .collect::<Result<Vec<LookupResult>>>()?;
    Ok((match_kind, results))
}

fn query_ids(connection: &Connection, sql: &str, value: &str, limit: i64) -> Result<Vec<i64>> {
    let mut statement = connection
        .prepare(sql)
        .context("failed to prepare lookup query")?;
    let rows = statement.query_map(params![value, limit], |row| row.get::<_, i64>(0))?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

fn load_result(connection: &Connection, id: i64) -> Result<LookupResult> {
    let mut result = connection
        .query_row(
            "SELECT id, word, pos, definition, page, column_index, alias, inflection
             FROM entries WHERE id = ?1",
            [id],
            |row| {
                Ok(LookupResult {
                    id: row.get(0)?,
                    word: row.get(1)?,
                    pos: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    definition: row.get(3)?,
                    page: row.get(4)?,
                    column: row.get(5)?,
                    alias: row.get(6)?,
                    inflection: row.get(7)?,
                    refs: Vec::new(),
                    referred_by: Vec::new(),
                })
            },
        )
        .with_context(|| format!("failed to load entry {id}"))?;

    let mut refs = connection.prepare(
        "SELECT type, target_word, target_id FROM refs WHERE source_id = ?1 ORDER BY id",
    )?;
    for row in refs.query_map([id], |row| {
        Ok(LookupRef {
            kind: row.get(0)?,
            target_word: row.get(1)?,
            target_id: row.get(2)?,
        })
    })? {
        result.refs.push(row?);
    }

    let mut referrers = connection.prepare(
        "SELECT r.source_id, e.word, r.type
         FROM refs r JOIN entries e ON e.id = r.source_id
         WHERE r.target_id = ?1
         ORDER BY r.id",
    )?;
    for row in referrers.query_map([id], |row| {
        Ok(ReferredBy {
            source_id: row.get(0)?,
            source_word: row.get(1)?,
            kind: row.get(2)?,
        })
    })? {
        result.referred_by.push(row?);
    }

    Ok(result)
}

fn to_fts_prefix_query(query_text: &str) -> String {
    query_text
        .split_whitespace()
        .map(|token| token.replace('"', ""))
        .filter(|token| !token.is_empty())
        .map(|token| format!("\"{token}\"*"))
        .collect::<Vec<String>>()
        .join(" ")
}

fn write_json_response(word: &str, match_kind: MatchKind, results: &[LookupResult]) -> Result<()> {
    let response = LookupResponse {
        query: word,
        match_kind,
        result_count: results.len(),
        results,
    };

    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, &response)
        .context("failed to serialize lookup json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn write_text_response(word: &str, match_kind: MatchKind, results: &[LookupResult]) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    if results.is_empty() {
        writeln!(output, "No entry found for '{word}'.")?;
        output.flush()?;
        return Ok(());
    }

    writeln!(output, "Lookup: {word} ({} match)", match_label(match_kind))?;
    for result in results {
        writeln!(output)?;
        write!(output, "{}", result.word)?;
        if !result.pos.is_empty() {
            write!(output, " {}", result.pos)?;
        }
        if let Some(alias) = &result.alias {
            write!(output, " {alias}")?;
        }
        writeln!(
            output,
            "  [#{} page {} column {}]",
            result.id,
            result.page.map_or_else(|| "?".to_string(), |page| page.to_string()),
            result.column.map_or_else(|| "?".to_string(), |column| column.to_string()),
        )?;
        writeln!(output, "  {}", result.definition)?;

        for entry_ref in &result.refs {
            let target = match entry_ref.target_id {
                Some(id) => format!("#{id}"),
                None => "unresolved".to_string(),
            };
            writeln!(
                output,
                "  {}: {} ({target})",
                ref_label(&entry_ref.kind),
                entry_ref.target_word
            )?;
        }
        for referrer in &result.referred_by {
            writeln!(
                output,
                "  referred by: {} (#{}, {})",
                referrer.source_word,
                referrer.source_id,
                ref_label(&referrer.kind)
            )?;
        }
    }

    output.flush()?;
    Ok(())
}

fn match_label(kind: MatchKind) -> &'static str {
    match kind {
        MatchKind::Exact => "exact",
        MatchKind::Prefix => "prefix",
        MatchKind::None => "no",
    }
}

fn ref_label(kind: &str) -> &str {
    match kind {
        "see" => "see",
        "seealso" => "see also",
        other => other,
    }
}
