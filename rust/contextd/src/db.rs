use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub const DB_FILE_NAME: &str = "contextd.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    tracing::info!(workspace = %workspace.display(), "workspace database opened");
    Ok(conn)
}

pub fn open_in_memory() -> anyhow::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS institutions(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS member_groups(
            id TEXT PRIMARY KEY,
            institution_id TEXT NOT NULL,
            name TEXT NOT NULL,
            grade TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY(institution_id) REFERENCES institutions(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_member_groups_institution ON member_groups(institution_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS individuals(
            id TEXT PRIMARY KEY,
            institution_id TEXT NOT NULL,
            group_id TEXT,
            name TEXT NOT NULL,
            contact_handle TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY(institution_id) REFERENCES institutions(id),
            FOREIGN KEY(group_id) REFERENCES member_groups(id)
        )",
        [],
    )?;
    // Older workspaces were created before contact handles existed.
    ensure_individuals_contact_handle(conn)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_individuals_institution ON individuals(institution_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_individuals_group ON individuals(group_id)",
        [],
    )?;
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_individuals_contact ON individuals(contact_handle)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS context_entries(
            id TEXT PRIMARY KEY,
            scope_level TEXT NOT NULL,
            scope_owner_id TEXT NOT NULL,
            category TEXT NOT NULL,
            title TEXT,
            content TEXT NOT NULL,
            priority INTEGER NOT NULL DEFAULT 1,
            active INTEGER NOT NULL DEFAULT 1,
            seq INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            CHECK(scope_level IN ('institution', 'group', 'individual'))
        )",
        [],
    )?;
    ensure_context_entries_updated_at(conn)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_context_entries_owner
         ON context_entries(scope_level, scope_owner_id, priority, seq)",
        [],
    )?;
    // Group and individual scopes hold a single note per owner.
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_context_entries_single_owner
         ON context_entries(scope_level, scope_owner_id)
         WHERE scope_level IN ('group', 'individual')",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS personalities(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            prompt TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

fn ensure_individuals_contact_handle(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "individuals", "contact_handle")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE individuals ADD COLUMN contact_handle TEXT", [])?;
    Ok(())
}

fn ensure_context_entries_updated_at(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "context_entries", "updated_at")? {
        return Ok(());
    }
    conn.execute(
        "ALTER TABLE context_entries ADD COLUMN updated_at TEXT NOT NULL DEFAULT ''",
        [],
    )?;
    // Backfill from creation time.
    conn.execute(
        "UPDATE context_entries SET updated_at = created_at WHERE updated_at = ''",
        [],
    )?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn settings_get_json(
    conn: &Connection,
    key: &str,
) -> rusqlite::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM settings WHERE key = ?",
            [key],
            |r| r.get(0),
        )
        .optional()?;
    // Unparseable values are treated as unset.
    Ok(raw.and_then(|s| serde_json::from_str(&s).ok()))
}

pub fn settings_set_json(
    conn: &Connection,
    key: &str,
    value: &serde_json::Value,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value_json) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
        (key, value.to_string()),
    )?;
    Ok(())
}
