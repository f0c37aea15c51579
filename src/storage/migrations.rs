use rusqlite::Connection;

/// Database schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current_version < SCHEMA_VERSION {
        for version in (current_version + 1)..=SCHEMA_VERSION {
            apply_migration(conn, version)?;
            conn.execute(
                "INSERT INTO schema_migrations (version) VALUES (?1)",
                [version],
            )?;
        }
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: i32) -> rusqlite::Result<()> {
    match version {
        1 => migration_v1(conn),
        _ => Ok(()),
    }
}

/// Initial schema
fn migration_v1(conn: &Connection) -> rusqlite::Result<()> {
    // Monitored host registrations; token stored as SHA-256 hex digest only
    conn.execute(
        "CREATE TABLE IF NOT EXISTS servers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id INTEGER NOT NULL DEFAULT 1,
            name TEXT NOT NULL,
            hostname TEXT,
            token TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL DEFAULT 'offline',
            last_seen_at TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            agent_version TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_servers_last_seen ON servers(last_seen_at)",
        [],
    )?;

    // One row per ingested snapshot; structured sections are opaque JSON text
    conn.execute(
        "CREATE TABLE IF NOT EXISTS metrics (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            server_id INTEGER NOT NULL REFERENCES servers(id) ON DELETE CASCADE,
            recorded_at TEXT NOT NULL,
            uptime INTEGER,
            load_1m REAL,
            load_5m REAL,
            load_15m REAL,
            cpu_cores INTEGER,
            memory_total INTEGER,
            memory_used INTEGER,
            memory_available INTEGER,
            swap_total INTEGER,
            swap_used INTEGER,
            disks TEXT,
            services TEXT,
            network TEXT,
            security TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_metrics_server_time
         ON metrics(server_id, recorded_at)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_metrics_time ON metrics(recorded_at)",
        [],
    )?;

    // Append-only ban/unban history per (server, ip)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS banned_ip_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            server_id INTEGER NOT NULL REFERENCES servers(id) ON DELETE CASCADE,
            ip_address TEXT NOT NULL,
            event_type TEXT NOT NULL CHECK (event_type IN ('ban', 'unban')),
            jail TEXT,
            country_code TEXT,
            country TEXT,
            city TEXT,
            isp TEXT,
            event_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_ban_events_server_ip
         ON banned_ip_events(server_id, ip_address)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_ban_events_server_time
         ON banned_ip_events(server_id, event_at)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_ban_events_time ON banned_ip_events(event_at)",
        [],
    )?;

    // Alert thresholds; NULL server_id is the owner's global default
    conn.execute(
        "CREATE TABLE IF NOT EXISTS thresholds (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id INTEGER NOT NULL DEFAULT 1,
            server_id INTEGER REFERENCES servers(id) ON DELETE CASCADE,
            metric TEXT NOT NULL,
            warning_value REAL NOT NULL,
            critical_value REAL NOT NULL,
            comparison TEXT NOT NULL DEFAULT '>',
            is_active INTEGER NOT NULL DEFAULT 1
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_thresholds_lookup
         ON thresholds(owner_id, metric)",
        [],
    )?;

    Ok(())
}
