use rusqlite_migration::{M, Migrations};

pub fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(
        "CREATE TABLE addons (
            slug          TEXT PRIMARY KEY,
            name          TEXT NOT NULL,
            author        TEXT,
            note          TEXT,
            enabled       INTEGER NOT NULL DEFAULT 1,
            installed_at  TEXT
        );

        CREATE INDEX idx_addons_enabled ON addons(enabled);",
    )])
}
