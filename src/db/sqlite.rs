use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use super::{ColumnInfo, IndexInfo, TableProperties, SCHEMA};
use crate::logger::debug;

pub fn open(path: &Path) -> Result<Connection> {
    debug(&format!("sqlite: opening {}", path.display()));
    let conn = Connection::open(path)
        .with_context(|| format!("failed to open sqlite database at {}", path.display()))?;
    debug("sqlite: opened");
    Ok(conn)
}

pub fn create_tables(conn: &Connection) -> Result<()> {
    for ddl in SCHEMA {
        conn.execute_batch(ddl)
            .with_context(|| format!("failed to execute DDL: {}", ddl.trim()))?;
    }
    Ok(())
}

/// Insert a tag row and return its id.
pub fn insert_tag(conn: &Connection, title: &str) -> Result<i64> {
    conn.prepare_cached("INSERT INTO tags (title) VALUES (?1)")?
        .execute(params![title])?;
    Ok(conn.last_insert_rowid())
}

/// Insert a user row and return its id.
pub fn insert_user(conn: &Connection, name: &str) -> Result<i64> {
    conn.prepare_cached("INSERT INTO users (name) VALUES (?1)")?
        .execute(params![name])?;
    Ok(conn.last_insert_rowid())
}

pub fn associate_user_with_tag(
    conn: &Connection,
    user_id: i64,
    tag_id: i64,
    rank: i64,
) -> Result<()> {
    conn.prepare_cached("INSERT INTO user_tags (user_id, tag_id, rank) VALUES (?1, ?2, ?3)")?
        .execute(params![user_id, tag_id, rank])?;
    Ok(())
}

pub fn count_rows(conn: &Connection, table: &str) -> Result<usize> {
    let sql = format!("SELECT COUNT(*) FROM {}", table);
    let n: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(n as usize)
}

pub fn fetch_indexes(conn: &Connection, table: &str) -> Result<Vec<IndexInfo>> {
    let mut list_stmt = conn.prepare(&format!("PRAGMA index_list({});", table))?;
    // name is col 1, unique is col 2
    let listed = list_stmt
        .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, i64>(2)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut indexes = Vec::with_capacity(listed.len());
    for (name, unique) in listed {
        let mut info_stmt = conn.prepare(&format!("PRAGMA index_info({});", name))?;
        let columns = info_stmt
            .query_map([], |row| row.get::<_, String>(2))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        indexes.push(IndexInfo {
            name,
            unique: unique != 0,
            columns,
        });
    }
    Ok(indexes)
}

pub fn fetch_properties(conn: &Connection, table: &str) -> Result<TableProperties> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", table))?;
    let columns = stmt
        .query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get(1)?,
                data_type: row.get(2)?,
                nullable: row.get::<_, i64>(3)? == 0,
                default: row.get(4)?,
                primary_key: row.get::<_, i64>(5)? != 0,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(TableProperties {
        columns,
        indexes: fetch_indexes(conn, table)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{TAGS_TABLE, USERS_TABLE, USER_TAGS_TABLE};

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    fn table_sql(conn: &Connection, table: &str) -> String {
        conn.query_row(
            "SELECT sql FROM sqlite_master WHERE type='table' AND name=?1",
            [table],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn users_schema() {
        let conn = memory_db();
        let props = fetch_properties(&conn, USERS_TABLE).unwrap();
        assert_eq!(props.column_names(), vec!["id", "name"]);

        let id = props.column("id").unwrap();
        assert!(id.primary_key);
        assert_eq!(id.data_type, "INTEGER");

        let name = props.column("name").unwrap();
        assert_eq!(name.data_type, "VARCHAR(64)");
        assert!(!name.nullable);

        assert!(props.is_indexed("id"));
        assert!(table_sql(&conn, USERS_TABLE).contains("UNIQUE (id)"));
    }

    #[test]
    fn tags_schema() {
        let conn = memory_db();
        let props = fetch_properties(&conn, TAGS_TABLE).unwrap();
        assert_eq!(props.column_names(), vec!["id", "title"]);
        assert!(!props.column("title").unwrap().nullable);
        let tag_index = props.indexes.iter().find(|i| i.name == "tag_id_index").unwrap();
        assert_eq!(tag_index.columns, vec!["id"]);
        assert!(!tag_index.unique);
        assert!(table_sql(&conn, TAGS_TABLE).contains("UNIQUE (id)"));
    }

    #[test]
    fn user_tags_schema() {
        let conn = memory_db();
        let props = fetch_properties(&conn, USER_TAGS_TABLE).unwrap();
        assert_eq!(props.column_names(), vec!["id", "user_id", "tag_id", "rank"]);

        let rank = props.column("rank").unwrap();
        assert_eq!(rank.data_type, "INT");
        assert_eq!(rank.default.as_deref(), Some("0"));

        for column in ["id", "user_id", "tag_id", "rank"] {
            assert!(props.is_indexed(column), "missing index on {column}");
        }
        let names: Vec<_> = props.indexes.iter().map(|i| i.name.as_str()).collect();
        for expected in ["user_tag_id_index", "ut_uid_index", "ut_tid_index", "ut_rank_index"] {
            assert!(names.contains(&expected), "missing {expected}");
        }
        // Plain CREATE INDEX statements never enforce uniqueness.
        assert!(props
            .indexes
            .iter()
            .filter(|i| i.name.starts_with("ut_"))
            .all(|i| !i.unique));
        assert!(table_sql(&conn, USER_TAGS_TABLE).contains("UNIQUE (id)"));
    }

    #[test]
    fn create_tables_twice_fails() {
        let conn = memory_db();
        assert!(create_tables(&conn).is_err());
    }

    #[test]
    fn inserts_return_row_ids() {
        let conn = memory_db();
        assert_eq!(insert_tag(&conn, "smart").unwrap(), 1);
        assert_eq!(insert_tag(&conn, "slow").unwrap(), 2);
        let user = insert_user(&conn, "adam").unwrap();
        associate_user_with_tag(&conn, user, 2, 7).unwrap();

        assert_eq!(count_rows(&conn, TAGS_TABLE).unwrap(), 2);
        assert_eq!(count_rows(&conn, USERS_TABLE).unwrap(), 1);
        let (tag_id, rank): (i64, i64) = conn
            .query_row("SELECT tag_id, rank FROM user_tags", [], |r| Ok((r.get(0)?, r.get(1)?)))
            .unwrap();
        assert_eq!((tag_id, rank), (2, 7));
    }

    #[test]
    fn rank_defaults_to_zero() {
        let conn = memory_db();
        conn.execute("INSERT INTO user_tags (user_id, tag_id) VALUES (1, 1)", [])
            .unwrap();
        let rank: i64 = conn
            .query_row("SELECT rank FROM user_tags", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rank, 0);
    }
}
