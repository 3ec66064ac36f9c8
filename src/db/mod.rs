mod sqlite;

pub use sqlite::{
    associate_user_with_tag, count_rows, create_tables, fetch_indexes, fetch_properties,
    insert_tag, insert_user, open,
};

pub const USERS_TABLE: &str = "users";
pub const TAGS_TABLE: &str = "tags";
pub const USER_TAGS_TABLE: &str = "user_tags";

/// Highest rank an association can carry; ranks span `0..=MAX_RANK`.
pub const MAX_RANK: i64 = 9;

/// DDL for the fixture schema, executed in order against a fresh file.
pub const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name VARCHAR(64) NOT NULL,
        CONSTRAINT unique_user_id UNIQUE (id)
    )
    "#,
    "CREATE INDEX user_id_index ON users (id)",
    r#"
    CREATE TABLE tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title VARCHAR(64) NOT NULL,
        CONSTRAINT unique_tag_id UNIQUE (id)
    )
    "#,
    "CREATE INDEX tag_id_index ON tags (id)",
    r#"
    CREATE TABLE user_tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INT NOT NULL,
        tag_id INT NOT NULL,
        rank INT NOT NULL DEFAULT 0,
        CONSTRAINT unique_user_tag_id UNIQUE (id)
    )
    "#,
    "CREATE INDEX user_tag_id_index ON user_tags (id)",
    "CREATE INDEX ut_uid_index ON user_tags (user_id)",
    "CREATE INDEX ut_tid_index ON user_tags (tag_id)",
    "CREATE INDEX ut_rank_index ON user_tags (rank)",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub primary_key: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexInfo {
    pub name: String,
    pub unique: bool,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TableProperties {
    pub columns: Vec<ColumnInfo>,
    pub indexes: Vec<IndexInfo>,
}

impl TableProperties {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// True if some index covers exactly `column`.
    pub fn is_indexed(&self, column: &str) -> bool {
        self.indexes
            .iter()
            .any(|i| i.columns.len() == 1 && i.columns[0] == column)
    }
}
