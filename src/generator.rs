//! Builds a fixture database in `<working_dir>/tmp`, fills it with random rows
//! and moves the finished file to `<working_dir>/build`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDateTime};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rusqlite::Connection;
use tempfile::TempPath;

use crate::config::GeneratorConfig;
use crate::db::{self, MAX_RANK};
use crate::logger::{debug, error, info, trace};

pub const TMP_DIR: &str = "tmp";
pub const BUILD_DIR: &str = "build";
const FILE_SUFFIX: &str = "database";
const FILE_EXT: &str = "sqlite";

/// Row counts of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationStats {
    pub tags: usize,
    pub users: usize,
    pub associations: usize,
}

pub struct Generator {
    config: GeneratorConfig,
    rng: StdRng,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self { config, rng })
    }

    /// Generate a database and return the path of the copy under `build/`.
    pub fn execute(&mut self, working_dir: &Path) -> Result<PathBuf> {
        self.execute_with(working_dir, |_| Ok(()))
    }

    /// Like [`Generator::execute`], running `prepare` on the fresh schema
    /// before any rows are inserted.
    pub fn execute_with<F>(&mut self, working_dir: &Path, prepare: F) -> Result<PathBuf>
    where
        F: FnOnce(&Connection) -> Result<()>,
    {
        let started = Instant::now();

        let tmp_dir = working_dir.join(TMP_DIR);
        let build_dir = working_dir.join(BUILD_DIR);
        for dir in [&tmp_dir, &build_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create directory {}", dir.display()))?;
        }

        let stamp = timestamp(Local::now().naive_local());
        let filename = available_file_name(&stamp, &[tmp_dir.as_path(), build_dir.as_path()]);
        // Removed on drop, so a failed run leaves nothing behind in tmp/.
        let temp = TempPath::from_path(tmp_dir.join(&filename));
        let destination = build_dir.join(&filename);

        info(&format!("creating database at {}", temp.display()));
        let mut conn = db::open(&temp)?;
        self.create_tables(&conn)?;
        prepare(&conn)?;
        let stats = self.insert_fake_data(&mut conn)?;
        conn.close().map_err(|(_, err)| err)?;
        debug(&format!("{stats:?}"));

        info(&format!("copying database to {}", destination.display()));
        fs::copy(&temp, &destination).with_context(|| {
            format!(
                "failed to copy {} to {}",
                temp.display(),
                destination.display()
            )
        })?;

        info(&format!("removing temp database {}", temp.display()));
        let temp_display = temp.display().to_string();
        temp.close().with_context(|| format!("failed to remove {temp_display}"))?;

        info(&format!("execution took {}ms", started.elapsed().as_millis()));
        Ok(destination)
    }

    pub fn create_tables(&self, conn: &Connection) -> Result<()> {
        debug("creating tables");
        db::create_tables(conn)
    }

    /// Seed tags and users inside one transaction. Any failure rolls the whole
    /// transaction back and is returned to the caller.
    pub fn insert_fake_data(&mut self, conn: &mut Connection) -> Result<GenerationStats> {
        let tx = conn.transaction()?;
        match self.populate(&tx) {
            Ok(stats) => {
                tx.commit()?;
                info(&format!(
                    "inserted {} tags, {} users and {} associations",
                    stats.tags, stats.users, stats.associations
                ));
                Ok(stats)
            }
            Err(err) => {
                error(&format!("inserting fake data failed, rolling back: {err:#}"));
                if let Err(rollback) = tx.rollback() {
                    error(&format!("rollback failed: {rollback}"));
                }
                Err(err)
            }
        }
    }

    fn populate(&mut self, conn: &Connection) -> Result<GenerationStats> {
        let tag_ids = self.insert_tags(conn)?;
        let mut stats = GenerationStats {
            tags: tag_ids.len(),
            ..GenerationStats::default()
        };

        for _ in 0..self.config.user_rows() {
            let user_id = self.insert_user(conn)?;
            stats.users += 1;
            stats.associations += self.associate_random_tags(conn, user_id, &tag_ids)?;
        }
        Ok(stats)
    }

    /// Insert every configured tag once, returning the ids SQLite assigned.
    fn insert_tags(&self, conn: &Connection) -> Result<Vec<i64>> {
        self.config
            .tags
            .iter()
            .map(|title| db::insert_tag(conn, title))
            .collect()
    }

    fn insert_user(&mut self, conn: &Connection) -> Result<i64> {
        let name = self
            .config
            .names
            .choose(&mut self.rng)
            .ok_or_else(|| anyhow!("no names configured"))?;
        db::insert_user(conn, name)
    }

    fn associate_random_tags(
        &mut self,
        conn: &Connection,
        user_id: i64,
        tag_ids: &[i64],
    ) -> Result<usize> {
        let count = self
            .rng
            .gen_range(self.config.min_tag_assocs..=self.config.max_tag_assocs);
        for _ in 0..count {
            let tag_id = *tag_ids
                .choose(&mut self.rng)
                .ok_or_else(|| anyhow!("no tags to associate user {user_id} with"))?;
            let rank = self.rng.gen_range(0..=MAX_RANK);
            db::associate_user_with_tag(conn, user_id, tag_id, rank)?;
            trace(&format!("associated user {user_id} with tag {tag_id} (rank {rank})"));
        }
        Ok(count)
    }
}

/// `YYYYMMDD-HHMMSS`, the prefix of every generated file name.
pub fn timestamp(now: NaiveDateTime) -> String {
    now.format("%Y%m%d-%H%M%S").to_string()
}

fn file_name(stamp: &str, attempt: usize) -> String {
    if attempt == 0 {
        format!("{stamp}-{FILE_SUFFIX}.{FILE_EXT}")
    } else {
        format!("{stamp}-{FILE_SUFFIX}-{attempt}.{FILE_EXT}")
    }
}

/// First file name for `stamp` that exists in none of `dirs`.
fn available_file_name(stamp: &str, dirs: &[&Path]) -> String {
    (0..)
        .map(|attempt| file_name(stamp, attempt))
        .find(|name| dirs.iter().all(|dir| !dir.join(name).exists()))
        .unwrap_or_else(|| file_name(stamp, 0))
}
