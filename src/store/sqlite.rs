use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{ffi, params, Connection, ErrorCode, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{Result, TributaryError};
use crate::domain::{Feed, NewPost, Post};
use crate::store::{FeedStore, PostStore};

const FEED_COLUMNS: &str = "id, url, title, description, language, last_fetched_at, created_at";
const POST_COLUMNS: &str =
    "id, feed_id, title, description, link, author, published_at, created_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrations.to_latest(&mut conn)?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| TributaryError::LockPoisoned(e.to_string()))
    }

    pub fn get_all_feeds(&self) -> Result<Vec<Feed>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {FEED_COLUMNS} FROM feeds ORDER BY title, url"
        ))?;

        let feeds = stmt
            .query_map([], feed_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(feeds)
    }

    pub fn get_posts_by_feed(&self, feed_id: i64) -> Result<Vec<Post>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE feed_id = ?1
             ORDER BY published_at DESC, created_at DESC"
        ))?;

        let posts = stmt
            .query_map(params![feed_id], post_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(posts)
    }
}

impl FeedStore for SqliteStore {
    fn add_feed(&self, feed: &Feed) -> Result<i64> {
        let conn = self.conn()?;

        let inserted = conn.execute(
            "INSERT INTO feeds (url, title, description, language, last_fetched_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                feed.url,
                feed.title,
                feed.description,
                feed.language,
                feed.last_fetched_at.as_ref().map(to_db_time),
                to_db_time(&feed.created_at)
            ],
        );

        match inserted {
            Ok(_) => Ok(conn.last_insert_rowid()),
            Err(e) if is_unique_violation(&e) => Err(TributaryError::FeedExists(feed.url.clone())),
            Err(e) => Err(e.into()),
        }
    }

    fn select_least_recently_fetched(&self, limit: usize) -> Result<Vec<Feed>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {FEED_COLUMNS} FROM feeds
             ORDER BY last_fetched_at IS NOT NULL, last_fetched_at ASC, id ASC
             LIMIT ?1"
        ))?;

        let feeds = stmt
            .query_map(params![limit as i64], feed_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(feeds)
    }

    fn get_feed_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let conn = self.conn()?;

        let feed = conn
            .query_row(
                &format!("SELECT {FEED_COLUMNS} FROM feeds WHERE url = ?1"),
                params![url],
                feed_from_row,
            )
            .optional()?;

        Ok(feed)
    }

    fn advance_last_fetched_at(&self, url: &str, at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn()?;
        let at = to_db_time(&at);

        // Timestamps are fixed-width UTC strings, so text order is time order.
        let changed = conn.execute(
            "UPDATE feeds SET last_fetched_at = ?1
             WHERE url = ?2 AND (last_fetched_at IS NULL OR last_fetched_at < ?1)",
            params![at, url],
        )?;

        if changed == 0 {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM feeds WHERE url = ?1)",
                params![url],
                |row| row.get(0),
            )?;
            if !exists {
                return Err(TributaryError::FeedNotFound(url.to_string()));
            }
        }

        Ok(())
    }
}

impl PostStore for SqliteStore {
    fn known_links(&self, feed_id: i64) -> Result<HashSet<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT link FROM posts WHERE feed_id = ?1")?;

        let links = stmt
            .query_map(params![feed_id], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<HashSet<_>, _>>()?;

        Ok(links)
    }

    fn insert_post(&self, post: &NewPost) -> Result<()> {
        let conn = self.conn()?;

        let inserted = conn.execute(
            "INSERT INTO posts (id, feed_id, title, description, link, author, published_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                post.id(),
                post.feed_id,
                post.title,
                post.description,
                post.link,
                post.author,
                to_db_time(&post.published_at),
                to_db_time(&Utc::now())
            ],
        );

        match inserted {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(TributaryError::DuplicatePost {
                feed_id: post.feed_id,
                link: post.link.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

fn to_db_time(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.code == ErrorCode::ConstraintViolation
                && (e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
        }
        _ => false,
    }
}

fn feed_from_row(row: &Row<'_>) -> rusqlite::Result<Feed> {
    Ok(Feed {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        language: row.get(4)?,
        last_fetched_at: row
            .get::<_, Option<String>>(5)?
            .and_then(|s| parse_datetime(&s)),
        created_at: row
            .get::<_, String>(6)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        feed_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        link: row.get(4)?,
        author: row.get(5)?,
        published_at: row
            .get::<_, String>(6)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
        created_at: row
            .get::<_, String>(7)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
    })
}
