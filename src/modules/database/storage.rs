use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Result, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Id of the only account allowed to manage posts.
pub const ADMIN_USER_ID: i64 = 1;

/// Display format of a post's date, e.g. "October 19, 2026".
pub const POST_DATE_FORMAT: &str = "%B %d, %Y";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        password_hash TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS blog_posts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL UNIQUE,
        subtitle TEXT NOT NULL,
        date TEXT NOT NULL,
        body TEXT NOT NULL,
        img_url TEXT NOT NULL,
        author_id INTEGER REFERENCES users(id)
    );

    CREATE TABLE IF NOT EXISTS comments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        author_id INTEGER REFERENCES users(id),
        post_id INTEGER REFERENCES blog_posts(id) ON DELETE CASCADE,
        text TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS sessions (
        token TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id),
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_blog_posts_author ON blog_posts(author_id);
    CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id);
    CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
";

/// Registered account. The password is only ever held as an Argon2 hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.id == ADMIN_USER_ID
    }
}

/// Blog post joined with its author's display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    pub date: String,
    pub body: String,
    pub img_url: String,
    pub author_id: Option<i64>,
    pub author_name: String,
}

/// Fields an admin supplies when creating or editing a post.
#[derive(Debug, Clone)]
pub struct PostContent {
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub img_url: String,
}

/// Outcome of an insert that may hit a unique constraint.
#[derive(Debug)]
pub enum Insert<T> {
    Created(T),
    Duplicate,
}

/// Blog database handle. One is opened per request.
pub struct BlogDB {
    pub(super) conn: Connection,
}

impl BlogDB {
    /// Open (and if needed create) the database at `db_path`.
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // ==================== users ====================

    /// Insert a user. An email already on file yields `Insert::Duplicate`.
    pub fn create_user(&self, email: &str, name: &str, password_hash: &str) -> Result<Insert<User>> {
        let inserted = self.conn.execute(
            "INSERT INTO users (email, name, password_hash) VALUES (?, ?, ?)",
            params![email, name, password_hash],
        );

        match inserted {
            Ok(_) => Ok(Insert::Created(User {
                id: self.conn.last_insert_rowid(),
                email: email.to_string(),
                name: name.to_string(),
                password_hash: password_hash.to_string(),
            })),
            Err(e) if is_unique_violation(&e) => Ok(Insert::Duplicate),
            Err(e) => Err(e),
        }
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.conn
            .query_row(
                "SELECT id, email, name, password_hash FROM users WHERE email = ?",
                params![email],
                user_from_row,
            )
            .optional()
    }

    pub fn count_users(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ==================== posts ====================

    /// All posts in creation order.
    pub fn list_posts(&self) -> Result<Vec<BlogPost>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.title, p.subtitle, p.date, p.body, p.img_url, p.author_id, COALESCE(u.name, 'Unknown')
             FROM blog_posts p LEFT JOIN users u ON u.id = p.author_id
             ORDER BY p.id",
        )?;

        let posts = stmt
            .query_map([], post_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    pub fn get_post(&self, id: i64) -> Result<Option<BlogPost>> {
        self.conn
            .query_row(
                "SELECT p.id, p.title, p.subtitle, p.date, p.body, p.img_url, p.author_id, COALESCE(u.name, 'Unknown')
                 FROM blog_posts p LEFT JOIN users u ON u.id = p.author_id
                 WHERE p.id = ?",
                params![id],
                post_from_row,
            )
            .optional()
    }

    /// Insert a post dated `date` and owned by `author`. A title already in
    /// use yields `Insert::Duplicate`.
    pub fn create_post(&self, content: &PostContent, date: &str, author: &User) -> Result<Insert<BlogPost>> {
        let inserted = self.conn.execute(
            "INSERT INTO blog_posts (title, subtitle, date, body, img_url, author_id)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                content.title,
                content.subtitle,
                date,
                content.body,
                content.img_url,
                author.id
            ],
        );

        match inserted {
            Ok(_) => Ok(Insert::Created(BlogPost {
                id: self.conn.last_insert_rowid(),
                title: content.title.clone(),
                subtitle: content.subtitle.clone(),
                date: date.to_string(),
                body: content.body.clone(),
                img_url: content.img_url.clone(),
                author_id: Some(author.id),
                author_name: author.name.clone(),
            })),
            Err(e) if is_unique_violation(&e) => Ok(Insert::Duplicate),
            Err(e) => Err(e),
        }
    }

    /// Overwrite the mutable fields of a post. Date and author are kept.
    ///
    /// Returns `Ok(None)` when no post has that id.
    pub fn update_post(&self, id: i64, content: &PostContent) -> Result<Option<Insert<()>>> {
        let updated = self.conn.execute(
            "UPDATE blog_posts SET title = ?, subtitle = ?, body = ?, img_url = ? WHERE id = ?",
            params![content.title, content.subtitle, content.body, content.img_url, id],
        );

        match updated {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(Insert::Created(()))),
            Err(e) if is_unique_violation(&e) => Ok(Some(Insert::Duplicate)),
            Err(e) => Err(e),
        }
    }

    /// Delete a post and, through the foreign key, its comments.
    pub fn delete_post(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM blog_posts WHERE id = ?", params![id])?;
        Ok(rows > 0)
    }
}

fn user_from_row(row: &Row<'_>) -> Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        password_hash: row.get(3)?,
    })
}

fn post_from_row(row: &Row<'_>) -> Result<BlogPost> {
    Ok(BlogPost {
        id: row.get(0)?,
        title: row.get(1)?,
        subtitle: row.get(2)?,
        date: row.get(3)?,
        body: row.get(4)?,
        img_url: row.get(5)?,
        author_id: row.get(6)?,
        author_name: row.get(7)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}
