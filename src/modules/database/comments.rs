use rusqlite::{params, Result};
use serde::{Deserialize, Serialize};

use super::storage::BlogDB;

/// Comment joined with its author's name.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: Option<i64>,
    pub author_name: String,
    pub text: String,
}

impl BlogDB {
    /// Add a comment by `author_id` to `post_id`.
    pub fn add_comment(&self, post_id: i64, author_id: i64, text: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO comments (author_id, post_id, text) VALUES (?, ?, ?)",
            params![author_id, post_id, text],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Comments on a post, oldest first.
    pub fn get_comments_for_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.post_id, c.author_id, COALESCE(u.name, 'Unknown'), c.text
             FROM comments c LEFT JOIN users u ON u.id = c.author_id
             WHERE c.post_id = ? ORDER BY c.id",
        )?;

        let comments = stmt
            .query_map(params![post_id], |row| {
                Ok(Comment {
                    id: row.get(0)?,
                    post_id: row.get(1)?,
                    author_id: row.get(2)?,
                    author_name: row.get(3)?,
                    text: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(comments)
    }

    pub fn count_comments(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM comments", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::database::storage::tests::temp_db_path;
    use crate::modules::database::storage::{Insert, PostContent};

    #[test]
    fn test_comments_follow_their_post() {
        let path = temp_db_path();
        let db = BlogDB::open(&path).unwrap();

        let admin = match db.create_user("admin@x.com", "Admin", "hash").unwrap() {
            Insert::Created(user) => user,
            Insert::Duplicate => unreachable!(),
        };
        let reader = match db.create_user("reader@x.com", "Reader", "hash").unwrap() {
            Insert::Created(user) => user,
            Insert::Duplicate => unreachable!(),
        };
        let content = PostContent {
            title: "Post".to_string(),
            subtitle: "Sub".to_string(),
            body: "Body".to_string(),
            img_url: "https://example.com/a.png".to_string(),
        };
        let post = match db.create_post(&content, "October 19, 2026", &admin).unwrap() {
            Insert::Created(post) => post,
            Insert::Duplicate => unreachable!(),
        };

        db.add_comment(post.id, reader.id, "first!").unwrap();
        db.add_comment(post.id, admin.id, "thanks").unwrap();

        let comments = db.get_comments_for_post(post.id).unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].text, "first!");
        assert_eq!(comments[0].author_name, "Reader");
        assert_eq!(comments[1].author_id, Some(admin.id));

        db.delete_post(post.id).unwrap();
        assert_eq!(db.count_comments().unwrap(), 0);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_comment_on_missing_post_fails() {
        let path = temp_db_path();
        let db = BlogDB::open(&path).unwrap();
        let user = match db.create_user("a@x.com", "A", "hash").unwrap() {
            Insert::Created(user) => user,
            Insert::Duplicate => unreachable!(),
        };

        assert!(db.add_comment(999, user.id, "orphan").is_err());
        assert_eq!(db.count_comments().unwrap(), 0);

        std::fs::remove_file(&path).ok();
    }
}
