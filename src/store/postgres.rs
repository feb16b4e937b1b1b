use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnection, PgPool};
use sqlx::FromRow;
use uuid::Uuid;

use super::{
    CommentRepository, FollowRepository, LikeRepository, NotificationRepository, PostRepository,
    Store, StoreError, UserRepository, WriteOutcome,
};
use crate::account::model::{FollowCounts, NewUser, ProfileUpdate, User, UserBrief};
use crate::auth::jwt::Role;
use crate::comment::model::{Comment, CommentFilter, NewComment};
use crate::notification::model::{NewNotification, Notification, NotificationTarget, Verb};
use crate::pagination::{PageRequest, Paginated};
use crate::post::model::{NewPost, Post, PostFilter, PostOrdering, PostStats, PostUpdate};

const USER_COLUMNS: &str = "id, username, email, bio, role, date_joined";

const POST_SELECT: &str = r#"
    SELECT p.id, p.title, p.content, p.author_id, u.username AS author_username,
           p.created_at, p.updated_at
    FROM global.posts p
    JOIN global.users u ON u.id = p.author_id
"#;

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.post_id, c.author_id, u.username AS author_username, c.content,
           c.created_at, c.updated_at
    FROM global.comments c
    JOIN global.users u ON u.id = c.author_id
"#;

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    bio: String,
    role: String,
    date_joined: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role).map_err(decode_error)?;
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            bio: row.bio,
            role,
            date_joined: row.date_joined,
        })
    }
}

#[derive(Debug, FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

#[derive(Debug, FromRow)]
struct PostRow {
    id: i64,
    title: String,
    content: String,
    author_id: Uuid,
    author_username: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            title: row.title,
            content: row.content,
            author: UserBrief {
                id: row.author_id,
                username: row.author_username,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct PostStatsRow {
    id: i64,
    comments_count: i64,
    likes_count: i64,
    is_liked: bool,
}

#[derive(Debug, FromRow)]
struct CommentRow {
    id: i64,
    post_id: i64,
    author_id: Uuid,
    author_username: String,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            post_id: row.post_id,
            author: UserBrief {
                id: row.author_id,
                username: row.author_username,
            },
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: i64,
    recipient_id: Uuid,
    actor_id: Uuid,
    actor_username: String,
    verb: String,
    target_post_id: Option<i64>,
    target_user_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    is_read: bool,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = StoreError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let verb = Verb::parse(&row.verb)
            .ok_or_else(|| decode_error(format!("Unknown notification verb: {}", row.verb)))?;
        let target = match (row.target_post_id, row.target_user_id) {
            (Some(post), None) => NotificationTarget::Post(post),
            (None, Some(user)) => NotificationTarget::User(user),
            _ => {
                return Err(decode_error(format!(
                    "Notification {} must have exactly one target",
                    row.id
                )))
            }
        };
        Ok(Notification {
            id: row.id,
            recipient_id: row.recipient_id,
            actor: UserBrief {
                id: row.actor_id,
                username: row.actor_username,
            },
            verb,
            target,
            timestamp: row.created_at,
            read: row.is_read,
        })
    }
}

fn decode_error(message: String) -> StoreError {
    StoreError::Database(sqlx::Error::Decode(message.into()))
}

/// Turns constraint violations into domain errors
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        let constraint = db.constraint().unwrap_or_default();
        match db.code().as_deref() {
            Some("23505") if constraint.contains("email") => {
                return StoreError::Duplicate("email")
            }
            Some("23505") if constraint.contains("username") => {
                return StoreError::Duplicate("username")
            }
            Some("23503") if constraint.contains("post_id") => {
                return StoreError::MissingReference("post")
            }
            Some("23503") => return StoreError::MissingReference("user"),
            _ => {}
        }
    }
    StoreError::Database(err)
}

/// `ILIKE` pattern matching `term` anywhere, with wildcards in `term` escaped
fn contains_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn order_clause(ordering: PostOrdering) -> &'static str {
    match ordering {
        PostOrdering::NewestFirst => "ORDER BY p.created_at DESC, p.id DESC",
        PostOrdering::OldestFirst => "ORDER BY p.created_at ASC, p.id ASC",
        PostOrdering::RecentlyUpdated => "ORDER BY p.updated_at DESC, p.id DESC",
        PostOrdering::LeastRecentlyUpdated => "ORDER BY p.updated_at ASC, p.id ASC",
    }
}

async fn insert_notification(
    conn: &mut PgConnection,
    new: NewNotification,
) -> Result<Notification, StoreError> {
    let (target_post, target_user) = match new.target {
        NotificationTarget::Post(id) => (Some(id), None),
        NotificationTarget::User(id) => (None, Some(id)),
    };

    let row = sqlx::query_as::<_, NotificationRow>(
        r#"
        WITH inserted AS (
            INSERT INTO global.notifications
                (recipient_id, actor_id, verb, target_post_id, target_user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, recipient_id, actor_id, verb, target_post_id, target_user_id,
                      created_at, is_read
        )
        SELECT i.id, i.recipient_id, i.actor_id, u.username AS actor_username, i.verb,
               i.target_post_id, i.target_user_id, i.created_at, i.is_read
        FROM inserted i
        JOIN global.users u ON u.id = i.actor_id
        "#,
    )
    .bind(new.recipient_id)
    .bind(new.actor_id)
    .bind(new.verb.as_str())
    .bind(target_post)
    .bind(target_user)
    .fetch_one(&mut *conn)
    .await
    .map_err(classify)?;

    Notification::try_from(row)
}

/// Postgres-backed store; composite writes run in one transaction
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO global.users (id, username, email, password_hash, bio, role, date_joined)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.bio)
        .bind(new.role.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;

        User::try_from(row)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM global.users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, StoreError> {
        let row = sqlx::query_as::<_, CredentialsRow>(&format!(
            "SELECT {}, password_hash FROM global.users WHERE LOWER(username) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some((User::try_from(row.user)?, row.password_hash))),
            None => Ok(None),
        }
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE global.users
            SET email = COALESCE($2, email), bio = COALESCE($3, bio)
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(update.email)
        .bind(update.bio)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?
        .map(User::try_from)
        .transpose()
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        // Foreign keys cascade to follows, posts, comments, likes and notifications
        let result = sqlx::query("DELETE FROM global.users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl FollowRepository for PgStore {
    async fn insert_follow(
        &self,
        follower: Uuid,
        followee: Uuid,
        notification: Option<NewNotification>,
    ) -> Result<WriteOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO global.follows (follower_id, followee_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(follower)
        .bind(followee)
        .execute(&mut *tx)
        .await
        .map_err(classify)?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            return Ok(WriteOutcome::Unchanged);
        }

        let notification = match notification {
            Some(new) => Some(insert_notification(&mut tx, new).await?),
            None => None,
        };
        tx.commit().await?;

        Ok(WriteOutcome::Applied { notification })
    }

    async fn delete_follow(&self, follower: Uuid, followee: Uuid) -> Result<bool, StoreError> {
        let result =
            sqlx::query("DELETE FROM global.follows WHERE follower_id = $1 AND followee_id = $2")
                .bind(follower)
                .bind(followee)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn followers(&self, user: Uuid) -> Result<Vec<UserBrief>, StoreError> {
        let rows = sqlx::query_as::<_, (Uuid, String)>(
            r#"
            SELECT u.id, u.username
            FROM global.follows f
            JOIN global.users u ON u.id = f.follower_id
            WHERE f.followee_id = $1
            ORDER BY u.username
            "#,
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, username)| UserBrief { id, username })
            .collect())
    }

    async fn following(&self, user: Uuid) -> Result<Vec<UserBrief>, StoreError> {
        let rows = sqlx::query_as::<_, (Uuid, String)>(
            r#"
            SELECT u.id, u.username
            FROM global.follows f
            JOIN global.users u ON u.id = f.followee_id
            WHERE f.follower_id = $1
            ORDER BY u.username
            "#,
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, username)| UserBrief { id, username })
            .collect())
    }

    async fn following_ids(&self, user: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT followee_id FROM global.follows WHERE follower_id = $1",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn follow_counts(&self, user: Uuid) -> Result<FollowCounts, StoreError> {
        let (followers, following) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM global.follows WHERE followee_id = $1),
                (SELECT COUNT(*) FROM global.follows WHERE follower_id = $1)
            "#,
        )
        .bind(user)
        .fetch_one(&self.pool)
        .await?;

        Ok(FollowCounts {
            followers: followers as u64,
            following: following as u64,
        })
    }
}

#[async_trait]
impl PostRepository for PgStore {
    async fn create_post(&self, new: NewPost) -> Result<Post, StoreError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            WITH inserted AS (
                INSERT INTO global.posts (author_id, title, content, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $4)
                RETURNING id, title, content, author_id, created_at, updated_at
            )
            SELECT i.id, i.title, i.content, i.author_id, u.username AS author_username,
                   i.created_at, i.updated_at
            FROM inserted i
            JOIN global.users u ON u.id = i.author_id
            "#,
        )
        .bind(new.author_id)
        .bind(&new.title)
        .bind(&new.content)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;

        Ok(row.into())
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>, StoreError> {
        let row = sqlx::query_as::<_, PostRow>(&format!("{} WHERE p.id = $1", POST_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Post::from))
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<Paginated<Post>, StoreError> {
        let search = filter.search.as_deref().map(contains_pattern);
        let condition = r#"
            WHERE ($1::uuid IS NULL OR p.author_id = $1)
              AND ($2::text IS NULL OR p.title ILIKE $2 OR p.content ILIKE $2)
        "#;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM global.posts p {}",
            condition
        ))
        .bind(filter.author)
        .bind(search.as_deref())
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "{} {} {} LIMIT $3 OFFSET $4",
            POST_SELECT,
            condition,
            order_clause(filter.ordering)
        ))
        .bind(filter.author)
        .bind(search.as_deref())
        .bind(page.page_size as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(Paginated::new(
            rows.into_iter().map(Post::from).collect(),
            total as u64,
            page,
        ))
    }

    async fn filter_by_author_in(
        &self,
        authors: &[Uuid],
        page: PageRequest,
    ) -> Result<Paginated<Post>, StoreError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM global.posts WHERE author_id = ANY($1)")
                .bind(authors)
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "{} WHERE p.author_id = ANY($1) {} LIMIT $2 OFFSET $3",
            POST_SELECT,
            order_clause(PostOrdering::NewestFirst)
        ))
        .bind(authors)
        .bind(page.page_size as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(Paginated::new(
            rows.into_iter().map(Post::from).collect(),
            total as u64,
            page,
        ))
    }

    async fn update_post(&self, id: i64, update: PostUpdate) -> Result<Option<Post>, StoreError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            WITH updated AS (
                UPDATE global.posts
                SET title = COALESCE($2, title),
                    content = COALESCE($3, content),
                    updated_at = $4
                WHERE id = $1
                RETURNING id, title, content, author_id, created_at, updated_at
            )
            SELECT p.id, p.title, p.content, p.author_id, u.username AS author_username,
                   p.created_at, p.updated_at
            FROM updated p
            JOIN global.users u ON u.id = p.author_id
            "#,
        )
        .bind(id)
        .bind(update.title)
        .bind(update.content)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Post::from))
    }

    async fn delete_post(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM global.posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn post_stats(
        &self,
        post_ids: &[i64],
        viewer: Option<Uuid>,
    ) -> Result<Vec<(i64, PostStats)>, StoreError> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, PostStatsRow>(
            r#"
            SELECT p.id,
                   (SELECT COUNT(*) FROM global.comments c WHERE c.post_id = p.id) AS comments_count,
                   (SELECT COUNT(*) FROM global.likes l WHERE l.post_id = p.id) AS likes_count,
                   EXISTS (
                       SELECT 1 FROM global.likes l
                       WHERE l.post_id = p.id AND l.user_id = $2
                   ) AS is_liked
            FROM global.posts p
            WHERE p.id = ANY($1)
            "#,
        )
        .bind(post_ids)
        .bind(viewer)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let stats = PostStats {
                    comments_count: row.comments_count as u64,
                    likes_count: row.likes_count as u64,
                    is_liked: row.is_liked,
                };
                (row.id, stats)
            })
            .collect())
    }
}

#[async_trait]
impl LikeRepository for PgStore {
    async fn insert_like(
        &self,
        user: Uuid,
        post_id: i64,
        notification: Option<NewNotification>,
    ) -> Result<WriteOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO global.likes (user_id, post_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user)
        .bind(post_id)
        .execute(&mut *tx)
        .await
        .map_err(classify)?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            return Ok(WriteOutcome::Unchanged);
        }

        let notification = match notification {
            Some(new) => Some(insert_notification(&mut tx, new).await?),
            None => None,
        };
        tx.commit().await?;

        Ok(WriteOutcome::Applied { notification })
    }

    async fn delete_like(&self, user: Uuid, post_id: i64) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM global.likes WHERE user_id = $1 AND post_id = $2")
            .bind(user)
            .bind(post_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            DELETE FROM global.notifications
            WHERE actor_id = $1 AND verb = 'like' AND target_post_id = $2
            "#,
        )
        .bind(user)
        .bind(post_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}

#[async_trait]
impl CommentRepository for PgStore {
    async fn create_comment(
        &self,
        new: NewComment,
        notification: Option<NewNotification>,
    ) -> Result<(Comment, Option<Notification>), StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            WITH inserted AS (
                INSERT INTO global.comments (post_id, author_id, content, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $4)
                RETURNING id, post_id, author_id, content, created_at, updated_at
            )
            SELECT i.id, i.post_id, i.author_id, u.username AS author_username, i.content,
                   i.created_at, i.updated_at
            FROM inserted i
            JOIN global.users u ON u.id = i.author_id
            "#,
        )
        .bind(new.post_id)
        .bind(new.author_id)
        .bind(&new.content)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;

        let notification = match notification {
            Some(n) => Some(insert_notification(&mut tx, n).await?),
            None => None,
        };
        tx.commit().await?;

        Ok((row.into(), notification))
    }

    async fn find_comment(&self, id: i64) -> Result<Option<Comment>, StoreError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!("{} WHERE c.id = $1", COMMENT_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Comment::from))
    }

    async fn list_comments(
        &self,
        filter: &CommentFilter,
        page: PageRequest,
    ) -> Result<Paginated<Comment>, StoreError> {
        let search = filter.search.as_deref().map(contains_pattern);
        let condition = r#"
            WHERE ($1::bigint IS NULL OR c.post_id = $1)
              AND ($2::uuid IS NULL OR c.author_id = $2)
              AND ($3::text IS NULL OR c.content ILIKE $3)
        "#;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM global.comments c {}",
            condition
        ))
        .bind(filter.post)
        .bind(filter.author)
        .bind(search.as_deref())
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "{} {} ORDER BY c.created_at ASC, c.id ASC LIMIT $4 OFFSET $5",
            COMMENT_SELECT, condition
        ))
        .bind(filter.post)
        .bind(filter.author)
        .bind(search.as_deref())
        .bind(page.page_size as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(Paginated::new(
            rows.into_iter().map(Comment::from).collect(),
            total as u64,
            page,
        ))
    }

    async fn update_comment(
        &self,
        id: i64,
        content: String,
    ) -> Result<Option<Comment>, StoreError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            WITH updated AS (
                UPDATE global.comments
                SET content = $2, updated_at = $3
                WHERE id = $1
                RETURNING id, post_id, author_id, content, created_at, updated_at
            )
            SELECT c.id, c.post_id, c.author_id, u.username AS author_username, c.content,
                   c.created_at, c.updated_at
            FROM updated c
            JOIN global.users u ON u.id = c.author_id
            "#,
        )
        .bind(id)
        .bind(&content)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Comment::from))
    }

    async fn delete_comment(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM global.comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl NotificationRepository for PgStore {
    async fn list_notifications(
        &self,
        recipient: Uuid,
        page: PageRequest,
    ) -> Result<Paginated<Notification>, StoreError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM global.notifications WHERE recipient_id = $1",
        )
        .bind(recipient)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT n.id, n.recipient_id, n.actor_id, u.username AS actor_username, n.verb,
                   n.target_post_id, n.target_user_id, n.created_at, n.is_read
            FROM global.notifications n
            JOIN global.users u ON u.id = n.actor_id
            WHERE n.recipient_id = $1
            ORDER BY n.created_at DESC, n.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(recipient)
        .bind(page.page_size as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(Notification::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Paginated::new(items, total as u64, page))
    }

    async fn count_unread(&self, recipient: Uuid) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM global.notifications WHERE recipient_id = $1 AND NOT is_read",
        )
        .bind(recipient)
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }

    async fn mark_read(&self, id: i64, recipient: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE global.notifications SET is_read = TRUE WHERE id = $1 AND recipient_id = $2",
        )
        .bind(id)
        .bind(recipient)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, recipient: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE global.notifications SET is_read = TRUE WHERE recipient_id = $1 AND NOT is_read",
        )
        .bind(recipient)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
