use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, to_value};
use surrealdb::Surreal;
use surrealdb::engine::remote::ws::Client;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use wishwall_domain::DomainResult;
use wishwall_domain::comments::Comment;
use wishwall_domain::consistency::{DEFAULT_LOCK_TIMEOUT, TargetLockGuard, TargetLocks};
use wishwall_domain::counters::CounterKind;
use wishwall_domain::error::DomainError;
use wishwall_domain::likes::Like;
use wishwall_domain::ports::BoxFuture;
use wishwall_domain::ports::interactions::{InteractionStore, TargetTransaction, WishRepository};
use wishwall_domain::ports::profiles::{ProfileDirectory, PublicProfile};
use wishwall_domain::staging::{StagedWrite, WriteSet};
use wishwall_domain::util::now_ms;
use wishwall_domain::wishes::Wish;

const SCHEMA: &str = "\
    DEFINE TABLE IF NOT EXISTS wish SCHEMALESS; \
    DEFINE TABLE IF NOT EXISTS wish_like SCHEMALESS; \
    DEFINE TABLE IF NOT EXISTS wish_comment SCHEMALESS; \
    DEFINE TABLE IF NOT EXISTS user_profile SCHEMALESS; \
    DEFINE INDEX IF NOT EXISTS wish_id_unique ON TABLE wish FIELDS wish_id UNIQUE; \
    DEFINE INDEX IF NOT EXISTS wish_like_actor_unique ON TABLE wish_like FIELDS wish_id, actor_id UNIQUE; \
    DEFINE INDEX IF NOT EXISTS wish_comment_wish_idx ON TABLE wish_comment FIELDS wish_id; \
    DEFINE INDEX IF NOT EXISTS wish_comment_parent_idx ON TABLE wish_comment FIELDS parent_id; \
    DEFINE INDEX IF NOT EXISTS wish_comment_id_unique ON TABLE wish_comment FIELDS comment_id UNIQUE; \
    DEFINE INDEX IF NOT EXISTS user_profile_user_unique ON TABLE user_profile FIELDS user_id UNIQUE;";

const WISH_FIELDS: &str = "wish_id, owner_id, content, is_public, like_count, comment_count, \
     revision, created_at_ms, updated_at_ms";
const LIKE_FIELDS: &str = "like_id, wish_id, actor_id, created_at_ms";
const COMMENT_FIELDS: &str = "comment_id, wish_id, author_id, parent_id, content, created_at_ms";

/// SurrealDB backend for wishes, likes and comments.
///
/// Mutations of one wish are serialized in-process by [`TargetLocks`] and
/// committed as a single `BEGIN TRANSACTION ... COMMIT TRANSACTION` query that
/// re-checks the wish revision, so a second process writing the same wish
/// surfaces as [`DomainError::Conflict`] instead of a lost update.
#[derive(Clone)]
pub struct SurrealInteractionStore {
    client: Arc<Surreal<Client>>,
    locks: TargetLocks,
    lock_timeout: Duration,
}

impl SurrealInteractionStore {
    pub fn with_client(client: Arc<Surreal<Client>>) -> Self {
        Self::with_lock_timeout(client, DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(client: Arc<Surreal<Client>>, lock_timeout: Duration) -> Self {
        Self {
            client,
            locks: TargetLocks::new(),
            lock_timeout,
        }
    }

    pub async fn ensure_schema(&self) -> DomainResult<()> {
        self.client
            .query(SCHEMA)
            .await
            .map_err(map_surreal_error)?
            .check()
            .map_err(map_surreal_error)?;
        Ok(())
    }
}

impl WishRepository for SurrealInteractionStore {
    fn create(&self, wish: &Wish) -> BoxFuture<'_, DomainResult<Wish>> {
        let payload = match SurrealWishWriteRow::from_wish(wish) {
            Ok(payload) => payload,
            Err(err) => return Box::pin(async move { Err(err) }),
        };
        let wish_id = wish.wish_id.clone();
        let client = self.client.clone();
        Box::pin(async move {
            let payload = to_value(payload)
                .map_err(|err| DomainError::Validation(format!("invalid payload: {err}")))?;
            let sql = format!(
                "CREATE type::thing('wish', $wish_id) SET \
                    wish_id = $payload.wish_id, \
                    owner_id = $payload.owner_id, \
                    content = $payload.content, \
                    is_public = $payload.is_public, \
                    like_count = $payload.like_count, \
                    comment_count = $payload.comment_count, \
                    revision = $payload.revision, \
                    created_at = <datetime>$payload.created_at, \
                    created_at_ms = $payload.created_at_ms, \
                    updated_at = <datetime>$payload.updated_at, \
                    updated_at_ms = $payload.updated_at_ms; \
                 SELECT {WISH_FIELDS} FROM wish WHERE wish_id = $wish_id LIMIT 1"
            );
            let mut response = client
                .query(sql)
                .bind(("wish_id", wish_id))
                .bind(("payload", payload))
                .await
                .map_err(map_surreal_error)?
                .check()
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response.take(1).map_err(map_take_error)?;
            decode_one::<SurrealWishRow>(rows, "wish")?
                .map(Wish::from)
                .ok_or_else(|| DomainError::Transient("wish create returned no row".to_string()))
        })
    }

    fn get(&self, wish_id: &str) -> BoxFuture<'_, DomainResult<Option<Wish>>> {
        let wish_id = wish_id.to_string();
        let client = self.client.clone();
        Box::pin(async move { fetch_wish(&client, wish_id).await })
    }
}

impl InteractionStore for SurrealInteractionStore {
    fn begin(
        &self,
        wish_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<Box<dyn TargetTransaction>>>> {
        let wish_id = wish_id.to_string();
        Box::pin(async move {
            let guard = self.locks.acquire(&wish_id, self.lock_timeout).await?;
            let Some(wish) = fetch_wish(&self.client, wish_id).await? else {
                return Ok(None);
            };
            let tx: Box<dyn TargetTransaction> = Box::new(SurrealTargetTransaction {
                client: self.client.clone(),
                base: wish.clone(),
                wish,
                staged: WriteSet::new(),
                _guard: guard,
            });
            Ok(Some(tx))
        })
    }

    fn get_comment(&self, comment_id: &str) -> BoxFuture<'_, DomainResult<Option<Comment>>> {
        let comment_id = comment_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let sql = format!(
                "SELECT {COMMENT_FIELDS} FROM wish_comment WHERE comment_id = $comment_id LIMIT 1"
            );
            let mut response = client
                .query(sql)
                .bind(("comment_id", comment_id))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response.take(0).map_err(map_take_error)?;
            Ok(decode_one::<SurrealCommentRow>(rows, "comment")?.map(Comment::from))
        })
    }

    fn find_like(
        &self,
        wish_id: &str,
        actor_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<Like>>> {
        let wish_id = wish_id.to_string();
        let actor_id = actor_id.to_string();
        let client = self.client.clone();
        Box::pin(async move { fetch_like(&client, wish_id, actor_id).await })
    }

    fn list_likes(&self, wish_id: &str, limit: usize) -> BoxFuture<'_, DomainResult<Vec<Like>>> {
        let wish_id = wish_id.to_string();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let client = self.client.clone();
        Box::pin(async move {
            let sql = format!(
                "SELECT {LIKE_FIELDS} FROM wish_like WHERE wish_id = $wish_id \
                 ORDER BY created_at_ms DESC, like_id DESC LIMIT $limit"
            );
            let mut response = client
                .query(sql)
                .bind(("wish_id", wish_id))
                .bind(("limit", limit))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response.take(0).map_err(map_take_error)?;
            Ok(decode_many::<SurrealLikeRow>(rows, "like")?
                .into_iter()
                .map(Like::from)
                .collect())
        })
    }

    fn list_comments(&self, wish_id: &str) -> BoxFuture<'_, DomainResult<Vec<Comment>>> {
        let wish_id = wish_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let sql = format!(
                "SELECT {COMMENT_FIELDS} FROM wish_comment WHERE wish_id = $wish_id \
                 ORDER BY created_at_ms ASC, comment_id ASC"
            );
            let mut response = client
                .query(sql)
                .bind(("wish_id", wish_id))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response.take(0).map_err(map_take_error)?;
            Ok(decode_many::<SurrealCommentRow>(rows, "comment")?
                .into_iter()
                .map(Comment::from)
                .collect())
        })
    }
}

struct SurrealTargetTransaction {
    client: Arc<Surreal<Client>>,
    /// Wish as read at `begin`; its revision guards the commit.
    base: Wish,
    wish: Wish,
    staged: WriteSet,
    _guard: TargetLockGuard,
}

impl TargetTransaction for SurrealTargetTransaction {
    fn wish(&self) -> &Wish {
        &self.wish
    }

    fn find_like(&mut self, actor_id: &str) -> BoxFuture<'_, DomainResult<Option<Like>>> {
        let actor_id = actor_id.to_string();
        Box::pin(async move {
            if let Some(staged) = self.staged.like_state(&actor_id) {
                return Ok(staged);
            }
            fetch_like(&self.client, self.wish.wish_id.clone(), actor_id).await
        })
    }

    fn insert_like(&mut self, like: Like) -> BoxFuture<'_, DomainResult<()>> {
        Box::pin(async move {
            self.staged.ensure_live()?;
            if like.wish_id != self.wish.wish_id {
                return Err(DomainError::Validation(
                    "like does not belong to the locked wish".to_string(),
                ));
            }
            let exists = match self.staged.like_state(&like.actor_id) {
                Some(staged) => staged.is_some(),
                None => fetch_like(&self.client, like.wish_id.clone(), like.actor_id.clone())
                    .await?
                    .is_some(),
            };
            if exists {
                return Err(DomainError::Conflict);
            }
            self.staged.push(StagedWrite::InsertLike(like));
            Ok(())
        })
    }

    fn delete_like(&mut self, like: &Like) -> BoxFuture<'_, DomainResult<()>> {
        let like = like.clone();
        Box::pin(async move {
            self.staged.ensure_live()?;
            self.staged.push(StagedWrite::DeleteLike(like));
            Ok(())
        })
    }

    fn find_comment(&mut self, comment_id: &str) -> BoxFuture<'_, DomainResult<Option<Comment>>> {
        let comment_id = comment_id.to_string();
        Box::pin(async move {
            if let Some(staged) = self.staged.comment_state(&comment_id) {
                return Ok(staged);
            }
            let sql = format!(
                "SELECT {COMMENT_FIELDS} FROM wish_comment \
                 WHERE comment_id = $comment_id AND wish_id = $wish_id LIMIT 1"
            );
            let mut response = self
                .client
                .query(sql)
                .bind(("comment_id", comment_id))
                .bind(("wish_id", self.wish.wish_id.clone()))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response.take(0).map_err(map_take_error)?;
            Ok(decode_one::<SurrealCommentRow>(rows, "comment")?.map(Comment::from))
        })
    }

    fn list_replies(&mut self, parent_id: &str) -> BoxFuture<'_, DomainResult<Vec<Comment>>> {
        let parent_id = parent_id.to_string();
        Box::pin(async move {
            let sql = format!(
                "SELECT {COMMENT_FIELDS} FROM wish_comment WHERE parent_id = $parent_id \
                 ORDER BY created_at_ms ASC, comment_id ASC"
            );
            let mut response = self
                .client
                .query(sql)
                .bind(("parent_id", parent_id.clone()))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response.take(0).map_err(map_take_error)?;
            let committed = decode_many::<SurrealCommentRow>(rows, "comment")?
                .into_iter()
                .map(Comment::from)
                .collect();
            Ok(self.staged.overlay_replies(&parent_id, committed))
        })
    }

    fn insert_comment(&mut self, comment: Comment) -> BoxFuture<'_, DomainResult<()>> {
        Box::pin(async move {
            self.staged.ensure_live()?;
            if comment.wish_id != self.wish.wish_id {
                return Err(DomainError::Validation(
                    "comment does not belong to the locked wish".to_string(),
                ));
            }
            self.staged.push(StagedWrite::InsertComment(comment));
            Ok(())
        })
    }

    fn delete_comment(&mut self, comment: &Comment) -> BoxFuture<'_, DomainResult<()>> {
        let comment = comment.clone();
        Box::pin(async move {
            self.staged.ensure_live()?;
            self.staged.push(StagedWrite::DeleteComment(comment));
            Ok(())
        })
    }

    fn write_counter(&mut self, kind: CounterKind, value: u64) -> BoxFuture<'_, DomainResult<()>> {
        Box::pin(async move {
            self.staged.ensure_live()?;
            self.wish.set_counter(kind, value);
            Ok(())
        })
    }

    fn delete_wish(&mut self) -> BoxFuture<'_, DomainResult<()>> {
        Box::pin(async move {
            self.staged.ensure_live()?;
            self.staged.push(StagedWrite::DeleteWish);
            Ok(())
        })
    }

    fn commit(self: Box<Self>) -> BoxFuture<'static, DomainResult<()>> {
        Box::pin(async move {
            let SurrealTargetTransaction {
                client,
                base,
                wish,
                staged,
                _guard,
            } = *self;
            if staged.is_empty() && wish == base {
                return Ok(());
            }

            let plan = CommitPlan::build(&base, &wish, staged)?;
            let mut query = client
                .query(plan.sql)
                .bind(("wish_id", base.wish_id.clone()))
                .bind(("expected_revision", base.revision));
            for (name, value) in plan.binds {
                query = query.bind((name, value));
            }
            let mut response = query.await.map_err(map_surreal_error)?;
            let errors = response.take_errors();
            if errors.is_empty() {
                return Ok(());
            }
            Err(map_transaction_errors(errors.into_values()))
        })
    }
}

/// One multi-statement query applying a write set atomically.
struct CommitPlan {
    sql: String,
    binds: Vec<(String, Value)>,
}

impl CommitPlan {
    fn build(base: &Wish, wish: &Wish, staged: WriteSet) -> DomainResult<Self> {
        let mut sql = String::from(
            "BEGIN TRANSACTION; \
             LET $current = (SELECT VALUE revision FROM ONLY type::thing('wish', $wish_id)); \
             IF $current != $expected_revision { THROW 'revision conflict' }; ",
        );
        let mut binds = Vec::new();
        let mut deleted = false;

        for (index, write) in staged.into_iter().enumerate() {
            let name = format!("w{index}");
            match write {
                StagedWrite::InsertLike(like) => {
                    sql.push_str(&format!(
                        "CREATE type::thing('wish_like', ${name}.like_id) SET \
                            like_id = ${name}.like_id, \
                            wish_id = ${name}.wish_id, \
                            actor_id = ${name}.actor_id, \
                            created_at = <datetime>${name}.created_at, \
                            created_at_ms = ${name}.created_at_ms; "
                    ));
                    binds.push((name, encode(SurrealLikeWriteRow::from_like(&like)?)?));
                }
                StagedWrite::DeleteLike(like) => {
                    sql.push_str(&format!("DELETE type::thing('wish_like', ${name}); "));
                    binds.push((name, Value::String(like.like_id)));
                }
                StagedWrite::InsertComment(comment) => {
                    sql.push_str(&format!(
                        "CREATE type::thing('wish_comment', ${name}.comment_id) SET \
                            comment_id = ${name}.comment_id, \
                            wish_id = ${name}.wish_id, \
                            author_id = ${name}.author_id, \
                            parent_id = ${name}.parent_id, \
                            content = ${name}.content, \
                            created_at = <datetime>${name}.created_at, \
                            created_at_ms = ${name}.created_at_ms; "
                    ));
                    binds.push((
                        name,
                        encode(SurrealCommentWriteRow::from_comment(&comment)?)?,
                    ));
                }
                StagedWrite::DeleteComment(comment) => {
                    sql.push_str(&format!("DELETE type::thing('wish_comment', ${name}); "));
                    binds.push((name, Value::String(comment.comment_id)));
                }
                StagedWrite::DeleteWish => deleted = true,
            }
        }

        if deleted {
            sql.push_str(
                "DELETE wish_like WHERE wish_id = $wish_id; \
                 DELETE wish_comment WHERE wish_id = $wish_id; \
                 DELETE type::thing('wish', $wish_id); ",
            );
        } else {
            let updated_at_ms = now_ms().max(base.updated_at_ms);
            sql.push_str(
                "UPDATE type::thing('wish', $wish_id) SET \
                    like_count = $like_count, \
                    comment_count = $comment_count, \
                    revision = $expected_revision + 1, \
                    updated_at = <datetime>$updated_at, \
                    updated_at_ms = $updated_at_ms; ",
            );
            binds.push(("like_count".to_string(), Value::from(wish.like_count)));
            binds.push(("comment_count".to_string(), Value::from(wish.comment_count)));
            binds.push((
                "updated_at".to_string(),
                Value::String(to_rfc3339(updated_at_ms)?),
            ));
            binds.push(("updated_at_ms".to_string(), Value::from(updated_at_ms)));
        }
        sql.push_str("COMMIT TRANSACTION;");
        Ok(Self { sql, binds })
    }
}

/// Profiles live in the `user_profile` table, owned by the account service.
#[derive(Clone)]
pub struct SurrealProfileDirectory {
    client: Arc<Surreal<Client>>,
}

impl SurrealProfileDirectory {
    pub fn with_client(client: Arc<Surreal<Client>>) -> Self {
        Self { client }
    }
}

impl ProfileDirectory for SurrealProfileDirectory {
    fn public_profile(&self, user_id: &str) -> BoxFuture<'_, DomainResult<Option<PublicProfile>>> {
        let user_id = user_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let mut response = client
                .query(
                    "SELECT user_id, nickname, <string>avatar_id AS avatar_id \
                     FROM user_profile WHERE user_id = $user_id LIMIT 1",
                )
                .bind(("user_id", user_id))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response.take(0).map_err(map_take_error)?;
            Ok(decode_one::<SurrealProfileRow>(rows, "profile")?.map(|row| PublicProfile {
                user_id: row.user_id,
                nickname: row.nickname,
                avatar_id: row.avatar_id.filter(|avatar| !avatar.is_empty()),
            }))
        })
    }
}

async fn fetch_wish(client: &Surreal<Client>, wish_id: String) -> DomainResult<Option<Wish>> {
    let sql = format!("SELECT {WISH_FIELDS} FROM wish WHERE wish_id = $wish_id LIMIT 1");
    let mut response = client
        .query(sql)
        .bind(("wish_id", wish_id))
        .await
        .map_err(map_surreal_error)?;
    let rows: Vec<Value> = response.take(0).map_err(map_take_error)?;
    Ok(decode_one::<SurrealWishRow>(rows, "wish")?.map(Wish::from))
}

async fn fetch_like(
    client: &Surreal<Client>,
    wish_id: String,
    actor_id: String,
) -> DomainResult<Option<Like>> {
    let sql = format!(
        "SELECT {LIKE_FIELDS} FROM wish_like \
         WHERE wish_id = $wish_id AND actor_id = $actor_id LIMIT 1"
    );
    let mut response = client
        .query(sql)
        .bind(("wish_id", wish_id))
        .bind(("actor_id", actor_id))
        .await
        .map_err(map_surreal_error)?;
    let rows: Vec<Value> = response.take(0).map_err(map_take_error)?;
    Ok(decode_one::<SurrealLikeRow>(rows, "like")?.map(Like::from))
}

fn to_rfc3339(timestamp_ms: i64) -> DomainResult<String> {
    let dt = OffsetDateTime::from_unix_timestamp_nanos(timestamp_ms as i128 * 1_000_000)
        .map_err(|err| DomainError::Validation(format!("invalid timestamp: {err}")))?;
    dt.format(&Rfc3339)
        .map_err(|err| DomainError::Validation(format!("invalid timestamp: {err}")))
}

fn encode<T: Serialize>(row: T) -> DomainResult<Value> {
    to_value(row).map_err(|err| DomainError::Validation(format!("invalid payload: {err}")))
}

fn is_conflict_message(message: &str) -> bool {
    message.contains("already exists")
        || message.contains("already contains")
        || message.contains("duplicate")
        || message.contains("unique")
        || message.contains("conflict")
}

fn map_surreal_error(err: surrealdb::Error) -> DomainError {
    let error_message = err.to_string().to_lowercase();
    if is_conflict_message(&error_message) {
        return DomainError::Conflict;
    }
    DomainError::Transient(format!("surreal query failed: {error_message}"))
}

fn map_take_error(err: surrealdb::Error) -> DomainError {
    DomainError::Transient(format!("invalid query result: {err}"))
}

/// A failed transaction reports an error on every statement; only the
/// statement that actually failed carries the cause.
fn map_transaction_errors(errors: impl IntoIterator<Item = surrealdb::Error>) -> DomainError {
    let messages: Vec<String> = errors
        .into_iter()
        .map(|err| err.to_string().to_lowercase())
        .collect();
    if messages.iter().any(|message| is_conflict_message(message)) {
        return DomainError::Conflict;
    }
    let cause = messages
        .iter()
        .find(|message| !message.contains("not executed due to a failed transaction"))
        .or_else(|| messages.first())
        .cloned()
        .unwrap_or_default();
    DomainError::Transient(format!("surreal transaction failed: {cause}"))
}

fn decode_one<T>(rows: Vec<Value>, context: &str) -> DomainResult<Option<T>>
where
    T: for<'de> Deserialize<'de>,
{
    let Some(row) = rows.into_iter().next() else {
        return Ok(None);
    };
    let decoded = serde_json::from_value::<T>(row)
        .map_err(|err| DomainError::Transient(format!("invalid {context} row: {err}")))?;
    Ok(Some(decoded))
}

fn decode_many<T>(rows: Vec<Value>, context: &str) -> DomainResult<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
{
    rows.into_iter()
        .map(|row| {
            serde_json::from_value::<T>(row)
                .map_err(|err| DomainError::Transient(format!("invalid {context} row: {err}")))
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct SurrealWishWriteRow {
    wish_id: String,
    owner_id: String,
    content: String,
    is_public: bool,
    like_count: u64,
    comment_count: u64,
    revision: u64,
    created_at: String,
    created_at_ms: i64,
    updated_at: String,
    updated_at_ms: i64,
}

impl SurrealWishWriteRow {
    fn from_wish(wish: &Wish) -> DomainResult<Self> {
        Ok(Self {
            wish_id: wish.wish_id.clone(),
            owner_id: wish.owner_id.clone(),
            content: wish.content.clone(),
            is_public: wish.is_public,
            like_count: wish.like_count,
            comment_count: wish.comment_count,
            revision: wish.revision,
            created_at: to_rfc3339(wish.created_at_ms)?,
            created_at_ms: wish.created_at_ms,
            updated_at: to_rfc3339(wish.updated_at_ms)?,
            updated_at_ms: wish.updated_at_ms,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SurrealWishRow {
    wish_id: String,
    owner_id: String,
    content: String,
    is_public: bool,
    like_count: u64,
    comment_count: u64,
    #[serde(default)]
    revision: u64,
    created_at_ms: i64,
    updated_at_ms: i64,
}

impl From<SurrealWishRow> for Wish {
    fn from(row: SurrealWishRow) -> Self {
        Wish {
            wish_id: row.wish_id,
            owner_id: row.owner_id,
            content: row.content,
            is_public: row.is_public,
            like_count: row.like_count,
            comment_count: row.comment_count,
            revision: row.revision,
            created_at_ms: row.created_at_ms,
            updated_at_ms: row.updated_at_ms,
        }
    }
}

#[derive(Debug, Serialize)]
struct SurrealLikeWriteRow {
    like_id: String,
    wish_id: String,
    actor_id: String,
    created_at: String,
    created_at_ms: i64,
}

impl SurrealLikeWriteRow {
    fn from_like(like: &Like) -> DomainResult<Self> {
        Ok(Self {
            like_id: like.like_id.clone(),
            wish_id: like.wish_id.clone(),
            actor_id: like.actor_id.clone(),
            created_at: to_rfc3339(like.created_at_ms)?,
            created_at_ms: like.created_at_ms,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SurrealLikeRow {
    like_id: String,
    wish_id: String,
    actor_id: String,
    created_at_ms: i64,
}

impl From<SurrealLikeRow> for Like {
    fn from(row: SurrealLikeRow) -> Self {
        Like {
            like_id: row.like_id,
            wish_id: row.wish_id,
            actor_id: row.actor_id,
            created_at_ms: row.created_at_ms,
        }
    }
}

#[derive(Debug, Serialize)]
struct SurrealCommentWriteRow {
    comment_id: String,
    wish_id: String,
    author_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<String>,
    content: String,
    created_at: String,
    created_at_ms: i64,
}

impl SurrealCommentWriteRow {
    fn from_comment(comment: &Comment) -> DomainResult<Self> {
        Ok(Self {
            comment_id: comment.comment_id.clone(),
            wish_id: comment.wish_id.clone(),
            author_id: comment.author_id.clone(),
            parent_id: comment.parent_id.clone(),
            content: comment.content.clone(),
            created_at: to_rfc3339(comment.created_at_ms)?,
            created_at_ms: comment.created_at_ms,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SurrealCommentRow {
    comment_id: String,
    wish_id: String,
    author_id: String,
    #[serde(default)]
    parent_id: Option<String>,
    content: String,
    created_at_ms: i64,
}

impl From<SurrealCommentRow> for Comment {
    fn from(row: SurrealCommentRow) -> Self {
        Comment {
            comment_id: row.comment_id,
            wish_id: row.wish_id,
            author_id: row.author_id,
            parent_id: row.parent_id,
            content: row.content,
            created_at_ms: row.created_at_ms,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SurrealProfileRow {
    user_id: String,
    nickname: String,
    #[serde(default)]
    avatar_id: Option<String>,
}
