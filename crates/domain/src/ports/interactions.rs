use crate::DomainResult;
use crate::comments::Comment;
use crate::counters::CounterKind;
use crate::likes::Like;
use crate::wishes::Wish;

use super::BoxFuture;

/// Wish rows outside of any target lock.
pub trait WishRepository: Send + Sync {
    fn create(&self, wish: &Wish) -> BoxFuture<'_, DomainResult<Wish>>;

    fn get(&self, wish_id: &str) -> BoxFuture<'_, DomainResult<Option<Wish>>>;
}

/// Entry point for mutating a wish and the rows hanging off it.
///
/// Reads through this trait only ever observe committed state.
pub trait InteractionStore: Send + Sync {
    /// Takes the exclusive lock on `wish_id` and opens a unit of work on it.
    /// Resolves to `None` when the wish does not exist; the lock is released
    /// in that case.
    fn begin(&self, wish_id: &str)
    -> BoxFuture<'_, DomainResult<Option<Box<dyn TargetTransaction>>>>;

    fn get_comment(&self, comment_id: &str) -> BoxFuture<'_, DomainResult<Option<Comment>>>;

    fn find_like(&self, wish_id: &str, actor_id: &str)
    -> BoxFuture<'_, DomainResult<Option<Like>>>;

    /// Newest first.
    fn list_likes(&self, wish_id: &str, limit: usize) -> BoxFuture<'_, DomainResult<Vec<Like>>>;

    /// Oldest first.
    fn list_comments(&self, wish_id: &str) -> BoxFuture<'_, DomainResult<Vec<Comment>>>;
}

/// A unit of work holding the lock of one wish.
///
/// Writes are staged until [`TargetTransaction::commit`]. Reads see the
/// staged writes. Dropping the transaction without committing discards
/// everything and releases the lock.
#[allow(clippy::needless_pass_by_value)]
pub trait TargetTransaction: Send {
    /// The locked wish, including counter writes staged so far.
    fn wish(&self) -> &Wish;

    fn find_like(&mut self, actor_id: &str) -> BoxFuture<'_, DomainResult<Option<Like>>>;

    fn insert_like(&mut self, like: Like) -> BoxFuture<'_, DomainResult<()>>;

    fn delete_like(&mut self, like: &Like) -> BoxFuture<'_, DomainResult<()>>;

    fn find_comment(&mut self, comment_id: &str) -> BoxFuture<'_, DomainResult<Option<Comment>>>;

    fn list_replies(&mut self, parent_id: &str) -> BoxFuture<'_, DomainResult<Vec<Comment>>>;

    fn insert_comment(&mut self, comment: Comment) -> BoxFuture<'_, DomainResult<()>>;

    fn delete_comment(&mut self, comment: &Comment) -> BoxFuture<'_, DomainResult<()>>;

    fn write_counter(&mut self, kind: CounterKind, value: u64) -> BoxFuture<'_, DomainResult<()>>;

    /// Removes the wish together with its likes and comments.
    fn delete_wish(&mut self) -> BoxFuture<'_, DomainResult<()>>;

    fn commit(self: Box<Self>) -> BoxFuture<'static, DomainResult<()>>;
}
