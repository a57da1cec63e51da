use crate::DomainResult;
use crate::comments::Comment;
use crate::error::DomainError;
use crate::likes::Like;

#[derive(Clone, Debug)]
pub enum StagedWrite {
    InsertLike(Like),
    DeleteLike(Like),
    InsertComment(Comment),
    DeleteComment(Comment),
    DeleteWish,
}

/// Ordered writes of an open transaction, overlaid on committed reads.
#[derive(Clone, Debug, Default)]
pub struct WriteSet {
    writes: Vec<StagedWrite>,
}

impl WriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn wish_deleted(&self) -> bool {
        self.writes
            .iter()
            .any(|write| matches!(write, StagedWrite::DeleteWish))
    }

    pub fn ensure_live(&self) -> DomainResult<()> {
        if self.wish_deleted() {
            return Err(DomainError::WishNotFound);
        }
        Ok(())
    }

    pub fn push(&mut self, write: StagedWrite) {
        self.writes.push(write);
    }

    /// `Some(state)` when a staged write decides the actor's like.
    pub fn like_state(&self, actor_id: &str) -> Option<Option<Like>> {
        self.writes.iter().rev().find_map(|write| match write {
            StagedWrite::InsertLike(like) if like.actor_id == actor_id => Some(Some(like.clone())),
            StagedWrite::DeleteLike(like) if like.actor_id == actor_id => Some(None),
            _ => None,
        })
    }

    pub fn comment_state(&self, comment_id: &str) -> Option<Option<Comment>> {
        self.writes.iter().rev().find_map(|write| match write {
            StagedWrite::InsertComment(comment) if comment.comment_id == comment_id => {
                Some(Some(comment.clone()))
            }
            StagedWrite::DeleteComment(comment) if comment.comment_id == comment_id => Some(None),
            _ => None,
        })
    }

    /// Applies staged inserts and deletes to committed replies of `parent_id`.
    pub fn overlay_replies(&self, parent_id: &str, committed: Vec<Comment>) -> Vec<Comment> {
        let mut replies: Vec<Comment> = committed
            .into_iter()
            .filter(|comment| !matches!(self.comment_state(&comment.comment_id), Some(None)))
            .collect();
        for write in &self.writes {
            if let StagedWrite::InsertComment(comment) = write
                && comment.parent_id.as_deref() == Some(parent_id)
                && matches!(self.comment_state(&comment.comment_id), Some(Some(_)))
                && !replies
                    .iter()
                    .any(|existing| existing.comment_id == comment.comment_id)
            {
                replies.push(comment.clone());
            }
        }
        replies
    }

    pub fn iter(&self) -> impl Iterator<Item = &StagedWrite> {
        self.writes.iter()
    }
}

impl IntoIterator for WriteSet {
    type Item = StagedWrite;
    type IntoIter = std::vec::IntoIter<StagedWrite>;

    fn into_iter(self) -> Self::IntoIter {
        self.writes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn like(actor_id: &str) -> Like {
        Like {
            like_id: format!("like-{actor_id}"),
            wish_id: "w1".to_string(),
            actor_id: actor_id.to_string(),
            created_at_ms: 1,
        }
    }

    fn comment(comment_id: &str, parent_id: Option<&str>) -> Comment {
        Comment {
            comment_id: comment_id.to_string(),
            wish_id: "w1".to_string(),
            author_id: "u1".to_string(),
            parent_id: parent_id.map(str::to_string),
            content: "hi".to_string(),
            created_at_ms: 1,
        }
    }

    #[test]
    fn latest_staged_like_write_wins() {
        let mut writes = WriteSet::new();
        assert_eq!(writes.like_state("u1"), None);
        writes.push(StagedWrite::InsertLike(like("u1")));
        assert!(matches!(writes.like_state("u1"), Some(Some(_))));
        writes.push(StagedWrite::DeleteLike(like("u1")));
        assert_eq!(writes.like_state("u1"), Some(None));
        assert_eq!(writes.like_state("u2"), None);
    }

    #[test]
    fn overlay_hides_deleted_and_adds_staged_replies() {
        let mut writes = WriteSet::new();
        writes.push(StagedWrite::DeleteComment(comment("r1", Some("root"))));
        writes.push(StagedWrite::InsertComment(comment("r3", Some("root"))));
        writes.push(StagedWrite::InsertComment(comment("x", Some("other"))));

        let replies = writes.overlay_replies(
            "root",
            vec![comment("r1", Some("root")), comment("r2", Some("root"))],
        );
        let ids: Vec<&str> = replies.iter().map(|c| c.comment_id.as_str()).collect();
        assert_eq!(ids, vec!["r2", "r3"]);
    }

    #[test]
    fn deleted_wish_refuses_further_writes() {
        let mut writes = WriteSet::new();
        assert!(writes.ensure_live().is_ok());
        writes.push(StagedWrite::DeleteWish);
        assert!(matches!(
            writes.ensure_live(),
            Err(DomainError::WishNotFound)
        ));
    }
}
