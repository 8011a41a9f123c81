use crate::application::redirect::{author_only, ensure_author, Access, Redirect, WriteOutcome};
use crate::data::{CommentRepository, PostRepository};
use crate::domain::comment::CommentForm;
use crate::domain::{Comment, DomainError, PostQuery};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct CommentEditForm {
    pub comment: Comment,
    pub form: CommentForm,
}

pub struct CommentService {
    post_repo: Arc<dyn PostRepository + Send + Sync>,
    comment_repo: Arc<dyn CommentRepository + Send + Sync>,
}

impl CommentService {
    pub fn new(
        post_repo: Arc<dyn PostRepository + Send + Sync>,
        comment_repo: Arc<dyn CommentRepository + Send + Sync>,
    ) -> Self {
        Self {
            post_repo,
            comment_repo,
        }
    }

    /// Comments may only be left on posts anyone can read.
    pub async fn add_comment(
        &self,
        post_id: i64,
        author_id: i64,
        form: CommentForm,
    ) -> Result<WriteOutcome<Comment>, DomainError> {
        let post = self
            .post_repo
            .find_in(&PostQuery::public(Utc::now()), post_id)
            .await?;
        form.validate()?;

        let comment = self.comment_repo.create(author_id, post.id, &form).await?;
        tracing::info!(
            "Comment created: id={}, post_id={}, author_id={}",
            comment.id,
            post.id,
            author_id
        );

        Ok(WriteOutcome::Done {
            value: comment,
            redirect: Redirect::PostDetail(post.id),
        })
    }

    pub async fn comment_form(
        &self,
        post_id: i64,
        comment_id: i64,
        user_id: i64,
    ) -> Result<Access<CommentEditForm>, DomainError> {
        let comment = self.comment_repo.find(post_id, comment_id).await?;

        if let Err(redirect) =
            ensure_author(comment.author_id, user_id, Redirect::PostDetail(post_id))
        {
            return Ok(Access::Redirected(redirect));
        }

        let form = CommentForm::from(&comment);
        Ok(Access::Granted(CommentEditForm { comment, form }))
    }

    pub async fn update_comment(
        &self,
        post_id: i64,
        comment_id: i64,
        user_id: i64,
        form: CommentForm,
    ) -> Result<WriteOutcome<Comment>, DomainError> {
        let comment = self.comment_repo.find(post_id, comment_id).await?;
        let target = Redirect::PostDetail(post_id);

        author_only(comment.author_id, user_id, target.clone(), target, || async {
            form.validate()?;
            let updated = self.comment_repo.update(comment.id, &form).await?;
            tracing::info!("Comment updated: id={}, post_id={}", comment.id, post_id);
            Ok(updated)
        })
        .await
    }

    pub async fn delete_comment(
        &self,
        post_id: i64,
        comment_id: i64,
        user_id: i64,
    ) -> Result<WriteOutcome<()>, DomainError> {
        let comment = self.comment_repo.find(post_id, comment_id).await?;
        let target = Redirect::PostDetail(post_id);

        author_only(comment.author_id, user_id, target.clone(), target, || async {
            self.comment_repo.delete(comment.id).await?;
            tracing::info!("Comment deleted: id={}, post_id={}", comment.id, post_id);
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::InMemoryStore;
    use crate::domain::User;
    use chrono::Duration;

    struct Fixture {
        store: Arc<InMemoryStore>,
        service: CommentService,
        author: User,
        reader: User,
        open: i64,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let service = CommentService::new(store.clone(), store.clone());
        let author = store.seed_user("author", false);
        let reader = store.seed_user("reader", false);
        let open = store.seed_category("open", true).id;
        Fixture {
            store,
            service,
            author,
            reader,
            open,
        }
    }

    fn text(value: &str) -> CommentForm {
        CommentForm {
            text: value.to_string(),
        }
    }

    #[actix_rt::test]
    async fn comment_is_attached_to_requester_and_post() {
        let f = fixture();
        let post = f.store.seed_post(f.author.id, Some(f.open), true, Duration::hours(1));

        let outcome = f
            .service
            .add_comment(post.id, f.reader.id, text("Интересно"))
            .await
            .unwrap();

        assert_eq!(outcome.redirect(), &Redirect::PostDetail(post.id));
        match outcome {
            WriteOutcome::Done { value, .. } => {
                assert_eq!(value.author_id, f.reader.id);
                assert_eq!(value.post_id, post.id);
                assert_eq!(value.text, "Интересно");
            }
            WriteOutcome::Refused(_) => panic!("comment was refused"),
        }
    }

    #[actix_rt::test]
    async fn comments_on_hidden_posts_are_not_found() {
        let f = fixture();
        let draft = f.store.seed_post(f.author.id, Some(f.open), false, Duration::hours(1));
        let scheduled = f.store.seed_post(f.author.id, Some(f.open), true, Duration::days(-1));

        for post_id in [draft.id, scheduled.id, 999] {
            let err = f
                .service
                .add_comment(post_id, f.author.id, text("hi"))
                .await
                .unwrap_err();
            assert!(matches!(err, DomainError::PostNotFound));
        }
    }

    #[actix_rt::test]
    async fn empty_comment_is_rejected() {
        let f = fixture();
        let post = f.store.seed_post(f.author.id, Some(f.open), true, Duration::hours(1));

        let err = f
            .service
            .add_comment(post.id, f.reader.id, text("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[actix_rt::test]
    async fn non_author_cannot_touch_a_comment() {
        let f = fixture();
        let post = f.store.seed_post(f.author.id, Some(f.open), true, Duration::hours(1));
        let comment = f.store.seed_comment(f.reader.id, post.id, "original");

        let outcome = f
            .service
            .update_comment(post.id, comment.id, f.author.id, text("changed"))
            .await
            .unwrap();
        assert!(outcome.is_refused());
        assert_eq!(outcome.redirect(), &Redirect::PostDetail(post.id));

        let outcome = f
            .service
            .delete_comment(post.id, comment.id, f.author.id)
            .await
            .unwrap();
        assert!(outcome.is_refused());

        let access = f
            .service
            .comment_form(post.id, comment.id, f.author.id)
            .await
            .unwrap();
        assert!(matches!(access, Access::Redirected(_)));

        assert_eq!(f.store.comment(comment.id).unwrap().text, "original");
    }

    #[actix_rt::test]
    async fn author_edits_and_deletes_own_comment() {
        let f = fixture();
        let post = f.store.seed_post(f.author.id, Some(f.open), true, Duration::hours(1));
        let comment = f.store.seed_comment(f.reader.id, post.id, "original");

        match f
            .service
            .comment_form(post.id, comment.id, f.reader.id)
            .await
            .unwrap()
        {
            Access::Granted(edit) => assert_eq!(edit.form.text, "original"),
            Access::Redirected(_) => panic!("author was redirected"),
        }

        f.service
            .update_comment(post.id, comment.id, f.reader.id, text("edited"))
            .await
            .unwrap();
        assert_eq!(f.store.comment(comment.id).unwrap().text, "edited");

        let outcome = f
            .service
            .delete_comment(post.id, comment.id, f.reader.id)
            .await
            .unwrap();
        assert_eq!(outcome.redirect(), &Redirect::PostDetail(post.id));
        assert!(f.store.comment(comment.id).is_none());
    }

    #[actix_rt::test]
    async fn comment_must_belong_to_the_post_in_the_url() {
        let f = fixture();
        let first = f.store.seed_post(f.author.id, Some(f.open), true, Duration::hours(1));
        let second = f.store.seed_post(f.author.id, Some(f.open), true, Duration::hours(2));
        let comment = f.store.seed_comment(f.reader.id, first.id, "hi");

        let err = f
            .service
            .delete_comment(second.id, comment.id, f.reader.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::CommentNotFound));
        assert!(f.store.comment(comment.id).is_some());
    }
}
