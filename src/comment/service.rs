use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::auth::permissions::{authorize, Denied, Resource, AUTHOR_ONLY};
use crate::comment::model::{
    Comment, CommentError, CommentFilter, CommentListParams, CommentResponse,
    CommentsListResponse, CreateCommentRequest, NewComment, COMMENTS_PER_PAGE, COMMENT_MAX_LEN,
};
use crate::notification::model::{NotificationTarget, Verb};
use crate::notification::service::NotificationService;
use crate::pagination::{PageParams, PageRequest, Paginated};
use crate::store::{Store, StoreError};

impl From<Denied> for CommentError {
    fn from(denied: Denied) -> Self {
        match denied {
            Denied::Unauthenticated => CommentError::Unauthenticated,
            Denied::Forbidden(reason) => CommentError::Forbidden(reason),
        }
    }
}

fn validate_content(content: &str) -> Result<String, CommentError> {
    if content.trim().is_empty() {
        return Err(CommentError::ValidationError(
            "Comment content cannot be empty".to_string(),
        ));
    }
    if content.chars().count() > COMMENT_MAX_LEN {
        return Err(CommentError::ValidationError(format!(
            "Comment content cannot exceed {} characters",
            COMMENT_MAX_LEN
        )));
    }
    Ok(content.to_string())
}

fn to_list_response(page: Paginated<Comment>) -> CommentsListResponse {
    let total_pages = page.total_pages();
    CommentsListResponse {
        count: page.total,
        page: page.page,
        page_size: page.page_size,
        total_pages,
        results: page.items.into_iter().map(CommentResponse::from).collect(),
    }
}

pub struct CommentService {
    store: Arc<dyn Store>,
    notifications: NotificationService,
}

impl CommentService {
    pub fn new(store: Arc<dyn Store>, notifications: NotificationService) -> Self {
        Self {
            store,
            notifications,
        }
    }

    async fn existing_comment(&self, id: i64) -> Result<Comment, CommentError> {
        self.store
            .find_comment(id)
            .await?
            .ok_or(CommentError::NotFound)
    }

    pub async fn create_comment(
        &self,
        author: Uuid,
        request: CreateCommentRequest,
    ) -> Result<CommentResponse, CommentError> {
        let content = validate_content(&request.content)?;
        let post = self
            .store
            .find_post(request.post)
            .await?
            .ok_or(CommentError::PostNotFound)?;

        let notification = NotificationService::compose(
            post.author.id,
            author,
            Verb::Comment,
            NotificationTarget::Post(post.id),
        );
        let new = NewComment {
            post_id: post.id,
            author_id: author,
            content,
        };
        let (comment, notification) = match self.store.create_comment(new, notification).await {
            Ok(created) => created,
            Err(StoreError::MissingReference("post")) => return Err(CommentError::PostNotFound),
            Err(e) => return Err(e.into()),
        };
        info!("Created comment {} on post {}", comment.id, post.id);
        self.notifications.publish(notification.as_ref()).await;

        Ok(comment.into())
    }

    pub async fn get_comment(&self, id: i64) -> Result<CommentResponse, CommentError> {
        Ok(self.existing_comment(id).await?.into())
    }

    pub async fn list_comments(
        &self,
        params: CommentListParams,
    ) -> Result<CommentsListResponse, CommentError> {
        let filter = CommentFilter {
            post: params.post,
            author: params.author,
            search: params.search.filter(|s| !s.trim().is_empty()),
        };
        let page = PageRequest::new(
            params.page.unwrap_or(1),
            params.page_size.unwrap_or(COMMENTS_PER_PAGE),
        );
        let comments = self.store.list_comments(&filter, page).await?;
        Ok(to_list_response(comments))
    }

    pub async fn list_post_comments(
        &self,
        post_id: i64,
        params: &PageParams,
    ) -> Result<CommentsListResponse, CommentError> {
        if self.store.find_post(post_id).await?.is_none() {
            return Err(CommentError::PostNotFound);
        }
        let filter = CommentFilter {
            post: Some(post_id),
            ..Default::default()
        };
        let page = PageRequest::from_params(params, COMMENTS_PER_PAGE);
        let comments = self.store.list_comments(&filter, page).await?;
        Ok(to_list_response(comments))
    }

    pub async fn update_comment(
        &self,
        id: i64,
        user: &AuthUser,
        content: String,
    ) -> Result<CommentResponse, CommentError> {
        let comment = self.existing_comment(id).await?;
        authorize(Some(user), &Resource::owned_by(comment.author.id), AUTHOR_ONLY)?;
        let content = validate_content(&content)?;

        let comment = self
            .store
            .update_comment(id, content)
            .await?
            .ok_or(CommentError::NotFound)?;
        info!("Updated comment {}", id);
        Ok(comment.into())
    }

    pub async fn delete_comment(&self, id: i64, user: &AuthUser) -> Result<(), CommentError> {
        let comment = self.existing_comment(id).await?;
        authorize(Some(user), &Resource::owned_by(comment.author.id), AUTHOR_ONLY)?;

        if !self.store.delete_comment(id).await? {
            return Err(CommentError::NotFound);
        }
        info!("Deleted comment {}", id);
        Ok(())
    }
}
