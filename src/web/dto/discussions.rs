use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::{Comment, Discussion};

#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DiscussionCreateBody {
    pub course_id: Uuid,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CommentBody {
    pub content: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DiscussionWithComments {
    #[serde(flatten)]
    pub discussion: Discussion,
    /// Oldest first
    pub comments: Vec<Comment>,
}

impl DiscussionWithComments {
    /// Attaches every comment to its thread, thread order is kept.
    pub fn group(discussions: Vec<Discussion>, comments: Vec<Comment>) -> Vec<Self> {
        let mut by_thread: HashMap<Uuid, Vec<Comment>> = HashMap::new();
        for comment in comments {
            by_thread
                .entry(comment.discussion_id())
                .or_default()
                .push(comment);
        }

        discussions
            .into_iter()
            .map(|discussion| {
                let comments = by_thread.remove(&discussion.id()).unwrap_or_default();
                Self {
                    discussion,
                    comments,
                }
            })
            .collect()
    }
}

pub fn validate_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    Ok(())
}
