//! Business logic services.

#![allow(missing_docs)]

pub mod chat;
pub mod comment;
pub mod content;
pub mod media;
pub mod member;
pub mod member_deletion;
pub mod relationship;
pub mod session;

pub use chat::{ChatDetails, ChatMessage, ChatService, CreateChatInput, CreateEntryInput};
pub use comment::{CommentService, CommentThread, CreateCommentInput, ReplyInput, ReplyThread};
pub use content::{ContentService, CreatePostInput, PostDetails, UpdatePostInput, post_content};
pub use media::{ImageFormat, MAX_POST_MEDIA, MediaService, MediaUpload};
pub use member::{
    AccessAccountInput, Connections, InitializeAccountInput, MemberProfile, MemberService,
    MemberSummary, UpdateMemberInput, authorize_member_edit,
};
pub use member_deletion::{DeletionReport, MemberDeletionService};
pub use relationship::RelationshipService;
pub use session::{SessionClaims, SessionTokens, TokenKind, TokenService};

use std::collections::HashMap;

use borohub_db::entities::member::Model as MemberModel;

/// Reorder `members` to follow `ids`, dropping IDs with no matching row.
pub(crate) fn order_members_by_ids(
    ids: &[String],
    members: Vec<MemberModel>,
) -> Vec<MemberModel> {
    let mut by_id: HashMap<String, MemberModel> =
        members.into_iter().map(|m| (m.id.clone(), m)).collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}
