//! Database entities.

pub mod chat;
pub mod chat_entry;
pub mod chat_participant;
pub mod comment;
pub mod comment_like;
pub mod comment_reply;
pub mod content_post;
pub mod member;
pub mod member_follow;
pub mod member_restriction;
pub mod post_like;
pub mod post_media;
pub mod reply_like;

pub use chat::Entity as Chat;
pub use chat_entry::Entity as ChatEntry;
pub use chat_participant::Entity as ChatParticipant;
pub use comment::Entity as Comment;
pub use comment_like::Entity as CommentLike;
pub use comment_reply::Entity as CommentReply;
pub use content_post::Entity as ContentPost;
pub use member::Entity as Member;
pub use member_follow::Entity as MemberFollow;
pub use member_restriction::Entity as MemberRestriction;
pub use post_like::Entity as PostLike;
pub use post_media::Entity as PostMedia;
pub use reply_like::Entity as ReplyLike;
