//! Repositories for database access.
//!
//! Read methods run against the shared pool. Write methods take the
//! connection explicitly so the same call works inside a transaction.

mod chat;
mod comment;
mod following;
mod member;
mod post;
mod restriction;

pub use chat::ChatRepository;
pub use comment::{ALREADY_LIKED_COMMENT, ALREADY_LIKED_REPLY, CommentRepository};
pub use following::{ALREADY_FOLLOWING, FollowRepository};
pub use member::MemberRepository;
pub use post::{ALREADY_LIKED_POST, PostRepository};
pub use restriction::{ALREADY_RESTRICTED, RestrictionRepository};
