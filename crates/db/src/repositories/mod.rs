//! Repositories for database access.
//!
//! Every default query excludes soft-deleted rows; `*_with_deleted`
//! lookups exist so callers can verify a deletion landed. Methods with an
//! `_in` suffix take an explicit connection so services can run them
//! inside a retried transaction.

pub mod comment;
pub mod friend;
pub mod heart;
pub mod invitation;
pub mod post;
pub mod user;

pub use comment::CommentRepository;
pub use friend::FriendRepository;
pub use heart::HeartRepository;
pub use invitation::InvitationRepository;
pub use post::PostRepository;
pub use user::UserRepository;
