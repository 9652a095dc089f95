//! Database entities.

pub mod comment;
pub mod friend;
pub mod heart;
pub mod invitation;
pub mod post;
pub mod user;

pub use comment::Entity as Comment;
pub use friend::Entity as Friend;
pub use heart::Entity as Heart;
pub use invitation::Entity as Invitation;
pub use post::Entity as Post;
pub use user::Entity as User;
