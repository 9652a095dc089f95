//! Business logic services.

pub mod comment;
pub mod friend;
pub mod heart;
pub mod invitation;
pub mod mail;
pub mod post;
pub mod user;

pub use comment::{CommentResponse, CommentService, CreateCommentInput};
pub use friend::{FriendService, RelationState, RemoveOutcome};
pub use heart::{HeartService, HeartState};
pub use invitation::{InvitationService, InviteInput};
pub use mail::MailService;
pub use post::{CreatePostInput, ImageUpload, PostResponse, PostService, UpdatePostInput};
pub use user::{CreateUserInput, UpdateUserInput, UserService};
