//! Friend service.
//!
//! The relationship is stored as a single directed row, so every status
//! decision is computed from the two directed lookups rather than from
//! denormalized state.

use hearth_common::{AppError, AppResult, IdGenerator};
use hearth_db::{
    entities::friend::{self, FriendStatus},
    repositories::{FriendRepository, UserRepository},
    tx,
};
use sea_orm::Set;

/// Friend service for business logic.
#[derive(Clone)]
pub struct FriendService {
    friend_repo: FriendRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// The relation between an unordered pair of users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationState {
    /// No active edge in either direction.
    None,
    /// A request is pending; `requester_id` is the side that sent it.
    Pending {
        /// The user who sent the pending request.
        requester_id: String,
    },
    /// The pair are friends; `requester_id` is the side that originally asked.
    Accepted {
        /// The user who sent the original request.
        requester_id: String,
    },
}

/// What a remove call did, depending on the prior state and caller role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// Caller withdrew their own pending request.
    Cancelled,
    /// Caller turned down a request they had received.
    Declined,
    /// Caller ended an accepted friendship.
    Removed,
}

impl RemoveOutcome {
    /// Stable string form for API responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cancelled => "cancelled",
            Self::Declined => "declined",
            Self::Removed => "removed",
        }
    }
}

/// Compute the relation state from the two directed lookups.
///
/// `forward` is the edge a -> b, `backward` the edge b -> a. At most one of
/// them can be active at a time; if both somehow are, the forward edge wins.
fn relation_state(
    forward: Option<&friend::Model>,
    backward: Option<&friend::Model>,
) -> RelationState {
    let edge = match (forward, backward) {
        (Some(edge), _) | (None, Some(edge)) => edge,
        (None, None) => return RelationState::None,
    };

    let requester_id = edge.requester_id.clone();
    match edge.status {
        FriendStatus::Pending => RelationState::Pending { requester_id },
        FriendStatus::Accepted => RelationState::Accepted { requester_id },
    }
}

impl FriendService {
    /// Create a new friend service.
    #[must_use]
    pub const fn new(friend_repo: FriendRepository, user_repo: UserRepository) -> Self {
        Self {
            friend_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Send a friend request.
    ///
    /// Valid only when no active edge exists in either direction.
    pub async fn request(
        &self,
        requester_id: &str,
        recipient_id: &str,
    ) -> AppResult<friend::Model> {
        if requester_id == recipient_id {
            return Err(AppError::Validation(
                "You cannot send a friend request to yourself".to_string(),
            ));
        }

        // The recipient must be an active user
        self.user_repo.get_by_id(recipient_id).await?;

        tx::with_retry(self.friend_repo.conn(), |txn| {
            let requester_id = requester_id.to_string();
            let recipient_id = recipient_id.to_string();
            let id_gen = self.id_gen.clone();
            Box::pin(async move {
                let requester_id = requester_id.as_str();
                let recipient_id = recipient_id.as_str();
                let forward =
                    FriendRepository::find_directed_in(txn, requester_id, recipient_id).await?;
                let backward =
                    FriendRepository::find_directed_in(txn, recipient_id, requester_id).await?;

                match relation_state(forward.as_ref(), backward.as_ref()) {
                    RelationState::Accepted { .. } => Err(AppError::AlreadyFriends),
                    RelationState::Pending { requester_id: r } if r == requester_id => {
                        Err(AppError::AlreadyPending(
                            "You have already sent this user a friend request".to_string(),
                        ))
                    }
                    RelationState::Pending { .. } => Err(AppError::AlreadyPending(
                        "This user has already sent you a friend request".to_string(),
                    )),
                    RelationState::None => {
                        let model = friend::ActiveModel {
                            id: Set(id_gen.generate()),
                            requester_id: Set(requester_id.to_string()),
                            recipient_id: Set(recipient_id.to_string()),
                            status: Set(FriendStatus::Pending),
                            ..Default::default()
                        };
                        FriendRepository::insert_in(txn, model).await
                    }
                }
            })
        })
        .await
    }

    /// Accept a friend request received from `requester_id`.
    ///
    /// Only the recipient of a pending request may accept it.
    pub async fn accept(
        &self,
        recipient_id: &str,
        requester_id: &str,
    ) -> AppResult<friend::Model> {
        tx::with_retry(self.friend_repo.conn(), |txn| {
            let recipient_id = recipient_id.to_string();
            let requester_id = requester_id.to_string();
            Box::pin(async move {
                let recipient_id = recipient_id.as_str();
                let requester_id = requester_id.as_str();
                let forward =
                    FriendRepository::find_directed_in(txn, requester_id, recipient_id).await?;
                let backward =
                    FriendRepository::find_directed_in(txn, recipient_id, requester_id).await?;

                match (forward, backward) {
                    (Some(edge), _) if edge.status == FriendStatus::Pending => {
                        let mut active: friend::ActiveModel = edge.into();
                        active.status = Set(FriendStatus::Accepted);
                        active.updated_at = Set(Some(chrono::Utc::now().into()));
                        FriendRepository::update_in(txn, active).await
                    }
                    (Some(_), _) => Err(AppError::AlreadyFriends),
                    (None, Some(edge)) if edge.status == FriendStatus::Accepted => {
                        Err(AppError::AlreadyFriends)
                    }
                    // Either no edge at all, or the caller is the one who
                    // sent the pending request.
                    _ => Err(AppError::NotInvited),
                }
            })
        })
        .await
    }

    /// End the relationship with `other_id`, whatever its state.
    ///
    /// Soft-deletes the edge; the pair can re-request immediately.
    pub async fn remove(&self, caller_id: &str, other_id: &str) -> AppResult<RemoveOutcome> {
        tx::with_retry(self.friend_repo.conn(), |txn| {
            let caller_id = caller_id.to_string();
            let other_id = other_id.to_string();
            Box::pin(async move {
                let caller_id = caller_id.as_str();
                let other_id = other_id.as_str();
                let forward = FriendRepository::find_directed_in(txn, caller_id, other_id).await?;
                let backward = FriendRepository::find_directed_in(txn, other_id, caller_id).await?;

                let Some(edge) = forward.or(backward) else {
                    return Err(AppError::NotFound(
                        "No friendship or pending request with this user".to_string(),
                    ));
                };

                let outcome = match edge.status {
                    FriendStatus::Accepted => RemoveOutcome::Removed,
                    FriendStatus::Pending if edge.requester_id == caller_id => {
                        RemoveOutcome::Cancelled
                    }
                    FriendStatus::Pending => RemoveOutcome::Declined,
                };

                let mut active: friend::ActiveModel = edge.into();
                active.deleted_at = Set(Some(chrono::Utc::now().into()));
                FriendRepository::update_in(txn, active).await?;

                Ok(outcome)
            })
        })
        .await
    }

    /// The relation between two users, as seen from either side.
    pub async fn status(&self, a: &str, b: &str) -> AppResult<RelationState> {
        let forward = self.friend_repo.find_directed(a, b).await?;
        let backward = self.friend_repo.find_directed(b, a).await?;
        Ok(relation_state(forward.as_ref(), backward.as_ref()))
    }

    /// Accepted friendships touching a user, newest first.
    pub async fn list_friends(
        &self,
        user_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<friend::Model>> {
        self.friend_repo.list_accepted(user_id, offset, limit).await
    }

    /// Pending requests received by a user, newest first.
    pub async fn list_received(
        &self,
        user_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<friend::Model>> {
        self.friend_repo
            .list_received_pending(user_id, offset, limit)
            .await
    }
}
