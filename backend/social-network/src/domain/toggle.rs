/// Toggle semantics shared by likes and follows
///
/// One entry point flips an edge: present becomes absent, absent becomes
/// present. The storage layer's uniqueness constraint on the pair is the
/// backstop; losing an insert race is resolved by removing the edge the
/// winner just wrote, so two identical presses always cancel out.
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::repository::EdgeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeState {
    Active,
    Inactive,
}

impl EdgeState {
    pub fn is_active(self) -> bool {
        self == EdgeState::Active
    }
}

/// Flip the (source, target) edge and report its new state
pub async fn toggle_edge(edges: &dyn EdgeSet, source: Uuid, target: Uuid) -> Result<EdgeState> {
    if edges.contains(source, target).await? {
        edges.remove(source, target).await?;
        return Ok(EdgeState::Inactive);
    }

    if edges.insert(source, target).await? {
        return Ok(EdgeState::Active);
    }

    // A concurrent press created the edge between our check and insert.
    tracing::debug!(%source, %target, "edge insert lost a race, resolving as removal");
    edges.remove(source, target).await?;
    Ok(EdgeState::Inactive)
}

/// Result of a like toggle as returned to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct LikeOutcome {
    pub liked: bool,
}

pub async fn toggle_like(likes: &dyn EdgeSet, user_id: Uuid, post_id: Uuid) -> Result<LikeOutcome> {
    let state = toggle_edge(likes, user_id, post_id).await?;
    Ok(LikeOutcome {
        liked: state.is_active(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    NowFollowing,
    Unfollowed,
}

pub const SELF_FOLLOW_MESSAGE: &str = "You cannot follow yourself.";

impl FollowOutcome {
    pub fn message(self) -> &'static str {
        match self {
            FollowOutcome::NowFollowing => "You are now following this user.",
            FollowOutcome::Unfollowed => "You have unfollowed this user.",
        }
    }

    pub fn is_following(self) -> bool {
        self == FollowOutcome::NowFollowing
    }
}

/// Flip `follower -> followee`. Self-follow is rejected before any edge is touched.
pub async fn toggle_follow(
    follows: &dyn EdgeSet,
    follower_id: Uuid,
    followee_id: Uuid,
) -> Result<FollowOutcome> {
    if follower_id == followee_id {
        return Err(AppError::Validation(SELF_FOLLOW_MESSAGE.to_string()));
    }

    let outcome = match toggle_edge(follows, follower_id, followee_id).await? {
        EdgeState::Active => FollowOutcome::NowFollowing,
        EdgeState::Inactive => FollowOutcome::Unfollowed,
    };
    Ok(outcome)
}
