//! Pure domain rules: authorization, edge toggles, search and scheduling.
pub mod permissions;
pub mod schedule;
pub mod search;
pub mod toggle;

pub use permissions::{
    authorize, evaluate_comment, evaluate_post, require_authenticated, Action, Actor,
    CommentTarget, Decision, PostTarget,
};
pub use search::SearchQuery;
pub use toggle::{toggle_follow, toggle_like, EdgeState, FollowOutcome, LikeOutcome};
