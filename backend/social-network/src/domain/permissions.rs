/// Object-level authorization for posts and comments
///
/// Every check here is a pure function of (actor, action, target). Whether a
/// caller is authenticated at all is decided earlier by [`require_authenticated`],
/// so that a missing identity surfaces as 401 while a denial from the evaluators
/// surfaces as 403.
use uuid::Uuid;

use crate::error::{AppError, Result};

/// The identity a request acts as. Anonymous when `user_id` is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Actor {
    pub user_id: Option<Uuid>,
    pub is_staff: bool,
}

impl Actor {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            is_staff: false,
        }
    }

    pub fn staff(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            is_staff: true,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    fn is(&self, user_id: Uuid) -> bool {
        self.user_id == Some(user_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    PartialUpdate,
    Delete,
}

impl Action {
    pub fn is_read(self) -> bool {
        matches!(self, Action::Read)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    fn from_bool(allowed: bool) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }

    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// The parts of a post that authorization looks at
#[derive(Debug, Clone, Copy)]
pub struct PostTarget {
    pub owner_id: Uuid,
}

/// The parts of a comment that authorization looks at
#[derive(Debug, Clone, Copy)]
pub struct CommentTarget {
    pub owner_id: Uuid,
    pub post_owner_id: Uuid,
}

/// Decide a post action. `target` is `None` for `Create`.
///
/// Reads are public. Edits belong to the owner alone; deletes additionally to
/// staff.
pub fn evaluate_post(actor: &Actor, action: Action, target: Option<&PostTarget>) -> Decision {
    if action.is_read() {
        return Decision::Allow;
    }
    if !actor.is_authenticated() {
        return Decision::Deny;
    }

    match (action, target) {
        (Action::Create, _) => Decision::Allow,
        (Action::Update | Action::PartialUpdate, Some(post)) => {
            Decision::from_bool(actor.is(post.owner_id))
        }
        (Action::Delete, Some(post)) => Decision::from_bool(actor.is(post.owner_id) || actor.is_staff),
        _ => Decision::Deny,
    }
}

/// Decide a comment action. `target` is `None` for `Read` of a listing and for `Create`.
///
/// Comments are only visible to signed-in users. Deletion is open to the
/// comment author, the author of the post underneath, and staff.
pub fn evaluate_comment(
    actor: &Actor,
    action: Action,
    target: Option<&CommentTarget>,
) -> Decision {
    if !actor.is_authenticated() {
        return Decision::Deny;
    }

    match (action, target) {
        (Action::Read | Action::Create, _) => Decision::Allow,
        (Action::Update | Action::PartialUpdate, Some(comment)) => {
            Decision::from_bool(actor.is(comment.owner_id))
        }
        (Action::Delete, Some(comment)) => Decision::from_bool(
            actor.is(comment.owner_id) || actor.is(comment.post_owner_id) || actor.is_staff,
        ),
        _ => Decision::Deny,
    }
}

/// Authentication gate run before any evaluator
pub fn require_authenticated(actor: &Actor) -> Result<Uuid> {
    actor.user_id.ok_or_else(|| {
        AppError::Authentication("Authentication credentials were not provided.".to_string())
    })
}

/// Turn a decision into a 403 when denied
pub fn authorize(decision: Decision) -> Result<()> {
    match decision {
        Decision::Allow => Ok(()),
        Decision::Deny => Err(AppError::Authorization(
            "You do not have permission to perform this action.".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WRITES: [Action; 4] = [
        Action::Create,
        Action::Update,
        Action::PartialUpdate,
        Action::Delete,
    ];

    #[test]
    fn test_post_reads_are_public() {
        let post = PostTarget {
            owner_id: Uuid::new_v4(),
        };
        for actor in [
            Actor::anonymous(),
            Actor::user(Uuid::new_v4()),
            Actor::staff(Uuid::new_v4()),
        ] {
            assert_eq!(evaluate_post(&actor, Action::Read, Some(&post)), Decision::Allow);
        }
        assert_eq!(evaluate_post(&Actor::anonymous(), Action::Read, None), Decision::Allow);
    }

    #[test]
    fn test_anonymous_cannot_write_posts() {
        let post = PostTarget {
            owner_id: Uuid::new_v4(),
        };
        for action in WRITES {
            assert_eq!(
                evaluate_post(&Actor::anonymous(), action, Some(&post)),
                Decision::Deny
            );
        }
    }

    #[test]
    fn test_only_owner_updates_post() {
        let owner = Uuid::new_v4();
        let post = PostTarget { owner_id: owner };

        for action in [Action::Update, Action::PartialUpdate] {
            assert_eq!(evaluate_post(&Actor::user(owner), action, Some(&post)), Decision::Allow);
            assert_eq!(
                evaluate_post(&Actor::user(Uuid::new_v4()), action, Some(&post)),
                Decision::Deny
            );
            // staff does not bypass ownership for edits
            assert_eq!(
                evaluate_post(&Actor::staff(Uuid::new_v4()), action, Some(&post)),
                Decision::Deny
            );
        }
    }

    #[test]
    fn test_post_delete_owner_or_staff() {
        let owner = Uuid::new_v4();
        let post = PostTarget { owner_id: owner };

        assert!(evaluate_post(&Actor::user(owner), Action::Delete, Some(&post)).is_allowed());
        assert!(evaluate_post(&Actor::staff(Uuid::new_v4()), Action::Delete, Some(&post)).is_allowed());
        assert!(!evaluate_post(&Actor::user(Uuid::new_v4()), Action::Delete, Some(&post)).is_allowed());
    }

    #[test]
    fn test_any_user_creates_post() {
        assert!(evaluate_post(&Actor::user(Uuid::new_v4()), Action::Create, None).is_allowed());
    }

    #[test]
    fn test_comment_requires_authentication() {
        let comment = CommentTarget {
            owner_id: Uuid::new_v4(),
            post_owner_id: Uuid::new_v4(),
        };
        for action in [Action::Read, Action::Create, Action::Update, Action::Delete] {
            assert_eq!(
                evaluate_comment(&Actor::anonymous(), action, Some(&comment)),
                Decision::Deny
            );
        }
        assert!(evaluate_comment(&Actor::user(Uuid::new_v4()), Action::Read, None).is_allowed());
        assert!(evaluate_comment(&Actor::user(Uuid::new_v4()), Action::Create, None).is_allowed());
    }

    #[test]
    fn test_comment_update_owner_only() {
        let author = Uuid::new_v4();
        let post_owner = Uuid::new_v4();
        let comment = CommentTarget {
            owner_id: author,
            post_owner_id: post_owner,
        };

        for action in [Action::Update, Action::PartialUpdate] {
            assert!(evaluate_comment(&Actor::user(author), action, Some(&comment)).is_allowed());
            assert!(!evaluate_comment(&Actor::user(post_owner), action, Some(&comment)).is_allowed());
            assert!(!evaluate_comment(&Actor::staff(Uuid::new_v4()), action, Some(&comment)).is_allowed());
        }
    }

    #[test]
    fn test_comment_delete_matrix() {
        let author = Uuid::new_v4();
        let post_owner = Uuid::new_v4();
        let comment = CommentTarget {
            owner_id: author,
            post_owner_id: post_owner,
        };

        let cases = [
            (Actor::user(author), Decision::Allow),
            (Actor::user(post_owner), Decision::Allow),
            (Actor::staff(Uuid::new_v4()), Decision::Allow),
            (Actor::user(Uuid::new_v4()), Decision::Deny),
            (Actor::anonymous(), Decision::Deny),
        ];

        for (actor, expected) in cases {
            assert_eq!(
                evaluate_comment(&actor, Action::Delete, Some(&comment)),
                expected,
                "actor {:?}",
                actor
            );
        }
    }

    #[test]
    fn test_write_without_target_is_denied() {
        let actor = Actor::staff(Uuid::new_v4());
        assert_eq!(evaluate_post(&actor, Action::Delete, None), Decision::Deny);
        assert_eq!(evaluate_comment(&actor, Action::Update, None), Decision::Deny);
    }

    #[test]
    fn test_gate_and_authorize() {
        assert!(matches!(
            require_authenticated(&Actor::anonymous()),
            Err(AppError::Authentication(_))
        ));
        let id = Uuid::new_v4();
        assert_eq!(require_authenticated(&Actor::user(id)).unwrap(), id);

        assert!(authorize(Decision::Allow).is_ok());
        assert!(matches!(authorize(Decision::Deny), Err(AppError::Authorization(_))));
    }
}
