use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::r#trait::{
    CommentRepository, EdgeSet, HealthCheck, PostRepository, ScheduledPostRepository,
    TokenRevocationRepository, UserRepository,
};
use crate::domain::SearchQuery;
use crate::error::{AppError, Result};
use crate::models::{
    Comment, NewComment, NewPost, NewScheduledPost, NewUser, Post, PostChanges, ScheduledPost,
    ScheduledPostStatus, User, UserChanges, UserFilter, UserProfile,
};

const DUPLICATE_USER: &str = "A user with that email or username already exists.";

/// Directed edges keyed by (source, target)
#[derive(Debug, Default)]
pub struct MemoryEdges {
    edges: DashMap<(Uuid, Uuid), DateTime<Utc>>,
}

impl MemoryEdges {
    fn count_sources(&self, target: Uuid) -> i64 {
        self.edges.iter().filter(|e| e.key().1 == target).count() as i64
    }

    fn count_targets(&self, source: Uuid) -> i64 {
        self.edges.iter().filter(|e| e.key().0 == source).count() as i64
    }

    /// Sources pointing at `target`, newest edge first
    fn sources_of(&self, target: Uuid) -> Vec<Uuid> {
        let mut found: Vec<(Uuid, DateTime<Utc>)> = self
            .edges
            .iter()
            .filter(|e| e.key().1 == target)
            .map(|e| (e.key().0, *e.value()))
            .collect();
        found.sort_by(|a, b| b.1.cmp(&a.1));
        found.into_iter().map(|(id, _)| id).collect()
    }

    /// Targets `source` points at, newest edge first
    fn targets_of(&self, source: Uuid) -> Vec<Uuid> {
        let mut found: Vec<(Uuid, DateTime<Utc>)> = self
            .edges
            .iter()
            .filter(|e| e.key().0 == source)
            .map(|e| (e.key().1, *e.value()))
            .collect();
        found.sort_by(|a, b| b.1.cmp(&a.1));
        found.into_iter().map(|(id, _)| id).collect()
    }

    fn remove_touching(&self, id: Uuid) {
        self.edges.retain(|(source, target), _| *source != id && *target != id);
    }
}

#[async_trait]
impl EdgeSet for MemoryEdges {
    async fn contains(&self, source: Uuid, target: Uuid) -> Result<bool> {
        Ok(self.edges.contains_key(&(source, target)))
    }

    async fn insert(&self, source: Uuid, target: Uuid) -> Result<bool> {
        match self.edges.entry((source, target)) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(Utc::now());
                Ok(true)
            }
        }
    }

    async fn remove(&self, source: Uuid, target: Uuid) -> Result<bool> {
        Ok(self.edges.remove(&(source, target)).is_some())
    }
}

/// Process-local storage used by tests and `STORAGE_BACKEND=memory`.
///
/// Cloning is cheap and every clone shares the same maps.
#[derive(Clone, Default)]
pub struct MemoryRepository {
    users: Arc<DashMap<Uuid, User>>,
    emails: Arc<DashMap<String, Uuid>>,
    usernames: Arc<DashMap<String, Uuid>>,
    posts: Arc<DashMap<Uuid, Post>>,
    comments: Arc<DashMap<Uuid, Comment>>,
    pub(crate) likes: Arc<MemoryEdges>,
    pub(crate) follows: Arc<MemoryEdges>,
    revoked: Arc<DashMap<String, DateTime<Utc>>>,
    scheduled: Arc<Mutex<Vec<ScheduledPost>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn username_of(&self, user_id: Uuid) -> Option<String> {
        self.users.get(&user_id).and_then(|u| u.username.clone())
    }

    fn profile(&self, user: User) -> UserProfile {
        let id = user.id;
        UserProfile {
            followers_count: self.follows.count_sources(id),
            following_count: self.follows.count_targets(id),
            posts_count: self.posts.iter().filter(|p| p.owner_id == id).count() as i64,
            user,
        }
    }

    fn profiles_for(&self, ids: Vec<Uuid>) -> Vec<UserProfile> {
        ids.into_iter()
            .filter_map(|id| self.users.get(&id).map(|u| u.clone()))
            .map(|user| self.profile(user))
            .collect()
    }

    /// Fill in the joined columns the way the SQL select does
    fn hydrate_post(&self, mut post: Post) -> Post {
        post.owner_username = self.username_of(post.owner_id);
        post.likes_count = self.likes.count_sources(post.id);
        post
    }

    fn hydrate_comment(&self, mut comment: Comment) -> Comment {
        comment.username = self.username_of(comment.user_id);
        comment
    }

    fn sorted_posts<F>(&self, keep: F) -> Vec<Post>
    where
        F: Fn(&Post) -> bool,
    {
        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|p| keep(p.value()))
            .map(|p| p.value().clone())
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        posts.into_iter().map(|p| self.hydrate_post(p)).collect()
    }

    fn claim_key(
        index: &DashMap<String, Uuid>,
        key: String,
        user_id: Uuid,
    ) -> Result<()> {
        match index.entry(key) {
            Entry::Occupied(owner) if *owner.get() != user_id => {
                Err(AppError::Conflict(DUPLICATE_USER.to_string()))
            }
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(user_id);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let id = Uuid::new_v4();
        let email_key = new_user.email.to_lowercase();

        Self::claim_key(&self.emails, email_key.clone(), id)?;
        if let Some(username) = &new_user.username {
            if let Err(e) = Self::claim_key(&self.usernames, username.clone(), id) {
                self.emails.remove(&email_key);
                return Err(e);
            }
        }

        let user = User {
            id,
            email: new_user.email,
            username: new_user.username,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            bio: None,
            picture: None,
            is_staff: new_user.is_staff,
            password_hash: new_user.password_hash,
            last_login: None,
            last_request: None,
            created_at: Utc::now(),
        };
        self.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let id = self.emails.get(&email.to_lowercase()).map(|id| *id);
        Ok(id.and_then(|id| self.users.get(&id).map(|u| u.clone())))
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>> {
        let Some(current) = self.users.get(&id).map(|u| u.clone()) else {
            return Ok(None);
        };

        let old_email = current.email.to_lowercase();
        let new_email = changes
            .email
            .as_deref()
            .map(str::to_lowercase)
            .filter(|key| *key != old_email);
        let new_username = changes
            .username
            .clone()
            .filter(|name| current.username.as_ref() != Some(name));

        // claim every new key before releasing any old one
        if let Some(key) = &new_email {
            Self::claim_key(&self.emails, key.clone(), id)?;
        }
        if let Some(name) = &new_username {
            if let Err(e) = Self::claim_key(&self.usernames, name.clone(), id) {
                if let Some(key) = &new_email {
                    self.emails.remove_if(key, |_, owner| *owner == id);
                }
                return Err(e);
            }
        }

        if new_email.is_some() {
            self.emails.remove(&old_email);
        }
        if new_username.is_some() {
            if let Some(old) = &current.username {
                self.usernames.remove(old);
            }
        }

        let mut entry = match self.users.get_mut(&id) {
            Some(entry) => entry,
            None => return Ok(None),
        };
        let user = entry.value_mut();
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(username) = changes.username {
            user.username = Some(username);
        }
        if let Some(first_name) = changes.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name;
        }
        if let Some(bio) = changes.bio {
            user.bio = Some(bio);
        }
        if let Some(picture) = changes.picture {
            user.picture = Some(picture);
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        Ok(Some(user.clone()))
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<UserProfile>> {
        let user = self.users.get(&id).map(|u| u.clone());
        Ok(user.map(|u| self.profile(u)))
    }

    async fn search_profiles(&self, filter: &UserFilter) -> Result<Vec<UserProfile>> {
        let search = SearchQuery::parse(filter.search.as_deref());
        let email = SearchQuery::parse(filter.email.as_deref());

        let mut users: Vec<User> = self
            .users
            .iter()
            .map(|u| u.value().clone())
            .filter(|u| {
                search.as_ref().map_or(true, |q| {
                    q.matches_any([
                        u.username.as_deref().unwrap_or(""),
                        u.first_name.as_str(),
                        u.last_name.as_str(),
                    ])
                })
            })
            .filter(|u| email.as_ref().map_or(true, |q| q.matches_any([u.email.as_str()])))
            .collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(users.into_iter().map(|u| self.profile(u)).collect())
    }

    async fn list_followers(&self, user_id: Uuid) -> Result<Vec<UserProfile>> {
        Ok(self.profiles_for(self.follows.sources_of(user_id)))
    }

    async fn list_following(&self, user_id: Uuid) -> Result<Vec<UserProfile>> {
        Ok(self.profiles_for(self.follows.targets_of(user_id)))
    }

    async fn record_request(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<User>> {
        Ok(self.users.get_mut(&id).map(|mut u| {
            u.last_request = Some(at);
            u.clone()
        }))
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.last_login = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for MemoryRepository {
    async fn create_post(&self, new_post: NewPost) -> Result<Post> {
        if !self.users.contains_key(&new_post.owner_id) {
            return Err(AppError::NotFound("Owner not found".to_string()));
        }

        let post = Post {
            id: Uuid::new_v4(),
            owner_id: new_post.owner_id,
            owner_username: None,
            title: new_post.title,
            text: new_post.text,
            content: new_post.content,
            is_updated: false,
            created_at: Utc::now(),
            likes_count: 0,
        };
        self.posts.insert(post.id, post.clone());
        Ok(self.hydrate_post(post))
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
        let post = self.posts.get(&id).map(|p| p.clone());
        Ok(post.map(|p| self.hydrate_post(p)))
    }

    async fn list_posts(&self, search: Option<&SearchQuery>) -> Result<Vec<Post>> {
        Ok(self.sorted_posts(|p| {
            search.map_or(true, |q| q.matches_any([p.title.as_str(), p.text.as_str()]))
        }))
    }

    async fn list_posts_by_owner(&self, owner_id: Uuid) -> Result<Vec<Post>> {
        Ok(self.sorted_posts(|p| p.owner_id == owner_id))
    }

    async fn list_liked_posts(&self, user_id: Uuid) -> Result<Vec<Post>> {
        let posts = self
            .likes
            .targets_of(user_id)
            .into_iter()
            .filter_map(|id| self.posts.get(&id).map(|p| p.clone()))
            .map(|p| self.hydrate_post(p))
            .collect();
        Ok(posts)
    }

    async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>> {
        let updated = self.posts.get_mut(&id).map(|mut entry| {
            let post = entry.value_mut();
            if let Some(title) = changes.title {
                post.title = title;
            }
            if let Some(text) = changes.text {
                post.text = text;
            }
            if let Some(content) = changes.content {
                post.content = content;
            }
            post.is_updated = true;
            post.clone()
        });
        Ok(updated.map(|p| self.hydrate_post(p)))
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool> {
        if self.posts.remove(&id).is_none() {
            return Ok(false);
        }
        self.comments.retain(|_, c| c.post_id != id);
        self.likes.remove_touching(id);
        Ok(true)
    }
}

#[async_trait]
impl CommentRepository for MemoryRepository {
    async fn create_comment(&self, new_comment: NewComment) -> Result<Comment> {
        if !self.posts.contains_key(&new_comment.post_id) {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        let comment = Comment {
            id: Uuid::new_v4(),
            post_id: new_comment.post_id,
            user_id: new_comment.user_id,
            username: None,
            text: new_comment.text,
            is_updated: false,
            created_at: Utc::now(),
        };
        self.comments.insert(comment.id, comment.clone());
        Ok(self.hydrate_comment(comment))
    }

    async fn find_comment(&self, post_id: Uuid, id: Uuid) -> Result<Option<Comment>> {
        let comment = self
            .comments
            .get(&id)
            .filter(|c| c.post_id == post_id)
            .map(|c| c.clone());
        Ok(comment.map(|c| self.hydrate_comment(c)))
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        let mut comments: Vec<Comment> = self
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .map(|c| c.value().clone())
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments
            .into_iter()
            .map(|c| self.hydrate_comment(c))
            .collect())
    }

    async fn update_comment(&self, id: Uuid, text: String) -> Result<Option<Comment>> {
        let updated = self.comments.get_mut(&id).map(|mut entry| {
            entry.text = text;
            entry.is_updated = true;
            entry.clone()
        });
        Ok(updated.map(|c| self.hydrate_comment(c)))
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool> {
        Ok(self.comments.remove(&id).is_some())
    }
}

#[async_trait]
impl TokenRevocationRepository for MemoryRepository {
    async fn revoke(&self, jti: &str, _user_id: Uuid, expires_at: DateTime<Utc>) -> Result<()> {
        self.revoked.insert(jti.to_string(), expires_at);
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool> {
        Ok(self.revoked.contains_key(jti))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let before = self.revoked.len();
        self.revoked.retain(|_, expires_at| *expires_at >= now);
        Ok(before.saturating_sub(self.revoked.len()) as u64)
    }
}

#[async_trait]
impl ScheduledPostRepository for MemoryRepository {
    async fn enqueue(&self, job: NewScheduledPost) -> Result<ScheduledPost> {
        let scheduled = ScheduledPost {
            id: Uuid::new_v4(),
            owner_id: job.owner_id,
            title: job.title,
            text: job.text,
            content_path: job.content_path,
            run_at: job.run_at,
            status: ScheduledPostStatus::Pending,
            attempts: 0,
            last_error: None,
            post_id: None,
            claimed_at: None,
            created_at: Utc::now(),
        };
        self.scheduled.lock().await.push(scheduled.clone());
        Ok(scheduled)
    }

    async fn find_job(&self, id: Uuid) -> Result<Option<ScheduledPost>> {
        let jobs = self.scheduled.lock().await;
        Ok(jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease: Duration,
        limit: i64,
    ) -> Result<Vec<ScheduledPost>> {
        let mut jobs = self.scheduled.lock().await;
        let stale_before = now - lease;

        let mut due: Vec<&mut ScheduledPost> = jobs
            .iter_mut()
            .filter(|j| match j.status {
                ScheduledPostStatus::Pending => j.run_at <= now,
                ScheduledPostStatus::Running => j.claimed_at.map_or(true, |at| at < stale_before),
                _ => false,
            })
            .collect();
        due.sort_by_key(|j| j.run_at);

        let limit = usize::try_from(limit).unwrap_or(0);
        let claimed = due
            .into_iter()
            .take(limit)
            .map(|job| {
                job.status = ScheduledPostStatus::Running;
                job.attempts += 1;
                job.claimed_at = Some(now);
                job.clone()
            })
            .collect();
        Ok(claimed)
    }

    async fn mark_completed(&self, id: Uuid, post_id: Uuid) -> Result<()> {
        let mut jobs = self.scheduled.lock().await;
        if let Some(job) = jobs.iter_mut().find(|j| j.id == id) {
            job.status = ScheduledPostStatus::Completed;
            job.post_id = Some(post_id);
            job.last_error = None;
        }
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str, give_up: bool) -> Result<()> {
        let mut jobs = self.scheduled.lock().await;
        if let Some(job) = jobs.iter_mut().find(|j| j.id == id) {
            job.status = if give_up {
                ScheduledPostStatus::Failed
            } else {
                ScheduledPostStatus::Pending
            };
            job.last_error = Some(error.to_string());
            job.claimed_at = None;
        }
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for MemoryRepository {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
