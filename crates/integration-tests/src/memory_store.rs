//! An in-process stand-in for the PostgreSQL schema.
//!
//! Read queries produce the same join rows the SQL does (cartesian fan-out, NULL
//! branch groups, same ordering) and hand them to `storage_adapters::flatten`, so
//! tests exercise the real reconstruction code. Constraints mirror the schema:
//! foreign keys, the one-like-per-user unique key, and cascading deletes.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    AuthorCard, Blob, BlobAggregate, BlobRepository, BlobSummary, Comment, CommentRepository,
    CommentWithAuthor, DomainError, DomainResult, Interest, InterestRepository, Like,
    LikeRepository, LikeWithAuthor, Session, SessionRepository, User, UserRepository, UserUpdate,
    UserWithBlobs, DEFAULT_AVATAR_COLOR, DEFAULT_AVATAR_ICON,
};
use storage_adapters::{
    flatten_blob_detail, flatten_user_with_blobs, fold_blob_list, BlobDetailRow, BlobListRow,
    UserBlobRow,
};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    sessions: HashMap<String, Session>,
    verification_tokens: Vec<(String, String)>,
    interests: Vec<Interest>,
    blobs: Vec<Blob>,
    blob_interests: Vec<(Uuid, Uuid)>,
    comments: Vec<Comment>,
    likes: Vec<Like>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

/// One row per child, or a single NULL group when the branch is empty (LEFT JOIN).
fn or_null<T: Clone>(items: Vec<T>) -> Vec<Option<T>> {
    if items.is_empty() {
        vec![None]
    } else {
        items.into_iter().map(Some).collect()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self, op: &'static str) -> DomainResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| DomainError::store(op, "memory store poisoned"))
    }

    fn guard(&self) -> MutexGuard<'_, Tables> {
        match self.tables.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    // ── Seeding ─────────────────────────────────────────────────────────────

    pub fn add_user(&self, id: &str, username: &str) -> User {
        let now = Utc::now();
        let user = User {
            id: id.into(),
            name: None,
            email: Some(format!("{id}@example.com")),
            email_verified: None,
            image: None,
            username: Some(username.into()),
            bio: None,
            avatar_icon: DEFAULT_AVATAR_ICON.into(),
            avatar_color: DEFAULT_AVATAR_COLOR.into(),
            created_at: now,
            updated_at: now,
        };
        self.guard().users.push(user.clone());
        user
    }

    pub fn add_interest(&self, name: &str) -> Interest {
        let now = Utc::now();
        let interest = Interest {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            created_at: now,
            updated_at: now,
        };
        self.guard().interests.push(interest.clone());
        interest
    }

    pub fn add_session(&self, token: &str, user_id: &str, expires: DateTime<Utc>) {
        let mut t = self.guard();
        let email = t
            .users
            .iter()
            .find(|u| u.id == user_id)
            .and_then(|u| u.email.clone())
            .unwrap_or_default();
        t.sessions.insert(
            token.into(),
            Session {
                user_id: user_id.into(),
                email,
                expires,
            },
        );
    }

    pub fn add_verification_token(&self, email: &str, token: &str) {
        self.guard()
            .verification_tokens
            .push((email.into(), token.into()));
    }

    // ── Inspection ──────────────────────────────────────────────────────────

    pub fn verification_tokens_for(&self, email: &str) -> usize {
        self.guard()
            .verification_tokens
            .iter()
            .filter(|(e, _)| e == email)
            .count()
    }

    pub fn comment_count(&self) -> usize {
        self.guard().comments.len()
    }

    pub fn like_count(&self) -> usize {
        self.guard().likes.len()
    }

    pub fn interest_link_count(&self) -> usize {
        self.guard().blob_interests.len()
    }

    /// Backdates a blob so retention tests can age it.
    pub fn set_blob_created_at(&self, id: Uuid, created_at: DateTime<Utc>) {
        if let Some(blob) = self.guard().blobs.iter_mut().find(|b| b.id == id) {
            blob.created_at = created_at;
        }
    }
}

impl Tables {
    fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn author_card(&self, user_id: &str) -> Option<AuthorCard> {
        self.user(user_id).map(|u| AuthorCard {
            image: u.image.clone(),
            username: u.username.clone(),
            avatar_icon: u.avatar_icon.clone(),
            avatar_color: u.avatar_color.clone(),
        })
    }

    fn blob_exists(&self, id: Uuid) -> bool {
        self.blobs.iter().any(|b| b.id == id)
    }

    fn interests_of(&self, blob_id: Uuid) -> Vec<Interest> {
        let mut interests: Vec<Interest> = self
            .blob_interests
            .iter()
            .filter(|(b, _)| *b == blob_id)
            .filter_map(|(_, i)| self.interests.iter().find(|x| x.id == *i).cloned())
            .collect();
        interests.sort_by(|a, b| a.name.cmp(&b.name));
        interests
    }

    fn remove_blob_children(&mut self, removed: &HashSet<Uuid>) {
        self.comments.retain(|c| !removed.contains(&c.blob_id));
        self.likes.retain(|l| !removed.contains(&l.blob_id));
        self.blob_interests.retain(|(b, _)| !removed.contains(b));
    }

    fn detail_rows(&self, blob: &Blob) -> Vec<BlobDetailRow> {
        let author = self.user(&blob.user_id);
        let mut comments: Vec<&Comment> =
            self.comments.iter().filter(|c| c.blob_id == blob.id).collect();
        comments.sort_by_key(|c| c.created_at);
        let mut likes: Vec<&Like> = self.likes.iter().filter(|l| l.blob_id == blob.id).collect();
        likes.sort_by_key(|l| l.created_at);
        let interests = self.interests_of(blob.id);

        let mut rows = Vec::new();
        for comment in or_null(comments) {
            for like in or_null(likes.clone()) {
                for interest in or_null(interests.iter().collect::<Vec<_>>()) {
                    rows.push(BlobDetailRow {
                        blob_id: blob.id.to_string(),
                        blob_user_id: blob.user_id.clone(),
                        blob_content: blob.content.clone(),
                        blob_created_at: blob.created_at,
                        blob_updated_at: blob.updated_at,
                        user_username: author.and_then(|u| u.username.clone()),
                        user_avatar_icon: author.map(|u| u.avatar_icon.clone()),
                        user_created_at: author.map(|u| u.created_at),
                        comment_id: comment.map(|c| c.id.to_string()),
                        comment_user_id: comment.map(|c| c.user_id.clone()),
                        comment_content: comment.map(|c| c.content.clone()),
                        comment_created_at: comment.map(|c| c.created_at),
                        comment_updated_at: comment.map(|c| c.updated_at),
                        like_id: like.map(|l| l.id.to_string()),
                        like_user_id: like.map(|l| l.user_id.clone()),
                        like_created_at: like.map(|l| l.created_at),
                        interest_id: interest.map(|i| i.id.to_string()),
                        interest_name: interest.map(|i| i.name.clone()),
                        interest_description: interest.and_then(|i| i.description.clone()),
                        interest_created_at: interest.map(|i| i.created_at),
                        interest_updated_at: interest.map(|i| i.updated_at),
                    });
                }
            }
        }
        rows
    }
}

#[async_trait]
impl BlobRepository for MemoryStore {
    async fn create(&self, blob: &Blob, interest_ids: &[Uuid]) -> DomainResult<()> {
        let mut t = self.lock("BlobRepository::create")?;
        if t.user(&blob.user_id).is_none() {
            return Err(DomainError::NotFound("user", blob.user_id.clone()));
        }
        // Validate every link before writing anything: all-or-nothing.
        if let Some(missing) = interest_ids
            .iter()
            .find(|id| !t.interests.iter().any(|i| i.id == **id))
        {
            return Err(DomainError::NotFound("interest", missing.to_string()));
        }
        t.blobs.push(blob.clone());
        t.blob_interests
            .extend(interest_ids.iter().map(|i| (blob.id, *i)));
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<BlobAggregate>> {
        let t = self.lock("BlobRepository::find_by_id")?;
        let rows = match t.blobs.iter().find(|b| b.id == id) {
            Some(blob) => t.detail_rows(blob),
            None => Vec::new(),
        };
        flatten_blob_detail(&rows).map_err(|e| e.into_domain("BlobRepository::find_by_id"))
    }

    async fn exists(&self, id: Uuid) -> DomainResult<bool> {
        Ok(self.lock("BlobRepository::exists")?.blob_exists(id))
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(self.lock("BlobRepository::count")?.blobs.len() as u64)
    }

    async fn list_page(&self, offset: i64, limit: i64) -> DomainResult<Vec<BlobSummary>> {
        let t = self.lock("BlobRepository::list_page")?;
        let mut page: Vec<&Blob> = t.blobs.iter().collect();
        page.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let mut rows = Vec::new();
        for blob in page
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
        {
            let author = t.user(&blob.user_id);
            let likes = t.likes.iter().filter(|l| l.blob_id == blob.id).count() as i64;
            let comments = t.comments.iter().filter(|c| c.blob_id == blob.id).count() as i64;
            for interest in or_null(t.interests_of(blob.id)) {
                rows.push(BlobListRow {
                    id: blob.id.to_string(),
                    user_id: blob.user_id.clone(),
                    content: blob.content.clone(),
                    created_at: blob.created_at,
                    updated_at: blob.updated_at,
                    username: author.and_then(|u| u.username.clone()),
                    avatar_icon: author.map(|u| u.avatar_icon.clone()),
                    user_created_at: author.map(|u| u.created_at),
                    interest_name: interest.map(|i| i.name),
                    likes_count: likes,
                    comments_count: comments,
                });
            }
        }
        fold_blob_list(&rows).map_err(|e| e.into_domain("BlobRepository::list_page"))
    }

    async fn delete_owned(&self, id: Uuid, user_id: &str) -> DomainResult<u64> {
        let mut t = self.lock("BlobRepository::delete_owned")?;
        let before = t.blobs.len();
        t.blobs.retain(|b| !(b.id == id && b.user_id == user_id));
        let removed = (before - t.blobs.len()) as u64;
        if removed > 0 {
            t.remove_blob_children(&HashSet::from([id]));
        }
        Ok(removed)
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> DomainResult<u64> {
        let mut t = self.lock("BlobRepository::purge_older_than")?;
        let removed: HashSet<Uuid> = t
            .blobs
            .iter()
            .filter(|b| b.created_at < cutoff)
            .map(|b| b.id)
            .collect();
        t.blobs.retain(|b| !removed.contains(&b.id));
        t.remove_blob_children(&removed);
        Ok(removed.len() as u64)
    }
}

#[async_trait]
impl InterestRepository for MemoryStore {
    async fn list_all(&self) -> DomainResult<Vec<Interest>> {
        let mut all = self.lock("InterestRepository::list_all")?.interests.clone();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create(&self, comment: &Comment) -> DomainResult<()> {
        let mut t = self.lock("CommentRepository::create")?;
        if !t.blob_exists(comment.blob_id) {
            return Err(DomainError::NotFound("blob", comment.blob_id.to_string()));
        }
        t.comments.push(comment.clone());
        Ok(())
    }

    async fn delete_owned(&self, comment_id: Uuid, user_id: &str) -> DomainResult<u64> {
        let mut t = self.lock("CommentRepository::delete_owned")?;
        let before = t.comments.len();
        t.comments
            .retain(|c| !(c.id == comment_id && c.user_id == user_id));
        Ok((before - t.comments.len()) as u64)
    }

    async fn list_by_blob(&self, blob_id: Uuid) -> DomainResult<Vec<CommentWithAuthor>> {
        let t = self.lock("CommentRepository::list_by_blob")?;
        let mut comments: Vec<CommentWithAuthor> = t
            .comments
            .iter()
            .filter(|c| c.blob_id == blob_id)
            .filter_map(|c| {
                t.author_card(&c.user_id).map(|author| CommentWithAuthor {
                    comment: c.clone(),
                    author,
                })
            })
            .collect();
        comments.sort_by_key(|c| c.comment.created_at);
        Ok(comments)
    }
}

#[async_trait]
impl LikeRepository for MemoryStore {
    async fn create(&self, like: &Like) -> DomainResult<()> {
        let mut t = self.lock("LikeRepository::create")?;
        if !t.blob_exists(like.blob_id) {
            return Err(DomainError::NotFound("blob", like.blob_id.to_string()));
        }
        if t
            .likes
            .iter()
            .any(|l| l.user_id == like.user_id && l.blob_id == like.blob_id)
        {
            return Err(DomainError::AlreadyReacted {
                user_id: like.user_id.clone(),
                blob_id: like.blob_id.to_string(),
            });
        }
        t.likes.push(like.clone());
        Ok(())
    }

    async fn find_id(&self, user_id: &str, blob_id: Uuid) -> DomainResult<Option<Uuid>> {
        Ok(self
            .lock("LikeRepository::find_id")?
            .likes
            .iter()
            .find(|l| l.user_id == user_id && l.blob_id == blob_id)
            .map(|l| l.id))
    }

    async fn delete(&self, like_id: Uuid, user_id: &str, blob_id: Uuid) -> DomainResult<u64> {
        let mut t = self.lock("LikeRepository::delete")?;
        let before = t.likes.len();
        t.likes
            .retain(|l| !(l.id == like_id && l.user_id == user_id && l.blob_id == blob_id));
        Ok((before - t.likes.len()) as u64)
    }

    async fn list_by_blob(&self, blob_id: Uuid) -> DomainResult<Vec<LikeWithAuthor>> {
        let t = self.lock("LikeRepository::list_by_blob")?;
        let mut likes: Vec<LikeWithAuthor> = t
            .likes
            .iter()
            .filter(|l| l.blob_id == blob_id)
            .filter_map(|l| {
                t.author_card(&l.user_id).map(|author| LikeWithAuthor {
                    like: l.clone(),
                    author,
                })
            })
            .collect();
        likes.sort_by_key(|l| l.like.created_at);
        Ok(likes)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        Ok(self.lock("UserRepository::find_by_id")?.user(id).cloned())
    }

    async fn find_by_username_with_blobs(
        &self,
        username: &str,
    ) -> DomainResult<Option<UserWithBlobs>> {
        let t = self.lock("UserRepository::find_by_username_with_blobs")?;
        let Some(user) = t
            .users
            .iter()
            .find(|u| u.username.as_deref() == Some(username))
        else {
            return Ok(None);
        };

        let mut owned: Vec<&Blob> = t.blobs.iter().filter(|b| b.user_id == user.id).collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let rows: Vec<UserBlobRow> = or_null(owned)
            .into_iter()
            .map(|blob| UserBlobRow {
                id: user.id.clone(),
                name: user.name.clone(),
                email: user.email.clone(),
                email_verified: user.email_verified,
                image: user.image.clone(),
                username: user.username.clone(),
                bio: user.bio.clone(),
                avatar_icon: user.avatar_icon.clone(),
                avatar_color: user.avatar_color.clone(),
                created_at: user.created_at,
                updated_at: user.updated_at,
                blob_id: blob.map(|b| b.id.to_string()),
                blob_content: blob.map(|b| b.content.clone()),
                blob_created_at: blob.map(|b| b.created_at),
                blob_updated_at: blob.map(|b| b.updated_at),
            })
            .collect();
        flatten_user_with_blobs(&rows)
            .map_err(|e| e.into_domain("UserRepository::find_by_username_with_blobs"))
    }

    async fn update(
        &self,
        user_id: &str,
        previous_email: &str,
        update: &UserUpdate,
    ) -> DomainResult<()> {
        let mut t = self.lock("UserRepository::update")?;
        if let Some(email) = &update.email {
            if t
                .users
                .iter()
                .any(|u| u.id != user_id && u.email.as_deref() == Some(email.as_str()))
            {
                return Err(DomainError::AlreadyExists(format!("email {email}")));
            }
        }

        let user = t
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| DomainError::NotFound("user", user_id.to_owned()))?;

        let email_changed = update
            .email
            .as_deref()
            .is_some_and(|e| e != previous_email);
        if let Some(v) = &update.name {
            user.name = Some(v.clone());
        }
        if let Some(v) = &update.email {
            user.email = Some(v.clone());
        }
        if let Some(v) = &update.bio {
            user.bio = Some(v.clone());
        }
        if let Some(v) = &update.image {
            user.image = Some(v.clone());
        }
        if let Some(v) = &update.avatar_icon {
            user.avatar_icon = v.clone();
        }
        if let Some(v) = &update.avatar_color {
            user.avatar_color = v.clone();
        }
        user.updated_at = Utc::now();

        if email_changed {
            t.verification_tokens.retain(|(e, _)| e != previous_email);
        }
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn find_by_token(&self, token: &str) -> DomainResult<Option<Session>> {
        Ok(self
            .lock("SessionRepository::find_by_token")?
            .sessions
            .get(token)
            .cloned())
    }
}
