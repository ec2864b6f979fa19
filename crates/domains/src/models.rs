//! # Domain Models
//!
//! Entities persisted by the store and the read models assembled from join queries.
//! Blob, comment, like and interest ids are UUIDs; user ids are opaque strings issued
//! by the identity provider that owns the `"User"` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pagination::PageMeta;

/// A short text item posted by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub id: Uuid,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a blob. The owner comes from the acting user, never the body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewBlob {
    pub content: String,
    /// Interest ids to attach. The wire name is `interests`.
    #[serde(default, rename = "interests")]
    pub interest_ids: Vec<Uuid>,
}

/// A freshly created blob together with the interest ids that were attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobWithInterests {
    #[serde(flatten)]
    pub blob: Blob,
    pub interests: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: String,
    pub blob_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment joined with the display fields of its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    #[serde(flatten)]
    pub author: AuthorCard,
}

/// A "like". At most one per `(user_id, blob_id)`, enforced by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    pub id: Uuid,
    pub user_id: String,
    pub blob_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LikeWithAuthor {
    #[serde(flatten)]
    pub like: Like,
    #[serde(flatten)]
    pub author: AuthorCard,
}

/// Author display fields attached to comments and likes in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorCard {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub avatar_icon: String,
    pub avatar_color: String,
}

/// Tag-like reference data attached to blobs at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interest {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const DEFAULT_AVATAR_ICON: &str = "user";
pub const DEFAULT_AVATAR_COLOR: &str = "cyan";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub avatar_icon: String,
    pub avatar_color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A blob as shown on its owner's profile: no comments, likes or interests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnedBlob {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public profile view: the user plus every blob they own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserWithBlobs {
    #[serde(flatten)]
    pub user: User,
    pub blobs: Vec<OwnedBlob>,
}

/// Partial profile update. Empty strings count as "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub avatar_icon: Option<String>,
    pub avatar_color: Option<String>,
}

impl UserUpdate {
    /// Drops fields that are absent or blank.
    pub fn normalized(self) -> Self {
        fn keep(v: Option<String>) -> Option<String> {
            v.filter(|s| !s.trim().is_empty())
        }
        Self {
            name: keep(self.name),
            email: keep(self.email),
            bio: keep(self.bio),
            image: keep(self.image),
            avatar_icon: keep(self.avatar_icon),
            avatar_color: keep(self.avatar_color),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.bio.is_none()
            && self.image.is_none()
            && self.avatar_icon.is_none()
            && self.avatar_color.is_none()
    }
}

/// Author fields denormalised onto blob views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobAuthor {
    pub username: Option<String>,
    pub avatar_icon: Option<String>,
    pub user_created_at: Option<DateTime<Utc>>,
}

/// A blob with every comment, like and interest attached to it, each list
/// deduplicated by child id in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobAggregate {
    #[serde(flatten)]
    pub blob: Blob,
    #[serde(flatten)]
    pub author: BlobAuthor,
    pub comments: Vec<Comment>,
    pub likes: Vec<Like>,
    pub interests: Vec<Interest>,
}

/// One entry of the paginated blob feed. Counts are computed by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobSummary {
    #[serde(flatten)]
    pub blob: Blob,
    #[serde(flatten)]
    pub author: BlobAuthor,
    pub likes_count: i64,
    pub comments_count: i64,
    pub interests: Vec<String>,
}

/// A page of the blob feed with its pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobPage {
    #[serde(flatten)]
    pub meta: PageMeta,
    pub blobs: Vec<BlobSummary>,
}

/// A live session row resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub expires: DateTime<Utc>,
}

/// The authenticated caller, resolved before any service call and passed explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActingUser {
    pub id: String,
    pub email: String,
}

impl From<Session> for ActingUser {
    fn from(s: Session) -> Self {
        Self {
            id: s.user_id,
            email: s.email,
        }
    }
}
