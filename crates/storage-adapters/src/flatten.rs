//! # Row flattening
//!
//! The read queries LEFT JOIN several child tables onto one parent, so the store
//! returns the cartesian product of the child branches: a blob with 2 comments and
//! 3 likes comes back as 6 rows. Each row carries the parent columns plus one group
//! of nullable columns per branch. A branch group is all-NULL when that row has no
//! child on that branch.
//!
//! Flattening takes the parent from the first row and, per branch, keeps the first
//! row seen for every distinct child id. Branches are independent of each other.
//! A child id with a NULL required column means the store handed back an
//! inconsistent row; that aborts the whole reconstruction.
//!
//! These functions are pure so the in-memory test store can feed them the same
//! row shapes the SQL queries produce.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use domains::{
    Blob, BlobAggregate, BlobAuthor, BlobSummary, Comment, DomainError, Interest, Like,
    OwnedBlob, User, UserWithBlobs,
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlattenError {
    #[error("{branch} {id}: required column `{column}` is NULL")]
    MissingColumn {
        branch: &'static str,
        id: String,
        column: &'static str,
    },

    #[error("{branch}: malformed id {value:?}")]
    MalformedId { branch: &'static str, value: String },
}

impl FlattenError {
    /// Wraps the error with the name of the operation that was reading the rows.
    pub fn into_domain(self, op: &'static str) -> DomainError {
        DomainError::store(op, self)
    }
}

type Flat<T> = Result<T, FlattenError>;

/// One row of the blob detail query (`blob × comments × likes × interests`).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "db-postgres", derive(sqlx::FromRow))]
pub struct BlobDetailRow {
    pub blob_id: String,
    pub blob_user_id: String,
    pub blob_content: String,
    pub blob_created_at: DateTime<Utc>,
    pub blob_updated_at: DateTime<Utc>,
    pub user_username: Option<String>,
    pub user_avatar_icon: Option<String>,
    pub user_created_at: Option<DateTime<Utc>>,
    pub comment_id: Option<String>,
    pub comment_user_id: Option<String>,
    pub comment_content: Option<String>,
    pub comment_created_at: Option<DateTime<Utc>>,
    pub comment_updated_at: Option<DateTime<Utc>>,
    pub like_id: Option<String>,
    pub like_user_id: Option<String>,
    pub like_created_at: Option<DateTime<Utc>>,
    pub interest_id: Option<String>,
    pub interest_name: Option<String>,
    pub interest_description: Option<String>,
    pub interest_created_at: Option<DateTime<Utc>>,
    pub interest_updated_at: Option<DateTime<Utc>>,
}

/// One row of the feed query: a blob, one of its interest names, and the counts.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "db-postgres", derive(sqlx::FromRow))]
pub struct BlobListRow {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub username: Option<String>,
    pub avatar_icon: Option<String>,
    pub user_created_at: Option<DateTime<Utc>>,
    pub interest_name: Option<String>,
    pub likes_count: i64,
    pub comments_count: i64,
}

/// One row of the profile query: the user and at most one owned blob.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "db-postgres", derive(sqlx::FromRow))]
pub struct UserBlobRow {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub email_verified: Option<DateTime<Utc>>,
    pub image: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub avatar_icon: String,
    pub avatar_color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub blob_id: Option<String>,
    pub blob_content: Option<String>,
    pub blob_created_at: Option<DateTime<Utc>>,
    pub blob_updated_at: Option<DateTime<Utc>>,
}

/// Ordered, deduplicated children of one join branch.
struct Branch<T> {
    name: &'static str,
    seen: HashSet<String>,
    items: Vec<T>,
}

impl<T> Branch<T> {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            seen: HashSet::new(),
            items: Vec::new(),
        }
    }

    /// Materialises a child the first time `id` shows up; NULL or repeated ids are skipped.
    fn absorb<F>(&mut self, id: Option<&str>, build: F) -> Flat<()>
    where
        F: FnOnce(Cell<'_>) -> Flat<T>,
    {
        let Some(id) = id else {
            return Ok(());
        };
        if self.seen.contains(id) {
            return Ok(());
        }
        let item = build(Cell {
            branch: self.name,
            id,
        })?;
        self.seen.insert(id.to_owned());
        self.items.push(item);
        Ok(())
    }

    fn into_items(self) -> Vec<T> {
        self.items
    }
}

/// Context for reading one child's columns, used to label errors.
#[derive(Clone, Copy)]
struct Cell<'a> {
    branch: &'static str,
    id: &'a str,
}

impl Cell<'_> {
    fn uuid(&self) -> Flat<Uuid> {
        parse_id(self.branch, self.id)
    }

    fn required<T: Clone>(&self, column: &'static str, value: &Option<T>) -> Flat<T> {
        value.clone().ok_or_else(|| FlattenError::MissingColumn {
            branch: self.branch,
            id: self.id.to_owned(),
            column,
        })
    }
}

fn parse_id(branch: &'static str, raw: &str) -> Flat<Uuid> {
    Uuid::parse_str(raw).map_err(|_| FlattenError::MalformedId {
        branch,
        value: raw.to_owned(),
    })
}

/// Rebuilds a [`BlobAggregate`] from the detail query. `Ok(None)` when there are no rows.
pub fn flatten_blob_detail(rows: &[BlobDetailRow]) -> Flat<Option<BlobAggregate>> {
    let Some(first) = rows.first() else {
        return Ok(None);
    };
    let blob_id = parse_id("blob", &first.blob_id)?;

    let mut comments = Branch::new("comment");
    let mut likes = Branch::new("like");
    let mut interests = Branch::new("interest");

    for row in rows {
        comments.absorb(row.comment_id.as_deref(), |c| {
            Ok(Comment {
                id: c.uuid()?,
                user_id: c.required("comment_user_id", &row.comment_user_id)?,
                blob_id,
                content: c.required("comment_content", &row.comment_content)?,
                created_at: c.required("comment_created_at", &row.comment_created_at)?,
                updated_at: c.required("comment_updated_at", &row.comment_updated_at)?,
            })
        })?;

        likes.absorb(row.like_id.as_deref(), |c| {
            Ok(Like {
                id: c.uuid()?,
                user_id: c.required("like_user_id", &row.like_user_id)?,
                blob_id,
                created_at: c.required("like_created_at", &row.like_created_at)?,
            })
        })?;

        interests.absorb(row.interest_id.as_deref(), |c| {
            Ok(Interest {
                id: c.uuid()?,
                name: c.required("interest_name", &row.interest_name)?,
                description: row.interest_description.clone(),
                created_at: c.required("interest_created_at", &row.interest_created_at)?,
                updated_at: c.required("interest_updated_at", &row.interest_updated_at)?,
            })
        })?;
    }

    Ok(Some(BlobAggregate {
        blob: Blob {
            id: blob_id,
            user_id: first.blob_user_id.clone(),
            content: first.blob_content.clone(),
            created_at: first.blob_created_at,
            updated_at: first.blob_updated_at,
        },
        author: BlobAuthor {
            username: first.user_username.clone(),
            avatar_icon: first.user_avatar_icon.clone(),
            user_created_at: first.user_created_at,
        },
        comments: comments.into_items(),
        likes: likes.into_items(),
        interests: interests.into_items(),
    }))
}

/// Folds feed rows (one per attached interest) into one summary per blob, keeping
/// the order in which blob ids first appear. Counts are taken from the row as-is.
pub fn fold_blob_list(rows: &[BlobListRow]) -> Flat<Vec<BlobSummary>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut entries: Vec<(BlobSummary, Branch<String>)> = Vec::new();

    for row in rows {
        let slot = match index.get(row.id.as_str()) {
            Some(&slot) => slot,
            None => {
                let summary = BlobSummary {
                    blob: Blob {
                        id: parse_id("blob", &row.id)?,
                        user_id: row.user_id.clone(),
                        content: row.content.clone(),
                        created_at: row.created_at,
                        updated_at: row.updated_at,
                    },
                    author: BlobAuthor {
                        username: row.username.clone(),
                        avatar_icon: row.avatar_icon.clone(),
                        user_created_at: row.user_created_at,
                    },
                    likes_count: row.likes_count,
                    comments_count: row.comments_count,
                    interests: Vec::new(),
                };
                entries.push((summary, Branch::new("interest")));
                index.insert(row.id.as_str(), entries.len() - 1);
                entries.len() - 1
            }
        };

        let names = &mut entries[slot].1;
        names.absorb(row.interest_name.as_deref(), |c| Ok(c.id.to_owned()))?;
    }

    Ok(entries
        .into_iter()
        .map(|(mut summary, names)| {
            summary.interests = names.into_items();
            summary
        })
        .collect())
}

/// Rebuilds a profile with its owned blobs. `Ok(None)` when there are no rows.
pub fn flatten_user_with_blobs(rows: &[UserBlobRow]) -> Flat<Option<UserWithBlobs>> {
    let Some(first) = rows.first() else {
        return Ok(None);
    };

    let mut blobs = Branch::new("blob");
    for row in rows {
        blobs.absorb(row.blob_id.as_deref(), |c| {
            Ok(OwnedBlob {
                id: c.uuid()?,
                content: c.required("blob_content", &row.blob_content)?,
                created_at: c.required("blob_created_at", &row.blob_created_at)?,
                updated_at: c.required("blob_updated_at", &row.blob_updated_at)?,
            })
        })?;
    }

    Ok(Some(UserWithBlobs {
        user: User {
            id: first.id.clone(),
            name: first.name.clone(),
            email: first.email.clone(),
            email_verified: first.email_verified,
            image: first.image.clone(),
            username: first.username.clone(),
            bio: first.bio.clone(),
            avatar_icon: first.avatar_icon.clone(),
            avatar_color: first.avatar_color.clone(),
            created_at: first.created_at,
            updated_at: first.updated_at,
        },
        blobs: blobs.into_items(),
    }))
}
