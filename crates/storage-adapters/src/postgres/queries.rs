//! SQL text for the PostgreSQL repositories.
//!
//! Column aliases in the join queries must match the field names of the row
//! structs in `crate::flatten`.

pub const INSERT_BLOB: &str = r#"
    INSERT INTO "Blob" (id, user_id, content, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5)"#;

pub const INSERT_BLOB_INTEREST: &str = r#"
    INSERT INTO "_BlobToInterest" (blob_id, interest_id)
    VALUES ($1, $2)"#;

/// `blob × comments × likes × interests` for a single blob.
pub const BLOB_DETAIL: &str = r#"
    SELECT
        b.id          AS blob_id,
        b.user_id     AS blob_user_id,
        b.content     AS blob_content,
        b.created_at  AS blob_created_at,
        b.updated_at  AS blob_updated_at,
        u.username    AS user_username,
        u.avatar_icon AS user_avatar_icon,
        u.created_at  AS user_created_at,
        c.id          AS comment_id,
        c.user_id     AS comment_user_id,
        c.content     AS comment_content,
        c.created_at  AS comment_created_at,
        c.updated_at  AS comment_updated_at,
        l.id          AS like_id,
        l.user_id     AS like_user_id,
        l.created_at  AS like_created_at,
        i.id          AS interest_id,
        i.name        AS interest_name,
        i.description AS interest_description,
        i.created_at  AS interest_created_at,
        i.updated_at  AS interest_updated_at
    FROM "Blob" b
    LEFT JOIN "User" u             ON u.id = b.user_id
    LEFT JOIN "Comment" c          ON c.blob_id = b.id
    LEFT JOIN "Like" l             ON l.blob_id = b.id
    LEFT JOIN "_BlobToInterest" bi ON bi.blob_id = b.id
    LEFT JOIN "Interest" i         ON i.id = bi.interest_id
    WHERE b.id = $1
    ORDER BY c.created_at, l.created_at, i.name"#;

pub const BLOB_EXISTS: &str = r#"SELECT EXISTS (SELECT 1 FROM "Blob" WHERE id = $1)"#;

pub const COUNT_BLOBS: &str = r#"SELECT COUNT(*) FROM "Blob""#;

/// Pages over blobs first so LIMIT/OFFSET count blobs, not fanned-out rows,
/// then attaches one row per interest and the per-blob counts.
pub const LIST_BLOBS_PAGE: &str = r#"
    WITH page AS (
        SELECT id, user_id, content, created_at, updated_at
        FROM "Blob"
        ORDER BY created_at DESC, id
        LIMIT $1 OFFSET $2
    )
    SELECT
        p.id,
        p.user_id,
        p.content,
        p.created_at,
        p.updated_at,
        u.username,
        u.avatar_icon,
        u.created_at AS user_created_at,
        i.name       AS interest_name,
        (SELECT COUNT(*) FROM "Like" l WHERE l.blob_id = p.id)    AS likes_count,
        (SELECT COUNT(*) FROM "Comment" c WHERE c.blob_id = p.id) AS comments_count
    FROM page p
    LEFT JOIN "User" u             ON u.id = p.user_id
    LEFT JOIN "_BlobToInterest" bi ON bi.blob_id = p.id
    LEFT JOIN "Interest" i         ON i.id = bi.interest_id
    ORDER BY p.created_at DESC, p.id, i.name"#;

pub const DELETE_OWNED_BLOB: &str = r#"DELETE FROM "Blob" WHERE id = $1 AND user_id = $2"#;

pub const PURGE_BLOBS_BEFORE: &str = r#"DELETE FROM "Blob" WHERE created_at < $1"#;

pub const LIST_INTERESTS: &str = r#"
    SELECT id, name, description, created_at, updated_at
    FROM "Interest"
    ORDER BY name"#;

pub const INSERT_COMMENT: &str = r#"
    INSERT INTO "Comment" (id, content, user_id, blob_id, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6)"#;

pub const DELETE_OWNED_COMMENT: &str = r#"DELETE FROM "Comment" WHERE id = $1 AND user_id = $2"#;

pub const COMMENTS_BY_BLOB: &str = r#"
    SELECT
        c.id,
        c.content,
        c.created_at,
        c.updated_at,
        c.user_id,
        c.blob_id,
        u.image,
        u.username,
        COALESCE(u.avatar_icon, 'user')  AS avatar_icon,
        COALESCE(u.avatar_color, 'cyan') AS avatar_color
    FROM "Comment" c
    JOIN "User" u ON u.id = c.user_id
    WHERE c.blob_id = $1
    ORDER BY c.created_at"#;

pub const INSERT_LIKE: &str = r#"
    INSERT INTO "Like" (id, user_id, blob_id, created_at)
    VALUES ($1, $2, $3, $4)"#;

pub const FIND_LIKE_ID: &str = r#"SELECT id FROM "Like" WHERE user_id = $1 AND blob_id = $2"#;

pub const DELETE_LIKE: &str = r#"
    DELETE FROM "Like"
    WHERE id = $1 AND user_id = $2 AND blob_id = $3"#;

pub const LIKES_BY_BLOB: &str = r#"
    SELECT
        l.id,
        l.created_at,
        l.user_id,
        l.blob_id,
        u.image,
        u.username,
        COALESCE(u.avatar_icon, 'user')  AS avatar_icon,
        COALESCE(u.avatar_color, 'cyan') AS avatar_color
    FROM "Like" l
    JOIN "User" u ON u.id = l.user_id
    WHERE l.blob_id = $1
    ORDER BY l.created_at"#;

pub const USER_BY_ID: &str = r#"
    SELECT
        id, name, email, email_verified, image, username, bio,
        COALESCE(avatar_icon, 'user')  AS avatar_icon,
        COALESCE(avatar_color, 'cyan') AS avatar_color,
        created_at, updated_at
    FROM "User"
    WHERE id = $1"#;

pub const USER_WITH_BLOBS_BY_USERNAME: &str = r#"
    SELECT
        u.id,
        u.name,
        u.email,
        u.email_verified,
        u.image,
        u.username,
        u.bio,
        COALESCE(u.avatar_icon, 'user')  AS avatar_icon,
        COALESCE(u.avatar_color, 'cyan') AS avatar_color,
        u.created_at,
        u.updated_at,
        b.id         AS blob_id,
        b.content    AS blob_content,
        b.created_at AS blob_created_at,
        b.updated_at AS blob_updated_at
    FROM "User" u
    LEFT JOIN "Blob" b ON b.user_id = u.id
    WHERE u.username = $1
    ORDER BY b.created_at DESC"#;

pub const DELETE_VERIFICATION_TOKENS: &str =
    r#"DELETE FROM "VerificationToken" WHERE email = $1"#;

pub const SESSION_BY_TOKEN: &str = r#"
    SELECT s.user_id, COALESCE(u.email, '') AS email, s.expires
    FROM "Session" s
    JOIN "User" u ON u.id = s.user_id
    WHERE s.session_token = $1"#;
