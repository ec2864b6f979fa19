//! # storage-adapters
//!
//! Persistence for the blob backend. `flatten` turns join rows into read models and
//! is always compiled; the PostgreSQL repositories sit behind `db-postgres`.

pub mod flatten;

#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use flatten::{
    flatten_blob_detail, flatten_user_with_blobs, fold_blob_list, BlobDetailRow, BlobListRow,
    FlattenError, UserBlobRow,
};
