//! Blob storage for artifact images

pub mod blob;

pub use blob::{BlobRef, BlobStore, HttpBlobStore};
