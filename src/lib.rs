//! Chunked upload of exported archives to object storage, and lazy
//! directory-tree inspection of uploaded archives.

pub mod archive;
pub mod cache;
pub mod config;
pub mod gateway;
pub mod providers;
pub mod s3;
pub mod shell;
pub mod tree;
pub mod upload;

pub use config::Config;
