pub mod archive;
pub mod bundle;
pub mod config;
pub mod dist;
pub mod download;
pub mod error;
pub mod github;
pub mod pipeline;
pub mod resolver;
pub mod runtime;
