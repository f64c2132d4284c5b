//! Videoteca Database Library
//!
//! Connection setup, embedded migrations and the repositories for users,
//! tags, videos and video media.

pub mod db;
pub mod setup;

pub use db::{TagRepository, UserRepository, VideoMediaRepository, VideoRepository};
pub use setup::{connect, ping, run_migrations, setup_database, MIGRATOR};
