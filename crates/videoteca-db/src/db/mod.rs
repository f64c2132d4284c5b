//! Database repositories for the data access layer
//!
//! Each repository owns a `PgPool` and is responsible for one entity. Inputs
//! are validated before any statement runs; integrity violations reported by
//! PostgreSQL are translated into `AppError` variants by the `errors` module.

pub(crate) mod errors;
pub mod tag;
pub mod user;
pub mod video;
pub mod video_media;

pub use tag::TagRepository;
pub use user::UserRepository;
pub use video::VideoRepository;
pub use video_media::VideoMediaRepository;
