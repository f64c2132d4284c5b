//! Data models for the catalogue
//!
//! Each sub-module holds one entity together with the input structs used to
//! create and change it. Inputs derive `Validate`; repositories call
//! `validate()` before anything is written.

mod tag;
mod user;
mod video;
mod video_media;

pub use tag::*;
pub use user::*;
pub use video::*;
pub use video_media::*;
