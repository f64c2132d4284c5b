use uuid::Uuid;
use videoteca_core::models::{MediaStatus, NewVideo, NewVideoMedia, User, Video, VideoMedia};

use super::TestDb;

pub const BOB_PASSWORD: &str = "SenhaTesteBob123$";

/// Create the author used across scenarios
pub async fn create_author(db: &TestDb, username: &str) -> User {
    db.users
        .create_user(username, BOB_PASSWORD)
        .await
        .expect("Failed to create author")
}

/// Create an unpublished video with a slug derived from the title
pub async fn create_video(db: &TestDb, title: &str, author_id: Uuid) -> Video {
    db.videos
        .create(NewVideo::new(title, format!("Descrição de {}.", title), author_id))
        .await
        .expect("Failed to create video")
}

/// Attach media in `status` to a video
pub async fn attach_media(
    db: &TestDb,
    video_id: Uuid,
    path: &str,
    status: MediaStatus,
) -> VideoMedia {
    db.media
        .create(NewVideoMedia::new(video_id, path).with_status(status))
        .await
        .expect("Failed to create video media")
}
