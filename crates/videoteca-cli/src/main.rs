//! Videoteca CLI: diagnostics, migrations and catalogue management.
//!
//! Reads the database and media settings from the environment (`.env` is
//! loaded first). Output is pretty-printed JSON on stdout; logs go to stderr.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;
use videoteca_cli::health::DockerCli;
use videoteca_cli::report::{find_app_error, report_app_error};
use videoteca_cli::{doctor, init_tracing};
use videoteca_core::models::{
    MediaStatus, NewTag, NewVideo, NewVideoMedia, TagChanges, VideoChanges,
};
use videoteca_core::Config;
use videoteca_db::{
    setup_database, TagRepository, UserRepository, VideoMediaRepository, VideoRepository,
};
use videoteca_storage::create_storage;

#[derive(Parser)]
#[command(name = "videoteca", about = "Videoteca catalogue CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check environment variables, database access and containers
    Doctor {
        /// Do not look for the database and pgAdmin containers
        #[arg(long)]
        skip_containers: bool,
    },
    /// Apply pending database migrations
    Migrate,
    /// Tag operations
    Tag {
        #[command(subcommand)]
        sub: TagCommands,
    },
    /// Video operations
    Video {
        #[command(subcommand)]
        sub: VideoCommands,
    },
    /// Video media operations
    Media {
        #[command(subcommand)]
        sub: MediaCommands,
    },
    /// Author operations
    User {
        #[command(subcommand)]
        sub: UserCommands,
    },
}

#[derive(Subcommand)]
enum TagCommands {
    /// Create a tag
    Create { name: String },
    /// List all tags
    List,
    /// Get a tag by UUID
    Get { id: Uuid },
    /// Rename a tag
    Rename { id: Uuid, name: String },
    /// Delete a tag
    Delete { id: Uuid },
}

#[derive(Subcommand)]
enum VideoCommands {
    /// Create an unpublished video
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// Author username
        #[arg(long)]
        author: String,
        /// Defaults to a slug of the title
        #[arg(long)]
        slug: Option<String>,
        /// Tag UUIDs
        #[arg(long = "tag")]
        tags: Vec<Uuid>,
    },
    /// List all videos
    List,
    /// Get a video by UUID or slug
    Get { id_or_slug: String },
    /// Change title, description or slug
    Update {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        slug: Option<String>,
    },
    /// Publish a video whose media finished processing
    Publish { id: Uuid },
    /// Unpublish a video
    Unpublish { id: Uuid },
    /// Delete a video
    Delete { id: Uuid },
    /// List the tags of a video
    Tags { id: Uuid },
    /// Replace the tags of a video
    SetTags { id: Uuid, tags: Vec<Uuid> },
    /// Count a view
    View { id: Uuid },
    /// Count a like
    Like { id: Uuid },
    /// Show the processing status label
    Status { id: Uuid },
    /// Upload a thumbnail image
    Thumbnail {
        id: Uuid,
        file: PathBuf,
        #[arg(long, default_value = "application/octet-stream")]
        content_type: String,
    },
}

#[derive(Subcommand)]
enum MediaCommands {
    /// Attach media to a video
    Create {
        #[arg(long)]
        video: Uuid,
        #[arg(long)]
        path: String,
        /// UPLOADED_STARTED, PROCESSING_STARTED, PROCESSING_FINISHED or PROCESSING_ERROR
        #[arg(long)]
        status: Option<String>,
    },
    /// List all media
    List,
    /// Get media by UUID
    Get { id: Uuid },
    /// Get the media of a video
    ForVideo { video: Uuid },
    /// Change the processing status
    SetStatus { id: Uuid, status: String },
    /// Delete media
    Delete { id: Uuid },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Register an author. The password is read from VIDEOTECA_PASSWORD when omitted.
    Create {
        username: String,
        #[arg(long, env = "VIDEOTECA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Get an author by username
    Get { username: String },
    /// Count authors
    Count,
    /// Delete an author
    Delete { id: Uuid },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

struct Repositories {
    tags: TagRepository,
    videos: VideoRepository,
    media: VideoMediaRepository,
    users: UserRepository,
}

async fn repositories(config: &Config) -> anyhow::Result<Repositories> {
    let pool = setup_database(config)
        .await
        .context("Failed to set up database")?;
    let storage = create_storage(config)
        .await
        .context("Failed to set up media storage")?;

    Ok(Repositories {
        tags: TagRepository::new(pool.clone()),
        videos: VideoRepository::new(pool.clone(), Arc::clone(&storage)),
        media: VideoMediaRepository::new(pool.clone()),
        users: UserRepository::new(pool),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        if let Some(app_err) = find_app_error(&err) {
            let report = report_app_error(app_err);
            let out = serde_json::to_string_pretty(&report).context("Serialize error report")?;
            eprintln!("{}", out);
        }
        return Err(err);
    }

    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Doctor { skip_containers } => {
            let docker = DockerCli::default();
            let runtime = if skip_containers {
                None
            } else {
                Some(&docker as &dyn videoteca_cli::health::ContainerRuntime)
            };
            let report = doctor::run(runtime).await;
            print_json(&report)?;
            if !report.healthy() {
                bail!("One or more checks failed");
            }
        }
        Commands::Migrate => {
            let config = Config::from_env()?;
            setup_database(&config).await?;
            print_json(&serde_json::json!({ "success": true, "message": "Migrations applied" }))?;
        }
        Commands::Tag { sub } => {
            let repos = repositories(&Config::from_env()?).await?;
            run_tag(&repos, sub).await?;
        }
        Commands::Video { sub } => {
            let repos = repositories(&Config::from_env()?).await?;
            run_video(&repos, sub).await?;
        }
        Commands::Media { sub } => {
            let repos = repositories(&Config::from_env()?).await?;
            run_media(&repos, sub).await?;
        }
        Commands::User { sub } => {
            let repos = repositories(&Config::from_env()?).await?;
            run_user(&repos, sub).await?;
        }
    }

    Ok(())
}

async fn run_tag(repos: &Repositories, sub: TagCommands) -> anyhow::Result<()> {
    match sub {
        TagCommands::Create { name } => print_json(&repos.tags.create(NewTag::new(name)).await?),
        TagCommands::List => print_json(&repos.tags.list().await?),
        TagCommands::Get { id } => {
            let tag = repos
                .tags
                .get(id)
                .await?
                .with_context(|| format!("Tag {} not found", id))?;
            print_json(&tag)
        }
        TagCommands::Rename { id, name } => {
            print_json(&repos.tags.update(id, TagChanges::rename(name)).await?)
        }
        TagCommands::Delete { id } => {
            repos.tags.delete(id).await?;
            print_json(&serde_json::json!({ "success": true, "message": format!("Tag {} deleted", id) }))
        }
    }
}

async fn run_video(repos: &Repositories, sub: VideoCommands) -> anyhow::Result<()> {
    match sub {
        VideoCommands::Create {
            title,
            description,
            author,
            slug,
            tags,
        } => {
            let author = repos
                .users
                .get_by_username(&author)
                .await?
                .with_context(|| format!("Author {} not found", author))?;
            let mut new_video = NewVideo::new(title, description, author.id).with_tags(tags);
            if let Some(slug) = slug {
                new_video = new_video.with_slug(slug);
            }
            print_json(&repos.videos.create(new_video).await?)
        }
        VideoCommands::List => print_json(&repos.videos.list().await?),
        VideoCommands::Get { id_or_slug } => {
            let video = match id_or_slug.parse::<Uuid>() {
                Ok(id) => repos.videos.get(id).await?,
                Err(_) => repos.videos.get_by_slug(&id_or_slug).await?,
            }
            .with_context(|| format!("Video {} not found", id_or_slug))?;
            let thumbnail_url = repos.videos.thumbnail_url(&video);
            let status = repos.videos.status_display(video.id).await?;
            print_json(&serde_json::json!({
                "video": video,
                "thumbnail_url": thumbnail_url,
                "status": status,
            }))
        }
        VideoCommands::Update {
            id,
            title,
            description,
            slug,
        } => {
            let changes = VideoChanges {
                title,
                description,
                slug,
                is_published: None,
            };
            if changes.is_empty() {
                bail!("Nothing to update: pass --title, --description or --slug");
            }
            print_json(&repos.videos.update(id, changes).await?)
        }
        VideoCommands::Publish { id } => {
            print_json(&repos.videos.update(id, VideoChanges::publish()).await?)
        }
        VideoCommands::Unpublish { id } => {
            print_json(&repos.videos.update(id, VideoChanges::unpublish()).await?)
        }
        VideoCommands::Delete { id } => {
            repos.videos.delete(id).await?;
            print_json(&serde_json::json!({ "success": true, "message": format!("Video {} deleted", id) }))
        }
        VideoCommands::Tags { id } => print_json(&repos.videos.tags(id).await?),
        VideoCommands::SetTags { id, tags } => print_json(&repos.videos.set_tags(id, &tags).await?),
        VideoCommands::View { id } => print_json(&repos.videos.increment_views(id).await?),
        VideoCommands::Like { id } => print_json(&repos.videos.increment_likes(id).await?),
        VideoCommands::Status { id } => {
            let status = repos.videos.status_display(id).await?;
            print_json(&serde_json::json!({ "id": id, "status": status }))
        }
        VideoCommands::Thumbnail {
            id,
            file,
            content_type,
        } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let original_filename = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .with_context(|| format!("{} has no file name", file.display()))?;
            let video = repos
                .videos
                .upload_thumbnail(id, &original_filename, &content_type, data)
                .await?;
            let thumbnail_url = repos.videos.thumbnail_url(&video);
            print_json(&serde_json::json!({ "video": video, "thumbnail_url": thumbnail_url }))
        }
    }
}

async fn run_media(repos: &Repositories, sub: MediaCommands) -> anyhow::Result<()> {
    match sub {
        MediaCommands::Create {
            video,
            path,
            status,
        } => {
            let mut new_media = NewVideoMedia::new(video, path);
            if let Some(status) = status {
                new_media = new_media.with_status(status.parse::<MediaStatus>()?);
            }
            print_json(&repos.media.create(new_media).await?)
        }
        MediaCommands::List => print_json(&repos.media.list().await?),
        MediaCommands::Get { id } => {
            let media = repos
                .media
                .get(id)
                .await?
                .with_context(|| format!("Video media {} not found", id))?;
            print_json(&media)
        }
        MediaCommands::ForVideo { video } => print_json(&repos.media.find_by_video(video).await?),
        MediaCommands::SetStatus { id, status } => {
            let status = status.parse::<MediaStatus>()?;
            print_json(&repos.media.set_status(id, status).await?)
        }
        MediaCommands::Delete { id } => {
            repos.media.delete(id).await?;
            print_json(&serde_json::json!({ "success": true, "message": format!("Video media {} deleted", id) }))
        }
    }
}

async fn run_user(repos: &Repositories, sub: UserCommands) -> anyhow::Result<()> {
    match sub {
        UserCommands::Create { username, password } => {
            print_json(&repos.users.create_user(&username, &password).await?)
        }
        UserCommands::Get { username } => {
            let user = repos
                .users
                .get_by_username(&username)
                .await?
                .with_context(|| format!("User {} not found", username))?;
            print_json(&user)
        }
        UserCommands::Count => print_json(&serde_json::json!({ "count": repos.users.count().await? })),
        UserCommands::Delete { id } => {
            repos.users.delete(id).await?;
            print_json(&serde_json::json!({ "success": true, "message": format!("User {} deleted", id) }))
        }
    }
}
