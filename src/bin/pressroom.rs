//! Pressroom command-line client
//!
//! Loads configuration (TOML file from `PRESSROOM_CONFIG`, otherwise environment),
//! signs in when `PRESSROOM_EMAIL` and `PRESSROOM_PASSWORD` are set, and prints the
//! first page of posts.

use pressroom::client::{FileStorage, MemoryStorage, Pressroom, Storage};
use pressroom::shared::models::LoginRequest;
use pressroom::shared::ClientConfig;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let config = match std::env::var("PRESSROOM_CONFIG") {
        Ok(path) => ClientConfig::from_toml_file(path)?,
        Err(_) => ClientConfig::from_env()?,
    };
    tracing::info!("[STARTUP] Using API at {}", config.base_url);

    let storage: Arc<dyn Storage> = match FileStorage::default_location().and_then(FileStorage::open) {
        Ok(storage) => {
            tracing::debug!("[STARTUP] Session file at {}", storage.path().display());
            Arc::new(storage)
        }
        Err(e) => {
            tracing::warn!("[STARTUP] No persistent storage ({}), session will not be kept", e);
            Arc::new(MemoryStorage::new())
        }
    };

    let pressroom = Pressroom::connect(config, storage)?;

    if let (Ok(email), Ok(password)) = (
        std::env::var("PRESSROOM_EMAIL"),
        std::env::var("PRESSROOM_PASSWORD"),
    ) {
        let user = pressroom.auth.login(&LoginRequest { email, password }).await?;
        println!("Signed in as {}", user.display_name.unwrap_or(user.username));
    } else if let Some(user) = pressroom.auth.user().await {
        println!("Resuming session of {}", user.username);
    }

    let page = pressroom.posts.fetch_posts(1).await?;
    println!(
        "Page {}/{} ({} posts total)",
        page.pagination.page,
        page.pagination.total_pages.max(1),
        page.pagination.total
    );
    for post in &page.posts {
        let author = post
            .author
            .as_ref()
            .map(|author| author.username.as_str())
            .unwrap_or("unknown");
        println!("  {:<40} by {:<16} {:>4} likes", post.title, author, post.likes_count);
    }

    Ok(())
}
