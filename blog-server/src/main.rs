use std::sync::Arc;

use tracing::{info, warn};

use blog_server::application::auth_service::AuthService;
use blog_server::application::post_service::PostService;
use blog_server::data::post_repository::{MemoryPostStore, PgPostStore, PostStore};
use blog_server::data::token_repository::{MemoryTokenStore, PgTokenStore, TokenStore};
use blog_server::data::user_repository::{MemoryUserStore, PgUserStore, UserStore};
use blog_server::infrastructure::config::AppConfig;
use blog_server::infrastructure::database::{create_pool, run_migrations};
use blog_server::infrastructure::logging::init_logging;
use blog_server::server;

struct Stores {
    posts: Arc<dyn PostStore>,
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenStore>,
}

async fn open_stores(config: &AppConfig) -> anyhow::Result<Stores> {
    let Some(database_url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL is not set, data lives in memory and is lost on exit");
        return Ok(Stores {
            posts: Arc::new(MemoryPostStore::new()),
            users: Arc::new(MemoryUserStore::new()),
            tokens: Arc::new(MemoryTokenStore::new()),
        });
    };

    let pool = create_pool(database_url).await?;
    run_migrations(&pool).await?;

    Ok(Stores {
        posts: Arc::new(PgPostStore::new(pool.clone())),
        users: Arc::new(PgUserStore::new(pool.clone())),
        tokens: Arc::new(PgTokenStore::new(pool)),
    })
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env()?;
    let stores = open_stores(&config).await?;

    let auth_service = AuthService::new(stores.users, stores.tokens, config.token_ttl);
    let post_service = PostService::new(stores.posts);

    server::run(config, post_service, auth_service).await?;

    info!("shutdown complete");
    Ok(())
}
