mod modules;

use modules::config;
use modules::cli;
use modules::error;
use modules::database::storage;
use modules::auth::{password, session, flash};
use modules::content::templates;
use modules::mail::contact;
use modules::web::{context, forms, routes, admin};

use actix_web::{middleware, web, App, HttpServer};
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use context::AppContext;
use log::{info, warn};

fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    match cli.into_command() {
        Commands::Init(args) => {
            if let Err(e) = cli::init_config(&args.config) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Serve(args) => actix_web::rt::System::new().block_on(async_web_server(args.config)),
    }
}

/// Open the database once at startup, drop stale sessions and log its size.
fn prepare_database(ctx: &AppContext) -> error::AppResult<()> {
    let db = ctx.db()?;

    let purged = db.purge_expired_sessions(ctx.session_ttl())?;
    if purged > 0 {
        info!("Purged {} expired sessions", purged);
    }
    info!(
        "Database ready: {} users, {} posts, {} comments",
        db.count_users()?,
        db.list_posts()?.len(),
        db.count_comments()?
    );
    Ok(())
}

async fn async_web_server(config_path: std::path::PathBuf) -> std::io::Result<()> {
    info!("Starting blog site...");

    let config = Config::load(&config_path).unwrap_or_else(|e| {
        eprintln!("Failed to load config from {}: {}", config_path.display(), e);
        std::process::exit(1);
    });

    if std::env::var("SECRET_KEY").is_err() {
        warn!("SECRET_KEY is not set; using a random key, sessions will not survive a restart");
    }
    if !contact::ContactMailer::new(config.mail.clone()).is_configured() {
        warn!("Mail relay is not configured; contact messages will fail");
    }

    info!("Configuration loaded");
    info!("Database: {}", config.database_path().display());
    info!(
        "Server will listen on {}:{}",
        config.server.host, config.server.port
    );

    let ctx = AppContext::new(config).unwrap_or_else(|e| {
        eprintln!("Failed to initialize application: {}", e);
        std::process::exit(1);
    });

    // Schema is created on first open; drop sessions that already expired.
    if let Err(e) = prepare_database(&ctx) {
        eprintln!("Failed to open database: {}", e);
        std::process::exit(1);
    }

    let bind_address = format!("{}:{}", ctx.config.server.host, ctx.config.server.port);
    let static_dir = ctx.config.paths.static_dir.clone();
    let data = web::Data::new(ctx);
    info!("Server starting on http://{}", bind_address);

    HttpServer::new(move || {
        let static_dir = static_dir.clone();
        App::new()
            .app_data(data.clone())
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
            .configure(move |cfg| {
                if static_dir.is_dir() {
                    cfg.service(actix_files::Files::new("/static", static_dir));
                }
            })
    })
    .bind(&bind_address)?
    .run()
    .await
}
