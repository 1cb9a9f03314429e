//! CLI command handling.

use std::sync::Arc;
use std::time::Duration;

use clap::Subcommand;
use gesher_core::config::GesherConfig;
use gesher_core::media::{
    HttpPrefetchLoader, MediaError, MediaLoader, MediaReadinessStore, NoopLoader,
    StaticUrlResolver, StorageUrlResolver, UrlResolver,
};
use gesher_core::mode::RuntimeMode;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Address to bind, overriding config/environment
        #[arg(long)]
        bind: Option<String>,

        /// Runtime mode: production or development
        #[arg(long, default_value = "development")]
        mode: RuntimeMode,
    },
    /// Preload one media asset and print its state transitions
    Preload {
        /// Storage key of the asset (e.g. videos/hero.mp4)
        key: String,

        /// Runtime mode: production or development
        #[arg(long, default_value = "production")]
        mode: RuntimeMode,
    },
}

pub async fn handle_command(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Serve { bind, mode } => {
            let mut config = GesherConfig::from_env();
            if let Some(bind) = bind {
                config.server.bind_address = bind;
            }
            gesher_web::run_server(config, mode).await
        }
        Commands::Preload { key, mode } => preload(&key, mode).await.map_err(|e| {
            eprintln!("{}", e.user_message());
            e.into()
        }),
    }
}

/// One-shot preload driving the store outside the server.
async fn preload(key: &str, mode: RuntimeMode) -> gesher_core::Result<()> {
    let config = GesherConfig::from_env();

    let (resolver, loader): (Arc<dyn UrlResolver>, Arc<dyn MediaLoader>) = match mode {
        RuntimeMode::Production => (
            Arc::new(StorageUrlResolver::new(config.media.clone())),
            Arc::new(HttpPrefetchLoader::new(&config.media)),
        ),
        RuntimeMode::Development => (
            Arc::new(StaticUrlResolver::new(config.media.dev_asset_base.clone())),
            Arc::new(NoopLoader),
        ),
    };

    let store = MediaReadinessStore::new(resolver, loader, &config.media);
    let mut events = store.subscribe();

    store.request_preload(key)?;
    println!("Preloading {key}...");

    // The buffering wait is bounded, so the attempt terminates within the
    // configured timeout plus resolution time.
    let deadline = config.media.buffer_timeout + config.media.resolve_timeout;
    let result = tokio::time::timeout(deadline + Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(state) => {
                    println!("  {} -> {}", state.key, state.readiness);
                    if state.readiness.is_terminal() {
                        return state;
                    }
                }
                Err(_) => {
                    return store.state(key);
                }
            }
        }
    })
    .await;

    match result {
        Ok(state) if state.readiness.is_ready() => {
            println!(
                "Ready: {}",
                state.resolved_url.as_deref().unwrap_or("(no url)")
            );
            Ok(())
        }
        Ok(state) => Err(MediaError::LoadFailed {
            reason: state
                .error_detail
                .unwrap_or_else(|| "unknown error".to_string()),
        }
        .into()),
        Err(_) => Err(MediaError::LoadFailed {
            reason: "preload did not terminate within the expected bound".to_string(),
        }
        .into()),
    }
}
