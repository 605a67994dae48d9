use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use server_api::{seed_records, ApiContext, EntityRegistry};
use shared::{
    domain::{EntityName, EntitySchema},
    protocol::{collection_route, entities_route},
};
use storage::open_store;
use tracing::{info, warn};

use crate::{
    config::{EntityConfig, Settings},
    routes::{build_router, AppState},
};

pub fn build_registry(entities: &[EntityConfig]) -> anyhow::Result<EntityRegistry> {
    let mut registry = EntityRegistry::new();
    for entity in entities {
        let name: EntityName = entity
            .name
            .parse()
            .with_context(|| format!("invalid entity name '{}'", entity.name))?;
        let schema = EntitySchema::new(name, entity.fields.clone())?;
        let schema = registry.register(schema)?;
        info!(
            entity = %schema.name(),
            fields = schema.fields().len(),
            "registered entity"
        );
    }
    Ok(registry)
}

pub async fn seed_from_config(ctx: &ApiContext, entities: &[EntityConfig]) -> anyhow::Result<()> {
    for entity in entities {
        let inserted = seed_records(ctx, &entity.name, &entity.seed)
            .await
            .map_err(|e| anyhow::anyhow!("seeding '{}' failed: {}", entity.name, e.message))?;
        if inserted > 0 {
            info!(entity = %entity.name, inserted, "seeded records");
        }
    }
    Ok(())
}

fn log_endpoints(registry: &EntityRegistry, addr: SocketAddr) {
    info!(route = entities_route(), "GET    list registered entities");
    for schema in registry.iter() {
        let base = collection_route(schema.name().as_str());
        info!(route = %base, "GET    list {}", schema.name());
        info!(route = %format!("{base}/{{id}}"), "GET    fetch one {}", schema.name());
        info!(route = %base, "POST   create {}", schema.name());
        info!(route = %format!("{base}/{{id}}"), "PUT    update {}", schema.name());
        info!(route = %format!("{base}/{{id}}"), "DELETE remove {}", schema.name());
    }
    info!(url = %format!("http://{addr}/"), "admin UI available");
}

/// Builds every component described by `settings` and serves until Ctrl-C.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let registry = build_registry(&settings.entities)?;
    if registry.is_empty() {
        warn!("no entities registered; declare [[entities]] in the config file before starting the server");
        return Ok(());
    }

    let store = open_store(settings.database_url.as_deref()).await?;
    let api = ApiContext::new(registry, store);
    seed_from_config(&api, &settings.entities).await?;

    let addr: SocketAddr = settings
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.bind_addr))?;
    log_endpoints(&api.registry, addr);

    let app = build_router(Arc::new(AppState { api }));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
