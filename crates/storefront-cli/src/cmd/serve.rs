use super::Context;
use anyhow::Context as _;
use storefront_server::AppState;

pub fn run(ctx: &Context, port: Option<u16>, bind: Option<String>) -> anyhow::Result<()> {
    let mut config = ctx.load_config()?;
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(bind) = bind {
        config.server.bind = bind;
    }

    for w in config.validate() {
        tracing::warn!(level = ?w.level, "{}", w.message);
    }
    if config.has_errors() {
        anyhow::bail!("config validation found errors; run `storefront config validate`");
    }

    let db = ctx.open_registry(&config)?;
    tracing::info!(
        registry = %ctx.registry_path(&config).display(),
        prefix = %config.tenancy.route_prefix,
        "registry ready"
    );
    let state = AppState::persistent(db, &config.tenancy);
    let addr = config.server.addr();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move { storefront_server::serve(&addr, state).await })
        .with_context(|| format!("server on {} failed", config.server.addr()))
}
