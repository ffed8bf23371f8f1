//! `eventided api`: the policy REST service.

use std::sync::Arc;

use auth::service::{check_max_ttl, TokenService};
use eventide_kv::KVStore;
use policy::PolicyModule;
use tracing::info;

use crate::config::Config;
use crate::{db, routes, server};

pub async fn run(config: &Config, listen: Option<&str>) -> anyhow::Result<()> {
    if config.auth.enable {
        check_max_ttl(config.auth.token_ttl)?;
    }
    let store = db::setup(&config.database)?;
    let result = serve(config, listen, store.clone()).await;
    db::teardown(&store);
    result
}

async fn serve(config: &Config, listen: Option<&str>, kv: Arc<dyn KVStore>) -> anyhow::Result<()> {
    let policy = PolicyModule::new(kv.clone());
    let tokens = if config.auth.enable {
        info!("Token authentication enabled");
        let tokens = TokenService::new(kv, config.auth.token_ttl);
        tokens.purge_expired()?;
        Some(Arc::new(tokens))
    } else {
        None
    };
    let app = routes::api_router(&[&policy], tokens);

    let addr = super::listen_addr(listen, &config.api.host, config.api.port);
    info!("(PID={}) API is serving on http://{}.", std::process::id(), addr);
    server::serve(app, &addr, None).await
}
