//! `eventided auth`: the token service.

use std::sync::Arc;

use auth::backend::{AuthBackend, FlatFileBackend};
use auth::service::{check_max_ttl, AuthConfig};
use auth::{AuthMode, AuthModule};
use eventide_kv::KVStore;
use tracing::info;

use crate::config::Config;
use crate::server::{self, TlsFiles};
use crate::{db, routes};

pub async fn run(config: &Config, listen: Option<&str>) -> anyhow::Result<()> {
    // A bad mode or token_ttl aborts before the database is touched.
    let mode: AuthMode = config.auth.mode.parse()?;
    check_max_ttl(config.auth.token_ttl)?;

    let store = db::setup(&config.database)?;
    let result = serve(config, listen, mode, store.clone()).await;
    db::teardown(&store);
    result
}

async fn serve(
    config: &Config,
    listen: Option<&str>,
    mode: AuthMode,
    kv: Arc<dyn KVStore>,
) -> anyhow::Result<()> {
    let tls = tls_files(config)?;

    let backend: Option<Arc<dyn AuthBackend>> = match mode {
        AuthMode::Standalone => Some(Arc::new(FlatFileBackend::from_file(&config.auth.users_file)?)),
        AuthMode::Proxy => None,
    };
    let module = AuthModule::new(
        kv,
        AuthConfig {
            mode,
            token_ttl: config.auth.token_ttl,
        },
        backend,
    )?;
    module.service().tokens().purge_expired()?;
    let app = routes::auth_router(&module);

    let addr = super::listen_addr(listen, &config.auth.host, config.auth.port);
    info!("Auth API running in \"{}\" auth mode", mode);
    info!(
        "(PID={}) Auth API is serving on {}://{}.",
        std::process::id(),
        server::scheme(tls.is_some()),
        addr
    );
    server::serve(app, &addr, tls).await
}

fn tls_files(config: &Config) -> anyhow::Result<Option<TlsFiles>> {
    if !config.auth.use_ssl {
        return Ok(None);
    }
    Ok(Some(server::check_tls_files(&config.auth.cert, &config.auth.key)?))
}
