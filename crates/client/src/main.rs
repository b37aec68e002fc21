//! Session probe: signs in against a live API, loads the session the way the
//! dashboard does, and prints what the signed-in user may see.

#[cfg(feature = "probe")]
use std::sync::Arc;

#[cfg(feature = "probe")]
use erpdash_client::{
    dashboard_navigation, filter_tree, navigation::hrefs, AuthController, AuthStatus,
    ClientConfig, Collaborators, Credentials, LogNavigator, MemoryStorage, TokenAccessor, TokenStore,
    http::HttpAuthApi,
};

#[cfg(feature = "probe")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    erpdash_observability::init();

    let config = ClientConfig::from_env();
    tracing::info!(api_url = %config.api_url, "starting session probe");

    let tokens = Arc::new(match std::env::var("ERPDASH_ACCESS_TOKEN") {
        Ok(token) => TokenStore::with_access_token(token),
        Err(_) => TokenStore::new(),
    });

    let controller = AuthController::new(
        Collaborators {
            api: Arc::new(HttpAuthApi::new(config.api_url.clone(), tokens.clone())),
            tokens: tokens.clone(),
            storage: Arc::new(MemoryStorage::new()),
            navigator: Arc::new(LogNavigator),
            clock: Arc::new(erpdash_core::SystemClock),
        },
        config.routes.clone(),
    );

    if tokens.access_token().is_none() {
        let email = std::env::var("ERPDASH_EMAIL")
            .map_err(|_| anyhow::anyhow!("set ERPDASH_ACCESS_TOKEN, or ERPDASH_EMAIL and ERPDASH_PASSWORD"))?;
        let password = std::env::var("ERPDASH_PASSWORD")
            .map_err(|_| anyhow::anyhow!("ERPDASH_PASSWORD is required with ERPDASH_EMAIL"))?;
        controller.login(&Credentials::new(email, password)).await?;
    } else if controller.initialize().await != AuthStatus::Authenticated {
        anyhow::bail!("the access token did not yield a session");
    }

    let snapshot = controller.snapshot();
    if let Some(user) = &snapshot.user {
        println!("{} <{}>", user.full_name(), user.email);
        if let Some(level) = user.highest_role_level() {
            println!("highest role: {level}");
        }
    }
    if let Some(permissions) = &snapshot.permissions {
        if permissions.is_super_admin {
            println!("super admin: all permissions granted");
        } else {
            let codes: Vec<_> = permissions.granted_codes().into_iter().map(|c| c.as_str()).collect();
            println!("permissions: {}", codes.join(", "));
        }
    }

    let visible = filter_tree(&dashboard_navigation(), &controller);
    println!("navigation:");
    for href in hrefs(&visible) {
        println!("  {href}");
    }
    Ok(())
}

#[cfg(not(feature = "probe"))]
fn main() {
    eprintln!("This binary requires the 'probe' feature to be enabled.");
    eprintln!("Build with: cargo build -p erpdash-client --features probe");
    std::process::exit(1);
}
