//! Reactive bridge between the [`AuthController`] and Leptos components.

use leptos::*;

use erpdash_auth::{PermissionCheck, PermissionCode, User};

use crate::api::Credentials;
use crate::controller::{AuthController, AuthStatus, FetchOutcome, LoginError};

/// Shared through Leptos context. Reads through it are reactive: every
/// controller transition bumps `revision`, re-running dependent views.
#[derive(Clone)]
pub struct AuthContext {
    controller: AuthController,
    status: RwSignal<AuthStatus>,
    revision: RwSignal<u64>,
}

/// Install the controller in context and start the initial load.
pub fn provide_auth(controller: AuthController) -> AuthContext {
    let status = create_rw_signal(controller.status());
    let revision = create_rw_signal(0u64);

    controller.subscribe(move |next| {
        status.set(next);
        revision.update(|r| *r += 1);
    });

    let ctx = AuthContext {
        controller: controller.clone(),
        status,
        revision,
    };
    provide_context(ctx.clone());

    if let Some(pending) = controller.mount() {
        wasm_bindgen_futures::spawn_local(async move {
            let outcome = pending.run().await;
            ::tracing::debug!(?outcome, "initial session fetch settled");
        });
    }
    ctx
}

/// The context installed by [`provide_auth`].
///
/// Panics when called outside the application root.
pub fn use_auth() -> AuthContext {
    use_context::<AuthContext>().expect("provide_auth must run at the application root")
}

impl AuthContext {
    fn track(&self) {
        self.revision.with(|_| ());
    }

    pub fn status(&self) -> AuthStatus {
        self.status.get()
    }

    pub fn is_loading(&self) -> bool {
        self.status() == AuthStatus::Loading
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(
            self.status(),
            AuthStatus::Authenticated | AuthStatus::Revalidating
        )
    }

    pub fn user(&self) -> Option<User> {
        self.track();
        self.controller.user()
    }

    pub async fn login(&self, credentials: Credentials) -> Result<(), LoginError> {
        self.controller.login(&credentials).await
    }

    pub async fn logout(&self) {
        self.controller.logout().await;
    }

    pub async fn refresh_user(&self) -> FetchOutcome {
        self.controller.refresh_user().await
    }
}

impl PermissionCheck for AuthContext {
    fn has_permission(&self, code: &PermissionCode) -> bool {
        self.track();
        self.controller.has_permission(code)
    }

    fn is_loaded(&self) -> bool {
        self.track();
        self.controller.is_loaded()
    }
}
