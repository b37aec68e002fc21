//! Leptos application with routing.

use std::sync::Arc;

use leptos::*;
use leptos_router::*;

use erpdash_core::SystemClock;

use crate::api::Credentials;
use crate::config::ClientConfig;
use crate::controller::{AuthController, AuthStatus, Collaborators};
use crate::frontend::context::{provide_auth, use_auth};
use crate::frontend::sidebar::{PageGate, Sidebar};
use crate::http::HttpAuthApi;
use crate::navigation::dashboard_navigation;
use crate::routes::BrowserNavigator;
use crate::storage::BrowserSessionStorage;
use crate::token::TokenStore;

/// Main application component.
#[component]
pub fn App() -> impl IntoView {
    let config = ClientConfig::from_env();
    let storage = Arc::new(BrowserSessionStorage);
    let tokens = Arc::new(TokenStore::backed_by(storage.clone()));

    let controller = AuthController::new(
        Collaborators {
            api: Arc::new(HttpAuthApi::new(config.api_url.clone(), tokens.clone())),
            tokens,
            storage,
            navigator: Arc::new(BrowserNavigator),
            clock: Arc::new(SystemClock),
        },
        config.routes.clone(),
    );
    provide_auth(controller);

    let login_path = config.routes.login;

    view! {
        <Router>
            <Routes>
                <Route path=login_path.clone() view=LoginPage/>
                <Route path="/*any" view=move || view! { <Shell login_path=login_path.clone()/> }/>
            </Routes>
        </Router>
    }
}

/// Everything behind sign-in: waits for the session, then the dashboard layout.
#[component]
fn Shell(login_path: String) -> impl IntoView {
    let auth = use_auth();

    move || match auth.status() {
        AuthStatus::Loading => view! { <div class="loading">"Loading..."</div> }.into_view(),
        AuthStatus::Unauthenticated => view! { <Redirect path=login_path.clone()/> }.into_view(),
        AuthStatus::Authenticated | AuthStatus::Revalidating => view! { <Layout/> }.into_view(),
    }
}

#[component]
fn Layout() -> impl IntoView {
    let auth = use_auth();
    let name = {
        let auth = auth.clone();
        move || auth.user().map(|user| user.full_name()).unwrap_or_default()
    };
    let revalidating = {
        let auth = auth.clone();
        move || auth.status() == AuthStatus::Revalidating
    };
    let sign_out = move |_| {
        let auth = auth.clone();
        spawn_local(async move { auth.logout().await });
    };

    view! {
        <div class="app">
            <aside>
                <h1>"ERP Dashboard"</h1>
                <Sidebar items=dashboard_navigation()/>
            </aside>
            <div class="main">
                <header>
                    <span class="user">{name}</span>
                    <Show when=revalidating fallback=|| ()>
                        <span class="status syncing">"Refreshing..."</span>
                    </Show>
                    <button on:click=sign_out>"Sign out"</button>
                </header>
                <main>
                    <PageGate tree=dashboard_navigation()/>
                </main>
            </div>
        </div>
    }
}

/// Login page component.
#[component]
fn LoginPage() -> impl IntoView {
    let auth = use_auth();
    let email = create_rw_signal(String::new());
    let password = create_rw_signal(String::new());
    let error = create_rw_signal(None::<String>);
    let is_submitting = create_rw_signal(false);

    let submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        if is_submitting.get_untracked() {
            return;
        }

        is_submitting.set(true);
        error.set(None);
        let auth = auth.clone();
        let credentials = Credentials::new(email.get_untracked(), password.get_untracked());

        spawn_local(async move {
            if let Err(e) = auth.login(credentials).await {
                error.set(Some(e.to_string()));
            }
            is_submitting.set(false);
        });
    };

    view! {
        <div class="login">
            <h1>"Sign in"</h1>
            <form on:submit=submit>
                <div class="form-group">
                    <label for="email">"Email"</label>
                    <input
                        type="email"
                        id="email"
                        prop:value=move || email.get()
                        on:input=move |ev| email.set(event_target_value(&ev))
                    />
                </div>
                <div class="form-group">
                    <label for="password">"Password"</label>
                    <input
                        type="password"
                        id="password"
                        prop:value=move || password.get()
                        on:input=move |ev| password.set(event_target_value(&ev))
                    />
                </div>
                <button type="submit" disabled=move || is_submitting.get()>
                    {move || if is_submitting.get() { "Signing in..." } else { "Sign in" }}
                </button>
            </form>
            {move || error.get().map(|message| view! { <p class="error">{message}</p> })}
        </div>
    }
}
