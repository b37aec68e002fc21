//! Sidebar and page gates over the filtered navigation tree.

use leptos::*;
use leptos_router::*;

use erpdash_auth::{requirement_met, PermissionCode};

use crate::frontend::context::use_auth;
use crate::navigation::{filter_tree, find_route, is_route_permitted, NavItem};

/// Renders the subset of `items` the current user may see.
#[component]
pub fn Sidebar(items: Vec<NavItem>) -> impl IntoView {
    let auth = use_auth();
    let visible = create_memo(move |_| filter_tree(&items, &auth));

    view! {
        <nav class="sidebar">
            {move || nav_list(visible.get())}
        </nav>
    }
}

fn nav_list(items: Vec<NavItem>) -> View {
    view! {
        <ul class="nav-list">
            {items.into_iter().map(nav_entry).collect_view()}
        </ul>
    }
    .into_view()
}

fn nav_entry(item: NavItem) -> View {
    let NavItem {
        title,
        href,
        icon,
        children,
        badge,
        ..
    } = item;
    let icon = icon.map(|name| view! { <i class=format!("icon icon-{name}")></i> });
    let badge = badge.map(|text| view! { <span class="badge">{text}</span> });

    match children {
        Some(children) => view! {
            <li class="nav-group">
                <span class="nav-group-title">{icon}{title}{badge}</span>
                {nav_list(children)}
            </li>
        }
        .into_view(),
        None => view! {
            <li class="nav-item">
                <A href=href.unwrap_or_default()>{icon}{title}{badge}</A>
            </li>
        }
        .into_view(),
    }
}

/// Renders `children` only when the user holds any of `any_of`.
#[component]
pub fn RequirePermission(any_of: Vec<PermissionCode>, children: ChildrenFn) -> impl IntoView {
    let auth = use_auth();

    view! {
        <Show when=move || requirement_met(&auth, &any_of) fallback=|| ()>
            {children()}
        </Show>
    }
}

/// Gates the current page on the navigation entry matching the location.
#[component]
pub fn PageGate(tree: Vec<NavItem>) -> impl IntoView {
    let auth = use_auth();
    let pathname = use_location().pathname;
    let tree = store_value(tree);

    let permitted = move || {
        let path = pathname.get();
        tree.with_value(|tree| is_route_permitted(tree, &path, &auth))
    };
    let title = move || {
        let path = pathname.get();
        tree.with_value(|tree| {
            find_route(tree, &path)
                .map(|item| item.title.clone())
                .unwrap_or_else(|| "Page not found".to_string())
        })
    };

    view! {
        <Show
            when=permitted
            fallback=|| view! { <p class="forbidden">"You do not have access to this page."</p> }
        >
            <section class="page">
                <h2>{title}</h2>
            </section>
        </Show>
    }
}
