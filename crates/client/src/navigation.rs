//! Permission-gated navigation tree.
//!
//! The tree is static (defined here, not delivered by the server). Each
//! entry lists the permission codes that unlock it; holding any one of them
//! is enough, and an empty list makes the entry public.

use serde::{Deserialize, Serialize};

use erpdash_auth::{authorize, catalog, requirement_met, PermissionCheck, PermissionCode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub permissions: Vec<PermissionCode>,
    /// `None` for a leaf. `Some(vec![])` is a group with nothing in it and is
    /// never shown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NavItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
}

impl NavItem {
    pub fn link(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: Some(href.into()),
            icon: None,
            permissions: Vec::new(),
            children: None,
            badge: None,
        }
    }

    pub fn group(title: impl Into<String>, children: Vec<NavItem>) -> Self {
        Self {
            title: title.into(),
            href: None,
            icon: None,
            permissions: Vec::new(),
            children: Some(children),
            badge: None,
        }
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn badge(mut self, badge: impl Into<String>) -> Self {
        self.badge = Some(badge.into());
        self
    }

    pub fn requires(mut self, codes: impl IntoIterator<Item = PermissionCode>) -> Self {
        self.permissions.extend(codes);
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// Keep only the entries `check` unlocks.
///
/// A group survives iff at least one child survives (its own `permissions`
/// are not consulted); a leaf survives iff its requirement is met. Order is
/// preserved and the input is left untouched.
pub fn filter_tree<C: PermissionCheck + ?Sized>(tree: &[NavItem], check: &C) -> Vec<NavItem> {
    tree.iter().filter_map(|item| filter_item(item, check)).collect()
}

fn filter_item<C: PermissionCheck + ?Sized>(item: &NavItem, check: &C) -> Option<NavItem> {
    match &item.children {
        Some(children) => {
            let kept = filter_tree(children, check);
            if kept.is_empty() {
                return None;
            }
            Some(NavItem {
                title: item.title.clone(),
                href: item.href.clone(),
                icon: item.icon.clone(),
                permissions: item.permissions.clone(),
                children: Some(kept),
                badge: item.badge.clone(),
            })
        }
        None => requirement_met(check, &item.permissions).then(|| item.clone()),
    }
}

/// The entry whose `href` is the longest segment-wise prefix of `path`.
pub fn find_route<'a>(tree: &'a [NavItem], path: &str) -> Option<&'a NavItem> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let mut best: Option<&'a NavItem> = None;
    visit(tree, &mut |item| {
        let Some(href) = item.href.as_deref() else {
            return;
        };
        if !route_matches(href, path) {
            return;
        }
        let longer = best
            .and_then(|b| b.href.as_deref())
            .is_none_or(|current| href.len() > current.len());
        if longer {
            best = Some(item);
        }
    });
    best
}

fn route_matches(href: &str, path: &str) -> bool {
    if href == path {
        return true;
    }
    let href = href.trim_end_matches('/');
    match path.strip_prefix(href) {
        Some(rest) => rest.starts_with('/'),
        None => false,
    }
}

fn visit<'a>(tree: &'a [NavItem], f: &mut impl FnMut(&'a NavItem)) {
    for item in tree {
        f(item);
        if let Some(children) = &item.children {
            visit(children, f);
        }
    }
}

/// Permission codes guarding `path`; empty when the path is public or unknown.
pub fn required_permissions<'a>(tree: &'a [NavItem], path: &str) -> &'a [PermissionCode] {
    find_route(tree, path)
        .map(|item| item.permissions.as_slice())
        .unwrap_or(&[])
}

/// Page-access gate for `path`.
///
/// Paths the tree does not know are permitted: the gate is advisory and the
/// server still authorizes every request behind the page.
pub fn is_route_permitted<C: PermissionCheck + ?Sized>(tree: &[NavItem], path: &str, check: &C) -> bool {
    authorize(check, required_permissions(tree, path)).is_ok()
}

/// Every `href` in the tree, depth-first.
pub fn hrefs(tree: &[NavItem]) -> Vec<&str> {
    let mut out = Vec::new();
    visit(tree, &mut |item| {
        if let Some(href) = item.href.as_deref() {
            out.push(href);
        }
    });
    out
}

/// The dashboard's sidebar.
pub fn dashboard_navigation() -> Vec<NavItem> {
    use catalog::*;

    vec![
        NavItem::link("Dashboard", "/").icon("layout-dashboard"),
        NavItem::group(
            "Orders",
            vec![
                NavItem::link("All Orders", "/orders").requires([ORDERS_VIEW]),
                NavItem::link("New Order", "/orders/new").requires([ORDERS_CREATE]),
                NavItem::link("Approvals", "/orders/approvals").requires([ORDERS_APPROVE]),
            ],
        )
        .icon("shopping-cart"),
        NavItem::group(
            "Inventory",
            vec![
                NavItem::link("Products", "/inventory/products").requires([PRODUCTS_VIEW]),
                NavItem::link("Stock", "/inventory/stock").requires([INVENTORY_VIEW]),
                NavItem::link("Adjustments", "/inventory/adjustments").requires([INVENTORY_ADJUST]),
                NavItem::link("Transfers", "/inventory/transfers").requires([INVENTORY_TRANSFER]),
                NavItem::link("Vendors", "/inventory/vendors").requires([VENDORS_VIEW]),
            ],
        )
        .icon("boxes"),
        NavItem::group(
            "Finance",
            vec![
                NavItem::link("Overview", "/finance").requires([FINANCE_VIEW]),
                NavItem::link("Invoices", "/finance/invoices").requires([INVOICES_VIEW]),
                NavItem::link("Payments", "/finance/payments").requires([PAYMENTS_VIEW]),
                NavItem::link("Expenses", "/finance/expenses").requires([EXPENSES_VIEW]),
            ],
        )
        .icon("wallet"),
        NavItem::group(
            "Service",
            vec![
                NavItem::link("Tickets", "/service/tickets").requires([SERVICE_TICKETS_VIEW]),
                NavItem::link("Warranty", "/service/warranty").requires([WARRANTY_VIEW]),
            ],
        )
        .icon("wrench"),
        NavItem::group(
            "Distribution",
            vec![
                NavItem::link("Shipments", "/distribution/shipments")
                    .requires([DISTRIBUTION_VIEW, SHIPMENTS_MANAGE]),
                NavItem::link("Delivery Routes", "/distribution/routes").requires([DELIVERY_ROUTES_VIEW]),
            ],
        )
        .icon("truck"),
        NavItem::group(
            "CRM",
            vec![
                NavItem::link("Customers", "/crm/customers").requires([CUSTOMERS_VIEW]),
                NavItem::link("Leads", "/crm/leads").requires([LEADS_VIEW]).badge("new"),
            ],
        )
        .icon("contact"),
        NavItem::group(
            "Storefront",
            vec![
                NavItem::link("Catalog", "/store").requires([STORE_VIEW]),
                NavItem::link("Store Settings", "/store/settings").requires([STORE_MANAGE]),
            ],
        )
        .icon("store"),
        NavItem::link("Reports", "/reports").icon("chart-bar").requires([REPORTS_VIEW]),
        NavItem::group(
            "Administration",
            vec![
                NavItem::link("Users", "/admin/users").requires([USERS_VIEW]),
                NavItem::link("Roles", "/admin/roles").requires([ROLES_VIEW]),
            ],
        )
        .icon("shield"),
        NavItem::link("Settings", "/settings").icon("settings"),
    ]
}
