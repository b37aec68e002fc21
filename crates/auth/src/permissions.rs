use std::borrow::{Borrow, Cow};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize};

use erpdash_core::{DomainError, DomainResult};

/// Permission code, e.g. `"USERS_VIEW"`.
///
/// Codes are opaque to the client: they are compared, never interpreted.
/// [`parse`](Self::parse) only accepts the catalog's shape (non-empty,
/// starting with an ASCII uppercase letter, then `A-Z`, `0-9` and `_`).
/// Codes coming off the wire are taken verbatim, whatever the server's
/// naming scheme. Application code should use the constants in [`catalog`]
/// rather than spelling codes out.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PermissionCode(Cow<'static, str>);

impl PermissionCode {
    /// Build a code from a literal without validation.
    ///
    /// Only used by the catalog, whose codes are checked by a unit test.
    pub const fn from_static(code: &'static str) -> Self {
        Self(Cow::Borrowed(code))
    }

    pub fn parse(code: impl Into<Cow<'static, str>>) -> DomainResult<Self> {
        let code = code.into();
        validate(&code)?;
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The module this code is catalogued under, if it is a known code.
    pub fn module(&self) -> Option<PermissionModule> {
        catalog::ALL
            .iter()
            .find(|(_, code)| code == self)
            .map(|(module, _)| *module)
    }
}

fn validate(code: &str) -> DomainResult<()> {
    let mut chars = code.chars();
    match chars.next() {
        None => return Err(DomainError::validation("permission code is empty")),
        Some(first) if !first.is_ascii_uppercase() => {
            return Err(DomainError::validation(format!(
                "permission code '{code}' must start with an uppercase letter"
            )));
        }
        Some(_) => {}
    }
    if let Some(bad) = chars.find(|c| !(c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '_')) {
        return Err(DomainError::validation(format!(
            "permission code '{code}' contains invalid character '{bad}'"
        )));
    }
    Ok(())
}

impl Borrow<str> for PermissionCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PermissionCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::str::FromStr for PermissionCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.to_owned())
    }
}

impl<'de> Deserialize<'de> for PermissionCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(|raw| Self(Cow::Owned(raw)))
    }
}

/// ERP module a permission belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionModule {
    Users,
    Roles,
    Orders,
    Products,
    Inventory,
    Vendors,
    Finance,
    Service,
    Distribution,
    Crm,
    Storefront,
    Reports,
}

impl PermissionModule {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionModule::Users => "users",
            PermissionModule::Roles => "roles",
            PermissionModule::Orders => "orders",
            PermissionModule::Products => "products",
            PermissionModule::Inventory => "inventory",
            PermissionModule::Vendors => "vendors",
            PermissionModule::Finance => "finance",
            PermissionModule::Service => "service",
            PermissionModule::Distribution => "distribution",
            PermissionModule::Crm => "crm",
            PermissionModule::Storefront => "storefront",
            PermissionModule::Reports => "reports",
        }
    }

    /// Catalogued codes of this module, in declaration order.
    pub fn codes(self) -> impl Iterator<Item = &'static PermissionCode> {
        catalog::ALL
            .iter()
            .filter(move |(module, _)| *module == self)
            .map(|(_, code)| code)
    }
}

/// A grantable capability as described by the server.
///
/// Only `code` carries identity; the rest is display metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub code: PermissionCode,
    pub module: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PartialEq for Permission {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for Permission {}

impl Hash for Permission {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

macro_rules! permission_catalog {
    ($($module:ident => [$($code:ident),+ $(,)?]),+ $(,)?) => {
        $($(
            pub const $code: PermissionCode = PermissionCode::from_static(stringify!($code));
        )+)+

        /// Every catalogued code with its module.
        pub const ALL: &[(PermissionModule, PermissionCode)] = &[
            $($((PermissionModule::$module, $code),)+)+
        ];
    };
}

/// Known permission codes, one constant per code.
pub mod catalog {
    use super::{PermissionCode, PermissionModule};

    permission_catalog! {
        Users => [USERS_VIEW, USERS_CREATE, USERS_UPDATE, USERS_DELETE],
        Roles => [ROLES_VIEW, ROLES_MANAGE],
        Orders => [ORDERS_VIEW, ORDERS_CREATE, ORDERS_UPDATE, ORDERS_APPROVE],
        Products => [PRODUCTS_VIEW, PRODUCTS_MANAGE],
        Inventory => [INVENTORY_VIEW, INVENTORY_ADJUST, INVENTORY_TRANSFER],
        Vendors => [VENDORS_VIEW, VENDORS_MANAGE],
        Finance => [
            FINANCE_VIEW,
            INVOICES_VIEW,
            INVOICES_MANAGE,
            PAYMENTS_VIEW,
            PAYMENTS_MANAGE,
            EXPENSES_VIEW,
        ],
        Service => [SERVICE_TICKETS_VIEW, SERVICE_TICKETS_MANAGE, WARRANTY_VIEW],
        Distribution => [DISTRIBUTION_VIEW, SHIPMENTS_MANAGE, DELIVERY_ROUTES_VIEW],
        Crm => [CUSTOMERS_VIEW, CUSTOMERS_MANAGE, LEADS_VIEW, LEADS_MANAGE],
        Storefront => [STORE_VIEW, STORE_MANAGE],
        Reports => [REPORTS_VIEW, REPORTS_EXPORT],
    }
}
