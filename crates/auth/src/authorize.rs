use thiserror::Error;

use crate::PermissionCode;

/// Permission predicates consumed by the rendering layer.
///
/// Implementors only provide [`has_permission`](Self::has_permission); the
/// any/all forms are derived from it. An implementor that has not loaded any
/// permission data yet reports `is_loaded() == false`, and every predicate,
/// including `has_all_permissions(&[])`, is then `false`.
pub trait PermissionCheck {
    fn has_permission(&self, code: &PermissionCode) -> bool;

    fn is_loaded(&self) -> bool {
        true
    }

    fn has_any_permission(&self, codes: &[PermissionCode]) -> bool {
        codes.iter().any(|code| self.has_permission(code))
    }

    fn has_all_permissions(&self, codes: &[PermissionCode]) -> bool {
        self.is_loaded() && codes.iter().all(|code| self.has_permission(code))
    }
}

impl<T: PermissionCheck + ?Sized> PermissionCheck for &T {
    fn has_permission(&self, code: &PermissionCode) -> bool {
        (**self).has_permission(code)
    }

    fn is_loaded(&self) -> bool {
        (**self).is_loaded()
    }
}

impl<T: PermissionCheck> PermissionCheck for Option<T> {
    fn has_permission(&self, code: &PermissionCode) -> bool {
        self.as_ref().is_some_and(|inner| inner.has_permission(code))
    }

    fn is_loaded(&self) -> bool {
        self.as_ref().is_some_and(|inner| inner.is_loaded())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("permissions have not been loaded")]
    NotLoaded,

    #[error("forbidden: requires one of [{0}]")]
    Forbidden(String),
}

/// Whether a UI requirement is satisfied.
///
/// An empty requirement is public and always satisfied, loaded or not.
/// Otherwise holding any one of the listed codes is enough.
pub fn requirement_met<C: PermissionCheck + ?Sized>(check: &C, required: &[PermissionCode]) -> bool {
    required.is_empty() || check.has_any_permission(required)
}

/// [`requirement_met`] as a `Result`, for callers that want a reason.
pub fn authorize<C: PermissionCheck + ?Sized>(
    check: &C,
    required: &[PermissionCode],
) -> Result<(), AuthzError> {
    if requirement_met(check, required) {
        return Ok(());
    }
    if !check.is_loaded() {
        return Err(AuthzError::NotLoaded);
    }

    let codes: Vec<&str> = required.iter().map(|c| c.as_str()).collect();
    Err(AuthzError::Forbidden(codes.join(", ")))
}
