//! Catalog entities, invariants, and pure reconciliation logic.

#![forbid(unsafe_code)]

mod access_point;
mod assignment;
mod audit;
mod ids;
mod permission;
mod permission_group;
mod query;
mod role;
mod validation;

pub use access_point::{AccessPoint, HttpMethod};
pub use assignment::{
    AssignmentDiff, AssignmentPhase, AssignmentSession, Cardinality, CommitKind, reconcile,
};
pub use audit::AuditAction;
pub use ids::{AccessPointId, PermissionGroupId, PermissionId, RoleId};
pub use permission::{PERMISSION_CODE_MAX_LENGTH, Permission};
pub use permission_group::{GroupName, PermissionGroup};
pub use query::{
    CatalogQuery, DEFAULT_PAGE_SIZE, DEFAULT_SEARCH_QUIESCENCE, FieldAccessor, MAX_PAGE_SIZE,
    Page, QuiescenceGate, SearchSession, paginate, search_items,
};
pub use role::{Role, RoleGrant, RoleWorkingSet};
pub use validation::{EntityKind, NAME_MAX_LENGTH, validate_group_name, validate_required_fields};
