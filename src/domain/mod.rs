//! Domain models

pub mod lead;
pub mod rbac;
pub mod search;
pub mod user;

pub use lead::{Lead, LeadFilter, LeadRecord, LeadWithOwner};
pub use rbac::{
    perms, CreateRoleInput, NewRole, Permission, Role, RoleWithPermissions, UpdateRoleFields,
    UpdateRoleInput, PERMISSION_VOCABULARY, SUPERADMIN_ROLE,
};
pub use search::{
    NewSearchQuery, SearchQuery, SearchQuerySummary, SearchSource, SearchStatus, StartSearchInput,
};
pub use user::{
    LoginInput, NewUser, RegisterInput, UpdateUserFields, UpdateUserInput, User, UserFilter,
    UserWithRoles,
};
