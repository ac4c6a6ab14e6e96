//! Data access layer (Repository pattern)

pub mod lead;
pub mod rbac;
pub mod search;
pub mod stats;
pub mod user;

pub use lead::LeadRepository;
pub use rbac::RbacRepository;
pub use search::SearchQueryRepository;
pub use stats::StatsRepository;
pub use user::UserRepository;
