//! Application services and ports.

#![forbid(unsafe_code)]

mod account_service;
mod formatting_service;
mod grievance_ports;
mod grievance_service;
mod oauth_state_service;
mod rate_limit_service;

pub use account_service::{
    AccountService, AuthOutcome, CredentialRecord, PasswordHasher, RegisterParams, UserRepository,
};
pub use formatting_service::FormattingService;
pub use grievance_ports::{
    BlobStore, GrievanceRepository, RoleDirectory, StatusUpdate, SubmitGrievanceInput,
    TextFormatter,
};
pub use grievance_service::GrievanceService;
pub use oauth_state_service::OAuthStateService;
pub use rate_limit_service::{AttemptInfo, RateLimitRepository, RateLimitRule, RateLimitService};
