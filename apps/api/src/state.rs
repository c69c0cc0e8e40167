use std::sync::Arc;

use redressa_application::{
    AccountService, FormattingService, GrievanceService, OAuthStateService, RateLimitService,
    RoleDirectory,
};

/// OAuth provider endpoints and credentials.
#[derive(Clone)]
pub struct OAuthProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub authorize_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub redirect_url: String,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub grievance_service: GrievanceService,
    pub formatting_service: FormattingService,
    pub account_service: AccountService,
    pub oauth_state_service: OAuthStateService,
    pub rate_limit_service: RateLimitService,
    pub role_directory: Arc<dyn RoleDirectory>,
    pub http_client: reqwest::Client,
    pub oauth: Option<OAuthProviderConfig>,
    pub frontend_url: String,
}
