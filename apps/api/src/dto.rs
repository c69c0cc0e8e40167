use chrono::{DateTime, Utc};
use redressa_domain::{Grievance, GrievanceBoard, UserProfile};
use serde::{Deserialize, Serialize};

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Generic message payload.
#[derive(Debug, Serialize)]
pub struct GenericMessageResponse {
    pub message: String,
}

/// Incoming payload for registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    /// Role chosen at signup; defaults to "user" when omitted.
    pub role: Option<String>,
}

/// Incoming payload for password login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// API representation of an authenticated principal's profile.
#[derive(Debug, Serialize)]
pub struct UserProfileResponse {
    pub subject: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl From<UserProfile> for UserProfileResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            subject: profile.subject().to_owned(),
            name: profile.name().as_str().to_owned(),
            email: profile.email().as_str().to_owned(),
            role: profile.role().as_str().to_owned(),
        }
    }
}

/// Incoming payload for a formatting proposal.
#[derive(Debug, Deserialize)]
pub struct FormatRequest {
    #[serde(default)]
    pub title: String,
    pub description: String,
}

/// Formatting proposal payload.
#[derive(Debug, Serialize)]
pub struct FormatResponse {
    pub formatted: String,
}

/// Incoming payload for a status transition.
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: String,
    pub expected_version: i64,
}

/// API representation of a grievance.
#[derive(Debug, Serialize)]
pub struct GrievanceResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub status_label: String,
    pub status_tone: String,
    pub file_urls: Vec<String>,
    pub submitted_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub version: i64,
}

impl From<Grievance> for GrievanceResponse {
    fn from(grievance: Grievance) -> Self {
        let presentation = grievance.status().presentation();

        Self {
            id: grievance.id().to_string(),
            user_id: grievance.user_id().to_owned(),
            title: grievance.title().as_str().to_owned(),
            description: grievance.description().as_str().to_owned(),
            status: grievance.status().as_str().to_owned(),
            status_label: presentation.label.to_owned(),
            status_tone: presentation.tone.to_owned(),
            file_urls: grievance.file_urls().to_vec(),
            submitted_at: grievance.submitted_at(),
            last_updated: grievance.last_updated(),
            version: grievance.version(),
        }
    }
}

/// Dashboard payload: the caller-visible set split into active and past.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub active: Vec<GrievanceResponse>,
    pub past: Vec<GrievanceResponse>,
}

impl From<GrievanceBoard> for DashboardResponse {
    fn from(board: GrievanceBoard) -> Self {
        let (active, past) = board.into_parts();
        Self {
            active: active.into_iter().map(GrievanceResponse::from).collect(),
            past: past.into_iter().map(GrievanceResponse::from).collect(),
        }
    }
}
