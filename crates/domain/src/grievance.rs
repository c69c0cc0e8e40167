//! Grievance entity and its status lifecycle.
//!
//! The transition table below is the single source of truth for which
//! status changes are legal; both the service layer and the presentation
//! projection derive from it.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use redressa_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::attachment::MAX_ATTACHMENTS_PER_GRIEVANCE;

/// Unique identifier for a grievance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrievanceId(Uuid);

impl GrievanceId {
    /// Creates a new random grievance identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a grievance identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for GrievanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for GrievanceId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Lifecycle status of a grievance.
///
/// Serialized variant names are the wire contract with the store; the
/// casing must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrievanceStatus {
    /// Newly submitted, awaiting administrator triage.
    Pending,
    /// Accepted by an administrator and being worked on.
    InProgress,
    /// Closed with a resolution. Terminal.
    Resolved,
    /// Closed without action. Terminal.
    Rejected,
}

impl GrievanceStatus {
    /// Returns the stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "InProgress",
            Self::Resolved => "Resolved",
            Self::Rejected => "Rejected",
        }
    }

    /// Returns the statuses this status may legally transition to.
    #[must_use]
    pub fn valid_transitions(&self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::InProgress, Self::Rejected],
            Self::InProgress => &[Self::Resolved],
            Self::Resolved | Self::Rejected => &[],
        }
    }

    /// Returns whether the requested status is a legal next state.
    #[must_use]
    pub fn can_transition_to(&self, requested: Self) -> bool {
        self.valid_transitions().contains(&requested)
    }

    /// Returns whether no further transitions are possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }

    /// Returns the dashboard stage this status belongs to.
    #[must_use]
    pub fn stage(&self) -> GrievanceStage {
        match self {
            Self::Pending | Self::InProgress => GrievanceStage::Active,
            Self::Resolved | Self::Rejected => GrievanceStage::Past,
        }
    }

    /// Returns the display projection for this status.
    ///
    /// Kept as a lookup keyed on the enum so it stays in lock-step with
    /// the transition table above.
    #[must_use]
    pub fn presentation(&self) -> StatusPresentation {
        match self {
            Self::Pending => StatusPresentation {
                label: "Pending",
                tone: "yellow",
            },
            Self::InProgress => StatusPresentation {
                label: "In Progress",
                tone: "blue",
            },
            Self::Resolved => StatusPresentation {
                label: "Resolved",
                tone: "green",
            },
            Self::Rejected => StatusPresentation {
                label: "Rejected",
                tone: "red",
            },
        }
    }
}

impl FromStr for GrievanceStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Pending" => Ok(Self::Pending),
            "InProgress" => Ok(Self::InProgress),
            "Resolved" => Ok(Self::Resolved),
            "Rejected" => Ok(Self::Rejected),
            _ => Err(AppError::Validation(format!(
                "unknown grievance status '{value}'"
            ))),
        }
    }
}

impl Display for GrievanceStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Display projection of a status: badge label and color tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPresentation {
    /// Human-friendly badge text.
    pub label: &'static str,
    /// Color tone name used by clients.
    pub tone: &'static str,
}

/// Dashboard stage derived from the status, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrievanceStage {
    /// Pending or in progress.
    Active,
    /// Resolved or rejected.
    Past,
}

/// A user-submitted complaint tracked through the status lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grievance {
    id: GrievanceId,
    user_id: String,
    title: NonEmptyString,
    description: NonEmptyString,
    status: GrievanceStatus,
    file_urls: Vec<String>,
    submitted_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
    version: i64,
}

impl Grievance {
    /// Creates a freshly submitted grievance in the `Pending` status.
    ///
    /// `file_urls` must already be durable blob-store URLs, at most
    /// [`MAX_ATTACHMENTS_PER_GRIEVANCE`] of them, in upload order.
    pub fn submit(
        user_id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        file_urls: Vec<String>,
    ) -> AppResult<Self> {
        let user_id = user_id.into();
        if user_id.trim().is_empty() {
            return Err(AppError::Validation(
                "grievance owner subject must not be empty".to_owned(),
            ));
        }

        Self::validate_file_urls(&file_urls)?;

        let now = Utc::now();
        Ok(Self {
            id: GrievanceId::new(),
            user_id,
            title: NonEmptyString::new(title)?,
            description: NonEmptyString::new(description)?,
            status: GrievanceStatus::Pending,
            file_urls,
            submitted_at: now,
            last_updated: now,
            version: 1,
        })
    }

    /// Rehydrates a grievance from stored fields.
    #[allow(clippy::too_many_arguments)]
    pub fn from_stored(
        id: GrievanceId,
        user_id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        status: GrievanceStatus,
        file_urls: Vec<String>,
        submitted_at: DateTime<Utc>,
        last_updated: DateTime<Utc>,
        version: i64,
    ) -> AppResult<Self> {
        if last_updated < submitted_at {
            return Err(AppError::Validation(
                "grievance last_updated must not precede submitted_at".to_owned(),
            ));
        }

        if version < 1 {
            return Err(AppError::Validation(
                "grievance version must be at least 1".to_owned(),
            ));
        }

        Ok(Self {
            id,
            user_id: user_id.into(),
            title: NonEmptyString::new(title)?,
            description: NonEmptyString::new(description)?,
            status,
            file_urls,
            submitted_at,
            last_updated,
            version,
        })
    }

    /// Applies a status transition after checking it against the table.
    ///
    /// On success the status is replaced, `last_updated` is refreshed and
    /// the version is bumped; on failure the record is left untouched.
    pub fn apply_transition(
        &mut self,
        requested: GrievanceStatus,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if !self.status.can_transition_to(requested) {
            return Err(AppError::InvalidTransition(format!(
                "grievance '{}' cannot move from '{}' to '{}'",
                self.id, self.status, requested
            )));
        }

        self.status = requested;
        // last_updated never precedes submitted_at.
        self.last_updated = now.max(self.submitted_at);
        self.version += 1;
        Ok(())
    }

    /// Returns the grievance identifier.
    #[must_use]
    pub fn id(&self) -> GrievanceId {
        self.id
    }

    /// Returns the owning principal's subject.
    #[must_use]
    pub fn user_id(&self) -> &str {
        self.user_id.as_str()
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &NonEmptyString {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &NonEmptyString {
        &self.description
    }

    /// Returns the current lifecycle status.
    #[must_use]
    pub fn status(&self) -> GrievanceStatus {
        self.status
    }

    /// Returns the durable attachment URLs in upload order.
    #[must_use]
    pub fn file_urls(&self) -> &[String] {
        self.file_urls.as_slice()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// Returns the timestamp of the most recent status change.
    #[must_use]
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Returns the monotonic record version.
    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    fn validate_file_urls(file_urls: &[String]) -> AppResult<()> {
        if file_urls.len() > MAX_ATTACHMENTS_PER_GRIEVANCE {
            return Err(AppError::Validation(format!(
                "a grievance may carry at most {MAX_ATTACHMENTS_PER_GRIEVANCE} attachments"
            )));
        }

        for file_url in file_urls {
            Url::parse(file_url).map_err(|error| {
                AppError::Validation(format!("invalid attachment URL '{file_url}': {error}"))
            })?;
        }

        Ok(())
    }
}

/// Caller-visible partition of a grievance set by stage.
///
/// A pure projection: recomputed on every read, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct GrievanceBoard {
    active: Vec<Grievance>,
    past: Vec<Grievance>,
}

impl GrievanceBoard {
    /// Splits the given set into active and past grievances.
    #[must_use]
    pub fn partition(grievances: Vec<Grievance>) -> Self {
        let (active, past) = grievances
            .into_iter()
            .partition(|grievance| grievance.status().stage() == GrievanceStage::Active);

        Self { active, past }
    }

    /// Returns grievances that are pending or in progress.
    #[must_use]
    pub fn active(&self) -> &[Grievance] {
        self.active.as_slice()
    }

    /// Returns grievances that are resolved or rejected.
    #[must_use]
    pub fn past(&self) -> &[Grievance] {
        self.past.as_slice()
    }

    /// Consumes the board, returning `(active, past)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Grievance>, Vec<Grievance>) {
        (self.active, self.past)
    }
}
