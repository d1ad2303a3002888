//! Role and subscription based authorization.
//!
//! [`CapabilityMatrix`] maps an optional `(ActorKind, Tier)` pair to a fully
//! populated [`Permissions`] record. [`PermissionResolver`] and
//! [`PermissionGate`] are the query surfaces used by callers.

mod matrix;
mod resolver;

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use matrix::{ANONYMOUS, CapabilityMatrix, KID_FREE, KID_PREMIUM, TUTOR_FREE, TUTOR_PREMIUM};
pub use resolver::{GateMode, PermissionGate, PermissionResolver, Requirement};

//
// ─── CAPABILITY NAMES ──────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown capability: {0}")]
pub struct ParseCapabilityError(pub String);

/// Boolean capabilities carried by [`Permissions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    BrowseRoutines,
    StartTraining,
    TrackProgress,
    ViewAchievements,
    AccessPremiumRoutines,
    CreateRoutines,
    CustomizeRoutines,
    AssignRoutines,
    ManageKids,
    ManageMultipleKids,
    AccessAnalytics,
    ExportReports,
}

impl Capability {
    pub const ALL: [Capability; 12] = [
        Capability::BrowseRoutines,
        Capability::StartTraining,
        Capability::TrackProgress,
        Capability::ViewAchievements,
        Capability::AccessPremiumRoutines,
        Capability::CreateRoutines,
        Capability::CustomizeRoutines,
        Capability::AssignRoutines,
        Capability::ManageKids,
        Capability::ManageMultipleKids,
        Capability::AccessAnalytics,
        Capability::ExportReports,
    ];

    /// Wire name used by the view layer (`canManageKids`, ...).
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Capability::BrowseRoutines => "canBrowseRoutines",
            Capability::StartTraining => "canStartTraining",
            Capability::TrackProgress => "canTrackProgress",
            Capability::ViewAchievements => "canViewAchievements",
            Capability::AccessPremiumRoutines => "canAccessPremiumRoutines",
            Capability::CreateRoutines => "canCreateRoutines",
            Capability::CustomizeRoutines => "canCustomizeRoutines",
            Capability::AssignRoutines => "canAssignRoutines",
            Capability::ManageKids => "canManageKids",
            Capability::ManageMultipleKids => "canManageMultipleKids",
            Capability::AccessAnalytics => "canAccessAnalytics",
            Capability::ExportReports => "canExportReports",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Capability {
    type Err = ParseCapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Capability::ALL
            .into_iter()
            .find(|cap| cap.name() == trimmed)
            .ok_or_else(|| ParseCapabilityError(s.to_string()))
    }
}

//
// ─── LIMITS ────────────────────────────────────────────────────────────────────
//

/// Numeric cap attached to a permission set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Limited(u32),
    Unlimited,
}

impl Limit {
    /// Returns true if this cap is at least as generous as `other`.
    #[must_use]
    pub fn is_at_least(self, other: Limit) -> bool {
        match (self, other) {
            (Limit::Unlimited, _) => true,
            (Limit::Limited(_), Limit::Unlimited) => false,
            (Limit::Limited(a), Limit::Limited(b)) => a >= b,
        }
    }
}

impl Serialize for Limit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Limit::Limited(max) => serializer.serialize_u32(*max),
            Limit::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Limited(max) => write!(f, "{max}"),
            Limit::Unlimited => f.write_str("unlimited"),
        }
    }
}

//
// ─── PERMISSIONS ───────────────────────────────────────────────────────────────
//

/// Flat capability record derived from an actor.
///
/// Never persisted; recomputed on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct Permissions {
    pub can_browse_routines: bool,
    pub can_start_training: bool,
    pub can_track_progress: bool,
    pub can_view_achievements: bool,
    pub can_access_premium_routines: bool,
    pub can_create_routines: bool,
    pub can_customize_routines: bool,
    pub can_assign_routines: bool,
    pub can_manage_kids: bool,
    pub can_manage_multiple_kids: bool,
    pub can_access_analytics: bool,
    pub can_export_reports: bool,
    pub max_exercises_per_day: Limit,
    pub max_kids: Limit,
    pub max_custom_routines: Limit,
}

impl Permissions {
    /// Single-field projection by capability.
    #[must_use]
    pub fn get(&self, capability: Capability) -> bool {
        match capability {
            Capability::BrowseRoutines => self.can_browse_routines,
            Capability::StartTraining => self.can_start_training,
            Capability::TrackProgress => self.can_track_progress,
            Capability::ViewAchievements => self.can_view_achievements,
            Capability::AccessPremiumRoutines => self.can_access_premium_routines,
            Capability::CreateRoutines => self.can_create_routines,
            Capability::CustomizeRoutines => self.can_customize_routines,
            Capability::AssignRoutines => self.can_assign_routines,
            Capability::ManageKids => self.can_manage_kids,
            Capability::ManageMultipleKids => self.can_manage_multiple_kids,
            Capability::AccessAnalytics => self.can_access_analytics,
            Capability::ExportReports => self.can_export_reports,
        }
    }

    /// All numeric caps, in declaration order.
    #[must_use]
    pub fn limits(&self) -> [(&'static str, Limit); 3] {
        [
            ("maxExercisesPerDay", self.max_exercises_per_day),
            ("maxKids", self.max_kids),
            ("maxCustomRoutines", self.max_custom_routines),
        ]
    }

    /// Returns true if every capability granted by `other` is also granted here
    /// and no cap is tighter.
    #[must_use]
    pub fn dominates(&self, other: &Permissions) -> bool {
        let flags = Capability::ALL
            .into_iter()
            .all(|cap| !other.get(cap) || self.get(cap));
        let caps = self
            .limits()
            .into_iter()
            .zip(other.limits())
            .all(|((_, mine), (_, theirs))| mine.is_at_least(theirs));
        flags && caps
    }

    /// Like [`Permissions::dominates`] but additionally requires a difference.
    #[must_use]
    pub fn strictly_dominates(&self, other: &Permissions) -> bool {
        self != other && self.dominates(other)
    }
}
