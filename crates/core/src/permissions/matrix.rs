use super::{Limit, Permissions};
use crate::model::{Actor, ActorKind, Tier};

/// Browse-only set for unauthenticated use.
pub const ANONYMOUS: Permissions = Permissions {
    can_browse_routines: true,
    can_start_training: false,
    can_track_progress: false,
    can_view_achievements: false,
    can_access_premium_routines: false,
    can_create_routines: false,
    can_customize_routines: false,
    can_assign_routines: false,
    can_manage_kids: false,
    can_manage_multiple_kids: false,
    can_access_analytics: false,
    can_export_reports: false,
    max_exercises_per_day: Limit::Limited(0),
    max_kids: Limit::Limited(0),
    max_custom_routines: Limit::Limited(0),
};

pub const KID_FREE: Permissions = Permissions {
    can_start_training: true,
    can_track_progress: true,
    max_exercises_per_day: Limit::Limited(10),
    ..ANONYMOUS
};

pub const KID_PREMIUM: Permissions = Permissions {
    can_view_achievements: true,
    can_access_premium_routines: true,
    max_exercises_per_day: Limit::Unlimited,
    ..KID_FREE
};

pub const TUTOR_FREE: Permissions = Permissions {
    can_track_progress: true,
    can_create_routines: true,
    can_assign_routines: true,
    can_manage_kids: true,
    max_kids: Limit::Limited(1),
    max_custom_routines: Limit::Limited(3),
    ..ANONYMOUS
};

pub const TUTOR_PREMIUM: Permissions = Permissions {
    can_access_premium_routines: true,
    can_customize_routines: true,
    can_manage_multiple_kids: true,
    can_access_analytics: true,
    can_export_reports: true,
    max_kids: Limit::Unlimited,
    max_custom_routines: Limit::Unlimited,
    ..TUTOR_FREE
};

/// Total function from `(kind, tier)` to a permission set.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityMatrix;

impl CapabilityMatrix {
    /// Resolve the permission set for an optional kind and tier.
    ///
    /// A missing kind is anonymous. A known kind without a tier resolves as `Free`.
    #[must_use]
    pub fn resolve(kind: Option<ActorKind>, tier: Option<Tier>) -> Permissions {
        let Some(kind) = kind else {
            return ANONYMOUS;
        };
        match (kind, tier.unwrap_or(Tier::Free)) {
            (ActorKind::Kid, Tier::Free) => KID_FREE,
            (ActorKind::Kid, Tier::Premium) => KID_PREMIUM,
            (ActorKind::Tutor, Tier::Free) => TUTOR_FREE,
            (ActorKind::Tutor, Tier::Premium) => TUTOR_PREMIUM,
        }
    }

    #[must_use]
    pub fn resolve_actor(actor: Option<&Actor>) -> Permissions {
        match actor {
            Some(actor) => Self::resolve(Some(actor.kind()), Some(actor.tier())),
            None => ANONYMOUS,
        }
    }
}
