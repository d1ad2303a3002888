use super::{Capability, CapabilityMatrix, ParseCapabilityError, Permissions};
use crate::model::Actor;

/// Capability queries over an optional actor. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionResolver;

impl PermissionResolver {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// `None` is treated as the anonymous actor.
    #[must_use]
    pub fn permissions_for(&self, actor: Option<&Actor>) -> Permissions {
        CapabilityMatrix::resolve_actor(actor)
    }

    #[must_use]
    pub fn has(&self, actor: Option<&Actor>, capability: Capability) -> bool {
        self.permissions_for(actor).get(capability)
    }

    /// True when every capability is granted. An empty list is vacuously true.
    #[must_use]
    pub fn has_all(&self, actor: Option<&Actor>, capabilities: &[Capability]) -> bool {
        let perms = self.permissions_for(actor);
        capabilities.iter().all(|cap| perms.get(*cap))
    }

    /// True when at least one capability is granted. An empty list is false.
    #[must_use]
    pub fn has_any(&self, actor: Option<&Actor>, capabilities: &[Capability]) -> bool {
        let perms = self.permissions_for(actor);
        capabilities.iter().any(|cap| perms.get(*cap))
    }
}

//
// ─── GATE ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
    All,
    Any,
}

/// What a gated piece of content requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    One(Capability),
    Many {
        capabilities: Vec<Capability>,
        mode: GateMode,
    },
}

impl Requirement {
    #[must_use]
    pub fn all(capabilities: impl IntoIterator<Item = Capability>) -> Self {
        Self::Many {
            capabilities: capabilities.into_iter().collect(),
            mode: GateMode::All,
        }
    }

    #[must_use]
    pub fn any(capabilities: impl IntoIterator<Item = Capability>) -> Self {
        Self::Many {
            capabilities: capabilities.into_iter().collect(),
            mode: GateMode::Any,
        }
    }

    /// Build a requirement from wire names such as `"canManageKids"`.
    ///
    /// A single name yields [`Requirement::One`] regardless of `mode`.
    ///
    /// # Errors
    ///
    /// Returns `ParseCapabilityError` for the first unknown name.
    pub fn from_names<S: AsRef<str>>(
        names: &[S],
        mode: GateMode,
    ) -> Result<Self, ParseCapabilityError> {
        let capabilities = names
            .iter()
            .map(|name| name.as_ref().parse::<Capability>())
            .collect::<Result<Vec<_>, _>>()?;
        if let [single] = capabilities.as_slice() {
            return Ok(Self::One(*single));
        }
        Ok(Self::Many { capabilities, mode })
    }
}

/// Boolean gate consumed by the view layer: gated content or a fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionGate {
    resolver: PermissionResolver,
}

impl PermissionGate {
    #[must_use]
    pub fn new(resolver: PermissionResolver) -> Self {
        Self { resolver }
    }

    #[must_use]
    pub fn allows(&self, actor: Option<&Actor>, requirement: &Requirement) -> bool {
        match requirement {
            Requirement::One(cap) => self.resolver.has(actor, *cap),
            Requirement::Many {
                capabilities,
                mode: GateMode::All,
            } => self.resolver.has_all(actor, capabilities),
            Requirement::Many {
                capabilities,
                mode: GateMode::Any,
            } => self.resolver.has_any(actor, capabilities),
        }
    }

    /// Returns `content` when the requirement holds, otherwise `fallback`.
    pub fn select<T>(
        &self,
        actor: Option<&Actor>,
        requirement: &Requirement,
        content: T,
        fallback: T,
    ) -> T {
        if self.allows(actor, requirement) {
            content
        } else {
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Tier;

    #[test]
    fn anonymous_can_only_browse() {
        let resolver = PermissionResolver::new();
        assert!(resolver.has(None, Capability::BrowseRoutines));
        assert!(!resolver.has(None, Capability::StartTraining));
    }

    #[test]
    fn combinators_follow_and_or_semantics() {
        let resolver = PermissionResolver::new();
        let tutor = Actor::tutor(Tier::Free);
        let wanted = [Capability::ManageKids, Capability::AccessAnalytics];

        assert!(!resolver.has_all(Some(&tutor), &wanted));
        assert!(resolver.has_any(Some(&tutor), &wanted));
        assert!(resolver.has_all(Some(&tutor), &[]));
        assert!(!resolver.has_any(Some(&tutor), &[]));
    }

    #[test]
    fn gate_selects_content_or_fallback() {
        let gate = PermissionGate::default();
        let kid = Actor::kid(Tier::Free);
        let requirement = Requirement::from_names(&["canViewAchievements"], GateMode::All).unwrap();
        assert_eq!(requirement, Requirement::One(Capability::ViewAchievements));

        assert_eq!(gate.select(Some(&kid), &requirement, "badges", "upsell"), "upsell");
        let premium = kid.with_tier(Tier::Premium);
        assert_eq!(
            gate.select(Some(&premium), &requirement, "badges", "upsell"),
            "badges"
        );
    }

    #[test]
    fn gate_any_mode_from_names() {
        let gate = PermissionGate::default();
        let requirement = Requirement::from_names(
            &["canAccessAnalytics", "canStartTraining"],
            GateMode::Any,
        )
        .unwrap();
        assert!(gate.allows(Some(&Actor::kid(Tier::Free)), &requirement));
        assert!(!gate.allows(None, &requirement));
        assert!(Requirement::from_names(&["canTeleport"], GateMode::Any).is_err());
    }

    #[test]
    fn gate_all_mode_needs_every_capability() {
        let gate = PermissionGate::new(PermissionResolver::new());
        let reports = Requirement::all([Capability::AccessAnalytics, Capability::ExportReports]);
        let free = Actor::tutor(Tier::Free);

        assert!(!gate.allows(Some(&free), &reports));
        assert!(gate.allows(Some(&free.with_tier(Tier::Premium)), &reports));
        assert!(gate.allows(None, &Requirement::all([])));
        assert!(!gate.allows(None, &Requirement::any([])));
    }
}
