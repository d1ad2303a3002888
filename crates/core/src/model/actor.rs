use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ActorParseError {
    #[error("unknown actor kind: {0}")]
    UnknownKind(String),

    #[error("unknown subscription tier: {0}")]
    UnknownTier(String),
}

/// Who is using the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    Kid,
    Tutor,
}

/// Subscription tier of the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Premium,
}

/// An authenticated user as seen by the authorization engine.
///
/// Actors are immutable. A subscription change re-issues the record through
/// [`Actor::with_tier`] instead of mutating it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    kind: ActorKind,
    tier: Tier,
}

impl Actor {
    #[must_use]
    pub fn new(kind: ActorKind, tier: Tier) -> Self {
        Self { kind, tier }
    }

    #[must_use]
    pub fn kid(tier: Tier) -> Self {
        Self::new(ActorKind::Kid, tier)
    }

    #[must_use]
    pub fn tutor(tier: Tier) -> Self {
        Self::new(ActorKind::Tutor, tier)
    }

    #[must_use]
    pub fn kind(&self) -> ActorKind {
        self.kind
    }

    #[must_use]
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Returns a new actor record with the given tier.
    #[must_use]
    pub fn with_tier(self, tier: Tier) -> Self {
        Self { kind: self.kind, tier }
    }
}

impl fmt::Display for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorKind::Kid => f.write_str("kid"),
            ActorKind::Tutor => f.write_str("tutor"),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Free => f.write_str("free"),
            Tier::Premium => f.write_str("premium"),
        }
    }
}

impl FromStr for ActorKind {
    type Err = ActorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kid" => Ok(Self::Kid),
            "tutor" => Ok(Self::Tutor),
            _ => Err(ActorParseError::UnknownKind(s.to_string())),
        }
    }
}

impl FromStr for Tier {
    type Err = ActorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "premium" => Ok(Self::Premium),
            _ => Err(ActorParseError::UnknownTier(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_tier_reissues_the_record() {
        let free = Actor::tutor(Tier::Free);
        let premium = free.with_tier(Tier::Premium);

        assert_eq!(free.tier(), Tier::Free);
        assert_eq!(premium.tier(), Tier::Premium);
        assert_eq!(premium.kind(), ActorKind::Tutor);
    }

    #[test]
    fn kind_and_tier_parse_case_insensitively() {
        assert_eq!("Kid".parse::<ActorKind>().unwrap(), ActorKind::Kid);
        assert_eq!(" PREMIUM ".parse::<Tier>().unwrap(), Tier::Premium);
        assert!(matches!(
            "parent".parse::<ActorKind>(),
            Err(ActorParseError::UnknownKind(_))
        ));
    }
}
