//! Combat eligibility.
//!
//! Eligibility is a pure function of `(attacker kind, defender kind)`. The
//! table stores, per attacker, the set of kinds it may kill:
//!
//! | attacker | may kill |
//! |----------|----------|
//! | Predator | Brawler  |
//! | Brawler  | Prey     |
//! | Prey     | nothing  |
//!
//! The chain is not transitive: a predator cannot kill prey, and no kind can
//! kill its own kind.

use bitflags::bitflags;

use crate::agent::Kind;

bitflags! {
    /// A set of [`Kind`]s.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct KindMask: u8 {
        /// [`Kind::Predator`]
        const PREDATOR = 1 << 0;
        /// [`Kind::Brawler`]
        const BRAWLER = 1 << 1;
        /// [`Kind::Prey`]
        const PREY = 1 << 2;
    }
}

impl From<Kind> for KindMask {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Predator => Self::PREDATOR,
            Kind::Brawler => Self::BRAWLER,
            Kind::Prey => Self::PREY,
        }
    }
}

/// Victims per attacker, indexed by [`Kind::index`].
const VICTIMS: [KindMask; 3] = [KindMask::BRAWLER, KindMask::PREY, KindMask::empty()];

/// The food-chain rule table. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct CombatRules;

impl CombatRules {
    /// Returns `true` if `attacker` may kill `defender`.
    ///
    /// # Example
    ///
    /// ```
    /// use skirmish_core::agent::Kind;
    /// use skirmish_core::rules::CombatRules;
    ///
    /// assert!(CombatRules::is_eligible(Kind::Predator, Kind::Brawler));
    /// assert!(!CombatRules::is_eligible(Kind::Predator, Kind::Prey));
    /// ```
    #[must_use]
    pub fn is_eligible(attacker: Kind, defender: Kind) -> bool {
        Self::victims_of(attacker).contains(defender.into())
    }

    /// Returns every kind `attacker` may kill.
    #[must_use]
    pub const fn victims_of(attacker: Kind) -> KindMask {
        VICTIMS[attacker.index()]
    }

    /// Returns `true` if `kind` can be killed by anyone.
    #[must_use]
    pub fn is_vulnerable(kind: Kind) -> bool {
        Kind::ALL
            .into_iter()
            .any(|attacker| Self::is_eligible(attacker, kind))
    }
}
