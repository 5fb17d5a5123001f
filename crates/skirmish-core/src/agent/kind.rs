//! Combat roles and per-kind tables.
//!
//! The set of kinds is closed. Anything that varies by kind (movement and
//! kill ranges, census counts) lives in a [`KindTable`] so that adding a
//! kind is a compile error everywhere a value for it is missing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Combat role of an agent.
///
/// The food chain is `Predator > Brawler > Prey` with no other edges; see
/// [`CombatRules`](crate::rules::CombatRules).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// Fast hunter. Can kill brawlers and cannot be killed.
    Predator,
    /// Medium-speed fighter. Kills prey, falls to predators.
    Brawler,
    /// Nearly stationary. Kills nothing.
    Prey,
}

impl Kind {
    /// Every kind, in tag order.
    pub const ALL: [Self; 3] = [Self::Predator, Self::Brawler, Self::Prey];

    /// Dense index used by lookup tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Predator => 0,
            Self::Brawler => 1,
            Self::Prey => 2,
        }
    }

    /// Map symbol for the display collaborator.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Predator => 'D',
            Self::Brawler => 'B',
            Self::Prey => 'F',
        }
    }

    /// Numeric tag used by the record format.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Predator => 1,
            Self::Brawler => 2,
            Self::Prey => 3,
        }
    }

    /// Inverse of [`Kind::tag`].
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Predator),
            2 => Some(Self::Brawler),
            3 => Some(Self::Prey),
            _ => None,
        }
    }

    /// Lower-case label for logs and error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Predator => "predator",
            Self::Brawler => "brawler",
            Self::Prey => "prey",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One value per [`Kind`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindTable<T> {
    /// Value for [`Kind::Predator`].
    pub predator: T,
    /// Value for [`Kind::Brawler`].
    pub brawler: T,
    /// Value for [`Kind::Prey`].
    pub prey: T,
}

impl<T> KindTable<T> {
    /// Builds a table by evaluating `f` for every kind.
    pub fn from_fn(mut f: impl FnMut(Kind) -> T) -> Self {
        Self {
            predator: f(Kind::Predator),
            brawler: f(Kind::Brawler),
            prey: f(Kind::Prey),
        }
    }

    /// Returns the entry for `kind`.
    #[must_use]
    pub const fn get(&self, kind: Kind) -> &T {
        match kind {
            Kind::Predator => &self.predator,
            Kind::Brawler => &self.brawler,
            Kind::Prey => &self.prey,
        }
    }

    /// Returns the mutable entry for `kind`.
    pub fn get_mut(&mut self, kind: Kind) -> &mut T {
        match kind {
            Kind::Predator => &mut self.predator,
            Kind::Brawler => &mut self.brawler,
            Kind::Prey => &mut self.prey,
        }
    }

    /// Iterates `(kind, value)` pairs in tag order.
    pub fn iter(&self) -> impl Iterator<Item = (Kind, &T)> + '_ {
        Kind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }
}

/// Fixed movement and engagement ranges of a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindStats {
    /// Each tick, both axes move by a uniform draw from `[-move_range, move_range]`.
    pub move_range: i32,
    /// Other agents within this Euclidean distance are engagement candidates.
    pub kill_range: u32,
}

impl KindStats {
    /// Creates a stats entry.
    #[must_use]
    pub const fn new(move_range: i32, kill_range: u32) -> Self {
        Self {
            move_range,
            kill_range,
        }
    }
}

impl Default for KindTable<KindStats> {
    fn default() -> Self {
        Self {
            predator: KindStats::new(50, 30),
            brawler: KindStats::new(30, 10),
            prey: KindStats::new(1, 10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for kind in Kind::ALL {
            assert_eq!(Kind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(Kind::from_tag(0), None);
        assert_eq!(Kind::from_tag(4), None);
    }

    #[test]
    fn indices_are_dense() {
        let indices: Vec<_> = Kind::ALL.iter().map(|k| k.index()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn symbols_are_distinct() {
        assert_eq!(Kind::Predator.symbol(), 'D');
        assert_eq!(Kind::Brawler.symbol(), 'B');
        assert_eq!(Kind::Prey.symbol(), 'F');
    }

    #[test]
    fn symbols_differ_beyond_case() {
        let mut folded: Vec<_> = Kind::ALL
            .iter()
            .map(|kind| kind.symbol().to_ascii_uppercase())
            .collect();
        folded.sort_unstable();
        folded.dedup();
        assert_eq!(folded.len(), Kind::ALL.len());
    }

    #[test]
    fn display_uses_label() {
        assert_eq!(Kind::Brawler.to_string(), "brawler");
    }

    #[test]
    fn default_stats_order_speed() {
        let stats = KindTable::<KindStats>::default();
        assert!(stats.predator.move_range > stats.brawler.move_range);
        assert!(stats.brawler.move_range > stats.prey.move_range);
        assert_eq!(stats.get(Kind::Predator).kill_range, 30);
    }

    #[test]
    fn table_get_mut_and_iter() {
        let mut counts = KindTable::<usize>::default();
        *counts.get_mut(Kind::Prey) += 3;
        let collected: Vec<_> = counts.iter().map(|(k, v)| (k, *v)).collect();
        assert_eq!(
            collected,
            vec![(Kind::Predator, 0), (Kind::Brawler, 0), (Kind::Prey, 3)]
        );
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&Kind::Predator).unwrap();
        assert_eq!(json, "\"predator\"");
    }
}
