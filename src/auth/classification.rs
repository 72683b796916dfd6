//! Classification hierarchy for notice visibility
//!
//! Notices carry a classification label forming a total order of increasing
//! clearance. A caller sees every active notice at or below their own
//! clearance; anonymous callers are `Open`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Clearance levels, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
#[derive(Default)]
pub enum Classification {
    /// Publicly visible - no authentication required
    #[default]
    Open = 0,
    R1 = 1,
    R2 = 2,
    R3 = 3,
    R4 = 4,
}

impl Classification {
    /// All levels, lowest first
    pub const HIERARCHY: [Classification; 5] = [
        Classification::Open,
        Classification::R1,
        Classification::R2,
        Classification::R3,
        Classification::R4,
    ];

    /// Parse a classification label.
    ///
    /// Unrecognized labels resolve to `Open`: a caller with an unknown role
    /// is granted minimum clearance, never more and never less than an
    /// anonymous caller.
    pub fn from_label(label: &str) -> Classification {
        match label {
            "OPEN" => Classification::Open,
            "R1" => Classification::R1,
            "R2" => Classification::R2,
            "R3" => Classification::R3,
            "R4" => Classification::R4,
            _ => Classification::Open,
        }
    }

    /// Parse a classification label, rejecting unknown values.
    ///
    /// Used when the label is data to store (notice creation) rather than a
    /// caller clearance to resolve.
    pub fn parse_strict(label: &str) -> Option<Classification> {
        match label {
            "OPEN" => Some(Classification::Open),
            "R1" => Some(Classification::R1),
            "R2" => Some(Classification::R2),
            "R3" => Some(Classification::R3),
            "R4" => Some(Classification::R4),
            _ => None,
        }
    }

    /// The set of classifications visible to a caller with this clearance.
    ///
    /// `Open` is special-cased to exactly `[Open]`; every other level sees
    /// the hierarchy prefix up to and including itself.
    pub fn visible_classifications(self) -> Vec<Classification> {
        if self == Classification::Open {
            return vec![Classification::Open];
        }

        Self::HIERARCHY
            .iter()
            .copied()
            .filter(|c| *c <= self)
            .collect()
    }

    /// Whether a notice with classification `c` is visible to this caller
    pub fn can_see(self, c: Classification) -> bool {
        c <= self
    }

    /// Label stored on rows and carried in token claims
    pub fn label(self) -> &'static str {
        match self {
            Classification::Open => "OPEN",
            Classification::R1 => "R1",
            Classification::R2 => "R2",
            Classification::R3 => "R3",
            Classification::R4 => "R4",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(Classification::Open < Classification::R1);
        assert!(Classification::R1 < Classification::R2);
        assert!(Classification::R2 < Classification::R3);
        assert!(Classification::R3 < Classification::R4);
    }

    #[test]
    fn test_open_sees_only_open() {
        let visible = Classification::Open.visible_classifications();
        assert_eq!(visible, vec![Classification::Open]);
        assert!(Classification::Open.can_see(Classification::Open));
        assert!(!Classification::Open.can_see(Classification::R1));
    }

    #[test]
    fn test_visible_set_is_hierarchy_prefix() {
        assert_eq!(
            Classification::R2.visible_classifications(),
            vec![
                Classification::Open,
                Classification::R1,
                Classification::R2
            ]
        );
        assert_eq!(
            Classification::R4.visible_classifications(),
            Classification::HIERARCHY.to_vec()
        );
    }

    #[test]
    fn test_monotonicity() {
        // Each step up the hierarchy sees strictly more
        for pair in Classification::HIERARCHY.windows(2) {
            let lower = pair[0].visible_classifications();
            let higher = pair[1].visible_classifications();
            assert!(lower.len() < higher.len());
            assert!(lower.iter().all(|c| higher.contains(c)));
        }
    }

    #[test]
    fn test_unknown_role_resolves_to_open() {
        assert_eq!(Classification::from_label("SUPERUSER"), Classification::Open);
        assert_eq!(Classification::from_label(""), Classification::Open);
        assert_eq!(
            Classification::from_label("SUPERUSER").visible_classifications(),
            vec![Classification::Open]
        );
    }

    #[test]
    fn test_strict_parse_rejects_unknown() {
        assert_eq!(Classification::parse_strict("R3"), Some(Classification::R3));
        assert_eq!(Classification::parse_strict("r3"), None);
        assert_eq!(Classification::parse_strict("SUPERUSER"), None);
    }

    #[test]
    fn test_labels_round_trip() {
        for c in Classification::HIERARCHY {
            assert_eq!(Classification::parse_strict(c.label()), Some(c));
        }
    }
}
