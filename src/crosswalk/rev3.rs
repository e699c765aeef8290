//! Built-in SP 800-171 Rev 2 → Rev 3 Crosswalk Excerpt
//!
//! A static excerpt of the published rev2 → rev3 control mapping, covering
//! the access-control family plus representative enhanced, withdrawn, and
//! new controls. Rev 3 renumbers every requirement into zero-padded
//! `03.XX.YY` form, consolidates several rev 2 requirements, and
//! introduces supply-chain requirements with no rev 2 counterpart.
//!
//! The table feeds [`CrosswalkEngine::build`](super::CrosswalkEngine)
//! through [`entries`] and doubles as a realistic migration fixture.

use super::{ChangeType, CrosswalkEntry};

/// One row of the static crosswalk table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrosswalkRow {
    /// Rev 2 requirement id, `None` for rev 3 additions
    pub from_id: Option<&'static str>,

    /// Rev 3 requirement id, `None` for outright withdrawals
    pub to_id: Option<&'static str>,

    /// How the requirement changed
    pub change_type: ChangeType,

    /// Annotation from the published mapping
    pub notes: &'static str,
}

/// Rev 2 → rev 3 mapping excerpt
pub const REV2_TO_REV3: &[CrosswalkRow] = &[
    // 3.1: Access Control -> 03.01
    CrosswalkRow {
        from_id: Some("3.1.1"),
        to_id: Some("03.01.01"),
        change_type: ChangeType::Renumbered,
        notes: "account management",
    },
    CrosswalkRow {
        from_id: Some("3.1.2"),
        to_id: Some("03.01.02"),
        change_type: ChangeType::Renumbered,
        notes: "access enforcement",
    },
    CrosswalkRow {
        from_id: Some("3.1.3"),
        to_id: Some("03.01.03"),
        change_type: ChangeType::Renumbered,
        notes: "control of CUI flow",
    },
    CrosswalkRow {
        from_id: Some("3.1.4"),
        to_id: Some("03.01.04"),
        change_type: ChangeType::Renumbered,
        notes: "separation of duties",
    },
    CrosswalkRow {
        from_id: Some("3.1.5"),
        to_id: Some("03.01.05"),
        change_type: ChangeType::Enhanced,
        notes: "least privilege; adds periodic privilege review",
    },
    CrosswalkRow {
        from_id: Some("3.1.6"),
        to_id: Some("03.01.06"),
        change_type: ChangeType::Renumbered,
        notes: "non-privileged accounts for non-security functions",
    },
    CrosswalkRow {
        from_id: Some("3.1.7"),
        to_id: Some("03.01.07"),
        change_type: ChangeType::Enhanced,
        notes: "privileged functions; adds audit of execution",
    },
    CrosswalkRow {
        from_id: Some("3.1.8"),
        to_id: Some("03.01.08"),
        change_type: ChangeType::Renumbered,
        notes: "unsuccessful logon attempts",
    },
    CrosswalkRow {
        from_id: Some("3.1.9"),
        to_id: Some("03.01.09"),
        change_type: ChangeType::Renumbered,
        notes: "privacy and security notices",
    },
    CrosswalkRow {
        from_id: Some("3.1.10"),
        to_id: Some("03.01.10"),
        change_type: ChangeType::Renumbered,
        notes: "session lock",
    },
    CrosswalkRow {
        from_id: Some("3.1.11"),
        to_id: Some("03.01.11"),
        change_type: ChangeType::Renumbered,
        notes: "session termination",
    },
    CrosswalkRow {
        from_id: Some("3.1.12"),
        to_id: Some("03.01.12"),
        change_type: ChangeType::Enhanced,
        notes: "remote access; absorbs monitoring and cryptography language",
    },
    CrosswalkRow {
        from_id: Some("3.1.13"),
        to_id: Some("03.01.12"),
        change_type: ChangeType::Withdrawn,
        notes: "cryptographic remote access protection folded into 03.01.12",
    },
    CrosswalkRow {
        from_id: Some("3.1.14"),
        to_id: Some("03.01.12"),
        change_type: ChangeType::Withdrawn,
        notes: "managed access control points folded into 03.01.12",
    },
    CrosswalkRow {
        from_id: Some("3.1.15"),
        to_id: Some("03.01.15"),
        change_type: ChangeType::Renumbered,
        notes: "privileged remote access authorization",
    },
    CrosswalkRow {
        from_id: Some("3.1.16"),
        to_id: Some("03.01.16"),
        change_type: ChangeType::Renumbered,
        notes: "wireless access authorization",
    },
    CrosswalkRow {
        from_id: Some("3.1.17"),
        to_id: Some("03.01.16"),
        change_type: ChangeType::Merged,
        notes: "wireless protection consolidated into 03.01.16",
    },
    CrosswalkRow {
        from_id: Some("3.1.18"),
        to_id: Some("03.01.18"),
        change_type: ChangeType::Renumbered,
        notes: "mobile device connection",
    },
    CrosswalkRow {
        from_id: Some("3.1.19"),
        to_id: Some("03.01.18"),
        change_type: ChangeType::Merged,
        notes: "mobile device encryption consolidated into 03.01.18",
    },
    CrosswalkRow {
        from_id: Some("3.1.20"),
        to_id: Some("03.01.20"),
        change_type: ChangeType::Renumbered,
        notes: "external system use",
    },
    CrosswalkRow {
        from_id: Some("3.1.21"),
        to_id: Some("03.01.21"),
        change_type: ChangeType::Renumbered,
        notes: "portable storage device use",
    },
    CrosswalkRow {
        from_id: Some("3.1.22"),
        to_id: Some("03.01.22"),
        change_type: ChangeType::Renumbered,
        notes: "publicly accessible content",
    },
    // 3.12: Security Assessment
    CrosswalkRow {
        from_id: Some("3.12.4"),
        to_id: None,
        change_type: ChangeType::Withdrawn,
        notes: "system security plan requirement moved out of the control catalog",
    },
    // 03.17: Supply Chain Risk Management, new in rev 3
    CrosswalkRow {
        from_id: None,
        to_id: Some("03.17.01"),
        change_type: ChangeType::New,
        notes: "supply chain risk management plan",
    },
    CrosswalkRow {
        from_id: None,
        to_id: Some("03.17.02"),
        change_type: ChangeType::New,
        notes: "acquisition strategies and controls",
    },
    CrosswalkRow {
        from_id: None,
        to_id: Some("03.17.03"),
        change_type: ChangeType::New,
        notes: "supply chain requirements and processes",
    },
];

/// Get the row mapping a rev 2 requirement forward
pub fn get_row(from_id: &str) -> Option<&'static CrosswalkRow> {
    REV2_TO_REV3.iter().find(|r| r.from_id == Some(from_id))
}

/// Materialize the static table as crosswalk entries
///
/// Feed the result to
/// [`CrosswalkEngine::build`](super::CrosswalkEngine::build) together with
/// a matching rev 2 taxonomy.
pub fn entries() -> Vec<CrosswalkEntry> {
    REV2_TO_REV3
        .iter()
        .map(|row| CrosswalkEntry {
            from_id: row.from_id.map(str::to_string),
            to_id: row.to_id.map(str::to_string),
            change_type: row.change_type,
            notes: row.notes.to_string(),
        })
        .collect()
}

/// Remap a rev 2 objective id onto the rev 3 numbering
///
/// Objective suffixes survive the renumbering (`3.1.1[a]` becomes
/// `03.01.01[a]`), so the id re-keys by swapping the control prefix.
/// Answers `None` for objectives under controls with no surviving target.
pub fn remap_objective(objective_id: &str, entry: &CrosswalkEntry) -> Option<String> {
    let from = entry.from_id.as_deref()?;
    let to = entry.to_id.as_deref()?;
    objective_id
        .strip_prefix(from)
        .map(|suffix| format!("{to}{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_row_shape_is_coherent() {
        for row in REV2_TO_REV3 {
            match row.change_type {
                ChangeType::New => {
                    assert!(row.from_id.is_none(), "new row carries a from id");
                    assert!(row.to_id.is_some(), "new row missing a to id");
                }
                ChangeType::Withdrawn => {
                    assert!(row.from_id.is_some(), "withdrawn row missing a from id");
                }
                _ => {
                    assert!(row.from_id.is_some() && row.to_id.is_some());
                }
            }
        }
    }

    #[test]
    fn test_get_row() {
        let row = get_row("3.1.13").unwrap();
        assert_eq!(row.change_type, ChangeType::Withdrawn);
        assert_eq!(row.to_id, Some("03.01.12"));
        assert!(get_row("9.9.9").is_none());
    }

    #[test]
    fn test_no_rev2_id_mapped_twice() {
        let mut seen = std::collections::HashSet::new();
        for row in REV2_TO_REV3.iter().filter_map(|r| r.from_id) {
            assert!(seen.insert(row), "duplicate from id {row}");
        }
    }

    #[test]
    fn test_entries_materialize_the_table() {
        let entries = entries();
        assert_eq!(entries.len(), REV2_TO_REV3.len());
        let withdrawn = entries
            .iter()
            .find(|e| e.from_id.as_deref() == Some("3.12.4"))
            .unwrap();
        assert_eq!(withdrawn.change_type, ChangeType::Withdrawn);
        assert!(withdrawn.to_id.is_none());
    }

    #[test]
    fn test_remap_objective_swaps_prefix() {
        let entry = CrosswalkEntry::renumbered("3.1.1", "03.01.01");
        assert_eq!(
            remap_objective("3.1.1[a]", &entry),
            Some("03.01.01[a]".to_string())
        );
        assert_eq!(remap_objective("3.4.1[a]", &entry), None);

        let retired = CrosswalkEntry::withdrawn("3.12.4", None);
        assert_eq!(remap_objective("3.12.4[a]", &retired), None);
    }
}
