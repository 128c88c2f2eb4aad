//! Collapses tracking records that describe the same shipment.
//!
//! Records are grouped by their [`CoreReference`]; within a group the record
//! with the latest CDP delivery wins, then the latest MSA date, then the one
//! whose raw reference is the bare core. Remaining ties keep the earlier record.
use crate::models::{Milestone, TrackingRecord};
use crate::reference::CoreReference;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Why a record did not make it into the deduplicated output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExclusionReason {
    /// No reference string at all.
    MissingReference,
    /// The reference has no `P[A-Z]{2}[0-9]{6}` match.
    NoCoreReference,
    /// A required milestone is empty in both sources.
    MissingMilestone { milestone: Milestone },
    /// Another record for the same core won the tie-break.
    Superseded { by: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ExcludedRecord {
    pub record: TrackingRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub core: Option<CoreReference>,
    pub reason: ExclusionReason,
}

/// Kept records (one per core, in first-seen order) plus everything dropped.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DedupOutcome {
    pub kept: Vec<TrackingRecord>,
    pub excluded: Vec<ExcludedRecord>,
}

struct Group {
    core: CoreReference,
    members: Vec<TrackingRecord>,
}

fn milestone_cmp(a: &TrackingRecord, b: &TrackingRecord, milestone: Milestone) -> Ordering {
    a.resolved(milestone).cmp(&b.resolved(milestone))
}

fn is_exact(record: &TrackingRecord, core: &CoreReference) -> bool {
    record
        .reference
        .as_deref()
        .is_some_and(|raw| core.matches_exactly(raw))
}

/// True when `candidate` should replace the running `best`.
fn beats(candidate: &TrackingRecord, best: &TrackingRecord, core: &CoreReference) -> bool {
    milestone_cmp(candidate, best, Milestone::CdpDeliveryDate)
        .then_with(|| milestone_cmp(candidate, best, Milestone::MsaDate))
        .then_with(|| is_exact(candidate, core).cmp(&is_exact(best, core)))
        == Ordering::Greater
}

fn winner_index(group: &Group) -> usize {
    let mut best = 0;
    for (idx, candidate) in group.members.iter().enumerate().skip(1) {
        if beats(candidate, &group.members[best], &group.core) {
            best = idx;
        }
    }
    best
}

fn admit(record: &TrackingRecord) -> Result<CoreReference, ExclusionReason> {
    let raw = record
        .reference
        .as_deref()
        .ok_or(ExclusionReason::MissingReference)?;
    let core = CoreReference::extract(raw).ok_or(ExclusionReason::NoCoreReference)?;

    if let Some(milestone) = record.first_missing_milestone() {
        return Err(ExclusionReason::MissingMilestone { milestone });
    }

    Ok(core)
}

/// Deduplicates records and reports every exclusion with its reason.
///
/// `kept.len() + excluded.len()` always equals the input length.
pub fn dedupe_with_audit(records: Vec<TrackingRecord>) -> DedupOutcome {
    let total = records.len();
    let mut outcome = DedupOutcome::default();
    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<CoreReference, usize> = HashMap::new();

    for record in records {
        match admit(&record) {
            Ok(core) => match index.get(&core) {
                Some(&slot) => groups[slot].members.push(record),
                None => {
                    index.insert(core.clone(), groups.len());
                    groups.push(Group {
                        core,
                        members: vec![record],
                    });
                }
            },
            Err(reason) => {
                tracing::debug!(
                    "Excluding record {:?} from dedup: {:?}",
                    record.reference,
                    reason
                );
                outcome.excluded.push(ExcludedRecord {
                    core: record.reference.as_deref().and_then(CoreReference::extract),
                    record,
                    reason,
                });
            }
        }
    }

    for group in groups {
        let best = winner_index(&group);
        let Group { core, members } = group;
        let winner_ref = members[best].reference.clone().unwrap_or_default();

        for (idx, record) in members.into_iter().enumerate() {
            if idx == best {
                outcome.kept.push(record);
            } else {
                outcome.excluded.push(ExcludedRecord {
                    record,
                    core: Some(core.clone()),
                    reason: ExclusionReason::Superseded {
                        by: winner_ref.clone(),
                    },
                });
            }
        }
    }

    tracing::debug!(
        "Deduplicated {} record(s): {} kept, {} excluded",
        total,
        outcome.kept.len(),
        outcome.excluded.len()
    );

    outcome
}

/// One record per core reference; incomplete records are dropped.
pub fn pick_best_by_referencia_core(records: Vec<TrackingRecord>) -> Vec<TrackingRecord> {
    dedupe_with_audit(records).kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(reference: &str, cdp: &str, msa: &str) -> TrackingRecord {
        TrackingRecord::new(reference)
            .with(Milestone::EntryExitGroup, "A1")
            .with(Milestone::ValidationDate, "2025-07-01")
            .with(Milestone::LastDocumentDate, "2025-07-01")
            .with(Milestone::MsaDate, msa)
            .with(Milestone::TransportDeliveryDate, "2025-07-02")
            .with(Milestone::CdpDeliveryDate, cdp)
    }

    #[test]
    fn test_msa_breaks_cdp_tie() {
        let kept = pick_best_by_referencia_core(vec![
            complete("PVI251574", "2025-07-04", "2025-07-02"),
            complete("RPVI251574", "2025-07-04", "2025-07-03"),
        ]);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].reference.as_deref(), Some("RPVI251574"));
    }

    #[test]
    fn test_exact_reference_breaks_date_tie() {
        let kept = pick_best_by_referencia_core(vec![
            complete("RPVI251574", "2025-07-04", "2025-07-03"),
            complete("PVI251574", "2025-07-04", "2025-07-03"),
        ]);

        assert_eq!(kept[0].reference.as_deref(), Some("PVI251574"));
    }

    #[test]
    fn test_full_tie_keeps_first_seen() {
        let kept = pick_best_by_referencia_core(vec![
            complete("RPVI251574", "2025-07-04", "2025-07-03"),
            complete("PVI251574B", "2025-07-04", "2025-07-03"),
        ]);

        assert_eq!(kept[0].reference.as_deref(), Some("RPVI251574"));
    }

    #[test]
    fn test_audit_reasons() {
        let mut no_reference = complete("PVI000001", "2025-07-04", "2025-07-03");
        no_reference.reference = None;

        let outcome = dedupe_with_audit(vec![
            no_reference,
            complete("ZZZ", "2025-07-04", "2025-07-03"),
            complete("PVI251574", "2025-07-03", "2025-07-03"),
            complete("PVI251574A", "2025-07-04", "2025-07-03"),
        ]);

        assert_eq!(outcome.kept.len(), 1);
        let reasons: Vec<_> = outcome.excluded.iter().map(|e| e.reason.clone()).collect();
        assert_eq!(
            reasons,
            vec![
                ExclusionReason::MissingReference,
                ExclusionReason::NoCoreReference,
                ExclusionReason::Superseded {
                    by: "PVI251574A".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_output_follows_first_appearance_of_core() {
        let kept = pick_best_by_referencia_core(vec![
            complete("PAB000001", "2025-07-01", "2025-07-01"),
            complete("PCD000002", "2025-07-01", "2025-07-01"),
            complete("PAB000001X", "2025-07-09", "2025-07-01"),
        ]);

        let refs: Vec<_> = kept.iter().filter_map(|r| r.reference.as_deref()).collect();
        assert_eq!(refs, vec!["PAB000001X", "PCD000002"]);
    }
}
