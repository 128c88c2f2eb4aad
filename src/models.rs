use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ============ Tracking Models ============

/// Workflow milestones tracked for every clearance reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    /// Entry/exit group code assigned at clearance.
    EntryExitGroup,
    /// Pedimento validation date.
    ValidationDate,
    /// Date the last client document arrived.
    LastDocumentDate,
    /// MSA milestone date.
    MsaDate,
    /// Hand-off to the transport carrier.
    TransportDeliveryDate,
    /// CDP delivery confirmation date.
    CdpDeliveryDate,
}

impl Milestone {
    pub const ALL: [Milestone; 6] = [
        Milestone::EntryExitGroup,
        Milestone::ValidationDate,
        Milestone::LastDocumentDate,
        Milestone::MsaDate,
        Milestone::TransportDeliveryDate,
        Milestone::CdpDeliveryDate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Milestone::EntryExitGroup => "entry_exit_group",
            Milestone::ValidationDate => "validation_date",
            Milestone::LastDocumentDate => "last_document_date",
            Milestone::MsaDate => "msa_date",
            Milestone::TransportDeliveryDate => "transport_delivery_date",
            Milestone::CdpDeliveryDate => "cdp_delivery_date",
        }
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The six milestone values as reported by one data source.
///
/// Dates are kept as the strings the source sent (fixed-width
/// `YYYY-MM-DD[THH:MM:SS]`), since tie-breaks compare them lexically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Milestones {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_exit_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_document_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msa_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport_delivery_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdp_delivery_date: Option<String>,
}

impl Milestones {
    pub fn get(&self, milestone: Milestone) -> Option<&str> {
        let value = match milestone {
            Milestone::EntryExitGroup => &self.entry_exit_group,
            Milestone::ValidationDate => &self.validation_date,
            Milestone::LastDocumentDate => &self.last_document_date,
            Milestone::MsaDate => &self.msa_date,
            Milestone::TransportDeliveryDate => &self.transport_delivery_date,
            Milestone::CdpDeliveryDate => &self.cdp_delivery_date,
        };
        value.as_deref()
    }

    pub fn set(&mut self, milestone: Milestone, value: impl Into<String>) {
        let slot = match milestone {
            Milestone::EntryExitGroup => &mut self.entry_exit_group,
            Milestone::ValidationDate => &mut self.validation_date,
            Milestone::LastDocumentDate => &mut self.last_document_date,
            Milestone::MsaDate => &mut self.msa_date,
            Milestone::TransportDeliveryDate => &mut self.transport_delivery_date,
            Milestone::CdpDeliveryDate => &mut self.cdp_delivery_date,
        };
        *slot = Some(value.into());
    }
}

/// One customs-clearance shipment as returned by the tracking API.
///
/// `interface` holds the same milestones as reported by the Transbel
/// interface feed; when present and non-empty they take precedence over the
/// primary values. Unknown fields are preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingRecord {
    /// Raw reference, possibly decorated (`RPVI251574`, `PVI251574A`).
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(flatten)]
    pub milestones: Milestones,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<Milestones>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exception_codes: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TrackingRecord {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Self::default()
        }
    }

    /// Builder-style setter for the primary source.
    pub fn with(mut self, milestone: Milestone, value: impl Into<String>) -> Self {
        self.milestones.set(milestone, value);
        self
    }

    /// Builder-style setter for the interface source.
    pub fn with_interface(mut self, milestone: Milestone, value: impl Into<String>) -> Self {
        self.interface
            .get_or_insert_with(Milestones::default)
            .set(milestone, value);
        self
    }

    /// Milestone value after falling back from the interface feed to the
    /// primary source. Blank values count as absent.
    pub fn resolved(&self, milestone: Milestone) -> Option<&str> {
        let interface = self
            .interface
            .as_ref()
            .and_then(|source| source.get(milestone))
            .filter(|v| !v.trim().is_empty());

        interface.or_else(|| {
            self.milestones
                .get(milestone)
                .filter(|v| !v.trim().is_empty())
        })
    }

    /// First milestone without a usable value, if any.
    pub fn first_missing_milestone(&self) -> Option<Milestone> {
        Milestone::ALL
            .into_iter()
            .find(|m| self.resolved(*m).is_none())
    }
}
