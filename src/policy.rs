//! Exception-code rules for clearance phase updates.
//!
//! Both predicates answer `false` whenever an input is missing or cannot be
//! read as a date: incomplete data never blocks a submission on its own.
use crate::calendar::{
    business_days_diff_with_holidays, parse_calendar_date, HolidayProvider, MexicanCalendar,
};
use crate::models::Milestone;
use crate::reference::CoreReference;
use serde::{Deserialize, Serialize};

/// Default business-day window before an exception code is required.
pub const DEFAULT_KPI_DAYS: u32 = 1;

fn has_exception_code(exception_code: Option<&str>) -> bool {
    exception_code.is_some_and(|code| !code.trim().is_empty())
}

fn days_between<H>(initial_date: Option<&str>, final_date: Option<&str>, holidays: &H) -> Option<u32>
where
    H: HolidayProvider + ?Sized,
{
    let start = parse_calendar_date(initial_date?)?;
    let end = parse_calendar_date(final_date?)?;
    Some(business_days_diff_with_holidays(start, end, holidays))
}

/// True when a code was supplied and the dates are at most one business day
/// apart.
pub fn should_put_exception_code_with<H>(
    exception_code: Option<&str>,
    initial_date: Option<&str>,
    final_date: Option<&str>,
    holidays: &H,
) -> bool
where
    H: HolidayProvider + ?Sized,
{
    if !has_exception_code(exception_code) {
        return false;
    }
    days_between(initial_date, final_date, holidays).is_some_and(|days| days <= 1)
}

pub fn should_put_exception_code(
    exception_code: Option<&str>,
    initial_date: Option<&str>,
    final_date: Option<&str>,
) -> bool {
    should_put_exception_code_with(exception_code, initial_date, final_date, &MexicanCalendar)
}

/// True when no code was supplied and the dates are more than `num_days`
/// business days apart.
pub fn does_date_kpi_break_with<H>(
    exception_code: Option<&str>,
    initial_date: Option<&str>,
    final_date: Option<&str>,
    num_days: u32,
    holidays: &H,
) -> bool
where
    H: HolidayProvider + ?Sized,
{
    if has_exception_code(exception_code) {
        return false;
    }
    days_between(initial_date, final_date, holidays).is_some_and(|days| days > num_days)
}

pub fn does_date_kpi_break(
    exception_code: Option<&str>,
    initial_date: Option<&str>,
    final_date: Option<&str>,
    num_days: u32,
) -> bool {
    does_date_kpi_break_with(
        exception_code,
        initial_date,
        final_date,
        num_days,
        &MexicanCalendar,
    )
}

// ============ Phase Update Form ============

/// A user's request to move one reference through one or more milestones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhaseUpdateForm {
    pub reference: String,
    #[serde(default)]
    pub phases: Vec<PhaseChange>,
}

/// New date for one milestone, measured against the milestone before it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseChange {
    pub milestone: Milestone,
    #[serde(default)]
    pub previous_date: Option<String>,
    #[serde(default)]
    pub new_date: Option<String>,
    #[serde(default)]
    pub exception_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Path of the offending field, e.g. `phases[0].exception_code`.
    pub field: String,
    /// Milestone the error belongs to; `None` for form-level fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<Milestone>,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            milestone: None,
            message: message.into(),
        }
    }

    fn for_milestone(mut self, milestone: Milestone) -> Self {
        self.milestone = Some(milestone);
        self
    }
}

fn kpi_message(milestone: Milestone, threshold: u32) -> String {
    let unit = if threshold == 1 { "día" } else { "días" };
    format!(
        "Coloca un código de excepción, la diferencia entre fechas es mayor a {} {} ({})",
        threshold, unit, milestone
    )
}

/// Validates a phase-update form. An empty result means it can be submitted.
pub fn validate_phase_update<H>(form: &PhaseUpdateForm, threshold: u32, holidays: &H) -> Vec<FieldError>
where
    H: HolidayProvider + ?Sized,
{
    let mut errors = Vec::new();

    if CoreReference::extract(&form.reference).is_none() {
        errors.push(FieldError::new(
            "reference",
            format!("Referencia inválida: {}", form.reference),
        ));
    }

    for (idx, phase) in form.phases.iter().enumerate() {
        let previous = phase.previous_date.as_deref();
        let new = phase.new_date.as_deref();

        let ordered = match (
            previous.and_then(parse_calendar_date),
            new.and_then(parse_calendar_date),
        ) {
            (Some(prev), Some(next)) if next < prev => {
                errors.push(
                    FieldError::new(
                        format!("phases[{}].new_date", idx),
                        format!(
                            "La fecha no puede ser anterior a {} ({})",
                            prev.format("%Y-%m-%d"),
                            phase.milestone
                        ),
                    )
                    .for_milestone(phase.milestone),
                );
                false
            }
            _ => true,
        };

        if ordered
            && does_date_kpi_break_with(
                phase.exception_code.as_deref(),
                previous,
                new,
                threshold,
                holidays,
            )
        {
            errors.push(
                FieldError::new(
                    format!("phases[{}].exception_code", idx),
                    kpi_message(phase.milestone, threshold),
                )
                .for_milestone(phase.milestone),
            );
        }
    }

    if !errors.is_empty() {
        tracing::debug!(
            "Phase update for {} rejected with {} error(s)",
            form.reference,
            errors.len()
        );
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase(previous: &str, new: &str, code: Option<&str>) -> PhaseChange {
        PhaseChange {
            milestone: Milestone::MsaDate,
            previous_date: Some(previous.to_string()),
            new_date: Some(new.to_string()),
            exception_code: code.map(str::to_string),
        }
    }

    #[test]
    fn test_should_put_requires_code() {
        assert!(!should_put_exception_code(
            None,
            Some("2025-07-07"),
            Some("2025-07-08")
        ));
        assert!(should_put_exception_code(
            Some("E01"),
            Some("2025-07-07"),
            Some("2025-07-08")
        ));
        assert!(!should_put_exception_code(
            Some("E01"),
            Some("2025-07-07"),
            Some("2025-07-09")
        ));
    }

    #[test]
    fn test_blank_code_counts_as_missing() {
        assert!(does_date_kpi_break(
            Some("   "),
            Some("2025-07-07"),
            Some("2025-07-09"),
            1
        ));
    }

    #[test]
    fn test_unparseable_date_never_blocks() {
        assert!(!does_date_kpi_break(
            None,
            Some("not a date"),
            Some("2025-07-09"),
            1
        ));
    }

    #[test]
    fn test_kpi_message_pluralizes() {
        assert!(kpi_message(Milestone::MsaDate, 1).ends_with("1 día (msa_date)"));
        assert!(kpi_message(Milestone::MsaDate, 3).ends_with("3 días (msa_date)"));
    }

    #[test]
    fn test_form_flags_missing_exception_code() {
        let form = PhaseUpdateForm {
            reference: "PVI251574".to_string(),
            phases: vec![phase("2025-07-07", "2025-07-09", None)],
        };

        let errors = validate_phase_update(&form, DEFAULT_KPI_DAYS, &MexicanCalendar);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "phases[0].exception_code");
        assert_eq!(errors[0].milestone, Some(Milestone::MsaDate));
        assert!(errors[0].message.starts_with("Coloca un código de excepción"));
        assert!(errors[0].message.contains("msa_date"));
    }

    #[test]
    fn test_form_accepts_supplied_code() {
        let form = PhaseUpdateForm {
            reference: "PVI251574".to_string(),
            phases: vec![phase("2025-07-07", "2025-07-09", Some("E02"))],
        };

        assert!(validate_phase_update(&form, DEFAULT_KPI_DAYS, &MexicanCalendar).is_empty());
    }

    #[test]
    fn test_form_rejects_backdated_phase() {
        let form = PhaseUpdateForm {
            reference: "PVI251574".to_string(),
            phases: vec![phase("2025-07-09", "2025-07-07", None)],
        };

        let errors = validate_phase_update(&form, DEFAULT_KPI_DAYS, &MexicanCalendar);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "phases[0].new_date");
        assert_eq!(errors[0].milestone, Some(Milestone::MsaDate));
    }

    #[test]
    fn test_form_rejects_bad_reference() {
        let form = PhaseUpdateForm {
            reference: "12345".to_string(),
            phases: vec![],
        };

        let errors = validate_phase_update(&form, DEFAULT_KPI_DAYS, &MexicanCalendar);
        assert_eq!(errors[0].field, "reference");
        assert_eq!(errors[0].milestone, None);
    }
}
