//! Field-level validation of the wizard draft.

use std::collections::BTreeMap;

use url::Url;

use super::{Field, MAX_AGGRESSIVENESS, MIN_AGGRESSIVENESS, ScheduleMode, WizardDraft};

const MIN_TEXT_LEN: usize = 3;

/// Messages keyed by the field they belong to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<Field, String>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    /// Drop messages for `fields`, then take over every message in `other`.
    pub(crate) fn refresh(&mut self, fields: &[Field], other: ValidationErrors) {
        for field in fields {
            self.0.remove(field);
        }
        self.0.extend(other.0);
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }
}

/// Validate exactly `fields` of `draft`.
pub fn validate(draft: &WizardDraft, fields: &[Field]) -> ValidationErrors {
    let errors = fields
        .iter()
        .filter_map(|field| validate_field(draft, *field).map(|message| (*field, message)))
        .collect();
    ValidationErrors(errors)
}

/// Rule for a single field; `None` when valid.
pub fn validate_field(draft: &WizardDraft, field: Field) -> Option<String> {
    match field {
        Field::TaskName if draft.task_name.chars().count() < MIN_TEXT_LEN => {
            Some("Task name is required".to_string())
        }
        Field::Targets if draft.targets.chars().count() < MIN_TEXT_LEN => {
            Some("Targets are required".to_string())
        }
        Field::Aggressiveness
            if !(MIN_AGGRESSIVENESS..=MAX_AGGRESSIVENESS).contains(&draft.aggressiveness) =>
        {
            Some(format!(
                "Aggressiveness must be between {} and {}",
                MIN_AGGRESSIVENESS, MAX_AGGRESSIVENESS
            ))
        }
        Field::InstallerUrl if Url::parse(draft.installer.url.trim()).is_err() => {
            Some("Installer URL is required".to_string())
        }
        Field::StartAt
            if draft.schedule == ScheduleMode::Deferred && draft.start_at.trim().is_empty() =>
        {
            Some("Start time is required when scheduling later".to_string())
        }
        _ => None,
    }
}
