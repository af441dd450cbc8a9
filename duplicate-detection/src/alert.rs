use crate::grouping::{DuplicateGroup, DuplicateKind};
use serde::{Deserialize, Serialize};

/// Clinician-facing summary of one duplicate group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateAlert {
    pub title: String,
    pub description: String,
    pub medications_involved: Vec<String>,
}

impl From<&DuplicateGroup> for DuplicateAlert {
    fn from(group: &DuplicateGroup) -> Self {
        let (title, description) = match group.kind() {
            DuplicateKind::Exact => (
                "Duplicate Medication Found",
                format!("Multiple prescriptions found for {}.", group.match_key()),
            ),
            DuplicateKind::Therapeutic => (
                "Therapeutic Duplication Warning",
                format!(
                    "Multiple active medications found in class: {}. \
                     This may indicate redundant therapy.",
                    group.match_key()
                ),
            ),
        };

        Self {
            title: title.to_string(),
            description,
            medications_involved: group
                .member_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}
