use chrono::NaiveDate;
use getset::Getters;
use rxclass_client::Classification;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Lifecycle state of a medication order
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MedicationStatus {
    #[default]
    Active,
    Stopped,
    EnteredInError,
    /// Any other order status (on-hold, completed, draft, ...)
    #[serde(other)]
    Other,
}

impl MedicationStatus {
    pub fn from_code(code: &str) -> Self {
        code.parse().unwrap_or(MedicationStatus::Other)
    }
}

/// A medication order as handed over by the caller
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Getters)]
#[get = "pub"]
pub struct MedicationRecord {
    id: Option<String>,
    name: String,
    rxnorm_code: Option<String>,
    #[serde(default)]
    status: MedicationStatus,
    dosage: String,
    prescriber: Option<String>,
    authored_on: Option<NaiveDate>,
}

impl MedicationRecord {
    pub fn new(id: Option<String>, name: impl Into<String>, rxnorm_code: Option<String>) -> Self {
        Self {
            id,
            name: name.into(),
            rxnorm_code,
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: MedicationStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_dosage(mut self, dosage: impl Into<String>) -> Self {
        self.dosage = dosage.into();
        self
    }

    pub fn with_prescriber(mut self, prescriber: Option<String>) -> Self {
        self.prescriber = prescriber;
        self
    }

    pub fn with_authored_on(mut self, authored_on: Option<NaiveDate>) -> Self {
        self.authored_on = authored_on;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == MedicationStatus::Active
    }

    /// RxNorm code usable for exact matching: present and not blank
    pub fn exact_match_code(&self) -> Option<&str> {
        self.rxnorm_code
            .as_deref()
            .filter(|code| !code.trim().is_empty())
    }
}

/// A medication together with its resolved classes, if any
#[derive(Debug, Clone, PartialEq, Getters)]
#[get = "pub"]
pub struct EnrichedMedication {
    record: MedicationRecord,
    classification: Option<Classification>,
}

impl EnrichedMedication {
    pub fn new(record: MedicationRecord, classification: Option<Classification>) -> Self {
        Self {
            record,
            classification,
        }
    }

    pub fn into_record(self) -> MedicationRecord {
        self.record
    }
}
