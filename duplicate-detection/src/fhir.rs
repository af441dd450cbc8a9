//! Minimal FHIR R4 `MedicationRequest` / `Bundle` model, just enough to
//! turn an already retrieved bundle into [`MedicationRecord`]s.

use crate::medication::{MedicationRecord, MedicationStatus};
use chrono::NaiveDate;
use serde::Deserialize;

pub const RXNORM_SYSTEM: &str = "http://www.nlm.nih.gov/research/umls/rxnorm";

const UNKNOWN_MEDICATION: &str = "Unknown Medication";
const UNKNOWN_PROVIDER: &str = "Unknown Provider";
const DEFAULT_DOSAGE: &str = "As directed";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Bundle {
    #[serde(default)]
    pub entry: Vec<BundleEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BundleEntry {
    pub resource: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRequest {
    pub id: Option<String>,
    pub status: Option<String>,
    pub medication_codeable_concept: Option<CodeableConcept>,
    pub requester: Option<Reference>,
    pub authored_on: Option<String>,
    #[serde(default)]
    pub dosage_instruction: Vec<Dosage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodeableConcept {
    #[serde(default)]
    pub coding: Vec<Coding>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Coding {
    pub system: Option<String>,
    pub code: Option<String>,
    pub display: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Reference {
    pub display: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dosage {
    pub text: Option<String>,
}

impl MedicationRequest {
    pub fn rxnorm_coding(&self) -> Option<&Coding> {
        self.medication_codeable_concept
            .as_ref()?
            .coding
            .iter()
            .find(|coding| coding.system.as_deref() == Some(RXNORM_SYSTEM))
    }
}

/// Blank strings count as absent so the fallbacks apply
fn non_blank(value: &Option<String>) -> Option<String> {
    value.clone().filter(|value| !value.trim().is_empty())
}

impl From<&MedicationRequest> for MedicationRecord {
    fn from(request: &MedicationRequest) -> Self {
        let coding = request.rxnorm_coding();

        let name = request
            .medication_codeable_concept
            .as_ref()
            .and_then(|concept| non_blank(&concept.text))
            .or_else(|| coding.and_then(|coding| non_blank(&coding.display)))
            .unwrap_or_else(|| UNKNOWN_MEDICATION.to_string());

        let dosage = request
            .dosage_instruction
            .first()
            .and_then(|dosage| non_blank(&dosage.text))
            .unwrap_or_else(|| DEFAULT_DOSAGE.to_string());

        let prescriber = request
            .requester
            .as_ref()
            .and_then(|requester| non_blank(&requester.display))
            .unwrap_or_else(|| UNKNOWN_PROVIDER.to_string());

        let authored_on = request
            .authored_on
            .as_deref()
            .and_then(|authored| authored.split('T').next())
            .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok());

        let status = request
            .status
            .as_deref()
            .map(MedicationStatus::from_code)
            .unwrap_or(MedicationStatus::Other);

        MedicationRecord::new(
            request.id.clone(),
            name,
            coding.and_then(|coding| coding.code.clone()),
        )
        .with_status(status)
        .with_dosage(dosage)
        .with_prescriber(Some(prescriber))
        .with_authored_on(authored_on)
    }
}

impl Bundle {
    /// Medication records for every `MedicationRequest` entry, other resources are skipped
    pub fn medication_records(&self) -> Vec<MedicationRecord> {
        self.entry
            .iter()
            .filter_map(|entry| entry.resource.as_ref())
            .filter(|resource| {
                resource.get("resourceType").and_then(serde_json::Value::as_str)
                    == Some("MedicationRequest")
            })
            .filter_map(|resource| {
                match serde_json::from_value::<MedicationRequest>(resource.clone()) {
                    Ok(request) => Some(MedicationRecord::from(&request)),
                    Err(err) => {
                        log::warn!("Skipping unreadable MedicationRequest: {}", err);
                        None
                    }
                }
            })
            .collect()
    }
}
