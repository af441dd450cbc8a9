use crate::rxclass::RxClassResponse;
use chrono::{DateTime, Utc};
use getset::Getters;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use strum_macros::{Display, EnumString};

/// Taxonomy a drug class belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum ClassSource {
    Atc,
    Va,
    Moa,
    Other,
}

impl ClassSource {
    /// Map an RxClass class type code onto a source.
    /// Every ATC level (`ATC1-4`, ...) counts as ATC.
    pub fn from_class_type(class_type: &str) -> Self {
        let class_type = class_type.to_uppercase();
        if class_type.starts_with("ATC") {
            ClassSource::Atc
        } else if class_type == "VA" {
            ClassSource::Va
        } else if class_type == "MOA" {
            ClassSource::Moa
        } else {
            ClassSource::Other
        }
    }

    /// Sources that take part in therapeutic duplicate detection
    pub fn is_therapeutic(&self) -> bool {
        !matches!(self, ClassSource::Other)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[get = "pub"]
pub struct ClassEntry {
    source: ClassSource,
    class_id: Option<String>,
    class_name: String,
    /// Raw class type as reported by RxClass
    class_type: Option<String>,
}

impl ClassEntry {
    pub fn new(
        source: ClassSource,
        class_id: Option<String>,
        class_name: String,
        class_type: Option<String>,
    ) -> Self {
        Self {
            source,
            class_id: class_id.filter(|id| !id.is_empty()),
            class_name,
            class_type,
        }
    }

    /// Identity of the class within one classification: the class id when
    /// present, the class name otherwise, compared case-insensitively
    pub fn dedup_key(&self) -> String {
        self.class_id
            .as_deref()
            .unwrap_or(&self.class_name)
            .to_lowercase()
    }
}

/// Therapeutic classes resolved for one RxNorm code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[get = "pub"]
pub struct Classification {
    rxcui: String,
    drug_name: Option<String>,
    classes: Vec<ClassEntry>,
    resolved_at: DateTime<Utc>,
}

impl Classification {
    /// Build a classification, dropping repeated classes while keeping first-seen order
    pub fn new(
        rxcui: String,
        drug_name: Option<String>,
        classes: Vec<ClassEntry>,
        resolved_at: DateTime<Utc>,
    ) -> Self {
        let mut seen = HashSet::new();
        let classes = classes
            .into_iter()
            .filter(|entry| seen.insert(entry.dedup_key()))
            .collect();

        Self {
            rxcui,
            drug_name,
            classes,
            resolved_at,
        }
    }

    pub fn from_response(
        rxcui: &str,
        response: &RxClassResponse,
        resolved_at: DateTime<Utc>,
    ) -> Self {
        let classes = response
            .class_entries()
            .into_iter()
            .filter(|entry| entry.source().is_therapeutic())
            .collect();

        Self::new(
            rxcui.to_string(),
            response.drug_name().map(str::to_string),
            classes,
            resolved_at,
        )
    }

    /// Names of the classes that count towards therapeutic duplication
    pub fn therapeutic_class_names(&self) -> impl Iterator<Item = &str> {
        self.classes
            .iter()
            .filter(|entry| entry.source.is_therapeutic())
            .map(|entry| entry.class_name.as_str())
    }
}
