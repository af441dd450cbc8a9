//! Wire model of the RxClass `class/byRxcui` response.
//! Every level is optional since the service omits empty lists entirely.

use crate::classification::{ClassEntry, ClassSource};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RxClassResponse {
    pub rxclass_drug_info_list: Option<RxClassDrugInfoList>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RxClassDrugInfoList {
    #[serde(default)]
    pub rxclass_drug_info: Vec<RxClassDrugInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RxClassDrugInfo {
    pub min_concept: Option<MinConcept>,
    pub rxclass_min_concept_item: Option<ClassConcept>,
    pub rela: Option<String>,
    pub rela_source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinConcept {
    pub rxcui: Option<String>,
    pub name: Option<String>,
    pub tty: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassConcept {
    pub class_id: Option<String>,
    pub class_name: Option<String>,
    pub class_type: Option<String>,
}

impl RxClassResponse {
    pub fn items(&self) -> &[RxClassDrugInfo] {
        self.rxclass_drug_info_list
            .as_ref()
            .map(|list| list.rxclass_drug_info.as_slice())
            .unwrap_or_default()
    }

    /// Drug name reported on the first item
    pub fn drug_name(&self) -> Option<&str> {
        self.items()
            .first()?
            .min_concept
            .as_ref()?
            .name
            .as_deref()
    }

    /// All class concepts carrying a class name, in response order.
    /// No filtering by source or deduplication happens here.
    pub fn class_entries(&self) -> Vec<ClassEntry> {
        self.items()
            .iter()
            .filter_map(|item| item.rxclass_min_concept_item.as_ref())
            .filter_map(|concept| {
                let class_name = concept.class_name.clone()?;
                let source =
                    ClassSource::from_class_type(concept.class_type.as_deref().unwrap_or(""));
                Some(ClassEntry::new(
                    source,
                    concept.class_id.clone(),
                    class_name,
                    concept.class_type.clone(),
                ))
            })
            .collect()
    }
}
