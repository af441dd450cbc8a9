mod alert;
pub mod fhir;
mod grouping;
mod medication;


pub use alert::DuplicateAlert;
pub use grouping::{find_duplicates, DuplicateGroup, DuplicateKind};
pub use medication::{EnrichedMedication, MedicationRecord, MedicationStatus};
pub use rxclass_client::{ClassificationResolver, Error};

/// Entry point for duplicate detection over a patient's medication list
#[derive(Clone)]
pub struct DuplicateDetector {
    resolver: ClassificationResolver,
}

impl DuplicateDetector {
    pub fn new(resolver: ClassificationResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &ClassificationResolver {
        &self.resolver
    }

    /// Classify every medication and group the duplicates.
    ///
    /// Medications without an RxNorm code are not looked up and only miss out
    /// on therapeutic matching. Failed lookups degrade the same way. The only
    /// error is a lookup that could not be dispatched at all, meaning class
    /// information is unavailable rather than absent.
    pub async fn detect_duplicates(
        &self,
        meds: &[MedicationRecord],
    ) -> Result<Vec<DuplicateGroup>, Error> {
        let enriched = self.enrich(meds).await?;
        Ok(find_duplicates(&enriched))
    }

    /// Like [`detect_duplicates`](Self::detect_duplicates) over active medications only
    pub async fn detect_active_duplicates(
        &self,
        meds: &[MedicationRecord],
    ) -> Result<Vec<DuplicateGroup>, Error> {
        let active: Vec<MedicationRecord> =
            meds.iter().filter(|med| med.is_active()).cloned().collect();
        log::debug!("{} of {} medications are active", active.len(), meds.len());
        self.detect_duplicates(&active).await
    }

    pub async fn enrich(
        &self,
        meds: &[MedicationRecord],
    ) -> Result<Vec<EnrichedMedication>, Error> {
        let (positions, rxcuis): (Vec<usize>, Vec<String>) = meds
            .iter()
            .enumerate()
            .filter_map(|(position, med)| med.rxnorm_code().clone().map(|code| (position, code)))
            .unzip();

        let resolved = self.resolver.resolve_many(&rxcuis).await?;

        let mut classifications = vec![None; meds.len()];
        for (position, classification) in positions.into_iter().zip(resolved) {
            classifications[position] = classification;
        }

        Ok(meds
            .iter()
            .cloned()
            .zip(classifications)
            .map(|(record, classification)| EnrichedMedication::new(record, classification))
            .collect())
    }
}
