use crate::medication::{EnrichedMedication, MedicationRecord};
use getset::Getters;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum DuplicateKind {
    /// Same RxNorm product code
    Exact,
    /// Same therapeutic class
    Therapeutic,
}

/// Medications that conflict with each other for one reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[get = "pub"]
pub struct DuplicateGroup {
    kind: DuplicateKind,
    /// RxNorm code for exact groups, class name for therapeutic ones
    match_key: String,
    medications: Vec<MedicationRecord>,
}

impl DuplicateGroup {
    pub fn member_ids(&self) -> Vec<Option<&str>> {
        self.medications.iter().map(|med| med.id().as_deref()).collect()
    }

    pub fn member_names(&self) -> Vec<&str> {
        self.medications.iter().map(|med| med.name().as_str()).collect()
    }
}

/// Identity of a medication inside a bucket: its id, or its position when it has none
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
enum Member<'a> {
    Id(&'a str),
    Position(usize),
}

impl<'a> Member<'a> {
    fn of(med: &'a EnrichedMedication, position: usize) -> Self {
        match med.record().id().as_deref() {
            Some(id) => Member::Id(id),
            None => Member::Position(position),
        }
    }
}

/// Buckets of input positions keyed by match key, in first-seen key order
#[derive(Default)]
struct Buckets<'a> {
    order: Vec<&'a str>,
    members: HashMap<&'a str, Vec<usize>>,
    seen: HashSet<(&'a str, Member<'a>)>,
}

impl<'a> Buckets<'a> {
    /// A medication counts once per bucket however often it carries the key
    fn add(&mut self, key: &'a str, member: Member<'a>, position: usize) {
        if !self.seen.insert((key, member)) {
            return;
        }

        self.members
            .entry(key)
            .or_insert_with(|| {
                self.order.push(key);
                Vec::new()
            })
            .push(position);
    }

    fn into_groups(
        mut self,
        kind: DuplicateKind,
        meds: &[EnrichedMedication],
    ) -> Vec<DuplicateGroup> {
        self.order
            .into_iter()
            .filter_map(|key| {
                let positions = self.members.remove(key)?;
                (positions.len() > 1).then(|| DuplicateGroup {
                    kind,
                    match_key: key.to_string(),
                    medications: positions
                        .into_iter()
                        .map(|position| meds[position].record().clone())
                        .collect(),
                })
            })
            .collect()
    }
}

/// Partition medications into exact and therapeutic duplicate groups.
///
/// Exact groups come first, then therapeutic ones. Within each kind groups
/// follow the first occurrence of their key and members keep input order.
/// A medication may sit in several groups. No status filtering happens here.
pub fn find_duplicates(meds: &[EnrichedMedication]) -> Vec<DuplicateGroup> {
    let mut by_code = Buckets::default();
    let mut by_class = Buckets::default();

    for (position, med) in meds.iter().enumerate() {
        let member = Member::of(med, position);

        if let Some(code) = med.record().exact_match_code() {
            by_code.add(code, member, position);
        }

        if let Some(classification) = med.classification() {
            for class_name in classification.therapeutic_class_names() {
                by_class.add(class_name, member, position);
            }
        }
    }

    let mut groups = by_code.into_groups(DuplicateKind::Exact, meds);
    groups.extend(by_class.into_groups(DuplicateKind::Therapeutic, meds));

    log::debug!(
        "Found {} duplicate groups among {} medications",
        groups.len(),
        meds.len()
    );
    groups
}
