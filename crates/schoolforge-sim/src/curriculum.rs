use rand::Rng;
use rand::seq::index;

use schoolforge_core::CatalogEntry;
use schoolforge_core::config::{MANDATORY_SUBJECT_COUNT, MIN_SUBJECT_COUNT};

use crate::errors::SimulationError;

/// Grades at or above this threshold receive elective subjects.
pub const ELECTIVE_GRADE_FLOOR: u8 = 4;

const MIN_MARKS: u8 = 0;
const MAX_MARKS: u8 = 100;

/// Build the per-grade, per-semester subject catalog.
///
/// Mandatory subjects appear in every grade and semester. Grades at or
/// above [`ELECTIVE_GRADE_FLOOR`] additionally carry 1–2 electives sampled
/// without replacement from the non-mandatory pool, re-sampled
/// independently per grade and semester.
pub fn build_catalog(
    subjects: &[String],
    mandatory: &[String],
    grade_count: u8,
    semester_count: u8,
    rng: &mut impl Rng,
) -> Result<Vec<CatalogEntry>, SimulationError> {
    if subjects.len() < MIN_SUBJECT_COUNT {
        return Err(SimulationError::InvalidConfig(format!(
            "at least {MIN_SUBJECT_COUNT} subjects required, got {}",
            subjects.len()
        )));
    }
    if mandatory.len() != MANDATORY_SUBJECT_COUNT {
        return Err(SimulationError::InvalidConfig(format!(
            "exactly {MANDATORY_SUBJECT_COUNT} mandatory subjects required, got {}",
            mandatory.len()
        )));
    }
    for subject in mandatory {
        if !subjects.contains(subject) {
            return Err(SimulationError::InvalidConfig(format!(
                "mandatory subject '{subject}' is not in the subject pool"
            )));
        }
    }

    let electives_pool: Vec<&String> = subjects
        .iter()
        .filter(|subject| !mandatory.contains(subject))
        .collect();

    let mut entries = Vec::new();
    for grade in 1..=grade_count {
        for semester in 1..=semester_count {
            for subject in mandatory {
                entries.push(entry(grade, semester, subject, true));
            }
            if grade >= ELECTIVE_GRADE_FLOOR && !electives_pool.is_empty() {
                let wanted = rng.random_range(1..=2usize).min(electives_pool.len());
                for idx in index::sample(rng, electives_pool.len(), wanted) {
                    entries.push(entry(grade, semester, electives_pool[idx], false));
                }
            }
        }
    }
    Ok(entries)
}

/// Subject names for one grade and semester, catalog order.
pub fn subjects_for(catalog: &[CatalogEntry], grade: u8, semester: u8) -> Vec<String> {
    catalog
        .iter()
        .filter(|entry| entry.grade == grade && entry.semester == semester)
        .map(|entry| entry.subject.clone())
        .collect()
}

fn entry(grade: u8, semester: u8, subject: &str, is_mandatory: bool) -> CatalogEntry {
    CatalogEntry {
        grade,
        semester,
        subject: subject.to_string(),
        is_mandatory,
        min_marks: MIN_MARKS,
        max_marks: MAX_MARKS,
    }
}
