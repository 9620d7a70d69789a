use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of subjects every grade carries unconditionally.
pub const MANDATORY_SUBJECT_COUNT: usize = 3;

/// Minimum size of the full subject pool.
pub const MIN_SUBJECT_COUNT: usize = 5;

/// Assessment periods per academic year.
pub const SEMESTER_COUNT: u8 = 2;

/// Full configuration for a simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Total student population, kept stable year over year.
    pub population: u32,
    /// Number of grades (1..=grade_count); the last grade graduates.
    pub grade_count: u8,
    /// Class labels per grade (A, B, C, ...).
    pub classes_per_grade: u8,
    /// First simulated academic year.
    pub start_year: i32,
    /// Last simulated academic year (inclusive).
    pub end_year: i32,
    /// Full subject pool taught at the school.
    pub subjects: Vec<String>,
    /// Subjects present in every grade and semester.
    pub mandatory_subjects: Vec<String>,
    /// Optional seed for reproducible runs.
    pub seed: Option<u64>,
}

/// Per-grade and per-class headcounts derived from the population.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudentDistribution {
    pub per_grade: u32,
    pub per_class: u32,
}

impl SimulationConfig {
    /// Validate the configuration and derive the student distribution.
    ///
    /// Every violation here is fatal and must surface before the year loop
    /// starts; nothing is silently coerced.
    pub fn validate(&self) -> Result<StudentDistribution> {
        if self.grade_count == 0 {
            return Err(Error::InvalidConfig("grade count must be at least 1".into()));
        }
        if self.classes_per_grade == 0 || self.classes_per_grade > 26 {
            return Err(Error::InvalidConfig(
                "classes per grade must be between 1 and 26".into(),
            ));
        }
        if self.end_year < self.start_year {
            return Err(Error::InvalidConfig(format!(
                "end year {} precedes start year {}",
                self.end_year, self.start_year
            )));
        }

        let (per_grade, per_class) = calculate_student_distribution(
            self.population,
            u32::from(self.grade_count),
            u32::from(self.classes_per_grade),
        )?;

        if self.subjects.len() < MIN_SUBJECT_COUNT {
            return Err(Error::InvalidConfig(format!(
                "at least {MIN_SUBJECT_COUNT} subjects required, got {}",
                self.subjects.len()
            )));
        }
        if has_duplicates(&self.subjects) {
            return Err(Error::InvalidConfig("subject names must be distinct".into()));
        }
        if self.mandatory_subjects.len() != MANDATORY_SUBJECT_COUNT {
            return Err(Error::InvalidConfig(format!(
                "exactly {MANDATORY_SUBJECT_COUNT} mandatory subjects required, got {}",
                self.mandatory_subjects.len()
            )));
        }
        if has_duplicates(&self.mandatory_subjects) {
            return Err(Error::InvalidConfig(
                "mandatory subjects must be distinct".into(),
            ));
        }
        for subject in &self.mandatory_subjects {
            if !self.subjects.contains(subject) {
                return Err(Error::InvalidConfig(format!(
                    "mandatory subject '{subject}' is not in the subject pool"
                )));
            }
        }

        // Worst case every student shares one birth or enrollment year, so
        // the per-year sequence must fit under the id multiplier.
        let multiplier = id_multiplier(self.population);
        if i64::from(self.population) >= multiplier {
            return Err(Error::InvalidConfig(format!(
                "population {} exceeds the id sequence capacity {multiplier}",
                self.population
            )));
        }

        Ok(StudentDistribution {
            per_grade,
            per_class,
        })
    }
}

/// Split a population into equal grade and class cohorts.
///
/// Fails when the population does not divide evenly; uneven rosters are a
/// configuration error, not something to round away.
pub fn calculate_student_distribution(
    total_students: u32,
    total_grades: u32,
    total_classes: u32,
) -> Result<(u32, u32)> {
    if total_grades == 0 || total_classes == 0 {
        return Err(Error::InvalidConfig(
            "grade and class counts must be non-zero".into(),
        ));
    }
    if total_students % total_grades != 0 {
        return Err(Error::InvalidConfig(format!(
            "total students {total_students} must be divisible by number of grades {total_grades}"
        )));
    }
    let per_grade = total_students / total_grades;
    if per_grade % total_classes != 0 {
        return Err(Error::InvalidConfig(format!(
            "students per grade {per_grade} must be divisible by number of classes {total_classes}"
        )));
    }
    Ok((per_grade, per_grade / total_classes))
}

/// Multiplier separating the year component of an id from its sequence.
///
/// One consistent scheme for the whole run: 10_000 for populations of 1000
/// or more, 1_000 otherwise. `SimulationConfig::validate` rejects
/// populations that could overflow a year's sequence space.
pub fn id_multiplier(population: u32) -> i64 {
    if population >= 1000 { 10_000 } else { 1_000 }
}

fn has_duplicates(values: &[String]) -> bool {
    let mut seen = std::collections::BTreeSet::new();
    values.iter().any(|value| !seen.insert(value.as_str()))
}
