use std::collections::HashMap;

use chrono::Datelike;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use schoolforge_core::config::SEMESTER_COUNT;
use schoolforge_core::{
    AcademicRecord, EnrollmentRecord, EnrollmentStatus, GraduateRecord, PASS_MARK, SchoolDataset,
    SimulationConfig, StudentDistribution, StudentIdentity, StudentRow, TerminatedRecord,
    TierTable, id_multiplier,
};

use crate::balance::rebalance;
use crate::curriculum::{build_catalog, subjects_for};
use crate::errors::SimulationError;
use crate::identity::{IdentityGenerator, backfill_birthdate};
use crate::performance::{YearPerformance, sample_year};
use crate::seed::hash_seed;

/// Consecutive failed years before a student is removed.
pub const MAX_CONSECUTIVE_FAILS: u8 = 3;

/// Working row for one enrolled student during the simulation.
///
/// Mutated once per simulated year; the immutable identity and enrollment
/// records live outside. `terminated` flips to true exactly once and is
/// permanent.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveStudent {
    pub student_id: i64,
    pub enrollment_id: i64,
    pub enrollment_year: i32,
    pub first_name: String,
    pub last_name: String,
    pub birth_year: i32,
    pub grade: u8,
    /// Tier index into the run's [`TierTable`], 0 = highest.
    pub class: usize,
    pub year_percentage: Option<f64>,
    pub fail_count: u8,
    pub terminated: bool,
}

impl LiveStudent {
    fn enroll(identity: &StudentIdentity, enrollment: &EnrollmentRecord, class: usize) -> Self {
        Self {
            student_id: identity.student_id,
            enrollment_id: enrollment.enrollment_id,
            enrollment_year: enrollment.enrollment_year,
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            birth_year: identity.birthdate.year(),
            grade: enrollment.starting_grade,
            class,
            year_percentage: None,
            fail_count: 0,
            terminated: false,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Lifecycle outcome of one simulated year for one student.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Promoted,
    Graduated,
    Repeating,
    Terminated,
}

/// Apply the year's aggregate percentage to a student's lifecycle state.
///
/// Passing the final grade graduates; passing any other grade promotes and
/// resets the fail count; failing repeats the grade with the class forced
/// to the bottom tier, and a third consecutive failure terminates.
pub fn apply_year_outcome(
    student: &mut LiveStudent,
    percentage: f64,
    max_grade: u8,
    tiers: &TierTable,
) -> Transition {
    if percentage >= PASS_MARK {
        if student.grade == max_grade {
            student.terminated = true;
            Transition::Graduated
        } else {
            student.grade += 1;
            student.fail_count = 0;
            Transition::Promoted
        }
    } else {
        student.fail_count += 1;
        student.class = tiers.bottom();
        if student.fail_count >= MAX_CONSECUTIVE_FAILS {
            student.terminated = true;
            Transition::Terminated
        } else {
            Transition::Repeating
        }
    }
}

/// Drives the multi-year simulation for one configuration.
#[derive(Debug, Clone)]
pub struct SimulationEngine {
    config: SimulationConfig,
    distribution: StudentDistribution,
    tiers: TierTable,
}

impl SimulationEngine {
    /// Validate the configuration and prepare an engine.
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        let distribution = config.validate()?;
        let tiers = TierTable::with_labels(config.classes_per_grade);
        Ok(Self {
            config,
            distribution,
            tiers,
        })
    }

    /// Run the full year range and produce the five output tables.
    ///
    /// Years are strictly sequential: rebalancing and replenishment for
    /// year N complete before any sampling for year N+1.
    pub fn run(&self) -> Result<SchoolDataset, SimulationError> {
        let seed = self.config.seed.unwrap_or_else(|| rand::rng().random());
        info!(
            seed,
            population = self.config.population,
            grades = self.config.grade_count,
            classes = self.config.classes_per_grade,
            start_year = self.config.start_year,
            end_year = self.config.end_year,
            "simulation started"
        );

        let mut setup_rng = ChaCha8Rng::seed_from_u64(hash_seed(seed, "setup"));
        let mut identities = IdentityGenerator::new(id_multiplier(self.config.population));

        let catalog = build_catalog(
            &self.config.subjects,
            &self.config.mandatory_subjects,
            self.config.grade_count,
            SEMESTER_COUNT,
            &mut setup_rng,
        )?;

        let mut enrolled: Vec<(StudentIdentity, EnrollmentRecord)> = Vec::new();
        let mut roster: Vec<LiveStudent> = Vec::new();
        self.enroll_initial_cohort(&mut identities, &mut setup_rng, &mut enrolled, &mut roster)?;

        let mut academics: Vec<AcademicRecord> = Vec::new();
        let mut graduates: Vec<GraduateRecord> = Vec::new();
        let mut terminated: Vec<TerminatedRecord> = Vec::new();

        for year in self.config.start_year..=self.config.end_year {
            let mut rng = ChaCha8Rng::seed_from_u64(hash_seed(seed, &format!("year.{year}")));
            let active = active_indices(&roster, year);
            info!(year, active = active.len(), "simulating academic year");

            // Phase 1: sample both semesters for every active student.
            let mut outcomes: HashMap<i64, YearPerformance> = HashMap::new();
            for &idx in &active {
                let student = &mut roster[idx];
                let sem1 = subjects_for(&catalog, student.grade, 1);
                let sem2 = subjects_for(&catalog, student.grade, 2);
                let performance = sample_year(&sem1, &sem2, &mut rng);
                student.year_percentage = Some(performance.aggregate);
                outcomes.insert(student.enrollment_id, performance);
            }

            // Phase 2: rebalance each grade cohort to class capacity.
            for grade in 1..=self.config.grade_count {
                let cohort: Vec<usize> = active
                    .iter()
                    .copied()
                    .filter(|&idx| roster[idx].grade == grade)
                    .collect();
                if !cohort.is_empty() {
                    rebalance(
                        &mut roster,
                        &cohort,
                        self.distribution.per_class as usize,
                        &self.tiers,
                    );
                }
            }

            // Phase 3: append the year's academic records.
            for &idx in &active {
                let student = &roster[idx];
                let Some(performance) = outcomes.remove(&student.enrollment_id) else {
                    continue;
                };
                let promoted_next =
                    performance.aggregate >= PASS_MARK && student.grade < self.config.grade_count;
                academics.push(AcademicRecord {
                    academic_year: year,
                    enrollment_id: student.enrollment_id,
                    grade: student.grade,
                    class: self.tiers.label(student.class).to_string(),
                    year_percentage: performance.aggregate,
                    projected_grade: if promoted_next {
                        student.grade + 1
                    } else {
                        student.grade
                    },
                    projected_class: self
                        .tiers
                        .label(self.tiers.placement(performance.aggregate))
                        .to_string(),
                    semester1: performance.semester1,
                    semester2: performance.semester2,
                });
            }

            // Phase 4: lifecycle transitions.
            let mut leavers = 0u32;
            for &idx in &active {
                let percentage = roster[idx].year_percentage.unwrap_or(0.0);
                let transition = apply_year_outcome(
                    &mut roster[idx],
                    percentage,
                    self.config.grade_count,
                    &self.tiers,
                );
                let student = &roster[idx];
                match transition {
                    Transition::Graduated => {
                        graduates.push(GraduateRecord {
                            enrollment_id: student.enrollment_id,
                            first_name: student.first_name.clone(),
                            last_name: student.last_name.clone(),
                            final_pct: percentage,
                            age: year - student.birth_year,
                            graduation_year: year,
                        });
                        leavers += 1;
                    }
                    Transition::Terminated => {
                        terminated.push(TerminatedRecord {
                            enrollment_id: student.enrollment_id,
                            first_name: student.first_name.clone(),
                            last_name: student.last_name.clone(),
                            grade: student.grade,
                            academic_year: year,
                            reason: format!(
                                "Failed {}× in Grade {}",
                                student.fail_count, student.grade
                            ),
                        });
                        leavers += 1;
                    }
                    Transition::Promoted | Transition::Repeating => {}
                }
            }

            info!(
                year,
                leavers,
                graduates_total = graduates.len(),
                terminated_total = terminated.len(),
                "academic year complete"
            );

            // Phase 5: replenish the population for the next year.
            if leavers > 0 && year < self.config.end_year {
                self.enroll_replacements(
                    leavers,
                    year + 1,
                    &mut identities,
                    &mut rng,
                    &mut enrolled,
                    &mut roster,
                )?;
            }
        }

        let students = enrolled
            .iter()
            .map(|(identity, enrollment)| StudentRow::merge(identity, enrollment))
            .collect();

        Ok(SchoolDataset {
            catalog,
            students,
            academics,
            graduates,
            terminated,
        })
    }

    /// Fill every grade and class to capacity for the start year.
    fn enroll_initial_cohort(
        &self,
        identities: &mut IdentityGenerator,
        rng: &mut ChaCha8Rng,
        enrolled: &mut Vec<(StudentIdentity, EnrollmentRecord)>,
        roster: &mut Vec<LiveStudent>,
    ) -> Result<(), SimulationError> {
        let start = self.config.start_year;
        for grade in 1..=self.config.grade_count {
            for class in 0..self.tiers.len() {
                for _ in 0..self.distribution.per_class {
                    let mut identity = identities.new_student(start - 10..=start - 2, rng)?;
                    let (status, birth_year) = if grade == 1 {
                        if rng.random_bool(0.5) {
                            (EnrollmentStatus::New, start - 2)
                        } else {
                            (EnrollmentStatus::TransferIn, start - 3)
                        }
                    } else {
                        (EnrollmentStatus::TransferIn, start - (i32::from(grade) + 2))
                    };
                    backfill_birthdate(&mut identity, birth_year, rng);

                    let enrollment = EnrollmentRecord {
                        student_id: identity.student_id,
                        enrollment_id: identities.new_enrollment_id(start)?,
                        enrollment_status: status,
                        enrollment_year: start,
                        starting_grade: grade,
                        starting_class: self.tiers.label(class).to_string(),
                    };
                    roster.push(LiveStudent::enroll(&identity, &enrollment, class));
                    enrolled.push((identity, enrollment));
                }
            }
        }
        Ok(())
    }

    /// Mint `count` new grade-1 students enrolling next year, spread evenly
    /// across class labels with the remainder going to the earliest labels.
    fn enroll_replacements(
        &self,
        count: u32,
        enrollment_year: i32,
        identities: &mut IdentityGenerator,
        rng: &mut ChaCha8Rng,
        enrolled: &mut Vec<(StudentIdentity, EnrollmentRecord)>,
        roster: &mut Vec<LiveStudent>,
    ) -> Result<(), SimulationError> {
        let classes = self.tiers.len() as u32;
        let per_class = count / classes;
        let remainder = count % classes;
        info!(count, enrollment_year, "replenishing population");

        for class in 0..self.tiers.len() {
            let class_count = per_class + u32::from((class as u32) < remainder);
            for _ in 0..class_count {
                let birth_year = enrollment_year - 2;
                let identity = identities.new_student(birth_year..=birth_year, rng)?;
                let enrollment = EnrollmentRecord {
                    student_id: identity.student_id,
                    enrollment_id: identities.new_enrollment_id(enrollment_year)?,
                    enrollment_status: EnrollmentStatus::New,
                    enrollment_year,
                    starting_grade: 1,
                    starting_class: self.tiers.label(class).to_string(),
                };
                roster.push(LiveStudent::enroll(&identity, &enrollment, class));
                enrolled.push((identity, enrollment));
            }
        }
        Ok(())
    }
}

/// Indices of students active in the given year: not terminated and
/// already enrolled (`enrollment_year <= year`).
fn active_indices(roster: &[LiveStudent], year: i32) -> Vec<usize> {
    roster
        .iter()
        .enumerate()
        .filter(|(_, student)| !student.terminated && student.enrollment_year <= year)
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(grade: u8) -> LiveStudent {
        LiveStudent {
            student_id: 20101001,
            enrollment_id: 20181001,
            enrollment_year: 2018,
            first_name: "Ada".into(),
            last_name: "Gray".into(),
            birth_year: 2010,
            grade,
            class: 1,
            year_percentage: None,
            fail_count: 0,
            terminated: false,
        }
    }

    #[test]
    fn passing_a_middle_grade_promotes_and_resets_fails() {
        let tiers = TierTable::with_labels(4);
        let mut s = student(3);
        s.fail_count = 2;
        assert_eq!(apply_year_outcome(&mut s, 60.0, 8, &tiers), Transition::Promoted);
        assert_eq!(s.grade, 4);
        assert_eq!(s.fail_count, 0);
        assert!(!s.terminated);
    }

    #[test]
    fn failing_forces_bottom_class_and_repeats() {
        let tiers = TierTable::with_labels(4);
        let mut s = student(3);
        assert_eq!(apply_year_outcome(&mut s, 25.0, 8, &tiers), Transition::Repeating);
        assert_eq!(s.grade, 3);
        assert_eq!(s.fail_count, 1);
        assert_eq!(s.class, tiers.bottom());
    }

    #[test]
    fn third_consecutive_failure_terminates() {
        let tiers = TierTable::with_labels(4);
        let mut s = student(5);
        assert_eq!(apply_year_outcome(&mut s, 10.0, 8, &tiers), Transition::Repeating);
        assert_eq!(apply_year_outcome(&mut s, 12.0, 8, &tiers), Transition::Repeating);
        assert_eq!(apply_year_outcome(&mut s, 14.0, 8, &tiers), Transition::Terminated);
        assert_eq!(s.fail_count, MAX_CONSECUTIVE_FAILS);
        assert!(s.terminated);
    }

    #[test]
    fn final_grade_pass_boundary_graduates() {
        let tiers = TierTable::with_labels(4);
        let mut s = student(8);
        assert_eq!(apply_year_outcome(&mut s, 30.0, 8, &tiers), Transition::Graduated);
        assert!(s.terminated);
    }

    #[test]
    fn final_grade_failure_repeats_not_graduates() {
        let tiers = TierTable::with_labels(4);
        let mut s = student(8);
        assert_eq!(apply_year_outcome(&mut s, 29.99, 8, &tiers), Transition::Repeating);
        assert_eq!(s.grade, 8);
    }
}
