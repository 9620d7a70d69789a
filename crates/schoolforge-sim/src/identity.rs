use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use chrono::NaiveDate;
use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use rand::Rng;

use schoolforge_core::StudentIdentity;

use crate::errors::SimulationError;

/// Mints unique student and enrollment identities.
///
/// Ids are `year * multiplier + sequence` with one sequence counter per
/// year, so ids stay sortable by year and collision-free. A sequence that
/// would spill into the next year's id space is a configuration error,
/// never a silent collision.
#[derive(Debug)]
pub struct IdentityGenerator {
    multiplier: i64,
    birth_seq: BTreeMap<i32, i64>,
    enrollment_seq: BTreeMap<i32, i64>,
}

impl IdentityGenerator {
    pub fn new(multiplier: i64) -> Self {
        Self {
            multiplier,
            birth_seq: BTreeMap::new(),
            enrollment_seq: BTreeMap::new(),
        }
    }

    /// Draw a fresh identity with a birthdate uniform in `birth_years`.
    pub fn new_student(
        &mut self,
        birth_years: RangeInclusive<i32>,
        rng: &mut impl Rng,
    ) -> Result<StudentIdentity, SimulationError> {
        let year = rng.random_range(birth_years);
        let student_id = next_in_year(&mut self.birth_seq, year, self.multiplier)?;
        Ok(StudentIdentity {
            student_id,
            first_name: FirstName().fake_with_rng(rng),
            last_name: LastName().fake_with_rng(rng),
            birthdate: random_date_in_year(year, rng),
        })
    }

    /// Mint an enrollment id scoped to the enrollment year.
    pub fn new_enrollment_id(&mut self, enrollment_year: i32) -> Result<i64, SimulationError> {
        next_in_year(&mut self.enrollment_seq, enrollment_year, self.multiplier)
    }
}

fn next_in_year(
    sequences: &mut BTreeMap<i32, i64>,
    year: i32,
    multiplier: i64,
) -> Result<i64, SimulationError> {
    let seq = sequences.entry(year).or_insert(0);
    *seq += 1;
    if *seq >= multiplier {
        return Err(SimulationError::IdSpaceExhausted(format!(
            "sequence for year {year} reached the id multiplier {multiplier}"
        )));
    }
    Ok(i64::from(year) * multiplier + *seq)
}

/// Uniform date within a year. Days cap at 28 so every month is valid.
pub fn random_date_in_year(year: i32, rng: &mut impl Rng) -> NaiveDate {
    let month = rng.random_range(1..=12);
    let day = rng.random_range(1..=28);
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

/// Back-fill a birthdate so the identity matches its assigned starting
/// grade. The student id keeps the originally drawn birth year.
pub fn backfill_birthdate(identity: &mut StudentIdentity, birth_year: i32, rng: &mut impl Rng) {
    identity.birthdate = random_date_in_year(birth_year, rng);
}
