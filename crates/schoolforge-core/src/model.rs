use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::PASS_MARK;

/// One subject assignment in the curriculum catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub grade: u8,
    pub semester: u8,
    pub subject: String,
    pub is_mandatory: bool,
    pub min_marks: u8,
    pub max_marks: u8,
}

impl CatalogEntry {
    pub const HEADER: &'static [&'static str] = &[
        "grade",
        "semester",
        "subject",
        "is_mandatory",
        "min_marks",
        "max_marks",
    ];

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.grade.to_string(),
            self.semester.to_string(),
            self.subject.clone(),
            self.is_mandatory.to_string(),
            self.min_marks.to_string(),
            self.max_marks.to_string(),
        ]
    }
}

/// Immutable student identity.
///
/// The birthdate may be back-filled once at enrollment time to match the
/// assigned starting grade; the id keeps the originally drawn birth year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentIdentity {
    pub student_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub birthdate: NaiveDate,
}

/// How a student entered the school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    #[serde(rename = "new")]
    New,
    #[serde(rename = "transfer-in")]
    TransferIn,
}

impl std::fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnrollmentStatus::New => f.write_str("new"),
            EnrollmentStatus::TransferIn => f.write_str("transfer-in"),
        }
    }
}

/// Immutable enrollment record, one per student per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    pub student_id: i64,
    pub enrollment_id: i64,
    pub enrollment_status: EnrollmentStatus,
    pub enrollment_year: i32,
    pub starting_grade: u8,
    pub starting_class: String,
}

/// Identity and enrollment merged for the `students` output table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRow {
    pub student_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub birthdate: NaiveDate,
    pub enrollment_id: i64,
    pub enrollment_status: EnrollmentStatus,
    pub enrollment_year: i32,
    pub starting_grade: u8,
    pub starting_class: String,
}

impl StudentRow {
    pub const HEADER: &'static [&'static str] = &[
        "student_id",
        "first_name",
        "last_name",
        "birthdate",
        "enrollment_id",
        "enrollment_status",
        "enrollment_year",
        "starting_grade",
        "starting_class",
    ];

    pub fn merge(identity: &StudentIdentity, enrollment: &EnrollmentRecord) -> Self {
        Self {
            student_id: identity.student_id,
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            birthdate: identity.birthdate,
            enrollment_id: enrollment.enrollment_id,
            enrollment_status: enrollment.enrollment_status,
            enrollment_year: enrollment.enrollment_year,
            starting_grade: enrollment.starting_grade,
            starting_class: enrollment.starting_class.clone(),
        }
    }

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.student_id.to_string(),
            self.first_name.clone(),
            self.last_name.clone(),
            self.birthdate.format("%Y-%m-%d").to_string(),
            self.enrollment_id.to_string(),
            self.enrollment_status.to_string(),
            self.enrollment_year.to_string(),
            self.starting_grade.to_string(),
            self.starting_class.clone(),
        ]
    }
}

/// Marks and aggregate for one assessment period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemesterOutcome {
    pub subjects: Vec<String>,
    pub marks: Vec<u32>,
    pub percentage: f64,
}

impl SemesterOutcome {
    fn subjects_cell(&self) -> String {
        self.subjects.join("; ")
    }

    fn marks_cell(&self) -> String {
        self.marks
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// One student's results for one academic year. Append-only.
///
/// The semester-2 block is absent when the semester-1 percentage fell below
/// the pass mark; the conditional is modeled explicitly, never inferred from
/// empty columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicRecord {
    pub academic_year: i32,
    pub enrollment_id: i64,
    pub grade: u8,
    pub class: String,
    pub semester1: SemesterOutcome,
    pub semester2: Option<SemesterOutcome>,
    pub year_percentage: f64,
    pub projected_grade: u8,
    pub projected_class: String,
}

impl AcademicRecord {
    pub const HEADER: &'static [&'static str] = &[
        "academic_year",
        "enrollment_id",
        "grade",
        "class",
        "sem1_subjects",
        "sem1_scores",
        "sem1_percentage",
        "sem2_subjects",
        "sem2_scores",
        "sem2_percentage",
        "year_percentage",
        "projected_grade",
        "projected_class",
    ];

    pub fn to_row(&self) -> Vec<String> {
        let (sem2_subjects, sem2_scores, sem2_pct) = match &self.semester2 {
            Some(sem2) => (
                sem2.subjects_cell(),
                sem2.marks_cell(),
                format!("{:.2}", sem2.percentage),
            ),
            None => (String::new(), String::new(), String::new()),
        };
        vec![
            self.academic_year.to_string(),
            self.enrollment_id.to_string(),
            self.grade.to_string(),
            self.class.clone(),
            self.semester1.subjects_cell(),
            self.semester1.marks_cell(),
            format!("{:.2}", self.semester1.percentage),
            sem2_subjects,
            sem2_scores,
            sem2_pct,
            format!("{:.2}", self.year_percentage),
            self.projected_grade.to_string(),
            self.projected_class.clone(),
        ]
    }
}

/// Terminal snapshot for a student who passed the final grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraduateRecord {
    pub enrollment_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub final_pct: f64,
    pub age: i32,
    pub graduation_year: i32,
}

impl GraduateRecord {
    pub const HEADER: &'static [&'static str] = &[
        "enrollment_id",
        "first_name",
        "last_name",
        "final_pct",
        "age",
        "graduation_year",
    ];

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.enrollment_id.to_string(),
            self.first_name.clone(),
            self.last_name.clone(),
            format!("{:.2}", self.final_pct),
            self.age.to_string(),
            self.graduation_year.to_string(),
        ]
    }
}

/// Terminal snapshot for a student removed after repeated failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminatedRecord {
    pub enrollment_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub grade: u8,
    pub academic_year: i32,
    pub reason: String,
}

impl TerminatedRecord {
    pub const HEADER: &'static [&'static str] = &[
        "enrollment_id",
        "first_name",
        "last_name",
        "grade",
        "academic_year",
        "reason",
    ];

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.enrollment_id.to_string(),
            self.first_name.clone(),
            self.last_name.clone(),
            self.grade.to_string(),
            self.academic_year.to_string(),
            self.reason.clone(),
        ]
    }
}

/// The five output tables of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolDataset {
    pub catalog: Vec<CatalogEntry>,
    pub students: Vec<StudentRow>,
    pub academics: Vec<AcademicRecord>,
    pub graduates: Vec<GraduateRecord>,
    pub terminated: Vec<TerminatedRecord>,
}

/// One ability tier within a grade.
#[derive(Debug, Clone, PartialEq)]
pub struct Tier {
    pub label: String,
    /// Minimum percentage that places a student in this tier.
    pub placement_floor: f64,
    /// Minimum percentage required to occupy the tier during rebalancing;
    /// the bottom tier has no floor.
    pub occupancy_floor: Option<f64>,
}

/// Ordered class tiers, highest first, with their qualifying thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct TierTable {
    tiers: Vec<Tier>,
}

impl TierTable {
    /// Build a tier table for the first `count` class labels (A, B, ...).
    ///
    /// Four labels use the canonical 90/70/55 placement floors; other
    /// cardinalities interpolate the non-bottom floors linearly from 90
    /// down to 55.
    pub fn with_labels(count: u8) -> Self {
        let count = count.clamp(1, 26) as usize;
        let floors: Vec<f64> = if count == 4 {
            vec![90.0, 70.0, 55.0]
        } else if count <= 2 {
            vec![90.0; count - 1]
        } else {
            (0..count - 1)
                .map(|i| 90.0 - (90.0 - 55.0) * i as f64 / (count - 2) as f64)
                .collect()
        };

        let tiers = (0..count)
            .map(|i| {
                let label = char::from(b'A' + i as u8).to_string();
                if i == count - 1 {
                    Tier {
                        label,
                        placement_floor: 0.0,
                        occupancy_floor: None,
                    }
                } else {
                    Tier {
                        label,
                        placement_floor: floors[i],
                        occupancy_floor: Some(PASS_MARK),
                    }
                }
            })
            .collect();

        Self { tiers }
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn label(&self, tier: usize) -> &str {
        &self.tiers[tier].label
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.tiers.iter().map(|tier| tier.label.as_str())
    }

    /// Index of the lowest tier.
    pub fn bottom(&self) -> usize {
        self.tiers.len() - 1
    }

    /// Tier a percentage earns on its own merit.
    pub fn placement(&self, percentage: f64) -> usize {
        self.tiers
            .iter()
            .position(|tier| percentage >= tier.placement_floor)
            .unwrap_or(self.bottom())
    }

    /// Whether a percentage qualifies to occupy `target` during a
    /// capacity fill. Non-top tiers are capped below the placement floor
    /// of the tier above them.
    pub fn can_occupy(&self, percentage: f64, target: usize) -> bool {
        let tier = &self.tiers[target];
        if let Some(floor) = tier.occupancy_floor
            && percentage < floor
        {
            return false;
        }
        if target > 0 && percentage >= self.tiers[target - 1].placement_floor {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_tier_placement_matches_thresholds() {
        let tiers = TierTable::with_labels(4);
        assert_eq!(tiers.label(tiers.placement(95.0)), "A");
        assert_eq!(tiers.label(tiers.placement(90.0)), "A");
        assert_eq!(tiers.label(tiers.placement(70.0)), "B");
        assert_eq!(tiers.label(tiers.placement(55.0)), "C");
        assert_eq!(tiers.label(tiers.placement(54.9)), "D");
        assert_eq!(tiers.label(tiers.placement(0.0)), "D");
    }

    #[test]
    fn occupancy_rules_match_move_eligibility() {
        let tiers = TierTable::with_labels(4);
        // A: >= 30, no upper bound.
        assert!(tiers.can_occupy(30.0, 0));
        assert!(tiers.can_occupy(99.0, 0));
        assert!(!tiers.can_occupy(29.9, 0));
        // B: 30 <= pct < 90.
        assert!(tiers.can_occupy(30.0, 1));
        assert!(!tiers.can_occupy(90.0, 1));
        // C: 30 <= pct < 70.
        assert!(tiers.can_occupy(69.9, 2));
        assert!(!tiers.can_occupy(70.0, 2));
        // D: pct < 55, no lower floor.
        assert!(tiers.can_occupy(0.0, 3));
        assert!(!tiers.can_occupy(55.0, 3));
    }

    #[test]
    fn labels_are_alphabetical_from_a() {
        let tiers = TierTable::with_labels(3);
        assert_eq!(tiers.labels().collect::<Vec<_>>(), vec!["A", "B", "C"]);
        assert_eq!(tiers.bottom(), 2);
    }

    #[test]
    fn enrollment_status_serializes_with_hyphen() {
        let json = serde_json::to_string(&EnrollmentStatus::TransferIn).unwrap();
        assert_eq!(json, "\"transfer-in\"");
        let back: EnrollmentStatus = serde_json::from_str("\"new\"").unwrap();
        assert_eq!(back, EnrollmentStatus::New);
    }

    #[test]
    fn semester_two_cells_are_empty_when_absent() {
        let record = AcademicRecord {
            academic_year: 2020,
            enrollment_id: 20201001,
            grade: 3,
            class: "D".into(),
            semester1: SemesterOutcome {
                subjects: vec!["Mathematics".into(), "English".into()],
                marks: vec![20, 25],
                percentage: 22.5,
            },
            semester2: None,
            year_percentage: 22.5,
            projected_grade: 3,
            projected_class: "D".into(),
        };
        let row = record.to_row();
        assert_eq!(row[4], "Mathematics; English");
        assert_eq!(row[5], "20; 25");
        assert_eq!(row[6], "22.50");
        assert_eq!(&row[7..10], &["", "", ""]);
        assert_eq!(row[10], "22.50");
    }
}
