use schoolforge_core::TierTable;

use crate::progression::LiveStudent;

/// Default percentage used when a student has no sampled score yet.
const NEUTRAL_PCT: f64 = 50.0;

/// Rebalance one grade cohort toward `target_per_class` students per tier.
///
/// Step 1 places every student in the tier their percentage earns. Step 2
/// walks the tiers in priority order and fills under-capacity tiers by
/// pulling qualified students up from lower tiers, ordered by full name,
/// case-insensitive. Students are never pushed below their earned tier;
/// a tier short of eligible candidates simply stays under capacity.
pub fn rebalance(
    students: &mut [LiveStudent],
    cohort: &[usize],
    target_per_class: usize,
    tiers: &TierTable,
) {
    for &idx in cohort {
        let pct = students[idx].year_percentage.unwrap_or(NEUTRAL_PCT);
        students[idx].class = tiers.placement(pct);
    }

    for target in 0..tiers.len() {
        let current = cohort
            .iter()
            .filter(|&&idx| students[idx].class == target)
            .count();
        let needed = target_per_class.saturating_sub(current);
        if needed == 0 {
            continue;
        }

        let mut eligible: Vec<(String, usize)> = cohort
            .iter()
            .copied()
            .filter(|&idx| {
                let student = &students[idx];
                student.class > target
                    && tiers.can_occupy(student.year_percentage.unwrap_or(NEUTRAL_PCT), target)
            })
            .map(|idx| (students[idx].full_name().to_lowercase(), idx))
            .collect();
        eligible.sort();

        for (_, idx) in eligible.into_iter().take(needed) {
            students[idx].class = target;
        }
    }
}
