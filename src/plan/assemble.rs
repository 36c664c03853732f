//! Merging per-faculty results and pruning empty branches

use crate::plan::{Curriculum, Faculty};

/// What a pruning pass removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub programs: usize,
    pub program_types: usize,
    pub faculties: usize,
}

impl PruneReport {
    pub fn is_empty(&self) -> bool {
        self.programs == 0 && self.program_types == 0 && self.faculties == 0
    }
}

/// Merges worker results into one tree ordered like `faculty_names`, then prunes it
///
/// `results` pairs each faculty with its index in `faculty_names`. Faculties
/// that never produced a result (a worker died before finishing) are recorded
/// empty and disappear during pruning.
pub fn assemble(
    faculty_names: &[String],
    results: impl IntoIterator<Item = (usize, Faculty)>,
) -> (Curriculum, PruneReport) {
    let mut slots: Vec<Option<Faculty>> = vec![None; faculty_names.len()];

    for (index, faculty) in results {
        match slots.get_mut(index) {
            Some(slot) => {
                if slot.is_some() {
                    tracing::warn!("Faculty \"{}\" was reported twice, keeping the last result", faculty.name);
                }
                *slot = Some(faculty);
            }
            None => {
                tracing::warn!(
                    "Dropping result for \"{}\": index {} is outside the faculty list",
                    faculty.name,
                    index
                );
            }
        }
    }

    let faculties = slots
        .into_iter()
        .zip(faculty_names)
        .map(|(slot, name)| slot.unwrap_or_else(|| Faculty::new(name.as_str())))
        .collect();

    let mut curriculum = Curriculum { faculties };
    let report = prune(&mut curriculum);
    (curriculum, report)
}

/// Removes empty branches bottom-up
///
/// Programs without iterations go first, then program types left without
/// programs, then faculties left without program types. Running it again on
/// its own output removes nothing.
pub fn prune(curriculum: &mut Curriculum) -> PruneReport {
    let mut report = PruneReport::default();

    for faculty in &mut curriculum.faculties {
        for program_type in &mut faculty.program_types {
            let before = program_type.programs.len();
            program_type.programs.retain(|p| !p.iterations.is_empty());
            report.programs += before - program_type.programs.len();
        }

        faculty.program_types.retain(|program_type| {
            let keep = !program_type.programs.is_empty();
            if !keep {
                tracing::info!("Removing: \"{}\"/\"{}\"", faculty.name, program_type.name);
                report.program_types += 1;
            }
            keep
        });
    }

    curriculum.faculties.retain(|faculty| {
        let keep = !faculty.is_empty();
        if !keep {
            tracing::info!("Removing: \"{}\"", faculty.name);
            report.faculties += 1;
        }
        keep
    });

    report
}
