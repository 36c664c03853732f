//! The course plan text format
//!
//! ```text
//! # <Faculty>
//! ## <Program name> (<Variant>)
//! ### <Iteration label>
//! <semester 1 slots joined with '='>
//! ...
//! <semester 8>
//! ```
//!
//! Plain slots are bare course codes and electives are
//! `[<Title>*(<code>|<code>)]`. Iterations with fewer than eight semesters
//! are padded with blank lines. Failed iterations are not written.

use crate::output::{OutputError, OutputResult};
use crate::plan::{
    split_program_key, CourseSlot, Curriculum, Faculty, Iteration, IterationPlan, Program, Semester,
};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Semester lines every iteration occupies at minimum
pub const SEMESTER_LINES: usize = 8;

/// Serializes the tree into the course plan format
pub fn format_curriculum(curriculum: &Curriculum) -> String {
    let mut out = String::new();

    for faculty in &curriculum.faculties {
        let programs: Vec<(&Program, Vec<&Iteration>)> = faculty
            .programs()
            .filter_map(|program| {
                let iterations = writable_iterations(faculty, program);
                (!iterations.is_empty()).then_some((program, iterations))
            })
            .collect();
        if programs.is_empty() {
            tracing::warn!("Skipping \"{}\": every iteration failed", faculty.name);
            continue;
        }

        out.push_str(&format!("# {}\n", faculty.name));
        for (program, iterations) in programs {
            out.push_str(&format!("## {}\n", program.key));
            for iteration in iterations {
                out.push_str(&format!("### {}\n", iteration.label));
                let semesters = iteration.plan.semesters().unwrap_or_default();
                for semester in semesters {
                    out.push_str(&format_semester(semester));
                    out.push('\n');
                }
                for _ in semesters.len()..SEMESTER_LINES {
                    out.push('\n');
                }
            }
        }
    }

    out
}

fn writable_iterations<'a>(faculty: &Faculty, program: &'a Program) -> Vec<&'a Iteration> {
    program
        .iterations
        .iter()
        .filter(|iteration| {
            if iteration.plan.is_failed() {
                tracing::warn!(
                    "Not writing failed iteration \"{}\" of \"{}\" under \"{}\"",
                    iteration.label,
                    program.key,
                    faculty.name
                );
                return false;
            }
            true
        })
        .collect()
}

/// One semester line, slots joined with `=`
pub fn format_semester(semester: &[CourseSlot]) -> String {
    semester
        .iter()
        .map(|slot| slot.to_string())
        .collect::<Vec<_>>()
        .join("=")
}

/// Writes the course plan file, creating parent directories as needed
pub fn write_curriculum(curriculum: &Curriculum, output_path: &Path) -> OutputResult<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let text = format_curriculum(curriculum);
    let mut file = File::create(output_path)?;
    file.write_all(text.as_bytes())?;

    tracing::info!("Course plans written to {}", output_path.display());
    Ok(())
}

/// Parses the course plan format back into a tree
///
/// The program type level is recovered from the variant in each program
/// key. Trailing blank lines of an iteration are padding and are dropped.
pub fn parse_curriculum(text: &str) -> OutputResult<Curriculum> {
    let mut curriculum = Curriculum::default();
    let mut program: Option<(String, String)> = None;
    let mut iteration: Option<(String, Vec<Semester>)> = None;

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;

        if let Some(name) = line.strip_prefix("### ") {
            flush_iteration(&mut curriculum, &program, iteration.take());
            if program.is_none() {
                return Err(parse_error(line_no, "iteration outside a program"));
            }
            iteration = Some((name.trim().to_string(), Vec::new()));
        } else if let Some(key) = line.strip_prefix("## ") {
            flush_iteration(&mut curriculum, &program, iteration.take());
            if curriculum.faculties.is_empty() {
                return Err(parse_error(line_no, "program outside a faculty"));
            }
            let key = key.trim();
            let variant = split_program_key(key)
                .map(|(_, variant)| variant)
                .ok_or_else(|| parse_error(line_no, format!("program key without a variant: {}", key)))?;
            program = Some((variant.to_string(), key.to_string()));
        } else if let Some(name) = line.strip_prefix("# ") {
            flush_iteration(&mut curriculum, &program, iteration.take());
            program = None;
            curriculum.faculties.push(Faculty::new(name.trim()));
        } else {
            let Some((_, semesters)) = iteration.as_mut() else {
                if line.trim().is_empty() {
                    continue;
                }
                return Err(parse_error(line_no, "semester line outside an iteration"));
            };
            semesters.push(parse_semester(line).map_err(|message| parse_error(line_no, message))?);
        }
    }
    flush_iteration(&mut curriculum, &program, iteration.take());

    Ok(curriculum)
}

fn flush_iteration(
    curriculum: &mut Curriculum,
    program: &Option<(String, String)>,
    iteration: Option<(String, Vec<Semester>)>,
) {
    let (Some((variant, key)), Some((label, mut semesters))) = (program, iteration) else {
        return;
    };
    let Some(faculty) = curriculum.faculties.last_mut() else {
        return;
    };
    while semesters.last().is_some_and(|s| s.is_empty()) {
        semesters.pop();
    }
    faculty
        .program_type_mut(variant)
        .program_mut(key)
        .record(label, IterationPlan::Semesters(semesters));
}

/// Parses one semester line; a blank line is an empty semester
pub fn parse_semester(line: &str) -> Result<Semester, String> {
    if line.trim().is_empty() {
        return Ok(Vec::new());
    }
    split_slots(line).into_iter().map(str::parse::<CourseSlot>).collect()
}

/// Splits on `=` outside of elective brackets
fn split_slots(line: &str) -> Vec<&str> {
    let mut slots = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in line.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '=' if depth == 0 => {
                slots.push(&line[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    slots.push(&line[start..]);
    slots
}

fn parse_error(line: usize, message: impl Into<String>) -> OutputError {
    OutputError::Parse {
        line,
        message: message.into(),
    }
}
