//! Typed curriculum tree
//!
//! The harvested data is a strict hierarchy:
//! Faculty → ProgramType → Program (composite key) → Iteration → Semester → CourseSlot.
//!
//! Every level keeps insertion order, which for faculties is the order the
//! site lists them in and for everything below is dropdown/listing order.

pub mod assemble;
pub mod label;

pub use assemble::{assemble, prune, PruneReport};
pub use label::{normalize_label, program_key, split_program_key, NormalizedLabel, DEFAULT_ITERATION_LABEL};

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A group of interchangeable course options filling one curriculum slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElectiveGroup {
    pub title: String,
    /// Empty when the elective page used a layout we cannot read
    pub options: Vec<String>,
}

/// One entry in a semester
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseSlot {
    Course(String),
    Elective(ElectiveGroup),
}

impl CourseSlot {
    pub fn elective(title: impl Into<String>, options: Vec<String>) -> Self {
        Self::Elective(ElectiveGroup {
            title: title.into(),
            options,
        })
    }

    /// Course codes this slot can be satisfied with
    pub fn codes(&self) -> Vec<&str> {
        match self {
            Self::Course(code) => vec![code.as_str()],
            Self::Elective(group) => group.options.iter().map(String::as_str).collect(),
        }
    }
}

impl fmt::Display for CourseSlot {
    /// Plain slots are the bare code; electives are `[Title*(A|B|C)]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Course(code) => write!(f, "{}", code),
            Self::Elective(group) => {
                write!(f, "[{}*({})]", group.title, group.options.join("|"))
            }
        }
    }
}

impl FromStr for CourseSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty course slot".to_string());
        }

        if !s.starts_with('[') {
            return Ok(Self::Course(s.to_string()));
        }

        let inner = s
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(")]"))
            .ok_or_else(|| format!("malformed elective slot: {}", s))?;
        let (title, codes) = inner
            .rsplit_once("*(")
            .ok_or_else(|| format!("elective slot without option list: {}", s))?;

        let options = codes
            .split('|')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self::elective(title.trim(), options))
    }
}

/// One semester, slots in page order
pub type Semester = Vec<CourseSlot>;

/// Content of one iteration page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationPlan {
    Semesters(Vec<Semester>),
    /// Every attempt failed; kept so the failure stays visible
    Failed,
}

impl IterationPlan {
    pub fn semesters(&self) -> Option<&[Semester]> {
        match self {
            Self::Semesters(semesters) => Some(semesters),
            Self::Failed => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// A dated revision of a program's curriculum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Iteration {
    pub label: String,
    pub plan: IterationPlan,
}

/// A curriculum track, keyed by `"{name} ({variant})"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub key: String,
    pub iterations: Vec<Iteration>,
}

impl Program {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            iterations: Vec::new(),
        }
    }

    /// Records an iteration, replacing an earlier one with the same label in place
    pub fn record(&mut self, label: impl Into<String>, plan: IterationPlan) {
        let label = label.into();
        match self.iterations.iter_mut().find(|it| it.label == label) {
            Some(existing) => existing.plan = plan,
            None => self.iterations.push(Iteration { label, plan }),
        }
    }

    pub fn iteration(&self, label: &str) -> Option<&Iteration> {
        self.iterations.iter().find(|it| it.label == label)
    }
}

/// A language/variant qualifier under a faculty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramType {
    pub name: String,
    pub programs: Vec<Program>,
}

impl ProgramType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            programs: Vec::new(),
        }
    }

    pub fn program_mut(&mut self, key: &str) -> &mut Program {
        let index = match self.programs.iter().position(|p| p.key == key) {
            Some(index) => index,
            None => {
                self.programs.push(Program::new(key));
                self.programs.len() - 1
            }
        };
        &mut self.programs[index]
    }

    pub fn program(&self, key: &str) -> Option<&Program> {
        self.programs.iter().find(|p| p.key == key)
    }

    /// Normalizes a listing label and records the iteration under its program key
    pub fn record_listing_label(&mut self, raw_label: &str, plan: IterationPlan) {
        let normalized = normalize_label(raw_label);
        let key = program_key(&normalized.program_name, &self.name);
        self.program_mut(&key).record(normalized.iteration_label, plan);
    }
}

/// Top-level entity; the unit of work handed to one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Faculty {
    pub name: String,
    pub program_types: Vec<ProgramType>,
}

impl Faculty {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program_types: Vec::new(),
        }
    }

    pub fn program_type_mut(&mut self, name: &str) -> &mut ProgramType {
        let index = match self.program_types.iter().position(|p| p.name == name) {
            Some(index) => index,
            None => {
                self.program_types.push(ProgramType::new(name));
                self.program_types.len() - 1
            }
        };
        &mut self.program_types[index]
    }

    pub fn program_type(&self, name: &str) -> Option<&ProgramType> {
        self.program_types.iter().find(|p| p.name == name)
    }

    pub fn programs(&self) -> impl Iterator<Item = &Program> {
        self.program_types.iter().flat_map(|pt| pt.programs.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.program_types.is_empty()
    }
}

/// The complete harvested tree, faculties in site order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Curriculum {
    pub faculties: Vec<Faculty>,
}

impl Curriculum {
    pub fn faculty(&self, name: &str) -> Option<&Faculty> {
        self.faculties.iter().find(|f| f.name == name)
    }

    pub fn iteration_count(&self) -> usize {
        self.faculties
            .iter()
            .flat_map(Faculty::programs)
            .map(|p| p.iterations.len())
            .sum()
    }

    /// Every course code referenced anywhere in the tree, sorted and de-duplicated
    pub fn course_codes(&self) -> BTreeSet<String> {
        self.faculties
            .iter()
            .flat_map(Faculty::programs)
            .flat_map(|p| p.iterations.iter())
            .filter_map(|it| it.plan.semesters())
            .flatten()
            .flatten()
            .flat_map(CourseSlot::codes)
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elective_slot_display() {
        let slot = CourseSlot::elective(
            "Seçmeli",
            vec!["HSS 201".to_string(), "MST 261".to_string()],
        );
        assert_eq!(slot.to_string(), "[Seçmeli*(HSS 201|MST 261)]");
    }

    #[test]
    fn test_elective_slot_parses_back() {
        let slot: CourseSlot = "[Seçmeli*(HSS 201|MST 261)]".parse().unwrap();
        assert_eq!(
            slot,
            CourseSlot::elective("Seçmeli", vec!["HSS 201".to_string(), "MST 261".to_string()])
        );
    }

    #[test]
    fn test_empty_elective_slot() {
        let slot = CourseSlot::elective("Teknik Seçmeli", vec![]);
        assert_eq!(slot.to_string(), "[Teknik Seçmeli*()]");

        let parsed: CourseSlot = "[Teknik Seçmeli*()]".parse().unwrap();
        assert_eq!(parsed, slot);
    }

    #[test]
    fn test_plain_slot_parses() {
        let slot: CourseSlot = " MAT 103E ".parse().unwrap();
        assert_eq!(slot, CourseSlot::Course("MAT 103E".to_string()));
        assert!("".parse::<CourseSlot>().is_err());
        assert!("[Broken*(A|B".parse::<CourseSlot>().is_err());
    }

    #[test]
    fn test_record_replaces_same_label() {
        let mut program = Program::new("Fizik (100% İngilizce Program)");
        program.record("2010-2011", IterationPlan::Failed);
        program.record("2021-2022", IterationPlan::Semesters(vec![]));
        program.record("2010-2011", IterationPlan::Semesters(vec![vec![]]));

        assert_eq!(program.iterations.len(), 2);
        assert_eq!(program.iterations[0].label, "2010-2011");
        assert!(!program.iterations[0].plan.is_failed());
    }

    #[test]
    fn test_record_listing_label_groups_by_program_key() {
        let mut program_type = ProgramType::new("100% İngilizce Program");
        program_type.record_listing_label(
            "Fizik Mühendisliği Lisans Programı (%100 İngilizce) 2010-2011 / Güz Dönemi Sonrası",
            IterationPlan::Semesters(vec![]),
        );
        program_type.record_listing_label(
            "Fizik Mühendisliği Lisans Programı (%100 İngilizce) 2021-2022 ve Sonrası",
            IterationPlan::Semesters(vec![]),
        );

        assert_eq!(program_type.programs.len(), 1);
        let program = &program_type.programs[0];
        assert_eq!(
            program.key,
            "Fizik Mühendisliği Lisans Programı (100% İngilizce Program)"
        );
        assert_eq!(program.iterations.len(), 2);
        assert!(program.iteration("2021-2022 ve Sonrası").is_some());
    }

    #[test]
    fn test_course_codes_collects_plain_and_elective() {
        let mut faculty = Faculty::new("Fen - Edebiyat Fakültesi");
        faculty
            .program_type_mut("UOLP")
            .program_mut("Fizik (UOLP)")
            .record(
                "2020",
                IterationPlan::Semesters(vec![
                    vec![
                        CourseSlot::Course("FIZ 101".to_string()),
                        CourseSlot::elective("Seçmeli", vec!["HSS 201".to_string(), "FIZ 101".to_string()]),
                    ],
                    vec![CourseSlot::Course("MAT 103".to_string())],
                ]),
            );
        faculty
            .program_type_mut("UOLP")
            .program_mut("Fizik (UOLP)")
            .record("2010", IterationPlan::Failed);

        let curriculum = Curriculum {
            faculties: vec![faculty],
        };
        let codes: Vec<_> = curriculum.course_codes().into_iter().collect();
        assert_eq!(codes, vec!["FIZ 101", "HSS 201", "MAT 103"]);
        assert_eq!(curriculum.iteration_count(), 2);
    }
}
