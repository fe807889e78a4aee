use serde::Serialize;
use std::fmt;

use crate::calc::{self, Grade};

pub const MIN_MARK: i64 = 0;
pub const MAX_MARK: i64 = 100;

/// A mark assignment outside `[MIN_MARK, MAX_MARK]`. The offending value is
/// kept for reporting; the previous mark is never overwritten by a failed
/// assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkOutOfRange {
    pub value: i64,
}

impl MarkOutOfRange {
    pub fn code(&self) -> &'static str {
        "out_of_range_mark"
    }
}

impl fmt::Display for MarkOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mark {} is outside the valid range {}..={}",
            self.value, MIN_MARK, MAX_MARK
        )
    }
}

impl std::error::Error for MarkOutOfRange {}

/// A validated mark. The only way to obtain one is through `Mark::new`, so a
/// stored mark is always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Mark(u8);

impl Mark {
    pub fn new(value: i64) -> Result<Self, MarkOutOfRange> {
        if !(MIN_MARK..=MAX_MARK).contains(&value) {
            return Err(MarkOutOfRange { value });
        }
        Ok(Mark(value as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnrolmentType {
    Coursework,
    Research,
}

impl EnrolmentType {
    /// One-letter tag used in the roster file format.
    pub fn tag(self) -> &'static str {
        match self {
            EnrolmentType::Coursework => "C",
            EnrolmentType::Research => "R",
        }
    }
}

impl fmt::Display for EnrolmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrolmentType::Coursework => write!(f, "Coursework"),
            EnrolmentType::Research => write!(f, "Research"),
        }
    }
}

/// Assessment data for a coursework enrolment: one unit with two assignments
/// and a final exam.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseworkUnit {
    pub unit_id: String,
    pub level: i64,
    assignment1: Mark,
    assignment2: Mark,
    final_exam: Mark,
}

impl CourseworkUnit {
    pub fn new(
        unit_id: impl Into<String>,
        level: i64,
        assignment1: i64,
        assignment2: i64,
        final_exam: i64,
    ) -> Result<Self, MarkOutOfRange> {
        Ok(Self {
            unit_id: unit_id.into(),
            level,
            assignment1: Mark::new(assignment1)?,
            assignment2: Mark::new(assignment2)?,
            final_exam: Mark::new(final_exam)?,
        })
    }

    pub fn assignment1(&self) -> Mark {
        self.assignment1
    }

    pub fn assignment2(&self) -> Mark {
        self.assignment2
    }

    pub fn final_exam(&self) -> Mark {
        self.final_exam
    }

    pub fn set_assignment1(&mut self, value: i64) -> Result<(), MarkOutOfRange> {
        self.assignment1 = Mark::new(value)?;
        Ok(())
    }

    pub fn set_assignment2(&mut self, value: i64) -> Result<(), MarkOutOfRange> {
        self.assignment2 = Mark::new(value)?;
        Ok(())
    }

    pub fn set_final_exam(&mut self, value: i64) -> Result<(), MarkOutOfRange> {
        self.final_exam = Mark::new(value)?;
        Ok(())
    }

    pub fn overall_score(&self) -> f64 {
        calc::coursework_overall(
            self.assignment1.value(),
            self.assignment2.value(),
            self.final_exam.value(),
        )
    }
}

/// Assessment data for a research enrolment: proposal plus dissertation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchUnit {
    proposal: Mark,
    dissertation: Mark,
}

impl ResearchUnit {
    pub fn new(proposal: i64, dissertation: i64) -> Result<Self, MarkOutOfRange> {
        Ok(Self {
            proposal: Mark::new(proposal)?,
            dissertation: Mark::new(dissertation)?,
        })
    }

    pub fn proposal(&self) -> Mark {
        self.proposal
    }

    pub fn dissertation(&self) -> Mark {
        self.dissertation
    }

    pub fn set_proposal(&mut self, value: i64) -> Result<(), MarkOutOfRange> {
        self.proposal = Mark::new(value)?;
        Ok(())
    }

    pub fn set_dissertation(&mut self, value: i64) -> Result<(), MarkOutOfRange> {
        self.dissertation = Mark::new(value)?;
        Ok(())
    }

    pub fn overall_score(&self) -> f64 {
        calc::research_overall(self.proposal.value(), self.dissertation.value())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Assessment {
    Coursework(CourseworkUnit),
    Research(ResearchUnit),
}

/// A student record. The enrolment type is derived from the assessment
/// variant, never stored on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub first_name: String,
    pub last_name: String,
    pub student_number: u64,
    pub assessment: Assessment,
}

impl Student {
    pub fn coursework(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        student_number: u64,
        unit: CourseworkUnit,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            student_number,
            assessment: Assessment::Coursework(unit),
        }
    }

    pub fn research(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        student_number: u64,
        unit: ResearchUnit,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            student_number,
            assessment: Assessment::Research(unit),
        }
    }

    pub fn enrolment_type(&self) -> EnrolmentType {
        match self.assessment {
            Assessment::Coursework(_) => EnrolmentType::Coursework,
            Assessment::Research(_) => EnrolmentType::Research,
        }
    }

    pub fn overall_score(&self) -> f64 {
        match &self.assessment {
            Assessment::Coursework(unit) => unit.overall_score(),
            Assessment::Research(unit) => unit.overall_score(),
        }
    }

    pub fn letter_grade(&self) -> Grade {
        calc::letter_grade(self.overall_score())
    }
}
