use serde::Serialize;
use std::fmt;

use crate::calc::{self, ClassAnalysis, Grade};
use crate::model::{EnrolmentType, Student};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    NotFound { student_number: u64 },
    Empty,
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "not_found",
            StoreError::Empty => "empty_store",
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound { student_number } => {
                write!(f, "student {} was not found", student_number)
            }
            StoreError::Empty => write!(f, "the store contains no records"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Grade summary for a single student, as returned by `RecordStore::report`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeReport {
    pub student_number: u64,
    pub first_name: String,
    pub last_name: String,
    pub enrolment_type: EnrolmentType,
    pub overall_score: f64,
    pub grade: Grade,
}

/// An ordered, exclusively owned collection of student records. Insertion
/// order is preserved until `sort_by_number` rearranges it in place.
///
/// Duplicate student numbers are permitted; lookups return the first match.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<Student>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Student] {
        &self.records
    }

    /// Appends a record. No uniqueness check on the student number.
    pub fn add(&mut self, record: Student) {
        self.records.push(record);
    }

    /// Linear scan; first record with the given number wins.
    pub fn find_by_number(&self, student_number: u64) -> Option<&Student> {
        self.records
            .iter()
            .find(|r| r.student_number == student_number)
    }

    pub fn find_by_number_mut(&mut self, student_number: u64) -> Option<&mut Student> {
        self.records
            .iter_mut()
            .find(|r| r.student_number == student_number)
    }

    /// Removes and returns the first record with the given number. The
    /// destructive-removal confirmation handshake lives in the IPC layer;
    /// by the time this runs the caller has already confirmed.
    pub fn remove_by_number(&mut self, student_number: u64) -> Result<Student, StoreError> {
        let idx = self
            .records
            .iter()
            .position(|r| r.student_number == student_number)
            .ok_or(StoreError::NotFound { student_number })?;
        Ok(self.records.remove(idx))
    }

    /// Stable ascending sort by student number, in place.
    pub fn sort_by_number(&mut self) {
        self.records.sort_by_key(|r| r.student_number);
    }

    /// Read-only sortedness predicate: true iff student numbers are
    /// non-decreasing in the current order. Never reorders the store.
    pub fn is_sorted(&self) -> bool {
        self.records
            .windows(2)
            .all(|pair| pair[0].student_number <= pair[1].student_number)
    }

    /// Cohort analysis over every record's overall score, both enrolment
    /// variants pooled. Empty store is a typed error, not a division by zero.
    pub fn analyze(&self) -> Result<ClassAnalysis, StoreError> {
        if self.is_empty() {
            return Err(StoreError::Empty);
        }
        let scores: Vec<f64> = self.records.iter().map(|r| r.overall_score()).collect();
        calc::class_analysis(&scores).ok_or(StoreError::Empty)
    }

    /// Looks up a student and reports identity, overall score, and grade.
    pub fn report(&self, student_number: u64) -> Result<GradeReport, StoreError> {
        let record = self
            .find_by_number(student_number)
            .ok_or(StoreError::NotFound { student_number })?;
        Ok(GradeReport {
            student_number: record.student_number,
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            enrolment_type: record.enrolment_type(),
            overall_score: record.overall_score(),
            grade: record.letter_grade(),
        })
    }
}
