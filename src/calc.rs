use serde::Serialize;
use std::fmt;

// Coursework weighting: two assignments plus a final exam.
pub const ASSIGNMENT1_WEIGHT: f64 = 0.25;
pub const ASSIGNMENT2_WEIGHT: f64 = 0.25;
pub const FINAL_EXAM_WEIGHT: f64 = 0.5;

// Research weighting: proposal plus dissertation.
pub const PROPOSAL_WEIGHT: f64 = 0.35;
pub const DISSERTATION_WEIGHT: f64 = 0.65;

// Inclusive lower bounds of the grade ladder, checked in descending order.
pub const HD_MIN: f64 = 80.0;
pub const D_MIN: f64 = 70.0;
pub const C_MIN: f64 = 60.0;
pub const P_MIN: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    HD,
    D,
    C,
    P,
    N,
}

impl Grade {
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::HD => "HD",
            Grade::D => "D",
            Grade::C => "C",
            Grade::P => "P",
            Grade::N => "N",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps an overall score onto the letter-grade ladder. Exactly one branch
/// fires; anything below `P_MIN` (including scores that should not occur, like
/// negatives) is an N.
pub fn letter_grade(score: f64) -> Grade {
    if score >= HD_MIN {
        Grade::HD
    } else if score >= D_MIN {
        Grade::D
    } else if score >= C_MIN {
        Grade::C
    } else if score >= P_MIN {
        Grade::P
    } else {
        Grade::N
    }
}

/// Weighted overall score for a coursework unit. No rounding; display
/// formatting is the caller's concern.
pub fn coursework_overall(assignment1: u8, assignment2: u8, final_exam: u8) -> f64 {
    f64::from(assignment1) * ASSIGNMENT1_WEIGHT
        + f64::from(assignment2) * ASSIGNMENT2_WEIGHT
        + f64::from(final_exam) * FINAL_EXAM_WEIGHT
}

/// Weighted overall score for a research unit.
pub fn research_overall(proposal: u8, dissertation: u8) -> f64 {
    f64::from(proposal) * PROPOSAL_WEIGHT + f64::from(dissertation) * DISSERTATION_WEIGHT
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassAnalysis {
    pub average_overall_score: f64,
    pub count_above: usize,
    pub count_below: usize,
}

/// Mean of the given overall scores, then a second pass classifying each score
/// as at-or-above versus strictly-below that mean. Ties count as above.
/// Returns `None` for an empty cohort instead of dividing by zero.
pub fn class_analysis(scores: &[f64]) -> Option<ClassAnalysis> {
    if scores.is_empty() {
        return None;
    }

    let sum: f64 = scores.iter().sum();
    let average = sum / (scores.len() as f64);

    let mut count_above = 0_usize;
    let mut count_below = 0_usize;
    for &score in scores {
        if score >= average {
            count_above += 1;
        } else {
            count_below += 1;
        }
    }

    Some(ClassAnalysis {
        average_overall_score: average,
        count_above,
        count_below,
    })
}
