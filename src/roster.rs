use serde::Serialize;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::model::{CourseworkUnit, ResearchUnit, Student};
use crate::store::RecordStore;

/// Fixed 11-column header emitted on export. Import does no header detection;
/// a header row simply fails to parse and is reported as a diagnostic.
pub const ROSTER_HEADER: &str = "EnrolmentType,FirstName,LastName,StudentNumber,UnitID,Level,\
Assignment1Mark,Assignment2Mark,FinalExamMark,ProposalMark,DissertationMark";

// Minimum field counts per variant: type, first, last, number, then the
// variant payload (unitId, level, a1, a2, exam / proposal, dissertation).
const MIN_COURSEWORK_FIELDS: usize = 9;
const MIN_RESEARCH_FIELDS: usize = 6;

#[derive(Debug, Clone)]
pub enum RosterError {
    /// Export was attempted on a store that is not verified sorted. Raised
    /// before anything is rendered or written.
    NotSorted,
    /// Source file missing or unreadable on import; the store is untouched.
    SourceUnavailable { path: PathBuf, source: io::ErrorKind },
    /// I/O failure while writing the export sink.
    SinkWrite { path: PathBuf, source: io::ErrorKind },
}

impl RosterError {
    pub fn code(&self) -> &'static str {
        match self {
            RosterError::NotSorted => "not_sorted",
            RosterError::SourceUnavailable { .. } => "source_unavailable",
            RosterError::SinkWrite { .. } => "sink_write_failed",
        }
    }
}

impl fmt::Display for RosterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterError::NotSorted => {
                write!(f, "store is not sorted by student number; sort before exporting")
            }
            RosterError::SourceUnavailable { path, source } => {
                write!(f, "cannot read roster {}: {:?}", path.to_string_lossy(), source)
            }
            RosterError::SinkWrite { path, source } => {
                write!(f, "cannot write roster {}: {:?}", path.to_string_lossy(), source)
            }
        }
    }
}

impl std::error::Error for RosterError {}

/// One skipped row. Import never aborts on a bad row; it records why the row
/// was dropped and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowDiagnostic {
    /// 1-based line number in the source text.
    pub line: usize,
    pub code: &'static str,
    pub message: String,
}

impl RowDiagnostic {
    fn bad_row(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            code: "bad_row",
            message: message.into(),
        }
    }

    fn bad_number(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            code: "bad_number",
            message: message.into(),
        }
    }

    fn bad_mark(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            code: "bad_mark",
            message: message.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ParsedRoster {
    pub records: Vec<Student>,
    pub diagnostics: Vec<RowDiagnostic>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSummary {
    pub added: usize,
    pub diagnostics: Vec<RowDiagnostic>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSummary {
    pub rows_written: usize,
    pub backup: Option<String>,
}

/// Parses row-oriented roster text. Fields are comma-delimited with no
/// quoting support; each field is trimmed. Rows with fewer than the minimum
/// fields for either variant are skipped silently; every other malformed row
/// produces one diagnostic.
pub fn parse_roster(text: &str) -> ParsedRoster {
    let mut parsed = ParsedRoster::default();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        if raw.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = raw.split(',').map(str::trim).collect();
        if fields.len() < MIN_RESEARCH_FIELDS {
            continue;
        }

        match parse_row(line, &fields) {
            Ok(record) => parsed.records.push(record),
            Err(diag) => parsed.diagnostics.push(diag),
        }
    }

    parsed
}

fn parse_row(line: usize, fields: &[&str]) -> Result<Student, RowDiagnostic> {
    let tag = fields[0].to_ascii_uppercase();
    match tag.as_str() {
        "C" => {
            if fields.len() < MIN_COURSEWORK_FIELDS {
                return Err(RowDiagnostic::bad_row(
                    line,
                    format!(
                        "coursework row needs {} fields, found {}",
                        MIN_COURSEWORK_FIELDS,
                        fields.len()
                    ),
                ));
            }
            let student_number = parse_student_number(line, fields[3])?;
            let level = fields[5].parse::<i64>().map_err(|_| {
                RowDiagnostic::bad_number(line, format!("invalid unit level: {}", fields[5]))
            })?;
            let a1 = parse_mark_field(line, "assignment 1", fields[6])?;
            let a2 = parse_mark_field(line, "assignment 2", fields[7])?;
            let exam = parse_mark_field(line, "final exam", fields[8])?;
            let unit = CourseworkUnit::new(fields[4], level, a1, a2, exam)
                .map_err(|e| RowDiagnostic::bad_mark(line, e.to_string()))?;
            Ok(Student::coursework(fields[1], fields[2], student_number, unit))
        }
        "R" => {
            let student_number = parse_student_number(line, fields[3])?;
            // Research marks sit right after the student number in the compact
            // hand-written layout, but in the last two of the 11 padded export
            // columns. The coursework columns in between are empty either way.
            let (proposal_raw, dissertation_raw) = if fields.len() >= 11 && fields[4].is_empty() {
                (fields[9], fields[10])
            } else {
                (fields[4], fields[5])
            };
            let proposal = parse_mark_field(line, "proposal", proposal_raw)?;
            let dissertation = parse_mark_field(line, "dissertation", dissertation_raw)?;
            let unit = ResearchUnit::new(proposal, dissertation)
                .map_err(|e| RowDiagnostic::bad_mark(line, e.to_string()))?;
            Ok(Student::research(fields[1], fields[2], student_number, unit))
        }
        other => Err(RowDiagnostic::bad_row(
            line,
            format!("unrecognised enrolment type: {}", other),
        )),
    }
}

fn parse_student_number(line: usize, raw: &str) -> Result<u64, RowDiagnostic> {
    raw.parse::<u64>().map_err(|_| {
        RowDiagnostic::bad_number(line, format!("invalid student number: {}", raw))
    })
}

fn parse_mark_field(line: usize, label: &str, raw: &str) -> Result<i64, RowDiagnostic> {
    raw.parse::<i64>().map_err(|_| {
        RowDiagnostic::bad_mark(line, format!("invalid {} mark: {}", label, raw))
    })
}

/// Renders the store to roster text. The store must already be verified
/// sorted; an unsorted store is a usage error caught before any output is
/// produced. Coursework rows leave the proposal/dissertation columns empty,
/// research rows leave the unit columns empty.
pub fn render_roster(store: &RecordStore) -> Result<String, RosterError> {
    if !store.is_sorted() {
        return Err(RosterError::NotSorted);
    }

    let mut out = String::from(ROSTER_HEADER);
    out.push('\n');
    for record in store.records() {
        let tag = record.enrolment_type().tag();
        match &record.assessment {
            crate::model::Assessment::Coursework(unit) => {
                out.push_str(&format!(
                    "{},{},{},{},{},{},{},{},{},,\n",
                    tag,
                    record.first_name,
                    record.last_name,
                    record.student_number,
                    unit.unit_id,
                    unit.level,
                    unit.assignment1(),
                    unit.assignment2(),
                    unit.final_exam(),
                ));
            }
            crate::model::Assessment::Research(unit) => {
                out.push_str(&format!(
                    "{},{},{},{},,,,,,{},{}\n",
                    tag,
                    record.first_name,
                    record.last_name,
                    record.student_number,
                    unit.proposal(),
                    unit.dissertation(),
                ));
            }
        }
    }
    Ok(out)
}

/// Finds a roster file in a folder: any `*.csv`, case-insensitive, the
/// lexicographically first candidate for determinism.
pub fn find_roster_file(folder: &Path) -> anyhow::Result<Option<PathBuf>> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    for ent in std::fs::read_dir(folder)? {
        let ent = ent?;
        let p = ent.path();
        if !p.is_file() {
            continue;
        }
        let name = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if name.to_ascii_lowercase().ends_with(".csv") {
            candidates.push(p);
        }
    }
    candidates.sort();
    Ok(candidates.into_iter().next())
}

/// Reads and parses a roster file, appending every well-formed row to the
/// store. A missing or unreadable source leaves the store exactly as it was.
pub fn load_into(store: &mut RecordStore, path: &Path) -> Result<LoadSummary, RosterError> {
    let bytes = std::fs::read(path).map_err(|e| RosterError::SourceUnavailable {
        path: path.to_path_buf(),
        source: e.kind(),
    })?;
    let text = String::from_utf8_lossy(&bytes);

    let parsed = parse_roster(&text);
    let added = parsed.records.len();
    for record in parsed.records {
        store.add(record);
    }

    Ok(LoadSummary {
        added,
        diagnostics: parsed.diagnostics,
    })
}

/// Renders and writes the store to `path`. Rendering runs first, so the
/// sorted-store precondition fails before anything touches the filesystem.
/// The text lands in a sibling temp file that is renamed into place, and any
/// existing sink is kept as a timestamped backup next to it.
pub fn save_to(store: &RecordStore, path: &Path) -> Result<SaveSummary, RosterError> {
    let text = render_roster(store)?;

    let sink_write = |e: io::Error| RosterError::SinkWrite {
        path: path.to_path_buf(),
        source: e.kind(),
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(sink_write)?;
        }
    }

    let mut backup: Option<String> = None;
    if path.exists() {
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let backup_path = path.with_file_name(format!(
            "{}.bak-{}",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "roster".to_string()),
            stamp
        ));
        std::fs::rename(path, &backup_path).map_err(sink_write)?;
        backup = Some(backup_path.to_string_lossy().into_owned());
    }

    let tmp = path.with_file_name(format!(
        "{}.saving",
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "roster".to_string())
    ));
    std::fs::write(&tmp, text.as_bytes()).map_err(sink_write)?;
    std::fs::rename(&tmp, path).map_err(sink_write)?;

    Ok(SaveSummary {
        rows_written: store.len(),
        backup,
    })
}
