//! The student × date attendance grid used for bulk review and editing.
//!
//! [`AttendanceMatrix::build`] turns stored records into a grid where every cell of the range is
//! present, defaulting to "not recorded". After the grid has been edited, [`reconcile`] compares it
//! against the snapshot taken when it was rendered and stages the writes needed to store the
//! edits. Cells edited back to "not recorded" stage nothing: removing records is left to the
//! explicit clear action.

use crate::error::{Error, Result};
use crate::models::{AttendanceRecord, Status};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// The longest range, in days, a matrix may span.
pub const MAX_RANGE_DAYS: usize = 366;

/// A closed range of calendar dates. A range whose start lies after its end contains no dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn single(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.end - self.start).num_days() as usize + 1
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |date| *date <= end)
    }

    /// Rejects ranges too long to be rendered as a grid.
    pub fn check_len(&self) -> Result<()> {
        if self.len() > MAX_RANGE_DAYS {
            return Err(Error::validation(format!(
                "date range {} to {} spans {} days, at most {MAX_RANGE_DAYS} are allowed",
                self.start,
                self.end,
                self.len()
            )));
        }
        Ok(())
    }
}

/// Mapping of student → date → status, where `None` means not recorded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendanceMatrix {
    dates: Vec<NaiveDate>,
    rows: BTreeMap<i32, BTreeMap<NaiveDate, Option<Status>>>,
}

impl AttendanceMatrix {
    /// Lays out every date of `range` for every student and fills in the stored statuses.
    ///
    /// Records of unknown students or outside the range are ignored. With duplicate records for
    /// one cell the last one in `records` wins.
    pub fn build(
        student_ids: impl IntoIterator<Item = i32>,
        range: DateRange,
        records: &[AttendanceRecord],
    ) -> Self {
        let dates: Vec<NaiveDate> = range.days().collect();
        let mut rows: BTreeMap<i32, BTreeMap<NaiveDate, Option<Status>>> = student_ids
            .into_iter()
            .map(|id| (id, dates.iter().map(|&date| (date, None)).collect()))
            .collect();

        for record in records {
            if let Some(cell) = rows
                .get_mut(&record.student_id)
                .and_then(|row| row.get_mut(&record.date))
            {
                *cell = Some(record.status);
            }
        }

        Self { dates, rows }
    }

    /// Assembles a matrix from individual cells, e.g. the fields of a submitted form.
    pub fn from_cells(cells: impl IntoIterator<Item = (i32, NaiveDate, Option<Status>)>) -> Self {
        let mut matrix = Self::default();
        for (student_id, date, cell) in cells {
            matrix
                .rows
                .entry(student_id)
                .or_default()
                .insert(date, cell);
            if let Err(pos) = matrix.dates.binary_search(&date) {
                matrix.dates.insert(pos, date);
            }
        }
        matrix
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn student_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.rows.keys().copied()
    }

    pub fn get(&self, student_id: i32, date: NaiveDate) -> Option<Status> {
        self.rows
            .get(&student_id)
            .and_then(|row| row.get(&date))
            .copied()
            .flatten()
    }

    /// Overwrites one cell. Returns `false` if the cell is not part of the matrix.
    pub fn set(&mut self, student_id: i32, date: NaiveDate, cell: Option<Status>) -> bool {
        match self
            .rows
            .get_mut(&student_id)
            .and_then(|row| row.get_mut(&date))
        {
            Some(current) => {
                *current = cell;
                true
            }
            None => false,
        }
    }

    /// All cells, ordered by student and date.
    pub fn cells(&self) -> impl Iterator<Item = (i32, NaiveDate, Option<Status>)> + '_ {
        self.rows.iter().flat_map(|(&student_id, row)| {
            row.iter()
                .map(move |(&date, &cell)| (student_id, date, cell))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.values().all(BTreeMap::is_empty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// No record existed when the grid was rendered.
    Insert,
    /// Overwrite the first record stored for the cell.
    Update,
}

/// A single attendance write produced by [`reconcile`] or a batch action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagedWrite {
    pub student_id: i32,
    pub date: NaiveDate,
    pub status: Status,
    pub kind: WriteKind,
}

impl StagedWrite {
    /// The write that takes a cell from `current` to `status`, if any is needed.
    pub fn transition(
        student_id: i32,
        date: NaiveDate,
        current: Option<Status>,
        status: Status,
    ) -> Option<Self> {
        if current == Some(status) {
            return None;
        }
        let kind = if current.is_some() {
            WriteKind::Update
        } else {
            WriteKind::Insert
        };
        Some(Self {
            student_id,
            date,
            status,
            kind,
        })
    }
}

/// Stages the writes that store the edits made to `snapshot`.
///
/// Only cells present in both matrices are compared. A cell changed to "not recorded" stages
/// nothing.
pub fn reconcile(snapshot: &AttendanceMatrix, edited: &AttendanceMatrix) -> Vec<StagedWrite> {
    edited
        .cells()
        .filter_map(|(student_id, date, cell)| {
            let before = snapshot.rows.get(&student_id)?.get(&date).copied()?;
            if cell == before {
                return None;
            }
            StagedWrite::transition(student_id, date, before, cell?)
        })
        .collect()
}

/// Stages the writes that set every cell of `matrix` to `status`.
pub fn mark_all(matrix: &AttendanceMatrix, status: Status) -> Vec<StagedWrite> {
    matrix
        .cells()
        .filter_map(|(student_id, date, cell)| {
            StagedWrite::transition(student_id, date, cell, status)
        })
        .collect()
}
