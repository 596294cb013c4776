//! Protected ranges and ignored-error regions
//!
//! Both hang off a worksheet as lists of multi-area addresses and shift with
//! it; an entry whose areas are all deleted disappears.

use std::fmt;
use std::str::FromStr;

use crate::cell::RangeAddress;
use crate::error::{Error, Result};
use crate::store::Shift;

/// A named region users may edit while the sheet is protected
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProtectedRange {
    /// Display name
    pub name: String,
    /// Covered areas
    pub ranges: RangeAddress,
}

impl ProtectedRange {
    /// Create a protected range
    pub fn new(name: impl Into<String>, ranges: RangeAddress) -> Self {
        Self {
            name: name.into(),
            ranges,
        }
    }
}

/// Kind of warning suppressed by an [`IgnoredError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IgnoredErrorKind {
    /// Formula evaluates to an error
    EvalError,
    /// Two-digit year stored as text
    TwoDigitTextYear,
    /// Number stored as text
    NumberStoredAsText,
    /// Formula differs from its neighbours
    Formula,
    /// Formula omits adjacent cells
    FormulaRange,
    /// Unlocked cell contains a formula
    UnlockedFormula,
    /// Formula refers to empty cells
    EmptyCellReference,
    /// Value fails list data validation
    ListDataValidation,
    /// Inconsistent calculated column formula
    CalculatedColumn,
}

impl IgnoredErrorKind {
    /// All kinds, in the order they appear as `<ignoredError>` attributes
    pub const ALL: [IgnoredErrorKind; 9] = [
        IgnoredErrorKind::EvalError,
        IgnoredErrorKind::TwoDigitTextYear,
        IgnoredErrorKind::NumberStoredAsText,
        IgnoredErrorKind::Formula,
        IgnoredErrorKind::FormulaRange,
        IgnoredErrorKind::UnlockedFormula,
        IgnoredErrorKind::EmptyCellReference,
        IgnoredErrorKind::ListDataValidation,
        IgnoredErrorKind::CalculatedColumn,
    ];

    /// Attribute name used in worksheet XML
    pub fn as_str(&self) -> &'static str {
        match self {
            IgnoredErrorKind::EvalError => "evalError",
            IgnoredErrorKind::TwoDigitTextYear => "twoDigitTextYear",
            IgnoredErrorKind::NumberStoredAsText => "numberStoredAsText",
            IgnoredErrorKind::Formula => "formula",
            IgnoredErrorKind::FormulaRange => "formulaRange",
            IgnoredErrorKind::UnlockedFormula => "unlockedFormula",
            IgnoredErrorKind::EmptyCellReference => "emptyCellReference",
            IgnoredErrorKind::ListDataValidation => "listDataValidation",
            IgnoredErrorKind::CalculatedColumn => "calculatedColumn",
        }
    }
}

impl fmt::Display for IgnoredErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IgnoredErrorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| Error::invalid_argument(format!("unknown ignored error kind '{}'", s)))
    }
}

/// A region where one kind of warning is suppressed
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IgnoredError {
    /// Covered areas
    pub ranges: RangeAddress,
    /// Suppressed warning
    pub kind: IgnoredErrorKind,
}

impl IgnoredError {
    /// Create an ignored-error entry
    pub fn new(ranges: RangeAddress, kind: IgnoredErrorKind) -> Self {
        Self { ranges, kind }
    }
}

/// Shift every entry's areas and drop entries left without any
pub(crate) fn shift_all<T, F>(entries: &mut Vec<T>, mut f: F) -> Result<()>
where
    F: FnMut(&mut RangeAddress) -> Result<()>,
    T: AsMut<RangeAddress>,
{
    for entry in entries.iter_mut() {
        f(entry.as_mut())?;
    }
    entries.retain_mut(|e| !e.as_mut().is_empty());
    Ok(())
}

impl AsMut<RangeAddress> for ProtectedRange {
    fn as_mut(&mut self) -> &mut RangeAddress {
        &mut self.ranges
    }
}

impl AsMut<RangeAddress> for IgnoredError {
    fn as_mut(&mut self) -> &mut RangeAddress {
        &mut self.ranges
    }
}

/// Shift a list of protected ranges or ignored errors as a unit
pub(crate) fn shift_rows<T: AsMut<RangeAddress>>(
    entries: &mut Vec<T>,
    at: u32,
    count: u32,
    insert: bool,
) -> Result<()> {
    shift_all(entries, |r| {
        if insert {
            r.insert_rows(at, count)
        } else {
            r.delete_rows(at, count)
        }
    })
}

/// Column counterpart of [`shift_rows`]
pub(crate) fn shift_columns<T: AsMut<RangeAddress>>(
    entries: &mut Vec<T>,
    at: u16,
    count: u16,
    insert: bool,
) -> Result<()> {
    shift_all(entries, |r| {
        if insert {
            r.insert_columns(at, count)
        } else {
            r.delete_columns(at, count)
        }
    })
}
