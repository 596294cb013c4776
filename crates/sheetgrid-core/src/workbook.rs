//! Workbook type - the main document structure

use crate::cell::{CellValue, StringPool};
use crate::error::{Error, Result};
use crate::worksheet::Worksheet;
use crate::MAX_SHEET_NAME_LEN;

/// Row height (points) used when neither the row nor the settings say otherwise
pub const DEFAULT_ROW_HEIGHT: f64 = 15.0;

/// Column width (characters) used when neither the column nor the settings say otherwise
pub const DEFAULT_COLUMN_WIDTH: f64 = 8.43;

/// A workbook (spreadsheet document)
///
/// A workbook contains one or more worksheets and global settings.
#[derive(Debug)]
pub struct Workbook {
    /// Worksheets in the workbook
    worksheets: Vec<Worksheet>,
    /// Workbook settings
    settings: WorkbookSettings,
    /// Active sheet index
    active_sheet: usize,
    /// Shared string table
    shared_strings: StringPool,
}

impl Workbook {
    /// Create a new empty workbook with one worksheet
    pub fn new() -> Self {
        Self::with_settings(WorkbookSettings::default())
    }

    /// Create a workbook with one worksheet and explicit settings
    pub fn with_settings(settings: WorkbookSettings) -> Self {
        let mut wb = Self::empty_with_settings(settings);
        let sheet = wb.new_sheet("Sheet1");
        wb.worksheets.push(sheet);
        wb
    }

    /// Create an empty workbook with no worksheets
    pub fn empty() -> Self {
        Self::empty_with_settings(WorkbookSettings::default())
    }

    /// Create an empty workbook with no worksheets and explicit settings
    pub fn empty_with_settings(settings: WorkbookSettings) -> Self {
        Self {
            worksheets: Vec::new(),
            settings,
            active_sheet: 0,
            shared_strings: StringPool::new(),
        }
    }

    fn new_sheet(&self, name: &str) -> Worksheet {
        Worksheet::with_defaults(
            name,
            self.settings.default_row_height,
            self.settings.default_column_width,
        )
    }

    /// Get the number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Check if the workbook has no worksheets
    pub fn is_empty(&self) -> bool {
        self.worksheets.is_empty()
    }

    /// Get a worksheet by index
    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    /// Get a mutable worksheet by index
    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(index)
    }

    /// Get a worksheet by name
    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.worksheets.iter().find(|ws| ws.name() == name)
    }

    /// Iterate over all worksheets
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Add a new worksheet with default name
    pub fn add_worksheet(&mut self) -> Result<usize> {
        let name = self.generate_sheet_name();
        self.add_worksheet_with_name(&name)
    }

    /// Add a new worksheet with specified name
    pub fn add_worksheet_with_name(&mut self, name: &str) -> Result<usize> {
        self.validate_sheet_name(name)?;

        let index = self.worksheets.len();
        let worksheet = self.new_sheet(name);
        self.worksheets.push(worksheet);

        Ok(index)
    }

    /// Move a worksheet to a new position
    pub fn move_worksheet(&mut self, from: usize, to: usize) -> Result<()> {
        if from >= self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(from, self.worksheets.len()));
        }
        if to >= self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(to, self.worksheets.len()));
        }

        let worksheet = self.worksheets.remove(from);
        self.worksheets.insert(to, worksheet);

        // Adjust active sheet if needed
        if self.active_sheet == from {
            self.active_sheet = to;
        } else if from < self.active_sheet && to >= self.active_sheet {
            self.active_sheet = self.active_sheet.saturating_sub(1);
        } else if from > self.active_sheet && to <= self.active_sheet {
            self.active_sheet = self.active_sheet.saturating_add(1);
        }

        Ok(())
    }

    /// Rename a worksheet
    pub fn rename_worksheet(&mut self, index: usize, new_name: &str) -> Result<()> {
        // Check index first
        if index >= self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.worksheets.len()));
        }

        // Validate the new name (excluding current sheet from duplicate check)
        self.validate_sheet_name_excluding(new_name, Some(index))?;

        self.worksheets[index].set_name(new_name);
        Ok(())
    }

    /// Get the active sheet index
    pub fn active_sheet(&self) -> usize {
        self.active_sheet
    }

    /// Set the active sheet index
    pub fn set_active_sheet(&mut self, index: usize) -> Result<()> {
        if index >= self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.worksheets.len()));
        }
        self.active_sheet = index;
        Ok(())
    }

    /// Get workbook settings
    pub fn settings(&self) -> &WorkbookSettings {
        &self.settings
    }

    /// Get mutable workbook settings
    pub fn settings_mut(&mut self) -> &mut WorkbookSettings {
        &mut self.settings
    }

    /// Duplicate a worksheet under a new name, appending the copy
    ///
    /// Returns the index of the new sheet.
    pub fn copy_worksheet(&mut self, index: usize, new_name: &str) -> Result<usize> {
        let source = self
            .worksheets
            .get(index)
            .ok_or(Error::SheetOutOfBounds(index, self.worksheets.len()))?;
        self.validate_sheet_name(new_name)?;
        let copy = source.copy(new_name);
        self.worksheets.push(copy);
        Ok(self.worksheets.len() - 1)
    }

    /// Shared string table
    pub fn shared_strings(&self) -> &StringPool {
        &self.shared_strings
    }

    /// Mutable shared string table
    pub fn shared_strings_mut(&mut self) -> &mut StringPool {
        &mut self.shared_strings
    }

    /// Text of a value, following shared string references
    pub fn resolve_text<'a>(&'a self, value: &'a CellValue) -> Option<&'a str> {
        match value {
            CellValue::SharedStringRef(i) => self.shared_strings.get(*i).map(|s| s.as_str()),
            other => other.as_text(),
        }
    }

    /// Validate a sheet name
    fn validate_sheet_name(&self, name: &str) -> Result<()> {
        self.validate_sheet_name_excluding(name, None)
    }

    /// Validate a sheet name, optionally excluding a sheet from duplicate check
    fn validate_sheet_name_excluding(
        &self,
        name: &str,
        exclude_index: Option<usize>,
    ) -> Result<()> {
        // Check length
        if name.is_empty() {
            return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
        }
        if name.len() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name too long (max {} characters)",
                MAX_SHEET_NAME_LEN
            )));
        }

        // Check for invalid characters
        const INVALID_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];
        for c in INVALID_CHARS {
            if name.contains(*c) {
                return Err(Error::InvalidSheetName(format!(
                    "Sheet name cannot contain '{}'",
                    c
                )));
            }
        }

        // Check for duplicate names (case-insensitive)
        let name_lower = name.to_lowercase();
        for (i, ws) in self.worksheets.iter().enumerate() {
            if Some(i) != exclude_index && ws.name().to_lowercase() == name_lower {
                return Err(Error::DuplicateSheetName(name.into()));
            }
        }

        Ok(())
    }

    /// Generate a unique sheet name
    fn generate_sheet_name(&self) -> String {
        let mut n = self.worksheets.len() + 1;
        loop {
            let name = format!("Sheet{}", n);
            if self.validate_sheet_name(&name).is_ok() {
                return name;
            }
            n += 1;
        }
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

/// Workbook-level settings
///
/// Passed to [`Workbook::with_settings`]; sheets created afterwards pick up the
/// default row height and column width from here.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkbookSettings {
    /// Height of rows without a record (points)
    pub default_row_height: f64,
    /// Width of columns without a record (characters)
    pub default_column_width: f64,
    /// Merge adjacent identical column records when saving
    pub compress_columns: bool,
    /// Date system: false = 1900 (Windows), true = 1904 (Mac)
    pub date_1904: bool,
}

impl Default for WorkbookSettings {
    fn default() -> Self {
        Self {
            default_row_height: DEFAULT_ROW_HEIGHT,
            default_column_width: DEFAULT_COLUMN_WIDTH,
            compress_columns: true,
            date_1904: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_workbook() {
        let wb = Workbook::new();
        assert_eq!(wb.sheet_count(), 1);
        assert_eq!(wb.worksheet(0).unwrap().name(), "Sheet1");
    }

    #[test]
    fn test_add_worksheets() {
        let mut wb = Workbook::new();

        let idx = wb.add_worksheet().unwrap();
        assert_eq!(idx, 1);
        assert_eq!(wb.sheet_count(), 2);

        let idx = wb.add_worksheet_with_name("Data").unwrap();
        assert_eq!(idx, 2);
        assert_eq!(wb.worksheet(2).unwrap().name(), "Data");
    }

    #[test]
    fn test_duplicate_name() {
        let mut wb = Workbook::new();

        // Case-insensitive duplicate check
        assert!(wb.add_worksheet_with_name("SHEET1").is_err());
        assert!(wb.add_worksheet_with_name("sheet1").is_err());
    }

    #[test]
    fn test_invalid_sheet_name() {
        let mut wb = Workbook::new();

        assert!(wb.add_worksheet_with_name("").is_err());
        assert!(wb.add_worksheet_with_name("Sheet/1").is_err());
        assert!(wb.add_worksheet_with_name("Sheet:1").is_err());
        assert!(wb.add_worksheet_with_name("Sheet[1]").is_err());

        // Too long
        let long_name = "A".repeat(MAX_SHEET_NAME_LEN + 1);
        assert!(wb.add_worksheet_with_name(&long_name).is_err());
    }

    #[test]
    fn test_move_worksheet() {
        let mut wb = Workbook::new();
        wb.add_worksheet_with_name("A").unwrap();
        wb.add_worksheet_with_name("B").unwrap();
        wb.add_worksheet_with_name("C").unwrap();

        // Move C to position 1
        wb.move_worksheet(3, 1).unwrap();

        assert_eq!(wb.worksheet(0).unwrap().name(), "Sheet1");
        assert_eq!(wb.worksheet(1).unwrap().name(), "C");
        assert_eq!(wb.worksheet(2).unwrap().name(), "A");
        assert_eq!(wb.worksheet(3).unwrap().name(), "B");
    }

    #[test]
    fn test_rename_worksheet() {
        let mut wb = Workbook::new();
        wb.add_worksheet_with_name("Data").unwrap();

        // Same name with different case is fine for the sheet itself
        wb.rename_worksheet(1, "DATA").unwrap();
        assert_eq!(wb.worksheet(1).unwrap().name(), "DATA");

        assert!(matches!(
            wb.rename_worksheet(0, "data"),
            Err(Error::DuplicateSheetName(_))
        ));
        assert_eq!(
            wb.rename_worksheet(5, "Other"),
            Err(Error::SheetOutOfBounds(5, 2))
        );
    }

    #[test]
    fn test_settings_flow_into_sheets() {
        let settings = WorkbookSettings {
            default_row_height: 18.0,
            ..WorkbookSettings::default()
        };
        let mut wb = Workbook::with_settings(settings);
        wb.add_worksheet_with_name("Two").unwrap();

        assert_eq!(wb.worksheet(0).unwrap().row_height(1), 18.0);
        assert_eq!(wb.worksheet(1).unwrap().row_height(1), 18.0);
        assert_eq!(wb.worksheet(1).unwrap().column_width(1), DEFAULT_COLUMN_WIDTH);
    }

    #[test]
    fn test_copy_worksheet() {
        let mut wb = Workbook::new();
        {
            let ws = wb.worksheet_mut(0).unwrap();
            ws.set_cell_value("A1", 5.0).unwrap();
            ws.set_column_width(2, 30.0).unwrap();
        }

        let idx = wb.copy_worksheet(0, "Copy").unwrap();
        assert_eq!(idx, 1);
        let copy = wb.worksheet(1).unwrap();
        assert_eq!(copy.get_value("A1").unwrap().as_number(), Some(5.0));
        assert_eq!(copy.column_width(2), 30.0);

        assert!(wb.copy_worksheet(0, "copy").is_err());
        assert!(wb.copy_worksheet(9, "Other").is_err());
    }

    #[test]
    fn test_resolve_text() {
        let mut wb = Workbook::new();
        let idx = wb.shared_strings_mut().intern("shared");
        assert_eq!(wb.resolve_text(&CellValue::SharedStringRef(idx)), Some("shared"));
        assert_eq!(wb.resolve_text(&CellValue::text("inline")), Some("inline"));
        assert_eq!(wb.resolve_text(&CellValue::Number(1.0)), None);
    }

    #[test]
    fn test_worksheet_by_name() {
        let mut wb = Workbook::new();
        wb.add_worksheet_with_name("Data").unwrap();

        assert!(wb.worksheet_by_name("Data").is_some());
        assert!(wb.worksheet_by_name("NonExistent").is_none());
    }
}
