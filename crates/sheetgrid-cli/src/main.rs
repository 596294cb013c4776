//! sheetgrid CLI - inspect and edit xlsx packages

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use sheetgrid_core::{CellAddress, CellValue, Shift, Workbook, Worksheet, MAX_COLS};
use sheetgrid_xlsx::{WriterOptions, XlsxReader, XlsxWriter};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sheetgrid")]
#[command(author, version, about = "Inspect and edit xlsx packages")]
struct Cli {
    /// Log progress (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a workbook
    Info {
        /// Input xlsx file
        input: PathBuf,
    },

    /// List the column records of a sheet
    Columns {
        /// Input xlsx file
        input: PathBuf,

        /// Sheet index (0-based)
        #[arg(short, long, default_value = "0")]
        sheet: usize,
    },

    /// Print a sheet as CSV
    #[command(alias = "csv")]
    ToCsv {
        /// Input xlsx file
        input: PathBuf,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Sheet index (0-based)
        #[arg(short, long, default_value = "0")]
        sheet: usize,

        /// Field delimiter
        #[arg(short, long, default_value = ",")]
        delimiter: char,
    },

    /// Insert blank rows, moving everything below down
    InsertRows(RowEdit),

    /// Delete rows, moving everything below up
    DeleteRows(RowEdit),

    /// Insert blank columns, moving everything to the right
    InsertColumns(ColumnEdit),

    /// Delete columns, moving everything to the left
    DeleteColumns(ColumnEdit),
}

#[derive(Args)]
struct EditTarget {
    /// Input xlsx file
    input: PathBuf,

    /// Output file (default: overwrite the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Sheet index (0-based)
    #[arg(short, long, default_value = "0")]
    sheet: usize,

    /// Write text cells inline instead of through the shared string table
    #[arg(long)]
    inline_strings: bool,
}

#[derive(Args)]
struct RowEdit {
    #[command(flatten)]
    target: EditTarget,

    /// First row affected (1-based)
    #[arg(long)]
    at: u32,

    /// Number of rows
    #[arg(long, default_value = "1")]
    count: u32,
}

#[derive(Args)]
struct ColumnEdit {
    #[command(flatten)]
    target: EditTarget,

    /// First column affected, as a letter (`C`) or 1-based number
    #[arg(long)]
    at: String,

    /// Number of columns
    #[arg(long, default_value = "1")]
    count: u16,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info { input } => show_info(&input),
        Commands::Columns { input, sheet } => list_columns(&input, sheet),
        Commands::ToCsv {
            input,
            output,
            sheet,
            delimiter,
        } => to_csv(&input, output.as_deref(), sheet, delimiter),
        Commands::InsertRows(edit) => {
            let (at, count) = (edit.at, edit.count);
            edit_sheet(&edit.target, |sheet| sheet.insert_rows(at, count))
        }
        Commands::DeleteRows(edit) => {
            let (at, count) = (edit.at, edit.count);
            edit_sheet(&edit.target, |sheet| sheet.delete_rows(at, count))
        }
        Commands::InsertColumns(edit) => {
            let at = parse_column(&edit.at)?;
            let count = edit.count;
            edit_sheet(&edit.target, |sheet| sheet.insert_columns(at, count))
        }
        Commands::DeleteColumns(edit) => {
            let at = parse_column(&edit.at)?;
            let count = edit.count;
            edit_sheet(&edit.target, |sheet| sheet.delete_columns(at, count))
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn open(input: &Path) -> Result<Workbook> {
    XlsxReader::read_file(input).with_context(|| format!("Failed to open '{}'", input.display()))
}

fn sheet_at(workbook: &Workbook, index: usize) -> Result<&Worksheet> {
    workbook
        .worksheet(index)
        .with_context(|| format!("Sheet index {} not found", index))
}

/// Column from `C` or `3`
fn parse_column(text: &str) -> Result<u16> {
    let col = match text.parse::<u16>() {
        Ok(n) => n,
        Err(_) => CellAddress::letters_to_column(&text.to_ascii_uppercase())
            .with_context(|| format!("Invalid column '{}'", text))?,
    };
    if col == 0 || col > MAX_COLS {
        bail!("Column {} outside 1..={}", col, MAX_COLS);
    }
    Ok(col)
}

fn edit_sheet<F>(target: &EditTarget, edit: F) -> Result<()>
where
    F: FnOnce(&mut Worksheet) -> sheetgrid_core::Result<()>,
{
    let mut workbook = open(&target.input)?;
    let sheet = workbook
        .worksheet_mut(target.sheet)
        .with_context(|| format!("Sheet index {} not found", target.sheet))?;
    let name = sheet.name().to_string();
    edit(sheet).with_context(|| format!("Failed to edit sheet '{}'", name))?;

    let output = target.output.as_deref().unwrap_or(target.input.as_path());
    let options = WriterOptions {
        shared_strings: !target.inline_strings,
        ..WriterOptions::default()
    };
    let file = std::fs::File::create(output)
        .with_context(|| format!("Failed to create '{}'", output.display()))?;
    XlsxWriter::write_with_options(&workbook, file, &options)
        .with_context(|| format!("Failed to write '{}'", output.display()))?;

    eprintln!("Wrote '{}'", output.display());
    Ok(())
}

fn show_info(input: &Path) -> Result<()> {
    let workbook = open(input)?;

    println!("File: {}", input.display());
    println!("Sheets: {}", workbook.sheet_count());
    println!("Shared strings: {}", workbook.shared_strings().len());
    if workbook.settings().date_1904 {
        println!("Date system: 1904");
    }

    for (i, sheet) in workbook.worksheets().enumerate() {
        println!();
        let marker = if i == workbook.active_sheet() { " (active)" } else { "" };
        println!("  Sheet {}: \"{}\"{}", i, sheet.name(), marker);
        if !sheet.is_visible() {
            println!("    Hidden");
        }

        match sheet.used_range() {
            Some(range) => println!("    Used range: {} ({} cells)", range, sheet.cell_count()),
            None => println!("    Used range: empty"),
        }
        println!("    Formulas: {}", sheet.formula_cells().count());
        println!("    Row records: {}", sheet.rows().len());
        println!("    Column records: {}", sheet.columns().len());
        println!("    Merged regions: {}", sheet.merged_regions().len());
        println!("    Comments: {}", sheet.comment_count());
        println!("    Protected ranges: {}", sheet.protected_ranges().len());
        println!("    Ignored errors: {}", sheet.ignored_errors().len());
    }

    Ok(())
}

fn list_columns(input: &Path, index: usize) -> Result<()> {
    let workbook = open(input)?;
    let sheet = sheet_at(&workbook, index)?;

    println!("min\tmax\twidth\thidden\toutline\tstyle");
    for record in sheet.columns().iter() {
        let width = record
            .width
            .map(|w| w.to_string())
            .unwrap_or_else(|| "-".to_string());
        let style = record
            .style_index
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            CellAddress::column_to_letters(record.min),
            CellAddress::column_to_letters(record.max),
            width,
            record.hidden,
            record.outline_level,
            style
        );
    }

    Ok(())
}

fn to_csv(input: &Path, output: Option<&Path>, index: usize, delimiter: char) -> Result<()> {
    let workbook = open(input)?;
    let sheet = sheet_at(&workbook, index)?;

    let used_range = match sheet.used_range() {
        Some(range) => range,
        None => {
            eprintln!("Warning: Sheet appears to be empty");
            return Ok(());
        }
    };

    let mut csv_output = String::new();
    for row in 1..=used_range.end.row {
        let fields: Vec<String> = (1..=used_range.end.col)
            .map(|col| csv_field(&workbook, &sheet.get_value_at(row, col), delimiter))
            .collect();
        csv_output.push_str(&fields.join(&delimiter.to_string()));
        csv_output.push('\n');
    }

    if let Some(output_path) = output {
        std::fs::write(output_path, &csv_output)
            .with_context(|| format!("Failed to write '{}'", output_path.display()))?;
        eprintln!(
            "Wrote {} rows to '{}'",
            used_range.end.row,
            output_path.display()
        );
    } else {
        io::stdout()
            .write_all(csv_output.as_bytes())
            .context("Failed to write to stdout")?;
    }

    Ok(())
}

fn csv_field(workbook: &Workbook, value: &CellValue, delimiter: char) -> String {
    let text = match value {
        CellValue::Empty | CellValue::RichObjectRef(_) => String::new(),
        CellValue::Number(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        CellValue::Text(_) | CellValue::SharedStringRef(_) => {
            workbook.resolve_text(value).unwrap_or_default().to_string()
        }
        CellValue::Boolean(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        CellValue::Error(e) => e.to_string(),
        CellValue::Formula { cached, .. } => match cached {
            Some(v) => return csv_field(workbook, v, delimiter),
            None => String::new(),
        },
    };

    if text.contains(delimiter) || text.contains('"') || text.contains('\n') || text.contains('\r')
    {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_column() {
        assert_eq!(parse_column("C").unwrap(), 3);
        assert_eq!(parse_column("aa").unwrap(), 27);
        assert_eq!(parse_column("12").unwrap(), 12);
        assert!(parse_column("0").is_err());
        assert!(parse_column("ZZZZ").is_err());
    }

    #[test]
    fn test_csv_field_quotes_and_resolves() {
        let mut workbook = Workbook::new();
        let idx = workbook.shared_strings_mut().intern("a,b");
        assert_eq!(
            csv_field(&workbook, &CellValue::SharedStringRef(idx), ','),
            "\"a,b\""
        );
        assert_eq!(csv_field(&workbook, &CellValue::Number(42.0), ','), "42");
        assert_eq!(
            csv_field(&workbook, &CellValue::Boolean(true), ','),
            "TRUE"
        );
        let formula = CellValue::Formula {
            text: "1+1".to_string(),
            cached: Some(Box::new(CellValue::Number(2.5))),
        };
        assert_eq!(csv_field(&workbook, &formula, ','), "2.5");
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
