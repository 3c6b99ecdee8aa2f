// ==========================================
// Sales Projection - File parser
// ==========================================
// Stage 0: file reading
// Supports: CSV (.csv, ';'-delimited) / spreadsheets (.xlsx/.xls, first sheet)
// Fixed header: Anio;Mes;Monto_Venta
// ==========================================

use crate::domain::{ParsedSalesFile, RawSalesRow};
use crate::importer::data_cleaner::clean_cell;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::sales_importer_trait::FileParser;
use calamine::{Reader, Xls, Xlsx};
use csv::ReaderBuilder;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

/// Header every file must start with (exact case and column count)
pub const EXPECTED_HEADER: [&str; 3] = ["Anio", "Mes", "Monto_Venta"];

/// Data rows accepted when nothing is configured
pub const DEFAULT_MAX_DATA_ROWS: usize = 1000;

/// (1-based physical row number, cleaned cells)
type PhysicalRow = (usize, Vec<String>);

fn is_blank(cells: &[String]) -> bool {
    cells.iter().all(|c| c.is_empty())
}

/// Header check + blank-row skipping + row limit, shared by every format
fn collect_data_rows<I>(table: I, max_rows: usize) -> ImportResult<Vec<RawSalesRow>>
where
    I: IntoIterator<Item = PhysicalRow>,
{
    let mut rows = table.into_iter().filter(|(_, cells)| !is_blank(cells));

    let (_, header) = rows.next().ok_or(ImportError::EmptyFile)?;
    if header.len() != EXPECTED_HEADER.len()
        || header.iter().zip(EXPECTED_HEADER.iter()).any(|(a, b)| a != b)
    {
        return Err(ImportError::InvalidHeader {
            expected: EXPECTED_HEADER.join(";"),
            found: header.join(";"),
        });
    }

    let data: Vec<RawSalesRow> = rows
        .map(|(row_number, fields)| RawSalesRow { row_number, fields })
        .collect();

    if data.is_empty() {
        return Err(ImportError::NoDataRows);
    }
    if data.len() > max_rows {
        return Err(ImportError::TooManyRows {
            max: max_rows,
            found: data.len(),
        });
    }

    Ok(data)
}

// ==========================================
// CSV Parser
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_bytes(&self, content: &[u8], max_rows: usize) -> ImportResult<Vec<RawSalesRow>> {
        // Header handled by hand so it gets the same checks as spreadsheets
        let mut reader = ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .flexible(true)
            .from_reader(content);

        let mut table = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row_number = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(table.len() + 1);
            let cells: Vec<String> = record.iter().map(clean_cell).collect();
            table.push((row_number, cells));
        }

        collect_data_rows(table, max_rows)
    }
}

// ==========================================
// Excel Parser
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetKind {
    Xlsx,
    Xls,
}

pub struct ExcelParser {
    kind: SpreadsheetKind,
}

impl ExcelParser {
    pub fn new(kind: SpreadsheetKind) -> Self {
        Self { kind }
    }
}

fn sheet_error<E: Into<calamine::Error>>(err: E) -> ImportError {
    let err: calamine::Error = err.into();
    ImportError::from(err)
}

/// Rows of the first worksheet, numbered as the spreadsheet shows them
fn read_first_sheet<RS, R>(mut workbook: R) -> ImportResult<Vec<PhysicalRow>>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: Into<calamine::Error>,
{
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ImportError::ExcelParseError("el libro no tiene hojas".to_string()))?;

    let range = workbook.worksheet_range(&sheet_name).map_err(sheet_error)?;
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);

    let table = range
        .rows()
        .enumerate()
        .map(|(idx, cells)| {
            let mut cleaned: Vec<String> =
                cells.iter().map(|cell| clean_cell(&cell.to_string())).collect();
            // The grid is as wide as its widest row; trailing empty cells are padding
            while cleaned.last().is_some_and(|c| c.is_empty()) {
                cleaned.pop();
            }
            (first_row + idx + 1, cleaned)
        })
        .collect();

    Ok(table)
}

impl FileParser for ExcelParser {
    fn parse_bytes(&self, content: &[u8], max_rows: usize) -> ImportResult<Vec<RawSalesRow>> {
        let cursor = Cursor::new(content);
        let table = match self.kind {
            SpreadsheetKind::Xlsx => {
                let workbook: Xlsx<_> = Xlsx::new(cursor).map_err(sheet_error)?;
                read_first_sheet(workbook)?
            }
            SpreadsheetKind::Xls => {
                let workbook: Xls<_> = Xls::new(cursor).map_err(sheet_error)?;
                read_first_sheet(workbook)?
            }
        };
        collect_data_rows(table, max_rows)
    }
}

// ==========================================
// Universal parser (picks by extension)
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    /// Parser for a file name, matched case-insensitively on the extension
    pub fn parser_for(file_name: &str) -> ImportResult<Box<dyn FileParser>> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => Ok(Box::new(CsvParser)),
            "xlsx" => Ok(Box::new(ExcelParser::new(SpreadsheetKind::Xlsx))),
            "xls" => Ok(Box::new(ExcelParser::new(SpreadsheetKind::Xls))),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }

    pub fn parse_bytes(
        &self,
        file_name: &str,
        content: &[u8],
        max_rows: usize,
    ) -> ImportResult<ParsedSalesFile> {
        let parser = Self::parser_for(file_name)?;
        let rows = parser.parse_bytes(content, max_rows)?;
        Ok(ParsedSalesFile {
            file_name: file_name.to_string(),
            rows,
        })
    }

    pub fn parse_path<P: AsRef<Path>>(
        &self,
        file_path: P,
        max_rows: usize,
    ) -> ImportResult<ParsedSalesFile> {
        let path = file_path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        // Extension first: a wrong type is reported even if the file is missing
        let parser = Self::parser_for(&file_name)?;

        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read(path)?;
        let rows = parser.parse_bytes(&content, max_rows)?;

        Ok(ParsedSalesFile { file_name, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::error::ImportErrorKind;
    use std::io::Write;

    fn parse_csv(content: &str) -> ImportResult<Vec<RawSalesRow>> {
        CsvParser.parse_bytes(content.as_bytes(), DEFAULT_MAX_DATA_ROWS)
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let rows = parse_csv("Anio;Mes;Monto_Venta\n2024;1;100\n2024;2;150,50\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_number, 2);
        assert_eq!(rows[0].fields, vec!["2024", "1", "100"]);
        assert_eq!(rows[1].fields[2], "150,50");
    }

    #[test]
    fn test_csv_parser_keeps_physical_row_numbers() {
        let rows = parse_csv("Anio;Mes;Monto_Venta\n2024;1;100\n\n;;\n2024;2;200\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].row_number, 5);
    }

    #[test]
    fn test_csv_parser_accepts_bom_and_crlf() {
        let rows = parse_csv("\u{feff}Anio;Mes;Monto_Venta\r\n2024;1;100\r\n").unwrap();
        assert_eq!(rows[0].fields, vec!["2024", "1", "100"]);
    }

    #[test]
    fn test_csv_parser_keeps_ragged_rows_for_validation() {
        let rows = parse_csv("Anio;Mes;Monto_Venta\n2024;1\n").unwrap();
        assert_eq!(rows[0].fields.len(), 2);
    }

    #[test]
    fn test_header_must_match_exactly() {
        let err = parse_csv("anio;mes;monto_venta\n2024;1;100\n").unwrap_err();
        assert!(matches!(err, ImportError::InvalidHeader { .. }));

        let err = parse_csv("Anio;Mes;Monto_Venta;Extra\n2024;1;100;1\n").unwrap_err();
        assert!(matches!(err, ImportError::InvalidHeader { .. }));

        let err = parse_csv("Anio,Mes,Monto_Venta\n2024,1,100\n").unwrap_err();
        assert_eq!(err.kind(), ImportErrorKind::FileFormat);
    }

    #[test]
    fn test_empty_and_header_only_files() {
        assert!(matches!(parse_csv("").unwrap_err(), ImportError::EmptyFile));
        assert!(matches!(
            parse_csv("Anio;Mes;Monto_Venta\n").unwrap_err(),
            ImportError::NoDataRows
        ));
    }

    #[test]
    fn test_row_limit() {
        let mut content = String::from("Anio;Mes;Monto_Venta\n");
        for i in 0..4 {
            content.push_str(&format!("2024;{};10\n", i + 1));
        }
        let err = CsvParser.parse_bytes(content.as_bytes(), 3).unwrap_err();
        assert!(matches!(err, ImportError::TooManyRows { max: 3, found: 4 }));

        assert_eq!(CsvParser.parse_bytes(content.as_bytes(), 4).unwrap().len(), 4);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = UniversalFileParser
            .parse_bytes("ventas.txt", b"Anio;Mes;Monto_Venta\n", DEFAULT_MAX_DATA_ROWS)
            .unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat(ref ext) if ext == "txt"));
        assert_eq!(err.kind(), ImportErrorKind::FileFormat);
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let parsed = UniversalFileParser
            .parse_bytes("VENTAS.CSV", b"Anio;Mes;Monto_Venta\n2024;1;1\n", DEFAULT_MAX_DATA_ROWS)
            .unwrap();
        assert_eq!(parsed.file_name, "VENTAS.CSV");
        assert_eq!(parsed.rows.len(), 1);
    }

    #[test]
    fn test_xlsx_rows_numbered_from_sheet_origin() {
        // sheet starts at A2, row 5 is empty, D3 holds only spaces
        let content = include_bytes!("../../tests/fixtures/ventas_2024.xlsx");
        let parsed = UniversalFileParser
            .parse_bytes("ventas_2024.xlsx", content, DEFAULT_MAX_DATA_ROWS)
            .unwrap();

        let numbers: Vec<usize> = parsed.rows.iter().map(|r| r.row_number).collect();
        assert_eq!(numbers, vec![3, 4, 6]);
        assert_eq!(parsed.rows[0].fields, vec!["2024", "1", "150000.5"]);
        assert_eq!(parsed.rows[1].fields, vec!["2024", "2", "152000"]);
        assert_eq!(parsed.rows[2].fields, vec!["2024", "3", "153250.75"]);
    }

    #[test]
    fn test_xlsx_row_limit() {
        let content = include_bytes!("../../tests/fixtures/ventas_2024.xlsx");
        let err = ExcelParser::new(SpreadsheetKind::Xlsx)
            .parse_bytes(content, 2)
            .unwrap_err();
        assert!(matches!(err, ImportError::TooManyRows { max: 2, found: 3 }));
    }

    #[test]
    fn test_corrupt_spreadsheet_is_a_format_error() {
        let err = UniversalFileParser
            .parse_bytes("ventas.xlsx", b"not a zip archive", DEFAULT_MAX_DATA_ROWS)
            .unwrap_err();
        assert_eq!(err.kind(), ImportErrorKind::FileFormat);
    }

    #[test]
    fn test_parse_path() {
        let mut temp_file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(temp_file, "Anio;Mes;Monto_Venta").unwrap();
        writeln!(temp_file, "2023;12;99.9").unwrap();
        temp_file.flush().unwrap();

        let parsed = UniversalFileParser
            .parse_path(temp_file.path(), DEFAULT_MAX_DATA_ROWS)
            .unwrap();
        assert_eq!(parsed.rows.len(), 1);

        let missing = UniversalFileParser
            .parse_path("/nonexistent/ventas.csv", DEFAULT_MAX_DATA_ROWS)
            .unwrap_err();
        assert!(matches!(missing, ImportError::FileNotFound(_)));
    }
}
