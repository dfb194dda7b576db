//! XLSX Workbook Generator Module
//! Writes a table as a single-worksheet Office Open XML workbook.
//!
//! Uses direct ZIP/XML generation: text cells are written as inline strings,
//! numbers as numeric cells, and missing cells are simply omitted.

use crate::data::{CellValue, Table};
use crate::export::ExportError;
use log::debug;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Spreadsheet grid limits.
pub const MAX_ROWS: usize = 1_048_576;
pub const MAX_COLUMNS: usize = 16_384;
/// Longest text a single cell may hold.
pub const MAX_CELL_CHARS: usize = 32_767;
/// Longest worksheet name.
pub const MAX_SHEET_NAME_CHARS: usize = 31;

/// XLSX generator for tables
pub struct XlsxGenerator;

impl XlsxGenerator {
    /// Write the workbook into `buffer` and return it with its cursor at the end.
    pub fn write(
        table: &Table,
        sheet_name: &str,
        buffer: Cursor<Vec<u8>>,
    ) -> Result<Cursor<Vec<u8>>, ExportError> {
        Self::check_sheet_name(sheet_name)?;

        let rows = table.height() + 1;
        if rows > MAX_ROWS || table.width() > MAX_COLUMNS {
            return Err(ExportError::TooLarge {
                rows,
                columns: table.width(),
            });
        }

        // Build the sheet first so content errors surface before any archive work
        let sheet = Self::sheet_xml(table)?;

        let mut zip = ZipWriter::new(buffer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        // 1. [Content_Types].xml
        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(Self::content_types_xml().as_bytes())?;

        // 2. _rels/.rels
        zip.start_file("_rels/.rels", options)?;
        zip.write_all(Self::rels_xml().as_bytes())?;

        // 3. docProps
        zip.start_file("docProps/core.xml", options)?;
        zip.write_all(Self::core_props_xml().as_bytes())?;
        zip.start_file("docProps/app.xml", options)?;
        zip.write_all(Self::app_props_xml(sheet_name).as_bytes())?;

        // 4. Workbook and its relationships
        zip.start_file("xl/workbook.xml", options)?;
        zip.write_all(Self::workbook_xml(sheet_name).as_bytes())?;
        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        zip.write_all(Self::workbook_rels_xml().as_bytes())?;

        // 5. Styles (index 1 = bold header)
        zip.start_file("xl/styles.xml", options)?;
        zip.write_all(Self::styles_xml().as_bytes())?;

        // 6. The worksheet itself
        zip.start_file("xl/worksheets/sheet1.xml", options)?;
        zip.write_all(sheet.as_bytes())?;

        let buffer = zip.finish()?;
        debug!(
            "XLSX written: {} rows x {} columns, {} bytes",
            table.height(),
            table.width(),
            buffer.get_ref().len()
        );
        Ok(buffer)
    }

    /// Excel column letters for a zero-based index (0 -> A, 26 -> AA).
    pub fn column_letter(idx: usize) -> String {
        let mut letters = Vec::new();
        let mut n = idx;
        loop {
            letters.push(char::from(b'A' + (n % 26) as u8));
            if n < 26 {
                break;
            }
            n = n / 26 - 1;
        }
        letters.iter().rev().collect()
    }

    /// Characters XML 1.0 cannot carry.
    pub fn is_illegal_char(c: char) -> bool {
        matches!(
            c,
            '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}'
        )
    }

    fn check_sheet_name(name: &str) -> Result<(), ExportError> {
        let invalid = name.trim().is_empty()
            || name.chars().count() > MAX_SHEET_NAME_CHARS
            || name.chars().any(|c| {
                matches!(c, ':' | '\\' | '/' | '?' | '*' | '[' | ']') || Self::is_illegal_char(c)
            })
            || name.starts_with('\'')
            || name.ends_with('\'');

        if invalid {
            Err(ExportError::InvalidSheetName(name.to_string()))
        } else {
            Ok(())
        }
    }

    fn check_text(text: &str, column: &str, row: usize) -> Result<(), ExportError> {
        if let Some(bad) = text.chars().find(|c| Self::is_illegal_char(*c)) {
            return Err(ExportError::IllegalCharacter {
                column: column.to_string(),
                row,
                code: bad as u32,
            });
        }

        let length = text.chars().count();
        if length > MAX_CELL_CHARS {
            return Err(ExportError::TextTooLong {
                column: column.to_string(),
                row,
                length,
            });
        }

        Ok(())
    }

    fn escape(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&apos;"),
                _ => out.push(c),
            }
        }
        out
    }

    fn inline_string_cell(reference: &str, text: &str, style: Option<u32>) -> String {
        let style = style.map(|s| format!(r#" s="{}""#, s)).unwrap_or_default();
        format!(
            r#"<c r="{}"{} t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
            reference,
            style,
            Self::escape(text)
        )
    }

    fn sheet_xml(table: &Table) -> Result<String, ExportError> {
        let names = table.column_names();
        let letters: Vec<String> = (0..names.len()).map(Self::column_letter).collect();

        // Header row (spreadsheet row 1)
        let mut data = String::from(r#"<row r="1">"#);
        for (name, letter) in names.iter().zip(&letters) {
            Self::check_text(name, name, 1)?;
            data.push_str(&Self::inline_string_cell(&format!("{}1", letter), name, Some(1)));
        }
        data.push_str("</row>\n");

        for (idx, row) in table.rows()?.iter().enumerate() {
            let r = idx + 2;
            data.push_str(&format!(r#"<row r="{}">"#, r));

            for ((cell, name), letter) in row.iter().zip(&names).zip(&letters) {
                let reference = format!("{}{}", letter, r);
                match cell {
                    CellValue::Missing => {}
                    CellValue::Number(v) => {
                        if !v.is_finite() {
                            return Err(ExportError::NonFiniteNumber {
                                column: name.clone(),
                                row: r,
                                value: *v,
                            });
                        }
                        data.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, reference, cell));
                    }
                    CellValue::Text(text) => {
                        Self::check_text(text, name, r)?;
                        data.push_str(&Self::inline_string_cell(&reference, text, None));
                    }
                }
            }
            data.push_str("</row>\n");
        }

        let dimension = match letters.last() {
            Some(last) => format!("A1:{}{}", last, table.height() + 1),
            None => "A1".to_string(),
        };

        Ok(format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<dimension ref="{}"/>
<sheetData>
{}</sheetData>
</worksheet>"#,
            dimension, data
        ))
    }

    fn content_types_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
</Types>"#
    }

    fn rels_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#
    }

    fn workbook_xml(sheet_name: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<bookViews><workbookView/></bookViews>
<sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#,
            Self::escape(sheet_name)
        )
    }

    fn workbook_rels_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#
    }

    fn styles_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<fonts count="2"><font><sz val="11"/><name val="Calibri"/><family val="2"/></font><font><b/><sz val="11"/><name val="Calibri"/><family val="2"/></font></fonts>
<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>
<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
<cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs>
<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>
</styleSheet>"#
    }

    fn core_props_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<dc:creator>Data Sweeper</dc:creator>
<cp:lastModifiedBy>Data Sweeper</cp:lastModifiedBy>
</cp:coreProperties>"#
    }

    fn app_props_xml(sheet_name: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
<Application>Data Sweeper</Application>
<DocSecurity>0</DocSecurity>
<ScaleCrop>false</ScaleCrop>
<TitlesOfParts><vt:vector size="1" baseType="lpstr"><vt:lpstr>{}</vt:lpstr></vt:vector></TitlesOfParts>
<LinksUpToDate>false</LinksUpToDate>
<SharedDoc>false</SharedDoc>
<HyperlinksChanged>false</HyperlinksChanged>
<AppVersion>16.0300</AppVersion>
</Properties>"#,
            Self::escape(sheet_name)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::load;

    #[test]
    fn column_letters() {
        assert_eq!(XlsxGenerator::column_letter(0), "A");
        assert_eq!(XlsxGenerator::column_letter(25), "Z");
        assert_eq!(XlsxGenerator::column_letter(26), "AA");
        assert_eq!(XlsxGenerator::column_letter(701), "ZZ");
        assert_eq!(XlsxGenerator::column_letter(702), "AAA");
        assert_eq!(XlsxGenerator::column_letter(MAX_COLUMNS - 1), "XFD");
    }

    #[test]
    fn escape_handles_markup() {
        assert_eq!(
            XlsxGenerator::escape(r#"a<b>&"c'"#),
            "a&lt;b&gt;&amp;&quot;c&apos;"
        );
    }

    #[test]
    fn sheet_xml_writes_typed_cells_and_skips_missing() {
        let table = load(b"n,t\n1.5,x&y\n,z\n", ".csv").expect("load");
        let xml = XlsxGenerator::sheet_xml(&table).expect("xml");

        assert!(xml.contains(r#"<dimension ref="A1:B3"/>"#));
        assert!(xml.contains(r#"<c r="A2"><v>1.5</v></c>"#));
        assert!(xml.contains("x&amp;y"));
        assert!(!xml.contains(r#"<c r="A3""#));
        assert!(xml.contains(r#"<c r="A1" s="1" t="inlineStr">"#));
    }

    #[test]
    fn control_characters_are_rejected() {
        let table = load(b"t\nok\nbad\x01value\n", ".csv").expect("load");
        let err = XlsxGenerator::sheet_xml(&table).unwrap_err();
        assert!(matches!(
            err,
            ExportError::IllegalCharacter { row: 3, code: 1, .. }
        ));
    }

    #[test]
    fn sheet_names_are_validated() {
        assert!(XlsxGenerator::check_sheet_name("Sheet1").is_ok());
        assert!(XlsxGenerator::check_sheet_name("a/b").is_err());
        assert!(XlsxGenerator::check_sheet_name("").is_err());
        assert!(XlsxGenerator::check_sheet_name(&"x".repeat(32)).is_err());
    }

    #[test]
    fn workbook_is_a_zip_archive() {
        let table = load(b"a\n1\n", ".csv").expect("load");
        let buffer =
            XlsxGenerator::write(&table, "Sheet1", Cursor::new(Vec::new())).expect("write");
        assert_eq!(&buffer.get_ref()[..2], b"PK");
    }
}
