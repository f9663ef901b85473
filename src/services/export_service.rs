use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};

use crate::error::Result;

/// Flat per-student aggregate used by both export formats.
#[derive(Debug, Clone)]
pub struct StudentExportRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub class_label: String,
    pub total_points: i64,
    pub completed_lessons: i64,
    pub average_percentage: f64,
    pub total_attempts: i64,
}

const CSV_HEADERS: [&str; 8] = [
    "ID",
    "First name",
    "Last name",
    "Class",
    "Total points",
    "Lessons completed",
    "Average percent",
    "Total attempts",
];

pub struct ExportService;

impl ExportService {
    /// CSV with a UTF-8 byte-order mark so spreadsheet apps pick up the
    /// encoding (Cyrillic names otherwise render as mojibake in Excel).
    pub fn students_csv(rows: &[StudentExportRow]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&[0xEF, 0xBB, 0xBF]);

        let mut push_record = |fields: &[String]| {
            let line = fields
                .iter()
                .map(|f| csv_escape(f))
                .collect::<Vec<_>>()
                .join(",");
            out.extend_from_slice(line.as_bytes());
            out.extend_from_slice(b"\r\n");
        };

        push_record(&CSV_HEADERS.map(String::from));
        for row in rows {
            push_record(&[
                row.id.to_string(),
                row.first_name.clone(),
                row.last_name.clone(),
                row.class_label.clone(),
                row.total_points.to_string(),
                row.completed_lessons.to_string(),
                format!("{:.2}", row.average_percentage),
                row.total_attempts.to_string(),
            ]);
        }
        out
    }

    /// Styled workbook variant of the same table.
    pub fn students_xlsx(rows: &[StudentExportRow]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Students")?;

        let header_format = Format::new()
            .set_bold()
            .set_font_color(Color::White)
            .set_background_color(Color::RGB(0x0F172A))
            .set_align(FormatAlign::Center)
            .set_border(FormatBorder::Thin);
        let cell_format = Format::new().set_border(FormatBorder::Thin);
        let percent_format = Format::new()
            .set_num_format("0.00")
            .set_border(FormatBorder::Thin);

        let widths = [8.0, 20.0, 20.0, 12.0, 14.0, 18.0, 16.0, 14.0];
        for (col, width) in widths.iter().enumerate() {
            worksheet.set_column_width(col as u16, *width)?;
        }

        for (col, title) in CSV_HEADERS.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *title, &header_format)?;
        }

        for (i, row) in rows.iter().enumerate() {
            let r = i as u32 + 1;
            worksheet.write_number_with_format(r, 0, row.id as f64, &cell_format)?;
            worksheet.write_string_with_format(r, 1, &row.first_name, &cell_format)?;
            worksheet.write_string_with_format(r, 2, &row.last_name, &cell_format)?;
            worksheet.write_string_with_format(r, 3, &row.class_label, &cell_format)?;
            worksheet.write_number_with_format(r, 4, row.total_points as f64, &cell_format)?;
            worksheet.write_number_with_format(r, 5, row.completed_lessons as f64, &cell_format)?;
            worksheet.write_number_with_format(r, 6, row.average_percentage, &percent_format)?;
            worksheet.write_number_with_format(r, 7, row.total_attempts as f64, &cell_format)?;
        }

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}

fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
