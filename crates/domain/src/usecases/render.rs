//! Report rendering - turns an engagement report into CSV and PDF bytes
//!
//! Both renderers are pure. The PDF is a single-font PDF 1.4 document with
//! uncompressed content streams, which every common viewer accepts.

use std::fmt::Write as _;

use time::format_description::well_known::Rfc3339;

use crate::model::{EngagementReport, EngagementStat};

/// CSV header row
pub const CSV_HEADER: &str = "job_id,executed_at,likes,comments,shares";

const PAGE_WIDTH: u32 = 612;
const PAGE_HEIGHT: u32 = 792;
const MARGIN_LEFT: u32 = 50;
const TOP_BASELINE: u32 = 742;
const FONT_SIZE: u32 = 11;
const LEADING: u32 = 14;
const LINES_PER_PAGE: usize = 48;

/// Render the report as CSV with one row per job and a trailing `TOTAL` row
pub fn render_csv(report: &EngagementReport) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(CSV_HEADER);
    out.push_str("\r\n");

    for stat in &report.stats {
        let fields = [
            stat.job_id.to_string(),
            format_timestamp(stat),
            stat.likes.to_string(),
            stat.comments.to_string(),
            stat.shares.to_string(),
        ];
        let row: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
        out.push_str(&row.join(","));
        out.push_str("\r\n");
    }

    let _ = write!(
        out,
        "TOTAL,,{},{},{}\r\n",
        report.totals.likes, report.totals.comments, report.totals.shares
    );

    out.into_bytes()
}

/// Quote a field when it contains a delimiter, quote or line break
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn format_timestamp(stat: &EngagementStat) -> String {
    stat.executed_at
        .format(&Rfc3339)
        .unwrap_or_else(|_| stat.executed_at.to_string())
}

/// Lines printed in the PDF, summary first so totals always land on page one
pub fn summary_lines(report: &EngagementReport) -> Vec<String> {
    let mut lines = vec![
        "Engagement report".to_string(),
        format!(
            "Window: last {} entries ({} found)",
            report.requested,
            report.stats.len()
        ),
        String::new(),
        format!("Total likes: {}", report.totals.likes),
        format!("Total comments: {}", report.totals.comments),
        format!("Total shares: {}", report.totals.shares),
        format!("Average likes: {:.2}", report.averages.likes),
        format!("Average comments: {:.2}", report.averages.comments),
        format!("Average shares: {:.2}", report.averages.shares),
        String::new(),
    ];

    if report.stats.is_empty() {
        lines.push("No published jobs in the log yet.".to_string());
        return lines;
    }

    lines.push("Job        Executed at                 Likes  Comments  Shares".to_string());
    for stat in &report.stats {
        let id = stat.job_id.to_string();
        lines.push(format!(
            "{}   {:<26}  {:>5}  {:>8}  {:>6}",
            &id[..8],
            format_timestamp(stat),
            stat.likes,
            stat.comments,
            stat.shares
        ));
    }
    lines
}

/// Render the report as a minimal PDF document
pub fn render_pdf(report: &EngagementReport) -> Vec<u8> {
    let lines = summary_lines(report);
    let pages: Vec<&[String]> = lines.chunks(LINES_PER_PAGE).collect();

    // 1 catalog, 2 page tree, 3 font, then a (page, contents) pair per page
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 4 + i * 2).collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{} 0 R", id))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            pages.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    for (page, page_id) in pages.iter().zip(&page_ids) {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            PAGE_WIDTH,
            PAGE_HEIGHT,
            page_id + 1
        ));

        let stream = content_stream(page);
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            stream.len(),
            stream
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        let _ = write!(out, "{} 0 obj\n{}\nendobj\n", index + 1, body);
    }

    let xref_offset = out.len();
    let _ = write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = write!(out, "{:010} 00000 n \n", offset);
    }
    let _ = write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    );

    out.into_bytes()
}

fn content_stream(lines: &[String]) -> String {
    let mut stream = format!(
        "BT\n/F1 {} Tf\n{} TL\n{} {} Td",
        FONT_SIZE, LEADING, MARGIN_LEFT, TOP_BASELINE
    );
    for line in lines {
        let _ = write!(stream, "\n({}) Tj T*", escape_pdf_text(line));
    }
    stream.push_str("\nET");
    stream
}

/// Escape a string literal for a PDF content stream; Helvetica here only covers ASCII
fn escape_pdf_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '(' => escaped.push_str("\\("),
            ')' => escaped.push_str("\\)"),
            c if c.is_ascii() && !c.is_ascii_control() => escaped.push(c),
            _ => escaped.push('?'),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EngagementAverages, EngagementTotals};
    use time::macros::datetime;
    use uuid::Uuid;

    fn report(count: usize) -> EngagementReport {
        let stats: Vec<EngagementStat> = (0..count)
            .map(|i| EngagementStat {
                job_id: Uuid::from_u128(i as u128 + 1),
                executed_at: datetime!(2025-01-31 14:30 UTC),
                likes: 10 + i as u64,
                comments: 2,
                shares: 1,
            })
            .collect();
        let totals = EngagementTotals {
            likes: stats.iter().map(|s| s.likes).sum(),
            comments: stats.iter().map(|s| s.comments).sum(),
            shares: stats.iter().map(|s| s.shares).sum(),
        };
        EngagementReport {
            requested: count,
            averages: EngagementAverages {
                likes: totals.likes as f64 / count.max(1) as f64,
                comments: 2.0,
                shares: 1.0,
            },
            stats,
            totals,
        }
    }

    #[test]
    fn test_csv_rows_and_total() {
        let csv = String::from_utf8(render_csv(&report(2))).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[1],
            "00000000-0000-0000-0000-000000000001,2025-01-31T14:30:00Z,10,2,1"
        );
        assert_eq!(lines[3], "TOTAL,,21,4,2");
    }

    #[test]
    fn test_csv_quotes_special_fields() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_pdf_structure_and_totals() {
        let pdf = String::from_utf8(render_pdf(&report(3))).unwrap();

        assert!(pdf.starts_with("%PDF-1.4\n"));
        assert!(pdf.trim_end().ends_with("%%EOF"));
        assert!(pdf.contains("/BaseFont /Helvetica"));
        assert!(pdf.contains("(Total likes: 33) Tj"));
        assert!(pdf.contains("(Total comments: 6) Tj"));
        assert!(pdf.contains("(Total shares: 3) Tj"));
    }

    #[test]
    fn test_pdf_xref_offsets_point_at_objects() {
        let pdf = String::from_utf8(render_pdf(&report(2))).unwrap();

        let startxref = pdf.rfind("startxref\n").unwrap();
        let xref_offset: usize = pdf[startxref + "startxref\n".len()..]
            .lines()
            .next()
            .unwrap()
            .parse()
            .unwrap();
        assert!(pdf[xref_offset..].starts_with("xref\n"));

        let entries: Vec<&str> = pdf[xref_offset..].lines().skip(3).take(5).collect();
        for (index, entry) in entries.iter().enumerate() {
            let offset: usize = entry[..10].parse().unwrap();
            assert!(
                pdf[offset..].starts_with(&format!("{} 0 obj", index + 1)),
                "xref entry {} is off",
                index + 1
            );
        }
    }

    #[test]
    fn test_pdf_paginates_long_reports() {
        let pdf = String::from_utf8(render_pdf(&report(120))).unwrap();
        assert!(pdf.contains("/Count 3"));
    }

    #[test]
    fn test_pdf_escapes_text() {
        assert_eq!(escape_pdf_text("a (b) \\ c"), "a \\(b\\) \\\\ c");
        assert_eq!(escape_pdf_text("café"), "caf?");
    }

    #[test]
    fn test_empty_report_renders() {
        let empty = EngagementReport {
            requested: 5,
            stats: vec![],
            totals: EngagementTotals::default(),
            averages: EngagementAverages::default(),
        };
        let csv = String::from_utf8(render_csv(&empty)).unwrap();
        assert_eq!(csv, format!("{}\r\nTOTAL,,0,0,0\r\n", CSV_HEADER));

        let pdf = String::from_utf8(render_pdf(&empty)).unwrap();
        assert!(pdf.contains("No published jobs in the log yet."));
        assert!(pdf.contains("(Total likes: 0) Tj"));
    }
}
