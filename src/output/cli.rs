use crate::model::{format_trend, SummaryRow};
use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct SummaryTableRow {
    #[tabled(rename = "Ecosystem")]
    ecosystem: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Affected")]
    total_affected: u64,
    #[tabled(rename = "Top Package")]
    package: String,
    #[tabled(rename = "Peak Year")]
    peak_year: String,
    #[tabled(rename = "Trend")]
    trend: String,
}

pub fn render_summary_table(rows: &[SummaryRow]) -> String {
    let rows: Vec<SummaryTableRow> = rows
        .iter()
        .map(|row| SummaryTableRow {
            ecosystem: row.ecosystem.clone(),
            kind: row.kind.to_string(),
            total_affected: row.total_affected,
            package: truncate(&row.most_affected_package, 40),
            peak_year: row.peak_attack_year.clone(),
            trend: format_trend(&row.trend_data),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn print_summary_table(rows: &[SummaryRow]) -> Result<()> {
    println!();
    if rows.is_empty() {
        println!("No summary rows.");
        return Ok(());
    }

    println!("{} ecosystem groups:", rows.len());
    println!();
    println!("{}", render_summary_table(rows));
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AdvisoryKind;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-very-long-package-name", 10), "a-very-...");
    }

    #[test]
    fn test_table_contains_row_values() {
        let table = render_summary_table(&[SummaryRow {
            ecosystem: "crates.io".to_string(),
            kind: AdvisoryKind::Vulnerability,
            total_affected: 12,
            most_affected_package: "openssl".to_string(),
            peak_attack_year: "2021".to_string(),
            trend_data: vec![1, 2],
        }]);

        assert!(table.contains("Top Package"));
        assert!(table.contains("crates.io"));
        assert!(table.contains("openssl"));
        assert!(table.contains("[1, 2]"));
    }
}
