use crate::model::SummaryRow;
use anyhow::Result;
use serde_json::{json, Value};

/// Summary rows as JSON objects, with `trend_data` as a real array.
pub fn summary_to_json(rows: &[SummaryRow]) -> Value {
    Value::Array(
        rows.iter()
            .map(|row| {
                json!({
                    "ecosystem": row.ecosystem,
                    "type": row.kind,
                    "total_affected": row.total_affected,
                    "most_affected_package": row.most_affected_package,
                    "peak_attack_year": row.peak_attack_year,
                    "trend_data": row.trend_data,
                })
            })
            .collect(),
    )
}

pub fn print_summary_json(rows: &[SummaryRow]) -> Result<()> {
    let json = serde_json::to_string_pretty(&summary_to_json(rows))?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AdvisoryKind;

    #[test]
    fn test_trend_is_an_array() {
        let rows = vec![SummaryRow {
            ecosystem: "npm".to_string(),
            kind: AdvisoryKind::MaliciousCode,
            total_affected: 3,
            most_affected_package: "evil".to_string(),
            peak_attack_year: "2024".to_string(),
            trend_data: vec![0, 1, 2],
        }];

        let value = summary_to_json(&rows);
        assert_eq!(value[0]["type"], "Malicious Code");
        assert_eq!(value[0]["trend_data"], json!([0, 1, 2]));
        assert_eq!(value[0]["total_affected"], 3);
    }
}
