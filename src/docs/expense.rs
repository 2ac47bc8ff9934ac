//! Expense report composer: claimant fields and an expense-line table
//! with totals.

use serde::{Deserialize, Serialize};

use crate::measure::Measure;
use crate::model::{
    Alignment, Block, Color, DraftDocument, Metadata, PagedDocument, SheetFormat, TableBlock,
};

use super::{label_value, money, CompanyProfile, DocumentKind, VerifyUrl};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseLine {
    pub date: String,
    pub category: String,
    pub description: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseReport {
    pub company: CompanyProfile,
    pub claimant: String,
    pub department: String,
    /// Reporting period, e.g. `"Q1 2026"`.
    pub period: String,
    pub lines: Vec<ExpenseLine>,
    pub record_id: String,
}

impl ExpenseReport {
    pub fn verify_url(&self) -> VerifyUrl {
        VerifyUrl {
            domain: self.company.domain.clone(),
            kind: DocumentKind::ExpenseReport,
            record_id: self.record_id.clone(),
        }
    }

    pub fn total(&self) -> f64 {
        self.lines.iter().map(|l| l.amount).sum()
    }

    pub fn compose(&self, measure: &impl Measure) -> PagedDocument {
        let mut rows: Vec<Vec<String>> = self
            .lines
            .iter()
            .map(|l| {
                vec![
                    l.date.clone(),
                    l.category.clone(),
                    l.description.clone(),
                    money(l.amount),
                ]
            })
            .collect();
        rows.push(vec![
            String::new(),
            String::new(),
            "Total".to_string(),
            money(self.total()),
        ]);

        let blocks = vec![
            Block::heading(format!("Expense Report — {}", self.period), 22.0)
                .with_align(Alignment::Center),
            label_value("Claimant", &self.claimant),
            label_value("Department", &self.department),
            Block::divider(),
            Block::table(TableBlock {
                border_width: 1.0,
                border_color: Color::from_rgb8(120, 120, 120),
                header: vec![
                    "Date".to_string(),
                    "Category".to_string(),
                    "Description".to_string(),
                    "Amount".to_string(),
                ],
                rows,
            }),
        ];

        let draft = DraftDocument {
            format: SheetFormat::A4Portrait,
            chrome: self.company.chrome(&self.verify_url()),
            metadata: Metadata {
                title: Some(format!("Expense Report {} {}", self.claimant, self.period)),
                author: Some(self.company.name.clone()),
                subject: Some("Expense Report".to_string()),
                creator: None,
            },
            blocks,
        };
        crate::compose(draft, measure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::TextMeasurer;
    use crate::model::BlockKind;

    #[test]
    fn table_ends_with_the_total_row() {
        let report = ExpenseReport {
            company: CompanyProfile {
                name: "Apex Broadcasting".to_string(),
                domain: "apex.example".to_string(),
                ..CompanyProfile::default()
            },
            claimant: "Jordan Smith".to_string(),
            department: "Newsroom".to_string(),
            period: "Q1 2026".to_string(),
            lines: vec![
                ExpenseLine {
                    date: "2026-01-14".to_string(),
                    category: "Travel".to_string(),
                    description: "Client site visit".to_string(),
                    amount: 240.5,
                },
                ExpenseLine {
                    date: "2026-02-02".to_string(),
                    category: "Meals".to_string(),
                    description: "Team offsite".to_string(),
                    amount: 89.5,
                },
            ],
            record_id: "EXP-12".to_string(),
        };
        let doc = report.compose(&TextMeasurer::new());
        let table = doc
            .sheets
            .iter()
            .flat_map(|s| s.blocks.iter())
            .find_map(|b| match &b.kind {
                BlockKind::Table(t) => Some(t),
                _ => None,
            })
            .expect("report has a table");
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[2][3], "330.00");
    }
}
