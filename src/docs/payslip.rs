//! Payslip composer: employee header, earnings and deductions tables,
//! net-pay summary.

use serde::{Deserialize, Serialize};

use crate::measure::Measure;
use crate::model::{
    Alignment, Block, Color, DraftDocument, Marks, Metadata, PagedDocument, Run, SheetFormat,
    TableBlock,
};

use super::{label_value, money, CompanyProfile, DocumentKind, VerifyUrl};

/// One earnings or deductions line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayLine {
    pub label: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payslip {
    pub company: CompanyProfile,
    pub employee_name: String,
    pub employee_id: String,
    pub designation: String,
    pub department: String,
    /// Pay period, e.g. `"March 2026"`.
    pub period: String,
    pub pay_date: String,
    pub earnings: Vec<PayLine>,
    pub deductions: Vec<PayLine>,
    pub record_id: String,
}

impl Payslip {
    pub fn verify_url(&self) -> VerifyUrl {
        VerifyUrl {
            domain: self.company.domain.clone(),
            kind: DocumentKind::Payslip,
            record_id: self.record_id.clone(),
        }
    }

    pub fn total_earnings(&self) -> f64 {
        self.earnings.iter().map(|l| l.amount).sum()
    }

    pub fn total_deductions(&self) -> f64 {
        self.deductions.iter().map(|l| l.amount).sum()
    }

    pub fn net_pay(&self) -> f64 {
        self.total_earnings() - self.total_deductions()
    }

    pub fn compose(&self, measure: &impl Measure) -> PagedDocument {
        let mut blocks = vec![
            Block::heading(format!("Payslip — {}", self.period), 22.0)
                .with_align(Alignment::Center),
            label_value("Employee", &self.employee_name),
            label_value("Employee ID", &self.employee_id),
            label_value("Designation", &self.designation),
            label_value("Department", &self.department),
            label_value("Pay Date", &self.pay_date),
            Block::divider(),
        ];

        blocks.push(Block::heading("Earnings", 16.0));
        blocks.push(lines_table(&self.earnings, self.total_earnings()));
        blocks.push(Block::heading("Deductions", 16.0));
        blocks.push(lines_table(&self.deductions, self.total_deductions()));

        blocks.push(Block::divider());
        blocks.push(Block::paragraph(vec![
            Run::styled("Net Pay: ", Marks::bold().with_size(18.0)),
            Run::styled(money(self.net_pay()), Marks::bold().with_size(18.0)),
        ]));

        let draft = DraftDocument {
            format: SheetFormat::A4Portrait,
            chrome: self.company.chrome(&self.verify_url()),
            metadata: Metadata {
                title: Some(format!("Payslip {} {}", self.employee_name, self.period)),
                author: Some(self.company.name.clone()),
                subject: Some("Payslip".to_string()),
                creator: None,
            },
            blocks,
        };
        crate::compose(draft, measure)
    }
}

fn lines_table(lines: &[PayLine], total: f64) -> Block {
    let mut rows: Vec<Vec<String>> = lines
        .iter()
        .map(|l| vec![l.label.clone(), money(l.amount)])
        .collect();
    rows.push(vec!["Total".to_string(), money(total)]);
    Block::table(TableBlock {
        border_width: 1.0,
        border_color: Color::from_rgb8(120, 120, 120),
        header: vec!["Description".to_string(), "Amount".to_string()],
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::TextMeasurer;
    use crate::model::BlockKind;

    fn payslip() -> Payslip {
        Payslip {
            company: CompanyProfile {
                name: "Apex Broadcasting".to_string(),
                domain: "apex.example".to_string(),
                ..CompanyProfile::default()
            },
            employee_name: "Jordan Smith".to_string(),
            employee_id: "E-104".to_string(),
            designation: "Editor".to_string(),
            department: "Newsroom".to_string(),
            period: "March 2026".to_string(),
            pay_date: "2026-03-31".to_string(),
            earnings: vec![
                PayLine { label: "Basic".to_string(), amount: 52000.0 },
                PayLine { label: "Allowances".to_string(), amount: 8000.0 },
            ],
            deductions: vec![PayLine { label: "Tax".to_string(), amount: 11500.0 }],
            record_id: "PS-2026-104".to_string(),
        }
    }

    #[test]
    fn net_pay_is_earnings_minus_deductions() {
        assert_eq!(payslip().net_pay(), 48500.0);
    }

    #[test]
    fn composed_payslip_has_chrome_and_totals() {
        let doc = payslip().compose(&TextMeasurer::new());
        assert!(!doc.sheets.is_empty());
        assert_eq!(
            doc.chrome.qr_payload.as_deref(),
            Some("https://apex.example/payslip/verify?qrid=PS-2026-104")
        );
        let tables: Vec<&TableBlock> = doc
            .sheets
            .iter()
            .flat_map(|s| s.blocks.iter())
            .filter_map(|b| match &b.kind {
                BlockKind::Table(t) => Some(t),
                _ => None,
            })
            .collect();
        assert_eq!(tables.len(), 2);
        let earnings = tables[0];
        assert_eq!(earnings.rows.last().unwrap(), &vec!["Total".to_string(), "60,000.00".to_string()]);
    }
}
