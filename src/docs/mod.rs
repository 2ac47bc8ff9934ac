//! # Document Composers
//!
//! Typed builders for the four generated document kinds. Each composer
//! takes its data struct, produces sheet chrome plus content blocks, and
//! pours them through [`crate::compose`] to get a fully paginated
//! [`crate::model::PagedDocument`] ready for the renderer and the export
//! boundary.
//!
//! Every composed document carries a footer verification QR encoding
//! `https://<domain>/<kind>/verify?qrid=<record-id>`.

pub mod agreement;
pub mod expense;
pub mod experience;
pub mod payslip;

pub use agreement::Agreement;
pub use expense::{ExpenseLine, ExpenseReport};
pub use experience::ExperienceLetter;
pub use payslip::{PayLine, Payslip};

use serde::{Deserialize, Serialize};

use crate::model::{Block, Letterhead, Marks, Run, SheetChrome, SignatureBlock};

/// The four generated document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentKind {
    Payslip,
    ExperienceLetter,
    ExpenseReport,
    Agreement,
}

impl DocumentKind {
    /// The path segment in the verification URL.
    pub fn slug(&self) -> &'static str {
        match self {
            DocumentKind::Payslip => "payslip",
            DocumentKind::ExperienceLetter => "experience-letter",
            DocumentKind::ExpenseReport => "expense-report",
            DocumentKind::Agreement => "agreement",
        }
    }
}

/// The QR payload: `https://<domain>/<kind>/verify?qrid=<record-id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyUrl {
    pub domain: String,
    pub kind: DocumentKind,
    pub record_id: String,
}

impl VerifyUrl {
    pub fn to_url(&self) -> String {
        format!(
            "https://{}/{}/verify?qrid={}",
            self.domain,
            self.kind.slug(),
            self.record_id
        )
    }
}

/// The issuing company's identity and artwork, shared by every composer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    pub name: String,
    #[serde(default)]
    pub address_lines: Vec<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub watermark: Option<String>,
    #[serde(default)]
    pub signatory: Option<SignatureBlock>,
    /// The domain the verification QR points at.
    pub domain: String,
}

impl CompanyProfile {
    /// Sheet chrome carrying the letterhead, artwork, and QR payload.
    pub fn chrome(&self, verify: &VerifyUrl) -> SheetChrome {
        SheetChrome {
            letterhead: Letterhead {
                company: self.name.clone(),
                address_lines: self.address_lines.clone(),
                logo: self.logo.clone(),
            },
            watermark: self.watermark.clone(),
            signature: self.signatory.clone(),
            qr_payload: Some(verify.to_url()),
            ..SheetChrome::default()
        }
    }
}

/// `1234567.5` → `"1,234,567.50"`.
pub(crate) fn money(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;
    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if negative { "-" } else { "" };
    format!("{sign}{grouped}.{frac:02}")
}

/// A "Label: value" paragraph with the label bolded.
pub(crate) fn label_value(label: &str, value: &str) -> Block {
    Block::paragraph(vec![
        Run::styled(format!("{label}: "), Marks::bold()),
        Run::plain(value),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_url_follows_the_template() {
        let url = VerifyUrl {
            domain: "docs.example.com".to_string(),
            kind: DocumentKind::ExperienceLetter,
            record_id: "EMP-0042".to_string(),
        };
        assert_eq!(
            url.to_url(),
            "https://docs.example.com/experience-letter/verify?qrid=EMP-0042"
        );
    }

    #[test]
    fn money_groups_thousands() {
        assert_eq!(money(0.0), "0.00");
        assert_eq!(money(999.9), "999.90");
        assert_eq!(money(1234567.5), "1,234,567.50");
        assert_eq!(money(-45000.0), "-45,000.00");
    }

    #[test]
    fn chrome_carries_the_qr_payload() {
        let company = CompanyProfile {
            name: "Acme Media".to_string(),
            domain: "acme.example".to_string(),
            ..CompanyProfile::default()
        };
        let verify = VerifyUrl {
            domain: company.domain.clone(),
            kind: DocumentKind::Payslip,
            record_id: "7".to_string(),
        };
        let chrome = company.chrome(&verify);
        assert_eq!(
            chrome.qr_payload.as_deref(),
            Some("https://acme.example/payslip/verify?qrid=7")
        );
        assert_eq!(chrome.letterhead.company, "Acme Media");
    }
}
