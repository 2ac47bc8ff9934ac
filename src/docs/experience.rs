//! Experience letter composer: dated letter paragraphs confirming role
//! and tenure.

use serde::{Deserialize, Serialize};

use crate::measure::Measure;
use crate::model::{
    Alignment, Block, DraftDocument, Metadata, PagedDocument, SheetFormat,
};

use super::{CompanyProfile, DocumentKind, VerifyUrl};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceLetter {
    pub company: CompanyProfile,
    pub employee_name: String,
    pub designation: String,
    pub joined_on: String,
    pub left_on: String,
    pub issued_on: String,
    /// Extra paragraphs appended before the closing, if any.
    #[serde(default)]
    pub remarks: Vec<String>,
    pub record_id: String,
}

impl ExperienceLetter {
    pub fn verify_url(&self) -> VerifyUrl {
        VerifyUrl {
            domain: self.company.domain.clone(),
            kind: DocumentKind::ExperienceLetter,
            record_id: self.record_id.clone(),
        }
    }

    pub fn compose(&self, measure: &impl Measure) -> PagedDocument {
        let mut blocks = vec![
            Block::text(format!("Date: {}", self.issued_on)).with_align(Alignment::Right),
            Block::heading("TO WHOM IT MAY CONCERN", 18.0).with_align(Alignment::Center),
            Block::text(format!(
                "This is to certify that {} was employed with {} as {} from {} to {}.",
                self.employee_name, self.company.name, self.designation, self.joined_on,
                self.left_on
            )),
            Block::text(format!(
                "During this period, {} carried out the assigned responsibilities \
                 diligently and maintained a professional standard of conduct.",
                self.employee_name
            )),
        ];
        for remark in &self.remarks {
            blocks.push(Block::text(remark.clone()));
        }
        blocks.push(Block::text(
            "We wish them continued success in their future endeavours.",
        ));
        blocks.push(Block::text(format!("For {},", self.company.name)));

        let draft = DraftDocument {
            format: SheetFormat::A4Portrait,
            chrome: self.company.chrome(&self.verify_url()),
            metadata: Metadata {
                title: Some(format!("Experience Letter {}", self.employee_name)),
                author: Some(self.company.name.clone()),
                subject: Some("Experience Letter".to_string()),
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

    #[test]
    fn letter_mentions_role_and_tenure() {
        let letter = ExperienceLetter {
            company: CompanyProfile {
                name: "Apex Broadcasting".to_string(),
                domain: "apex.example".to_string(),
                ..CompanyProfile::default()
            },
            employee_name: "Jordan Smith".to_string(),
            designation: "Senior Editor".to_string(),
            joined_on: "2021-05-01".to_string(),
            left_on: "2026-02-28".to_string(),
            issued_on: "2026-03-05".to_string(),
            remarks: vec![],
            record_id: "XL-88".to_string(),
        };
        let doc = letter.compose(&TextMeasurer::new());
        let body: String = doc
            .sheets
            .iter()
            .flat_map(|s| s.blocks.iter())
            .map(|b| b.plain_text())
            .collect();
        assert!(body.contains("Senior Editor"));
        assert!(body.contains("from 2021-05-01 to 2026-02-28"));
        assert_eq!(
            doc.chrome.qr_payload.as_deref(),
            Some("https://apex.example/experience-letter/verify?qrid=XL-88")
        );
    }
}
