//! Agreement composer: wraps authored body blocks — the editor's own
//! document — in agreement chrome.

use serde::{Deserialize, Serialize};

use crate::measure::Measure;
use crate::model::{Alignment, Block, DraftDocument, Metadata, PagedDocument, SheetFormat};

use super::{CompanyProfile, DocumentKind, VerifyUrl};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agreement {
    pub company: CompanyProfile,
    pub title: String,
    /// The counterparty named under the title.
    #[serde(default)]
    pub counterparty: Option<String>,
    /// Authored content, usually straight out of the editor.
    pub body: Vec<Block>,
    pub record_id: String,
}

impl Agreement {
    pub fn verify_url(&self) -> VerifyUrl {
        VerifyUrl {
            domain: self.company.domain.clone(),
            kind: DocumentKind::Agreement,
            record_id: self.record_id.clone(),
        }
    }

    pub fn compose(&self, measure: &impl Measure) -> PagedDocument {
        let mut blocks = vec![
            Block::heading(self.title.clone(), 22.0).with_align(Alignment::Center)
        ];
        if let Some(counterparty) = &self.counterparty {
            blocks.push(
                Block::text(format!("Between {} and {}", self.company.name, counterparty))
                    .with_align(Alignment::Center),
            );
        }
        blocks.push(Block::divider());
        blocks.extend(self.body.iter().cloned());

        let draft = DraftDocument {
            format: SheetFormat::A4Portrait,
            chrome: self.company.chrome(&self.verify_url()),
            metadata: Metadata {
                title: Some(self.title.clone()),
                author: Some(self.company.name.clone()),
                subject: Some("Agreement".to_string()),
                creator: None,
            },
            blocks,
        };
        crate::compose(draft, measure)
    }
}
