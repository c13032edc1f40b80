//! Bulk contact import from `nome,telefone` CSV files.
//!
//! Rows missing either column are dropped without being reported one by one;
//! callers only get aggregate counts.

use serde::Serialize;

use crate::error::{ImportError, ValidationError};
use crate::models::{Contact, NewContact};
use crate::phone;
use crate::store::ContactStore;

pub const NAME_COLUMN: &str = "nome";
pub const PHONE_COLUMN: &str = "telefone";
pub const PREVIEW_LEN: usize = 5;

/// How strictly phone numbers are checked while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Digits are stripped but short numbers are kept. Used for previews.
    Lax,
    /// Numbers under the minimum length are dropped.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub candidates: Vec<NewContact>,
    pub total_rows: usize,
}

impl Parsed {
    pub fn dropped(&self) -> usize {
        self.total_rows - self.candidates.len()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportPreview {
    /// First few candidates only.
    pub contacts: Vec<NewContact>,
    pub valid: usize,
    pub total_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub inserted: usize,
    pub dropped: usize,
    pub total_rows: usize,
    pub contacts: Vec<Contact>,
}

pub fn parse(input: &[u8], mode: Mode) -> Result<Parsed, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    let name_idx = headers.iter().position(|h| h == NAME_COLUMN);
    let phone_idx = headers.iter().position(|h| h == PHONE_COLUMN);

    let mut candidates = Vec::new();
    let mut total_rows = 0;
    for record in reader.records() {
        let record = record?;
        total_rows += 1;

        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };
        let (Some(name), Some(raw_phone)) = (field(name_idx), field(phone_idx)) else {
            continue;
        };

        let phone = match mode {
            Mode::Lax => phone::normalize(raw_phone),
            Mode::Strict => match phone::normalize_strict(raw_phone) {
                Ok(digits) => digits,
                Err(_) => continue,
            },
        };
        candidates.push(NewContact {
            name: name.to_string(),
            phone,
        });
    }

    Ok(Parsed {
        candidates,
        total_rows,
    })
}

pub fn preview(input: &[u8]) -> Result<ImportPreview, ImportError> {
    let parsed = parse(input, Mode::Lax)?;
    let valid = parsed.candidates.len();
    Ok(ImportPreview {
        contacts: parsed.candidates.into_iter().take(PREVIEW_LEN).collect(),
        valid,
        total_rows: parsed.total_rows,
    })
}

/// Parse strictly and insert every surviving row in one batch.
pub async fn commit(store: &dyn ContactStore, input: &[u8]) -> Result<ImportSummary, ImportError> {
    let parsed = parse(input, Mode::Strict)?;
    if parsed.candidates.is_empty() {
        return Err(ValidationError::NoValidRows {
            total_rows: parsed.total_rows,
        }
        .into());
    }

    let dropped = parsed.dropped();
    let contacts = store.insert_contacts(&parsed.candidates).await?;
    tracing::info!(
        inserted = contacts.len(),
        dropped,
        total_rows = parsed.total_rows,
        "imported contacts from CSV"
    );

    Ok(ImportSummary {
        inserted: contacts.len(),
        dropped,
        total_rows: parsed.total_rows,
        contacts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContactQuery, ContactStatus};
    use crate::store::MemoryStore;

    const MIXED: &str = "nome,telefone\nAna,11999998888\n,11988887777\nBob,123";

    #[test]
    fn strict_parse_drops_missing_and_short() {
        let parsed = parse(MIXED.as_bytes(), Mode::Strict).unwrap();
        assert_eq!(
            parsed.candidates,
            vec![NewContact {
                name: "Ana".into(),
                phone: "11999998888".into()
            }]
        );
        assert_eq!(parsed.total_rows, 3);
        assert_eq!(parsed.dropped(), 2);
    }

    #[test]
    fn lax_parse_keeps_short_numbers() {
        let parsed = parse(MIXED.as_bytes(), Mode::Lax).unwrap();
        let names: Vec<_> = parsed.candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Ana", "Bob"]);
        assert_eq!(parsed.candidates[1].phone, "123");
    }

    #[test]
    fn values_are_trimmed_and_phones_normalized() {
        let input = " nome , telefone \n  Ana Maria  , (11) 99999-8888 \n   ,  \n";
        let parsed = parse(input.as_bytes(), Mode::Strict).unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.candidates[0].name, "Ana Maria");
        assert_eq!(parsed.candidates[0].phone, "11999998888");
    }

    #[test]
    fn extra_columns_and_ragged_rows() {
        let input = "id,telefone,nome\n1,11999998888,Ana\n2,11988887777\n3";
        let parsed = parse(input.as_bytes(), Mode::Strict).unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.candidates[0].name, "Ana");
        assert_eq!(parsed.total_rows, 3);
    }

    #[test]
    fn missing_header_column_yields_no_candidates() {
        let input = "name,phone\nAna,11999998888\n";
        let parsed = parse(input.as_bytes(), Mode::Lax).unwrap();
        assert!(parsed.candidates.is_empty());
        assert_eq!(parsed.total_rows, 1);
    }

    #[test]
    fn quoted_fields() {
        let input = "nome,telefone\n\"Silva, João\",\"+55 (11) 99999-8888\"\n";
        let parsed = parse(input.as_bytes(), Mode::Strict).unwrap();
        assert_eq!(parsed.candidates[0].name, "Silva, João");
        assert_eq!(parsed.candidates[0].phone, "5511999998888");
    }

    #[test]
    fn preview_is_capped() {
        let mut input = String::from("nome,telefone\n");
        for i in 0..8 {
            input.push_str(&format!("Contato {i},1199999000{i}\n"));
        }
        let preview = preview(input.as_bytes()).unwrap();
        assert_eq!(preview.contacts.len(), PREVIEW_LEN);
        assert_eq!(preview.valid, 8);
        assert_eq!(preview.total_rows, 8);
    }

    #[test]
    fn invalid_utf8_is_a_csv_error() {
        let input = b"nome,telefone\n\xff\xfe,11999998888\n";
        assert!(matches!(preview(input), Err(ImportError::Csv(_))));
    }

    #[tokio::test]
    async fn commit_inserts_pending_contacts() {
        let store = MemoryStore::new();
        let summary = commit(&store, MIXED.as_bytes()).await.unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.dropped, 2);

        let stored = store.list_contacts(&ContactQuery::default()).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "Ana");
        assert_eq!(stored[0].phone, "11999998888");
        assert_eq!(stored[0].status, ContactStatus::Pending);
    }

    #[tokio::test]
    async fn commit_all_invalid_inserts_nothing() {
        let store = MemoryStore::new();
        let input = "nome,telefone\n,11999998888\nBob,123\nCid,\n";
        let err = commit(&store, input.as_bytes()).await.unwrap_err();
        assert!(matches!(
            err,
            ImportError::Validation(ValidationError::NoValidRows { total_rows: 3 })
        ));
        assert!(store
            .list_contacts(&ContactQuery::default())
            .await
            .unwrap()
            .is_empty());
    }
}
