use serde::{Deserialize, Serialize};

use super::blank::Blank;
use super::string_id;

string_id!(
    /// Id of a content item, unique within its sentence.
    ItemId
);

/// Literal text shown verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextItem {
    pub id: ItemId,
    #[serde(rename = "textContent")]
    pub text: String,
}

/// A placeholder filled in at play time. Saved stories key their values by
/// this item's `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlankItem {
    pub id: ItemId,
    pub blank: Blank,
}

/// The atomic unit of a sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentItem {
    Text(TextItem),
    Blank(BlankItem),
}

impl ContentItem {
    pub fn text(id: impl Into<ItemId>, text: impl Into<String>) -> ContentItem {
        ContentItem::Text(TextItem {
            id: id.into(),
            text: text.into(),
        })
    }

    pub fn blank(id: impl Into<ItemId>, blank: Blank) -> ContentItem {
        ContentItem::Blank(BlankItem {
            id: id.into(),
            blank,
        })
    }

    pub fn id(&self) -> &ItemId {
        match self {
            ContentItem::Text(item) => &item.id,
            ContentItem::Blank(item) => &item.id,
        }
    }

    pub fn as_blank(&self) -> Option<&BlankItem> {
        match self {
            ContentItem::Blank(item) => Some(item),
            ContentItem::Text(_) => None,
        }
    }
}

/// Blank items of a content list, in order.
pub fn blank_items(content: &[ContentItem]) -> impl Iterator<Item = &BlankItem> {
    content.iter().filter_map(ContentItem::as_blank)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_item_json_matches_stored_records() {
        let item = ContentItem::text("text-1", "Once upon a time ");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "text-1", "type": "text", "textContent": "Once upon a time "})
        );
    }

    #[test]
    fn blank_item_reads_stored_records() {
        let item: ContentItem = serde_json::from_str(
            r#"{"id":"blank-1","type":"blank","blank":{"partOfSpeech":"amount of time","hint":"17 seconds"}}"#,
        )
        .unwrap();
        let blank = item.as_blank().unwrap();
        assert_eq!(blank.id, ItemId::from("blank-1"));
        assert_eq!(blank.blank.part_of_speech, "amount of time");
        assert_eq!(blank.blank.hint.as_deref(), Some("17 seconds"));
    }

    #[test]
    fn blank_items_skips_text() {
        let content = vec![
            ContentItem::text("t0", "The "),
            ContentItem::blank("b1", Blank::draft("noun", None)),
            ContentItem::text("t2", " and the "),
            ContentItem::blank("b3", Blank::draft("noun", Some("plural"))),
        ];
        let ids: Vec<&str> = blank_items(&content).map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "b3"]);
    }
}
