use serde::{Deserialize, Serialize};

use crate::geometry::NormalizedBox;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub resale_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub manufacturer_website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub documentation_links: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub warranty_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub description: Option<String>,
}

/// One cataloged crop. Ids are unique across the collection and `list`
/// returns items in creation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub image_url: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub date_added: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub source_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub notes: Option<String>,
    pub original_box: NormalizedBox,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub metadata: Option<ItemMetadata>,
}

/// Commit payload for a new item. Category and tags fall back to values
/// derived from the label when the caller leaves them out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryDraft {
    pub image_url: String,
    pub label: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub source_image_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub original_box: NormalizedBox,
    #[serde(default)]
    pub metadata: Option<ItemMetadata>,
}

impl InventoryDraft {
    pub fn into_item(self, id: String, date_added: String) -> InventoryItem {
        let category = self.category.or_else(|| {
            self.label
                .split_whitespace()
                .next()
                .map(|word| word.to_string())
        });
        let tags = self
            .tags
            .unwrap_or_else(|| vec![self.label.clone()]);

        InventoryItem {
            id,
            image_url: self.image_url,
            label: self.label,
            category,
            tags,
            date_added,
            source_image_url: self.source_image_url,
            notes: self.notes,
            original_box: self.original_box,
            metadata: self.metadata,
        }
    }
}

/// In-place edit of an existing item. Re-editing a crop patches
/// `image_url` + `original_box` together with the (possibly renamed) label.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryPatch {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub metadata: Option<ItemMetadata>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub original_box: Option<NormalizedBox>,
}

impl InventoryPatch {
    pub fn apply(&self, item: &mut InventoryItem) {
        if let Some(label) = self.label.as_ref() {
            item.label = label.clone();
        }
        if let Some(category) = self.category.as_ref() {
            item.category = Some(category.clone());
        }
        if let Some(tags) = self.tags.as_ref() {
            item.tags = tags.clone();
        }
        if let Some(notes) = self.notes.as_ref() {
            item.notes = Some(notes.clone());
        }
        if let Some(metadata) = self.metadata.as_ref() {
            item.metadata = Some(metadata.clone());
        }
        if let Some(image_url) = self.image_url.as_ref() {
            item.image_url = image_url.clone();
        }
        if let Some(original_box) = self.original_box.as_ref() {
            item.original_box = original_box.clone();
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum InventoryEvent {
    ItemAdded { item: InventoryItem },
    ItemUpdated { item: InventoryItem },
    ItemRemoved { id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(label: &str) -> InventoryDraft {
        InventoryDraft {
            image_url: "data:image/png;base64,AA==".to_string(),
            label: label.to_string(),
            category: None,
            tags: None,
            source_image_url: None,
            notes: None,
            original_box: NormalizedBox {
                x: 0.1,
                y: 0.2,
                width: 0.3,
                height: 0.4,
                label: label.to_string(),
            },
            metadata: None,
        }
    }

    #[test]
    fn draft_defaults_category_and_tags_from_label() {
        let item = draft("desk lamp").into_item("itm-1".into(), "2026-08-06T00:00:00Z".into());
        assert_eq!(item.category.as_deref(), Some("desk"));
        assert_eq!(item.tags, vec!["desk lamp".to_string()]);
    }

    #[test]
    fn explicit_category_and_tags_win_over_defaults() {
        let mut d = draft("desk lamp");
        d.category = Some("lighting".to_string());
        d.tags = Some(vec!["office".to_string()]);
        let item = d.into_item("itm-2".into(), "2026-08-06T00:00:00Z".into());
        assert_eq!(item.category.as_deref(), Some("lighting"));
        assert_eq!(item.tags, vec!["office".to_string()]);
    }

    #[test]
    fn patch_touches_only_provided_fields() {
        let mut item = draft("mug").into_item("itm-3".into(), "2026-08-06T00:00:00Z".into());
        let patch = InventoryPatch {
            notes: Some("chipped rim".to_string()),
            tags: Some(vec!["kitchen".to_string(), "ceramic".to_string()]),
            ..Default::default()
        };
        patch.apply(&mut item);

        assert_eq!(item.label, "mug");
        assert_eq!(item.notes.as_deref(), Some("chipped rim"));
        assert_eq!(item.tags.len(), 2);
        assert_eq!(item.category.as_deref(), Some("mug"));
    }
}
