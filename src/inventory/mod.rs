//! The inventory catalog: a single source of truth behind an explicit
//! store handle, with observer registration instead of ambient reactive
//! state. Observers only ever see mutations that fully succeeded.

pub mod commands;
pub mod store;
pub mod types;

use std::sync::{Arc, Mutex};

use store::{InventoryStore, StoreError};
use types::{InventoryDraft, InventoryEvent, InventoryItem, InventoryPatch};

type Observer = Box<dyn Fn(&InventoryEvent) + Send + Sync>;

pub struct Inventory {
    store: Arc<dyn InventoryStore>,
    observers: Mutex<ObserverRegistry>,
}

#[derive(Default)]
struct ObserverRegistry {
    seq: u64,
    entries: Vec<(u64, Observer)>,
}

impl Inventory {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self {
            store,
            observers: Mutex::new(ObserverRegistry::default()),
        }
    }

    pub fn subscribe(&self, observer: impl Fn(&InventoryEvent) + Send + Sync + 'static) -> u64 {
        let mut registry = self.observers.lock().expect("poisoned");
        registry.seq += 1;
        let token = registry.seq;
        registry.entries.push((token, Box::new(observer)));
        token
    }

    pub fn unsubscribe(&self, token: u64) -> bool {
        let mut registry = self.observers.lock().expect("poisoned");
        let before = registry.entries.len();
        registry.entries.retain(|(id, _)| *id != token);
        registry.entries.len() != before
    }

    fn notify(&self, event: &InventoryEvent) {
        let registry = self.observers.lock().expect("poisoned");
        for (_, observer) in registry.entries.iter() {
            observer(event);
        }
    }

    pub fn add_item(&self, draft: InventoryDraft) -> Result<InventoryItem, StoreError> {
        let item = self.store.add(draft)?;
        self.notify(&InventoryEvent::ItemAdded { item: item.clone() });
        Ok(item)
    }

    pub fn list_items(&self) -> Result<Vec<InventoryItem>, StoreError> {
        self.store.list()
    }

    pub fn get_item(&self, id: &str) -> Result<Option<InventoryItem>, StoreError> {
        self.store.get(id)
    }

    pub fn update_item(
        &self,
        id: &str,
        patch: &InventoryPatch,
    ) -> Result<InventoryItem, StoreError> {
        let item = self.store.update(id, patch)?;
        self.notify(&InventoryEvent::ItemUpdated { item: item.clone() });
        Ok(item)
    }

    pub fn delete_item(&self, id: &str) -> Result<bool, StoreError> {
        let removed = self.store.delete(id)?;
        if removed {
            self.notify(&InventoryEvent::ItemRemoved { id: id.to_string() });
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::NormalizedBox;
    use store::InMemoryInventoryStore;

    fn hub() -> Inventory {
        Inventory::new(Arc::new(InMemoryInventoryStore::new()))
    }

    fn draft(label: &str) -> InventoryDraft {
        InventoryDraft {
            image_url: "data:image/png;base64,AA==".to_string(),
            label: label.to_string(),
            category: None,
            tags: None,
            source_image_url: None,
            notes: None,
            original_box: NormalizedBox {
                x: 0.0,
                y: 0.0,
                width: 0.5,
                height: 0.5,
                label: label.to_string(),
            },
            metadata: None,
        }
    }

    #[test]
    fn observers_see_successful_mutations_in_order() {
        let inventory = hub();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        inventory.subscribe(move |event| {
            let tag = match event {
                InventoryEvent::ItemAdded { .. } => "added",
                InventoryEvent::ItemUpdated { .. } => "updated",
                InventoryEvent::ItemRemoved { .. } => "removed",
            };
            sink.lock().unwrap().push(tag.to_string());
        });

        let item = inventory.add_item(draft("plant")).unwrap();
        inventory
            .update_item(
                &item.id,
                &InventoryPatch {
                    notes: Some("needs water".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        inventory.delete_item(&item.id).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["added".to_string(), "updated".to_string(), "removed".to_string()]
        );
    }

    #[test]
    fn failed_mutations_notify_nobody() {
        let inventory = hub();
        let count = Arc::new(Mutex::new(0u32));
        let sink = count.clone();
        inventory.subscribe(move |_| *sink.lock().unwrap() += 1);

        assert!(inventory
            .update_item("itm-missing", &InventoryPatch::default())
            .is_err());
        assert!(!inventory.delete_item("itm-missing").unwrap());
        assert_eq!(*count.lock().unwrap(), 0);
    }

    #[test]
    fn unsubscribed_observers_go_quiet() {
        let inventory = hub();
        let count = Arc::new(Mutex::new(0u32));
        let sink = count.clone();
        let token = inventory.subscribe(move |_| *sink.lock().unwrap() += 1);

        inventory.add_item(draft("first")).unwrap();
        assert!(inventory.unsubscribe(token));
        assert!(!inventory.unsubscribe(token));
        inventory.add_item(draft("second")).unwrap();

        assert_eq!(*count.lock().unwrap(), 1);
    }
}
