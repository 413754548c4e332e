//! Integration tests for the medication catalogue: seeding, ordering,
//! reconciliation and lifecycle.

use medtrack_core::{CatalogStore, Database, MedicationDraft};
use proptest::prelude::*;

fn empty_store() -> CatalogStore {
    CatalogStore::new(Database::open_memory().unwrap())
}

#[test]
fn seeding_is_idempotent() {
    let store = empty_store();

    let first = store.ensure_seeded().unwrap();
    assert!(first > 0);
    let count_after_first = store.list(None).unwrap().len();

    let second = store.ensure_seeded().unwrap();
    assert_eq!(second, 0);
    assert_eq!(store.list(None).unwrap().len(), count_after_first);
}

#[test]
fn seeding_skips_non_empty_catalogue() {
    let store = empty_store();
    store.add(MedicationDraft::named("自备药"), false).unwrap();

    assert_eq!(store.ensure_seeded().unwrap(), 0);
    assert_eq!(store.list(None).unwrap().len(), 1);
}

#[test]
fn list_is_ordered_by_category_then_name() {
    let store = empty_store();
    store.ensure_seeded().unwrap();

    let listed = store.list(None).unwrap();
    let keys: Vec<(String, String)> = listed
        .iter()
        .map(|m| (m.category.clone(), m.name.clone()))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[test]
fn reconcile_existing_name_updates_in_place() {
    let store = empty_store();
    store.add(MedicationDraft::named("阿司匹林"), false).unwrap();
    let before = store.list(None).unwrap().len();

    let reconciled = store
        .reconcile_by_name(
            "阿司匹林",
            MedicationDraft {
                name: "阿司匹林".to_string(),
                generic_name: "Aspirin".to_string(),
                category: "心血管".to_string(),
                strength: "100 mg".to_string(),
                ..MedicationDraft::default()
            },
        )
        .unwrap();

    assert_eq!(store.list(None).unwrap().len(), before);
    assert!(reconciled.is_favorite);
    assert_eq!(reconciled.generic_name, "Aspirin");
    assert_eq!(reconciled.category, "心血管");

    let row = store.find_by_name("阿司匹林").unwrap().unwrap();
    assert!(row.is_favorite);
    assert_eq!(row.strength, "100 mg");
}

#[test]
fn reconcile_unknown_name_creates_favorite() {
    let store = empty_store();
    let created = store
        .reconcile_by_name("维生素 C", MedicationDraft::named("维生素 C"))
        .unwrap();
    assert!(created.is_favorite);
    assert!(!created.is_builtin);
    assert_eq!(store.list(None).unwrap().len(), 1);
}

#[test]
fn name_match_is_case_sensitive() {
    let store = empty_store();
    store.add(MedicationDraft::named("Aspirin"), false).unwrap();

    store
        .reconcile_by_name("aspirin", MedicationDraft::named("aspirin"))
        .unwrap();
    // different case means a different medication
    assert_eq!(store.list(None).unwrap().len(), 2);
}

#[test]
fn add_then_delete_round_trip() {
    let store = empty_store();
    let med = store
        .add(
            MedicationDraft {
                name: "二甲双胍".to_string(),
                category: "糖尿病".to_string(),
                ..MedicationDraft::default()
            },
            false,
        )
        .unwrap();

    let listed = store.list(None).unwrap();
    assert_eq!(listed.iter().filter(|m| m.name == "二甲双胍").count(), 1);

    assert_eq!(store.delete(&[med.id]).unwrap(), 1);
    assert!(store
        .list(None)
        .unwrap()
        .iter()
        .all(|m| m.name != "二甲双胍"));
}

#[test]
fn batch_delete_removes_all_given_ids() {
    let store = empty_store();
    store.ensure_seeded().unwrap();
    let ids: Vec<String> = store
        .list(Some("感冒"))
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(ids.len(), 3);

    assert_eq!(store.delete(&ids).unwrap(), 3);
    assert!(store.list(Some("感冒")).unwrap().is_empty());
}

#[test]
fn favorites_view_tracks_toggle() {
    let store = empty_store();
    store.ensure_seeded().unwrap();
    assert!(store.list_favorites().unwrap().is_empty());

    let med = store.find_by_name("二甲双胍").unwrap().unwrap();
    store.toggle_favorite(&med.id).unwrap();
    let favorites = store.list_favorites().unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].name, "二甲双胍");

    store.toggle_favorite(&med.id).unwrap();
    assert!(store.list_favorites().unwrap().is_empty());
}

#[test]
fn catalogue_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("medtrack.db");

    {
        let store = CatalogStore::new(Database::open_at(&path).unwrap());
        store.ensure_seeded().unwrap();
        let med = store.find_by_name("奥美拉唑").unwrap().unwrap();
        store.set_usage_plan(&med.id, 2, 1).unwrap();
    }

    let store = CatalogStore::new(Database::open_at(&path).unwrap());
    assert_eq!(store.ensure_seeded().unwrap(), 0);
    let med = store.find_by_name("奥美拉唑").unwrap().unwrap();
    assert_eq!(med.doses_per_day, 2);
    assert!(med.is_builtin);
}

proptest! {
    /// list() always yields (category, name) ascending, whatever was added.
    #[test]
    fn list_order_holds_for_arbitrary_entries(
        entries in proptest::collection::vec(("[a-d]{1,3}", "[a-d]{1,3}"), 1..20)
    ) {
        let store = empty_store();
        for (category, name) in &entries {
            store
                .add(
                    MedicationDraft {
                        name: name.clone(),
                        category: category.clone(),
                        ..MedicationDraft::default()
                    },
                    false,
                )
                .unwrap();
        }

        let keys: Vec<(String, String)> = store
            .list(None)
            .unwrap()
            .into_iter()
            .map(|m| (m.category, m.name))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        prop_assert_eq!(keys, sorted);
    }
}
