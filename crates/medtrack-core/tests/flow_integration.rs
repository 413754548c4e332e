//! Integration tests for the scheduling-session state machine and its
//! catalogue side effects.

use chrono::{NaiveDate, NaiveTime};
use medtrack_core::{
    CatalogStore, Database, DoseLedger, DoseScheduler, FlowStep, MemoryNotifier, SelectionFlow,
};

fn seeded_catalog() -> CatalogStore {
    let store = CatalogStore::new(Database::open_memory().unwrap());
    store.ensure_seeded().unwrap();
    store
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

#[test]
fn full_session_schedules_a_dose() {
    let catalog = seeded_catalog();
    let ledger = DoseLedger::new(Database::open_memory().unwrap());
    let notifier = MemoryNotifier::new();
    let scheduler = DoseScheduler::new(&ledger, &notifier);

    let mut flow = SelectionFlow::new(chrono::Local::now().date_naive());
    flow.submit_name(&catalog, "阿司匹林肠溶片").unwrap();
    flow.set_date(day());
    flow.set_time(NaiveTime::from_hms_opt(8, 0, 0).unwrap());
    flow.set_amount("1 片");
    assert!(flow.can_confirm());

    let event = flow.confirm(&scheduler).unwrap();
    assert_eq!(flow.step(), FlowStep::Finished);
    assert_eq!(event.name, "阿司匹林肠溶片");

    let scheduled = ledger.list_for_day(day()).unwrap();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(notifier.pending().len(), 1);

    // the session is closed; a second confirm is rejected
    assert!(flow.confirm(&scheduler).is_err());
}

#[test]
fn choosing_a_catalogue_entry_marks_it_favorite() {
    let catalog = seeded_catalog();
    let med = catalog.find_by_name("二甲双胍").unwrap().unwrap();
    assert!(!med.is_favorite);

    let mut flow = SelectionFlow::new(day());
    flow.choose(&catalog, &med.id).unwrap();
    assert_eq!(flow.step(), FlowStep::SetSchedule);
    assert_eq!(flow.name(), "二甲双胍");

    assert!(catalog.get(&med.id).unwrap().unwrap().is_favorite);
}

#[test]
fn cancel_keeps_committed_side_effects() {
    // Observed behaviour of the original application: the favourite flag
    // set while selecting is not reverted when the session is cancelled.
    let catalog = seeded_catalog();
    let med = catalog.find_by_name("布洛芬").unwrap().unwrap();

    let mut flow = SelectionFlow::new(day());
    flow.choose(&catalog, &med.id).unwrap();
    flow.cancel().unwrap();

    assert_eq!(flow.step(), FlowStep::Cancelled);
    assert!(catalog.get(&med.id).unwrap().unwrap().is_favorite);
}

#[test]
fn cancel_from_schedule_step_persists_nothing() {
    let catalog = seeded_catalog();
    let ledger = DoseLedger::new(Database::open_memory().unwrap());

    let mut flow = SelectionFlow::new(day());
    flow.submit_name(&catalog, "奥美拉唑").unwrap();
    flow.set_amount("1 粒");
    flow.cancel().unwrap();

    assert!(ledger.list_all().unwrap().is_empty());
}

#[test]
fn submitting_an_existing_name_does_not_grow_the_catalogue() {
    let catalog = seeded_catalog();
    let before = catalog.list(None).unwrap().len();

    let mut flow = SelectionFlow::new(day());
    let med = flow.submit_name(&catalog, "格列美脲").unwrap();

    assert_eq!(catalog.list(None).unwrap().len(), before);
    assert!(med.is_favorite);
    assert!(med.is_builtin);
}

#[test]
fn submitting_a_new_name_inserts_a_favorite_entry() {
    let catalog = seeded_catalog();
    let before = catalog.list(None).unwrap().len();

    let mut flow = SelectionFlow::new(day());
    let med = flow.submit_name(&catalog, "维生素 D").unwrap();

    assert_eq!(catalog.list(None).unwrap().len(), before + 1);
    assert!(med.is_favorite);
    assert!(!med.is_builtin);
    assert_eq!(
        catalog.list_favorites().unwrap()[0].name,
        "维生素 D"
    );
}

#[test]
fn confirm_requires_an_amount() {
    let catalog = seeded_catalog();
    let ledger = DoseLedger::new(Database::open_memory().unwrap());
    let notifier = MemoryNotifier::new();
    let scheduler = DoseScheduler::new(&ledger, &notifier);

    let mut flow = SelectionFlow::new(day());
    flow.submit_name(&catalog, "布洛芬").unwrap();
    assert!(!flow.can_confirm());

    assert!(flow.confirm(&scheduler).is_err());
    // the failed confirm leaves the session in the schedule step
    assert_eq!(flow.step(), FlowStep::SetSchedule);

    flow.set_amount("2 片");
    flow.confirm(&scheduler).unwrap();
    assert_eq!(ledger.list_all().unwrap().len(), 1);
}
