use contextd::{
    resolve, ContextEditor, ContextError, ContextLayer, ContextStore, NewInstitutionEntry, Roster,
    SqliteStore,
};

struct Fixture {
    store: SqliteStore,
    institution_id: String,
    group_id: String,
    individual_id: String,
}

/// Institution with two entries, one group with a note, one individual with a note.
fn school() -> Fixture {
    let store = SqliteStore::in_memory().expect("open store");
    let (institution_id, group_id, individual_id) = {
        let roster = Roster::new(&store);
        let inst = roster.create_institution("Escola Norte").expect("institution");
        let group = roster
            .create_group(&inst.id, "5A", Some("5"))
            .expect("group");
        let x = roster
            .create_individual(&inst.id, Some(group.id.as_str()), "Ana", None)
            .expect("individual");

        let editor = ContextEditor::new(&store);
        editor
            .create_institution_entry(
                &inst.id,
                NewInstitutionEntry::new("Hours", "8am-5pm", 1).with_category("schedule"),
            )
            .expect("entry 1");
        editor
            .create_institution_entry(
                &inst.id,
                NewInstitutionEntry::new("Homework", "no homework Fridays", 2)
                    .with_category("policy"),
            )
            .expect("entry 2");
        editor
            .set_group_entry(&group.id, "Science fair next week")
            .expect("group note");
        editor
            .set_individual_entry(&x.id, "needs extra time")
            .expect("individual note");
        (inst.id, group.id, x.id)
    };
    Fixture {
        store,
        institution_id,
        group_id,
        individual_id,
    }
}

#[test]
fn full_chain_resolves_in_precedence_order() {
    let f = school();
    let r = resolve(&f.store, &f.individual_id, None).expect("resolve");
    assert_eq!(
        r.text,
        "needs extra time\n\nScience fair next week\n\n8am-5pm\n\nno homework Fridays"
    );
    let labels: Vec<_> = r.breakdown.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, ["special-needs", "general", "Hours", "Homework"]);
}

#[test]
fn deactivating_priority_one_keeps_relative_order() {
    let f = school();
    let editor = ContextEditor::new(&f.store);
    let hours = f
        .store
        .institution_entries(&f.institution_id, false)
        .expect("entries")
        .into_iter()
        .find(|e| e.content == "8am-5pm")
        .expect("hours entry");

    let before = resolve(&f.store, &f.individual_id, None).expect("resolve");
    editor
        .toggle_institution_entry(&hours.id, false)
        .expect("deactivate");
    let during = resolve(&f.store, &f.individual_id, None).expect("resolve");
    assert_eq!(
        during.text,
        "needs extra time\n\nScience fair next week\n\nno homework Fridays"
    );

    // Still stored, just hidden.
    let all = f
        .store
        .institution_entries(&f.institution_id, true)
        .expect("all entries");
    assert_eq!(all.len(), 2);

    editor
        .toggle_institution_entry(&hours.id, true)
        .expect("reactivate");
    let after = resolve(&f.store, &f.individual_id, None).expect("resolve");
    assert_eq!(before, after);
}

#[test]
fn clearing_individual_note_drops_contribution_but_keeps_row() {
    let f = school();
    ContextEditor::new(&f.store)
        .set_individual_entry(&f.individual_id, "")
        .expect("clear note");

    let r = resolve(&f.store, &f.individual_id, None).expect("resolve");
    assert_eq!(r.layer(ContextLayer::Individual).count(), 0);
    assert!(r.text.starts_with("Science fair next week"));

    let row = f
        .store
        .individual_entry(&f.individual_id)
        .expect("query")
        .expect("row still exists");
    assert_eq!(row.content, "");
}

#[test]
fn deleting_unknown_entry_is_not_found_and_changes_nothing() {
    let f = school();
    let before = resolve(&f.store, &f.individual_id, None).expect("resolve");
    let res = ContextEditor::new(&f.store).delete_institution_entry("no-such-entry");
    assert!(matches!(res, Err(ContextError::NotFound(_))));
    let after = resolve(&f.store, &f.individual_id, None).expect("resolve");
    assert_eq!(before, after);
}

#[test]
fn individual_without_any_context_resolves_empty() {
    let store = SqliteStore::in_memory().expect("open store");
    let id = {
        let roster = Roster::new(&store);
        let inst = roster.create_institution("Empty").expect("institution");
        roster
            .create_individual(&inst.id, None, "Rui", None)
            .expect("individual")
            .id
    };
    let r = resolve(&store, &id, None).expect("resolve");
    assert!(r.breakdown.is_empty());
    assert_eq!(r.text, "");
}

#[test]
fn individual_outside_any_group_gets_institution_only() {
    let f = school();
    let roster = Roster::new(&f.store);
    roster
        .assign_group(&f.individual_id, None)
        .expect("leave group");
    let r = resolve(&f.store, &f.individual_id, None).expect("resolve");
    assert_eq!(r.layer(ContextLayer::Group).count(), 0);
    assert_eq!(
        r.text,
        "needs extra time\n\n8am-5pm\n\nno homework Fridays"
    );
}

#[test]
fn deleting_group_detaches_members() {
    let f = school();
    Roster::new(&f.store)
        .delete_group(&f.group_id)
        .expect("delete group");
    let m = f
        .store
        .membership(&f.individual_id)
        .expect("membership")
        .expect("still a member of the institution");
    assert_eq!(m.group_id, None);
    assert!(f.store.group_entry(&f.group_id).expect("query").is_none());
}
