// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! End-to-end workspace walkthroughs: build a chart, staff it, cascade a
//! deletion, copy it into the next phase, and survive a bad import.

use orgdesign::dragdrop::{handle_drop, DragEvent};
use orgdesign::engine::Workspace;
use orgdesign::error::{OrgError, SchemaError};
use orgdesign::persistence::{MemoryStorage, PersistenceGateway, DEFAULT_STORAGE_KEY};
use orgdesign::types::{Availability, FactoryId, Person, Phase, Role};

// =============================================================================
// Test Helpers
// =============================================================================

fn add() -> FactoryId {
    FactoryId::from("ADD")
}

/// Role `r1` placed on a fresh level-0 node. Returns the node ID.
fn placed_role(workspace: &mut Workspace) -> String {
    workspace.add_role(&add(), Role::new("r1", "Quality Manager")).unwrap();
    let (n1, _) = workspace.add_node(Phase::Current, &add(), 0).unwrap();
    workspace.place_role(Phase::Current, &add(), &n1, "r1").unwrap();
    n1
}

/// `placed_role` plus `p1` assigned to `r1`
fn staffed_role(workspace: &mut Workspace) -> String {
    let n1 = placed_role(workspace);
    workspace.add_person(&add(), Person::new("p1", "Emily Chen")).unwrap();
    workspace.assign_person(Phase::Current, &add(), "r1", "p1").unwrap();
    n1
}

fn availability(workspace: &Workspace, person: &str) -> Availability {
    workspace.state().entities.person(&add(), person).unwrap().availability
}

// =============================================================================
// Walkthroughs
// =============================================================================

#[test]
fn test_place_role_on_new_node() {
    let mut workspace = Workspace::default();
    let n1 = placed_role(&mut workspace);

    let chart = workspace.state().org_chart.chart(Phase::Current, &add()).unwrap();
    assert_eq!(chart.node(&n1).unwrap().roles, vec!["r1".to_string()]);
}

#[test]
fn test_assign_person_marks_them_assigned() {
    let mut workspace = Workspace::default();
    staffed_role(&mut workspace);

    let chart = workspace.state().org_chart.chart(Phase::Current, &add()).unwrap();
    assert_eq!(chart.assignee("r1").map(String::as_str), Some("p1"));
    assert_eq!(availability(&workspace, "p1"), Availability::Assigned);
}

#[test]
fn test_delete_role_cascades_and_frees_holder() {
    let mut workspace = Workspace::default();
    let n1 = staffed_role(&mut workspace);

    workspace.delete_role(&add(), "r1").unwrap();

    let chart = workspace.state().org_chart.chart(Phase::Current, &add()).unwrap();
    assert!(chart.node(&n1).unwrap().roles.is_empty());
    assert!(chart.assignee("r1").is_none());
    assert_eq!(availability(&workspace, "p1"), Availability::Available);
}

#[test]
fn test_copy_chart_is_deep() {
    let mut workspace = Workspace::default();
    let n1 = staffed_role(&mut workspace);
    let before = workspace.state().org_chart.chart(Phase::Current, &add()).unwrap().clone();

    workspace.copy_chart(Phase::Current, Phase::Future, &add()).unwrap();
    assert_eq!(workspace.state().org_chart.chart(Phase::Future, &add()).unwrap(), &before);

    workspace.add_role(&add(), Role::new("r9", "Auditor")).unwrap();
    workspace.place_role(Phase::Future, &add(), &n1, "r9").unwrap();
    workspace.unassign_person(Phase::Future, &add(), "r1").unwrap();
    workspace.add_node(Phase::Future, &add(), 1).unwrap();

    assert_eq!(workspace.state().org_chart.chart(Phase::Current, &add()).unwrap(), &before);
    assert_eq!(availability(&workspace, "p1"), Availability::Assigned);
}

#[test]
fn test_assigning_unplaced_role_is_rejected() {
    let mut workspace = Workspace::default();
    staffed_role(&mut workspace);
    workspace.add_role(&add(), Role::new("r2", "Quality Engineer")).unwrap();
    let before = workspace.state().clone();

    let err = workspace.assign_person(Phase::Current, &add(), "r2", "p1").unwrap_err();

    assert_eq!(err, OrgError::RoleNotPlaced { role_id: "r2".into() });
    assert_eq!(workspace.state(), &before);
}

#[test]
fn test_import_missing_personnel_leaves_state_alone() {
    let mut workspace = Workspace::default();
    staffed_role(&mut workspace);
    let mut gateway = PersistenceGateway::new(MemoryStorage::new(), DEFAULT_STORAGE_KEY);

    let mut document: serde_json::Value = serde_json::from_str(&gateway.export_to_string(&workspace).unwrap()).unwrap();
    document["data"].as_object_mut().unwrap().remove("personnel");
    let before = workspace.state().clone();

    let err = gateway.import_from_str(&mut workspace, &document.to_string()).unwrap_err();

    match err {
        OrgError::InvalidImportSchema(schema) => {
            assert!(matches!(schema, SchemaError::MissingKeys(_)));
            assert_eq!(schema.missing(), ["personnel".to_string()]);
        }
        other => panic!("expected schema error, got {other:?}"),
    }
    assert_eq!(workspace.state(), &before);
}

// =============================================================================
// Gestures
// =============================================================================

#[test]
fn test_drag_walkthrough_builds_staffed_chart() {
    let mut workspace = Workspace::default();
    workspace.add_role(&add(), Role::new("r1", "Quality Manager")).unwrap();
    workspace.add_person(&add(), Person::new("p1", "Emily Chen")).unwrap();
    let (n1, _) = workspace.add_node(Phase::Current, &add(), 0).unwrap();
    let node_zone = format!("org-node-{n1}");

    let early = DragEvent::from_ids(("personnelList", 0), Some(("role-r1", 0)), "p1").unwrap();
    assert!(matches!(handle_drop(&mut workspace, &early), Err(OrgError::RoleNotPlaced { .. })));

    let place = DragEvent::from_ids(("rolesList", 0), Some((node_zone.as_str(), 0)), "r1").unwrap();
    assert!(!handle_drop(&mut workspace, &place).unwrap().is_empty());

    let assign = DragEvent::from_ids(("personnelList", 0), Some(("role-r1", 0)), "p1").unwrap();
    assert!(!handle_drop(&mut workspace, &assign).unwrap().is_empty());

    let chart = workspace.state().org_chart.chart(Phase::Current, &add()).unwrap();
    assert_eq!(chart.node(&n1).unwrap().roles, vec!["r1".to_string()]);
    assert_eq!(chart.assignee("r1").map(String::as_str), Some("p1"));
    assert_eq!(availability(&workspace, "p1"), Availability::Assigned);
}

#[test]
fn test_phase_switch_rederives_availability() {
    let mut workspace = Workspace::default();
    staffed_role(&mut workspace);

    workspace.select_phase(Phase::Future).unwrap();
    assert_eq!(availability(&workspace, "p1"), Availability::Available);

    workspace.copy_chart(Phase::Current, Phase::Future, &add()).unwrap();
    assert_eq!(availability(&workspace, "p1"), Availability::Assigned);

    workspace.select_phase(Phase::Current).unwrap();
    workspace.delete_person(&add(), "p1").unwrap();
    for phase in Phase::ALL {
        assert!(workspace.state().org_chart.chart(phase, &add()).unwrap().assignments.is_empty());
    }
}
