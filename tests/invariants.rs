// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Property tests for the workspace consistency rules
//!
//! Random sequences of mutations are applied to a small universe of roles,
//! personnel and nodes. Rejected mutations are expected; after every step
//! the state must still hold together:
//! 1. Referential integrity - chart references point at live records
//! 2. Assignment requires placement
//! 3. Cascade completeness on role and person deletion
//! 4. Export fidelity - a reachable state survives export and import
//! 5. Availability tracks the active phase
//! 6. Moving a role onto its own slot changes nothing
//! 7. Canvas positions stay finite, so every state can be exported

use orgdesign::engine::Workspace;
use orgdesign::error::OrgError;
use orgdesign::persistence::{decode_document, MemoryStorage, PersistenceGateway};
use orgdesign::state::OrgState;
use orgdesign::types::{Availability, FactoryId, Person, Phase, Position, Role};
use proptest::prelude::*;
use std::collections::HashSet;

// =============================================================================
// Test Helpers
// =============================================================================

const ROLES: usize = 4;
const PEOPLE: usize = 4;

fn add() -> FactoryId {
    FactoryId::from("ADD")
}

fn role_id(i: usize) -> String {
    format!("r{}", i % ROLES)
}

fn person_id(i: usize) -> String {
    format!("p{}", i % PEOPLE)
}

#[derive(Debug, Clone)]
enum Op {
    AddRole(usize),
    DeleteRole(usize),
    AddPerson(usize),
    DeletePerson(usize),
    AddNode(Phase, u32),
    DeleteNode(Phase, usize),
    Place(Phase, usize, usize),
    Unplace(Phase, usize, usize),
    Move(Phase, usize, usize, usize),
    Assign(Phase, usize, usize),
    Reassign(Phase, usize, usize),
    Unassign(Phase, usize),
    Connect(Phase, usize, usize),
    Reposition(Phase, usize, f64, f64),
    Copy(Phase, Phase),
    Clear(Phase),
    Select(Phase),
}

fn phase() -> impl Strategy<Value = Phase> {
    prop_oneof![Just(Phase::Current), Just(Phase::Future), Just(Phase::Iterative)]
}

/// Finite canvas coordinate, fractional and far off-canvas values included
fn coordinate() -> impl Strategy<Value = f64> {
    prop::num::f64::NORMAL | prop::num::f64::ZERO
}

fn non_finite() -> impl Strategy<Value = f64> {
    prop_oneof![Just(f64::NAN), Just(f64::INFINITY), Just(f64::NEG_INFINITY)]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..ROLES).prop_map(Op::AddRole),
        1 => (0..ROLES).prop_map(Op::DeleteRole),
        3 => (0..PEOPLE).prop_map(Op::AddPerson),
        1 => (0..PEOPLE).prop_map(Op::DeletePerson),
        3 => (phase(), 0..3u32).prop_map(|(p, l)| Op::AddNode(p, l)),
        1 => (phase(), 0..8usize).prop_map(|(p, n)| Op::DeleteNode(p, n)),
        4 => (phase(), 0..8usize, 0..ROLES).prop_map(|(p, n, r)| Op::Place(p, n, r)),
        1 => (phase(), 0..8usize, 0..ROLES).prop_map(|(p, n, r)| Op::Unplace(p, n, r)),
        2 => (phase(), 0..8usize, 0..8usize, 0..4usize).prop_map(|(p, a, b, i)| Op::Move(p, a, b, i)),
        4 => (phase(), 0..ROLES, 0..PEOPLE).prop_map(|(p, r, x)| Op::Assign(p, r, x)),
        2 => (phase(), 0..ROLES, 0..PEOPLE).prop_map(|(p, r, x)| Op::Reassign(p, r, x)),
        1 => (phase(), 0..ROLES).prop_map(|(p, r)| Op::Unassign(p, r)),
        1 => (phase(), 0..8usize, 0..8usize).prop_map(|(p, a, b)| Op::Connect(p, a, b)),
        1 => (phase(), 0..8usize, coordinate(), coordinate()).prop_map(|(p, n, x, y)| Op::Reposition(p, n, x, y)),
        1 => (phase(), phase()).prop_map(|(a, b)| Op::Copy(a, b)),
        1 => phase().prop_map(Op::Clear),
        1 => phase().prop_map(Op::Select),
    ]
}

/// ID of the n-th node of a chart, wrapping around
fn node_at(workspace: &Workspace, phase: Phase, n: usize) -> Option<String> {
    let chart = workspace.state().org_chart.chart(phase, &add()).ok()?;
    if chart.nodes.is_empty() {
        return None;
    }
    Some(chart.nodes[n % chart.nodes.len()].id.clone())
}

/// Node holding a role, if any
fn node_of(workspace: &Workspace, phase: Phase, role: &str) -> Option<String> {
    let chart = workspace.state().org_chart.chart(phase, &add()).ok()?;
    chart.placements(role).first().map(|id| (*id).clone())
}

/// Apply one operation. Rejections are fine; only consistency matters.
fn run(workspace: &mut Workspace, op: &Op) {
    let f = add();
    let _ = match op {
        Op::AddRole(i) => workspace.add_role(&f, Role::new(role_id(*i), format!("Role {i}"))),
        Op::DeleteRole(i) => workspace.delete_role(&f, &role_id(*i)),
        Op::AddPerson(i) => workspace.add_person(&f, Person::new(person_id(*i), format!("Person {i}"))),
        Op::DeletePerson(i) => workspace.delete_person(&f, &person_id(*i)).map(|(_, c)| c),
        Op::AddNode(p, level) => workspace.add_node(*p, &f, *level).map(|(_, c)| c),
        Op::DeleteNode(p, n) => match node_at(workspace, *p, *n) {
            Some(node) => workspace.delete_node(*p, &f, &node),
            None => Ok(Vec::new()),
        },
        Op::Place(p, n, r) => match node_at(workspace, *p, *n) {
            Some(node) => workspace.place_role(*p, &f, &node, &role_id(*r)),
            None => Ok(Vec::new()),
        },
        Op::Unplace(p, n, r) => match node_at(workspace, *p, *n) {
            Some(node) => workspace.unplace_role(*p, &f, &node, &role_id(*r)),
            None => Ok(Vec::new()),
        },
        Op::Move(p, r, n, index) => {
            let role = role_id(*r);
            match (node_of(workspace, *p, &role), node_at(workspace, *p, *n)) {
                (Some(from), Some(to)) => workspace.move_role(*p, &f, &role, &from, *index, &to),
                _ => Ok(Vec::new()),
            }
        }
        Op::Assign(p, r, x) => workspace.assign_person(*p, &f, &role_id(*r), &person_id(*x)),
        Op::Reassign(p, r, x) => workspace.reassign_person(*p, &f, &role_id(*r), &person_id(*x)),
        Op::Unassign(p, r) => workspace.unassign_person(*p, &f, &role_id(*r)),
        Op::Connect(p, a, b) => match (node_at(workspace, *p, *a), node_at(workspace, *p, *b)) {
            (Some(a), Some(b)) => workspace.add_connection(*p, &f, &a, &b),
            _ => Ok(Vec::new()),
        },
        Op::Reposition(p, n, x, y) => match node_at(workspace, *p, *n) {
            Some(node) => {
                let position = Position { x: *x, y: *y };
                workspace.update_node(*p, &f, &node, Some(position), None)
            }
            None => Ok(Vec::new()),
        },
        Op::Copy(a, b) => workspace.copy_chart(*a, *b, &f),
        Op::Clear(p) => workspace.clear_chart(*p, &f),
        Op::Select(p) => workspace.select_phase(*p),
    };
}

fn check_integrity(state: &OrgState) -> Result<(), TestCaseError> {
    for (phase, factory, chart) in state.org_chart.iter() {
        let roles: HashSet<&str> = state.entities.roles(factory).unwrap().iter().map(|r| r.id.as_str()).collect();
        let people: HashSet<&str> =
            state.entities.personnel(factory).unwrap().iter().map(|p| p.id.as_str()).collect();
        let nodes: HashSet<&str> = chart.nodes.iter().map(|n| n.id.as_str()).collect();

        for node in &chart.nodes {
            for role in &node.roles {
                prop_assert!(roles.contains(role.as_str()), "{phase}/{factory}: node {} holds dead role {role}", node.id);
            }
        }
        for (role, person) in &chart.assignments {
            prop_assert!(people.contains(person.as_str()), "{phase}/{factory}: {role} held by dead {person}");
            prop_assert!(chart.is_placed(role), "{phase}/{factory}: {role} assigned but not placed");
        }
        for connection in &chart.connections {
            prop_assert!(nodes.contains(connection.source.as_str()));
            prop_assert!(nodes.contains(connection.target.as_str()));
        }
    }
    Ok(())
}

fn check_availability(state: &OrgState) -> Result<(), TestCaseError> {
    let active = state.active();
    for (factory, personnel) in &state.entities.personnel {
        let chart = state.org_chart.chart(active.phase, factory).unwrap();
        for person in personnel {
            let holds = chart.is_assigned(&person.id);
            prop_assert_eq!(
                person.availability == Availability::Assigned,
                holds,
                "{} in {} is {} while holding={}",
                person.id,
                factory,
                person.availability,
                holds
            );
        }
    }
    Ok(())
}

fn build(ops: &[Op]) -> Workspace {
    let mut workspace = Workspace::default();
    for op in ops {
        run(&mut workspace, op);
    }
    workspace
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn chart_references_stay_live(ops in prop::collection::vec(op(), 1..60)) {
        let mut workspace = Workspace::default();
        for op in &ops {
            run(&mut workspace, op);
            check_integrity(workspace.state())?;
        }
    }

    #[test]
    fn availability_follows_active_phase(ops in prop::collection::vec(op(), 1..60)) {
        let mut workspace = Workspace::default();
        for op in &ops {
            run(&mut workspace, op);
            check_availability(workspace.state())?;
        }
    }

    #[test]
    fn deleting_a_role_leaves_no_trace(ops in prop::collection::vec(op(), 1..60), r in 0..ROLES) {
        let mut workspace = build(&ops);
        let role = role_id(r);
        prop_assume!(workspace.state().entities.has_role(&add(), &role));

        workspace.delete_role(&add(), &role).unwrap();

        for (_, _, chart) in workspace.state().org_chart.iter() {
            prop_assert!(!chart.is_placed(&role));
            prop_assert!(chart.assignee(&role).is_none());
        }
        check_availability(workspace.state())?;
    }

    #[test]
    fn deleting_a_person_leaves_no_trace(ops in prop::collection::vec(op(), 1..60), x in 0..PEOPLE) {
        let mut workspace = build(&ops);
        let person = person_id(x);
        prop_assume!(workspace.state().entities.has_person(&add(), &person));

        let (removed, _) = workspace.delete_person(&add(), &person).unwrap();

        prop_assert_eq!(removed.availability, Availability::Available);
        for (_, _, chart) in workspace.state().org_chart.iter() {
            prop_assert!(!chart.is_assigned(&person));
        }
        check_availability(workspace.state())?;
    }

    #[test]
    fn export_then_import_is_identity(ops in prop::collection::vec(op(), 0..60)) {
        let workspace = build(&ops);
        let mut gateway = PersistenceGateway::new(MemoryStorage::new(), "orgDesignState");
        let text = gateway.export_to_string(&workspace).unwrap();

        let decoded = decode_document(&text).unwrap();
        prop_assert_eq!(&decoded, workspace.state());

        let mut target = Workspace::default();
        gateway.import_from_str(&mut target, &text).unwrap();
        prop_assert_eq!(target.state(), workspace.state());
    }

    #[test]
    fn moving_a_role_onto_itself_changes_nothing(ops in prop::collection::vec(op(), 0..60), r in 0..ROLES) {
        let mut workspace = build(&ops);
        let role = role_id(r);
        let phase = workspace.state().active().phase;
        let Some(node) = node_of(&workspace, phase, &role) else {
            return Ok(());
        };
        let before = workspace.state().org_chart.chart(phase, &add()).unwrap().node(&node).unwrap().roles.clone();
        let index = before.iter().position(|id| *id == role).unwrap();

        workspace.move_role(phase, &add(), &role, &node, index, &node).unwrap();

        let after = &workspace.state().org_chart.chart(phase, &add()).unwrap().node(&node).unwrap().roles;
        prop_assert_eq!(&before, after);
    }

    #[test]
    fn non_finite_positions_are_rejected(
        ops in prop::collection::vec(op(), 0..40),
        bad in non_finite(),
        good in coordinate(),
        bad_is_x in any::<bool>(),
    ) {
        let mut workspace = build(&ops);
        let phase = workspace.state().active().phase;
        let node = match node_at(&workspace, phase, 0) {
            Some(node) => node,
            None => workspace.add_node(phase, &add(), 0).unwrap().0,
        };
        let before = workspace.state().clone();
        let position = if bad_is_x { Position { x: bad, y: good } } else { Position { x: good, y: bad } };

        let err = workspace.update_node(phase, &add(), &node, Some(position), Some(1)).unwrap_err();

        prop_assert!(matches!(err, OrgError::InvalidPosition { ref node_id, .. } if *node_id == node), "{err:?}");
        prop_assert_eq!(workspace.state(), &before);
    }
}

/// Fractional coordinates survive the document exactly
#[test]
fn test_fractional_position_survives_export() {
    let mut workspace = Workspace::default();
    let (node, _) = workspace.add_node(Phase::Current, &add(), 0).unwrap();
    let position = Position { x: 242.205_164_734_718_66, y: -0.1 };
    workspace.update_node(Phase::Current, &add(), &node, Some(position), None).unwrap();

    let mut gateway = PersistenceGateway::new(MemoryStorage::new(), "orgDesignState");
    let text = gateway.export_to_string(&workspace).unwrap();
    let mut target = Workspace::default();
    gateway.import_from_str(&mut target, &text).unwrap();

    let chart = target.state().org_chart.chart(Phase::Current, &add()).unwrap();
    assert_eq!(chart.node(&node).unwrap().position, Some(position));
}

// =============================================================================
// Determinism
// =============================================================================

/// Node IDs are salted with the clock, so compare everything but IDs
#[test]
fn test_same_operations_produce_same_charts() {
    let ops = [
        Op::AddRole(0),
        Op::AddRole(1),
        Op::AddPerson(0),
        Op::AddNode(Phase::Current, 0),
        Op::AddNode(Phase::Current, 1),
        Op::Place(Phase::Current, 0, 0),
        Op::Place(Phase::Current, 1, 1),
        Op::Connect(Phase::Current, 0, 1),
        Op::Assign(Phase::Current, 0, 0),
        Op::Copy(Phase::Current, Phase::Future),
    ];
    let a = build(&ops);
    let b = build(&ops);

    for phase in Phase::ALL {
        let left = a.state().org_chart.chart(phase, &add()).unwrap();
        let right = b.state().org_chart.chart(phase, &add()).unwrap();
        let shape = |chart: &orgdesign::types::Chart| {
            chart.nodes.iter().map(|n| (n.level, n.roles.clone(), n.parent_id.is_some())).collect::<Vec<_>>()
        };
        assert_eq!(shape(left), shape(right), "{phase} nodes differ");
        assert_eq!(left.connections.len(), right.connections.len());
        assert_eq!(left.assignments, right.assignments);
    }
}
