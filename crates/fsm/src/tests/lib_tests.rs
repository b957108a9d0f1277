use super::*;
use shared::error::ErrorCategory;

fn toggle_machine() -> StateMachine {
    let mut builder = StateMachineBuilder::new(IDLE);
    builder
        .transition(TransitionDef::new("activate", IDLE, "ACTIVE").owned_by("module-a"))
        .expect("activate")
        .transition(TransitionDef::new("deactivate", "ACTIVE", IDLE).owned_by("module-a"))
        .expect("deactivate");
    builder.build().expect("build")
}

#[test]
fn starts_in_init_state() {
    let fsm = toggle_machine();
    assert!(fsm.is(IDLE));
    assert_eq!(fsm.init_state(), IDLE);
    assert_eq!(fsm.available(), vec!["activate"]);
}

#[test]
fn fire_reports_owner_and_endpoints() {
    let mut fsm = toggle_machine();
    let fired = fsm.fire("activate").expect("activate");
    assert_eq!(fired.from, IDLE);
    assert_eq!(fired.to, "ACTIVE");
    assert!(fired.is_owned_by("module-a"));
    assert!(fsm.is("ACTIVE"));
}

#[test]
fn rejected_transition_leaves_state_untouched() {
    let mut fsm = toggle_machine();
    let err = fsm.fire("deactivate").expect_err("not allowed from IDLE");
    assert_eq!(err.category(), ErrorCategory::Precondition);
    assert!(fsm.is(IDLE));

    fsm.fire("activate").expect("activate");
    let err = fsm.fire("activate").expect_err("already active");
    assert_eq!(err, CoreError::rejected("activate", "ACTIVE"));
    assert!(fsm.is("ACTIVE"));
}

#[test]
fn duplicate_event_from_same_state_is_a_configuration_error() {
    let mut builder = StateMachineBuilder::new(IDLE);
    builder
        .transition(TransitionDef::new("activate", IDLE, "A"))
        .expect("first");
    let err = builder
        .transition(TransitionDef::new("activate", IDLE, "B"))
        .expect_err("second");
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert_eq!(builder.transition_count(), 1);
}

#[test]
fn same_event_from_disjoint_states_is_allowed() {
    let mut builder = StateMachineBuilder::new(IDLE);
    builder
        .transition(TransitionDef::new("go", IDLE, "A"))
        .expect("idle")
        .transition(TransitionDef::new("go", "A", "B"))
        .expect("a");
    let mut fsm = builder.build().expect("build");
    fsm.fire("go").expect("first hop");
    fsm.fire("go").expect("second hop");
    assert!(fsm.is("B"));
}

#[test]
fn wildcard_source_overlaps_everything() {
    let mut builder = StateMachineBuilder::new(IDLE);
    builder
        .transition(TransitionDef::new("stop", "*", IDLE))
        .expect("stop");
    assert!(builder
        .transition(TransitionDef::new("stop", "3", IDLE))
        .is_err());
}

#[test]
fn empty_builder_does_not_build() {
    let err = StateMachineBuilder::new(IDLE).build().expect_err("empty");
    assert_eq!(err, CoreError::EmptyStateMachine);
}

#[test]
fn computed_target_can_refuse() {
    let mut builder = StateMachineBuilder::new("0");
    builder
        .transition(TransitionDef::new(
            "previous",
            "*",
            Target::computed(|state| {
                let index: usize = state.parse().ok()?;
                index.checked_sub(1).map(|i| i.to_string())
            }),
        ))
        .expect("previous");
    let mut fsm = builder.build().expect("build");

    assert!(!fsm.can("previous"));
    assert!(fsm.fire("previous").is_err());
    assert_eq!(fsm.index(), Some(0));
}
