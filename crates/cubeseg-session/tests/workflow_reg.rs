//! Pending/Done workflow regression test
//!
//! Moves basins between the Pending and Done partitions and checks focus
//! stacks, navigation, classification toggles and the tables shown to the
//! operator.
//!
//! Run with:
//! ```
//! cargo test -p cubeseg-session --test workflow_reg
//! ```

use cubeseg_core::{Coord3, Shape3};
use cubeseg_session::{
    Command, INVALID_ID, Navigator, Outcome, SLACK_ID, Session, SessionError, SessionParams,
    WaitPolicy, WorkArea, WorkflowPartition,
};
use cubeseg_test::fixtures::{corner_cavity, membrane_slab};
use cubeseg_test::{MemoryHost, RegParams, init_logging};
use std::time::Duration;

const SIDE: usize = 30;
const A: u64 = 10_000_000;
const B: u64 = 10_000_001;

fn params() -> SessionParams {
    SessionParams::new(WorkArea::new(Coord3::splat(0), Shape3::cube(SIDE)))
        .with_auto_slack(false)
        .with_min_object_size(100)
        .with_wait(WaitPolicy::default().with_backoff(Duration::ZERO))
}

fn host() -> MemoryHost {
    MemoryHost::filled(Shape3::cube(SIDE), 0).unwrap()
}

/// Session with A at the center and B in the 10x10x10 corner cavity
fn two_basins(host: &mut MemoryHost) -> Session<'_, MemoryHost> {
    let prediction = corner_cavity(Shape3::cube(SIDE), Shape3::cube(10)).unwrap();
    let mut session = Session::begin(host, &prediction, params()).unwrap();
    for coord in [Coord3::splat(15), Coord3::splat(5)] {
        session
            .execute(Command::AddSeed {
                coord,
                slack: false,
            })
            .unwrap();
    }
    session
}

#[test]
fn workflow_done_toggle() {
    init_logging();
    let mut rp = RegParams::new("workflow");

    let mut host = host();
    let mut session = two_basins(&mut host);
    rp.check(!session.ready_to_finish(), "two pending basins");

    // Moving an inactive basin to Done keeps the active one
    let outcome = session.execute(Command::ToggleDone { id: B }).unwrap();
    rp.check(
        outcome
            == Outcome::Moved {
                id: B,
                to: WorkflowPartition::Done,
            },
        "B moved to done",
    );
    rp.compare_values(A as f64, session.active_id() as f64, 0.0);
    rp.check(session.partition_ids(WorkflowPartition::Done) == [B], "done holds B");
    rp.check(session.focus(WorkflowPartition::Done).top() == B, "B focused in done");

    // Done basins can be visited but not edited
    let outcome = session.execute(Command::NavigateDone { id: B }).unwrap();
    rp.check(outcome == Outcome::Navigated { id: B }, "navigated to B");
    rp.check(
        session.host().position() == Coord3::new(14, 14, 5),
        "viewport on B's slice",
    );
    rp.compare_values(A as f64, session.active_id() as f64, 0.0);
    let result = session.execute(Command::SelectBasin { id: B });
    rp.check(
        matches!(result, Err(SessionError::IllegalOperation(_))),
        "done basin cannot be selected",
    );
    let result = session.execute(Command::NavigateDone { id: A });
    rp.check(
        matches!(result, Err(SessionError::IllegalOperation(_))),
        "pending basin is not a done target",
    );

    // Moving the active basin leaves nothing to activate
    session.execute(Command::ToggleDone { id: A }).unwrap();
    rp.compare_values(INVALID_ID as f64, session.active_id() as f64, 0.0);
    rp.check(session.ready_to_finish(), "everything is done");
    rp.compare_values(0.0, session.active_mask().count_true() as f64, 0.0);
    let moves = session.host().positions().len();
    let result = session.execute(Command::AddSeed {
        coord: Coord3::splat(20),
        slack: false,
    });
    rp.check(
        matches!(result, Err(SessionError::IllegalOperation(_))),
        "no seeding without an active basin",
    );
    let result = session.execute(Command::StageSubseed {
        coord: Coord3::splat(20),
    });
    rp.check(
        matches!(result, Err(SessionError::IllegalOperation(_))),
        "no staging without an active basin",
    );
    rp.compare_values(moves as f64, session.host().positions().len() as f64, 0.0);
    rp.compare_values(2.0, session.registry().len() as f64, 0.0);

    // Back to Pending makes it active again
    session.execute(Command::ToggleDone { id: B }).unwrap();
    rp.compare_values(B as f64, session.active_id() as f64, 0.0);
    rp.check(session.focus(WorkflowPartition::Done).ids() == [A], "A left in done");
    rp.check(session.verify_invariants().is_ok(), "invariants hold");

    assert!(rp.cleanup(), "workflow regression test failed");
}

#[test]
fn workflow_removal_reopens_done_owner() {
    init_logging();
    let mut rp = RegParams::new("workflow_reopen");

    let mut host = host();
    let mut session = two_basins(&mut host);
    session.execute(Command::ToggleDone { id: A }).unwrap();
    rp.compare_values(B as f64, session.active_id() as f64, 0.0);

    // B's voxels flood back into A, which must become editable again
    let outcome = session.execute(Command::RemoveSeeds { ids: vec![B] }).unwrap();
    rp.check(
        outcome
            == Outcome::Removed {
                ids: vec![B],
                active: A,
            },
        "A takes over",
    );
    rp.check(
        session.basin(A).map(|b| b.state) == Some(WorkflowPartition::Pending),
        "A reopened",
    );
    rp.check(session.focus(WorkflowPartition::Done).is_empty(), "done is empty");
    rp.check(session.verify_invariants().is_ok(), "invariants hold");

    assert!(rp.cleanup(), "workflow reopen test failed");
}

#[test]
fn workflow_select_and_tables() {
    init_logging();
    let mut rp = RegParams::new("workflow_tables");

    let mut host = host();
    let mut session = two_basins(&mut host);

    // Rows are ordered by primary seed, the focus marked
    let rows = session.table(WorkflowPartition::Pending);
    rp.compare_values(2.0, rows.len() as f64, 0.0);
    rp.check(rows[0].id == B && rows[1].id == A, "ordered by coordinate");
    rp.check(rows[0].coord == Coord3::splat(6), "one-based coordinates");
    rp.check(rows[1].focused && !rows[0].focused, "active basin focused");
    rp.check(session.table(WorkflowPartition::Done).is_empty(), "done table empty");

    // Selecting moves the focus
    session.execute(Command::SelectBasin { id: B }).unwrap();
    let rows = session.table(WorkflowPartition::Pending);
    rp.check(rows[0].focused, "B focused");
    rp.check(session.focus(WorkflowPartition::Pending).ids() == [A, B], "focus stack");

    // Re-selecting the active basin only moves the viewport
    session.execute(Command::SelectBasin { id: B }).unwrap();
    rp.compare_values(B as f64, session.active_id() as f64, 0.0);
    rp.check(
        session.host().position() == Coord3::new(14, 14, 5),
        "viewport on B",
    );

    // Classification and to-do flags
    let outcome = session
        .execute(Command::ToggleSlack { ids: vec![B, B] })
        .unwrap();
    rp.check(outcome == Outcome::Reclassified { ids: vec![B] }, "B reclassified");
    session.execute(Command::ToggleTodo { ids: vec![A] }).unwrap();
    let rows = session.table(WorkflowPartition::Pending);
    rp.check(rows[0].slack && !rows[0].todo, "B is slack");
    rp.check(rows[1].todo && !rows[1].slack, "A is to-do");

    // Unknown ids reject the whole command
    let result = session.execute(Command::ToggleTodo { ids: vec![A, 5] });
    rp.check(
        matches!(result, Err(SessionError::UnknownBasin(5))),
        "unknown id rejected",
    );
    rp.check(session.basin(A).is_some_and(|b| b.todo), "A unchanged");
    let result = session.execute(Command::ToggleSlack { ids: vec![SLACK_ID] });
    rp.check(
        matches!(result, Err(SessionError::UnknownBasin(SLACK_ID))),
        "no slack basin in this session",
    );

    assert!(rp.cleanup(), "workflow tables test failed");
}

#[test]
fn workflow_auto_slack() {
    init_logging();
    let mut rp = RegParams::new("workflow_slack");

    // 20x20x20 with a membrane slab on z in [9, 13)
    let shape = Shape3::cube(20);
    let prediction = membrane_slab(shape, 9..13).unwrap();
    let params = SessionParams::new(WorkArea::new(Coord3::splat(0), shape))
        .with_wait(WaitPolicy::default().with_backoff(Duration::ZERO));
    let mut host = MemoryHost::filled(shape, 0).unwrap();
    let mut session = Session::begin(&mut host, &prediction, params).unwrap();

    // The eroded slab seeds the slack basin, which floods everything
    rp.compare_values(800.0, session.seeds().seeded_count() as f64, 0.0);
    rp.compare_values(SLACK_ID as f64, session.active_id() as f64, 0.0);
    rp.compare_values(8000.0, session.active_mask().count_true() as f64, 0.0);
    rp.check(session.ready_to_finish(), "slack alone is ready");

    // Splitting off the slack basin keeps it active
    session
        .execute(Command::AddSeed {
            coord: Coord3::new(10, 10, 4),
            slack: false,
        })
        .unwrap();
    rp.compare_values(SLACK_ID as f64, session.active_id() as f64, 0.0);
    let labels = session.labels();
    let below_slab = (0..labels.len())
        .filter(|&i| labels.get_index(i) == A)
        .all(|i| labels.shape().coord_of(i).z < 9);
    rp.check(below_slab, "new basin stays below the slab");
    rp.check(
        labels.count(|&v| v == A) > 3000,
        "new basin fills the lower cells",
    );
    rp.compare_values(
        SLACK_ID as f64,
        labels.get(Coord3::new(10, 10, 16)).unwrap() as f64,
        0.0,
    );
    rp.check(!session.ready_to_finish(), "A is pending");

    // The slack basin is protected
    let result = session.execute(Command::RemoveSeeds {
        ids: vec![SLACK_ID],
    });
    rp.check(
        matches!(result, Err(SessionError::IllegalOperation(_))),
        "slack cannot be removed",
    );
    let result = session.execute(Command::ToggleSlack {
        ids: vec![A, SLACK_ID],
    });
    rp.check(
        matches!(result, Err(SessionError::IllegalOperation(_))),
        "slack cannot be reclassified",
    );
    rp.check(
        session.basin(A).is_some_and(|b| !b.is_slack_classified()),
        "A unchanged",
    );

    session.execute(Command::ToggleDone { id: A }).unwrap();
    rp.check(session.ready_to_finish(), "only slack is pending");
    rp.compare_values(SLACK_ID as f64, session.active_id() as f64, 0.0);

    assert!(rp.cleanup(), "workflow slack test failed");
}
