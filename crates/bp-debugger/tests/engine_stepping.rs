mod common;

use std::sync::{Arc, Mutex};

use bp_debugger::debug::{
    Command, CommandOutput, Resume, RunState, RunStateSink, SharedRunState, StepKind, StopReason,
};
use common::{assign, engine_with_stops, line, run_script, Frames, Scope, QUIET, WAIT};

fn ack(text: &str) -> Result<CommandOutput, bp_debugger::DebuggerError> {
    Ok(CommandOutput::Ack(text.to_string()))
}

#[test]
fn step_over_skips_callee_and_stops_on_next_line() {
    let (engine, stops) = engine_with_stops(40, &[10, 20]);
    let scopes = Frames(vec![Scope::top_level().with("x", 0)]);
    let run = run_script(
        &engine,
        vec![
            assign(10, 0, "x", 1),
            line(30, 1),
            line(31, 1),
            assign(11, 0, "x", 2),
            line(20, 0),
        ],
        scopes,
    );

    let stop = stops.recv_timeout(WAIT).unwrap();
    assert_eq!((stop.line, stop.reason), (10, StopReason::Breakpoint));
    assert_eq!(engine.run_state(), RunState::SuspendedAtBreakpoint);
    run.assert_blocked();

    let before = engine.submit(Command::GetVariables).wait().unwrap();
    assert_eq!(before.as_snapshot().unwrap().binding(0, "x"), Some("0"));

    assert_eq!(engine.submit(Command::StepOver).wait(), ack("step over"));
    assert_eq!(run.next_executed(), 10);
    assert_eq!(run.next_executed(), 30);
    assert_eq!(run.next_executed(), 31);

    let stop = stops.recv_timeout(WAIT).unwrap();
    assert_eq!((stop.line, stop.reason), (11, StopReason::Step));
    assert_eq!(stop.call_depth, 0);
    run.assert_blocked();

    let after = engine.submit(Command::GetVariables).wait().unwrap();
    assert_eq!(after.as_snapshot().unwrap().binding(0, "x"), Some("1"));

    assert_eq!(engine.submit(Command::Continue).wait(), ack("continue run"));
    assert_eq!(run.next_executed(), 11);

    let stop = stops.recv_timeout(WAIT).unwrap();
    assert_eq!((stop.line, stop.reason), (20, StopReason::Breakpoint));
    assert_eq!(engine.submit(Command::Continue).wait(), ack("continue run"));
    assert_eq!(run.next_executed(), 20);

    assert_eq!(
        run.finish(),
        vec![
            Resume::Step(StepKind::Over),
            Resume::Go,
            Resume::Go,
            Resume::Go,
            Resume::Go
        ]
    );
    assert_eq!(engine.run_state(), RunState::Stopped);
}

#[test]
fn step_into_stops_inside_callee() {
    let (engine, stops) = engine_with_stops(40, &[10]);
    let run = run_script(
        &engine,
        vec![line(10, 0), line(30, 1), line(11, 0)],
        Frames::default(),
    );

    assert_eq!(stops.recv_timeout(WAIT).unwrap().line, 10);
    assert_eq!(engine.submit(Command::StepInto).wait(), ack("step into"));

    let stop = stops.recv_timeout(WAIT).unwrap();
    assert_eq!((stop.line, stop.call_depth, stop.reason), (30, 1, StopReason::Step));

    assert_eq!(engine.submit(Command::Continue).wait(), ack("continue run"));
    assert_eq!(
        run.finish(),
        vec![Resume::Step(StepKind::Into), Resume::Go, Resume::Go]
    );
    assert!(stops.recv_timeout(QUIET).is_err());
}

#[test]
fn step_out_returns_to_caller() {
    let (engine, stops) = engine_with_stops(40, &[30]);
    let run = run_script(
        &engine,
        vec![line(10, 0), line(30, 1), line(31, 1), line(11, 0)],
        Frames::default(),
    );

    let stop = stops.recv_timeout(WAIT).unwrap();
    assert_eq!((stop.line, stop.call_depth), (30, 1));
    assert_eq!(engine.submit(Command::StepOut).wait(), ack("step out"));

    let stop = stops.recv_timeout(WAIT).unwrap();
    assert_eq!((stop.line, stop.call_depth, stop.reason), (11, 0, StopReason::Step));

    assert_eq!(engine.submit(Command::Continue).wait(), ack("continue run"));
    assert_eq!(
        run.finish(),
        vec![Resume::Go, Resume::Step(StepKind::Out), Resume::Go, Resume::Go]
    );
}

#[test]
fn breakpoint_in_callee_cancels_pending_step() {
    let (engine, stops) = engine_with_stops(40, &[10, 31]);
    let run = run_script(
        &engine,
        vec![line(10, 0), line(30, 1), line(31, 1), line(11, 0), line(12, 0)],
        Frames::default(),
    );

    assert_eq!(stops.recv_timeout(WAIT).unwrap().line, 10);
    assert_eq!(engine.submit(Command::StepOver).wait(), ack("step over"));

    let stop = stops.recv_timeout(WAIT).unwrap();
    assert_eq!((stop.line, stop.reason), (31, StopReason::Breakpoint));

    assert_eq!(engine.submit(Command::Continue).wait(), ack("continue run"));
    run.finish();
    assert!(stops.recv_timeout(QUIET).is_err());
}

#[test]
fn muted_breakpoints_do_not_suspend() {
    let (engine, stops) = engine_with_stops(40, &[10, 11]);
    assert_eq!(
        engine
            .submit(Command::ToggleMuteBreakpoints { muted: true })
            .wait(),
        ack("breakpoints muted toggled to true")
    );
    assert!(engine.breakpoints_muted());

    let run = run_script(&engine, vec![line(10, 0), line(11, 0)], Frames::default());
    assert_eq!(run.next_executed(), 10);
    assert_eq!(run.next_executed(), 11);
    assert_eq!(run.finish(), vec![Resume::Go, Resume::Go]);

    assert!(stops.try_recv().is_err());
    assert!(engine.last_stop().is_none());
}

#[test]
fn step_still_stops_while_muted() {
    let (engine, stops) = engine_with_stops(40, &[10, 20]);
    let run = run_script(
        &engine,
        vec![line(10, 0), line(11, 0), line(20, 0)],
        Frames::default(),
    );

    assert_eq!(stops.recv_timeout(WAIT).unwrap().line, 10);
    assert_eq!(
        engine
            .submit(Command::ToggleMuteBreakpoints { muted: true })
            .wait(),
        ack("breakpoints muted toggled to true")
    );
    assert_eq!(engine.run_state(), RunState::SuspendedAtBreakpoint);

    assert_eq!(engine.submit(Command::StepOver).wait(), ack("step over"));
    let stop = stops.recv_timeout(WAIT).unwrap();
    assert_eq!((stop.line, stop.reason), (11, StopReason::Step));

    assert_eq!(engine.submit(Command::Continue).wait(), ack("continue run"));
    assert_eq!(
        run.finish(),
        vec![Resume::Step(StepKind::Over), Resume::Go, Resume::Go]
    );
    assert!(stops.recv_timeout(QUIET).is_err());
}

#[test]
fn run_state_sink_follows_transitions() {
    let (engine, stops) = engine_with_stops(40, &[10]);
    let sink = SharedRunState::new();
    engine.set_run_state_sink(Arc::new(sink.clone()));
    assert_eq!(sink.get(), RunState::Running);

    let run = run_script(&engine, vec![line(10, 0), line(11, 0)], Frames::default());
    stops.recv_timeout(WAIT).unwrap();
    assert_eq!(sink.get(), RunState::SuspendedAtBreakpoint);

    assert_eq!(engine.submit(Command::Continue).wait(), ack("continue run"));
    run.finish();
    assert_eq!(sink.get(), RunState::Stopped);

    let last = engine.last_stop().unwrap();
    assert_eq!((last.line, last.source.as_str()), (10, "main.js"));
}

#[derive(Default)]
struct RecordingSink(Mutex<Vec<RunState>>);

impl RunStateSink for RecordingSink {
    fn set_debugger_state(&self, state: RunState) {
        self.0.lock().unwrap().push(state);
    }
}

#[test]
fn run_state_sink_sees_every_transition_in_order() {
    let (engine, stops) = engine_with_stops(40, &[10, 11]);
    let sink = Arc::new(RecordingSink::default());
    engine.set_run_state_sink(sink.clone());

    let run = run_script(&engine, vec![line(10, 0), line(11, 0)], Frames::default());
    assert_eq!(stops.recv_timeout(WAIT).unwrap().line, 10);
    assert_eq!(engine.submit(Command::Continue).wait(), ack("continue run"));
    assert_eq!(stops.recv_timeout(WAIT).unwrap().line, 11);
    assert_eq!(engine.submit(Command::Exit).wait(), ack("exit"));
    assert_eq!(run.finish(), vec![Resume::Go, Resume::Exit]);

    assert_eq!(
        *sink.0.lock().unwrap(),
        vec![
            RunState::Running,
            RunState::SuspendedAtBreakpoint,
            RunState::Running,
            RunState::SuspendedAtBreakpoint,
            RunState::Stopped,
        ]
    );
}
