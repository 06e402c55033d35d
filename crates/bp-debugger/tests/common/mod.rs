#![allow(dead_code)]

use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bp_debugger::debug::{
    DebugHook, DebuggerEngine, ExecutionContext, FrameTable, Resume, ScopeSource, SourceUnit,
    StopEvent,
};
use bp_debugger::value::{ObjectRef, Value};
use bp_debugger::{DebuggerConfig, IntrospectionError};
use smol_str::SmolStr;

pub const WAIT: Duration = Duration::from_millis(1000);
pub const QUIET: Duration = Duration::from_millis(100);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn engine_with_stops(
    line_count: u32,
    breakpoints: &[u32],
) -> (DebuggerEngine, Receiver<StopEvent>) {
    init_tracing();
    let engine = DebuggerEngine::new(
        SourceUnit::new("main.js", line_count),
        &DebuggerConfig::default(),
    );
    for result in engine.setup_breakpoints(breakpoints.iter().map(|line| (*line, true))) {
        result.unwrap();
    }
    let (tx, rx) = channel();
    engine.set_stop_sender(tx);
    (engine, rx)
}

/// Activation record whose bindings live in a shared object, so the script
/// thread can update them between lines.
#[derive(Debug, Clone)]
pub struct Scope {
    name: Option<SmolStr>,
    vars: ObjectRef,
}

impl Scope {
    pub fn function(name: &str) -> Self {
        Self {
            name: Some(name.into()),
            vars: ObjectRef::new(),
        }
    }

    pub fn top_level() -> Self {
        Self {
            name: None,
            vars: ObjectRef::new(),
        }
    }

    pub fn with(self, name: &str, value: impl Into<Value>) -> Self {
        self.vars.insert(name, value.into());
        self
    }

    pub fn assign(&self, name: &str, value: impl Into<Value>) {
        self.vars.insert(name, value.into());
    }
}

impl ScopeSource for Scope {
    fn function_name(&self) -> Result<Option<SmolStr>, IntrospectionError> {
        Ok(self.name.clone())
    }

    fn identifiers(&self) -> Result<Vec<SmolStr>, IntrospectionError> {
        Ok(self.vars.members().into_iter().map(|(name, _)| name).collect())
    }

    fn binding(&self, name: &str) -> Result<Value, IntrospectionError> {
        self.vars
            .get(name)
            .ok_or_else(|| IntrospectionError::UnreadableBinding(name.into()))
    }
}

/// Live frame table, innermost first.
#[derive(Debug, Clone, Default)]
pub struct Frames(pub Vec<Scope>);

impl FrameTable for Frames {
    fn frame_count(&self) -> usize {
        self.0.len()
    }

    fn frame(&self, index: usize) -> Result<&dyn ScopeSource, IntrospectionError> {
        self.0
            .get(index)
            .map(|scope| scope as &dyn ScopeSource)
            .ok_or(IntrospectionError::FrameOutOfRange {
                index,
                count: self.0.len(),
            })
    }
}

/// Frame table that parks the reading thread on every read until released.
pub struct GatedFrames {
    frames: Frames,
    entered: Sender<()>,
    release: Receiver<()>,
}

/// Returns the table, a receiver signalled when a read starts and a sender
/// that lets the read finish.
pub fn gated(frames: Frames) -> (GatedFrames, Receiver<()>, Sender<()>) {
    let (entered_tx, entered_rx) = channel();
    let (release_tx, release_rx) = channel();
    (
        GatedFrames {
            frames,
            entered: entered_tx,
            release: release_rx,
        },
        entered_rx,
        release_tx,
    )
}

impl FrameTable for GatedFrames {
    fn frame_count(&self) -> usize {
        let _ = self.entered.send(());
        let _ = self.release.recv();
        self.frames.frame_count()
    }

    fn frame(&self, index: usize) -> Result<&dyn ScopeSource, IntrospectionError> {
        self.frames.frame(index)
    }
}

/// One interpreted statement.
#[derive(Debug, Clone)]
pub struct ScriptLine {
    pub line: u32,
    pub depth: u32,
    /// Assignment performed on the innermost frame once the line executes.
    pub assign: Option<(&'static str, Value)>,
}

pub fn line(line: u32, depth: u32) -> ScriptLine {
    ScriptLine {
        line,
        depth,
        assign: None,
    }
}

pub fn assign(line: u32, depth: u32, name: &'static str, value: impl Into<Value>) -> ScriptLine {
    ScriptLine {
        line,
        depth,
        assign: Some((name, value.into())),
    }
}

pub struct ScriptRun {
    /// Lines in execution order, sent after the hook let them run.
    pub executed: Receiver<u32>,
    pub handle: JoinHandle<Vec<Resume>>,
}

impl ScriptRun {
    pub fn next_executed(&self) -> u32 {
        self.executed.recv_timeout(WAIT).unwrap()
    }

    pub fn assert_blocked(&self) {
        assert!(self.executed.recv_timeout(QUIET).is_err());
    }

    pub fn finish(self) -> Vec<Resume> {
        self.handle.join().unwrap()
    }
}

/// Run `lines` on a dedicated interpreter thread with `engine` as its hook.
/// Assignments target the first scope of `scopes`.
pub fn run_script(engine: &DebuggerEngine, lines: Vec<ScriptLine>, scopes: Frames) -> ScriptRun {
    run_with_table(engine, lines, scopes.clone(), scopes)
}

pub fn run_with_table<T>(
    engine: &DebuggerEngine,
    lines: Vec<ScriptLine>,
    scopes: Frames,
    table: T,
) -> ScriptRun
where
    T: FrameTable + Send + 'static,
{
    let mut hook = engine.clone();
    let (tx, rx) = channel();
    let handle = thread::spawn(move || {
        let mut resumes = Vec::new();
        for step in lines {
            let resume = hook.on_line(step.line, step.depth, ExecutionContext::Direct(&table));
            resumes.push(resume);
            if resume == Resume::Exit {
                break;
            }
            if let (Some((name, value)), Some(scope)) = (step.assign, scopes.0.first()) {
                scope.assign(name, value);
            }
            let _ = tx.send(step.line);
        }
        hook.on_finished();
        resumes
    });
    ScriptRun {
        executed: rx,
        handle,
    }
}
