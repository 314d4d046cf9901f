use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use forkwatch::errors::{ForkwatchError, Result};
use forkwatch::process::ProcessTable;
use forkwatch::types::{CollectOutcome, ProcessState, WorkerExit};
use nix::errno::Errno;
use nix::unistd::Pid;

/// How a collection of a given worker should turn out.
#[derive(Debug, Clone, Copy)]
pub enum CollectScript {
    Reap(WorkerExit),
    NoSuchChild,
    Fail(Errno),
}

type QueryHook = Box<dyn FnMut(usize) + Send>;

struct Inner {
    next_pid: i32,
    states: HashMap<usize, Vec<ProcessState>>,
    collect_scripts: HashMap<usize, CollectScript>,
    index_of: HashMap<Pid, usize>,
    queries: HashMap<Pid, usize>,
    total_queries: usize,
    /// `(pid, blocking)` for every collection attempt.
    collections: Vec<(Pid, bool)>,
    on_query: Option<QueryHook>,
}

/// A fake process table that answers state queries from a per-worker script.
///
/// - Worker `i` answers its n-th query with `script[i][n]`, repeating the last
///   entry once the script runs out. Unscripted workers are always `Running`.
/// - Collections succeed with exit code 0 unless scripted otherwise.
/// - An optional hook runs after every query with the running query count,
///   e.g. to cancel a token in the middle of a round.
#[derive(Clone)]
pub struct ScriptedProcessTable {
    inner: Arc<Mutex<Inner>>,
}

impl fmt::Debug for ScriptedProcessTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedProcessTable").finish_non_exhaustive()
    }
}

impl ScriptedProcessTable {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                next_pid: 500,
                states: HashMap::new(),
                collect_scripts: HashMap::new(),
                index_of: HashMap::new(),
                queries: HashMap::new(),
                total_queries: 0,
                collections: Vec::new(),
                on_query: None,
            })),
        }
    }

    pub fn script(self, index: usize, states: &[ProcessState]) -> Self {
        self.inner
            .lock()
            .unwrap()
            .states
            .insert(index, states.to_vec());
        self
    }

    pub fn collect_as(self, index: usize, script: CollectScript) -> Self {
        self.inner
            .lock()
            .unwrap()
            .collect_scripts
            .insert(index, script);
        self
    }

    pub fn on_query(self, hook: impl FnMut(usize) + Send + 'static) -> Self {
        self.inner.lock().unwrap().on_query = Some(Box::new(hook));
        self
    }

    pub fn collection_attempts(&self, pid: Pid) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.collections.iter().filter(|(p, _)| *p == pid).count()
    }

    pub fn blocking_collections(&self) -> Vec<Pid> {
        let inner = self.inner.lock().unwrap();
        inner
            .collections
            .iter()
            .filter(|(_, blocking)| *blocking)
            .map(|(pid, _)| *pid)
            .collect()
    }

    pub fn spawned(&self) -> Vec<Pid> {
        let inner = self.inner.lock().unwrap();
        let mut pids: Vec<_> = inner.index_of.keys().copied().collect();
        pids.sort_by_key(|pid| pid.as_raw());
        pids
    }

    pub fn total_queries(&self) -> usize {
        self.inner.lock().unwrap().total_queries
    }

    fn collect_inner(&mut self, pid: Pid, blocking: bool) -> Result<CollectOutcome> {
        let mut inner = self.inner.lock().unwrap();
        let already = inner.collections.iter().any(|(p, _)| *p == pid);
        inner.collections.push((pid, blocking));
        if already {
            return Ok(CollectOutcome::NoSuchChild);
        }

        let script = inner
            .index_of
            .get(&pid)
            .and_then(|index| inner.collect_scripts.get(index))
            .copied()
            .unwrap_or(CollectScript::Reap(WorkerExit::Exited(0)));

        match script {
            CollectScript::Reap(exit) => Ok(CollectOutcome::Reaped(exit)),
            CollectScript::NoSuchChild => Ok(CollectOutcome::NoSuchChild),
            CollectScript::Fail(source) => Err(ForkwatchError::Collect {
                pid: pid.as_raw(),
                source,
            }),
        }
    }
}

impl Default for ScriptedProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable for ScriptedProcessTable {
    fn spawn_worker(&mut self, index: usize) -> Result<Pid> {
        let mut inner = self.inner.lock().unwrap();
        let pid = Pid::from_raw(inner.next_pid);
        inner.next_pid += 1;
        inner.index_of.insert(pid, index);
        Ok(pid)
    }

    fn query_state(&mut self, pid: Pid) -> ProcessState {
        let mut inner = self.inner.lock().unwrap();
        inner.total_queries += 1;
        let total = inner.total_queries;

        let n = {
            let count = inner.queries.entry(pid).or_insert(0);
            *count += 1;
            *count - 1
        };

        let state = match inner.index_of.get(&pid) {
            Some(index) => inner
                .states
                .get(index)
                .and_then(|script| script.get(n).or_else(|| script.last()))
                .copied()
                .unwrap_or(ProcessState::Running),
            None => ProcessState::Gone,
        };

        if let Some(hook) = inner.on_query.as_mut() {
            hook(total);
        }
        state
    }

    fn try_collect(&mut self, pid: Pid) -> Result<CollectOutcome> {
        self.collect_inner(pid, false)
    }

    fn collect(&mut self, pid: Pid) -> Result<CollectOutcome> {
        self.collect_inner(pid, true)
    }
}
