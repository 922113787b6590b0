use std::{
    io,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    thread,
    time::Duration,
};

use index_vec::IndexVec;

use crate::{
    camera::Camera,
    integrator::RenderView,
    output::OutputSink,
    scene::{Object, Scene},
};

use super::driver::RenderError;
use super::task::{RenderTask, TaskId, TaskTable};
use super::worker::Worker;

/// A snapshot of render progress, in tasks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    pub finished: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            100.0
        } else {
            100.0 * (self.finished as f32) / (self.total as f32)
        }
    }
}

/// Shared state of one render: the immutable task table plus the claim
/// cursor, the completion vector and the worker liveness flags.
///
/// The claim cursor is the only synchronization point between workers; it is
/// held only for the atomic read-increment, never across a task's execution.
pub(crate) struct RenderState<'a, O: Object> {
    scene: &'a Scene<O>,
    camera: &'a Camera,
    sinks: &'a [Box<dyn OutputSink>],

    tasks: TaskTable,
    next_task: AtomicUsize,
    completed: IndexVec<TaskId, AtomicBool>,
    finished_workers: Vec<AtomicBool>,
}

impl<'a, O: Object> RenderState<'a, O> {
    pub fn new(
        scene: &'a Scene<O>,
        camera: &'a Camera,
        sinks: &'a [Box<dyn OutputSink>],
        tasks: TaskTable,
        worker_count: usize,
    ) -> RenderState<'a, O> {
        RenderState {
            scene,
            camera,
            sinks,

            completed: (0..tasks.len()).map(|_| AtomicBool::new(false)).collect(),
            finished_workers: (0..worker_count).map(|_| AtomicBool::new(false)).collect(),
            next_task: AtomicUsize::new(0),
            tasks,
        }
    }

    pub fn view(&self) -> RenderView<'_, O> {
        RenderView {
            scene: self.scene,
            camera: self.camera,
        }
    }

    pub fn sinks(&self) -> &[Box<dyn OutputSink>] {
        self.sinks
    }

    /// Claims the next unclaimed task, in task-table order. The atomic
    /// read-increment guarantees at most one worker ever owns an index.
    /// Returns `None` once the table is drained.
    pub fn claim_next(&self) -> Option<TaskId> {
        let index = self.next_task.fetch_add(1, Ordering::AcqRel);
        (index < self.tasks.len()).then(|| TaskId::from_usize(index))
    }

    pub fn task(&self, id: TaskId) -> &RenderTask {
        self.tasks.get(id)
    }

    /// Flips the completion flag of a finished task. Each flag transitions
    /// false to true exactly once, written only by the executing worker.
    pub fn mark_done(&self, id: TaskId) {
        let was_done = self.completed[id].swap(true, Ordering::AcqRel);
        debug_assert!(!was_done, "completion flag set twice");
    }

    pub fn worker_finished(&self, worker_id: usize) {
        self.finished_workers[worker_id].store(true, Ordering::Release);
    }

    /// Poisons the claim cursor so no further tasks are handed out.
    fn drain(&self) {
        self.next_task.store(self.tasks.len(), Ordering::Release);
    }

    pub fn progress(&self) -> Progress {
        Progress {
            finished: self
                .completed
                .iter()
                .filter(|done| done.load(Ordering::Acquire))
                .count(),
            total: self.tasks.len(),
        }
    }

    pub fn all_workers_finished(&self) -> bool {
        self.finished_workers
            .iter()
            .all(|finished| finished.load(Ordering::Acquire))
    }
}

/// Runs the worker pool to completion.
///
/// Spawns one named, core-pinned thread per worker, then polls progress from
/// the calling thread. The monitor never touches the claim cursor; the render
/// is complete when every worker reports finished, not merely when every task
/// is done. A failed thread spawn aborts the render.
pub(crate) fn execute<O: Object + Sync + 'static>(
    state: &RenderState<'_, O>,
    workers: Vec<Worker<O>>,
    poll_interval: Duration,
    on_progress: &mut dyn FnMut(Progress),
) -> Result<(), RenderError> {
    thread::scope(|scope| {
        let spawned: io::Result<Vec<_>> = workers
            .into_iter()
            .map(|worker| {
                thread::Builder::new()
                    .name(format!("worker{}", worker.id()))
                    .spawn_scoped(scope, move || worker.run(state))
            })
            .collect();

        let handles = match spawned {
            Ok(handles) => handles,
            Err(source) => {
                // Any threads that did start must drain without claiming
                // work before the render can be abandoned.
                state.drain();
                return Err(RenderError::SpawnWorker(source));
            }
        };

        loop {
            let finished = state.all_workers_finished()
                || handles.iter().all(|handle| handle.is_finished());
            on_progress(state.progress());
            if finished {
                break;
            }
            thread::sleep(poll_interval);
        }

        for handle in handles {
            handle.join().expect("Worker thread panicked");
        }
        Ok(())
    })
}
