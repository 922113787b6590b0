use crate::{arena::Arena, integrator::Integrator, sampler::Sampler, scene::Object};

use super::machinery::RenderState;

/// One render worker: a thread's private context plus the claim/execute loop.
///
/// Built on the driver thread (arena pre-allocated, integrator already
/// pre-processed), then moved into its thread. The worker claims tasks until
/// the table drains and flips its liveness flag as the very last step, so the
/// flag never reads finished while a task is still being written out.
pub(crate) struct Worker<O: Object + 'static> {
    id: usize,
    core: Option<core_affinity::CoreId>,
    arena: Arena,
    integrator: Box<dyn Integrator<O>>,
    sampler: Box<dyn Sampler>,
}

impl<O: Object + Sync + 'static> Worker<O> {
    pub fn new(
        id: usize,
        core: Option<core_affinity::CoreId>,
        arena: Arena,
        integrator: Box<dyn Integrator<O>>,
        sampler: Box<dyn Sampler>,
    ) -> Worker<O> {
        Worker {
            id,
            core,
            arena,
            integrator,
            sampler,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn run(mut self, state: &RenderState<'_, O>) {
        if let Some(core) = self.core {
            core_affinity::set_for_current(core);
        }

        while let Some(task_id) = state.claim_next() {
            let task = state.task(task_id);

            self.arena.reset();
            let mut buffer = task.take_buffer();
            self.integrator.render_tile(
                state.view(),
                task.tile,
                self.sampler.as_mut(),
                &mut self.arena,
                &mut buffer,
            );

            for sink in state.sinks() {
                sink.write_tile(task.tile, &buffer);
            }
            state.mark_done(task_id);
            // The buffer is dropped here, after the sinks consumed it.
        }

        log::debug!("worker{} drained the task table", self.id);
        state.worker_finished(self.id);
    }
}
