//! Loading operations: ordered batches of tasks sharing one batch identity.

use std::fmt;

use crate::context::{CancelScope, LoaderContext};
use crate::error::{ResourceError, ResourceResult};
use crate::system::ResourceSystem;

/// Identity of one loading operation, used to scope asset locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BatchId(u64);

impl BatchId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single unit of loading work.
///
/// Return [`ResourceError::Skipped`] to signal "nothing to do" without
/// aborting the operation.
pub trait LoadingTask: Send {
    fn run(&mut self, ctx: &LoaderContext<'_>) -> ResourceResult<()>;
}

impl<F> LoadingTask for F
where
    F: FnMut(&LoaderContext<'_>) -> ResourceResult<()> + Send,
{
    fn run(&mut self, ctx: &LoaderContext<'_>) -> ResourceResult<()> {
        self(ctx)
    }
}

/// Boxed task as stored by [`LoadingOperation`].
pub type BoxedTask<'a> = Box<dyn LoadingTask + 'a>;

/// Box a closure as a task, letting the compiler infer its argument types.
pub fn task<'a, F>(f: F) -> BoxedTask<'a>
where
    F: FnMut(&LoaderContext<'_>) -> ResourceResult<()> + Send + 'a,
{
    Box::new(f)
}

/// An ordered batch of tasks bound to one resource system and one batch id.
pub struct LoadingOperation<'a> {
    batch: BatchId,
    system: &'a ResourceSystem,
    tasks: Vec<BoxedTask<'a>>,
}

impl<'a> LoadingOperation<'a> {
    pub(crate) fn new(system: &'a ResourceSystem, batch: BatchId, tasks: Vec<BoxedTask<'a>>) -> Self {
        Self {
            batch,
            system,
            tasks,
        }
    }

    pub fn batch(&self) -> BatchId {
        self.batch
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn add_task(&mut self, task: BoxedTask<'a>) {
        self.tasks.push(task);
    }

    /// Run every task in order.
    ///
    /// Skipped tasks are ignored. The first other error stops the operation
    /// and is returned. A cancelled `scope` stops it before the next task.
    pub fn execute(&mut self, scope: &CancelScope) -> ResourceResult<()> {
        let span = tracing::debug_span!(
            "loading_operation",
            system = self.system.name(),
            batch = self.batch.id()
        );
        let _enter = span.enter();

        let ctx = LoaderContext::new(self.system, self.batch, scope);
        for (index, task) in self.tasks.iter_mut().enumerate() {
            if scope.is_cancelled() {
                tracing::debug!("Cancelled before task {}", index);
                return Err(ResourceError::Cancelled { batch: self.batch });
            }

            match task.run(&ctx) {
                Ok(()) => {}
                Err(ResourceError::Skipped) => {
                    tracing::trace!("Task {} skipped", index);
                }
                Err(err) => {
                    tracing::debug!("Task {} failed: {}", index, err);
                    return Err(err);
                }
            }
        }

        tracing::debug!("Completed {} tasks", self.tasks.len());
        Ok(())
    }
}

impl fmt::Debug for LoadingOperation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadingOperation")
            .field("batch", &self.batch)
            .field("system", &self.system.name())
            .field("tasks", &self.tasks.len())
            .finish()
    }
}
