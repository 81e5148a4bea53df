//! Scheduler - Deferred work queues.
//!
//! Two queues stand in for the browser event loop:
//! - **microtasks**: model-change notifications. Setting a model returns
//!   immediately; dependent selectors run when the queue is flushed.
//! - **paint**: work that must wait for the next frame, like the reselect sweep
//!   a view schedules after it is drawn.
//!
//! The scheduler is injected (every [`Runtime`](crate::Runtime) owns one), so
//! tests drive it deterministically instead of waiting on timers.
//!
//! # Example
//!
//! ```ignore
//! let scheduler = Scheduler::new();
//! scheduler.queue_microtask(|| println!("after the current turn"));
//! scheduler.request_paint(|| println!("next frame"));
//!
//! scheduler.flush(); // runs the microtask
//! scheduler.paint(); // runs the paint task
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce()>;

/// Upper bound on frames `settle()` will run before giving up.
const MAX_SETTLE_FRAMES: usize = 64;

#[derive(Default)]
struct SchedulerInner {
    microtasks: RefCell<VecDeque<Task>>,
    paint: RefCell<VecDeque<Task>>,
}

/// Cloneable handle to a pair of task queues.
#[derive(Clone, Default)]
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

impl Scheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue work to run on the next flush.
    pub fn queue_microtask(&self, task: impl FnOnce() + 'static) {
        self.inner.microtasks.borrow_mut().push_back(Box::new(task));
    }

    /// Queue work to run on the next paint.
    pub fn request_paint(&self, task: impl FnOnce() + 'static) {
        self.inner.paint.borrow_mut().push_back(Box::new(task));
    }

    /// Number of microtasks waiting.
    pub fn pending_microtasks(&self) -> usize {
        self.inner.microtasks.borrow().len()
    }

    /// Number of paint tasks waiting.
    pub fn pending_paint(&self) -> usize {
        self.inner.paint.borrow().len()
    }

    /// Run microtasks until the queue is empty, including any queued while
    /// flushing. Returns how many ran.
    pub fn flush(&self) -> usize {
        let mut ran = 0;
        loop {
            // Pop in its own statement so the queue is not borrowed while the
            // task runs (tasks routinely queue more work).
            let next = self.inner.microtasks.borrow_mut().pop_front();
            let Some(task) = next else { break };
            task();
            ran += 1;
        }
        ran
    }

    /// Run one frame: flush microtasks, run the paint tasks that were queued
    /// before the frame started, then flush again. Paint tasks queued during
    /// the frame wait for the next one. Returns how many paint tasks ran.
    pub fn paint(&self) -> usize {
        self.flush();
        let frame: Vec<Task> = self.inner.paint.borrow_mut().drain(..).collect();
        let ran = frame.len();
        for task in frame {
            task();
        }
        self.flush();
        ran
    }

    /// Alternate flushes and frames until both queues are empty.
    pub fn settle(&self) {
        self.flush();
        for _ in 0..MAX_SETTLE_FRAMES {
            if self.pending_paint() == 0 {
                return;
            }
            self.paint();
        }
        tracing::warn!(
            frames = MAX_SETTLE_FRAMES,
            pending = self.pending_paint(),
            "scheduler did not settle; paint tasks keep scheduling more paint tasks"
        );
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending_microtasks", &self.pending_microtasks())
            .field("pending_paint", &self.pending_paint())
            .finish()
    }
}
