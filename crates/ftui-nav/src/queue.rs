#![forbid(unsafe_code)]

//! Serial transition queue and rotation gating.
//!
//! # Design
//!
//! Queue units move through an explicit state machine,
//!
//! ```text
//! Pending ──start()──▶ Executing ──finish()──▶ Finished
//! ```
//!
//! and announce every change to their observers. Units are asynchronous:
//! `start` returns long before the unit finishes. A [`TransitionOperation`]
//! finishes only when its animator reports completion through the
//! transition; a [`RotationOperation`] finishes when the host says its
//! rotation is over.
//!
//! [`TransitionQueue`] is configured with a concurrency limit of one. It
//! starts the first ready unit in submission order whenever a slot is free,
//! and re-pumps when a unit or one of its dependencies finishes. There is no
//! thread involved; "waiting" means the unit sits in the pending list.
//!
//! # Invariants
//!
//! 1. At most `max_concurrent` (one) transition units execute at once.
//! 2. A unit with an unfinished dependency never starts.
//! 3. Among ready units, submission order is preserved.
//! 4. State only moves forward.
//!
//! # Failure Modes
//!
//! - An animator that never completes holds the slot forever; every later
//!   transition waits behind it.
//! - A rotation that is never finished blocks every transition that depends
//!   on it.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::animator::Animator;

static OPERATION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

fn next_operation_id() -> u64 {
    OPERATION_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

// ============================================================================
// State machine
// ============================================================================

/// Lifecycle of a queue unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OperationState {
    #[default]
    Pending,
    Executing,
    Finished,
}

type StateObserver = Box<dyn Fn(OperationState)>;

/// State shared by every queue unit kind.
struct UnitCore {
    id: u64,
    state: Cell<OperationState>,
    observers: RefCell<Vec<StateObserver>>,
}

impl UnitCore {
    fn new() -> Self {
        Self {
            id: next_operation_id(),
            state: Cell::new(OperationState::Pending),
            observers: RefCell::new(Vec::new()),
        }
    }

    fn advance(&self, next: OperationState) {
        let current = self.state.get();
        let valid = matches!(
            (current, next),
            (OperationState::Pending, OperationState::Executing)
                | (OperationState::Executing, OperationState::Finished)
        );
        assert!(valid, "invalid queue unit transition {current:?} -> {next:?}");
        self.state.set(next);

        // Observers may register more observers while running.
        let observers = std::mem::take(&mut *self.observers.borrow_mut());
        for observer in &observers {
            observer(next);
        }
        let mut slot = self.observers.borrow_mut();
        let added = std::mem::replace(&mut *slot, observers);
        slot.extend(added);
    }

    fn observe(&self, observer: StateObserver) {
        self.observers.borrow_mut().push(observer);
    }
}

// ============================================================================
// Rotation unit
// ============================================================================

/// An in-progress device rotation that transitions must wait out.
pub struct RotationOperation {
    core: UnitCore,
}

impl RotationOperation {
    pub(crate) fn new() -> Self {
        Self {
            core: UnitCore::new(),
        }
    }

    /// Unique unit id.
    #[inline]
    pub fn id(&self) -> u64 {
        self.core.id
    }

    #[inline]
    pub fn state(&self) -> OperationState {
        self.core.state.get()
    }

    #[inline]
    pub fn is_executing(&self) -> bool {
        self.state() == OperationState::Executing
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state() == OperationState::Finished
    }

    /// Register a state observer.
    pub fn observe(&self, observer: impl Fn(OperationState) + 'static) {
        self.core.observe(Box::new(observer));
    }

    pub(crate) fn start(&self) {
        self.core.advance(OperationState::Executing);
    }

    /// Mark the rotation as done. Call from the host's rotation-completion
    /// callback. Finishing twice is ignored.
    pub fn finish(&self) {
        match self.state() {
            OperationState::Finished => {
                warn!(target: "ftui.nav", rotation = self.id(), "rotation finished twice");
                return;
            }
            OperationState::Pending => {
                self.core.advance(OperationState::Executing);
                self.core.advance(OperationState::Finished);
            }
            OperationState::Executing => self.core.advance(OperationState::Finished),
        }
        debug!(target: "ftui.nav", rotation = self.id(), "rotation finished");
    }
}

impl fmt::Debug for RotationOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotationOperation")
            .field("id", &self.core.id)
            .field("state", &self.state())
            .finish()
    }
}

// ============================================================================
// Transition unit
// ============================================================================

/// One animated transition waiting for, or holding, the serial queue slot.
pub struct TransitionOperation {
    core: UnitCore,
    animator: RefCell<Option<Rc<dyn Animator>>>,
    dependencies: RefCell<Vec<Rc<RotationOperation>>>,
}

impl TransitionOperation {
    pub(crate) fn new(animator: Rc<dyn Animator>) -> Self {
        Self {
            core: UnitCore::new(),
            animator: RefCell::new(Some(animator)),
            dependencies: RefCell::new(Vec::new()),
        }
    }

    /// Unique unit id.
    #[inline]
    pub fn id(&self) -> u64 {
        self.core.id
    }

    #[inline]
    pub fn state(&self) -> OperationState {
        self.core.state.get()
    }

    #[inline]
    pub fn is_executing(&self) -> bool {
        self.state() == OperationState::Executing
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state() == OperationState::Finished
    }

    /// Whether every dependency has finished.
    pub fn is_ready(&self) -> bool {
        self.dependencies.borrow().iter().all(|d| d.is_finished())
    }

    /// Number of declared dependencies, finished or not.
    pub fn dependency_count(&self) -> usize {
        self.dependencies.borrow().len()
    }

    /// Block this unit until `rotation` finishes. Ignored once started.
    pub fn add_dependency(&self, rotation: Rc<RotationOperation>) {
        if self.state() != OperationState::Pending {
            return;
        }
        let mut deps = self.dependencies.borrow_mut();
        if !deps.iter().any(|d| Rc::ptr_eq(d, &rotation)) {
            deps.push(rotation);
        }
    }

    /// Register a state observer.
    pub fn observe(&self, observer: impl Fn(OperationState) + 'static) {
        self.core.observe(Box::new(observer));
    }

    /// Enter `Executing` and hand control to the animator.
    pub(crate) fn start(&self) {
        self.core.advance(OperationState::Executing);
        debug!(target: "ftui.nav", operation = self.id(), "transition unit started");
        // Clone out so a synchronous completion can release the animator.
        let animator = self.animator.borrow().clone();
        if let Some(animator) = animator {
            animator.animate();
        }
    }

    /// Enter `Finished` and drop the animator.
    pub(crate) fn finish(&self) {
        self.core.advance(OperationState::Finished);
        self.animator.borrow_mut().take();
        self.dependencies.borrow_mut().clear();
        debug!(target: "ftui.nav", operation = self.id(), "transition unit finished");
    }
}

impl fmt::Debug for TransitionOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionOperation")
            .field("id", &self.core.id)
            .field("state", &self.state())
            .field("dependencies", &self.dependency_count())
            .finish()
    }
}

// ============================================================================
// Queues
// ============================================================================

struct TransitionQueueInner {
    max_concurrent: usize,
    pending: RefCell<VecDeque<Rc<TransitionOperation>>>,
    executing: RefCell<Vec<Rc<TransitionOperation>>>,
    pumping: Cell<bool>,
}

/// Dependency-aware FIFO of transition units with a concurrency limit.
#[derive(Clone)]
pub(crate) struct TransitionQueue {
    inner: Rc<TransitionQueueInner>,
}

impl TransitionQueue {
    /// A queue that runs one unit at a time.
    pub(crate) fn serial() -> Self {
        Self {
            inner: Rc::new(TransitionQueueInner {
                max_concurrent: 1,
                pending: RefCell::new(VecDeque::new()),
                executing: RefCell::new(Vec::new()),
                pumping: Cell::new(false),
            }),
        }
    }

    /// Submit a unit and start it if a slot is free.
    pub(crate) fn enqueue(&self, operation: Rc<TransitionOperation>) {
        let weak_queue = Rc::downgrade(&self.inner);
        let weak_op = Rc::downgrade(&operation);
        operation.observe(move |state| {
            if state != OperationState::Finished {
                return;
            }
            if let Some(inner) = weak_queue.upgrade() {
                let queue = Self { inner };
                if let Some(op) = weak_op.upgrade() {
                    queue.inner.executing.borrow_mut().retain(|e| !Rc::ptr_eq(e, &op));
                }
                queue.pump();
            }
        });
        debug!(
            target: "ftui.nav",
            operation = operation.id(),
            dependencies = operation.dependency_count(),
            "transition unit enqueued"
        );
        self.inner.pending.borrow_mut().push_back(operation);
        self.pump();
    }

    /// Re-check the queue after `rotation` finishes.
    pub(crate) fn pump_after(&self, rotation: &RotationOperation) {
        let weak_queue: Weak<TransitionQueueInner> = Rc::downgrade(&self.inner);
        rotation.observe(move |state| {
            if state == OperationState::Finished
                && let Some(inner) = weak_queue.upgrade()
            {
                Self { inner }.pump();
            }
        });
    }

    /// Start ready units while slots are free.
    pub(crate) fn pump(&self) {
        // Re-entrant calls (a unit finishing inside `start`) fall through to
        // the outer loop.
        if self.inner.pumping.replace(true) {
            return;
        }
        loop {
            if self.inner.executing.borrow().len() >= self.inner.max_concurrent {
                break;
            }
            let next = {
                let mut pending = self.inner.pending.borrow_mut();
                pending
                    .iter()
                    .position(|op| op.is_ready())
                    .and_then(|i| pending.remove(i))
            };
            let Some(operation) = next else {
                break;
            };
            self.inner.executing.borrow_mut().push(Rc::clone(&operation));
            operation.start();
        }
        self.inner.pumping.set(false);
    }

    /// Units not yet started, in submission order.
    pub(crate) fn pending_operations(&self) -> Vec<Rc<TransitionOperation>> {
        self.inner.pending.borrow().iter().cloned().collect()
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.inner.pending.borrow().len()
    }

    pub(crate) fn has_executing(&self) -> bool {
        self.inner
            .executing
            .borrow()
            .iter()
            .any(|op| op.is_executing())
    }

    pub(crate) fn executing_len(&self) -> usize {
        self.inner.executing.borrow().len()
    }
}

impl fmt::Debug for TransitionQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionQueue")
            .field("max_concurrent", &self.inner.max_concurrent)
            .field("pending", &self.pending_len())
            .field("executing", &self.executing_len())
            .finish()
    }
}

/// Unbounded queue of rotation units; each starts as soon as it is added.
#[derive(Clone, Default)]
pub(crate) struct RotationQueue {
    operations: Rc<RefCell<Vec<Rc<RotationOperation>>>>,
}

impl RotationQueue {
    pub(crate) fn add(&self, rotation: Rc<RotationOperation>) {
        let weak_ops = Rc::downgrade(&self.operations);
        let weak_rotation = Rc::downgrade(&rotation);
        rotation.observe(move |state| {
            if state != OperationState::Finished {
                return;
            }
            if let (Some(ops), Some(rot)) = (weak_ops.upgrade(), weak_rotation.upgrade()) {
                ops.borrow_mut().retain(|r| !Rc::ptr_eq(r, &rot));
            }
        });
        self.operations.borrow_mut().push(Rc::clone(&rotation));
        rotation.start();
    }

    /// Rotations that have not finished.
    pub(crate) fn outstanding(&self) -> Vec<Rc<RotationOperation>> {
        self.operations
            .borrow()
            .iter()
            .filter(|r| !r.is_finished())
            .cloned()
            .collect()
    }
}

impl fmt::Debug for RotationQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotationQueue")
            .field("outstanding", &self.outstanding().len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
