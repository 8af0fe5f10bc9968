//! The frame tree: cooperative task nodes with propagate-on-resume.
//!
//! A frame owns a suspendable computation and an ordered list of child
//! frames. Computations are explicit re-entrant state machines: one
//! [`Routine::step`] call is the segment of work between two suspension
//! points, so "suspend" is expressed by returning [`Step::Yield`] and
//! finishing by returning [`Step::Done`].
//!
//! Resuming a frame drives its own routine one segment and then resumes
//! every alive child, in creation order, recursively. Dead frames stay in
//! their parent's child list so their alive children remain reachable.

use std::error::Error;
use std::fmt;

/// Failure raised by a storyboard or by any frame's routine.
///
/// Never caught inside the tree: it propagates out of the enclosing resume
/// and aborts the run.
pub type StoryboardError = Box<dyn Error + Send + Sync + 'static>;

/// Outcome of one routine step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Suspend here; the next resume re-enters the routine.
    Yield,
    /// The routine is finished; the frame becomes dead.
    Done,
}

/// Lifecycle state of a frame.
///
/// `Dead` is terminal. A dead frame is retained in its parent's child list,
/// but its routine is never re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Allocated, not yet resumed.
    Created,
    /// Parked at a yield point.
    Suspended,
    /// Routine currently executing.
    Running,
    /// Routine returned.
    Dead,
}

/// One cooperatively scheduled computation.
///
/// Implemented by any closure of the right shape; see [`routine`] for
/// wrapping one with full type inference.
pub trait Routine {
    /// Runs one segment of the computation.
    ///
    /// New frames spawned through `scope` become children of this frame and
    /// take their first step in the same resume pass.
    ///
    /// # Errors
    ///
    /// A returned error aborts the whole run.
    fn step(&mut self, scope: &mut Scope) -> Result<Step, StoryboardError>;
}

impl<F> Routine for F
where
    F: FnMut(&mut Scope) -> Result<Step, StoryboardError>,
{
    fn step(&mut self, scope: &mut Scope) -> Result<Step, StoryboardError> {
        self(scope)
    }
}

/// Wraps a closure as a [`Routine`].
pub fn routine(
    f: impl FnMut(&mut Scope) -> Result<Step, StoryboardError> + 'static,
) -> impl Routine + 'static {
    f
}

/// Spawning surface handed to a routine while it runs.
///
/// Frames spawned here become children of the currently executing frame
/// (or top-level frames, for the storyboard itself), in call order.
pub struct Scope {
    spawned: Vec<Frame>,
}

impl Scope {
    pub(crate) fn new() -> Self {
        Self {
            spawned: Vec::new(),
        }
    }

    /// Registers `routine` as the last child of the running frame.
    pub fn spawn(&mut self, routine: impl Routine + 'static) {
        self.spawned.push(Frame::new(routine));
    }

    pub(crate) fn into_frames(self) -> Vec<Frame> {
        self.spawned
    }
}

/// A cooperative task node.
pub struct Frame {
    routine: Box<dyn Routine>,
    state: FrameState,
    children: Vec<Frame>,
}

impl Frame {
    /// Allocates a frame around `routine`. Nothing runs until the first
    /// resume.
    #[must_use]
    pub fn new(routine: impl Routine + 'static) -> Self {
        Self {
            routine: Box::new(routine),
            state: FrameState::Created,
            children: Vec::new(),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// False once the routine has returned.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.state != FrameState::Dead
    }

    /// Direct children, in creation order. Dead children are retained.
    #[must_use]
    pub fn children(&self) -> &[Frame] {
        &self.children
    }

    /// Pre-order traversal of the subtree below this frame.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }

    /// True while this frame or anything below it still has work to do.
    #[must_use]
    pub fn has_live_work(&self) -> bool {
        self.is_alive() || self.descendants().any(Frame::is_alive)
    }

    /// Drives this frame one step, then resumes every alive child in
    /// creation order, each child applying the same rule to its own
    /// subtree.
    ///
    /// A dead frame's routine is not re-entered, but its alive children
    /// still advance. Children spawned during this very call are already in
    /// the list and take their first step in the same pass. Resuming a dead
    /// frame with no alive children is a no-op.
    ///
    /// # Errors
    ///
    /// The first routine failure propagates immediately; frames later in
    /// the pass are left untouched, and the failed frame is dead.
    pub fn resume(&mut self) -> Result<(), StoryboardError> {
        if self.state != FrameState::Dead {
            self.state = FrameState::Running;
            let mut scope = Scope::new();
            let step = self.routine.step(&mut scope);
            self.children.append(&mut scope.spawned);
            match step {
                Ok(Step::Yield) => self.state = FrameState::Suspended,
                Ok(Step::Done) => self.state = FrameState::Dead,
                Err(err) => {
                    self.state = FrameState::Dead;
                    return Err(err);
                }
            }
        }
        for child in &mut self.children {
            if child.is_alive() {
                child.resume()?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("state", &self.state)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

/// Pre-order iterator over a frame's subtree; see [`Frame::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a Frame>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Frame;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.stack.pop()?;
        self.stack.extend(frame.children.iter().rev());
        Some(frame)
    }
}
