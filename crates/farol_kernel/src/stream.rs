//! Lazy, pull-based solution streams.
//!
//! A [`Stream`] produces solutions one at a time: pulling with
//! [`Stream::next`] either yields a value and the rest of the stream, ends
//! ([`Step::Done`]), or aborts with an evaluator error ([`Step::Fail`]).
//! Streams may be infinite; consumers bound them by ceasing to pull.
//!
//! The combinators mirror the evaluator's primitives:
//!
//! - [`Stream::append`] — every solution of `self`, then every solution of
//!   the (lazily constructed) second stream: the `alt` ordering.
//! - [`Stream::and_then`] — for each solution, every solution of a derived
//!   stream: the `seq` ordering.
//! - [`Stream::finally`] — runs an undo action when the stream is
//!   exhausted, fails, or is dropped unconsumed. This is how store
//!   instantiations and environment rebindings are guaranteed to unwind on
//!   *every* exit path, including abandonment.
//!
//! Side effects must happen at pull time, never at construction time;
//! [`Stream::defer`] wraps effectful construction.
//!
//! Nested undo actions run innermost-first on abandonment: the guard node
//! drops its inner stream (running the inner guards) before firing its own.

use crate::error::EvalError;
use crate::value::Value;

/// One pull from a stream.
pub enum Step<T = Value> {
    /// No more solutions.
    Done,
    /// The stream aborted with an evaluator error.
    Fail(EvalError),
    /// A solution, and the stream of remaining solutions.
    Yield(T, Stream<T>),
}

/// A lazy stream of solutions.
pub struct Stream<T = Value>(Box<dyn StreamNode<T>>);

/// A single stream state; pulled at most once.
pub(crate) trait StreamNode<T> {
    fn step(self: Box<Self>) -> Step<T>;
}

struct FnNode<F>(F);

impl<T, F: FnOnce() -> Step<T>> StreamNode<T> for FnNode<F> {
    fn step(self: Box<Self>) -> Step<T> {
        (self.0)()
    }
}

impl<T: 'static> Stream<T> {
    pub fn new(f: impl FnOnce() -> Step<T> + 'static) -> Self {
        Stream(Box::new(FnNode(f)))
    }

    pub(crate) fn from_node(node: impl StreamNode<T> + 'static) -> Self {
        Stream(Box::new(node))
    }

    /// Pulls the next solution, consuming this stream state.
    pub fn next(self) -> Step<T> {
        self.0.step()
    }

    pub fn empty() -> Self {
        Stream::new(|| Step::Done)
    }

    pub fn fail(error: EvalError) -> Self {
        Stream::new(move || Step::Fail(error))
    }

    pub fn one(value: T) -> Self {
        Stream::new(move || Step::Yield(value, Stream::empty()))
    }

    /// Defers effectful stream construction until pull time.
    pub fn defer(f: impl FnOnce() -> Stream<T> + 'static) -> Self {
        Stream::new(move || f().next())
    }

    /// Every solution of `self`, then every solution of `rest()`. The
    /// second stream is not constructed until the first is exhausted.
    pub fn append(self, rest: impl FnOnce() -> Stream<T> + 'static) -> Stream<T> {
        Stream::new(move || match self.next() {
            Step::Done => rest().next(),
            Step::Fail(error) => Step::Fail(error),
            Step::Yield(value, tail) => Step::Yield(value, tail.append(rest)),
        })
    }

    /// For each solution `v` of `self`, every solution of `f(v)`, in
    /// depth-first order.
    pub fn and_then<U: 'static>(
        self,
        f: impl Fn(T) -> Stream<U> + Clone + 'static,
    ) -> Stream<U> {
        Stream::new(move || match self.next() {
            Step::Done => Step::Done,
            Step::Fail(error) => Step::Fail(error),
            Step::Yield(value, tail) => {
                let f_rest = f.clone();
                f(value)
                    .append(move || tail.and_then(f_rest))
                    .next()
            }
        })
    }

    /// Runs `undo` exactly once when the stream completes, fails, or is
    /// dropped before completion.
    pub fn finally(self, undo: impl FnOnce() + 'static) -> Stream<T> {
        Stream::from_node(FinallyNode {
            inner: Some(self),
            guard: Some(Box::new(undo)),
        })
    }

    /// Pulls up to `limit` solutions. Dropping the remainder exercises the
    /// abandonment path of any pending undo actions.
    pub fn collect(self, limit: usize) -> (Vec<T>, Option<EvalError>) {
        let mut out = Vec::new();
        let mut stream = self;
        while out.len() < limit {
            match stream.next() {
                Step::Done => return (out, None),
                Step::Fail(error) => return (out, Some(error)),
                Step::Yield(value, rest) => {
                    out.push(value);
                    stream = rest;
                }
            }
        }
        (out, None)
    }
}

/// Runs an undo action on every exit path. The inner stream is dropped
/// before the guard fires, so nested guards unwind innermost-first.
struct FinallyNode<T> {
    inner: Option<Stream<T>>,
    guard: Option<Box<dyn FnOnce()>>,
}

impl<T> FinallyNode<T> {
    fn fire(&mut self) {
        if let Some(guard) = self.guard.take() {
            guard();
        }
    }
}

impl<T: 'static> StreamNode<T> for FinallyNode<T> {
    fn step(mut self: Box<Self>) -> Step<T> {
        let Some(inner) = self.inner.take() else {
            self.fire();
            return Step::Done;
        };
        match inner.next() {
            Step::Done => {
                self.fire();
                Step::Done
            }
            Step::Fail(error) => {
                self.fire();
                Step::Fail(error)
            }
            Step::Yield(value, tail) => {
                self.inner = Some(tail);
                Step::Yield(value, Stream(self))
            }
        }
    }
}

impl<T> Drop for FinallyNode<T> {
    fn drop(&mut self) {
        // drop the inner stream first so nested undos run before this one
        self.inner.take();
        self.fire();
    }
}
