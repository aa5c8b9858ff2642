//! The state monad (§4.1), rendered the idiomatic Rust way: a mutable
//! exclusive borrow plus `?`-propagated `Result` rather than a trait-object
//! monad (see Design Notes). `TlsState` offers the four primitive
//! operations the spec asks for -- read, replace, modify, fail -- and
//! `run` is the single top-level runner.

use crate::error::TLSError;
use crate::session::SessionState;

/// A sequencing context over one connection's session state. Failure
/// short-circuits (plain `?`); success threads the mutated state forward
/// because it's the same exclusive borrow throughout the sequence.
pub struct TlsState<'a> {
    session: &'a mut SessionState,
}

impl<'a> TlsState<'a> {
    pub fn new(session: &'a mut SessionState) -> Self {
        TlsState { session }
    }

    /// Read the whole state.
    pub fn get(&self) -> &SessionState {
        self.session
    }

    /// Replace the whole state.
    pub fn put(&mut self, new: SessionState) {
        *self.session = new;
    }

    /// Modify a field (or several) via a closure over the whole state.
    pub fn modify(&mut self, f: impl FnOnce(&mut SessionState)) {
        f(self.session)
    }

    pub fn modify_mut<T>(&mut self, f: impl FnOnce(&mut SessionState) -> T) -> T {
        f(self.session)
    }

    /// Fail with a typed error. A free function rather than a method on
    /// `self` so call sites read `return state.fail(err)` cleanly at any
    /// point in a sequence.
    pub fn fail<T>(&self, err: TLSError) -> Result<T, TLSError> {
        Err(err)
    }
}

/// The single top-level runner: takes the initial state and a sequenced,
/// failable action over it. On success, returns the action's value (the
/// state itself was mutated in place via the exclusive borrow). On
/// failure, the error propagates and the state *at the point of failure*
/// remains observable to the caller through the same `&mut SessionState`
/// they passed in -- exactly the "error + state-at-failure" contract in
/// §4.1, since there is no separate copy to roll back.
pub fn run<'a, T>(
    session: &'a mut SessionState,
    action: impl FnOnce(&mut TlsState<'a>) -> Result<T, TLSError>,
) -> Result<T, TLSError> {
    let mut st = TlsState::new(session);
    action(&mut st)
}
