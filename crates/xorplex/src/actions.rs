//! Traits that define the sets of actions the host solver offers to the
//! propagator during the different phases of its lifecycle.
//!
//! The host CDCL solver itself is out of scope for this crate; these traits
//! are the complete surface the propagator consumes. A host (or a test
//! harness) implements them on whatever handle it passes into the
//! [`Propagator`](crate::propagator::Propagator) callbacks. Handles are only
//! valid for the duration of a single callback and must not be retained.

use crate::Lit;

/// Actions available while the propagator is being initialized, i.e. inside
/// [`Propagator::init`](crate::propagator::Propagator::init).
pub trait InitializationActions: InspectionActions {
	/// Add a clause to the host at the top level.
	///
	/// Returns `false` if the host rejects the clause, in which case the
	/// problem is unsatisfiable at the top level and initialization must be
	/// aborted.
	fn add_clause(&mut self, clause: &[Lit]) -> bool;

	/// Watch a literal so that the propagator is notified through
	/// [`Propagator::propagate`](crate::propagator::Propagator::propagate)
	/// whenever it becomes true. Watching the same literal twice is allowed
	/// and has no further effect.
	fn add_watch(&mut self, lit: Lit);

	/// Introduce a fresh solver literal that does not occur anywhere else.
	fn new_lit(&mut self) -> Lit;

	/// The number of solver threads the host will run. One solver instance
	/// is created per thread.
	fn num_threads(&self) -> usize;

	/// Request that the host invokes
	/// [`Propagator::check`](crate::propagator::Propagator::check) on partial
	/// assignments as well as total ones. Used to replay top-level facts
	/// from earlier solve steps into freshly created solver instances.
	fn set_partial_check(&mut self, enable: bool);
}

/// Actions to inspect the host's current Boolean assignment. Available in
/// every phase.
pub trait InspectionActions {
	/// The host's current decision level; level `0` holds the facts.
	fn decision_level(&self) -> u32;

	/// Whether `lit` is false under the current assignment.
	fn is_false(&self, lit: Lit) -> bool {
		self.value(lit) == Some(false)
	}

	/// Whether `lit` is true under the current assignment.
	fn is_true(&self, lit: Lit) -> bool {
		self.value(lit) == Some(true)
	}

	/// The truth value the host currently assigns to `lit`, or `None` if the
	/// literal is unassigned.
	fn value(&self, lit: Lit) -> Option<bool>;
}

/// Actions available during propagation, i.e. inside
/// [`Propagator::propagate`](crate::propagator::Propagator::propagate) and
/// [`Propagator::check`](crate::propagator::Propagator::check).
pub trait PropagationActions: InspectionActions {
	/// Hand a clause to the host.
	///
	/// Emitted clauses are unit-resulting or conflicting by construction: at
	/// most one literal is not already false. Returns `false` if the host
	/// cannot continue propagating (the clause forces a backjump); the
	/// propagator must then return control to the host immediately.
	fn add_clause(&mut self, clause: &[Lit]) -> bool;

	/// The index of the solver thread this callback runs on.
	fn thread_id(&self) -> usize;
}
