//! The propagator adapter: one object per problem, routing the host's
//! callbacks to one XOR-simplex [`Solver`] per host thread.
//!
//! The adapter owns the normalized constraint list and the mapping from
//! element literals to theory variables, both of which accumulate across
//! solving steps of a multi-shot run. Top-level facts observed on thread 0
//! are kept in a replay buffer so that solver instances rebuilt by a later
//! [`Propagator::init`] can catch up inside [`Propagator::check`].

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::{
	actions::{InitializationActions, InspectionActions, PropagationActions},
	parsing::{evaluate_theory, TheoryAtom},
	problem::{VarRef, XorConstraint},
	solver::{Solver, Statistics},
	Lit, Value,
};

#[derive(Debug, Error, PartialEq, Eq)]
/// Errors raised while validating propagator options.
pub enum ConfigError {
	/// The value of a known option does not name a Boolean.
	#[error("invalid Boolean value `{value}` for option `{key}`")]
	InvalidValue {
		/// The option that was being set.
		key: String,
		/// The rejected value.
		value: String,
	},
	/// The option key is not known to the propagator.
	#[error("unknown option `{0}`")]
	UnknownOption(String),
}

#[derive(Debug, Default)]
/// A parity-constraint propagator for a CDCL host solver.
///
/// The host forwards its `init`, `propagate`, `check`, and `undo` callbacks
/// to the methods of the same name, handing in an implementation of the
/// [`actions`](crate::actions) traits. Callbacks of different threads touch
/// disjoint solver state; only the top-level fact buffer is shared, and it
/// is written exclusively from thread 0.
pub struct Propagator {
	/// Mapping from element literals to their theory variables.
	aux_map: HashMap<Lit, VarRef>,
	/// The active configuration.
	config: PropagatorConfig,
	/// The normalized constraints of all solving steps so far.
	constraints: Vec<XorConstraint>,
	/// Top-level facts observed on thread 0, replayed into solvers that
	/// joined after the facts were propagated.
	facts: Vec<Lit>,
	/// Per-thread replay offsets into `facts`, paired with the thread's
	/// solver.
	threads: Vec<(usize, Solver)>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Configuration accepted by [`Propagator::set_option`].
pub struct PropagatorConfig {
	/// Whether unit-resulting rows propagate their implied literal back to
	/// the host. Enabled by default.
	pub propagate: bool,
}

/// Parse a Boolean option value.
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
	match value {
		"yes" | "true" | "1" => Ok(true),
		"no" | "false" | "0" => Ok(false),
		_ => Err(ConfigError::InvalidValue {
			key: key.to_owned(),
			value: value.to_owned(),
		}),
	}
}

impl Default for PropagatorConfig {
	fn default() -> Self {
		PropagatorConfig { propagate: true }
	}
}

impl Propagator {
	/// Construct a propagator with the given configuration.
	pub fn new(config: PropagatorConfig) -> Propagator {
		Propagator {
			config,
			..Propagator::default()
		}
	}

	/// Accumulate the statistics of all threads.
	pub fn accumulated_statistics(&self) -> Statistics {
		let mut accu = Statistics::default();
		for (_, slv) in &self.threads {
			accu.accumulate(slv.statistics());
		}
		accu
	}

	/// Replay top-level facts this thread has not seen yet.
	///
	/// Invoked by the host at decision points. A solver that was rebuilt
	/// after facts had already been propagated on thread 0 catches up here;
	/// on all other calls this is a no-op. Returns `false` iff the host
	/// rejected a clause.
	pub fn check(&mut self, ctl: &mut impl PropagationActions) -> bool {
		let (offset, slv) = &mut self.threads[ctl.thread_id()];
		if ctl.decision_level() == 0 && *offset < self.facts.len() {
			if !slv.solve(ctl, &self.facts[*offset..]) {
				if slv.reason().is_empty() || !ctl.add_clause(slv.reason()) {
					return false;
				}
			}
			*offset = self.facts.len();
		}
		true
	}

	/// The active configuration.
	pub fn config(&self) -> &PropagatorConfig {
		&self.config
	}

	/// Whether variable `var` carries a value on `thread`.
	pub fn has_value(&self, thread: usize, var: VarRef) -> bool {
		thread < self.threads.len() && usize::from(var) < self.aux_map.len()
	}

	/// Normalize the atoms of the current solving step and build one
	/// prepared solver per host thread.
	///
	/// Atoms of earlier steps stay in force; their constraints are part of
	/// every rebuilt solver. Returns `false` if the initial constraint state
	/// is unsatisfiable at the top level and the host rejected the reporting
	/// clause.
	pub fn init(&mut self, init: &mut impl InitializationActions, atoms: &[TheoryAtom]) -> bool {
		if !self.facts.is_empty() {
			// rebuilt solvers need a check call to replay the facts
			init.set_partial_check(true);
		}
		if !evaluate_theory(init, &mut self.aux_map, atoms, &mut self.constraints) {
			return false;
		}
		for c in &self.constraints {
			init.add_watch(c.lit);
		}
		debug!(
			constraints = self.constraints.len(),
			variables = self.aux_map.len(),
			threads = init.num_threads(),
			"initialize propagator"
		);

		self.threads.clear();
		for _ in 0..init.num_threads() {
			let mut slv = Solver::new(self.config.propagate);
			let prepared = slv.prepare(init, self.aux_map.len(), &self.constraints);
			self.threads.push((0, slv));
			if !prepared {
				return false;
			}
		}
		true
	}

	/// Look up the theory variable of an element literal.
	pub fn lookup_aux(&self, lit: Lit) -> Option<VarRef> {
		self.aux_map.get(&lit).copied()
	}

	/// The number of theory variables with values.
	pub fn n_values(&self) -> usize {
		self.aux_map.len()
	}

	/// Make the thread's solver consistent with the newly true literals in
	/// `changes`.
	///
	/// On a conflict the assembled conflict clause is handed to the host.
	/// Returns `false` iff the host rejected a clause, telling it to resolve
	/// the conflict before propagating further.
	#[tracing::instrument(level = "debug", skip(self, ctl, changes), fields(thread = ctl.thread_id(), level = ctl.decision_level()))]
	pub fn propagate(&mut self, ctl: &mut impl PropagationActions, changes: &[Lit]) -> bool {
		if ctl.decision_level() == 0 && ctl.thread_id() == 0 {
			self.facts.extend_from_slice(changes);
		}
		let (_, slv) = &mut self.threads[ctl.thread_id()];
		if !slv.solve(ctl, changes) {
			// an empty reason means the host already rejected an emitted
			// propagation clause
			return !slv.reason().is_empty() && ctl.add_clause(slv.reason());
		}
		true
	}

	/// Set a configuration option from the host's option registry.
	///
	/// The only key is `propagate` (Boolean, default `yes`), toggling row
	/// propagation. Takes effect for solvers built by the next
	/// [`Self::init`].
	pub fn set_option(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
		match key {
			"propagate" => {
				self.config.propagate = parse_bool(key, value)?;
				Ok(())
			}
			_ => Err(ConfigError::UnknownOption(key.to_owned())),
		}
	}

	/// The statistics of the solver running on `thread`.
	pub fn statistics(&self, thread: usize) -> &Statistics {
		self.threads[thread].1.statistics()
	}

	/// Undo the assignments of the decision level the host is leaving.
	pub fn undo(&mut self, ctl: &impl PropagationActions, _changes: &[Lit]) {
		self.threads[ctl.thread_id()].1.undo();
	}

	/// The value of variable `var` on `thread`.
	pub fn value(&self, thread: usize, var: VarRef) -> Value {
		self.threads[thread].1.value(var)
	}
}

#[cfg(test)]
mod test {
	use crate::propagator::{ConfigError, Propagator, PropagatorConfig};

	#[test]
	fn option_validation() {
		let mut prp = Propagator::default();
		assert!(prp.config().propagate);
		prp.set_option("propagate", "no").unwrap();
		assert!(!prp.config().propagate);
		prp.set_option("propagate", "yes").unwrap();
		assert!(prp.config().propagate);
		assert_eq!(
			prp.set_option("propagate", "maybe"),
			Err(ConfigError::InvalidValue {
				key: "propagate".to_owned(),
				value: "maybe".to_owned(),
			})
		);
		assert_eq!(
			prp.set_option("pivots", "yes"),
			Err(ConfigError::UnknownOption("pivots".to_owned()))
		);
		let prp = Propagator::new(PropagatorConfig { propagate: false });
		assert!(!prp.config().propagate);
	}
}
