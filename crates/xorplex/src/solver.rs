//! The per-thread XOR-simplex solver.
//!
//! Each solver keeps a sparse GF(2) tableau whose rows express one basic
//! variable as the sum of non-basic variables, together with the assignment
//! of every variable and the bounds the host's literals have activated so
//! far. [`Solver::solve`] restores consistency after new literals became
//! true by pivoting conflicting basic variables against flippable columns
//! (Bland's rule, which guarantees termination), and [`Solver::undo`] rolls
//! the state back to the satisfying assignment of the previous decision
//! level.

pub(crate) mod tableau;

use std::{
	cmp::Reverse,
	collections::{BinaryHeap, HashMap},
	time::{Duration, Instant},
};

use index_vec::IndexVec;
use tracing::{debug, trace};

use crate::{
	actions::{InitializationActions, InspectionActions, PropagationActions},
	problem::{VarRef, VarVec, XorConstraint},
	solver::tableau::Tableau,
	Clause, Lit, Value,
};

index_vec::define_index_type! {
	/// Identifies a bound within a solver's bound registry.
	pub struct BoundRef = u32;
}

/// Type alias for the storage of all [`Bound`]s of a solver.
type BoundVec = IndexVec<BoundRef, Bound>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// A required value for a variable, in force whenever `lit` is true in the
/// host.
struct Bound {
	/// The value the variable is required to take.
	value: Value,
	/// The variable being constrained.
	variable: VarRef,
	/// The host literal activating the bound.
	lit: Lit,
}

#[derive(Clone, Debug, Default)]
/// Solving statistics of a single solver instance.
pub struct Statistics {
	/// Number of pivot operations performed.
	pub pivots: u64,
	/// Total time spent inside [`Solver::solve`].
	pub time_total: Duration,
	/// Time spent deriving unit-resulting clauses from rows.
	pub time_propagate: Duration,
	/// Number of `solve` calls that reached a satisfiable state.
	pub sat: u64,
	/// Number of `solve` calls that ended in a conflict.
	pub unsat: u64,
	/// Number of tableau cells right after [`Solver::prepare`].
	pub initial_tableau_size: u64,
	/// Number of basic variables created by [`Solver::prepare`].
	pub n_basic: u64,
	/// Number of non-basic variables handed to [`Solver::prepare`].
	pub n_non_basic: u64,
	/// Number of registered bounds after [`Solver::prepare`].
	pub n_bounds: u64,
	/// Sum of the tableau sizes sampled at the end of each `solve` call.
	tableau_size_sum: u64,
	/// Number of tableau size samples taken.
	tableau_samples: u64,
}

#[derive(Clone, Copy, Debug)]
/// The lengths of both trails at the moment a decision level was entered.
struct TrailOffset {
	/// The host decision level the snapshot belongs to.
	level: u32,
	/// Length of the bound trail at level entry.
	bound: usize,
	/// Length of the assignment trail at level entry.
	assignment: usize,
}

#[derive(Clone, Debug)]
/// Capture of the current state of a variable.
struct Variable {
	/// The currently active bound, if any.
	bound: Option<BoundRef>,
	/// Every bound this variable can ever take, used to name the implied
	/// literal of a unit-resulting row.
	bounds: Vec<BoundRef>,
	/// Slot-to-variable half of the basic/non-basic indirection: the record
	/// at partition slot `k` stores in this field which variable currently
	/// occupies slot `k`.
	index: VarRef,
	/// Variable-to-slot half of the indirection: the partition slot this
	/// variable currently occupies. Slots below the non-basic count are
	/// columns, the remaining ones are rows.
	reverse_index: VarRef,
	/// The decision level the value was last written on.
	level: u32,
	/// The current GF(2) value.
	value: Value,
	/// Whether the variable sits in the conflict queue.
	queued: bool,
	/// Whether the variable's row is scheduled for row propagation. Only
	/// meaningful while the variable is basic.
	in_propagate_set: bool,
}

#[derive(Debug)]
/// A solver for finding an assignment satisfying a set of parity
/// constraints.
pub struct Solver {
	/// Mapping from host literals to the bounds they activate.
	bounds: HashMap<Lit, Vec<BoundRef>>,
	/// The owned storage of all bounds.
	bound_store: BoundVec,
	/// Trail of variables whose bound was installed on the current or a
	/// later level.
	bound_trail: Vec<VarRef>,
	/// Trail of value assignments as `(previous level, variable, previous
	/// value)`, written on the first flip of a variable per level.
	assignment_trail: Vec<(u32, VarRef, Value)>,
	/// Trail prefix lengths per entered decision level.
	trail_offset: Vec<TrailOffset>,
	/// The tableau of row coefficients.
	tableau: Tableau,
	/// The non-basic and basic variables, overlaid with the partition
	/// indirection slots.
	variables: VarVec<Variable>,
	/// Min-queue of possibly conflicting basic variables, driving the
	/// least-index selection of Bland's rule.
	conflicts: BinaryHeap<Reverse<VarRef>>,
	/// The most recently assembled conflict clause.
	conflict_clause: Clause,
	/// Basic variables whose rows await the next row-propagation pass.
	propagate_set: Vec<VarRef>,
	/// Whether row propagation is enabled.
	propagate_enabled: bool,
	/// Solving statistics.
	statistics: Statistics,
	/// The number of non-basic variables.
	n_non_basic: u32,
	/// The number of basic variables.
	n_basic: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// What is known about the satisfiability of the bounds while solving.
enum State {
	/// All bounds are satisfied by the current assignment.
	Satisfiable,
	/// The bounds of some row cannot be satisfied together.
	Unsatisfiable,
	/// Another pivot of the contained row and column is required.
	Unknown(u32, u32),
}

/// Enqueue variable `ii` for conflict processing if its value disagrees with
/// its active bound.
fn enqueue_var(
	variables: &mut VarVec<Variable>,
	bound_store: &BoundVec,
	conflicts: &mut BinaryHeap<Reverse<VarRef>>,
	ii: VarRef,
) {
	let x = &mut variables[ii];
	if !x.queued && x.has_conflict(bound_store) {
		x.queued = true;
		conflicts.push(Reverse(ii));
	}
}

/// Add the row owned by basic variable `ii` to the row-propagation set.
fn schedule_var(variables: &mut VarVec<Variable>, propagate_set: &mut Vec<VarRef>, ii: VarRef) {
	let x = &mut variables[ii];
	if !x.in_propagate_set {
		x.in_propagate_set = true;
		propagate_set.push(ii);
	}
}

impl Statistics {
	/// The mean tableau size over all `solve` calls so far.
	pub fn avg_tableau_size(&self) -> f64 {
		if self.tableau_samples == 0 {
			0.0
		} else {
			self.tableau_size_sum as f64 / self.tableau_samples as f64
		}
	}

	/// Add the counters of `other` into `self`. Durations add up, the
	/// tableau average merges its underlying samples.
	pub fn accumulate(&mut self, other: &Statistics) {
		self.pivots += other.pivots;
		self.time_total += other.time_total;
		self.time_propagate += other.time_propagate;
		self.sat += other.sat;
		self.unsat += other.unsat;
		self.initial_tableau_size += other.initial_tableau_size;
		self.n_basic += other.n_basic;
		self.n_non_basic += other.n_non_basic;
		self.n_bounds += other.n_bounds;
		self.tableau_size_sum += other.tableau_size_sum;
		self.tableau_samples += other.tableau_samples;
	}

	/// Reset all counters to zero.
	pub fn reset(&mut self) {
		*self = Statistics::default();
	}
}

impl Variable {
	/// Create a fresh unassigned variable occupying partition slot `slot`.
	fn new(slot: VarRef) -> Variable {
		Variable {
			bound: None,
			bounds: Vec::new(),
			index: slot,
			reverse_index: slot,
			level: 0,
			value: Value::default(),
			queued: false,
			in_propagate_set: false,
		}
	}

	/// Flip the value of the variable, once per level recording the previous
	/// value on the assignment trail.
	///
	/// The assignment at the end of each previous level was satisfying, so
	/// storing the first overwritten value per level is enough to restore it
	/// on backtracking.
	fn flip_value(&mut self, trail: &mut Vec<(u32, VarRef, Value)>, this: VarRef, level: u32) {
		if self.level != level {
			trail.push((self.level, this, self.value));
			self.level = level;
		}
		self.value.flip();
	}

	/// Whether the value of the variable disagrees with its active bound.
	fn has_conflict(&self, bound_store: &BoundVec) -> bool {
		self.bound
			.is_some_and(|b| bound_store[b].value != self.value)
	}
}

impl Solver {
	/// Construct an empty solver. With `propagate` disabled the solver only
	/// detects conflicts and never derives unit-resulting clauses.
	pub fn new(propagate: bool) -> Solver {
		Solver {
			bounds: HashMap::new(),
			bound_store: IndexVec::new(),
			bound_trail: Vec::new(),
			assignment_trail: Vec::new(),
			trail_offset: Vec::new(),
			tableau: Tableau::default(),
			variables: IndexVec::new(),
			conflicts: BinaryHeap::new(),
			conflict_clause: Vec::new(),
			propagate_set: Vec::new(),
			propagate_enabled: propagate,
			statistics: Statistics::default(),
			n_non_basic: 0,
			n_basic: 0,
		}
	}

	/// The physical variable currently basic in row `i`.
	fn basic(&self, i: u32) -> VarRef {
		debug_assert!(i < self.n_basic);
		self.variables[VarRef::new(self.n_non_basic as usize + i as usize)].index
	}

	/// Cross-check that every conflicting basic variable is queued.
	fn check_basic(&self) -> bool {
		(0..self.n_basic).all(|i| {
			let x = &self.variables[self.basic(i)];
			!x.has_conflict(&self.bound_store) || x.queued
		})
	}

	/// Cross-check that the partition indirection is a bijection.
	fn check_index(&self) -> bool {
		(0..self.variables.len()).all(|k| {
			let k = VarRef::new(k);
			self.variables[self.variables[k].index].reverse_index == k
		})
	}

	/// Cross-check that no non-basic variable disagrees with its bound.
	fn check_non_basic(&self) -> bool {
		(0..self.n_non_basic).all(|j| !self.variables[self.non_basic(j)].has_conflict(&self.bound_store))
	}

	/// Cross-check that every basic row's value equals the sum of the values
	/// of its columns.
	fn check_tableau(&self) -> bool {
		(0..self.n_basic).all(|i| {
			let mut v = Value::default();
			self.tableau.update_row(i, |j| {
				v ^= self.variables[self.non_basic(j)].value;
				true
			});
			v == self.variables[self.basic(i)].value
		})
	}

	/// Enqueue the basic variable of row `i` if it conflicts with its bound.
	fn enqueue(&mut self, i: u32) {
		let ii = self.basic(i);
		enqueue_var(&mut self.variables, &self.bound_store, &mut self.conflicts, ii);
	}

	/// The physical variable currently non-basic in column `j`.
	fn non_basic(&self, j: u32) -> VarRef {
		debug_assert!(j < self.n_non_basic);
		self.variables[VarRef::new(j as usize)].index
	}

	/// Pivot basic row `i` with non-basic column `j`, restoring the bound of
	/// the basic variable by flipping the column.
	fn pivot(&mut self, level: u32, i: u32, j: u32) {
		debug_assert!(self.tableau.contains(i, j));
		let bslot = VarRef::new(self.n_non_basic as usize + i as usize);
		let jslot = VarRef::new(j as usize);
		let ii = self.variables[bslot].index;
		let jj = self.variables[jslot].index;

		// adjust the assignment: the basic variable flips to meet its bound,
		// the entering column flips to keep row `i` balanced
		self.variables[ii].flip_value(&mut self.assignment_trail, ii, level);
		self.variables[jj].flip_value(&mut self.assignment_trail, jj, level);
		{
			let Solver {
				tableau,
				variables,
				bound_store,
				conflicts,
				propagate_set,
				assignment_trail,
				propagate_enabled,
				n_non_basic,
				..
			} = self;
			tableau.update_col(j, |k| {
				if k != i {
					let kk = variables[VarRef::new(*n_non_basic as usize + k as usize)].index;
					variables[kk].flip_value(assignment_trail, kk, level);
					enqueue_var(variables, bound_store, conflicts, kk);
					if *propagate_enabled {
						schedule_var(variables, propagate_set, kk);
					}
				}
			});
		}

		// swap the partition indirection: `jj` becomes basic in row `i`,
		// `ii` non-basic in column `j`
		let slot = self.variables[ii].reverse_index;
		self.variables[ii].reverse_index = self.variables[jj].reverse_index;
		self.variables[jj].reverse_index = slot;
		let var = self.variables[bslot].index;
		self.variables[bslot].index = self.variables[jslot].index;
		self.variables[jslot].index = var;

		self.tableau.eliminate(i, j);
		self.enqueue(i);
		if self.propagate_enabled {
			self.touch_row(i);
		}
		self.statistics.pivots += 1;

		debug_assert!(self.check_index());
		debug_assert!(self.check_tableau());
		debug_assert!(self.check_non_basic());
	}

	/// Prepare the normalized constraints for solving.
	///
	/// `n_vars` is the number of problem variables the normalizer created;
	/// every index on a constraint's left-hand side lies below it. Trivially
	/// inconsistent rows (`0 = 1`) are reported to the host as the unit
	/// clause forbidding their gate literal; `false` is returned if the host
	/// rejects one, making the problem unsatisfiable at the top level.
	pub fn prepare(
		&mut self,
		init: &mut impl InitializationActions,
		n_vars: usize,
		constraints: &[XorConstraint],
	) -> bool {
		self.tableau.clear();
		self.variables = (0..n_vars).map(|i| Variable::new(VarRef::new(i))).collect();
		self.n_non_basic = n_vars as u32;
		self.n_basic = 0;

		for c in constraints {
			if init.is_false(c.lit) {
				continue;
			}
			if c.lhs.is_empty() {
				// the row collapses to `0 = rhs`
				if c.rhs.bit() && !init.add_clause(&[!c.lit]) {
					return false;
				}
			} else if let [j] = c.lhs[..] {
				let bound = self.bound_store.push(Bound {
					value: c.rhs,
					variable: j,
					lit: c.lit,
				});
				self.bounds.entry(c.lit).or_default().push(bound);
				self.variables[j].bounds.push(bound);
			} else {
				let i = self.n_basic;
				let slot = self.variables.next_idx();
				let var = self.variables.push(Variable::new(slot));
				let bound = self.bound_store.push(Bound {
					value: c.rhs,
					variable: var,
					lit: c.lit,
				});
				self.bounds.entry(c.lit).or_default().push(bound);
				self.variables[var].bounds.push(bound);
				for &j in &c.lhs {
					self.tableau.set(i, usize::from(j) as u32, true);
				}
				self.n_basic += 1;
			}
		}

		for i in 0..self.n_basic {
			self.enqueue(i);
		}

		self.statistics.initial_tableau_size = self.tableau.size() as u64;
		self.statistics.n_basic = u64::from(self.n_basic);
		self.statistics.n_non_basic = u64::from(self.n_non_basic);
		self.statistics.n_bounds = self.bound_store.len() as u64;

		debug_assert!(self.check_index());
		debug_assert!(self.check_tableau());
		debug_assert!(self.check_basic());
		debug_assert!(self.check_non_basic());

		true
	}

	/// Derive unit-resulting clauses from the rows touched since the last
	/// call and hand them to the host.
	fn propagate_rows(&mut self, ctl: &mut impl PropagationActions) -> bool {
		if !self.propagate_enabled {
			return true;
		}
		let start = Instant::now();
		let ret = self.propagate_rows_inner(ctl);
		self.statistics.time_propagate += start.elapsed();
		ret
	}

	/// The timed part of [`Self::propagate_rows`].
	fn propagate_rows_inner(&mut self, ctl: &mut impl PropagationActions) -> bool {
		let mut clause = Vec::new();
		for idx in 0..self.propagate_set.len() {
			let ii = self.propagate_set[idx];
			let slot = self.variables[ii].reverse_index;
			// rows whose basic variable was pivoted away have been rewritten
			// and rescheduled under their new owner
			if usize::from(slot) < self.n_non_basic as usize {
				continue;
			}
			let i = (usize::from(slot) - self.n_non_basic as usize) as u32;

			// collect the bound literals of the row members; a row implies a
			// value only when exactly one member is still free
			clause.clear();
			let mut free = None;
			let mut unit = true;
			match self.variables[ii].bound {
				Some(b) => clause.push(!self.bound_store[b].lit),
				None => free = Some(ii),
			}
			let Solver {
				tableau,
				variables,
				bound_store,
				..
			} = self;
			tableau.update_row(i, |j| {
				let jj = variables[VarRef::new(j as usize)].index;
				match variables[jj].bound {
					Some(b) => {
						clause.push(!bound_store[b].lit);
						true
					}
					None if free.is_none() => {
						free = Some(jj);
						true
					}
					None => {
						unit = false;
						false
					}
				}
			});
			if !unit {
				continue;
			}
			let Some(f) = free else {
				// all members bound: the row is satisfied in this state
				continue;
			};

			// the satisfiable assignment pins the free variable to its
			// current value, naming the literal whose truth keeps the row
			// consistent
			let required = variables[f].value;
			let mut emitted = None;
			for &b in &variables[f].bounds {
				let bound = &bound_store[b];
				let lit = if bound.value == required {
					bound.lit
				} else {
					!bound.lit
				};
				if ctl.is_true(lit) {
					// the row already holds under the host assignment
					break;
				}
				if emitted == Some(lit) {
					continue;
				}
				clause.push(lit);
				trace!(
					clause = ?clause.iter().map(|&l| i32::from(l)).collect::<Vec<i32>>(),
					"propagate row"
				);
				let accepted = ctl.add_clause(&clause);
				let _ = clause.pop();
				if !accepted {
					self.conflict_clause.clear();
					return false;
				}
				emitted = Some(lit);
			}
		}
		true
	}

	/// The conflict clause assembled by the last failing [`Self::solve`]
	/// call. Empty if the failure was a rejected propagation clause the host
	/// already knows about.
	pub fn reason(&self) -> &[Lit] {
		&self.conflict_clause
	}

	/// Select a pivot using Bland's rule.
	///
	/// Pops the smallest-index conflicting basic variable and pairs it with
	/// the smallest-index flippable column of its row. A column is flippable
	/// if it has no active bound or already disagrees with it, so a flip
	/// never breaks a satisfied bound. If no column qualifies, the bounds of
	/// the whole row are contradictory and their negated literals form the
	/// conflict clause.
	fn select(&mut self) -> State {
		while let Some(Reverse(ii)) = self.conflicts.pop() {
			self.variables[ii].queued = false;
			let slot = self.variables[ii].reverse_index;
			debug_assert_eq!(self.variables[slot].index, ii);
			// the queue may still hold variables that became non-basic
			if usize::from(slot) < self.n_non_basic as usize {
				continue;
			}
			let i = (usize::from(slot) - self.n_non_basic as usize) as u32;
			let Some(active) = self.variables[ii].bound else {
				continue;
			};
			// the conflict may have been resolved by a previous pivot
			if self.bound_store[active].value == self.variables[ii].value {
				continue;
			}

			self.conflict_clause.clear();
			self.conflict_clause.push(!self.bound_store[active].lit);
			let mut best: Option<(VarRef, u32)> = None;
			let Solver {
				tableau,
				variables,
				bound_store,
				conflict_clause,
				..
			} = self;
			tableau.update_row(i, |j| {
				let jj = variables[VarRef::new(j as usize)].index;
				if best.map_or(true, |(b, _)| jj < b) {
					match variables[jj].bound {
						Some(b) if bound_store[b].value == variables[jj].value => {
							conflict_clause.push(!bound_store[b].lit);
						}
						_ => best = Some((jj, j)),
					}
				}
				true
			});
			return match best {
				Some((_, j)) => State::Unknown(i, j),
				None => State::Unsatisfiable,
			};
		}
		State::Satisfiable
	}

	/// The solve statistics gathered so far.
	pub fn statistics(&self) -> &Statistics {
		&self.statistics
	}

	/// Make the assignment consistent with the bounds activated by the newly
	/// true literals `lits`.
	///
	/// Emits unit-resulting clauses through `ctl` while propagating. Returns
	/// `false` on a conflict, in which case [`Self::reason`] holds the
	/// conflict clause for the host, or when the host rejected an emitted
	/// clause.
	pub fn solve(&mut self, ctl: &mut impl PropagationActions, lits: &[Lit]) -> bool {
		let start = Instant::now();
		let ret = self.solve_inner(ctl, lits);
		self.statistics.time_total += start.elapsed();
		self.statistics.tableau_size_sum += self.tableau.size() as u64;
		self.statistics.tableau_samples += 1;
		if ret {
			self.statistics.sat += 1;
		} else {
			self.statistics.unsat += 1;
		}
		ret
	}

	/// The timed part of [`Self::solve`].
	fn solve_inner(&mut self, ctl: &mut impl PropagationActions, lits: &[Lit]) -> bool {
		let level = ctl.decision_level();
		trace!(
			level,
			lits = ?lits.iter().map(|&l| i32::from(l)).collect::<Vec<i32>>(),
			"solve"
		);

		if self.trail_offset.last().map_or(true, |t| t.level < level) {
			self.trail_offset.push(TrailOffset {
				level,
				bound: self.bound_trail.len(),
				assignment: self.assignment_trail.len(),
			});
		}

		for ii in self.propagate_set.drain(..) {
			self.variables[ii].in_propagate_set = false;
		}

		for &lit in lits {
			let Some(bounds) = self.bounds.get(&lit) else {
				continue;
			};
			for bound in bounds.clone() {
				if !self.update_bound(bound) {
					let var = self.bound_store[bound].variable;
					if let Some(installed) = self.variables[var].bound {
						self.conflict_clause.clear();
						self.conflict_clause.push(!self.bound_store[installed].lit);
						self.conflict_clause.push(!self.bound_store[bound].lit);
					}
					debug!(
						clause = ?self.conflict_clause.iter().map(|&l| i32::from(l)).collect::<Vec<i32>>(),
						"bound clash"
					);
					return false;
				}
				let var = self.bound_store[bound].variable;
				let slot = self.variables[var].reverse_index;
				if usize::from(slot) < self.n_non_basic as usize {
					if self.variables[var].has_conflict(&self.bound_store) {
						self.update(level, usize::from(slot) as u32);
					} else if self.propagate_enabled {
						self.touch_col(usize::from(slot) as u32);
					}
				} else {
					let i = (usize::from(slot) - self.n_non_basic as usize) as u32;
					self.enqueue(i);
					if self.propagate_enabled {
						self.touch_row(i);
					}
				}
			}
		}

		debug_assert!(self.check_tableau());
		debug_assert!(self.check_basic());
		debug_assert!(self.check_non_basic());

		loop {
			match self.select() {
				State::Satisfiable => return self.propagate_rows(ctl),
				State::Unsatisfiable => {
					debug!(
						clause = ?self.conflict_clause.iter().map(|&l| i32::from(l)).collect::<Vec<i32>>(),
						"conflicting row"
					);
					return false;
				}
				State::Unknown(i, j) => self.pivot(level, i, j),
			}
		}
	}

	/// Schedule every row of column `j` for the next row-propagation pass.
	fn touch_col(&mut self, j: u32) {
		let Solver {
			tableau,
			variables,
			propagate_set,
			n_non_basic,
			..
		} = self;
		tableau.update_col(j, |i| {
			let ii = variables[VarRef::new(*n_non_basic as usize + i as usize)].index;
			schedule_var(variables, propagate_set, ii);
		});
	}

	/// Schedule row `i` for the next row-propagation pass.
	fn touch_row(&mut self, i: u32) {
		let ii = self.basic(i);
		schedule_var(&mut self.variables, &mut self.propagate_set, ii);
	}

	/// Undo all assignments made on the decision level being left, restoring
	/// the satisfying assignment the level was entered with.
	pub fn undo(&mut self) {
		let Some(offset) = self.trail_offset.pop() else {
			debug_assert!(false, "undo without a matching solve");
			return;
		};
		trace!(level = offset.level, "undo");

		for &var in &self.bound_trail[offset.bound..] {
			self.variables[var].bound = None;
		}
		self.bound_trail.truncate(offset.bound);

		for &(level, var, value) in &self.assignment_trail[offset.assignment..] {
			let x = &mut self.variables[var];
			x.level = level;
			x.value = value;
		}
		self.assignment_trail.truncate(offset.assignment);

		while let Some(Reverse(ii)) = self.conflicts.pop() {
			self.variables[ii].queued = false;
		}

		debug_assert!(self.check_tableau());
		debug_assert!(self.check_basic());
		debug_assert!(self.check_non_basic());
	}

	/// Flip non-basic column `j` to make it satisfy its bound, keeping all
	/// rows containing it balanced.
	fn update(&mut self, level: u32, j: u32) {
		{
			let Solver {
				tableau,
				variables,
				bound_store,
				conflicts,
				propagate_set,
				assignment_trail,
				propagate_enabled,
				n_non_basic,
				..
			} = self;
			tableau.update_col(j, |i| {
				let ii = variables[VarRef::new(*n_non_basic as usize + i as usize)].index;
				variables[ii].flip_value(assignment_trail, ii, level);
				enqueue_var(variables, bound_store, conflicts, ii);
				if *propagate_enabled {
					schedule_var(variables, propagate_set, ii);
				}
			});
		}
		let jj = self.non_basic(j);
		self.variables[jj].flip_value(&mut self.assignment_trail, jj, level);
	}

	/// Install `bound` as the active bound of its variable if none is active
	/// yet, recording the installation on the bound trail.
	///
	/// Returns whether the bound that is active after the call agrees with
	/// the requested one; disagreement means the host asserted two
	/// incompatible bound literals.
	fn update_bound(&mut self, bound: BoundRef) -> bool {
		let var = self.bound_store[bound].variable;
		let installed = match self.variables[var].bound {
			Some(b) => b,
			None => {
				self.bound_trail.push(var);
				self.variables[var].bound = Some(bound);
				bound
			}
		};
		self.bound_store[installed].value == self.bound_store[bound].value
	}

	/// The current value of a variable.
	pub fn value(&self, var: VarRef) -> Value {
		self.variables[var].value
	}
}

#[cfg(test)]
mod test {
	use crate::{
		problem::{VarRef, XorConstraint},
		solver::Solver,
		tests::TestHost,
		Value,
	};

	#[test]
	fn prepare_screens_trivial_rows() {
		let mut host = TestHost::default();
		let gate0 = host.new_var();
		let gate1 = host.new_var();
		let constraints = vec![
			// `0 = 0` holds vacuously and registers nothing
			XorConstraint {
				lhs: vec![],
				rhs: Value::default(),
				lit: gate0,
			},
			// `0 = 1` forbids its gate
			XorConstraint {
				lhs: vec![],
				rhs: Value::new(true),
				lit: gate1,
			},
		];
		let mut slv = Solver::new(true);
		assert!(slv.prepare(&mut host, 0, &constraints));
		assert_eq!(host.clause_log(), "-2\n");
		assert_eq!(slv.statistics().n_bounds, 0);
	}

	#[test]
	fn prepare_skips_constraints_with_false_gates() {
		let mut host = TestHost::default();
		let gate = host.new_var();
		assert!(host.assign(!gate));
		let constraints = vec![XorConstraint {
			lhs: vec![VarRef::new(0)],
			rhs: Value::new(true),
			lit: gate,
		}];
		let mut slv = Solver::new(true);
		assert!(slv.prepare(&mut host, 1, &constraints));
		assert_eq!(slv.statistics().n_bounds, 0);
		assert_eq!(host.clause_log(), "");
	}

	#[test]
	fn prepare_fills_problem_statistics() {
		let mut host = TestHost::default();
		let gate = host.new_var();
		let constraints = vec![XorConstraint {
			lhs: vec![VarRef::new(0), VarRef::new(1)],
			rhs: Value::new(true),
			lit: gate,
		}];
		let mut slv = Solver::new(true);
		assert!(slv.prepare(&mut host, 2, &constraints));
		let stats = slv.statistics();
		assert_eq!(stats.n_non_basic, 2);
		assert_eq!(stats.n_basic, 1);
		assert_eq!(stats.n_bounds, 1);
		assert_eq!(stats.initial_tableau_size, 2);
	}
}
