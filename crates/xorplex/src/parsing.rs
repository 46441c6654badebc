//! Normalization of parsed parity theory atoms into [`XorConstraint`]s.
//!
//! The surface syntax `&even { t₁: c₁; …; tₖ: cₖ }` and `&odd { … }` demands
//! that the conditions `cᵢ`, combined by exclusive or over the distinct
//! tuples `tᵢ`, take the stated parity whenever the atom holds. The host's
//! theory front-end parses the atoms and resolves conditions to solver
//! literals; this module collapses duplicate contributions by parity
//! counting, introduces defined literals for tuples carrying several
//! conditions, and ties every element literal to a theory variable through
//! a pair of unit bound rows.

use std::{
	collections::{hash_map::Entry, HashMap},
	fmt,
};

use itertools::Itertools;

use crate::{
	actions::InitializationActions,
	problem::{VarRef, XorConstraint},
	Lit, Value,
};

#[derive(Clone, Debug, PartialEq, Eq)]
/// One element `tuple : condition` of a parity aggregate.
pub struct AggregateElement {
	/// The ground term tuple identifying the element.
	pub tuple: Vec<Symbol>,
	/// The solver literal of the element's condition, or `None` when the
	/// condition is empty and the element contributes a constant `1`.
	pub condition: Option<Lit>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// The parity a theory atom demands of its true conditions.
pub enum Parity {
	/// The conditions must sum to `0`.
	Even,
	/// The conditions must sum to `1`.
	Odd,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// A ground term, used to identify aggregate element tuples.
pub enum Symbol {
	/// A function application; constants have no arguments and the anonymous
	/// function name encodes a term tuple.
	Fun(String, Vec<Symbol>),
	/// An integer.
	Num(i64),
	/// A quoted string.
	Str(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// A parsed `&even` or `&odd` theory atom.
pub struct TheoryAtom {
	/// The parity demanded when the atom holds.
	pub parity: Parity,
	/// The solver literal of the atom itself.
	pub lit: Lit,
	/// The aggregate elements of the atom.
	pub elements: Vec<AggregateElement>,
}

/// The canonical contribution of one tuple: a constant toggle plus a parity
/// set of condition literals.
type ElemState = (Value, Vec<Lit>);

/// Introduce a literal defined as the exclusive or of `lits` (which holds at
/// least two literals), chaining one fresh literal per additional input.
///
/// Returns `None` if the host rejects one of the defining clauses.
fn define_xor(init: &mut impl InitializationActions, lits: &[Lit]) -> Option<Lit> {
	let mut acc = lits[0];
	for &lit in &lits[1..] {
		let out = init.new_lit();
		for clause in [
			[!out, acc, lit],
			[!out, !acc, !lit],
			[out, !acc, lit],
			[out, acc, !lit],
		] {
			if !init.add_clause(&clause) {
				return None;
			}
		}
		acc = out;
	}
	Some(acc)
}

/// Lower the parsed atoms into normalized constraints, appending to
/// `constraints`.
///
/// Element literals are mapped to theory variables through `aux_map`, which
/// persists across solving steps; a literal seen for the first time gets a
/// fresh variable plus the two unit bound rows tying the variable to the
/// literal's polarities. Returns `false` if the host rejected one of the
/// clauses defining an auxiliary literal.
pub(crate) fn evaluate_theory(
	init: &mut impl InitializationActions,
	aux_map: &mut HashMap<Lit, VarRef>,
	atoms: &[TheoryAtom],
	constraints: &mut Vec<XorConstraint>,
) -> bool {
	for atom in atoms {
		// merge elements sharing a tuple: their conditions combine by parity
		let mut elem_ids: HashMap<&[Symbol], usize> = HashMap::new();
		let mut elems: Vec<ElemState> = Vec::new();
		for elem in &atom.elements {
			let id = *elem_ids.entry(elem.tuple.as_slice()).or_insert_with(|| {
				elems.push((Value::default(), Vec::new()));
				elems.len() - 1
			});
			match elem.condition {
				None => elems[id].0.flip(),
				Some(lit) => elems[id].1.push(lit),
			}
		}

		// canonicalize each contribution: `l ⊕ l` cancels, `l ⊕ ¬l` folds
		// into the constant
		for (constant, lits) in &mut elems {
			let sorted: Vec<Lit> = lits
				.drain(..)
				.sorted_by_key(|l| (l.var(), l.is_negated()))
				.collect();
			let mut i = 0;
			while i < sorted.len() {
				if i + 1 < sorted.len() && sorted[i] == sorted[i + 1] {
					i += 2;
				} else if i + 1 < sorted.len() && sorted[i].var() == sorted[i + 1].var() {
					constant.flip();
					i += 2;
				} else {
					lits.push(sorted[i]);
					i += 1;
				}
			}
		}

		// identical contributions cancel pairwise across the atom
		let mut seen: HashMap<&ElemState, usize> = HashMap::new();
		for state in &elems {
			*seen.entry(state).or_insert(0) += 1;
		}

		let mut rhs = Value::new(matches!(atom.parity, Parity::Odd));
		let mut lhs = Vec::new();
		for state in &elems {
			let Some(count) = seen.get_mut(state) else {
				continue;
			};
			if *count % 2 == 0 {
				continue;
			}
			*count = 0;
			let (constant, lits) = state;
			rhs ^= *constant;
			let eq_lit = match lits[..] {
				[] => continue,
				[lit] => lit,
				_ => match define_xor(init, lits) {
					Some(lit) => lit,
					None => return false,
				},
			};
			let next = VarRef::new(aux_map.len());
			let var = match aux_map.entry(eq_lit) {
				Entry::Occupied(e) => *e.get(),
				Entry::Vacant(e) => {
					let var = *e.insert(next);
					constraints.push(XorConstraint {
						lhs: vec![var],
						rhs: Value::default(),
						lit: !eq_lit,
					});
					constraints.push(XorConstraint {
						lhs: vec![var],
						rhs: Value::new(true),
						lit: eq_lit,
					});
					var
				}
			};
			lhs.push(var);
		}
		constraints.push(XorConstraint {
			lhs,
			rhs,
			lit: atom.lit,
		});
	}
	true
}

impl fmt::Display for Symbol {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Symbol::Fun(name, args) => {
				write!(f, "{name}")?;
				if !args.is_empty() {
					write!(f, "({})", args.iter().format(","))?;
				}
				Ok(())
			}
			Symbol::Num(n) => write!(f, "{n}"),
			Symbol::Str(s) => write!(f, "\"{s}\""),
		}
	}
}

impl Symbol {
	/// Shorthand for a constant symbol.
	pub fn constant(name: &str) -> Symbol {
		Symbol::Fun(name.to_owned(), Vec::new())
	}
}

#[cfg(test)]
mod test {
	use std::collections::HashMap;

	use expect_test::{expect, Expect};

	use crate::{
		parsing::{evaluate_theory, AggregateElement, Parity, Symbol, TheoryAtom},
		tests::TestHost,
		Lit,
	};

	/// Build an element contributing `condition` under the tuple named
	/// `tuple`.
	fn elem(tuple: &str, condition: Option<Lit>) -> AggregateElement {
		AggregateElement {
			tuple: vec![Symbol::constant(tuple)],
			condition,
		}
	}

	/// Normalize `atoms` on a fresh host and snapshot constraints and host
	/// clauses.
	fn check(atoms: &[TheoryAtom], expected: Expect) {
		let mut host = TestHost::default();
		let mut aux_map = HashMap::new();
		let mut constraints = Vec::new();
		assert!(evaluate_theory(
			&mut host,
			&mut aux_map,
			atoms,
			&mut constraints
		));
		let mut out = String::new();
		for c in &constraints {
			out.push_str(&c.to_string());
			out.push('\n');
		}
		expected.assert_eq(&out);
	}

	#[test]
	fn single_conditions() {
		// &odd { a: 1; b: 2 } gated by literal 3
		let host = &mut TestHost::default();
		let (a, b, atom) = (host.new_var(), host.new_var(), host.new_var());
		check(
			&[TheoryAtom {
				parity: Parity::Odd,
				lit: atom,
				elements: vec![elem("a", Some(a)), elem("b", Some(b))],
			}],
			expect![[r#"
    var_0 = 0 :- not lit_1
    var_0 = 1 :- lit_1
    var_1 = 0 :- not lit_2
    var_1 = 1 :- lit_2
    var_0 ^ var_1 = 1 :- lit_3
"#]],
		);
	}

	#[test]
	fn duplicate_tuple_combines_by_parity() {
		// &even { x: 1; yz: 2; yz: 3 }: the shared tuple gets one auxiliary
		// equal to the exclusive or of its two conditions
		let host = &mut TestHost::default();
		let (x, y, z, atom) = (
			host.new_var(),
			host.new_var(),
			host.new_var(),
			host.new_var(),
		);
		let mut aux_map = HashMap::new();
		let mut constraints = Vec::new();
		let atoms = [TheoryAtom {
			parity: Parity::Even,
			lit: atom,
			elements: vec![elem("x", Some(x)), elem("yz", Some(y)), elem("yz", Some(z))],
		}];
		assert!(evaluate_theory(
			host,
			&mut aux_map,
			&atoms,
			&mut constraints
		));
		assert_eq!(aux_map.len(), 2);
		let mut out = String::new();
		for c in &constraints {
			out.push_str(&c.to_string());
			out.push('\n');
		}
		expect![[r#"
    var_0 = 0 :- not lit_1
    var_0 = 1 :- lit_1
    var_1 = 0 :- not lit_5
    var_1 = 1 :- lit_5
    var_0 ^ var_1 = 0 :- lit_4
"#]]
		.assert_eq(&out);
		// the auxiliary literal 5 is defined as 2 ^ 3
		expect![[r#"
    -5 2 3
    -5 -2 -3
    5 -2 3
    5 2 -3
"#]]
		.assert_eq(&host.clause_log());
	}

	#[test]
	fn identical_contributions_cancel() {
		// &odd { a: 1; b: 1 }: both tuples contribute the same literal, so
		// the pair cancels and the constraint collapses to `0 = 1`
		let host = &mut TestHost::default();
		let (c, atom) = (host.new_var(), host.new_var());
		check(
			&[TheoryAtom {
				parity: Parity::Odd,
				lit: atom,
				elements: vec![elem("a", Some(c)), elem("b", Some(c))],
			}],
			expect![[r#"
    0 = 1 :- lit_2
"#]],
		);
	}

	#[test]
	fn empty_condition_toggles_rhs() {
		// &even { a; b: 1 }: the constant-true element flips the parity
		let host = &mut TestHost::default();
		let (c, atom) = (host.new_var(), host.new_var());
		check(
			&[TheoryAtom {
				parity: Parity::Even,
				lit: atom,
				elements: vec![elem("a", None), elem("b", Some(c))],
			}],
			expect![[r#"
    var_0 = 0 :- not lit_1
    var_0 = 1 :- lit_1
    var_0 = 1 :- lit_2
"#]],
		);
	}

	#[test]
	fn complementary_conditions_fold_into_constant() {
		// &even { a: 1; a: -1 }: `l ⊕ ¬l` is constantly true
		let host = &mut TestHost::default();
		let (c, atom) = (host.new_var(), host.new_var());
		check(
			&[TheoryAtom {
				parity: Parity::Even,
				lit: atom,
				elements: vec![elem("a", Some(c)), elem("a", Some(!c))],
			}],
			expect![[r#"
    0 = 1 :- lit_2
"#]],
		);
	}

	#[test]
	fn element_literals_are_shared_across_atoms() {
		let host = &mut TestHost::default();
		let (c, a1, a2) = (host.new_var(), host.new_var(), host.new_var());
		check(
			&[
				TheoryAtom {
					parity: Parity::Odd,
					lit: a1,
					elements: vec![elem("a", Some(c))],
				},
				TheoryAtom {
					parity: Parity::Even,
					lit: a2,
					elements: vec![elem("a", Some(c))],
				},
			],
			expect![[r#"
    var_0 = 0 :- not lit_1
    var_0 = 1 :- lit_1
    var_0 = 1 :- lit_2
    var_0 = 0 :- lit_3
"#]],
		);
	}

	#[test]
	fn symbol_display() {
		let sym = Symbol::Fun(
			"f".to_owned(),
			vec![Symbol::Num(1), Symbol::Str("a".to_owned())],
		);
		assert_eq!(sym.to_string(), "f(1,\"a\")");
		assert_eq!(Symbol::constant("c").to_string(), "c");
	}
}
