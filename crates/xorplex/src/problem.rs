//! The problem representation handed from the normalizer to the solvers: a
//! list of normalized parity constraints over theory variables.

use std::fmt;

use index_vec::IndexVec;

use crate::{Lit, Value};

index_vec::define_index_type! {
	/// Identifies a theory variable of the propagator.
	///
	/// Indices below the number of problem variables refer to the non-basic
	/// variables created by the normalizer (one per element literal); the
	/// solvers append one basic variable per multi-term constraint row behind
	/// them.
	pub struct VarRef = u32;
}

/// Type alias for the storage of [`Variable`](crate::solver) records and
/// other per-variable tables.
pub(crate) type VarVec<T> = IndexVec<VarRef, T>;

#[derive(Clone, Debug, PartialEq, Eq)]
/// A normalized parity constraint `lhs₁ ⊕ … ⊕ lhsₖ = rhs`, enforced whenever
/// `lit` is true in the host.
///
/// All variables in `lhs` are distinct. Constraints with a single left-hand
/// side variable act as bounds; the normalizer emits exactly two such rows
/// (for the values `0` and `1`, gated by opposite literals) per variable it
/// creates.
pub struct XorConstraint {
	/// The variables whose values are added up.
	pub lhs: Vec<VarRef>,
	/// The value the sum has to take.
	pub rhs: Value,
	/// The literal gating the constraint.
	pub lit: Lit,
}

impl fmt::Display for XorConstraint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut xor = false;
		for &var in &self.lhs {
			if xor {
				write!(f, " ^ ")?;
			} else {
				xor = true;
			}
			write!(f, "var_{}", usize::from(var))?;
		}
		if self.lhs.is_empty() {
			write!(f, "0")?;
		}
		write!(
			f,
			" = {} :- {}lit_{}",
			self.rhs,
			if self.lit.is_negated() { "not " } else { "" },
			self.lit.var()
		)
	}
}

#[cfg(test)]
mod test {
	use crate::{
		problem::{VarRef, XorConstraint},
		Lit, Value,
	};

	#[test]
	fn display_constraint() {
		let c = XorConstraint {
			lhs: vec![VarRef::new(0), VarRef::new(2)],
			rhs: Value::new(true),
			lit: Lit::new(4).unwrap(),
		};
		assert_eq!(c.to_string(), "var_0 ^ var_2 = 1 :- lit_4");
		let c = XorConstraint {
			lhs: vec![VarRef::new(1)],
			rhs: Value::default(),
			lit: Lit::new(-3).unwrap(),
		};
		assert_eq!(c.to_string(), "var_1 = 0 :- not lit_3");
		let c = XorConstraint {
			lhs: vec![],
			rhs: Value::new(true),
			lit: Lit::new(7).unwrap(),
		};
		assert_eq!(c.to_string(), "0 = 1 :- lit_7");
	}
}
