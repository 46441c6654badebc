//! # Xorplex, an XOR (parity) theory propagator over GF(2)
//!
//! Xorplex maintains a set of parity constraints of the form
//! `x₁ ⊕ x₂ ⊕ … ⊕ xₖ = p` (with `p ∈ {0, 1}`), each gated by a literal of a
//! host CDCL solver. It keeps, per host thread, an incremental GF(2)
//! assignment that is consistent with all currently enabled constraints,
//! detects conflicts early, hands conflict clauses back to the host, and
//! propagates the implied literal when a constraint row becomes
//! unit-resulting.
//!
//! The crate never searches on its own. The host drives it through the
//! [`Propagator`](propagator::Propagator) callbacks (`init`, `propagate`,
//! `check`, `undo`), reaching the crate through the traits in [`actions`].
//! Internally each thread runs an XOR-simplex: a sparse Boolean tableau with
//! a basic/non-basic variable split and Bland's-rule pivoting adapted to
//! mod-2 arithmetic, which makes every `solve` call terminate.

pub mod actions;
pub mod parsing;
pub mod problem;
pub mod propagator;
pub mod solver;

use std::{
	fmt,
	num::NonZeroI32,
	ops::{BitXor, BitXorAssign, Not},
};

/// Type alias for a disjunction of literals (clause), used for internal type
/// documentation.
pub(crate) type Clause = Vec<Lit>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// A literal of the host solver.
///
/// Literals are non-zero integers whose sign selects the polarity, the
/// convention shared by DIMACS and the host propagator interface. Negation is
/// written `!lit`. Literal ids are assigned by the host and are stable for
/// the lifetime of the propagator.
pub struct Lit(NonZeroI32);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// A single GF(2) value.
///
/// Addition in GF(2) is exclusive or, so the only operations offered are
/// [`BitXor`], in-place [`Self::flip`], and equality. The [`Default`] value
/// is `0`, the additive identity.
pub struct Value(bool);

impl Lit {
	/// Create a literal from its integer code, or `None` for the invalid
	/// code `0`.
	pub fn new(code: i32) -> Option<Lit> {
		NonZeroI32::new(code).map(Lit)
	}

	/// Whether this is the negative polarity of its variable.
	pub fn is_negated(self) -> bool {
		self.0.get() < 0
	}

	/// The variable the literal talks about, i.e. its absolute code.
	pub fn var(self) -> u32 {
		self.0.get().unsigned_abs()
	}
}

impl fmt::Display for Lit {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0.get())
	}
}

impl From<Lit> for i32 {
	fn from(lit: Lit) -> i32 {
		lit.0.get()
	}
}

impl From<NonZeroI32> for Lit {
	fn from(code: NonZeroI32) -> Lit {
		Lit(code)
	}
}

impl Not for Lit {
	type Output = Lit;

	fn not(self) -> Lit {
		Lit(-self.0)
	}
}

impl Value {
	/// Wrap a Boolean as a GF(2) value.
	pub fn new(bit: bool) -> Value {
		Value(bit)
	}

	/// The underlying Boolean, `true` for `1`.
	pub fn bit(self) -> bool {
		self.0
	}

	/// Add `1`, i.e. toggle the value.
	pub fn flip(&mut self) {
		self.0 = !self.0;
	}
}

impl BitXor for Value {
	type Output = Value;

	fn bitxor(self, rhs: Value) -> Value {
		Value(self.0 != rhs.0)
	}
}

impl BitXorAssign for Value {
	fn bitxor_assign(&mut self, rhs: Value) {
		self.0 = self.0 != rhs.0;
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", u8::from(self.0))
	}
}

impl From<bool> for Value {
	fn from(bit: bool) -> Value {
		Value(bit)
	}
}

#[cfg(test)]
mod test {
	use crate::{Lit, Value};

	#[test]
	fn literal_polarity() {
		let l = Lit::new(3).unwrap();
		assert!(!l.is_negated());
		assert!((!l).is_negated());
		assert_eq!(!!l, l);
		assert_eq!(l.var(), 3);
		assert_eq!((!l).var(), 3);
		assert_eq!(i32::from(!l), -3);
		assert!(Lit::new(0).is_none());
	}

	#[test]
	fn value_arithmetic() {
		let zero = Value::default();
		let one = Value::new(true);
		assert_eq!(zero ^ zero, zero);
		assert_eq!(zero ^ one, one);
		assert_eq!(one ^ one, zero);
		let mut v = zero;
		v.flip();
		assert_eq!(v, one);
		v ^= one;
		assert_eq!(v, zero);
		assert_eq!(format!("{one}{zero}"), "10");
	}
}
