//! A sparse Boolean matrix with efficient access to both rows and columns,
//! storing the coefficients of the parity constraint rows.
//!
//! Since the coefficients live in GF(2), a cell is either present or absent;
//! rows and columns are kept as sorted index lists. The matrix keeps both
//! orientations in sync, except that clearing a cell through a row rewrite
//! leaves the column entry behind to be purged lazily on the next column
//! traversal.

use std::mem;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// A sparse GF(2) matrix over row and column indices.
///
/// Insertion is linear in the length of the affected row and column and
/// should be avoided on hot paths; the pivot step [`Self::eliminate`] merges
/// whole rows instead.
pub(crate) struct Tableau {
	/// For each row, the sorted columns with a non-zero cell.
	rows: Vec<Vec<u32>>,
	/// For each column, the sorted rows with a non-zero cell. May contain
	/// stale entries for cells a row rewrite has cleared.
	cols: Vec<Vec<u32>>,
}

impl Tableau {
	/// Remove every cell from the matrix.
	pub(crate) fn clear(&mut self) {
		self.rows.clear();
		self.cols.clear();
	}

	/// Check whether the cell at row `i` and column `j` is set.
	pub(crate) fn contains(&self, i: u32, j: u32) -> bool {
		self.rows
			.get(i as usize)
			.is_some_and(|row| row.binary_search(&j).is_ok())
	}

	/// Add row `i` into every other row that has column `j` set.
	///
	/// This is the only operation specific to the simplex algorithm: it is
	/// the mod-2 pivot step that re-expresses all rows depending on column
	/// `j` in terms of row `i`. Row `i` itself is left unchanged, and the
	/// shared column `j` is retained in the rewritten rows because the pivot
	/// reinterprets it as the freshly demoted variable. Common columns other
	/// than `j` cancel; their column entries go stale and are purged by the
	/// next traversal.
	pub(crate) fn eliminate(&mut self, i: u32, j: u32) {
		let pivot = mem::take(&mut self.rows[i as usize]);
		debug_assert!(pivot.binary_search(&j).is_ok());
		let mut col = mem::take(&mut self.cols[j as usize]);
		let mut keep = 0;
		let mut buf = Vec::new();
		for idx in 0..col.len() {
			let k = col[idx];
			if k != i && self.rows[k as usize].binary_search(&j).is_err() {
				continue;
			}
			col[keep] = k;
			keep += 1;
			if k == i {
				continue;
			}
			let row_k = &self.rows[k as usize];
			let mut it = 0;
			let mut jt = 0;
			while it < pivot.len() || jt < row_k.len() {
				if jt == row_k.len() || (it < pivot.len() && pivot[it] < row_k[jt]) {
					let c = pivot[it];
					buf.push(c);
					let col_c = &mut self.cols[c as usize];
					if let Err(pos) = col_c.binary_search(&k) {
						col_c.insert(pos, k);
					}
					it += 1;
				} else if it == pivot.len() || row_k[jt] < pivot[it] {
					buf.push(row_k[jt]);
					jt += 1;
				} else {
					if row_k[jt] == j {
						buf.push(j);
					}
					it += 1;
					jt += 1;
				}
			}
			mem::swap(&mut self.rows[k as usize], &mut buf);
			buf.clear();
		}
		col.truncate(keep);
		self.cols[j as usize] = col;
		self.rows[i as usize] = pivot;
	}

	/// Grow the column storage to make column `j` addressable.
	fn reserve_col(&mut self, j: u32) -> &mut Vec<u32> {
		if self.cols.len() <= j as usize {
			self.cols.resize_with(j as usize + 1, Vec::new);
		}
		&mut self.cols[j as usize]
	}

	/// Grow the row storage to make row `i` addressable.
	fn reserve_row(&mut self, i: u32) -> &mut Vec<u32> {
		if self.rows.len() <= i as usize {
			self.rows.resize_with(i as usize + 1, Vec::new);
		}
		&mut self.rows[i as usize]
	}

	/// Set or clear the cell at row `i` and column `j`. Idempotent.
	pub(crate) fn set(&mut self, i: u32, j: u32, a: bool) {
		if a {
			let row = self.reserve_row(i);
			if let Err(pos) = row.binary_search(&j) {
				row.insert(pos, j);
			}
			let col = self.reserve_col(j);
			if let Err(pos) = col.binary_search(&i) {
				col.insert(pos, i);
			}
		} else if let Some(row) = self.rows.get_mut(i as usize) {
			if let Ok(pos) = row.binary_search(&j) {
				let _ = row.remove(pos);
			}
		}
	}

	/// The number of set cells. Linear in the size of the matrix.
	pub(crate) fn size(&self) -> usize {
		self.rows.iter().map(Vec::len).sum()
	}

	/// Visit the rows of column `j` in ascending order.
	///
	/// Rows that no longer contain the column are purged from the column
	/// list on the way.
	pub(crate) fn update_col(&mut self, j: u32, mut f: impl FnMut(u32)) {
		if (j as usize) < self.cols.len() {
			let mut col = mem::take(&mut self.cols[j as usize]);
			let mut keep = 0;
			for idx in 0..col.len() {
				let i = col[idx];
				if self.rows[i as usize].binary_search(&j).is_ok() {
					f(i);
					col[keep] = i;
					keep += 1;
				}
			}
			col.truncate(keep);
			self.cols[j as usize] = col;
		}
	}

	/// Visit the columns of row `i` in ascending order until `f` returns
	/// `false`.
	pub(crate) fn update_row(&self, i: u32, mut f: impl FnMut(u32) -> bool) {
		if let Some(row) = self.rows.get(i as usize) {
			for &col in row {
				if !f(col) {
					break;
				}
			}
		}
	}
}
