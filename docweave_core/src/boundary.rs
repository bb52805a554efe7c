use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use tracing::debug;

use crate::DocweaveError;
use crate::DocweaveResult;
use crate::Element;
use crate::ElementPointer;
use crate::Path;
use crate::common_prefix;

/// A unit of reconstruction work: shallow-copy the ancestors along `branch`,
/// then deep-clone the children of `branch` selected by `crossroad`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
	pub branch: Path,
	pub crossroad: Range<usize>,
}

impl Route {
	pub fn new(branch: &[usize], crossroad: Range<usize>) -> Self {
		Self {
			branch: branch.to_vec(),
			crossroad,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.crossroad.is_empty()
	}
}

impl fmt::Display for Route {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{:?}[{}..{}]",
			self.branch, self.crossroad.start, self.crossroad.end
		)
	}
}

/// Routes bridging two consecutive distinct leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
	/// Remaining siblings of the previous leaf's ancestors, innermost first.
	pub ending: Vec<Route>,
	/// Siblings strictly between both leaves below their common ancestor.
	pub gap: Route,
	/// Preceding siblings of the next leaf's ancestors, outermost first.
	pub opening: Vec<Route>,
}

impl Boundary {
	/// All routes in the order they are applied.
	pub fn routes(&self) -> impl Iterator<Item = &Route> {
		self.ending
			.iter()
			.chain(std::iter::once(&self.gap))
			.chain(self.opening.iter())
	}
}

/// Every boundary of a document keyed by the index of the leaf it leads to.
/// The last key, one past the greatest leaf index, closes the document.
#[derive(Debug, Clone, Default)]
pub struct Boundaries {
	boundaries: BTreeMap<usize, Boundary>,
	leaves: BTreeMap<usize, Path>,
}

impl Boundaries {
	pub fn get(&self, index: usize) -> DocweaveResult<&Boundary> {
		self.boundaries
			.get(&index)
			.ok_or_else(|| unknown_index(index))
	}

	/// Source path of the leaf with `index`.
	pub fn leaf(&self, index: usize) -> DocweaveResult<&Path> {
		self.leaves.get(&index).ok_or_else(|| unknown_index(index))
	}

	/// Key of the closing boundary.
	pub fn last(&self) -> usize {
		self.leaves.len() + 1
	}

	pub fn len(&self) -> usize {
		self.boundaries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.boundaries.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&usize, &Boundary)> {
		self.boundaries.iter()
	}
}

fn unknown_index(index: usize) -> DocweaveError {
	DocweaveError::MalformedTape(format!("no leaf with index {index}"))
}

/// Routes closing the ancestors of `path` from the deepest level up to
/// `depth`, innermost first. Levels without remaining siblings are omitted.
pub fn make_ending_range(root: &Element, path: &[usize], depth: usize) -> DocweaveResult<Vec<Route>> {
	let mut routes = Vec::new();
	for level in (depth..path.len()).rev() {
		let branch = &path[..level];
		let count = root.find(branch)?.children.len();
		let route = Route::new(branch, path[level] + 1..count);
		if !route.is_empty() {
			routes.push(route);
		}
	}
	Ok(routes)
}

/// Routes opening the ancestors of `path` from `depth` down to its parent,
/// outermost first. Levels without preceding siblings are omitted.
pub fn make_opening_range(path: &[usize], depth: usize) -> Vec<Route> {
	(depth..path.len())
		.map(|level| Route::new(&path[..level], 0..path[level]))
		.filter(|route| !route.is_empty())
		.collect()
}

fn between(root: &Element, previous: &[usize], next: &[usize]) -> DocweaveResult<Boundary> {
	let common = common_prefix(previous, next);
	if common >= previous.len() || common >= next.len() {
		return Err(DocweaveError::UnexpectedTapeMove {
			from: previous.to_vec(),
			to: next.to_vec(),
		});
	}

	Ok(Boundary {
		ending: make_ending_range(root, previous, common + 1)?,
		gap: Route::new(&previous[..common], previous[common] + 1..next[common]),
		opening: make_opening_range(next, common + 1),
	})
}

/// Precompute the boundary in front of every leaf of `line` plus the closing
/// boundary after the last one.
pub fn delineate_boundaries(
	root: &Element,
	line: &[(ElementPointer, String)],
) -> DocweaveResult<Boundaries> {
	let mut leaves = BTreeMap::new();
	for (pointer, _) in line {
		leaves
			.entry(pointer.index)
			.or_insert_with(|| pointer.path.clone());
	}

	let mut boundaries = BTreeMap::new();
	let mut previous: Option<&Path> = None;
	for (index, path) in &leaves {
		if path.is_empty() {
			return Err(DocweaveError::UnexpectedTapeMove {
				from: Vec::new(),
				to: Vec::new(),
			});
		}
		let boundary = match previous {
			Some(previous) => between(root, previous, path)?,
			None => {
				Boundary {
					ending: Vec::new(),
					gap: Route::new(&[], 0..path[0]),
					opening: make_opening_range(path, 1),
				}
			}
		};
		boundaries.insert(*index, boundary);
		previous = Some(path);
	}

	let closing = match previous {
		Some(last) => {
			Boundary {
				ending: make_ending_range(root, last, 1)?,
				gap: Route::new(&[], last[0] + 1..root.children.len()),
				opening: Vec::new(),
			}
		}
		None => {
			Boundary {
				ending: Vec::new(),
				gap: Route::new(&[], 0..root.children.len()),
				opening: Vec::new(),
			}
		}
	};
	boundaries.insert(leaves.len() + 1, closing);

	debug!(
		leaves = leaves.len(),
		boundaries = boundaries.len(),
		"delineated boundaries"
	);

	Ok(Boundaries { boundaries, leaves })
}
