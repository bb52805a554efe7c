use tracing::trace;

use crate::DocweaveResult;
use crate::Element;
use crate::Path;
use crate::Route;
use crate::common_prefix;
use crate::format::DocumentFormat;

/// Bookkeeping for one open ancestor.
#[derive(Debug, Clone, Default)]
struct Level {
	/// A leaf was copied beneath this ancestor.
	settled: bool,
	/// The ancestor sits at or below the prune floor it was opened with.
	prunable: bool,
	/// Siblings other than formatting properties were cloned into it, or a
	/// child was kept.
	furnished: bool,
	/// Destination indices of closed children that turned out empty.
	bare: Vec<usize>,
}

/// Incremental copier of a source tree into a destination tree.
///
/// The builder is a zipper over both trees: `source_chain` holds the source
/// indices of the currently open ancestors and `destination_chain` the indices
/// of their copies. Ancestors are opened as shallow copies and stay
/// provisional until a leaf is copied beneath them.
///
/// A provisional ancestor that was opened at or below the prune floor and holds
/// nothing besides formatting properties is empty. Empty copies are removed
/// when their parent closes, unless the parent would be left without
/// children.
pub struct TreeBuilder<'a> {
	source: &'a Element,
	format: Option<&'a dyn DocumentFormat>,
	destination: Element,
	source_chain: Path,
	destination_chain: Vec<usize>,
	levels: Vec<Level>,
	/// Empty children of the destination root.
	bare: Vec<usize>,
	prune_floor: usize,
	current_route: Option<Route>,
}

impl<'a> TreeBuilder<'a> {
	pub fn new(source: &'a Element) -> Self {
		Self {
			source,
			format: None,
			destination: source.shallow_copy(),
			source_chain: Vec::new(),
			destination_chain: Vec::new(),
			levels: Vec::new(),
			bare: Vec::new(),
			prune_floor: 0,
			current_route: None,
		}
	}

	/// A builder that leaves the format's property elements out when deciding
	/// whether a provisional ancestor holds content.
	pub fn with_format(source: &'a Element, format: &'a dyn DocumentFormat) -> Self {
		Self {
			format: Some(format),
			..Self::new(source)
		}
	}

	/// Number of open ancestors below the root.
	pub fn depth(&self) -> usize {
		self.assert_chains();
		self.source_chain.len()
	}

	pub fn source_chain(&self) -> &[usize] {
		&self.source_chain
	}

	pub fn current_route(&self) -> Option<&Route> {
		self.current_route.as_ref()
	}

	/// Ancestors opened from now on at a depth of at least `depth` may be
	/// removed when they end up empty.
	pub fn set_prune_floor(&mut self, depth: usize) {
		self.prune_floor = depth;
	}

	fn assert_chains(&self) {
		assert_eq!(self.source_chain.len(), self.destination_chain.len());
		assert_eq!(self.source_chain.len(), self.levels.len());
	}

	/// Apply `routes` in order. Empty routes are skipped without moving.
	pub fn copy<'r>(&mut self, routes: impl IntoIterator<Item = &'r Route>) -> DocweaveResult<()> {
		for route in routes {
			if route.is_empty() {
				continue;
			}
			trace!(%route, "copying route");
			self.enter(&route.branch)?;
			let source = self.source;
			let parent = source.find(&route.branch)?;
			let mut furnished = false;
			for index in route.crossroad.clone() {
				let child = parent.child(index)?;
				furnished |= !self.is_property(child);
				self.current_mut()?.children.push(child.clone());
			}
			if let Some(level) = self.levels.last_mut() {
				level.furnished |= furnished;
			}
			self.current_route = Some(route.clone());
		}

		Ok(())
	}

	/// Deep-clone the leaf at `path` and settle every open ancestor.
	pub fn copy_leaf(&mut self, path: &[usize]) -> DocweaveResult<()> {
		let Some((last, parent)) = path.split_last() else {
			return Ok(());
		};
		let route = Route::new(parent, *last..*last + 1);
		self.copy(std::iter::once(&route))?;
		self.levels.iter_mut().for_each(|level| level.settled = true);
		Ok(())
	}

	/// The destination parent of the leaf copied last, with the leaf's index.
	pub fn leaf_mut(&mut self) -> DocweaveResult<(&mut Element, usize)> {
		let parent = self.current_mut()?;
		let node = parent.children.len().saturating_sub(1);
		Ok((parent, node))
	}

	/// Close open ancestors until `depth` remain.
	pub fn rewind(&mut self, depth: usize) -> DocweaveResult<()> {
		while self.depth() > depth {
			self.pop()?;
		}
		Ok(())
	}

	/// Open shallow copies down to `branch` without copying any sibling.
	pub fn descend(&mut self, branch: &[usize]) -> DocweaveResult<()> {
		self.enter(branch)
	}

	/// Close every ancestor and hand out the destination tree.
	pub fn finish(mut self) -> DocweaveResult<Element> {
		self.rewind(0)?;
		prune(&mut self.destination, &self.bare);
		Ok(self.destination)
	}

	fn is_property(&self, element: &Element) -> bool {
		self.format
			.is_some_and(|format| format.is_property(&element.tag))
	}

	fn current_mut(&mut self) -> DocweaveResult<&mut Element> {
		self.destination.find_mut(&self.destination_chain)
	}

	/// Move the cursor to `branch`, closing ancestors that are not on it and
	/// opening shallow copies along the rest of it.
	fn enter(&mut self, branch: &[usize]) -> DocweaveResult<()> {
		let common = common_prefix(&self.source_chain, branch);
		self.rewind(common)?;

		let source = self.source;
		for level in common..branch.len() {
			let shell = source.find(&branch[..=level])?.shallow_copy();
			let parent = self.current_mut()?;
			parent.children.push(shell);
			let index = parent.children.len() - 1;
			self.source_chain.push(branch[level]);
			self.destination_chain.push(index);
			self.levels.push(Level {
				prunable: level + 1 >= self.prune_floor,
				..Level::default()
			});
		}
		self.assert_chains();

		Ok(())
	}

	fn pop(&mut self) -> DocweaveResult<()> {
		let (Some(_), Some(index), Some(level)) = (
			self.source_chain.pop(),
			self.destination_chain.pop(),
			self.levels.pop(),
		) else {
			return Ok(());
		};

		let parent = self.current_mut()?;
		if let Some(element) = parent.children.get_mut(index) {
			prune(element, &level.bare);
		}

		let is_empty = !level.settled && level.prunable && !level.furnished;
		match (self.levels.last_mut(), is_empty) {
			(Some(parent), true) => parent.bare.push(index),
			(Some(parent), false) => parent.furnished = true,
			(None, true) => self.bare.push(index),
			(None, false) => {}
		}

		Ok(())
	}
}

/// Remove the empty children at the ascending `bare` indices. The first one
/// stays when `element` holds nothing else.
fn prune(element: &mut Element, bare: &[usize]) {
	let keep = usize::from(bare.len() == element.children.len());
	for index in bare.iter().skip(keep).rev() {
		if *index < element.children.len() {
			let removed = element.children.remove(*index);
			trace!(element = removed.name, "removed provisional element");
		}
	}
}
