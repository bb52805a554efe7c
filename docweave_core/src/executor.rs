use std::collections::BTreeSet;

use tracing::debug;
use tracing::trace;

use crate::Boundaries;
use crate::DocweaveError;
use crate::DocweaveResult;
use crate::Element;
use crate::ElementPointer;
use crate::TreeBuilder;
use crate::common_prefix;
use crate::format::DocumentFormat;
use crate::make_ending_range;
use crate::make_opening_range;
use crate::straighten::atom_path;

/// Text collected for the destination leaf that is currently open.
#[derive(Debug, Default)]
struct OpenLeaf {
	chunks: Vec<String>,
	is_dynamic: bool,
}

/// Reconstruction state over a rendered tape.
struct Enforcer<'a, 'b> {
	root: &'a Element,
	boundaries: &'b Boundaries,
	format: &'a dyn DocumentFormat,
	builder: TreeBuilder<'a>,
	/// Index of the leaf the builder currently stands on; `0` before the first.
	structural: usize,
	/// Greatest index seen since the builder last moved onto a leaf.
	reach: usize,
	last_seen: Option<(usize, usize)>,
	/// Positions of the dropped entries, the tags of loops among them.
	discarded: BTreeSet<(usize, usize)>,
	/// Set to the position the tape jumped back to when a loop started
	/// another iteration.
	restart: Option<(usize, usize)>,
	leaf: Option<OpenLeaf>,
}

/// Rebuild a destination tree from `root` and the rendered `line`.
///
/// Constant entries copy their leaf verbatim, dynamic entries copy the leaf
/// and rewrite its text through the format's text processor. Dynamic entries
/// without text mark content the template dropped. A position behind the
/// previous one starts a new loop iteration and materializes fresh copies.
pub fn enforce(
	root: &Element,
	line: &[(ElementPointer, String)],
	boundaries: &Boundaries,
	format: &dyn DocumentFormat,
) -> DocweaveResult<Element> {
	let mut enforcer = Enforcer {
		root,
		boundaries,
		format,
		builder: TreeBuilder::with_format(root, format),
		structural: 0,
		reach: 0,
		last_seen: None,
		discarded: BTreeSet::new(),
		restart: None,
		leaf: None,
	};

	for (pointer, text) in line {
		enforcer.step(pointer, text)?;
	}

	enforcer.flush()?;
	let last = boundaries.last();
	enforcer.advance(last)?;
	debug!(entries = line.len(), "enforced tape");

	enforcer.builder.finish()
}

impl Enforcer<'_, '_> {
	fn step(&mut self, pointer: &ElementPointer, text: &str) -> DocweaveResult<()> {
		let position = pointer.position();
		let index = pointer.index;
		if self.last_seen.is_some_and(|last| position < last) {
			self.restart = Some(position);
		}
		self.last_seen = Some(position);

		if !pointer.is_constant && text.is_empty() {
			trace!(%pointer, "discarded");
			self.discarded.insert(position);
			self.reach = self.reach.max(index);
			return Ok(());
		}

		if let Some(restart) = self.restart.take() {
			let is_inline = self.leaf.is_some() && index == self.structural && self.reach == index;
			if index > self.reach {
				// The last iteration dropped everything, the loop is over.
				self.flush()?;
				self.advance(index)?;
				self.open(index)?;
			} else if !is_inline {
				self.reenter(restart, index)?;
			}
		} else if index > self.structural {
			self.flush()?;
			self.advance(index)?;
			self.open(index)?;
		} else if index < self.structural || self.leaf.is_none() {
			return Err(DocweaveError::UnexpectedTapeMove {
				from: self.boundaries.leaf(self.structural)?.clone(),
				to: pointer.path.clone(),
			});
		}

		trace!(%pointer, text, "present");
		self.reach = self.reach.max(index);
		if let Some(leaf) = self.leaf.as_mut() {
			leaf.chunks.push(text.to_string());
			leaf.is_dynamic |= !pointer.is_constant;
		}

		Ok(())
	}

	/// Apply every boundary after the current leaf up to and including
	/// `index` without copying any leaf.
	fn advance(&mut self, index: usize) -> DocweaveResult<()> {
		let boundaries = self.boundaries;
		for key in self.structural + 1..=index {
			self.set_prune_floor(key)?;
			self.builder.copy(boundaries.get(key)?.routes())?;
			self.skip(key, index)?;
		}
		self.structural = self.structural.max(index);
		Ok(())
	}

	/// Copy the ancestors of a leaf passed on the way to `target` down to its
	/// atom, so containers whose content was all dropped keep a place.
	fn skip(&mut self, key: usize, target: usize) -> DocweaveResult<()> {
		if key >= target || key >= self.boundaries.last() {
			return Ok(());
		}
		let boundaries = self.boundaries;
		let path = boundaries.leaf(key)?;
		let floor = self.atom_floor(key)?;
		self.builder.descend(&path[..floor.min(path.len())])
	}

	/// Let the builder prune empty copies from the atom holding the leaf the
	/// boundary `key` leads to; the closing boundary uses the last leaf.
	fn set_prune_floor(&mut self, key: usize) -> DocweaveResult<()> {
		let index = key.min(self.boundaries.last() - 1);
		let floor = if index == 0 {
			usize::MAX
		} else {
			self.atom_floor(index)?
		};
		self.builder.set_prune_floor(floor);
		Ok(())
	}

	/// Depth of the atom holding the leaf with `index`.
	fn atom_floor(&self, index: usize) -> DocweaveResult<usize> {
		let path = self.boundaries.leaf(index)?;
		for length in 1..=path.len() {
			let element = self.root.find(&path[..length])?;
			if let Some(depth) = self.format.atom_depth(&element.tag) {
				return Ok(atom_path(&path[..length], depth).len());
			}
		}
		Ok(path.len())
	}

	fn open(&mut self, index: usize) -> DocweaveResult<()> {
		let path = self.boundaries.leaf(index)?;
		self.builder.copy_leaf(path)?;
		self.structural = index;
		self.reach = index;
		self.leaf = Some(OpenLeaf::default());
		Ok(())
	}

	/// Start another loop iteration at the leaf with `index`. The previous
	/// iteration is finished at the furthest leaf it reached.
	///
	/// The body of the loop starts behind its tag, the last entry dropped
	/// before `restart`. Everything between that tag's leaf and `index` is
	/// copied again except the rest of the tag's own ancestors. Without such a
	/// tag only the ancestors of the leaf are opened again.
	fn reenter(&mut self, restart: (usize, usize), index: usize) -> DocweaveResult<()> {
		self.flush()?;
		let exit = self.reach.max(self.structural);
		self.advance(exit)?;

		let boundaries = self.boundaries;
		let exit_path = boundaries.leaf(exit)?;
		let path = boundaries.leaf(index)?;
		let head = self
			.discarded
			.range(..restart)
			.next_back()
			.map(|(head, _)| *head)
			.filter(|head| *head < index);

		let Some(head) = head else {
			let common = common_prefix(exit_path, path);
			trace!(exit, index, common, "re-entering loop body");
			self.set_prune_floor(index)?;
			self.builder
				.copy(&make_ending_range(self.root, exit_path, common + 1)?)?;
			self.builder.rewind(common)?;
			self.builder.copy(&make_opening_range(path, common + 1))?;
			return self.open(index);
		};

		let common = common_prefix(exit_path, boundaries.leaf(head)?);
		trace!(exit, head, index, common, "re-entering loop body");
		self.set_prune_floor(index)?;
		self.builder
			.copy(&make_ending_range(self.root, exit_path, common + 1)?)?;
		self.builder.rewind(common)?;
		for key in head + 1..=index {
			self.set_prune_floor(key)?;
			let boundary = boundaries.get(key)?;
			if key == head + 1 {
				self.builder
					.copy(std::iter::once(&boundary.gap).chain(&boundary.opening))?;
			} else {
				self.builder.copy(boundary.routes())?;
			}
			self.skip(key, index)?;
		}
		self.open(index)
	}

	/// Write the buffered text of the open leaf.
	fn flush(&mut self) -> DocweaveResult<()> {
		let Some(leaf) = self.leaf.take() else {
			return Ok(());
		};
		if !leaf.is_dynamic {
			return Ok(());
		}

		let (parent, node) = self.builder.leaf_mut()?;
		let mut processor = self.format.processor(parent, node)?;
		for chunk in &leaf.chunks {
			processor.feed(chunk)?;
		}
		processor.close()
	}
}
