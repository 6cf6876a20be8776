// ---------------------------------------------------------------------------
// Tree: the folder hierarchy rooted at "root"
// ---------------------------------------------------------------------------

use std::rc::Rc;

use crate::entry::{Entry, EntryRef};
use crate::error::FsError;

pub const ROOT_NAME: &str = "root";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeCounts {
	pub file_count: usize,
	pub folder_count: usize,
}

/// Owns the root folder and every entry reachable from it.
///
/// All structural mutation goes through [`Tree::attach`] and
/// [`Tree::detach`], which keep sibling names unique and parent
/// back-references in step with ownership.
#[derive(Debug)]
pub struct Tree {
	root: EntryRef,
}

impl Default for Tree {
	fn default() -> Self {
		Self::new()
	}
}

impl Tree {
	pub fn new() -> Self {
		Self {
			root: Entry::new_folder(),
		}
	}

	pub fn root(&self) -> &EntryRef {
		&self.root
	}

	pub fn is_root(&self, entry: &EntryRef) -> bool {
		Rc::ptr_eq(&self.root, entry)
	}

	// -- Attach / detach --------------------------------------------------

	/// Checks everything `attach` would check, without mutating.
	pub fn check_attach(
		&self,
		folder: &EntryRef,
		name: &str,
		entry: &EntryRef,
	) -> Result<(), FsError> {
		let taken = folder.borrow().as_folder().map(|f| f.contains(name));
		match taken {
			None => return Err(FsError::NotAFolder(self.full_path(folder))),
			Some(true) => {
				return Err(FsError::AlreadyExists(self.child_path(folder, name)));
			}
			Some(false) => {}
		}
		if self.is_root(entry) || Self::reaches(entry, folder) {
			return Err(FsError::InvalidOperation(format!(
				"Cannot place a folder inside its own subtree: {}",
				self.child_path(folder, name)
			)));
		}
		Ok(())
	}

	/// Links `entry` into `folder` under `name` and points the entry's parent
	/// back-reference at `folder`.
	pub fn attach(&self, folder: &EntryRef, name: &str, entry: EntryRef) -> Result<(), FsError> {
		self.check_attach(folder, name, &entry)?;

		if let Some(child) = entry.borrow_mut().as_folder_mut() {
			child.set_parent(Rc::downgrade(folder));
		}
		if let Some(f) = folder.borrow_mut().as_folder_mut() {
			f.add(name, entry);
		}
		Ok(())
	}

	/// Unlinks `name` from `folder`. Absent names are a no-op.
	///
	/// The detached folder's back-reference is cleared only if it still names
	/// `folder`; a folder shared through a shallow copy keeps pointing at its
	/// other owner.
	pub fn detach(&self, folder: &EntryRef, name: &str) -> Option<EntryRef> {
		let removed = folder.borrow_mut().as_folder_mut()?.remove(name)?;

		if let Some(child) = removed.borrow_mut().as_folder_mut() {
			let points_here = child
				.parent()
				.is_some_and(|p| Rc::ptr_eq(&p, folder));
			if points_here {
				child.clear_parent();
			}
		}
		Some(removed)
	}

	// -- Ancestry ---------------------------------------------------------

	/// The attached folder currently holding `entry`, or `None` for root and
	/// for detached entries.
	///
	/// The stored back-reference is trusted only while that folder still
	/// links the entry and is itself attached. Otherwise the tree is scanned
	/// from root and the back-reference is repaired.
	pub fn parent_of(&self, entry: &EntryRef) -> Option<EntryRef> {
		if self.is_root(entry) {
			return None;
		}

		let recorded = entry.borrow().as_folder().and_then(|f| f.parent());
		if let Some(parent) = recorded {
			if Self::links(&parent, entry) && self.recorded_chain_is_live(&parent) {
				return Some(parent);
			}
		}

		let found = Self::find_container(&self.root, entry)?;
		if let Some(f) = entry.borrow_mut().as_folder_mut() {
			tracing::debug!("Repaired parent back-reference");
			f.set_parent(Rc::downgrade(&found));
		}
		Some(found)
	}

	/// Follows recorded back-references up from `folder` without repairing
	/// them. True only if every step is a live link and the chain ends at
	/// root.
	fn recorded_chain_is_live(&self, folder: &EntryRef) -> bool {
		let mut current = folder.clone();
		loop {
			if self.is_root(&current) {
				return true;
			}
			let parent = current.borrow().as_folder().and_then(|f| f.parent());
			match parent {
				Some(p) if Self::links(&p, &current) => current = p,
				_ => return false,
			}
		}
	}

	/// Full path of an attached entry, e.g. `root/docs/readme.txt`.
	pub fn full_path(&self, entry: &EntryRef) -> String {
		let mut parts: Vec<String> = Vec::new();
		let mut current = entry.clone();
		while let Some(parent) = self.parent_of(&current) {
			parts.push(Self::link_name(&parent, &current).unwrap_or_default());
			current = parent;
		}
		parts.push(ROOT_NAME.to_string());
		parts.reverse();
		parts.join("/")
	}

	/// Full path spelled by a trail of links from root, e.g. `root/b/x`.
	/// Unlike [`Tree::full_path`] it names the route actually taken, which
	/// matters once a folder is shared.
	pub fn trail_path(&self, trail: &[EntryRef]) -> String {
		let mut path = ROOT_NAME.to_string();
		for pair in trail.windows(2) {
			path.push('/');
			path.push_str(&Self::link_name(&pair[0], &pair[1]).unwrap_or_default());
		}
		path
	}

	/// Whether `trail` starts at root and every step is still a live link.
	pub fn trail_holds(&self, trail: &[EntryRef]) -> bool {
		self.held_prefix(trail) == trail.len()
	}

	/// Length of the longest prefix of `trail` that starts at root and whose
	/// links all still hold. Zero if the trail does not start at root.
	pub fn held_prefix(&self, trail: &[EntryRef]) -> usize {
		match trail.first() {
			Some(first) if self.is_root(first) => {}
			_ => return 0,
		}
		1 + trail
			.windows(2)
			.take_while(|pair| Self::links(&pair[0], &pair[1]))
			.count()
	}

	/// A trail of links from root down to `entry`, found depth-first.
	pub fn trail_to(&self, entry: &EntryRef) -> Option<Vec<EntryRef>> {
		let mut trail = vec![self.root.clone()];
		if Self::extend_trail(&mut trail, entry) {
			Some(trail)
		} else {
			None
		}
	}

	fn extend_trail(trail: &mut Vec<EntryRef>, entry: &EntryRef) -> bool {
		let Some(last) = trail.last().cloned() else {
			return false;
		};
		if Rc::ptr_eq(&last, entry) {
			return true;
		}
		let children: Vec<EntryRef> = match last.borrow().as_folder() {
			Some(f) => f.children().map(|(_, c)| c.clone()).collect(),
			None => return false,
		};
		for child in children {
			trail.push(child);
			if Self::extend_trail(trail, entry) {
				return true;
			}
			trail.pop();
		}
		false
	}

	/// Full path of a (possibly not yet existing) child `name` of `folder`.
	pub fn child_path(&self, folder: &EntryRef, name: &str) -> String {
		format!("{}/{}", self.full_path(folder), name)
	}

	/// Whether `target` is `from` itself or lies anywhere below it.
	pub fn reaches(from: &EntryRef, target: &EntryRef) -> bool {
		if Rc::ptr_eq(from, target) {
			return true;
		}
		match from.borrow().as_folder() {
			Some(f) => f.children().any(|(_, child)| Self::reaches(child, target)),
			None => false,
		}
	}

	/// Files and folders reachable from root, counting each link once.
	/// Root itself counts as a folder.
	pub fn counts(&self) -> TreeCounts {
		let mut counts = TreeCounts::default();
		Self::count_into(&self.root, &mut counts);
		counts
	}

	fn count_into(entry: &EntryRef, counts: &mut TreeCounts) {
		match &*entry.borrow() {
			Entry::File(_) => counts.file_count += 1,
			Entry::Folder(f) => {
				counts.folder_count += 1;
				for (_, child) in f.children() {
					Self::count_into(child, counts);
				}
			}
		}
	}

	fn links(folder: &EntryRef, entry: &EntryRef) -> bool {
		folder
			.borrow()
			.as_folder()
			.is_some_and(|f| f.name_of(entry).is_some())
	}

	fn link_name(folder: &EntryRef, entry: &EntryRef) -> Option<String> {
		folder
			.borrow()
			.as_folder()
			.and_then(|f| f.name_of(entry))
			.map(str::to_string)
	}

	fn find_container(from: &EntryRef, entry: &EntryRef) -> Option<EntryRef> {
		let guard = from.borrow();
		let folder = guard.as_folder()?;
		for (_, child) in folder.children() {
			if Rc::ptr_eq(child, entry) {
				return Some(from.clone());
			}
		}
		for (_, child) in folder.children() {
			if let Some(found) = Self::find_container(child, entry) {
				return Some(found);
			}
		}
		None
	}
}
