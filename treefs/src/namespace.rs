// ---------------------------------------------------------------------------
// Namespace: cursor plus the public file system operations
// ---------------------------------------------------------------------------

use std::rc::Rc;

use crate::entry::{Entry, EntryKind, EntryRef, File};
use crate::error::FsError;
use crate::path::{validate_name, FsLimits, Resolver};
use crate::search::{search_subtree, SearchMode};
use crate::tree::Tree;

// ---------------------------------------------------------------------------
// Public result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatResult {
	pub path: String,
	pub kind: EntryKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsResult {
	pub file_count: usize,
	pub folder_count: usize,
}

// ---------------------------------------------------------------------------
// Namespace
// ---------------------------------------------------------------------------

/// An in-memory folder/file namespace with a current-folder cursor.
///
/// Relative paths resolve from the cursor, paths with a leading `/` from
/// root. Every operation either completes or leaves the namespace untouched.
///
/// Folder copies are shallow: the new folder links to the same child entries
/// as the source, so changes made below one are visible below the other.
///
/// Not thread-safe (`!Send`). A service wrapping it must give it a single
/// owner and run one call at a time.
#[derive(Debug)]
pub struct Namespace {
	tree: Tree,
	/// Folders from root to the current folder, in the order they were
	/// entered. Never empty; `cursor[0]` is root.
	cursor: Vec<EntryRef>,
	limits: FsLimits,
}

impl Default for Namespace {
	fn default() -> Self {
		Self::new(FsLimits::default())
	}
}

impl Namespace {
	// -- Constructor ------------------------------------------------------

	pub fn new(limits: FsLimits) -> Self {
		let tree = Tree::new();
		let cursor = vec![tree.root().clone()];
		Self {
			tree,
			cursor,
			limits,
		}
	}

	pub fn limits(&self) -> &FsLimits {
		&self.limits
	}

	// -- Helpers (private) ------------------------------------------------

	fn resolver(&self) -> Resolver<'_> {
		Resolver::new(&self.tree, &self.cursor, &self.limits)
	}

	fn assert_not_root(&self, path: &str, action: &str) -> Result<(), FsError> {
		let is_root = self
			.resolver()
			.resolve_entry(path)
			.is_ok_and(|e| self.tree.is_root(&e));
		if is_root {
			return Err(FsError::InvalidOperation(format!(
				"Cannot {} the root folder",
				action
			)));
		}
		Ok(())
	}

	/// Resolve `path` to its containing folder and the existing entry it names.
	fn locate(&self, path: &str) -> Result<(EntryRef, String, EntryRef), FsError> {
		let (parent, name) = self.resolver().resolve_parent(path)?;
		let entry = parent
			.borrow()
			.as_folder()
			.and_then(|f| f.child(&name).cloned())
			.ok_or_else(|| FsError::NotFound(format!("No such file or folder: {}", path)))?;
		Ok((parent, name, entry))
	}

	/// Resolve `path` to a folder that must exist; a missing or non-folder
	/// target makes the whole path invalid.
	fn target_folder(&self, path: &str) -> Result<EntryRef, FsError> {
		let trail = self.target_trail(path)?;
		Ok(trail[trail.len() - 1].clone())
	}

	fn target_trail(&self, path: &str) -> Result<Vec<EntryRef>, FsError> {
		self.resolver().resolve_folder_trail(path).map_err(|e| match e {
			FsError::NotFound(_) | FsError::NotAFolder(_) => FsError::InvalidPath(format!(
				"'{}' does not exist or is not a folder",
				path
			)),
			other => other,
		})
	}

	fn with_file<T>(&self, path: &str, f: impl FnOnce(&mut File) -> T) -> Result<T, FsError> {
		let entry = self.resolver().resolve_entry(path)?;
		let mut guard = entry.borrow_mut();
		match guard.as_file_mut() {
			Some(file) => Ok(f(file)),
			None => Err(FsError::NotAFile(format!("Not a file: {}", path))),
		}
	}

	fn current_folder(&self) -> EntryRef {
		self.cursor[self.cursor.len() - 1].clone()
	}

	/// Re-anchor the cursor after a structural change. A trail whose links
	/// all still hold is kept. If the current folder is still in the tree by
	/// some other route, that route becomes the trail. Otherwise the cursor
	/// falls back to the deepest folder on its trail that is still linked.
	fn settle_cursor(&mut self) {
		if self.tree.trail_holds(&self.cursor) {
			return;
		}
		match self.tree.trail_to(&self.current_folder()) {
			Some(trail) => self.cursor = trail,
			None => {
				let held = self.tree.held_prefix(&self.cursor);
				self.cursor.truncate(held.max(1));
			}
		}
		tracing::debug!("Cursor moved to {}", self.current_path());
	}

	fn list_names(entry: &EntryRef) -> Vec<String> {
		entry
			.borrow()
			.as_folder()
			.map(|f| f.list_names())
			.unwrap_or_default()
	}

	// -- Navigation -------------------------------------------------------

	/// Move the cursor. On failure the cursor stays where it was.
	pub fn change_directory(&mut self, path: &str) -> Result<(), FsError> {
		self.cursor = self.target_trail(path)?;
		tracing::debug!("Changed directory to {}", self.current_path());
		Ok(())
	}

	/// Full path of the cursor, e.g. `root/docs`.
	pub fn current_path(&self) -> String {
		self.tree.trail_path(&self.cursor)
	}

	pub fn list_directory(&self) -> Vec<String> {
		Self::list_names(&self.current_folder())
	}

	pub fn list_directory_at(&self, path: &str) -> Result<Vec<String>, FsError> {
		let folder = self.resolver().resolve_folder(path)?;
		Ok(Self::list_names(&folder))
	}

	// -- Creation ---------------------------------------------------------

	/// Create an empty folder; the last segment of `path` is its name.
	pub fn create_folder(&mut self, path: &str) -> Result<(), FsError> {
		let (parent, name) = self.resolver().resolve_parent(path)?;
		self.tree.attach(&parent, &name, Entry::new_folder())?;
		tracing::debug!("Created folder {}", self.tree.child_path(&parent, &name));
		Ok(())
	}

	/// Create an empty folder called `name` inside the folder at `location`.
	pub fn create_folder_in(&mut self, location: &str, name: &str) -> Result<(), FsError> {
		validate_name(name, &self.limits)?;
		let parent = self.target_folder(location)?;
		self.tree.attach(&parent, name, Entry::new_folder())?;
		tracing::debug!("Created folder {}", self.tree.child_path(&parent, name));
		Ok(())
	}

	pub fn create_file(&mut self, path: &str, content: &str) -> Result<(), FsError> {
		let (parent, name) = self.resolver().resolve_parent(path)?;
		self.tree.attach(&parent, &name, Entry::new_file(content))?;
		tracing::debug!("Created file {}", self.tree.child_path(&parent, &name));
		Ok(())
	}

	// -- File content -----------------------------------------------------

	pub fn read_file(&self, path: &str) -> Result<String, FsError> {
		self.with_file(path, |f| f.read())
	}

	/// Append `line` as a new last line.
	pub fn append_file(&mut self, path: &str, line: &str) -> Result<(), FsError> {
		self.with_file(path, |f| f.append(line))
	}

	/// Replace the content of an existing file.
	pub fn write_file(&mut self, path: &str, content: &str) -> Result<(), FsError> {
		self.with_file(path, |f| f.write(content))
	}

	// -- Structural mutation ----------------------------------------------

	/// Remove the entry at `path`. Returns `false` if there was nothing to
	/// remove. If the cursor was inside the removed subtree and cannot be
	/// reached any other way, it moves to the folder the entry was removed
	/// from.
	pub fn delete(&mut self, path: &str) -> Result<bool, FsError> {
		self.assert_not_root(path, "delete")?;
		let (parent, name) = self.resolver().resolve_parent(path)?;
		let Some(removed) = self.tree.detach(&parent, &name) else {
			return Ok(false);
		};

		let kind = removed.borrow().kind();
		self.settle_cursor();
		tracing::debug!(
			"Deleted {} {}",
			kind.as_str(),
			self.tree.child_path(&parent, &name)
		);
		Ok(true)
	}

	/// Give the entry at `path` a new name within the same folder.
	pub fn rename(&mut self, path: &str, new_name: &str) -> Result<(), FsError> {
		self.assert_not_root(path, "rename")?;
		validate_name(new_name, &self.limits)?;
		let (parent, name, entry) = self.locate(path)?;
		if name == new_name {
			return Ok(());
		}

		self.tree.check_attach(&parent, new_name, &entry)?;
		self.tree.detach(&parent, &name);
		self.tree.attach(&parent, new_name, entry)?;
		self.settle_cursor();
		tracing::debug!(
			"Renamed {} to {}",
			self.tree.child_path(&parent, &name),
			new_name
		);
		Ok(())
	}

	/// Detach the entry at `src` and attach it at `dst`, whose last segment
	/// becomes its new name.
	pub fn move_entry(&mut self, src: &str, dst: &str) -> Result<(), FsError> {
		self.assert_not_root(src, "move")?;
		let (src_parent, src_name, entry) = self.locate(src)?;
		let (dst_parent, dst_name) = self.resolver().resolve_parent(dst)?;
		if Rc::ptr_eq(&src_parent, &dst_parent) && src_name == dst_name {
			return Ok(());
		}

		// Every check happens before the detach, so a failure changes nothing.
		self.tree.check_attach(&dst_parent, &dst_name, &entry)?;
		self.tree.detach(&src_parent, &src_name);
		self.tree.attach(&dst_parent, &dst_name, entry)?;
		self.settle_cursor();
		tracing::debug!(
			"Moved {} to {}",
			self.tree.child_path(&src_parent, &src_name),
			self.tree.child_path(&dst_parent, &dst_name)
		);
		Ok(())
	}

	/// Attach a copy of the entry at `src` at `dst`. Files are copied with
	/// their content; folders are copied shallowly.
	pub fn copy(&mut self, src: &str, dst: &str) -> Result<(), FsError> {
		let source = self.resolver().resolve_entry(src)?;
		let (dst_parent, dst_name) = self.resolver().resolve_parent(dst)?;
		let copied = source.borrow().copy_of();
		self.tree.attach(&dst_parent, &dst_name, copied)?;
		tracing::debug!(
			"Copied {} to {}",
			self.tree.full_path(&source),
			self.tree.child_path(&dst_parent, &dst_name)
		);
		Ok(())
	}

	// -- Queries ----------------------------------------------------------

	/// Full paths of every entry named `name` below the cursor.
	pub fn search(&self, name: &str) -> Vec<String> {
		self.search_from(&self.cursor, name, SearchMode::ExactName)
	}

	pub fn search_in(&self, folder: &str, name: &str) -> Result<Vec<String>, FsError> {
		let start = self.resolver().resolve_folder_trail(folder)?;
		Ok(self.search_from(&start, name, SearchMode::ExactName))
	}

	/// Full paths of every file below the cursor whose name ends with `ext`.
	pub fn search_by_extension(&self, ext: &str) -> Vec<String> {
		self.search_from(&self.cursor, ext, SearchMode::Extension)
	}

	pub fn search_by_extension_in(&self, folder: &str, ext: &str) -> Result<Vec<String>, FsError> {
		let start = self.resolver().resolve_folder_trail(folder)?;
		Ok(self.search_from(&start, ext, SearchMode::Extension))
	}

	fn search_from(&self, start: &[EntryRef], query: &str, mode: SearchMode) -> Vec<String> {
		let prefix = self.tree.trail_path(start);
		let folder = &start[start.len() - 1];
		let mut results = Vec::new();
		search_subtree(folder, &prefix, query, mode, &mut results);
		results
	}

	pub fn exists(&self, path: &str) -> bool {
		self.resolver().resolve_entry(path).is_ok()
	}

	/// Kind of the entry at `path` and its full path along the route the
	/// path took.
	pub fn stat(&self, path: &str) -> Result<StatResult, FsError> {
		let trail = self.resolver().resolve_trail(path)?;
		let kind = trail[trail.len() - 1].borrow().kind();
		Ok(StatResult {
			path: self.tree.trail_path(&trail),
			kind,
		})
	}

	#[cfg(test)]
	fn resolve(&self, path: &str) -> Result<EntryRef, FsError> {
		self.resolver().resolve_entry(path)
	}

	pub fn metrics(&self) -> MetricsResult {
		let counts = self.tree.counts();
		MetricsResult {
			file_count: counts.file_count,
			folder_count: counts.folder_count,
		}
	}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
