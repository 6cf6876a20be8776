// ---------------------------------------------------------------------------
// Entry: the File | Folder node type
// ---------------------------------------------------------------------------

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::error::FsError;

/// Shared handle to a node. Folders own their children through these handles;
/// a shallow folder copy makes two folders hold the same handle.
pub type EntryRef = Rc<RefCell<Entry>>;

/// Non-owning handle used for parent back-references.
pub type WeakEntryRef = Weak<RefCell<Entry>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
	File,
	Folder,
}

impl EntryKind {
	pub fn as_str(&self) -> &str {
		match self {
			Self::File => "file",
			Self::Folder => "folder",
		}
	}
}

#[derive(Debug, PartialEq)]
pub enum Entry {
	File(File),
	Folder(Folder),
}

impl Entry {
	pub fn new_file(content: &str) -> EntryRef {
		Rc::new(RefCell::new(Self::File(File::new(content))))
	}

	pub fn new_folder() -> EntryRef {
		Rc::new(RefCell::new(Self::Folder(Folder::default())))
	}

	pub fn kind(&self) -> EntryKind {
		match self {
			Self::File(_) => EntryKind::File,
			Self::Folder(_) => EntryKind::Folder,
		}
	}

	pub fn is_file(&self) -> bool {
		matches!(self, Self::File(_))
	}

	pub fn is_folder(&self) -> bool {
		matches!(self, Self::Folder(_))
	}

	pub fn as_file(&self) -> Option<&File> {
		match self {
			Self::File(f) => Some(f),
			Self::Folder(_) => None,
		}
	}

	pub fn as_file_mut(&mut self) -> Option<&mut File> {
		match self {
			Self::File(f) => Some(f),
			Self::Folder(_) => None,
		}
	}

	pub fn as_folder(&self) -> Option<&Folder> {
		match self {
			Self::Folder(f) => Some(f),
			Self::File(_) => None,
		}
	}

	pub fn as_folder_mut(&mut self) -> Option<&mut Folder> {
		match self {
			Self::Folder(f) => Some(f),
			Self::File(_) => None,
		}
	}

	/// Clone for `copy`: files get independent content, folders are shallow
	/// (the new folder links to the same child entries as the source).
	/// The copy is detached; its parent is set when it is attached.
	pub fn copy_of(&self) -> EntryRef {
		let copied = match self {
			Self::File(f) => Self::File(f.clone()),
			Self::Folder(f) => Self::Folder(f.shallow_copy()),
		};
		Rc::new(RefCell::new(copied))
	}
}

// ---------------------------------------------------------------------------
// File
// ---------------------------------------------------------------------------

/// File content, kept split into lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct File {
	lines: Vec<String>,
}

impl File {
	pub fn new(content: &str) -> Self {
		Self {
			lines: split_lines(content),
		}
	}

	/// Joins the stored lines with `\n`.
	pub fn read(&self) -> String {
		self.lines.join("\n")
	}

	/// Appends `content` as one new line.
	pub fn append(&mut self, content: &str) {
		self.lines.push(content.to_string());
	}

	/// Replaces the whole content.
	pub fn write(&mut self, content: &str) {
		self.lines = split_lines(content);
	}

	pub fn lines(&self) -> &[String] {
		&self.lines
	}
}

fn split_lines(content: &str) -> Vec<String> {
	content.lines().map(str::to_string).collect()
}

// ---------------------------------------------------------------------------
// Folder
// ---------------------------------------------------------------------------

/// Ordered name → entry links plus a back-reference to the containing folder.
///
/// `add` is the raw insert and replaces an existing link of the same name;
/// uniqueness is enforced one level up, in [`crate::tree::Tree::attach`].
#[derive(Debug, Default)]
pub struct Folder {
	children: Vec<(String, EntryRef)>,
	parent: WeakEntryRef,
}

impl PartialEq for Folder {
	/// Structural equality: same names, same order, equal entries.
	fn eq(&self, other: &Self) -> bool {
		self.children == other.children
	}
}

impl Folder {
	pub fn add(&mut self, name: impl Into<String>, entry: EntryRef) {
		let name = name.into();
		match self.children.iter_mut().find(|(n, _)| *n == name) {
			Some(slot) => slot.1 = entry,
			None => self.children.push((name, entry)),
		}
	}

	/// Removes the link named `name`. Absent names are ignored.
	pub fn remove(&mut self, name: &str) -> Option<EntryRef> {
		let idx = self.children.iter().position(|(n, _)| n == name)?;
		Some(self.children.remove(idx).1)
	}

	pub fn get(&self, name: &str) -> Result<EntryRef, FsError> {
		self.child(name)
			.cloned()
			.ok_or_else(|| FsError::NotFound(format!("Item not found: {}", name)))
	}

	pub fn child(&self, name: &str) -> Option<&EntryRef> {
		self.children
			.iter()
			.find(|(n, _)| n == name)
			.map(|(_, e)| e)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.child(name).is_some()
	}

	pub fn list_names(&self) -> Vec<String> {
		self.children.iter().map(|(n, _)| n.clone()).collect()
	}

	pub fn children(&self) -> impl Iterator<Item = (&str, &EntryRef)> {
		self.children.iter().map(|(n, e)| (n.as_str(), e))
	}

	pub fn len(&self) -> usize {
		self.children.len()
	}

	pub fn is_empty(&self) -> bool {
		self.children.is_empty()
	}

	/// Name under which this folder links `entry` (pointer identity).
	pub fn name_of(&self, entry: &EntryRef) -> Option<&str> {
		self.children
			.iter()
			.find(|(_, e)| Rc::ptr_eq(e, entry))
			.map(|(n, _)| n.as_str())
	}

	/// The recorded containing folder, if it is still alive.
	pub fn parent(&self) -> Option<EntryRef> {
		self.parent.upgrade()
	}

	pub fn set_parent(&mut self, parent: WeakEntryRef) {
		self.parent = parent;
	}

	pub fn clear_parent(&mut self) {
		self.parent = Weak::new();
	}

	pub fn shallow_copy(&self) -> Self {
		Self {
			children: self.children.clone(),
			parent: Weak::new(),
		}
	}
}
