use crate::entry::EntryRef;
use crate::error::FsError;
use crate::tree::Tree;

// ── Constants ───────────────────────────────────────────────────────────────

pub const SEPARATOR: char = '/';
pub const PARENT_SEGMENT: &str = "..";
pub const CURRENT_SEGMENT: &str = ".";

// ── Limits ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsLimits {
	pub max_path_length: usize,
	pub max_path_depth: usize,
	pub max_name_length: usize,
}

impl Default for FsLimits {
	fn default() -> Self {
		Self {
			max_path_length: 1024,
			max_path_depth: 32,
			max_name_length: 255,
		}
	}
}

// ── Parsing ─────────────────────────────────────────────────────────────────

/// A path split into segments. `.` and empty segments are already dropped;
/// `..` segments are kept for the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath<'p> {
	pub absolute: bool,
	pub segments: Vec<&'p str>,
}

impl<'p> ParsedPath<'p> {
	pub fn is_empty(&self) -> bool {
		self.segments.is_empty()
	}

	/// Everything but the last segment, and the last segment.
	pub fn split_last(&self) -> Option<(&[&'p str], &'p str)> {
		let (last, init) = self.segments.split_last()?;
		Some((init, *last))
	}
}

/// Split `path` into segments and check it against `limits`.
pub fn parse_path<'p>(path: &'p str, limits: &FsLimits) -> Result<ParsedPath<'p>, FsError> {
	if path.len() > limits.max_path_length {
		return Err(FsError::InvalidPath(format!(
			"Path exceeds max length ({})",
			limits.max_path_length
		)));
	}

	let absolute = path.starts_with(SEPARATOR);
	let segments: Vec<&str> = path
		.trim_matches(SEPARATOR)
		.split(SEPARATOR)
		.filter(|s| !s.is_empty() && *s != CURRENT_SEGMENT)
		.collect();

	if segments.len() > limits.max_path_depth {
		return Err(FsError::InvalidPath(format!(
			"Path exceeds max depth ({})",
			limits.max_path_depth
		)));
	}
	for seg in &segments {
		if *seg == PARENT_SEGMENT {
			continue;
		}
		if let Some(err) = validate_segment(seg, limits.max_name_length) {
			return Err(FsError::InvalidPath(format!("{}: {}", err, path)));
		}
	}

	Ok(ParsedPath { absolute, segments })
}

/// Check if a path segment contains forbidden characters (control chars or backslash).
fn has_forbidden_chars(segment: &str) -> bool {
	segment.bytes().any(|b| b <= 0x1f || b == b'\\')
}

/// Validate a single path segment. Returns `Some(error_message)` if invalid.
pub fn validate_segment(segment: &str, max_name_length: usize) -> Option<String> {
	if segment.is_empty() {
		return Some("Path segment cannot be empty".to_string());
	}
	if segment.len() > max_name_length {
		return Some(format!(
			"Path segment exceeds max name length ({})",
			max_name_length
		));
	}
	if has_forbidden_chars(segment) {
		return Some("Path segment contains forbidden characters".to_string());
	}
	None
}

/// Validate a name about to be given to an entry.
pub fn validate_name(name: &str, limits: &FsLimits) -> Result<(), FsError> {
	if name == CURRENT_SEGMENT || name == PARENT_SEGMENT {
		return Err(FsError::InvalidPath(format!("Reserved name: {}", name)));
	}
	if name.contains(SEPARATOR) {
		return Err(FsError::InvalidPath(format!(
			"Name cannot contain '{}': {}",
			SEPARATOR, name
		)));
	}
	match validate_segment(name, limits.max_name_length) {
		Some(err) => Err(FsError::InvalidPath(err)),
		None => Ok(()),
	}
}

// ── Resolution ──────────────────────────────────────────────────────────────

/// Walks paths over a [`Tree`], relative to a cursor.
///
/// The cursor is a trail of folders from root (`cursor[0]` is root, the last
/// element is the current folder). Walks keep the same kind of trail, so `..`
/// always steps back the way a path came in, even through shared folders.
pub struct Resolver<'a> {
	tree: &'a Tree,
	cursor: &'a [EntryRef],
	limits: &'a FsLimits,
}

impl<'a> Resolver<'a> {
	pub fn new(tree: &'a Tree, cursor: &'a [EntryRef], limits: &'a FsLimits) -> Self {
		Self {
			tree,
			cursor,
			limits,
		}
	}

	/// Resolve `path` to the entry it names. Zero segments name the base
	/// folder itself.
	pub fn resolve_entry(&self, path: &str) -> Result<EntryRef, FsError> {
		let trail = self.resolve_trail(path)?;
		Ok(last_of(&trail))
	}

	/// Like [`Resolver::resolve_entry`], but returns the whole trail from
	/// root to the entry.
	pub fn resolve_trail(&self, path: &str) -> Result<Vec<EntryRef>, FsError> {
		let parsed = parse_path(path, self.limits)?;
		let mut walk = self.start(&parsed, path);
		let Some((init, last)) = parsed.split_last() else {
			return Ok(walk.trail);
		};

		walk.walk_all(init)?;
		if last == PARENT_SEGMENT {
			walk.ascend()?;
			return Ok(walk.trail);
		}
		let child = walk
			.current()
			.borrow()
			.as_folder()
			.and_then(|f| f.child(last).cloned());
		match child {
			Some(c) => {
				walk.trail.push(c);
				Ok(walk.trail)
			}
			None => Err(FsError::NotFound(format!("No such file or folder: {}", path))),
		}
	}

	/// Resolve `path` to a folder. Files yield `NotAFolder`.
	pub fn resolve_folder(&self, path: &str) -> Result<EntryRef, FsError> {
		let trail = self.resolve_folder_trail(path)?;
		Ok(last_of(&trail))
	}

	pub fn resolve_folder_trail(&self, path: &str) -> Result<Vec<EntryRef>, FsError> {
		let trail = self.resolve_trail(path)?;
		if !last_of(&trail).borrow().is_folder() {
			return Err(FsError::NotAFolder(format!("Not a folder: {}", path)));
		}
		Ok(trail)
	}

	/// Resolve every segment but the last to a folder and return it with the
	/// last segment, which must be a valid entry name.
	pub fn resolve_parent(&self, path: &str) -> Result<(EntryRef, String), FsError> {
		let parsed = parse_path(path, self.limits)?;
		let Some((init, last)) = parsed.split_last() else {
			return Err(FsError::InvalidPath(format!(
				"Path does not name an entry: '{}'",
				path
			)));
		};
		validate_name(last, self.limits)?;

		let mut walk = self.start(&parsed, path);
		walk.walk_all(init)?;
		Ok((walk.current(), last.to_string()))
	}

	fn start<'w>(&self, parsed: &ParsedPath<'_>, path: &'w str) -> Walk<'w> {
		let trail = if parsed.absolute || self.cursor.is_empty() {
			vec![self.tree.root().clone()]
		} else {
			self.cursor.to_vec()
		};
		Walk { path, trail }
	}
}

/// Last element of a trail. Trails built here always hold at least root.
fn last_of(trail: &[EntryRef]) -> EntryRef {
	trail[trail.len() - 1].clone()
}

/// Folders visited so far, starting at root.
struct Walk<'w> {
	path: &'w str,
	trail: Vec<EntryRef>,
}

impl Walk<'_> {
	fn current(&self) -> EntryRef {
		last_of(&self.trail)
	}

	fn walk_all(&mut self, segments: &[&str]) -> Result<(), FsError> {
		for seg in segments {
			if *seg == PARENT_SEGMENT {
				self.ascend()?;
			} else {
				self.descend(seg)?;
			}
		}
		Ok(())
	}

	fn ascend(&mut self) -> Result<(), FsError> {
		if self.trail.len() > 1 {
			self.trail.pop();
			return Ok(());
		}
		Err(FsError::AtRoot(format!(
			"Already at the root folder: '{}'",
			self.path
		)))
	}

	fn descend(&mut self, name: &str) -> Result<(), FsError> {
		let child = self
			.current()
			.borrow()
			.as_folder()
			.and_then(|f| f.child(name).cloned());
		match child {
			Some(c) if c.borrow().is_folder() => {
				self.trail.push(c);
				Ok(())
			}
			_ => Err(FsError::InvalidPath(format!(
				"'{}' does not exist or is not a folder",
				self.path
			))),
		}
	}
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
	use std::rc::Rc;

	use super::*;
	use crate::entry::Entry;

	fn limits() -> FsLimits {
		FsLimits::default()
	}

	/// root/a/b/c, root/a/notes.txt, root/d
	fn sample_tree() -> Tree {
		let tree = Tree::new();
		let a = Entry::new_folder();
		let b = Entry::new_folder();
		tree.attach(tree.root(), "a", a.clone()).unwrap();
		tree.attach(&a, "b", b.clone()).unwrap();
		tree.attach(&b, "c", Entry::new_folder()).unwrap();
		tree.attach(&a, "notes.txt", Entry::new_file("n")).unwrap();
		tree.attach(tree.root(), "d", Entry::new_folder()).unwrap();
		tree
	}

	/// Trail from root to the folder at absolute `path`.
	fn trail_at(tree: &Tree, path: &str) -> Vec<EntryRef> {
		let limits = limits();
		Resolver::new(tree, &[], &limits)
			.resolve_folder_trail(path)
			.unwrap()
	}

	// ── parse_path ──────────────────────────────────────────────────────────

	#[test]
	fn parse_absolute_and_relative() {
		let p = parse_path("/a/b", &limits()).unwrap();
		assert!(p.absolute);
		assert_eq!(p.segments, vec!["a", "b"]);

		let p = parse_path("a/b/", &limits()).unwrap();
		assert!(!p.absolute);
		assert_eq!(p.segments, vec!["a", "b"]);
	}

	#[test]
	fn parse_empty_and_all_slashes_have_no_segments() {
		assert!(parse_path("", &limits()).unwrap().is_empty());
		let p = parse_path("///", &limits()).unwrap();
		assert!(p.absolute);
		assert!(p.is_empty());
	}

	#[test]
	fn parse_skips_dot_and_empty_segments() {
		let p = parse_path("a//./b/..", &limits()).unwrap();
		assert_eq!(p.segments, vec!["a", "b", ".."]);
	}

	#[test]
	fn parse_rejects_forbidden_chars() {
		let err = parse_path("a/b\\c", &limits()).unwrap_err();
		assert!(matches!(err, FsError::InvalidPath(_)));
		let err = parse_path("a/\u{7}", &limits()).unwrap_err();
		assert!(matches!(err, FsError::InvalidPath(_)));
	}

	#[test]
	fn parse_enforces_limits() {
		let tight = FsLimits {
			max_path_length: 10,
			max_path_depth: 2,
			max_name_length: 3,
		};
		assert!(parse_path("a/b", &tight).is_ok());
		assert!(matches!(
			parse_path("a/b/c", &tight).unwrap_err(),
			FsError::InvalidPath(_)
		));
		assert!(matches!(
			parse_path("abcd", &tight).unwrap_err(),
			FsError::InvalidPath(_)
		));
		assert!(matches!(
			parse_path("/aaaaaaaaaaaa", &tight).unwrap_err(),
			FsError::InvalidPath(_)
		));
	}

	// ── validate_name ───────────────────────────────────────────────────────

	#[test]
	fn validate_name_rules() {
		let l = limits();
		assert!(validate_name("readme.txt", &l).is_ok());
		assert!(validate_name(".hidden", &l).is_ok());
		for bad in ["", ".", "..", "a/b", "tab\there"] {
			assert!(
				matches!(validate_name(bad, &l), Err(FsError::InvalidPath(_))),
				"{bad:?} should be rejected"
			);
		}
		let long = "x".repeat(256);
		assert!(validate_name(&long, &l).is_err());
	}

	// ── resolve_entry ───────────────────────────────────────────────────────

	#[test]
	fn empty_path_is_the_base() {
		let tree = sample_tree();
		let a = trail_at(&tree, "/a");
		let l = limits();
		let r = Resolver::new(&tree, &a, &l);
		assert!(Rc::ptr_eq(&r.resolve_entry("").unwrap(), &last_of(&a)));
		assert!(Rc::ptr_eq(&r.resolve_entry("/").unwrap(), tree.root()));
	}

	#[test]
	fn absolute_ignores_cursor() {
		let tree = sample_tree();
		let b = trail_at(&tree, "/a/b");
		let l = limits();
		let r = Resolver::new(&tree, &b, &l);
		let d = r.resolve_entry("/d").unwrap();
		assert_eq!(tree.full_path(&d), "root/d");
	}

	#[test]
	fn relative_starts_at_cursor() {
		let tree = sample_tree();
		let a = trail_at(&tree, "/a");
		let l = limits();
		let r = Resolver::new(&tree, &a, &l);
		let c = r.resolve_entry("b/c").unwrap();
		assert_eq!(tree.full_path(&c), "root/a/b/c");
		let notes = r.resolve_entry("notes.txt").unwrap();
		assert!(notes.borrow().is_file());
	}

	#[test]
	fn dot_dot_ascends_from_deep_cursor() {
		let tree = sample_tree();
		let c = trail_at(&tree, "/a/b/c");
		let l = limits();
		let r = Resolver::new(&tree, &c, &l);
		assert_eq!(tree.full_path(&r.resolve_entry("..").unwrap()), "root/a/b");
		assert_eq!(tree.full_path(&r.resolve_entry("../..").unwrap()), "root/a");
		assert_eq!(tree.full_path(&r.resolve_entry("../../..").unwrap()), "root");
		assert_eq!(
			tree.full_path(&r.resolve_entry("../../../d").unwrap()),
			"root/d"
		);
	}

	#[test]
	fn dot_dot_inside_a_walk_returns_along_trail() {
		let tree = sample_tree();
		let root = vec![tree.root().clone()];
		let l = limits();
		let r = Resolver::new(&tree, &root, &l);
		let e = r.resolve_entry("a/b/../notes.txt").unwrap();
		assert!(e.borrow().is_file());
	}

	#[test]
	fn dot_dot_past_root_is_at_root() {
		let tree = sample_tree();
		let root = vec![tree.root().clone()];
		let l = limits();
		let r = Resolver::new(&tree, &root, &l);
		assert!(matches!(r.resolve_entry("..").unwrap_err(), FsError::AtRoot(_)));
		assert!(matches!(
			r.resolve_entry("a/../../d").unwrap_err(),
			FsError::AtRoot(_)
		));
	}

	#[test]
	fn missing_last_segment_is_not_found() {
		let tree = sample_tree();
		let root = vec![tree.root().clone()];
		let l = limits();
		let r = Resolver::new(&tree, &root, &l);
		assert!(matches!(
			r.resolve_entry("a/nope").unwrap_err(),
			FsError::NotFound(_)
		));
	}

	#[test]
	fn missing_or_file_intermediate_is_invalid_path() {
		let tree = sample_tree();
		let root = vec![tree.root().clone()];
		let l = limits();
		let r = Resolver::new(&tree, &root, &l);
		assert!(matches!(
			r.resolve_entry("x/b").unwrap_err(),
			FsError::InvalidPath(_)
		));
		assert!(matches!(
			r.resolve_entry("a/notes.txt/more").unwrap_err(),
			FsError::InvalidPath(_)
		));
	}

	#[test]
	fn resolve_folder_rejects_files() {
		let tree = sample_tree();
		let root = vec![tree.root().clone()];
		let l = limits();
		let r = Resolver::new(&tree, &root, &l);
		assert!(matches!(
			r.resolve_folder("a/notes.txt").unwrap_err(),
			FsError::NotAFolder(_)
		));
	}

	// ── resolve_parent ──────────────────────────────────────────────────────

	#[test]
	fn resolve_parent_returns_unresolved_leaf() {
		let tree = sample_tree();
		let root = vec![tree.root().clone()];
		let l = limits();
		let r = Resolver::new(&tree, &root, &l);
		let (parent, name) = r.resolve_parent("/a/b/new.txt").unwrap();
		assert_eq!(tree.full_path(&parent), "root/a/b");
		assert_eq!(name, "new.txt");
	}

	#[test]
	fn resolve_parent_of_single_segment_is_base() {
		let tree = sample_tree();
		let a = trail_at(&tree, "/a");
		let l = limits();
		let r = Resolver::new(&tree, &a, &l);
		let (parent, name) = r.resolve_parent("fresh").unwrap();
		assert!(Rc::ptr_eq(&parent, &last_of(&a)));
		assert_eq!(name, "fresh");
	}

	#[test]
	fn resolve_parent_needs_a_name() {
		let tree = sample_tree();
		let root = vec![tree.root().clone()];
		let l = limits();
		let r = Resolver::new(&tree, &root, &l);
		for bad in ["", "/", "a/..", "./.."] {
			assert!(
				matches!(r.resolve_parent(bad), Err(FsError::InvalidPath(_))),
				"{bad:?} should be rejected"
			);
		}
	}

	#[test]
	fn resolve_parent_with_bad_intermediate() {
		let tree = sample_tree();
		let root = vec![tree.root().clone()];
		let l = limits();
		let r = Resolver::new(&tree, &root, &l);
		assert!(matches!(
			r.resolve_parent("missing/child").unwrap_err(),
			FsError::InvalidPath(_)
		));
		assert!(matches!(
			r.resolve_parent("a/notes.txt/child").unwrap_err(),
			FsError::InvalidPath(_)
		));
	}
	// ── shared folders ──────────────────────────────────────────────────────

	/// root/a/x and root/b sharing `x` through a shallow copy of `a`.
	fn shared_tree() -> Tree {
		let tree = Tree::new();
		let a = Entry::new_folder();
		tree.attach(tree.root(), "a", a.clone()).unwrap();
		tree.attach(&a, "x", Entry::new_folder()).unwrap();
		let copy = a.borrow().copy_of();
		tree.attach(tree.root(), "b", copy).unwrap();
		tree
	}

	#[test]
	fn trail_records_the_route_through_a_shared_folder() {
		let tree = shared_tree();
		let x = trail_at(&tree, "/b/x");
		assert_eq!(tree.trail_path(&x), "root/b/x");

		let l = limits();
		let r = Resolver::new(&tree, &x, &l);
		let up = r.resolve_folder_trail("..").unwrap();
		assert_eq!(tree.trail_path(&up), "root/b");
		let sibling_route = r.resolve_trail("../../a/x").unwrap();
		assert_eq!(tree.trail_path(&sibling_route), "root/a/x");
		assert!(Rc::ptr_eq(&last_of(&sibling_route), &last_of(&x)));
	}

	#[test]
	fn resolve_trail_ends_at_files_too() {
		let tree = sample_tree();
		let l = limits();
		let r = Resolver::new(&tree, &[], &l);
		let trail = r.resolve_trail("/a/notes.txt").unwrap();
		assert_eq!(trail.len(), 3);
		assert_eq!(tree.trail_path(&trail), "root/a/notes.txt");
		assert!(matches!(
			r.resolve_folder_trail("/a/notes.txt").unwrap_err(),
			FsError::NotAFolder(_)
		));
	}
}
