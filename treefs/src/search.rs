use crate::entry::{Entry, EntryRef};

/// How a query is matched against entry names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
	/// Files and folders whose name equals the query.
	ExactName,
	/// Files whose name ends with the query.
	Extension,
}

impl SearchMode {
	fn matches(&self, name: &str, entry: &Entry, query: &str) -> bool {
		match self {
			Self::ExactName => name == query,
			Self::Extension => entry.is_file() && name.ends_with(query),
		}
	}
}

/// Walk the subtree under `folder` depth-first (pre-order, children in
/// insertion order) and push the full path of every match into `results`.
///
/// - `prefix` is the full path of `folder` itself; result paths are built
///   from it, so they follow the searched folder's own ancestry.
/// - `folder` itself is never a match, only what lies below it.
pub fn search_subtree(
	folder: &EntryRef,
	prefix: &str,
	query: &str,
	mode: SearchMode,
	results: &mut Vec<String>,
) {
	let guard = folder.borrow();
	let Some(f) = guard.as_folder() else {
		return;
	};

	for (name, child) in f.children() {
		let path = format!("{}/{}", prefix, name);
		let is_folder = {
			let entry = child.borrow();
			if mode.matches(name, &entry, query) {
				results.push(path.clone());
			}
			entry.is_folder()
		};
		if is_folder {
			search_subtree(child, &path, query, mode, results);
		}
	}
}
