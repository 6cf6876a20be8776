// ---------------------------------------------------------------------------
// FsServer: JSON-RPC dispatcher
// ---------------------------------------------------------------------------
//
// Routes JSON-RPC 2.0 requests (NDJSON, one per line) to a single owned
// Namespace. Requests are handled strictly one after another, so the
// namespace never sees two callers at once.
// ---------------------------------------------------------------------------

use std::io::{self, BufRead, Write};

use serde_json::json;

use crate::error::FsError;
use crate::namespace::Namespace;
use crate::protocol::*;
use crate::transport::NdjsonTransport;

type HandlerResult = Result<serde_json::Value, FsError>;

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// JSON-RPC server that dispatches requests to a [`Namespace`].
pub struct FsServer<W: Write = io::Stdout> {
	transport: NdjsonTransport<W>,
	namespace: Option<Namespace>,
}

impl<W: Write> FsServer<W> {
	/// Create a new server with the given transport. The namespace is
	/// created when `initialize` is called.
	pub fn new(transport: NdjsonTransport<W>) -> Self {
		Self {
			transport,
			namespace: None,
		}
	}

	/// Main loop: read JSON-RPC messages from stdin, dispatch to handlers.
	pub fn run(&mut self) -> Result<(), FsError> {
		let stdin = io::stdin();
		self.serve(stdin.lock())
	}

	/// Handle every line of `reader` until it is exhausted.
	pub fn serve<R: BufRead>(&mut self, reader: R) -> Result<(), FsError> {
		for line_result in reader.lines() {
			let line = line_result?;
			let trimmed = line.trim();
			if trimmed.is_empty() {
				continue;
			}

			match serde_json::from_str::<JsonRpcRequest>(trimmed) {
				Ok(req) => self.dispatch(req)?,
				Err(e) => {
					tracing::warn!("Parse error: {}", e);
					self.transport
						.write_error(0, PARSE_ERROR, "Parse error: invalid JSON", None)?;
				}
			}
		}

		Ok(())
	}

	pub fn into_transport(self) -> NdjsonTransport<W> {
		self.transport
	}

	// -- Dispatch ---------------------------------------------------------

	fn dispatch(&mut self, req: JsonRpcRequest) -> Result<(), FsError> {
		let id = req.id;
		let params = req.params;
		let result = match req.method.as_str() {
			// -- Lifecycle -----------------------------------------------
			"initialize" => self.handle_initialize(params),

			// -- Navigation ----------------------------------------------
			"fs/changeDirectory" => self.with_fs_mut(|fs| handle_change_directory(fs, params)),
			"fs/currentPath" => self.with_fs(|fs| Ok(json!({ "path": fs.current_path() }))),
			"fs/listDirectory" => self.with_fs(|fs| handle_list_directory(fs, params)),

			// -- Creation and content ------------------------------------
			"fs/createFolder" => self.with_fs_mut(|fs| handle_create_folder(fs, params)),
			"fs/createFile" => self.with_fs_mut(|fs| handle_create_file(fs, params)),
			"fs/readFile" => self.with_fs(|fs| handle_read_file(fs, params)),
			"fs/appendFile" => self.with_fs_mut(|fs| handle_append_file(fs, params)),
			"fs/writeFile" => self.with_fs_mut(|fs| handle_write_file(fs, params)),

			// -- Structure -----------------------------------------------
			"fs/delete" => self.with_fs_mut(|fs| handle_delete(fs, params)),
			"fs/rename" => self.with_fs_mut(|fs| handle_rename(fs, params)),
			"fs/move" => self.with_fs_mut(|fs| handle_move(fs, params)),
			"fs/copy" => self.with_fs_mut(|fs| handle_copy(fs, params)),

			// -- Queries -------------------------------------------------
			"fs/search" => self.with_fs(|fs| handle_search(fs, params)),
			"fs/searchByExtension" => self.with_fs(|fs| handle_search_by_extension(fs, params)),
			"fs/exists" => self.with_fs(|fs| handle_exists(fs, params)),
			"fs/stat" => self.with_fs(|fs| handle_stat(fs, params)),
			"fs/metrics" => self.with_fs(|fs| {
				let m = fs.metrics();
				Ok(json!({ "fileCount": m.file_count, "folderCount": m.folder_count }))
			}),

			// -- Unknown -------------------------------------------------
			_ => {
				return self.transport.write_error(
					id,
					METHOD_NOT_FOUND,
					format!("Method not found: {}", req.method),
					None,
				);
			}
		};

		match result {
			Ok(value) => self.transport.write_response(id, value),
			Err(e @ FsError::Json(_)) => {
				self.transport
					.write_error(id, INVALID_PARAMS, e.to_string(), Some(e.to_json_rpc_error()))
			}
			Err(e) => {
				tracing::debug!("Request {} failed: {}", id, e);
				self.transport
					.write_error(id, FS_ERROR, e.to_string(), Some(e.to_json_rpc_error()))
			}
		}
	}

	// -- Namespace accessors ----------------------------------------------

	fn with_fs<F>(&self, f: F) -> HandlerResult
	where
		F: FnOnce(&Namespace) -> HandlerResult,
	{
		match &self.namespace {
			Some(fs) => f(fs),
			None => Err(FsError::NotInitialized),
		}
	}

	fn with_fs_mut<F>(&mut self, f: F) -> HandlerResult
	where
		F: FnOnce(&mut Namespace) -> HandlerResult,
	{
		match &mut self.namespace {
			Some(fs) => f(fs),
			None => Err(FsError::NotInitialized),
		}
	}

	// -- Initialize -------------------------------------------------------

	fn handle_initialize(&mut self, params: serde_json::Value) -> HandlerResult {
		let p: InitializeParams = if params.is_null() {
			InitializeParams::default()
		} else {
			parse_params(params)?
		};
		let limits = p.limits.unwrap_or_default().into_limits();
		tracing::info!("Initializing namespace with {:?}", limits);
		self.namespace = Some(Namespace::new(limits));
		Ok(json!({}))
	}
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn parse_params<T: serde::de::DeserializeOwned>(params: serde_json::Value) -> Result<T, FsError> {
	Ok(serde_json::from_value(params)?)
}

fn handle_change_directory(fs: &mut Namespace, params: serde_json::Value) -> HandlerResult {
	let p: PathParams = parse_params(params)?;
	fs.change_directory(&p.path)?;
	Ok(json!({ "path": fs.current_path() }))
}

fn handle_list_directory(fs: &Namespace, params: serde_json::Value) -> HandlerResult {
	let p: OptionalPathParams = if params.is_null() {
		OptionalPathParams::default()
	} else {
		parse_params(params)?
	};
	let names = match p.path {
		Some(path) => fs.list_directory_at(&path)?,
		None => fs.list_directory(),
	};
	Ok(json!({ "names": names }))
}

fn handle_create_folder(fs: &mut Namespace, params: serde_json::Value) -> HandlerResult {
	let p: CreateFolderParams = parse_params(params)?;
	match (p.path, p.name) {
		(_, Some(name)) => {
			let location = p.location.unwrap_or_default();
			fs.create_folder_in(&location, &name)?;
		}
		(Some(path), None) => fs.create_folder(&path)?,
		(None, None) => {
			return Err(FsError::InvalidPath(
				"createFolder needs either `path` or `name`".to_string(),
			));
		}
	}
	Ok(json!({}))
}

fn handle_create_file(fs: &mut Namespace, params: serde_json::Value) -> HandlerResult {
	let p: CreateFileParams = parse_params(params)?;
	fs.create_file(&p.path, &p.content)?;
	Ok(json!({}))
}

fn handle_read_file(fs: &Namespace, params: serde_json::Value) -> HandlerResult {
	let p: PathParams = parse_params(params)?;
	let content = fs.read_file(&p.path)?;
	Ok(json!({ "content": content }))
}

fn handle_append_file(fs: &mut Namespace, params: serde_json::Value) -> HandlerResult {
	let p: ContentParams = parse_params(params)?;
	fs.append_file(&p.path, &p.content)?;
	Ok(json!({}))
}

fn handle_write_file(fs: &mut Namespace, params: serde_json::Value) -> HandlerResult {
	let p: ContentParams = parse_params(params)?;
	fs.write_file(&p.path, &p.content)?;
	Ok(json!({}))
}

fn handle_delete(fs: &mut Namespace, params: serde_json::Value) -> HandlerResult {
	let p: PathParams = parse_params(params)?;
	let deleted = fs.delete(&p.path)?;
	Ok(json!({ "deleted": deleted }))
}

fn handle_rename(fs: &mut Namespace, params: serde_json::Value) -> HandlerResult {
	let p: RenameParams = parse_params(params)?;
	fs.rename(&p.path, &p.new_name)?;
	Ok(json!({}))
}

fn handle_move(fs: &mut Namespace, params: serde_json::Value) -> HandlerResult {
	let p: TransferParams = parse_params(params)?;
	fs.move_entry(&p.src, &p.dst)?;
	Ok(json!({}))
}

fn handle_copy(fs: &mut Namespace, params: serde_json::Value) -> HandlerResult {
	let p: TransferParams = parse_params(params)?;
	fs.copy(&p.src, &p.dst)?;
	Ok(json!({}))
}

fn handle_search(fs: &Namespace, params: serde_json::Value) -> HandlerResult {
	let p: SearchParams = parse_params(params)?;
	let paths = match p.folder {
		Some(folder) => fs.search_in(&folder, &p.name)?,
		None => fs.search(&p.name),
	};
	Ok(json!({ "paths": paths }))
}

fn handle_search_by_extension(fs: &Namespace, params: serde_json::Value) -> HandlerResult {
	let p: SearchByExtensionParams = parse_params(params)?;
	let paths = match p.folder {
		Some(folder) => fs.search_by_extension_in(&folder, &p.extension)?,
		None => fs.search_by_extension(&p.extension),
	};
	Ok(json!({ "paths": paths }))
}

fn handle_exists(fs: &Namespace, params: serde_json::Value) -> HandlerResult {
	let p: PathParams = parse_params(params)?;
	Ok(json!({ "exists": fs.exists(&p.path) }))
}

fn handle_stat(fs: &Namespace, params: serde_json::Value) -> HandlerResult {
	let p: PathParams = parse_params(params)?;
	let s = fs.stat(&p.path)?;
	Ok(json!({ "path": s.path, "kind": s.kind.as_str() }))
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::Value;

	fn serve(input: &str) -> Vec<Value> {
		let mut server = FsServer::new(NdjsonTransport::with_writer(Vec::new()));
		server.serve(input.as_bytes()).unwrap();
		let bytes = server.into_transport().into_inner();
		String::from_utf8(bytes)
			.unwrap()
			.lines()
			.map(|l| serde_json::from_str(l).unwrap())
			.collect()
	}

	fn request(id: u64, method: &str, params: Value) -> String {
		let mut line = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params})
			.to_string();
		line.push('\n');
		line
	}

	#[test]
	fn requests_before_initialize_fail() {
		let out = serve(&request(1, "fs/currentPath", Value::Null));
		assert_eq!(out[0]["error"]["code"], FS_ERROR);
		assert_eq!(out[0]["error"]["data"]["fsCode"], "FS_NOT_INITIALIZED");
	}

	#[test]
	fn one_response_per_request_in_order() {
		let input = [
			request(1, "initialize", Value::Null),
			request(2, "fs/createFolder", json!({"path": "/docs"})),
			request(3, "fs/createFile", json!({"path": "/docs/a.txt", "content": "hi"})),
			request(4, "fs/readFile", json!({"path": "/docs/a.txt"})),
		]
		.concat();
		let out = serve(&input);
		let ids: Vec<u64> = out.iter().map(|v| v["id"].as_u64().unwrap()).collect();
		assert_eq!(ids, vec![1, 2, 3, 4]);
		assert_eq!(out[3]["result"]["content"], "hi");
	}

	#[test]
	fn blank_lines_are_skipped_and_bad_json_reported() {
		let input = format!("\n   \nnot json\n{}", request(9, "initialize", Value::Null));
		let out = serve(&input);
		assert_eq!(out.len(), 2);
		assert_eq!(out[0]["id"], 0);
		assert_eq!(out[0]["error"]["code"], PARSE_ERROR);
		assert_eq!(out[1]["id"], 9);
	}

	#[test]
	fn unknown_method() {
		let out = serve(&request(1, "fs/teleport", json!({})));
		assert_eq!(out[0]["error"]["code"], METHOD_NOT_FOUND);
	}

	#[test]
	fn malformed_params_are_invalid_params() {
		let input = [
			request(1, "initialize", Value::Null),
			request(2, "fs/readFile", json!({"wrong": 1})),
		]
		.concat();
		let out = serve(&input);
		assert_eq!(out[1]["error"]["code"], INVALID_PARAMS);
		assert_eq!(out[1]["error"]["data"]["fsCode"], "FS_JSON_ERROR");
	}

	#[test]
	fn initialize_applies_limits() {
		let input = [
			request(1, "initialize", json!({"limits": {"maxNameLength": 3}})),
			request(2, "fs/createFolder", json!({"path": "/abcd"})),
			request(3, "fs/createFolder", json!({"path": "/abc"})),
		]
		.concat();
		let out = serve(&input);
		assert_eq!(out[1]["error"]["data"]["fsCode"], "FS_INVALID_PATH");
		assert!(out[2].get("error").is_none());
	}

	#[test]
	fn create_folder_by_location_and_name() {
		let input = [
			request(1, "initialize", Value::Null),
			request(2, "fs/createFolder", json!({"name": "top"})),
			request(3, "fs/createFolder", json!({"location": "/top", "name": "inner"})),
			request(4, "fs/createFolder", json!({})),
			request(5, "fs/listDirectory", json!({"path": "/top"})),
		]
		.concat();
		let out = serve(&input);
		assert_eq!(out[3]["error"]["data"]["fsCode"], "FS_INVALID_PATH");
		assert_eq!(out[4]["result"]["names"], json!(["inner"]));
	}
}
