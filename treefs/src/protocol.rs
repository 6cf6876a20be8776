use serde::Deserialize;

use crate::path::FsLimits;

// ── JSON-RPC 2.0 error codes ────────────────────────────────────────────────

pub const PARSE_ERROR: i32 = -32700;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const FS_ERROR: i32 = -32000;

// ── Incoming request ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
	pub id: u64,
	pub method: String,
	#[serde(default)]
	pub params: serde_json::Value,
}

// ── Params ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
	pub limits: Option<LimitsParams>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitsParams {
	pub max_path_length: Option<usize>,
	pub max_path_depth: Option<usize>,
	pub max_name_length: Option<usize>,
}

impl LimitsParams {
	/// Fill unset fields from the defaults.
	pub fn into_limits(self) -> FsLimits {
		let defaults = FsLimits::default();
		FsLimits {
			max_path_length: self.max_path_length.unwrap_or(defaults.max_path_length),
			max_path_depth: self.max_path_depth.unwrap_or(defaults.max_path_depth),
			max_name_length: self.max_name_length.unwrap_or(defaults.max_name_length),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathParams {
	pub path: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionalPathParams {
	pub path: Option<String>,
}

/// Either `path` (last segment is the name) or `name` with an optional
/// `location` (defaults to the current folder).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderParams {
	pub path: Option<String>,
	pub location: Option<String>,
	pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileParams {
	pub path: String,
	#[serde(default)]
	pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentParams {
	pub path: String,
	pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameParams {
	pub path: String,
	pub new_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferParams {
	pub src: String,
	pub dst: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
	pub name: String,
	pub folder: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchByExtensionParams {
	pub extension: String,
	pub folder: Option<String>,
}
