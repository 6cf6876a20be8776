use std::io::{self, Write};

use serde::Serialize;

use crate::error::FsError;

#[derive(Serialize)]
struct JsonRpcResponse<'a> {
	jsonrpc: &'a str,
	id: u64,
	#[serde(skip_serializing_if = "Option::is_none")]
	result: Option<serde_json::Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	error: Option<JsonRpcErrorBody>,
}

#[derive(Serialize)]
struct JsonRpcErrorBody {
	code: i32,
	message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	data: Option<serde_json::Value>,
}

/// Writes one JSON-RPC response per line. Defaults to stdout; tests hand in
/// a `Vec<u8>`.
pub struct NdjsonTransport<W: Write = io::Stdout> {
	out: W,
}

impl Default for NdjsonTransport<io::Stdout> {
	fn default() -> Self {
		Self::new()
	}
}

impl NdjsonTransport<io::Stdout> {
	pub fn new() -> Self {
		Self { out: io::stdout() }
	}
}

impl<W: Write> NdjsonTransport<W> {
	pub fn with_writer(out: W) -> Self {
		Self { out }
	}

	pub fn into_inner(self) -> W {
		self.out
	}

	pub fn write_response(&mut self, id: u64, result: serde_json::Value) -> Result<(), FsError> {
		self.write_line(&JsonRpcResponse {
			jsonrpc: "2.0",
			id,
			result: Some(result),
			error: None,
		})
	}

	pub fn write_error(
		&mut self,
		id: u64,
		code: i32,
		message: impl Into<String>,
		data: Option<serde_json::Value>,
	) -> Result<(), FsError> {
		self.write_line(&JsonRpcResponse {
			jsonrpc: "2.0",
			id,
			result: None,
			error: Some(JsonRpcErrorBody {
				code,
				message: message.into(),
				data,
			}),
		})
	}

	/// Serialize to a buffer first so a failure never leaves half a line on
	/// the wire.
	fn write_line(&mut self, value: &impl Serialize) -> Result<(), FsError> {
		let mut line = serde_json::to_vec(value)?;
		line.push(b'\n');
		self.out.write_all(&line)?;
		self.out.flush()?;
		Ok(())
	}
}
