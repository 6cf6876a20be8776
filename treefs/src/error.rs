use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
	#[error("Invalid path: {0}")]
	InvalidPath(String),
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Already exists: {0}")]
	AlreadyExists(String),
	#[error("Not a file: {0}")]
	NotAFile(String),
	#[error("Not a folder: {0}")]
	NotAFolder(String),
	#[error("Already at root: {0}")]
	AtRoot(String),
	#[error("Invalid operation: {0}")]
	InvalidOperation(String),
	#[error("Namespace not initialized")]
	NotInitialized,
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl FsError {
	pub fn code(&self) -> &str {
		match self {
			Self::InvalidPath(_) => "FS_INVALID_PATH",
			Self::NotFound(_) => "FS_NOT_FOUND",
			Self::AlreadyExists(_) => "FS_ALREADY_EXISTS",
			Self::NotAFile(_) => "FS_NOT_FILE",
			Self::NotAFolder(_) => "FS_NOT_FOLDER",
			Self::AtRoot(_) => "FS_AT_ROOT",
			Self::InvalidOperation(_) => "FS_INVALID_OPERATION",
			Self::NotInitialized => "FS_NOT_INITIALIZED",
			Self::Io(_) => "FS_IO_ERROR",
			Self::Json(_) => "FS_JSON_ERROR",
		}
	}

	pub fn to_json_rpc_error(&self) -> serde_json::Value {
		serde_json::json!({
			"fsCode": self.code(),
			"message": self.to_string(),
		})
	}
}
