pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures of the external generation service. All of them are recoverable by the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Generation is disabled or has no API key.")]
	Disabled,
	#[error("Generation request timed out.")]
	Timeout,
	#[error("Generation service returned HTTP {status}.")]
	Status { status: u16 },
	#[error("Generation transport failed: {message}")]
	Transport { message: String },
	#[error("Generation returned empty output.")]
	EmptyOutput,
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
}
impl Error {
	/// Worth one more attempt after a short backoff.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::Timeout | Self::Transport { .. } => true,
			Self::Status { status } => *status == 429 || *status >= 500,
			_ => false,
		}
	}
}

impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		if err.is_timeout() {
			return Self::Timeout;
		}
		if err.is_decode() {
			return Self::InvalidResponse { message: err.to_string() };
		}
		if let Some(status) = err.status() {
			return Self::Status { status: status.as_u16() };
		}

		Self::Transport { message: err.to_string() }
	}
}
