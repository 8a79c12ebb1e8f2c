use std::time::Duration;

/// Result type alias using SwError
pub type Result<T> = std::result::Result<T, SwError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable code used in log records, operation stats and
/// operator-facing messages, and to a fixed list of remediation steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SwErrorKind {
    // Delivery / endpoint
    /// Malformed endpoint URL or payload; never retried
    ValidationError,
    WebhookNotFound,
    /// Endpoint revoked or credentials invalid; requires operator action
    PermissionError,
    RateLimited,
    ServerError,
    NetworkError,
    Timeout,
    UnknownError,

    // Pipeline
    /// A single detector failed; contained, the pipeline continues
    DetectionError,
    /// Unknown group name during filter resolution; never fatal
    FilterResolutionWarning,
    /// A group catalog violates its naming/cycle invariants
    InvalidCatalog,
    MalformedSnapshot,

    // Integration/IO
    ConfigError,
    Persistence,
    Io,
    Serialization,

    // Internal
    Internal,
}

impl SwErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            SwErrorKind::ValidationError => "VALIDATION_ERROR",
            SwErrorKind::WebhookNotFound => "WEBHOOK_NOT_FOUND",
            SwErrorKind::PermissionError => "PERMISSION_ERROR",
            SwErrorKind::RateLimited => "RATE_LIMITED",
            SwErrorKind::ServerError => "SERVER_ERROR",
            SwErrorKind::NetworkError => "NETWORK_ERROR",
            SwErrorKind::Timeout => "TIMEOUT",
            SwErrorKind::UnknownError => "UNKNOWN_ERROR",
            SwErrorKind::DetectionError => "DETECTION_ERROR",
            SwErrorKind::FilterResolutionWarning => "FILTER_RESOLUTION_WARNING",
            SwErrorKind::InvalidCatalog => "INVALID_CATALOG",
            SwErrorKind::MalformedSnapshot => "MALFORMED_SNAPSHOT",
            SwErrorKind::ConfigError => "CONFIG_ERROR",
            SwErrorKind::Persistence => "PERSISTENCE_ERROR",
            SwErrorKind::Io => "IO_ERROR",
            SwErrorKind::Serialization => "SERIALIZATION_ERROR",
            SwErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    /// Whether a delivery failing with this kind may be retried automatically.
    ///
    /// Rate limiting is retryable only after the server-provided wait, which
    /// the delivery service handles separately from backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SwErrorKind::ServerError | SwErrorKind::NetworkError | SwErrorKind::Timeout
        )
    }

    /// Fixed operator-facing remediation steps for this kind.
    pub fn remediation_steps(&self) -> &'static [&'static str] {
        match self {
            SwErrorKind::ValidationError => &[
                "Check that the webhook URL starts with https://discord.com/api/webhooks/",
                "Copy the URL again from Server Settings > Integrations > Webhooks",
                "Make sure the URL contains both the numeric webhook id and the token",
            ],
            SwErrorKind::WebhookNotFound => &[
                "The webhook was deleted or the URL is wrong",
                "Create a new webhook in the channel settings and update the configuration",
                "Verify the id segment of the URL matches the webhook shown in Discord",
            ],
            SwErrorKind::PermissionError => &[
                "The webhook token was revoked or regenerated",
                "Copy the current webhook URL from Discord and update the configuration",
                "Confirm the webhook's channel still allows the integration to post",
            ],
            SwErrorKind::RateLimited => &[
                "Discord is rate limiting this webhook; notifications resume automatically",
                "Increase the monitoring interval if this happens frequently",
                "Use a stricter filter preset to reduce the number of messages",
            ],
            SwErrorKind::ServerError => &[
                "Discord returned a server error; delivery is retried automatically",
                "Check https://discordstatus.com for ongoing incidents",
            ],
            SwErrorKind::NetworkError => &[
                "Check the machine's internet connection and DNS resolution",
                "Verify no firewall or proxy blocks outbound HTTPS to discord.com",
                "Delivery is retried automatically on the next attempt",
            ],
            SwErrorKind::Timeout => &[
                "The request did not complete in time; delivery is retried automatically",
                "Increase the endpoint timeout if the network is slow",
            ],
            SwErrorKind::UnknownError => &[
                "Discord returned an unexpected response",
                "Run `sheetwatch validate-webhook` to diagnose the endpoint",
                "Check the logs for the response status and message",
            ],
            SwErrorKind::DetectionError => &[
                "One detector could not read the character data; other changes were still reported",
                "Check the logs for the failing detector and the field it expected",
            ],
            SwErrorKind::FilterResolutionWarning => &[
                "A group name in the filter configuration is not known",
                "Run `sheetwatch groups` to list valid group names",
            ],
            SwErrorKind::InvalidCatalog => &[
                "Group names must be unique across core, nested and composite groups",
                "Composite groups must not reference themselves directly or indirectly",
            ],
            SwErrorKind::MalformedSnapshot => &[
                "The character snapshot is not a JSON object",
                "Re-fetch the character data and try again",
            ],
            SwErrorKind::ConfigError => &[
                "Check the configuration file for typos and missing fields",
                "Environment overrides use the SHEETWATCH__ prefix",
            ],
            SwErrorKind::Persistence => &[
                "Check that the snapshot directory is writable",
                "Remove the stored snapshot to start from a fresh baseline",
            ],
            SwErrorKind::Io => &["Check file paths and permissions"],
            SwErrorKind::Serialization => &["The data could not be encoded or decoded as JSON"],
            SwErrorKind::Internal => &["This is a bug; please report it with the logs attached"],
        }
    }
}

impl std::fmt::Display for SwErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Canonical structured error type
///
/// Carries a classification for programmatic handling plus context for
/// operators and debugging.
#[derive(Debug, Clone)]
pub struct SwError {
    kind: SwErrorKind,
    op: Option<String>,
    endpoint: Option<String>,
    field_path: Option<String>,
    retry_after: Option<Duration>,
    message: String,
    source: Option<Box<SwError>>,
}

impl SwError {
    /// Create a new error with the specified kind
    pub fn new(kind: SwErrorKind) -> Self {
        Self {
            kind,
            op: None,
            endpoint: None,
            field_path: None,
            retry_after: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add endpoint context (endpoint name, never the URL)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Add field path context
    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    /// Add the wait the server asked for
    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: SwError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> SwErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the endpoint context, if any
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Get the field path context, if any
    pub fn field_path(&self) -> Option<&str> {
        self.field_path.as_deref()
    }

    /// Get the server-provided wait, if any
    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&SwError> {
        self.source.as_deref()
    }

    /// Remediation steps for this error's kind
    pub fn remediation_steps(&self) -> &'static [&'static str] {
        self.kind.remediation_steps()
    }
}

impl std::fmt::Display for SwError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(endpoint) = &self.endpoint {
            write!(f, " (endpoint: {})", endpoint)?;
        }
        if let Some(path) = &self.field_path {
            write!(f, " (field_path: {})", path)?;
        }
        if let Some(wait) = self.retry_after {
            write!(f, " (retry_after: {}ms)", wait.as_millis())?;
        }
        Ok(())
    }
}

impl std::error::Error for SwError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<serde_json::Error> for SwError {
    fn from(err: serde_json::Error) -> Self {
        SwError::new(SwErrorKind::Serialization).with_message(err.to_string())
    }
}

impl From<std::io::Error> for SwError {
    fn from(err: std::io::Error) -> Self {
        SwError::new(SwErrorKind::Io).with_message(err.to_string())
    }
}

// ========== End Error Facility ==========

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: &[SwErrorKind] = &[
        SwErrorKind::ValidationError,
        SwErrorKind::WebhookNotFound,
        SwErrorKind::PermissionError,
        SwErrorKind::RateLimited,
        SwErrorKind::ServerError,
        SwErrorKind::NetworkError,
        SwErrorKind::Timeout,
        SwErrorKind::UnknownError,
        SwErrorKind::DetectionError,
        SwErrorKind::FilterResolutionWarning,
        SwErrorKind::InvalidCatalog,
        SwErrorKind::MalformedSnapshot,
        SwErrorKind::ConfigError,
        SwErrorKind::Persistence,
        SwErrorKind::Io,
        SwErrorKind::Serialization,
        SwErrorKind::Internal,
    ];

    #[test]
    fn test_every_kind_has_remediation() {
        for kind in ALL_KINDS {
            assert!(
                !kind.remediation_steps().is_empty(),
                "{} has no remediation steps",
                kind.code()
            );
        }
    }

    #[test]
    fn test_codes_are_unique() {
        let mut codes: Vec<&str> = ALL_KINDS.iter().map(|k| k.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), ALL_KINDS.len());
    }

    #[test]
    fn test_only_network_and_server_failures_are_transient() {
        let transient: Vec<SwErrorKind> = ALL_KINDS
            .iter()
            .copied()
            .filter(SwErrorKind::is_transient)
            .collect();
        assert_eq!(
            transient,
            vec![
                SwErrorKind::ServerError,
                SwErrorKind::NetworkError,
                SwErrorKind::Timeout
            ]
        );
    }

    #[test]
    fn test_display_includes_context() {
        let err = SwError::new(SwErrorKind::RateLimited)
            .with_op("webhook_send")
            .with_endpoint("party-channel")
            .with_retry_after(Duration::from_millis(1500))
            .with_message("slow down");
        let s = err.to_string();
        assert!(s.starts_with("[RATE_LIMITED] in operation 'webhook_send': slow down"));
        assert!(s.contains("(endpoint: party-channel)"));
        assert!(s.contains("(retry_after: 1500ms)"));
    }
}
