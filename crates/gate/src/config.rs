/// Configuration for the webhook gate.
///
/// Constructed once at startup from the server's configuration; the gate
/// itself never reads the environment.
#[derive(Debug, Clone, Default)]
pub struct GateConfig {
    /// Shared HMAC secret for signature verification.
    ///
    /// When `None`, verification is skipped and every signature is treated
    /// as valid. This is a deliberate open-by-default mode for unconfigured
    /// development deployments; production deployments must set the secret.
    pub secret: Option<String>,

    /// The bot's own forum username, used to drop self-authored posts and
    /// avoid reply loops. Best-effort: when unset, or when the author
    /// cannot be resolved from the payload, the check is skipped.
    pub bot_username: Option<String>,
}

impl GateConfig {
    /// Create a configuration with verification disabled and no
    /// self-authorship check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shared HMAC secret.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Set the bot's own username for the self-authorship check.
    #[must_use]
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }
}
