//! System-wide constants and reserved names.

/// Reserved context key selecting live or test mode.
///
/// A value that parses as boolean `true` (or a non-zero numeric flag)
/// switches the orchestrator into live mode; anything else is test mode.
pub const LIVE_MODE: &str = "LIVE_MODE";

/// Default deployment document looked up by the CLI.
pub const DEFAULT_DOCUMENT: &str = "maestro.yml";

/// Environment variable overriding the document path in the CLI.
pub const DOCUMENT_ENV: &str = "MAESTRO_DOCUMENT";

/// Environment variable forcing live mode in the CLI.
pub const LIVE_ENV: &str = "MAESTRO_LIVE";

/// Log prefix used while the context is in test mode.
pub const TEST_LABEL: &str = "TEST";

/// Log prefix used while the context is in live mode.
pub const LIVE_LABEL: &str = "LIVE";

/// Application name used in CLI output.
pub const APP_NAME: &str = "maestro";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "maestro";
