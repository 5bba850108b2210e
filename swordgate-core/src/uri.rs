//! The subset of the SWORD URI registry this engine needs.

/// Error condition URI for deposits rejected on content or packaging
/// grounds (maps to HTTP 415).
pub const ERROR_CONTENT: &str = "http://purl.org/net/sword/error/ErrorContent";

/// Error condition URI for requests the server cannot parse
/// (maps to HTTP 400).
pub const ERROR_BAD_REQUEST: &str = "http://purl.org/net/sword/error/ErrorBadRequest";

/// Packaging URI for a flat zip of files with no prescribed structure.
pub const PACKAGE_SIMPLE_ZIP: &str = "http://purl.org/net/sword/package/SimpleZip";

/// Packaging URI for a single unpackaged binary file.
pub const PACKAGE_BINARY: &str = "http://purl.org/net/sword/package/Binary";
