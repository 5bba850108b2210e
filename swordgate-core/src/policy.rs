use std::path::{Path, PathBuf};

use crate::store::ContainerId;
use crate::uri;

/// Fallback name for the preservation bundle when the policy does not
/// configure one.
pub const DEFAULT_BUNDLE_NAME: &str = "SWORD";

/// Repository policy consulted during deposit gating and archiving.
///
/// Injected into the engine's components explicitly — never resolved from
/// ambient state — so servers can scope policy per collection while tests
/// pass a plain [`PolicyConfig`].
pub trait DepositPolicy: Send + Sync {
    /// Whether the declared MIME type may be deposited into `target`.
    fn is_acceptable_content_type(&self, mime_type: &str, target: &ContainerId) -> bool;

    /// Whether the declared packaging identifier is accepted for `target`.
    fn is_accepted_packaging(&self, packaging: &str, target: &ContainerId) -> bool;

    /// Whether the as-received deposit should be retained alongside the
    /// ingested object.
    fn keep_original(&self) -> bool;

    /// Name of the preservation bundle originals are stored under.
    fn bundle_name(&self) -> &str {
        DEFAULT_BUNDLE_NAME
    }

    /// Directory failed packages are dumped to for forensic recovery.
    fn failed_package_dir(&self) -> &Path;
}

/// Static policy configuration applying uniformly to every target.
///
/// Content types match case-insensitively, with `*/*` accepting anything;
/// packaging identifiers are URIs and match exactly.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    pub accepted_content_types: Vec<String>,
    pub accepted_packaging: Vec<String>,
    pub keep_original: bool,
    pub bundle_name: String,
    pub failed_package_dir: PathBuf,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            accepted_content_types: vec!["*/*".to_string()],
            accepted_packaging: vec![
                uri::PACKAGE_SIMPLE_ZIP.to_string(),
                uri::PACKAGE_BINARY.to_string(),
            ],
            keep_original: true,
            bundle_name: DEFAULT_BUNDLE_NAME.to_string(),
            failed_package_dir: PathBuf::from("/tmp/swordgate/failed"),
        }
    }
}

impl DepositPolicy for PolicyConfig {
    fn is_acceptable_content_type(&self, mime_type: &str, _target: &ContainerId) -> bool {
        self.accepted_content_types
            .iter()
            .any(|accepted| accepted == "*/*" || accepted.eq_ignore_ascii_case(mime_type))
    }

    fn is_accepted_packaging(&self, packaging: &str, _target: &ContainerId) -> bool {
        self.accepted_packaging
            .iter()
            .any(|accepted| accepted == packaging)
    }

    fn keep_original(&self) -> bool {
        self.keep_original
    }

    fn bundle_name(&self) -> &str {
        &self.bundle_name
    }

    fn failed_package_dir(&self) -> &Path {
        &self.failed_package_dir
    }
}
