use chrono::{DateTime, Utc};

use swordgate_core::deposit::Deposit;
use swordgate_core::store::RepositoryStore;

/// Prefix for synthesized filenames.
const PREFIX: &str = "sword-";
/// Second-precision ISO-8601 local form used in synthesized filenames.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Derives the stored filename for a deposit's binary payload.
///
/// A non-empty client-supplied filename is returned verbatim — the
/// format lookup and the `original` marker are skipped entirely in that
/// branch. Otherwise a name is synthesized from the current UTC time,
/// suffixed `.original` when `original` is set, and given the first file
/// extension of the format the MIME type resolves to, when one is known.
///
/// # Errors
///
/// Propagates a backend fault from the format lookup.
pub async fn payload_filename<S: RepositoryStore>(
    store: &S,
    deposit: &Deposit,
    original: bool,
) -> anyhow::Result<String> {
    if let Some(name) = deposit.filename() {
        if !name.is_empty() {
            return Ok(name.to_string());
        }
    }

    let format = store.resolve_format(deposit.mime_type()).await?;
    let extension = format
        .as_ref()
        .and_then(|f| f.extensions.first())
        .map(String::as_str);
    Ok(synthesize(Utc::now(), original, extension))
}

/// Derives the filename for a stored metadata-entry document.
///
/// Entry filenames are never taken from client input: always a
/// synthesized timestamp name, optionally marked `.original`, with a
/// terminal `.xml` (entry documents are always XML).
pub fn entry_filename(original: bool) -> String {
    synthesize(Utc::now(), original, Some("xml"))
}

fn synthesize(now: DateTime<Utc>, original: bool, extension: Option<&str>) -> String {
    let mut name = format!("{PREFIX}{}", now.format(TIMESTAMP_FORMAT));
    if original {
        name.push_str(".original");
    }
    if let Some(ext) = extension {
        name.push('.');
        name.push_str(ext);
    }
    name
}
