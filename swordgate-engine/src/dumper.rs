use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::info;

use swordgate_core::deposit::{AuthContext, Deposit};
use swordgate_core::error::SwordError;

/// Persists the raw binary package of a failed deposit to `failure_dir`
/// for forensic recovery, together with a companion header snapshot.
///
/// The payload is streamed to `<base>` and the snapshot written to
/// `<base>-headers`, where the base name is
/// `sword-<username>-<epoch millis>`. Not retried; the caller decides
/// whether a dump failure is itself fatal for the outer request.
///
/// # Errors
///
/// Fails fast with [`SwordError::Dump`] when `failure_dir` does not
/// exist or is not a directory, or when writing either file fails.
pub async fn dump_package(
    deposit: &Deposit,
    auth: &AuthContext,
    failure_dir: &Path,
) -> Result<(), SwordError> {
    let base = dump_base(auth, failure_dir).await?;

    let mut source = deposit
        .open()
        .await
        .map_err(|e| SwordError::Dump(io::Error::other(e)))?;
    let mut writer = BufWriter::new(File::create(&base).await?);
    tokio::io::copy(&mut source, &mut writer).await?;
    writer.flush().await?;

    write_header_snapshot(&base, deposit, auth).await?;
    info!(path = %base.display(), "Failed deposit package dumped");
    Ok(())
}

/// Persists the serialized entry document of a failed deposit, with the
/// same companion header snapshot as [`dump_package`].
///
/// # Errors
///
/// Fails fast with [`SwordError::Dump`] under the same conditions as
/// [`dump_package`], or when the deposit carries no entry document.
pub async fn dump_entry(
    deposit: &Deposit,
    auth: &AuthContext,
    failure_dir: &Path,
) -> Result<(), SwordError> {
    let entry = deposit.entry().ok_or_else(|| {
        SwordError::Dump(io::Error::new(
            io::ErrorKind::InvalidInput,
            "deposit has no entry document to dump",
        ))
    })?;

    let base = dump_base(auth, failure_dir).await?;
    tokio::fs::write(&base, entry.as_xml()).await?;

    write_header_snapshot(&base, deposit, auth).await?;
    info!(path = %base.display(), "Failed deposit entry dumped");
    Ok(())
}

async fn dump_base(auth: &AuthContext, failure_dir: &Path) -> Result<PathBuf, SwordError> {
    let is_dir = tokio::fs::metadata(failure_dir)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Err(SwordError::Dump(io::Error::new(
            io::ErrorKind::NotFound,
            "directory does not exist for writing packages on ingest error",
        )));
    }

    let base = format!(
        "sword-{}-{}",
        auth.username(),
        Utc::now().timestamp_millis()
    );
    Ok(failure_dir.join(base))
}

/// Writes `<base>-headers`: six `Key=Value` lines in fixed order.
async fn write_header_snapshot(
    base: &Path,
    deposit: &Deposit,
    auth: &AuthContext,
) -> io::Result<()> {
    let mut path = base.as_os_str().to_owned();
    path.push("-headers");

    let snapshot = format!(
        "Filename={}\nContent-Type={}\nPackaging={}\nOn Behalf of={}\nSlug={}\nUser name={}\n",
        deposit.filename().unwrap_or_default(),
        deposit.mime_type(),
        deposit.packaging(),
        auth.on_behalf_of().unwrap_or_default(),
        deposit.slug().unwrap_or_default(),
        auth.username(),
    );
    tokio::fs::write(PathBuf::from(path), snapshot).await
}
