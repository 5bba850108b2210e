use tracing::{debug, info};

use swordgate_core::deposit::Deposit;
use swordgate_core::error::SwordError;
use swordgate_core::policy::DepositPolicy;
use swordgate_core::store::{ContainerId, IngestResult, RepositoryStore};

use crate::filename;

/// Description applied to stored original entry documents.
const ENTRY_DESCRIPTION: &str = "Original SWORD entry document";
/// Description applied to stored original binary payloads.
const PAYLOAD_DESCRIPTION: &str = "Original SWORD deposit file";
/// MIME type used to resolve the format tag for stored entry documents.
const ENTRY_MIME_TYPE: &str = "application/xml";

/// Stores the as-received deposit into the target container's
/// preservation bundle.
///
/// Collaborators are injected at construction; the archiver holds no
/// state of its own beyond them.
pub struct OriginalsArchiver<'a, P, S> {
    policy: &'a P,
    store: &'a S,
}

impl<'a, P: DepositPolicy, S: RepositoryStore> OriginalsArchiver<'a, P, S> {
    pub fn new(policy: &'a P, store: &'a S) -> Self {
        Self { policy, store }
    }

    /// Archives the original copy of `deposit` on `target`.
    ///
    /// A no-op unless the policy requests original-copy retention.
    /// Otherwise, under one authorization-suspension guard: resolve or
    /// create the named preservation bundle, store the entry document
    /// and/or stream the binary content into it, then commit the bundle
    /// and the container. The binary payload is designated as the
    /// original deposit on `result` unless the caller already designated
    /// one.
    ///
    /// # Errors
    ///
    /// Any backend fault along the sequence is wrapped into a single
    /// [`SwordError::Storage`]. Partial writes performed before the
    /// failure are not rolled back; callers requiring strict atomicity
    /// must wrap the call in an external transaction boundary.
    pub async fn store_originals(
        &self,
        target: &ContainerId,
        deposit: &Deposit,
        result: &mut IngestResult<S::Payload>,
    ) -> Result<(), SwordError> {
        if !self.policy.keep_original() {
            return Ok(());
        }

        info!(
            target = %target,
            "Storing an original copy of the deposit alongside the ingested object"
        );

        // Adding payloads back onto the target requires authorization
        // checks to be suspended; the guard restores them on every exit
        // path, including the error one.
        let _guard = self.store.suspend_authorization();

        self.archive(target, deposit, result)
            .await
            .map_err(SwordError::Storage)
    }

    async fn archive(
        &self,
        target: &ContainerId,
        deposit: &Deposit,
        result: &mut IngestResult<S::Payload>,
    ) -> anyhow::Result<()> {
        let bundle_name = self.policy.bundle_name();
        let bundle = match self.store.find_bundle(target, bundle_name).await? {
            Some(bundle) => bundle,
            None => self.store.create_bundle(target, bundle_name).await?,
        };

        if deposit.is_multipart() || deposit.is_entry_only() {
            // The mode flags guarantee the entry document is present here.
            if let Some(entry) = deposit.entry() {
                let name = filename::entry_filename(true);
                let payload = self
                    .store
                    .create_payload(&bundle, std::io::Cursor::new(entry.to_bytes()))
                    .await?;
                let format = self.store.resolve_format(ENTRY_MIME_TYPE).await?;
                self.store
                    .describe_payload(&payload, &name, ENTRY_DESCRIPTION, format.as_ref())
                    .await?;
                debug!(name = %name, bundle = %bundle_name, "Original entry stored");
            }
        }

        if deposit.is_multipart() || deposit.is_binary_only() {
            let name = filename::payload_filename(self.store, deposit, true).await?;
            let content = deposit.open().await?;
            let payload = self.store.create_payload(&bundle, content).await?;
            let format = self.store.resolve_format(deposit.mime_type()).await?;
            self.store
                .describe_payload(&payload, &name, PAYLOAD_DESCRIPTION, format.as_ref())
                .await?;
            result.record_original_deposit(payload);
            debug!(name = %name, bundle = %bundle_name, "Original deposit stored");
        }

        self.store.commit_bundle(&bundle).await?;
        self.store.commit_container(target).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use swordgate_core::deposit::{DepositContent, SwordEntry};
    use swordgate_core::policy::PolicyConfig;
    use swordgate_core::store::FormatRecord;
    use swordgate_core::uri;

    use crate::memory::MemoryStore;

    use super::*;

    fn target() -> ContainerId {
        ContainerId::new("item-1")
    }

    fn binary_deposit() -> Deposit {
        Deposit::new("application/zip", uri::PACKAGE_SIMPLE_ZIP)
            .with_content(DepositContent::Bytes(Bytes::from_static(b"PK\x03\x04")))
    }

    fn multipart_deposit() -> Deposit {
        binary_deposit().with_entry(SwordEntry::new("<entry><title>T</title></entry>"))
    }

    /// Given a policy without original retention, when archiving, then no storage call is made.
    #[tokio::test]
    async fn given_keep_original_disabled_when_archiving_then_no_storage_calls() {
        let policy = PolicyConfig {
            keep_original: false,
            ..PolicyConfig::default()
        };
        let store = MemoryStore::new();
        let mut result = IngestResult::new();

        OriginalsArchiver::new(&policy, &store)
            .store_originals(&target(), &binary_deposit(), &mut result)
            .await
            .unwrap();

        assert!(store.bundle_names(&target()).is_empty());
        assert_eq!(store.payload_count(), 0);
        assert_eq!(store.bundle_commit_count(), 0);
        assert_eq!(store.container_commit_count(), 0);
    }

    /// Given a binary deposit, when archived, then one payload with the deposit-file description is stored and committed.
    #[tokio::test]
    async fn given_binary_deposit_when_archived_then_single_described_payload() {
        let policy = PolicyConfig::default();
        let store = MemoryStore::new();
        store.register_format(FormatRecord {
            mime_type: "application/zip".to_string(),
            description: "ZIP archive".to_string(),
            extensions: vec!["zip".to_string()],
        });
        let mut result = IngestResult::new();

        OriginalsArchiver::new(&policy, &store)
            .store_originals(&target(), &binary_deposit(), &mut result)
            .await
            .unwrap();

        let payloads = store.payloads_in(&target(), "SWORD");
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].description, "Original SWORD deposit file");
        assert!(payloads[0].name.ends_with(".original.zip"));
        assert_eq!(payloads[0].content.as_ref(), b"PK\x03\x04");
        assert_eq!(
            payloads[0].format.as_ref().map(|f| f.mime_type.as_str()),
            Some("application/zip")
        );
        assert_eq!(store.bundle_commit_count(), 1);
        assert_eq!(store.container_commit_count(), 1);
        assert!(result.original_deposit().is_some());
    }

    /// Given a multipart deposit, when archived, then both the entry document and the binary payload are stored.
    #[tokio::test]
    async fn given_multipart_deposit_when_archived_then_entry_and_binary_stored() {
        let policy = PolicyConfig::default();
        let store = MemoryStore::new();
        store.register_format(FormatRecord {
            mime_type: "application/xml".to_string(),
            description: "XML".to_string(),
            extensions: vec!["xml".to_string()],
        });
        let mut result = IngestResult::new();

        OriginalsArchiver::new(&policy, &store)
            .store_originals(&target(), &multipart_deposit(), &mut result)
            .await
            .unwrap();

        let payloads = store.payloads_in(&target(), "SWORD");
        assert_eq!(payloads.len(), 2);

        let entry = payloads
            .iter()
            .find(|p| p.description == "Original SWORD entry document")
            .expect("entry payload stored");
        assert!(entry.name.ends_with(".original.xml"));
        assert_eq!(
            entry.content.as_ref(),
            b"<entry><title>T</title></entry>".as_slice()
        );
        assert_eq!(
            entry.format.as_ref().map(|f| f.mime_type.as_str()),
            Some("application/xml")
        );

        assert!(
            payloads
                .iter()
                .any(|p| p.description == "Original SWORD deposit file")
        );
    }

    /// Given two archive runs on the same container, when the bundle already exists, then it is reused, not duplicated.
    #[tokio::test]
    async fn given_two_runs_when_bundle_exists_then_reused_not_duplicated() {
        let policy = PolicyConfig::default();
        let store = MemoryStore::new();
        let archiver = OriginalsArchiver::new(&policy, &store);

        let mut first = IngestResult::new();
        archiver
            .store_originals(&target(), &multipart_deposit(), &mut first)
            .await
            .unwrap();
        let mut second = IngestResult::new();
        archiver
            .store_originals(&target(), &multipart_deposit(), &mut second)
            .await
            .unwrap();

        assert_eq!(store.bundle_names(&target()), vec!["SWORD".to_string()]);
        assert_eq!(store.payloads_in(&target(), "SWORD").len(), 4);
    }

    /// Given an already designated original deposit, when archiving, then the existing reference is kept.
    #[tokio::test]
    async fn given_designated_original_when_archived_then_reference_not_overwritten() {
        let policy = PolicyConfig::default();
        let store = MemoryStore::new();

        // A payload stored ahead of archiving stands in for the artifact
        // the caller designated as canonical.
        let bundle = store.create_bundle(&target(), "ORIGINAL").await.unwrap();
        let prior = store
            .create_payload(&bundle, std::io::Cursor::new(b"normalized".to_vec()))
            .await
            .unwrap();

        let mut result = IngestResult::new();
        result.record_original_deposit(prior);

        OriginalsArchiver::new(&policy, &store)
            .store_originals(&target(), &binary_deposit(), &mut result)
            .await
            .unwrap();

        assert_eq!(result.original_deposit(), Some(&prior));
    }

    /// Given an enforcing store, when archiving, then the suspension guard lets the sequence through.
    #[tokio::test]
    async fn given_enforcing_store_when_archived_then_guard_admits_sequence() {
        let policy = PolicyConfig::default();
        let store = MemoryStore::enforcing();
        let mut result = IngestResult::new();

        OriginalsArchiver::new(&policy, &store)
            .store_originals(&target(), &binary_deposit(), &mut result)
            .await
            .unwrap();

        assert_eq!(store.payload_count(), 1);
        assert!(!store.authorization_suspended());
    }

    /// Given a mid-sequence fault, when archiving fails, then the error is a storage failure and the guard is still released.
    #[tokio::test]
    async fn given_mid_sequence_fault_when_archived_then_storage_error_and_guard_released() {
        let policy = PolicyConfig::default();
        let store = MemoryStore::enforcing();
        store.fail_next_payload();
        let mut result = IngestResult::new();

        let err = OriginalsArchiver::new(&policy, &store)
            .store_originals(&target(), &binary_deposit(), &mut result)
            .await
            .unwrap_err();

        assert!(matches!(err, SwordError::Storage(_)));
        assert!(!store.authorization_suspended());
        // The bundle created before the fault is not rolled back.
        assert_eq!(store.bundle_names(&target()), vec!["SWORD".to_string()]);
        assert_eq!(store.bundle_commit_count(), 0);
    }
}
