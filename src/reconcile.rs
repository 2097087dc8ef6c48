//! Per-entry reconcile cycle
//!
//! Extract the current version, refresh the source, compare the two as
//! opaque strings and render the updated file when they differ. The cycle
//! never looks at existing proposals; see [`crate::proposal::ProposalGate`].

use crate::domain::{ReconcileDecision, SoftwareEntry, Update};
use crate::error::EntryError;
use crate::extract::Extractor;
use crate::source::VersionSource;
use tracing::debug;

/// Run one reconcile cycle for `entry` against the file `content`.
///
/// The source is only refreshed once a current version has been found, so a
/// file without the token never causes network traffic.
pub async fn reconcile(
    entry: &SoftwareEntry,
    extractor: &Extractor,
    content: &str,
    source: &mut dyn VersionSource,
) -> Result<ReconcileDecision, EntryError> {
    let Some(extraction) = extractor.extract(content)? else {
        debug!(software = %entry.name, file = entry.file(), "version token not found");
        return Ok(ReconcileDecision::NoVersionFound);
    };
    let current = extraction.current().to_string();

    source.refresh().await?;
    let latest = source.latest()?;
    debug!(software = %entry.name, %current, %latest, "compared versions");

    if current == latest {
        return Ok(ReconcileDecision::UpToDate { version: current });
    }

    let new_content = extraction.substitute(&latest)?;
    let homepage = source.project_homepage()?.map(str::to_string);

    Ok(ReconcileDecision::UpdateAvailable(Update {
        current,
        latest,
        new_content,
        homepage,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Locator, SourceType};
    use crate::error::SourceError;
    use async_trait::async_trait;

    /// Source returning fixed data and counting refreshes
    struct FixedSource {
        latest: Option<String>,
        refreshed: bool,
        refresh_calls: usize,
        fail: bool,
    }

    impl FixedSource {
        fn new(latest: &str) -> Self {
            Self {
                latest: Some(latest.to_string()),
                refreshed: false,
                refresh_calls: 0,
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                latest: None,
                refreshed: false,
                refresh_calls: 0,
                fail: true,
            }
        }
    }

    #[async_trait]
    impl VersionSource for FixedSource {
        fn source_type(&self) -> SourceType {
            SourceType::Relmon
        }

        fn id(&self) -> &str {
            "widget"
        }

        async fn refresh(&mut self) -> Result<(), SourceError> {
            self.refresh_calls += 1;
            if self.fail {
                return Err(SourceError::unavailable("test", "widget", "HTTP 503"));
            }
            self.refreshed = true;
            Ok(())
        }

        fn latest(&self) -> Result<String, SourceError> {
            if !self.refreshed {
                return Err(SourceError::not_refreshed("test", "widget"));
            }
            self.latest
                .clone()
                .ok_or_else(|| SourceError::invalid_response("test", "widget", "no latest"))
        }

        fn all_versions(&self) -> Result<&[String], SourceError> {
            Ok(&[])
        }

        fn project_homepage(&self) -> Result<Option<&str>, SourceError> {
            Ok(Some("https://widget.dev"))
        }
    }

    fn entry() -> (SoftwareEntry, Extractor) {
        let locator = Locator::Pattern {
            file: "Makefile".to_string(),
            regex: r"WIDGET_VERSION := (\S+)".to_string(),
        };
        let extractor = Extractor::for_locator("widget", &locator).unwrap();
        (
            SoftwareEntry::new("widget", SourceType::Relmon, "widget", locator),
            extractor,
        )
    }

    #[tokio::test]
    async fn test_missing_token_skips_source() {
        let (entry, extractor) = entry();
        let mut source = FixedSource::new("2.1.0");

        let decision = reconcile(&entry, &extractor, "nothing here\n", &mut source)
            .await
            .unwrap();

        assert_eq!(decision, ReconcileDecision::NoVersionFound);
        assert_eq!(source.refresh_calls, 0);
    }

    #[tokio::test]
    async fn test_equal_versions_are_up_to_date() {
        let (entry, extractor) = entry();
        let mut source = FixedSource::new("2.1.0");

        let decision = reconcile(&entry, &extractor, "WIDGET_VERSION := 2.1.0\n", &mut source)
            .await
            .unwrap();

        assert_eq!(
            decision,
            ReconcileDecision::UpToDate {
                version: "2.1.0".to_string()
            }
        );
        assert_eq!(source.refresh_calls, 1);
    }

    #[tokio::test]
    async fn test_drift_produces_update() {
        let (entry, extractor) = entry();
        let mut source = FixedSource::new("2.1.0");

        let decision = reconcile(
            &entry,
            &extractor,
            "# build\nWIDGET_VERSION := 2.0.0\nall: build\n",
            &mut source,
        )
        .await
        .unwrap();

        assert_eq!(
            decision,
            ReconcileDecision::UpdateAvailable(Update {
                current: "2.0.0".to_string(),
                latest: "2.1.0".to_string(),
                new_content: "# build\nWIDGET_VERSION := 2.1.0\nall: build\n".to_string(),
                homepage: Some("https://widget.dev".to_string()),
            })
        );
    }

    #[tokio::test]
    async fn test_comparison_is_plain_string_inequality() {
        let (entry, extractor) = entry();
        // Source reports an "older" looking version; it is still drift
        let mut source = FixedSource::new("1.9.0");

        let decision = reconcile(&entry, &extractor, "WIDGET_VERSION := 2.0.0", &mut source)
            .await
            .unwrap();

        assert!(decision.is_update());
    }

    #[tokio::test]
    async fn test_source_failure_propagates() {
        let (entry, extractor) = entry();
        let mut source = FixedSource::failing();

        let result = reconcile(&entry, &extractor, "WIDGET_VERSION := 2.0.0", &mut source).await;

        assert!(matches!(
            result,
            Err(EntryError::Source(SourceError::Unavailable { .. }))
        ));
    }
}
