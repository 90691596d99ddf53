//! The five-step injection pipeline run inside a freshly loaded popup tab.

use std::fmt;

use pipdock_protocols::{InjectionService, PipdockError, SessionMetadata, TabId};
use tracing::{debug, error, warn};

use crate::placement::WINDOW_NAME_SENTINEL;

/// Which open message started the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenPath {
    /// `OpenDetached`: the primary long-form platform.
    Primary,
    /// `OpenGenericDetached`: every other platform.
    Generic,
}

impl OpenPath {
    /// Whether metadata delivery must succeed before the main script runs.
    pub fn requires_metadata(&self) -> bool {
        matches!(self, OpenPath::Generic)
    }
}

impl fmt::Display for OpenPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenPath::Primary => f.write_str("primary"),
            OpenPath::Generic => f.write_str("generic"),
        }
    }
}

/// Run the pipeline steps in order.
///
/// Only a metadata failure on the generic path stops the pipeline; every
/// other step failure is logged and the next step still runs.
pub async fn run(
    injection: &dyn InjectionService,
    tab: &TabId,
    metadata: &SessionMetadata,
    path: OpenPath,
) -> Result<(), PipdockError> {
    debug!("Injecting into tab {} ({} path)", tab, path);

    if let Err(e) = injection.mark_window(tab, WINDOW_NAME_SENTINEL).await {
        warn!("Failed to mark detached window: {}", e);
    }

    if let Err(e) = injection.insert_stylesheet(tab).await {
        warn!("Failed to insert minimal UI stylesheet: {}", e);
    }

    if let Err(e) = injection.inject_bridge(tab).await {
        warn!("Failed to inject bridge script: {}", e);
    }

    if let Err(e) = injection.deliver_metadata(tab, metadata).await {
        if path.requires_metadata() {
            error!("Failed to deliver session metadata, not starting page script: {}", e);
            return Err(e.into());
        }
        warn!("Failed to deliver session metadata: {}", e);
    }

    if let Err(e) = injection.inject_main_script(tab, metadata).await {
        warn!("Failed to inject main page script: {}", e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeInjection, InjectionStep, metadata};
    use pipdock_protocols::HostError;

    fn tab() -> TabId {
        TabId::new("T1")
    }

    #[tokio::test]
    async fn test_runs_all_steps_in_order() {
        let injection = FakeInjection::default();
        run(&injection, &tab(), &metadata(), OpenPath::Generic)
            .await
            .unwrap();
        assert_eq!(
            injection.steps(),
            vec![
                InjectionStep::MarkWindow(WINDOW_NAME_SENTINEL.to_string()),
                InjectionStep::Stylesheet,
                InjectionStep::Bridge,
                InjectionStep::Metadata,
                InjectionStep::MainScript,
            ]
        );
    }

    #[tokio::test]
    async fn test_independent_step_failures_do_not_abort() {
        let injection = FakeInjection::default();
        for step in [
            InjectionStep::MarkWindow(String::new()),
            InjectionStep::Stylesheet,
            InjectionStep::Bridge,
        ] {
            injection.fail(step, HostError::Operation("denied".to_string()));
        }

        run(&injection, &tab(), &metadata(), OpenPath::Generic)
            .await
            .unwrap();
        assert!(injection.steps().contains(&InjectionStep::MainScript));
    }

    #[tokio::test]
    async fn test_metadata_failure_aborts_generic_path() {
        let injection = FakeInjection::default();
        injection.fail(
            InjectionStep::Metadata,
            HostError::Operation("context destroyed".to_string()),
        );

        let result = run(&injection, &tab(), &metadata(), OpenPath::Generic).await;
        assert!(matches!(result, Err(PipdockError::Host(_))));
        assert!(!injection.steps().contains(&InjectionStep::MainScript));
    }

    #[tokio::test]
    async fn test_metadata_failure_tolerated_on_primary_path() {
        let injection = FakeInjection::default();
        injection.fail(
            InjectionStep::Metadata,
            HostError::Operation("context destroyed".to_string()),
        );

        run(&injection, &tab(), &metadata(), OpenPath::Primary)
            .await
            .unwrap();
        assert!(injection.steps().contains(&InjectionStep::MainScript));
    }

    #[tokio::test]
    async fn test_main_script_failure_is_logged_only() {
        let injection = FakeInjection::default();
        injection.fail(
            InjectionStep::MainScript,
            HostError::Operation("csp".to_string()),
        );
        assert!(
            run(&injection, &tab(), &metadata(), OpenPath::Generic)
                .await
                .is_ok()
        );
    }
}
