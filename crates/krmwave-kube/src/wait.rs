//! Condition waiters
//!
//! Two strategies, both bounded by a shared [`Deadline`]:
//!
//! - [`wait_for_crd`] polls until the CRD exists, then hands the remaining
//!   budget to a single blocking wait for the Established condition.
//! - [`wait_for_rollout`] makes one blocking rollout-status call with the
//!   remaining budget. The underlying command watches on its own, so there is
//!   no polling loop.

use std::time::Duration;

use krmwave_core::RolloutRef;
use tracing::{debug, info, warn};

use crate::cluster::ClusterOps;
use crate::deadline::Deadline;
use crate::error::{KubeError, Result};

/// Wait until the named CRD exists and is Established.
///
/// ```text
/// Polling ──exists──► wait Established ──ok──► Established
///    │                        └──────fail────► Failed
///    └──deadline passed──────────────────────► TimedOut
/// ```
pub async fn wait_for_crd<C: ClusterOps + ?Sized>(
    cluster: &C,
    name: &str,
    deadline: &Deadline,
    poll_interval: Duration,
) -> Result<()> {
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let query = cluster.crd_exists(name).await?;
        if query.success() {
            debug!(crd = name, attempts, "CRD exists");
            break;
        }

        if deadline.is_expired() {
            warn!(crd = name, attempts, "CRD never appeared");
            return Err(KubeError::Timeout {
                what: format!("CRD {} to exist", name),
                budget: deadline.budget(),
            });
        }

        debug!(crd = name, attempts, output = %query.output, "CRD not found yet");
        tokio::time::sleep(poll_interval.min(deadline.remaining())).await;
    }

    let remaining = deadline.remaining();
    if remaining.is_zero() {
        return Err(KubeError::Timeout {
            what: format!("CRD {} to become established", name),
            budget: deadline.budget(),
        });
    }

    let result = cluster.wait_crd_established(name, remaining).await?;
    if !result.success() {
        warn!(crd = name, "CRD did not become established");
        return Err(KubeError::CrdNotEstablished {
            name: name.to_string(),
            output: result.output,
        });
    }

    info!(crd = name, "CRD established");
    Ok(())
}

/// Wait for the rollout of a `<namespace>/<deployment>` to complete.
///
/// A malformed identifier fails before anything is sent to the cluster.
pub async fn wait_for_rollout<C: ClusterOps + ?Sized>(
    cluster: &C,
    rollout: &str,
    deadline: &Deadline,
) -> Result<()> {
    let rollout = RolloutRef::parse(rollout)?;

    let remaining = deadline.remaining();
    if remaining.is_zero() {
        return Err(KubeError::Timeout {
            what: format!("rollout of {}", rollout),
            budget: deadline.budget(),
        });
    }

    let result = cluster.wait_rollout(&rollout, remaining).await?;
    if !result.success() {
        warn!(%rollout, "rollout did not complete");
        return Err(KubeError::RolloutFailed {
            namespace: rollout.namespace,
            name: rollout.name,
            output: result.output,
        });
    }

    info!(%rollout, "rollout complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{ClusterCall, MockCluster};
    use tokio::time::Instant;

    const BUDGET: Duration = Duration::from_secs(180);
    const POLL: Duration = Duration::from_secs(1);

    #[tokio::test(start_paused = true)]
    async fn test_crd_already_established() {
        let mock = MockCluster::new().with_crd("foo");
        let start = Instant::now();
        let deadline = Deadline::after(BUDGET);

        wait_for_crd(&mock, "foo", &deadline, POLL).await.unwrap();

        assert!(start.elapsed() < BUDGET);
        assert_eq!(
            mock.calls(),
            vec![
                ClusterCall::CrdExists {
                    name: "foo".to_string()
                },
                ClusterCall::WaitCrdEstablished {
                    name: "foo".to_string(),
                    timeout: BUDGET
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_crd_never_exists_times_out_at_budget() {
        let mock = MockCluster::new();
        let budget = Duration::from_secs(10);
        let start = Instant::now();
        let deadline = Deadline::after(budget);

        let err = wait_for_crd(&mock, "missing", &deadline, POLL)
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert!(start.elapsed() >= budget);
        assert!(start.elapsed() < budget + POLL);
        // One query per second plus the final check at the deadline
        assert_eq!(mock.crd_queries("missing"), 11);
        assert!(
            !mock
                .calls()
                .iter()
                .any(|c| matches!(c, ClusterCall::WaitCrdEstablished { .. }))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_crd_not_timed_out_before_budget() {
        // Shows up on the 10th query, 9 seconds in
        let mock = MockCluster::new().with_crd_after("late", 9);
        let budget = Duration::from_secs(10);
        let start = Instant::now();
        let deadline = Deadline::after(budget);

        wait_for_crd(&mock, "late", &deadline, POLL).await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_secs(9));
        assert_eq!(
            mock.calls().last(),
            Some(&ClusterCall::WaitCrdEstablished {
                name: "late".to_string(),
                timeout: Duration::from_secs(1)
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_crd_established_wait_gets_remaining_budget() {
        let mock = MockCluster::new().with_crd_after("slow", 3);
        let deadline = Deadline::after(BUDGET);

        wait_for_crd(&mock, "slow", &deadline, POLL).await.unwrap();

        assert_eq!(
            mock.calls().last(),
            Some(&ClusterCall::WaitCrdEstablished {
                name: "slow".to_string(),
                timeout: BUDGET - Duration::from_secs(3)
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_crd_establish_failure_is_fatal() {
        let mock = MockCluster::new().with_unestablished_crd("broken");
        let deadline = Deadline::after(BUDGET);

        let err = wait_for_crd(&mock, "broken", &deadline, POLL)
            .await
            .unwrap_err();

        match err {
            KubeError::CrdNotEstablished { name, output } => {
                assert_eq!(name, "broken");
                assert!(output.contains("crd/broken"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_crd_establish_sub_timeout_is_fatal() {
        let mock = MockCluster::new().with_slow_crd("sluggish", Duration::from_secs(600));
        let start = Instant::now();
        let deadline = Deadline::after(BUDGET);

        let err = wait_for_crd(&mock, "sluggish", &deadline, POLL)
            .await
            .unwrap_err();

        assert!(matches!(err, KubeError::CrdNotEstablished { .. }));
        assert_eq!(start.elapsed(), BUDGET);
    }

    #[tokio::test(start_paused = true)]
    async fn test_crd_expired_deadline_after_exists() {
        let mock = MockCluster::new().with_crd("foo");
        let deadline = Deadline::after(Duration::from_secs(1));
        tokio::time::advance(Duration::from_secs(2)).await;

        let err = wait_for_crd(&mock, "foo", &deadline, POLL)
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rollout_parses_identifier() {
        let mock = MockCluster::new();
        let deadline = Deadline::after(BUDGET);

        wait_for_rollout(&mock, "ns/dep", &deadline).await.unwrap();

        assert_eq!(
            mock.calls(),
            vec![ClusterCall::WaitRollout {
                namespace: "ns".to_string(),
                name: "dep".to_string(),
                timeout: BUDGET
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rollout_malformed_identifier() {
        let mock = MockCluster::new();
        let deadline = Deadline::after(BUDGET);

        let err = wait_for_rollout(&mock, "dep", &deadline).await.unwrap_err();

        assert!(err.is_malformed_hook());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rollout_failure_reports_context() {
        let mock = MockCluster::new().with_failing_rollout("web/frontend");
        let deadline = Deadline::after(BUDGET);

        let err = wait_for_rollout(&mock, "web/frontend", &deadline)
            .await
            .unwrap_err();

        match err {
            KubeError::RolloutFailed {
                namespace,
                name,
                output,
            } => {
                assert_eq!(namespace, "web");
                assert_eq!(name, "frontend");
                assert!(output.contains("progress deadline"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rollout_with_no_budget_left() {
        let mock = MockCluster::new();
        let deadline = Deadline::after(Duration::from_secs(5));
        tokio::time::advance(Duration::from_secs(5)).await;

        let err = wait_for_rollout(&mock, "ns/dep", &deadline).await.unwrap_err();

        assert!(err.is_timeout());
        assert!(mock.calls().is_empty());
    }
}
