//! Usage: Run synchronous sqlite work off the async worker threads.

use crate::shared::error::{LinkError, LinkResult};

/// Moves a blocking closure (pool acquire, query under busy timeout) onto
/// the blocking thread pool so handlers never stall a tokio worker.
pub async fn run<T>(
    label: &'static str,
    f: impl FnOnce() -> LinkResult<T> + Send + 'static,
) -> LinkResult<T>
where
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(join_err) => {
            // Panic payloads may quote user-controlled content; log the
            // label only and keep the payload out of the error message.
            if join_err.is_panic() {
                tracing::error!(label, "blocking task panicked");
                return Err(LinkError::Storage(format!("{label}: task panicked")));
            }

            tracing::warn!(label, "blocking task cancelled");
            Err(LinkError::Storage(format!("{label}: task cancelled")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_returns_the_closure_result() {
        let value = run("sample", || Ok::<_, LinkError>(7)).await.expect("value");
        assert_eq!(value, 7);

        let err = run("failing", || Err::<(), _>(LinkError::NotFound))
            .await
            .expect_err("propagated");
        assert!(matches!(err, LinkError::NotFound));
    }

    #[tokio::test]
    async fn run_reports_panics_as_storage_errors() {
        let err = run("exploding", || -> LinkResult<()> { panic!("boom") })
            .await
            .expect_err("panic surfaced");
        assert!(matches!(err, LinkError::Storage(_)));
    }
}
