//! Ordered endpoint candidates.
//!
//! Some backend operations have moved between paths and which one is current
//! is not documented. [`try_candidates`] walks an ordered list of paths,
//! returning the first success and surfacing only the final failure.

use std::future::Future;

use crate::error::ApiError;

/// Errors that would repeat on every candidate. Trying the rest only adds
/// requests.
fn is_terminal(err: &ApiError) -> bool {
    matches!(
        err,
        ApiError::Unauthorized { .. }
            | ApiError::NotAuthenticated
            | ApiError::Validation(_)
            | ApiError::InvalidBaseUrl { .. }
    )
}

/// Executes `attempt` against each path in `candidates`, in order, until one
/// succeeds.
///
/// Terminal errors (401, missing session, client-side validation) are
/// returned as-is without trying the remaining paths. When every candidate
/// fails the result is [`ApiError::AllCandidatesFailed`] wrapping the last
/// error.
pub(crate) async fn try_candidates<T, P, F, Fut>(
    operation: &str,
    candidates: &[P],
    mut attempt: F,
) -> Result<T, ApiError>
where
    P: AsRef<str>,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut last_err = None;

    for (index, candidate) in candidates.iter().enumerate() {
        let path = candidate.as_ref();
        match attempt(path.to_owned()).await {
            Ok(value) => {
                if index > 0 {
                    tracing::debug!(operation, path, index, "candidate endpoint succeeded");
                }
                return Ok(value);
            }
            Err(err) if is_terminal(&err) => return Err(err),
            Err(err) => {
                tracing::warn!(
                    operation,
                    path,
                    remaining = candidates.len() - index - 1,
                    error = %err,
                    "candidate endpoint failed"
                );
                last_err = Some(err);
            }
        }
    }

    match last_err {
        Some(last) => Err(ApiError::AllCandidatesFailed {
            operation: operation.to_owned(),
            attempts: candidates.len(),
            last: Box::new(last),
        }),
        None => Err(ApiError::NoCandidates {
            operation: operation.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn not_found(path: &str) -> ApiError {
        ApiError::Status {
            status: 404,
            url: path.to_owned(),
            message: "Not Found".to_owned(),
        }
    }

    #[tokio::test]
    async fn stops_at_first_success() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let result = try_candidates("create order", &["/a", "/b", "/c"], |path| {
            let s = Arc::clone(&s);
            async move {
                s.lock().unwrap().push(path.clone());
                if path == "/b" {
                    Ok(path)
                } else {
                    Err(not_found(&path))
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "/b");
        assert_eq!(*seen.lock().unwrap(), vec!["/a", "/b"]);
    }

    #[tokio::test]
    async fn surfaces_only_the_last_failure() {
        let result = try_candidates("order by id", &["/a", "/b"], |path| async move {
            Err::<(), _>(not_found(&path))
        })
        .await;

        match result {
            Err(ApiError::AllCandidatesFailed {
                operation,
                attempts,
                last,
            }) => {
                assert_eq!(operation, "order by id");
                assert_eq!(attempts, 2);
                assert!(matches!(*last, ApiError::Status { ref url, .. } if url == "/b"));
            }
            other => panic!("expected AllCandidatesFailed, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unauthorized_short_circuits() {
        let calls = Arc::new(Mutex::new(0u32));
        let c = Arc::clone(&calls);
        let result = try_candidates("my orders", &["/a", "/b", "/c"], |path| {
            let c = Arc::clone(&c);
            async move {
                *c.lock().unwrap() += 1;
                Err::<(), _>(ApiError::Unauthorized {
                    url: path,
                    message: "expired".to_owned(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_candidate_list_is_an_error() {
        let candidates: [&str; 0] = [];
        let result =
            try_candidates("create order", &candidates, |_| async { Ok::<(), ApiError>(()) }).await;
        assert!(matches!(result, Err(ApiError::NoCandidates { .. })));
    }
}
