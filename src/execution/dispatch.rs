//! Fan-out dispatch
//!
//! Runs the descriptors of one call in provider order and collects one
//! outcome per leg. Nothing is silently dropped: every attempted leg is
//! either a success or a recorded failure.

use std::future::Future;

use super::executor::{RawResponse, TransportExecutor};
use super::planner::{LegInfo, RequestDescriptor};
use crate::config::{FanOutPolicy, StatusErrorPolicy};
use crate::error::{LegFailure, LlmError};

/// Result of one leg.
#[derive(Debug)]
pub struct LegOutcome<T> {
    pub leg: LegInfo,
    pub result: Result<T, LlmError>,
}

/// Every attempted leg of a call, in provider order.
#[derive(Debug)]
pub struct FanOut<T> {
    legs: Vec<LegOutcome<T>>,
}

impl<T> FanOut<T> {
    pub fn legs(&self) -> &[LegOutcome<T>] {
        &self.legs
    }

    pub fn into_legs(self) -> Vec<LegOutcome<T>> {
        self.legs
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    /// Successful results, in provider order.
    pub fn successes(&self) -> impl Iterator<Item = &T> {
        self.legs.iter().filter_map(|l| l.result.as_ref().ok())
    }

    /// Failed legs, in provider order.
    pub fn failures(&self) -> impl Iterator<Item = (&LegInfo, &LlmError)> {
        self.legs
            .iter()
            .filter_map(|l| l.result.as_ref().err().map(|e| (&l.leg, e)))
    }

    /// Collapse into a single result.
    ///
    /// The first success wins. A single failed leg surfaces its own error;
    /// several failed legs become `FanOutFailed`.
    pub fn into_result(self) -> Result<T, LlmError> {
        let mut failures = Vec::new();
        for outcome in self.legs {
            match outcome.result {
                Ok(value) => return Ok(value),
                Err(error) => failures.push(LegFailure {
                    index: outcome.leg.index,
                    model: outcome.leg.model,
                    error,
                }),
            }
        }
        if failures.len() > 1 {
            return Err(LlmError::FanOutFailed { failures });
        }
        match failures.pop() {
            Some(failure) => Err(failure.error),
            None => Err(LlmError::ConfigurationError(
                "no request was dispatched".to_string(),
            )),
        }
    }
}

/// Dispatch settings taken from `ClientConfig`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchPolicy {
    pub fan_out: FanOutPolicy,
    pub on_status_error: StatusErrorPolicy,
}

/// Execute `descriptors` in order, handing each 2xx response to `handle`.
///
/// Transport and decode failures are recorded per leg. A status error is
/// recorded too unless the policy says `Abort`, in which case it is
/// returned immediately. With `FirstSuccess` dispatch stops at the first
/// leg whose `handle` succeeds.
pub async fn dispatch<T, F, Fut>(
    executor: &TransportExecutor,
    descriptors: Vec<RequestDescriptor>,
    policy: DispatchPolicy,
    handle: F,
) -> Result<FanOut<T>, LlmError>
where
    F: Fn(RawResponse) -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let total = descriptors.len();
    let mut legs = Vec::with_capacity(total);

    for descriptor in descriptors {
        let leg = descriptor.leg.clone();
        let result = match executor.execute(descriptor).await {
            Ok(raw) => handle(raw).await,
            Err(error) => Err(error),
        };

        let abort = policy.on_status_error == StatusErrorPolicy::Abort;
        let result = match result {
            Ok(value) => {
                tracing::debug!(target: "numexa::http", leg = leg.index, total, "leg succeeded");
                Ok(value)
            }
            Err(error) if abort && matches!(error, LlmError::HttpStatusError { .. }) => {
                tracing::warn!(target: "numexa::http", leg = leg.index, %error, "aborting fan-out");
                return Err(error);
            }
            Err(error) => {
                tracing::warn!(
                    target: "numexa::http",
                    leg = leg.index,
                    model = ?leg.model,
                    %error,
                    "leg failed"
                );
                Err(error)
            }
        };

        let succeeded = result.is_ok();
        legs.push(LegOutcome { leg, result });
        if succeeded && policy.fan_out == FanOutPolicy::FirstSuccess {
            break;
        }
    }

    Ok(FanOut { legs })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(index: usize, model: &str) -> LegInfo {
        LegInfo {
            index,
            model: Some(model.to_string()),
        }
    }

    fn status(code: u16) -> LlmError {
        LlmError::HttpStatusError {
            status: code,
            url: "http://upstream".to_string(),
            message: format!("Error code: {code}"),
            body: None,
        }
    }

    #[test]
    fn first_success_wins() {
        let fan_out = FanOut {
            legs: vec![
                LegOutcome { leg: leg(0, "a"), result: Err(status(500)) },
                LegOutcome { leg: leg(1, "b"), result: Ok("b") },
                LegOutcome { leg: leg(2, "c"), result: Ok("c") },
            ],
        };
        assert_eq!(fan_out.successes().count(), 2);
        assert_eq!(fan_out.failures().count(), 1);
        assert_eq!(fan_out.into_result().unwrap(), "b");
    }

    #[test]
    fn single_failure_surfaces_directly() {
        let fan_out: FanOut<()> = FanOut {
            legs: vec![LegOutcome { leg: leg(0, "a"), result: Err(status(401)) }],
        };
        let err = fan_out.into_result().unwrap_err();
        assert_eq!(err.status_code(), Some(401));
    }

    #[test]
    fn every_failure_is_kept() {
        let fan_out: FanOut<()> = FanOut {
            legs: vec![
                LegOutcome { leg: leg(0, "a"), result: Err(status(500)) },
                LegOutcome { leg: leg(1, "b"), result: Err(status(503)) },
            ],
        };
        match fan_out.into_result().unwrap_err() {
            LlmError::FanOutFailed { failures } => {
                let models: Vec<_> = failures.iter().map(|f| f.model.as_deref()).collect();
                assert_eq!(models, vec![Some("a"), Some("b")]);
                assert_eq!(failures[1].error.status_code(), Some(503));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    mod wire {
        use super::*;
        use reqwest::Method;
        use reqwest::header::HeaderMap;
        use serde_json::{Value, json};
        use std::time::Duration;
        use tracing_test::traced_test;
        use wiremock::matchers::{body_partial_json, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        fn descriptor(server: &MockServer, index: usize, model: &str) -> RequestDescriptor {
            RequestDescriptor {
                method: Method::POST,
                url: format!("{}/chat/completions", server.uri()),
                headers: HeaderMap::new(),
                body: json!({"model": model, "messages": [{"role": "user", "content": "hi"}]}),
                timeout: Duration::from_secs(5),
                stream: false,
                leg: LegInfo {
                    index,
                    model: Some(model.to_string()),
                },
            }
        }

        async fn mount(server: &MockServer, model: &str, template: ResponseTemplate) {
            Mock::given(method("POST"))
                .and(path("/chat/completions"))
                .and(body_partial_json(json!({"model": model})))
                .respond_with(template)
                .mount(server)
                .await;
        }

        async fn body_of(raw: RawResponse) -> Result<Value, LlmError> {
            match raw.body {
                crate::execution::ResponseBody::Buffered(bytes) => {
                    Ok(serde_json::from_slice(&bytes)?)
                }
                _ => Err(LlmError::StreamError("unexpected stream".into())),
            }
        }

        #[tokio::test]
        #[traced_test]
        async fn status_error_is_logged_and_next_leg_runs() {
            let server = MockServer::start().await;
            mount(
                &server,
                "a",
                ResponseTemplate::new(500).set_body_json(json!({"error": {"message": "boom"}})),
            )
            .await;
            mount(&server, "b", ResponseTemplate::new(200).set_body_json(json!({"ok": "b"}))).await;

            let executor = TransportExecutor::new(reqwest::Client::new());
            let fan_out = dispatch(
                &executor,
                vec![descriptor(&server, 0, "a"), descriptor(&server, 1, "b")],
                DispatchPolicy::default(),
                body_of,
            )
            .await
            .unwrap();

            assert_eq!(fan_out.len(), 2);
            assert_eq!(fan_out.failures().next().unwrap().1.status_code(), Some(500));
            assert_eq!(fan_out.into_result().unwrap(), json!({"ok": "b"}));
            assert!(logs_contain("upstream returned an error status"));
            assert!(logs_contain("boom"));
        }

        #[tokio::test]
        async fn abort_policy_returns_the_status_error() {
            let server = MockServer::start().await;
            mount(&server, "a", ResponseTemplate::new(429)).await;
            mount(&server, "b", ResponseTemplate::new(200).set_body_json(json!({"ok": "b"}))).await;

            let executor = TransportExecutor::new(reqwest::Client::new());
            let policy = DispatchPolicy {
                on_status_error: StatusErrorPolicy::Abort,
                ..Default::default()
            };
            let err = dispatch(
                &executor,
                vec![descriptor(&server, 0, "a"), descriptor(&server, 1, "b")],
                policy,
                body_of,
            )
            .await
            .unwrap_err();

            assert_eq!(err.status_code(), Some(429));
            assert_eq!(server.received_requests().await.unwrap().len(), 1);
        }

        #[tokio::test]
        async fn all_policy_dispatches_every_leg_in_order() {
            let server = MockServer::start().await;
            mount(&server, "a", ResponseTemplate::new(200).set_body_json(json!({"ok": "a"}))).await;
            mount(&server, "b", ResponseTemplate::new(200).set_body_json(json!({"ok": "b"}))).await;

            let executor = TransportExecutor::new(reqwest::Client::new());
            let policy = DispatchPolicy {
                fan_out: FanOutPolicy::All,
                ..Default::default()
            };
            let fan_out = dispatch(
                &executor,
                vec![descriptor(&server, 0, "a"), descriptor(&server, 1, "b")],
                policy,
                body_of,
            )
            .await
            .unwrap();

            let oks: Vec<_> = fan_out.successes().map(|v| v["ok"].clone()).collect();
            assert_eq!(oks, vec![json!("a"), json!("b")]);
        }
    }
}
