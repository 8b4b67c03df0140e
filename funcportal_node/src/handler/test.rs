// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT
use super::*;
use crate::jobs::memory::MemoryJobStore;
use funcportal_api::job::{JobResult, JobStoreAPI, JobWorkerAPI};
use funcportal_api::Signature;

struct UnavailableJobStore {}

#[async_trait::async_trait]
impl JobStoreAPI for UnavailableJobStore {
    async fn enqueue(&self, _function: &str, _arguments: Arguments) -> anyhow::Result<Token> {
        anyhow::bail!("connection refused")
    }

    async fn fetch(&self, _function: &str, _token: &Token) -> anyhow::Result<JobView> {
        anyhow::bail!("connection refused")
    }
}

fn sync_handler(adapter: FunctionAdapter) -> FunctionHandler {
    FunctionHandler::synchronous("/test", adapter)
}

fn async_handler(store: &MemoryJobStore) -> FunctionHandler {
    FunctionHandler::asynchronous(
        "/multiply",
        crate::demo::multiply().unwrap(),
        JobLifecycle::new(std::sync::Arc::new(store.clone())),
    )
}

#[tokio::test]
async fn test_call_multiply() {
    let handler = sync_handler(crate::demo::multiply().unwrap());
    assert!(!handler.is_asynchronous());
    assert_eq!(Outcome::Success(serde_json::json!(6)), handler.call(Some(br#"{"x": 2, "y": 3}"#)).await);
}

#[tokio::test]
async fn test_call_exponent_with_and_without_default() {
    let handler = sync_handler(crate::demo::exponent().unwrap());
    assert_eq!(Outcome::Success(serde_json::json!(9)), handler.call(Some(br#"{"base": 3}"#)).await);
    assert_eq!(Outcome::Success(serde_json::json!(81)), handler.call(Some(br#"{"base": 3, "power": 4}"#)).await);
}

#[tokio::test]
async fn test_call_missing_arguments() {
    let handler = sync_handler(crate::demo::multiply().unwrap());
    match handler.call(Some(br#"{"x": 2}"#)).await {
        Outcome::MissingArguments { message, arguments } => {
            assert_eq!("multiply() missing 1 required argument: 'y'", message);
            assert_eq!(handler.adapter().describe(), arguments);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    // an empty body is an empty argument set
    for body in [None, Some(&b""[..]), Some(&b" \n"[..])] {
        match handler.call(body).await {
            Outcome::MissingArguments { message, .. } => assert_eq!("multiply() missing 2 required arguments: 'x', 'y'", message),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_call_malformed_payload() {
    let handler = sync_handler(crate::demo::multiply().unwrap());
    assert_eq!(Outcome::MalformedPayload, handler.call(Some(b"{\"x\": 2,")).await);
    assert_eq!(Outcome::MalformedPayload, handler.call(Some(b"[2, 3]")).await);
    assert_eq!(Outcome::MalformedPayload, handler.call(Some(b"6")).await);
}

#[tokio::test]
async fn test_call_without_parameters_ignores_body() {
    let handler = sync_handler(FunctionAdapter::new("answer", Signature::new(), |_| Ok(42)).unwrap());
    assert_eq!(Outcome::Success(serde_json::json!(42)), handler.call(None).await);
    assert_eq!(Outcome::Success(serde_json::json!(42)), handler.call(Some(b"not json at all")).await);
}

#[tokio::test]
async fn test_call_invalid_arguments() {
    let handler = sync_handler(crate::demo::multiply().unwrap());
    assert_eq!(Outcome::InvalidArguments, handler.call(Some(br#"{"x": "two", "y": 3}"#)).await);
}

#[tokio::test]
async fn test_call_runtime_failure() {
    let failing = FunctionAdapter::new("failing", Signature::new(), |_| -> anyhow::Result<i32> {
        anyhow::bail!("secret detail")
    })
    .unwrap();
    let outcome = sync_handler(failing).call(None).await;
    assert_eq!(Outcome::RuntimeFailure, outcome);
    assert!(!outcome.body().to_string().contains("secret detail"));
}

#[tokio::test]
async fn test_call_panicking_function() {
    let panicking = FunctionAdapter::new("panicking", Signature::new(), |_| -> anyhow::Result<i32> { panic!("unexpected") }).unwrap();
    let handler = sync_handler(panicking);
    assert_eq!(Outcome::RuntimeFailure, handler.call(None).await);
    // the handler is still usable afterwards
    assert_eq!(Outcome::RuntimeFailure, handler.call(None).await);
}

#[tokio::test]
async fn test_call_serialization_failure() {
    let adapter = FunctionAdapter::new("tuple_keys", Signature::new(), |_| {
        Ok(std::collections::HashMap::from([((1, 2), "pair")]))
    })
    .unwrap();
    assert_eq!(Outcome::SerializationFailure, sync_handler(adapter).call(None).await);
}

#[tokio::test]
async fn test_call_non_finite_result() {
    let infinite = FunctionAdapter::new("infinite", Signature::new(), |_| Ok(f64::INFINITY)).unwrap();
    assert_eq!(Outcome::SerializationFailure, sync_handler(infinite).call(None).await);

    let outcome = sync_handler(crate::demo::multiply().unwrap())
        .call(Some(br#"{"x": 1e308, "y": 10}"#))
        .await;
    assert_eq!(Outcome::SerializationFailure, outcome);
    assert_eq!(500, outcome.render("/test").status);
}

#[tokio::test]
async fn test_retrieve_on_synchronous_route() {
    let handler = sync_handler(crate::demo::multiply().unwrap());
    assert_eq!(Outcome::NoRoute, handler.retrieve(&Token::new()).await);
}

#[tokio::test]
async fn test_async_lifecycle() {
    let store = MemoryJobStore::new();
    let handler = async_handler(&store);
    assert!(handler.is_asynchronous());

    let token = match handler.call(Some(br#"{"x": 2, "y": 3}"#)).await {
        Outcome::Accepted(token) => token,
        other => panic!("unexpected outcome: {:?}", other),
    };
    assert_eq!(Outcome::JobPending, handler.retrieve(&token).await);
    assert_eq!(Outcome::JobNotFound, handler.retrieve(&Token::new()).await);

    let job = store.next_job().await.unwrap().unwrap();
    assert_eq!(token, job.token);
    let result = handler.adapter().invoke(job.arguments).unwrap();
    store.complete(&token, JobResult::Completed(result)).await.unwrap();

    for _ in 0..3 {
        assert_eq!(Outcome::Success(serde_json::json!(6)), handler.retrieve(&token).await);
    }
}

#[tokio::test]
async fn test_async_validates_before_enqueueing() {
    let store = MemoryJobStore::new();
    let handler = async_handler(&store);

    assert!(matches!(
        handler.call(Some(br#"{"y": 3}"#)).await,
        Outcome::MissingArguments { .. }
    ));
    assert_eq!(Outcome::MalformedPayload, handler.call(Some(b"{")).await);
    assert_eq!(0, store.queued().await);
}

#[tokio::test]
async fn test_async_failed_job() {
    let store = MemoryJobStore::new();
    let handler = async_handler(&store);

    let token = match handler.call(Some(br#"{"x": 2, "y": 3}"#)).await {
        Outcome::Accepted(token) => token,
        other => panic!("unexpected outcome: {:?}", other),
    };
    store.complete(&token, JobResult::Failed("boom".to_string())).await.unwrap();
    assert_eq!(Outcome::JobFailed, handler.retrieve(&token).await);
}

#[tokio::test]
async fn test_async_store_unavailable() {
    let handler = FunctionHandler::asynchronous(
        "/multiply",
        crate::demo::multiply().unwrap(),
        JobLifecycle::new(std::sync::Arc::new(UnavailableJobStore {})),
    );
    assert_eq!(Outcome::RuntimeFailure, handler.call(Some(br#"{"x": 2, "y": 3}"#)).await);
    assert_eq!(Outcome::RuntimeFailure, handler.retrieve(&Token::new()).await);
}

#[test]
fn test_parse_arguments() {
    let adapter = crate::demo::multiply().unwrap();
    let arguments = parse_arguments(&adapter, Some(br#"{"x": 2, "y": 3, "z": null}"#)).unwrap();
    assert_eq!(3, arguments.len());
    assert_eq!(Some(&serde_json::Value::Null), arguments.raw("z"));
    assert!(parse_arguments(&adapter, Some(b"null")).is_err());
}
