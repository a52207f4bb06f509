mod common;

use common::{closed_port_url, spawn_gateway, spawn_silent_gateway};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use unitwatch::domain::errors::PushFailure;
use unitwatch::domain::ports::MetricsPusher;
use unitwatch::domain::push_target::PushTarget;
use unitwatch::infrastructure::HttpPusher;
use url::Url;

const PAYLOAD: &str = "# TYPE service_state gauge\nservice_state{service=\"a.service\"} 1\n";

fn target(base: &str) -> PushTarget {
    PushTarget::new(Url::parse(base).unwrap(), "top", "machine")
}

fn pusher() -> HttpPusher {
    HttpPusher::new(Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn test_push_posts_payload_to_grouping_key() {
    let mut gateway = spawn_gateway(200).await;

    assert_ok!(pusher().push(&target(&gateway.url), PAYLOAD.to_string()).await);

    let request = gateway.requests.recv().await.unwrap();
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/metrics/job/top/instance/machine");
    assert!(request.header("content-type").unwrap().starts_with("text/plain"));
    assert_eq!(request.body, PAYLOAD);
}

#[tokio::test]
async fn test_any_2xx_is_success() {
    let mut gateway = spawn_gateway(202).await;

    assert_ok!(pusher().push(&target(&gateway.url), PAYLOAD.to_string()).await);
    assert!(gateway.requests.recv().await.is_some());
}

#[tokio::test]
async fn test_non_2xx_is_rejected_with_status() {
    for status in [400u16, 404, 500, 503] {
        let gateway = spawn_gateway(status).await;

        let err = assert_err!(pusher().push(&target(&gateway.url), PAYLOAD.to_string()).await);
        match err {
            PushFailure::Rejected {
                status: got, body, ..
            } => {
                assert_eq!(got, status);
                assert_eq!(body, "push rejected");
            }
            other => panic!("expected Rejected for {status}, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_connection_refused_is_transport_failure() {
    let url = closed_port_url().await;

    let err = assert_err!(pusher().push(&target(&url), PAYLOAD.to_string()).await);
    assert!(matches!(err, PushFailure::Transport { .. }));
}

#[tokio::test]
async fn test_unresponsive_gateway_times_out() {
    let url = spawn_silent_gateway().await;
    let pusher = HttpPusher::new(Duration::from_millis(200)).unwrap();

    let started = std::time::Instant::now();
    let err = assert_err!(pusher.push(&target(&url), PAYLOAD.to_string()).await);

    assert!(matches!(err, PushFailure::Transport { .. }));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_unit_scoped_push_path() {
    let mut gateway = spawn_gateway(200).await;
    let target = target(&gateway.url).for_unit("getty@tty1.service");

    assert_ok!(pusher().push(&target, PAYLOAD.to_string()).await);

    let request = gateway.requests.recv().await.unwrap();
    assert_eq!(
        request.path,
        "/metrics/job/top/instance/machine/service/getty@tty1.service"
    );
}
