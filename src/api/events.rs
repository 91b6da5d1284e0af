use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::client::ApiClient;
use crate::api::models::PaymentStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    Payment(PaymentStatus),
    /// Gave up before the payment reached a final state.
    TimedOut,
}

/// Poll the payment status of `order_id` until it is final.
///
/// Only changes are forwarded. Failed requests are logged and still use up an
/// attempt. Returns early once the receiver is gone.
pub async fn poll_payment(
    client: ApiClient,
    order_id: u64,
    interval: Duration,
    max_attempts: u32,
    tx: mpsc::Sender<OrderEvent>,
) {
    let mut last: Option<PaymentStatus> = None;
    for attempt in 1..=max_attempts {
        if tx.is_closed() {
            return;
        }
        match client.payment_status(order_id).await {
            Ok(status) => {
                if last != Some(status) {
                    last = Some(status);
                    if tx.send(OrderEvent::Payment(status)).await.is_err() {
                        return;
                    }
                }
                if status.is_final() {
                    return;
                }
            }
            Err(e) => log::warn!("payment status for order {order_id} (attempt {attempt}): {e}"),
        }
        if attempt < max_attempts {
            tokio::time::sleep(interval).await;
        }
    }
    let _ = tx.send(OrderEvent::TimedOut).await;
}

pub fn watch_payment(
    client: ApiClient,
    order_id: u64,
    interval: Duration,
    max_attempts: u32,
) -> (mpsc::Receiver<OrderEvent>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(8);
    let handle = tokio::spawn(poll_payment(client, order_id, interval, max_attempts, tx));
    (rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn status_body(status: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": { "status": status } }))
    }

    async fn collect(mut rx: mpsc::Receiver<OrderEvent>) -> Vec<OrderEvent> {
        let mut out = Vec::new();
        while let Some(ev) = rx.recv().await {
            out.push(ev);
        }
        out
    }

    #[tokio::test]
    async fn forwards_changes_until_final() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/payment_status.php"))
            .respond_with(status_body("pending"))
            .up_to_n_times(3)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/payment_status.php"))
            .respond_with(status_body("paid"))
            .with_priority(2)
            .mount(&server)
            .await;

        let client = ApiClient::new(&format!("{}/api", server.uri())).unwrap();
        let (rx, handle) = watch_payment(client, 501, Duration::from_millis(5), 10);
        let events = collect(rx).await;
        handle.await.unwrap();

        assert_eq!(
            events,
            vec![
                OrderEvent::Payment(PaymentStatus::Pending),
                OrderEvent::Payment(PaymentStatus::Paid),
            ]
        );
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/payment_status.php"))
            .respond_with(status_body("pending"))
            .expect(3)
            .mount(&server)
            .await;

        let client = ApiClient::new(&format!("{}/api", server.uri())).unwrap();
        let (rx, handle) = watch_payment(client, 501, Duration::from_millis(5), 3);
        let events = collect(rx).await;
        handle.await.unwrap();

        assert_eq!(
            events,
            vec![OrderEvent::Payment(PaymentStatus::Pending), OrderEvent::TimedOut]
        );
    }

    #[tokio::test]
    async fn request_errors_count_as_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/payment_status.php"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let client = ApiClient::new(&format!("{}/api", server.uri())).unwrap();
        let (rx, handle) = watch_payment(client, 501, Duration::from_millis(5), 2);
        assert_eq!(collect(rx).await, vec![OrderEvent::TimedOut]);
        handle.await.unwrap();
    }
}
