//! End-to-end pipeline test for riskguard-node.
//!
//! Starts a real node process against the in-memory store/broker adapters
//! and drives it over its real HTTP API, exercising the seed scenarios and
//! testable properties from spec.md §8.
//!
//! Run with:
//!   cargo test -p riskguard-node --test pipeline

use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use serde_json::{json, Value};

struct NodeGuard {
    child: Child,
}

impl Drop for NodeGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
}

async fn wait_for_ready(client: &reqwest::Client, base: &str, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Ok(resp) = client.get(format!("{base}/api/system-stats")).send().await {
            if resp.status().is_success() {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    false
}

async fn submit(client: &reqwest::Client, base: &str, body: Value) -> String {
    let resp = client
        .post(format!("{base}/api/transaction"))
        .json(&body)
        .send()
        .await
        .expect("submit_transaction request failed");
    assert_eq!(resp.status(), reqwest::StatusCode::ACCEPTED);
    let parsed: Value = resp.json().await.expect("parse submit response");
    parsed["transaction_id"].as_str().unwrap().to_string()
}

async fn simulate(client: &reqwest::Client, base: &str, body: Value) -> String {
    let resp = client
        .post(format!("{base}/api/simulate-fraud"))
        .json(&body)
        .send()
        .await
        .expect("simulate_fraud request failed");
    assert_eq!(resp.status(), reqwest::StatusCode::ACCEPTED);
    let parsed: Value = resp.json().await.expect("parse simulate response");
    parsed["transaction_id"].as_str().unwrap().to_string()
}

/// Polls `/api/risk-details/{id}` until the worker has finalized the
/// transaction (200, not the pending 202), or panics after a generous
/// deadline — a worker stall here is a real bug, not a flaky test.
async fn wait_for_finalized(client: &reqwest::Client, base: &str, id: &str) -> Value {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let resp = client
            .get(format!("{base}/api/risk-details/{id}"))
            .send()
            .await
            .expect("risk-details request failed");
        if resp.status() == reqwest::StatusCode::OK {
            return resp.json().await.expect("parse risk-details response");
        }
        if Instant::now() > deadline {
            panic!("transaction {id} never finalized within 10s");
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

#[tokio::test]
async fn pipeline_seed_scenarios_and_properties() {
    let http_port = free_port();
    let base = format!("http://127.0.0.1:{http_port}");

    let node_bin = env!("CARGO_BIN_EXE_riskguard-node");
    let child = Command::new(node_bin)
        .args(["--in-memory", "--http-addr", &format!("127.0.0.1:{http_port}"), "--workers", "2"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn riskguard-node");
    let _guard = NodeGuard { child };

    let client = reqwest::Client::new();
    assert!(wait_for_ready(&client, &base, Duration::from_secs(10)).await, "node never became ready");

    // ── Seed 1: Approve-clean ────────────────────────────────────────────
    // 15 prior transactions averaging 500 (with realistic day-to-day spread,
    // not a degenerate zero-variance history — identical historical amounts
    // would floor the amount-anomaly sigma and saturate the z-score on any
    // later transaction), one per day so none fall inside the velocity
    // windows, then one more in the same band.
    let clean_amounts = [
        400.0, 600.0, 450.0, 550.0, 500.0, 480.0, 520.0, 510.0, 490.0, 505.0, 495.0, 515.0, 485.0, 460.0, 540.0,
    ];
    for (day, amount) in clean_amounts.iter().enumerate() {
        submit(
            &client,
            &base,
            json!({
                "sender_id": "alice",
                "receiver_id": "bob",
                "amount": amount,
                "timestamp": format!("2024-03-{:02}T14:00:00Z", day + 1),
            }),
        )
        .await;
    }
    let clean_id = submit(
        &client,
        &base,
        json!({ "sender_id": "alice", "receiver_id": "bob", "amount": 450.0, "timestamp": "2024-03-20T14:00:00Z" }),
    )
    .await;
    let clean = wait_for_finalized(&client, &base, &clean_id).await;
    assert!(clean["risk_score"].as_f64().unwrap() < 0.3, "expected low risk, got {clean}");
    assert_eq!(clean["status"], "approved");

    // ── Seed 2: Phishing URL ─────────────────────────────────────────────
    let phish_id = submit(
        &client,
        &base,
        json!({
            "sender_id": "carol",
            "receiver_id": "dave",
            "amount": 75.0,
            "txn_metadata": { "payment_url": "http://secure-verify-authenticate.totally-fake-bank.tk/payment" },
        }),
    )
    .await;
    let phish = wait_for_finalized(&client, &base, &phish_id).await;
    assert!(phish["content_analysis_score"].as_f64().unwrap() >= 0.8, "expected high content score, got {phish}");
    assert_eq!(phish["status"], "blocked");
    assert!(phish["risk_details"]["override_reason"].is_string());

    // ── Seed 3: QR tamper simulation ─────────────────────────────────────
    let qr_id = simulate(
        &client,
        &base,
        json!({ "fraud_type": "qr_code_tampering", "sender_id": "erin", "receiver_id": "frank", "amount": 200.0 }),
    )
    .await;
    let qr = wait_for_finalized(&client, &base, &qr_id).await;
    assert_eq!(qr["content_analysis_score"].as_f64().unwrap(), 0.92);
    assert_eq!(qr["status"], "blocked");

    // ── Seed 4: Velocity burst ───────────────────────────────────────────
    // 9 transactions inside one hour drive the sender's rolling 1h velocity
    // over the high_frequency_hour cutoff and establish the sender as a
    // regular (non-new) account; the 10th lands on a receiver with no prior
    // history at all, so the per-job graph never forms a node for it and
    // C4's graph half stays at its neutral default rather than being pulled
    // down by the usual familiar-counterparty discount — letting the
    // velocity/new-recipient signal drive the decision to pending_verification.
    for minute in 0..9 {
        let id = submit(
            &client,
            &base,
            json!({
                "sender_id": "greg",
                "receiver_id": "zane",
                "amount": 100.0,
                "timestamp": format!("2024-04-01T02:{:02}:00Z", minute),
            }),
        )
        .await;
        wait_for_finalized(&client, &base, &id).await;
    }
    let burst_id = submit(
        &client,
        &base,
        json!({
            "sender_id": "greg",
            "receiver_id": "hank",
            "amount": 100.0,
            "timestamp": "2024-04-01T02:09:00Z",
        }),
    )
    .await;
    let burst = wait_for_finalized(&client, &base, &burst_id).await;
    assert_eq!(burst["status"], "pending_verification", "expected velocity burst to escalate, got {burst}");
    let temporal_details = &burst["risk_details"]["graph_temporal_details"]["temporal"];
    assert_eq!(temporal_details["high_frequency_hour"], true, "expected high_frequency_hour, got {burst}");

    // ── Seed 5: High-value amplification ─────────────────────────────────
    let high_value_id =
        submit(&client, &base, json!({ "sender_id": "iris", "receiver_id": "jack", "amount": 60_000.0 })).await;
    let high_value = wait_for_finalized(&client, &base, &high_value_id).await;
    assert!(
        (high_value["risk_details"]["amount_factor"].as_f64().unwrap() - 0.2).abs() < 1e-6,
        "expected amount_factor ~= 0.2, got {high_value}"
    );
    assert!(high_value["risk_details"]["amount_factor"].as_f64().unwrap() > 0.0);

    // ── Seed 6 / P2: Idempotent redelivery ───────────────────────────────
    // The worker already acks on the first pass; re-submitting the very same
    // id isn't exposed over HTTP, so this exercises the property the spec
    // actually states: re-reading a terminal record never changes it.
    let before = wait_for_finalized(&client, &base, &clean_id).await;
    let after = wait_for_finalized(&client, &base, &clean_id).await;
    assert_eq!(before["risk_score"], after["risk_score"]);
    assert_eq!(before["status"], after["status"]);

    // ── P3: both sub-scores and risk_score in [0, 1] ─────────────────────
    for result in [&clean, &phish, &qr, &burst, &high_value] {
        for field in ["risk_score", "graph_temporal_score", "content_analysis_score"] {
            let v = result[field].as_f64().unwrap();
            assert!((0.0..=1.0).contains(&v), "{field} out of range: {v}");
        }
    }

    // ── P6: content_analysis_score > 0.8 implies blocked ─────────────────
    for result in [&phish, &qr] {
        assert!(result["content_analysis_score"].as_f64().unwrap() > 0.8);
        assert_eq!(result["status"], "blocked");
    }

    // ── P7: simulated network_fraud and high_value overrides ─────────────
    let network_id = simulate(
        &client,
        &base,
        json!({ "fraud_type": "network_fraud", "sender_id": "kate", "receiver_id": "liam", "amount": 80.0 }),
    )
    .await;
    let network = wait_for_finalized(&client, &base, &network_id).await;
    assert_eq!(network["status"], "blocked");

    let amplified_id = simulate(
        &client,
        &base,
        json!({ "fraud_type": "high_value", "sender_id": "mike", "receiver_id": "nora", "amount": 500.0 }),
    )
    .await;
    let amplified = wait_for_finalized(&client, &base, &amplified_id).await;
    assert_eq!(amplified["status"], "pending_verification");

    // ── P1: every submitted id reaches exactly one terminal status ───────
    for result in [&clean, &phish, &qr, &burst, &high_value, &network, &amplified] {
        let status = result["status"].as_str().unwrap();
        assert!(["approved", "pending_verification", "blocked"].contains(&status));
    }
}
