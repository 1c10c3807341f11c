use anyhow::{bail, Context};
use serde_json::Value;

/// Thin REST client for a running `riskguard-node` — generalizes
/// `chronx_wallet::rpc_client::WalletRpcClient`'s shape (raw
/// `reqwest::Client` + one method per call) from a JSON-RPC 2.0 envelope to
/// plain path-based HTTP, matching the node's `riskguard-api` routes.
pub struct RiskGuardClient {
    base_url: String,
    client: reqwest::Client,
}

impl RiskGuardClient {
    pub fn new(base_url: &str) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_string(), client: reqwest::Client::new() }
    }

    async fn get(&self, path: &str) -> anyhow::Result<(u16, Value)> {
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .with_context(|| format!("connecting to node at {}", self.base_url))?;
        let status = resp.status().as_u16();
        let body: Value = resp.json().await.context("parsing response body")?;
        Ok((status, body))
    }

    async fn post(&self, path: &str, body: &Value) -> anyhow::Result<(u16, Value)> {
        let resp = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .with_context(|| format!("connecting to node at {}", self.base_url))?;
        let status = resp.status().as_u16();
        let json: Value = resp.json().await.context("parsing response body")?;
        Ok((status, json))
    }

    pub async fn submit_transaction(
        &self,
        sender_id: &str,
        receiver_id: &str,
        amount: f64,
    ) -> anyhow::Result<Value> {
        let body = serde_json::json!({
            "sender_id": sender_id,
            "receiver_id": receiver_id,
            "amount": amount,
        });
        let (status, json) = self.post("/api/transaction", &body).await?;
        if status >= 400 {
            bail!("submit_transaction failed ({status}): {json}");
        }
        Ok(json)
    }

    pub async fn simulate_fraud(
        &self,
        fraud_type: &str,
        sender_id: &str,
        receiver_id: &str,
        amount: f64,
    ) -> anyhow::Result<Value> {
        let body = serde_json::json!({
            "fraud_type": fraud_type,
            "sender_id": sender_id,
            "receiver_id": receiver_id,
            "amount": amount,
        });
        let (status, json) = self.post("/api/simulate-fraud", &body).await?;
        if status >= 400 {
            bail!("simulate_fraud failed ({status}): {json}");
        }
        Ok(json)
    }

    pub async fn get_transaction(&self, id: &str) -> anyhow::Result<(u16, Value)> {
        self.get(&format!("/api/transaction/{id}")).await
    }

    pub async fn get_risk_details(&self, id: &str) -> anyhow::Result<(u16, Value)> {
        self.get(&format!("/api/risk-details/{id}")).await
    }

    pub async fn recent_transactions(&self, limit: usize) -> anyhow::Result<Value> {
        let (status, json) = self.get(&format!("/api/recent-transactions?limit={limit}")).await?;
        if status >= 400 {
            bail!("recent_transactions failed ({status}): {json}");
        }
        Ok(json)
    }

    pub async fn system_stats(&self) -> anyhow::Result<Value> {
        let (status, json) = self.get("/api/system-stats").await?;
        if status >= 400 {
            bail!("system_stats failed ({status}): {json}");
        }
        Ok(json)
    }
}
