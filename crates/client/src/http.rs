//! HTTP implementations of the remote collaborators (feature `http`).
//!
//! Endpoints, relative to the configured base URL:
//!
//! - `GET  /supplies?search=&category=&health=`
//! - `GET  /supplies/{id}/movements?limit=`
//! - `POST /supplies/{id}/movements` (body: the movement request)

use serde::Deserialize;
use tracing::debug;

use clinistock_core::SupplyId;
use clinistock_infra::{
    GatewayError, MovementGateway, PersistedMovement, RemoteCatalog, RemoteMovementHistory,
    TransportError,
};
use clinistock_inventory::{FilterCriteria, Movement, MovementError, MovementRequest, Supply};

use crate::config::ClientConfig;

/// Error body returned by the catalog service for refused writes.
#[derive(Debug, Deserialize)]
struct RejectionBody {
    code: String,
    #[serde(default)]
    message: String,
    requested: Option<u64>,
    available: Option<u32>,
}

pub struct HttpRemote {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl HttpRemote {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            token: config.api_token.clone(),
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.get(format!("{}{path}", self.api_url)))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.post(format!("{}{path}", self.api_url)))
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

fn transport(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_decode() {
        TransportError::Decode(err.to_string())
    } else {
        TransportError::Unavailable(err.to_string())
    }
}

async fn ok_json<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, TransportError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(TransportError::Status {
            status: status.as_u16(),
            body: resp.text().await.unwrap_or_default(),
        });
    }
    resp.json()
        .await
        .map_err(|e| TransportError::Decode(e.to_string()))
}

fn rejection(supply_id: &SupplyId, status: u16, body: &str) -> GatewayError {
    let Ok(parsed) = serde_json::from_str::<RejectionBody>(body) else {
        return TransportError::Status {
            status,
            body: body.to_string(),
        }
        .into();
    };

    match (parsed.code.as_str(), parsed.requested, parsed.available) {
        ("insufficient_stock", Some(requested), Some(available)) => {
            GatewayError::Rejected(MovementError::InsufficientStock { requested, available })
        }
        ("supply_not_found", _, _) => {
            GatewayError::Rejected(MovementError::SupplyNotFound(supply_id.clone()))
        }
        _ if parsed.message.is_empty() => GatewayError::Refused(parsed.code),
        _ => GatewayError::Refused(parsed.message),
    }
}

#[async_trait::async_trait]
impl RemoteCatalog for HttpRemote {
    async fn query_catalog(&self, criteria: &FilterCriteria) -> Result<Vec<Supply>, TransportError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(search) = criteria.search_text() {
            query.push(("search", search.to_string()));
        }
        if let Some(category) = criteria.category {
            query.push(("category", category.as_str().to_string()));
        }
        if let Some(health) = criteria.health {
            query.push(("health", health.as_str().to_string()));
        }

        let resp = self.get("/supplies").query(&query).send().await.map_err(transport)?;
        let supplies: Vec<Supply> = ok_json(resp).await?;
        debug!(count = supplies.len(), "remote catalog query");
        Ok(supplies)
    }
}

#[async_trait::async_trait]
impl RemoteMovementHistory for HttpRemote {
    async fn query_movement_history(
        &self,
        supply_id: &SupplyId,
        limit: usize,
    ) -> Result<Vec<Movement>, TransportError> {
        let resp = self
            .get(&format!("/supplies/{supply_id}/movements"))
            .query(&[("limit", limit)])
            .send()
            .await
            .map_err(transport)?;
        ok_json(resp).await
    }
}

#[async_trait::async_trait]
impl MovementGateway for HttpRemote {
    async fn persist_movement(
        &self,
        request: &MovementRequest,
    ) -> Result<PersistedMovement, GatewayError> {
        let resp = self
            .post(&format!("/supplies/{}/movements", request.supply_id))
            .json(request)
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        if status.is_client_error() {
            let body = resp.text().await.unwrap_or_default();
            return Err(rejection(&request.supply_id, status.as_u16(), &body));
        }
        Ok(ok_json(resp).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> SupplyId {
        SupplyId::new("gauze").unwrap()
    }

    #[test]
    fn insufficient_stock_body_maps_to_typed_error() {
        let body = r#"{"code":"insufficient_stock","message":"nope","requested":50,"available":12}"#;
        let err = rejection(&id(), 422, body);
        assert_eq!(
            err,
            GatewayError::Rejected(MovementError::InsufficientStock {
                requested: 50,
                available: 12
            })
        );
    }

    #[test]
    fn unknown_code_keeps_the_server_message() {
        let body = r#"{"code":"locked","message":"supply is being audited"}"#;
        assert_eq!(
            rejection(&id(), 409, body),
            GatewayError::Refused("supply is being audited".to_string())
        );
    }

    #[test]
    fn unparseable_body_is_a_status_error() {
        let err = rejection(&id(), 400, "<html>bad request</html>");
        assert!(matches!(
            err,
            GatewayError::Transport(TransportError::Status { status: 400, .. })
        ));
    }
}
