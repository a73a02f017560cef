//! Registry RPC endpoints: mint, burn and the three lookups.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path as AxumPath, Query, State};
use axum::Json;
use nfid_registry::{BurnOutcome, MintOutcome, RegistryEvent};
use nfid_types::{Address, Nfid};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::server::{ApiError, SharedState};

/// Body of `POST /nfid/mint` and `POST /nfid/burn`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NfidRequest {
    /// Account address, `0x` + 40 hex characters. Null, missing or
    /// non-string values are kept as `None` and rejected as `invalid_address`.
    #[serde(default, deserialize_with = "string_or_none")]
    pub address: Option<String>,
    /// Identity value.
    pub nfid: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MintResponse {
    pub status: String,
    pub address: String,
    pub nfid: u64,
    #[serde(flatten)]
    pub outcome: MintOutcome,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BurnResponse {
    pub status: String,
    pub address: String,
    pub nfid: u64,
    #[serde(flatten)]
    pub outcome: BurnOutcome,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResponse {
    pub address: String,
    pub active: bool,
}

/// `nfid` is `0` when the address holds no identity.
#[derive(Debug, Serialize, Deserialize)]
pub struct FindResponse {
    pub address: String,
    pub nfid: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssociatedResponse {
    pub address: String,
    pub nfid: u64,
    pub associated: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    #[serde(default)]
    pub since: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventsResponse {
    pub events: Vec<RegistryEvent>,
    pub last_seq: u64,
}

/// POST /nfid/mint
pub(crate) async fn handle_mint(
    State(state): State<SharedState>,
    body: Result<Json<NfidRequest>, JsonRejection>,
) -> Result<Json<MintResponse>, ApiError> {
    state.record_request();
    let request = extract_request(body)?;
    let address = request_address(&request)?;

    let outcome = state.registry.mint(&address, Nfid::new(request.nfid))?;

    Ok(Json(MintResponse {
        status: "ok".into(),
        address: address.to_string(),
        nfid: request.nfid,
        outcome,
    }))
}

/// POST /nfid/burn
pub(crate) async fn handle_burn(
    State(state): State<SharedState>,
    body: Result<Json<NfidRequest>, JsonRejection>,
) -> Result<Json<BurnResponse>, ApiError> {
    state.record_request();
    let request = extract_request(body)?;
    let address = request_address(&request)?;

    let outcome = state.registry.burn(&address, Nfid::new(request.nfid))?;
    if !outcome.is_burned() {
        debug!(%address, ?outcome, "Burn left registry unchanged");
    }

    Ok(Json(BurnResponse {
        status: "ok".into(),
        address: address.to_string(),
        nfid: request.nfid,
        outcome,
    }))
}

/// GET /nfid/{address}/check
pub(crate) async fn handle_check(
    State(state): State<SharedState>,
    AxumPath(address): AxumPath<String>,
) -> Result<Json<CheckResponse>, ApiError> {
    state.record_request();
    let address = parse_address(&address)?;

    Ok(Json(CheckResponse {
        address: address.to_string(),
        active: state.registry.check_nfid(&address),
    }))
}

/// GET /nfid/{address}
pub(crate) async fn handle_find(
    State(state): State<SharedState>,
    AxumPath(address): AxumPath<String>,
) -> Result<Json<FindResponse>, ApiError> {
    state.record_request();
    let address = parse_address(&address)?;

    Ok(Json(FindResponse {
        address: address.to_string(),
        nfid: state.registry.find_nfid(&address),
    }))
}

/// GET /nfid/{address}/associated/{nfid}
pub(crate) async fn handle_associated(
    State(state): State<SharedState>,
    AxumPath((address, nfid)): AxumPath<(String, String)>,
) -> Result<Json<AssociatedResponse>, ApiError> {
    state.record_request();
    let address = parse_address(&address)?;
    let nfid: Nfid = nfid.parse().map_err(|_| {
        ApiError::bad_request(
            "invalid_nfid",
            format!("invalid NFID '{nfid}': expected an unsigned decimal integer"),
        )
    })?;

    Ok(Json(AssociatedResponse {
        address: address.to_string(),
        nfid: nfid.value(),
        associated: state.registry.address_associated_nfid(&address, nfid),
    }))
}

/// GET /events?since=N
pub(crate) async fn handle_events(
    State(state): State<SharedState>,
    Query(query): Query<EventsQuery>,
) -> Json<EventsResponse> {
    state.record_request();
    Json(EventsResponse {
        events: state.registry.events_since(query.since),
        last_seq: state.registry.last_event_seq(),
    })
}

fn extract_request(body: Result<Json<NfidRequest>, JsonRejection>) -> Result<NfidRequest, ApiError> {
    body.map(|Json(request)| request)
        .map_err(|rejection| ApiError::bad_request("invalid_request", rejection.body_text()))
}

fn request_address(request: &NfidRequest) -> Result<Address, ApiError> {
    match request.address.as_deref() {
        Some(value) => parse_address(value),
        None => Err(ApiError::bad_request(
            "invalid_address",
            "address must be a 0x-prefixed hex string",
        )),
    }
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(value) => Ok(Some(value)),
        _ => Ok(None),
    }
}

fn parse_address(value: &str) -> Result<Address, ApiError> {
    value.parse::<Address>().map_err(|err| {
        ApiError::bad_request("invalid_address", format!("invalid address '{value}': {err}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_parsing() {
        let json = r#"{
            "address": "0xAb8483F64d9C6d1EcF9b849Ae677dD3315835cb2",
            "nfid": 1234567890123456
        }"#;

        let req: NfidRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.nfid, 1_234_567_890_123_456);
        assert!(request_address(&req).is_ok());
    }

    #[test]
    fn test_non_string_address_is_kept_as_none() {
        for json in [
            r#"{"address": null, "nfid": 1}"#,
            r#"{"nfid": 1}"#,
            r#"{"address": 123, "nfid": 1}"#,
        ] {
            let req: NfidRequest = serde_json::from_str(json).unwrap();
            assert_eq!(req.address, None);
            assert!(request_address(&req).is_err());
        }
    }

    #[test]
    fn test_request_rejects_unknown_fields() {
        let json = r#"{"address": "0x00", "nfid": 1, "owner": "x"}"#;
        assert!(serde_json::from_str::<NfidRequest>(json).is_err());
    }

    #[test]
    fn test_mint_response_flattens_outcome() {
        let response = MintResponse {
            status: "ok".into(),
            address: "0xab".into(),
            nfid: 5,
            outcome: MintOutcome::Replaced {
                previous: Nfid::new(4),
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["outcome"], "replaced");
        assert_eq!(json["previous"], 4);
        assert_eq!(json["nfid"], 5);
    }
}
