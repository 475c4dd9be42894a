use serde::Deserialize;

use crate::{
    error::{RegistryError, Result},
    http_client::HttpResponse,
    package::Package,
};

/// RPC response envelope. Every field is optional on decode.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RpcResponse {
    pub version: Option<u32>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(rename = "resultcount")]
    pub result_count: Option<u64>,
    pub results: Option<Vec<Package>>,
    pub error: Option<String>,
}

/// Maps a raw response to records or a [`RegistryError`].
pub fn parse_rpc_response(resp: &HttpResponse) -> Result<Vec<Package>> {
    if matches!(resp.status, 502..=504) {
        return Err(RegistryError::ServiceUnavailable);
    }

    if !resp.is_success() {
        let message = serde_json::from_slice::<RpcResponse>(&resp.body)
            .ok()
            .and_then(|envelope| envelope.error)
            .filter(|error| !error.is_empty())
            .unwrap_or_else(|| String::from_utf8_lossy(&resp.body).trim().to_string());
        return Err(RegistryError::Payload {
            status: resp.status,
            message,
        });
    }

    let envelope: RpcResponse = serde_json::from_slice(&resp.body)?;
    if let Some(error) = envelope.error.filter(|error| !error.is_empty()) {
        return Err(RegistryError::Payload {
            status: resp.status,
            message: error,
        });
    }

    Ok(envelope.results.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_envelope() {
        let packages = parse_rpc_response(&HttpResponse::new(200, "{}")).unwrap();
        assert!(packages.is_empty());
    }

    #[test]
    fn test_results() {
        let body = r#"{"version":5,"type":"multiinfo","resultcount":1,"results":[{"Name":"yay","Version":"12.4.2-1"}]}"#;
        let packages = parse_rpc_response(&HttpResponse::new(200, body)).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name, "yay");
        assert_eq!(packages[0].version, "12.4.2-1");
    }

    #[test]
    fn test_service_unavailable_ignores_body() {
        for status in [502, 503, 504] {
            let resp = HttpResponse::new(status, r#"{"results":[{"Name":"yay"}]}"#);
            assert!(matches!(
                parse_rpc_response(&resp),
                Err(RegistryError::ServiceUnavailable)
            ));
        }
    }

    #[test]
    fn test_error_payload_with_status() {
        let body = r#"{"version":5,"type":"error","resultcount":0,"results":[],"error":"Incorrect by field specified."}"#;
        let err = parse_rpc_response(&HttpResponse::new(400, body)).unwrap_err();
        assert_eq!(err.to_string(), "status 400: Incorrect by field specified.");

        let err = parse_rpc_response(&HttpResponse::new(200, body)).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Payload { status: 200, ref message } if message == "Incorrect by field specified."
        ));
    }

    #[test]
    fn test_non_json_error_body() {
        let err = parse_rpc_response(&HttpResponse::new(500, "  internal error\n")).unwrap_err();
        assert_eq!(err.to_string(), "status 500: internal error");
    }

    #[test]
    fn test_undecodable_success() {
        let err = parse_rpc_response(&HttpResponse::new(200, "<html>")).unwrap_err();
        assert!(matches!(err, RegistryError::Decode(_)));
    }
}
