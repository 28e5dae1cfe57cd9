//! Owner lookup against the upstream identity service.

use std::fmt;

use serde::Deserialize;

use certgate_auth::{AuthError, ResolvedIdentity};

/// Prefix of the SSO username given to every certificate identity.
const SSO_USERNAME_PREFIX: &str = "cert-system-";

/// Customer number as sent by the identity service: a JSON number or string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CustomerNumber {
    /// Numeric form, printed without quotes.
    Number(serde_json::Number),
    /// String form, used verbatim.
    Text(String),
}

impl fmt::Display for CustomerNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Integral floats print without a fraction: 123.0 and 1.23e2 are "123".
            CustomerNumber::Number(n) => match n.as_f64() {
                Some(v) if n.is_f64() && v.is_finite() && v.fract() == 0.0 && v.abs() < 1e21 => {
                    if v == 0.0 {
                        f.write_str("0")
                    } else {
                        write!(f, "{v:.0}")
                    }
                }
                _ => write!(f, "{n}"),
            },
            CustomerNumber::Text(s) => f.write_str(s),
        }
    }
}

/// Owner record returned by the identity service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamRecord {
    /// Customer number, becomes the account number.
    pub oracle_customer_number: CustomerNumber,
    /// Owner display name, becomes the org id.
    pub display_name: String,
}

/// Map an owner record onto the canonical identity.
///
/// Every certificate identity is an active, non-internal org admin.
pub fn build_user_object(record: &UpstreamRecord) -> ResolvedIdentity {
    let number = record.oracle_customer_number.to_string();
    ResolvedIdentity {
        sso_username: format!("{SSO_USERNAME_PREFIX}{number}"),
        account_number: number,
        org_id: record.display_name.clone(),
        is_active: true,
        is_org_admin: true,
        is_internal: false,
    }
}

/// HTTP client for `GET <base><common name>`.
pub struct OwnerLookup {
    base_url: String,
    http_client: reqwest::Client,
}

impl OwnerLookup {
    /// Create a lookup against `base_url` using the given client.
    pub fn new(base_url: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            http_client,
        }
    }

    /// Fetch the owner record for a common name.
    ///
    /// Only a 200 with a decodable body succeeds. Nothing is retried.
    pub async fn remote_lookup(&self, common_name: &str) -> Result<UpstreamRecord, AuthError> {
        let url = format!("{}{common_name}", self.base_url);
        log::debug!("Looking up certificate owner at {url}");

        let response = self
            .http_client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AuthError::UpstreamRequest(e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(AuthError::UpstreamStatus(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AuthError::UpstreamRequest(format!("reading body failed: {e}")))?;

        serde_json::from_str(&body).map_err(|e| AuthError::UpstreamDecode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn lookup_for(server: &MockServer) -> OwnerLookup {
        OwnerLookup::new(format!("{}/owners/", server.uri()), reqwest::Client::new())
    }

    #[test]
    fn test_build_user_object_from_numeric_customer() {
        let record: UpstreamRecord = serde_json::from_str(
            r#"{"oracleCustomerNumber":123,"displayName":"Acme"}"#,
        )
        .unwrap();
        assert_eq!(
            build_user_object(&record),
            ResolvedIdentity {
                account_number: "123".to_string(),
                org_id: "Acme".to_string(),
                is_active: true,
                is_org_admin: true,
                is_internal: false,
                sso_username: "cert-system-123".to_string(),
            }
        );
    }

    #[test]
    fn test_build_user_object_from_string_customer() {
        let record: UpstreamRecord = serde_json::from_str(
            r#"{"oracleCustomerNumber":"0042","displayName":"Initech","key":"ignored"}"#,
        )
        .unwrap();
        let identity = build_user_object(&record);
        assert_eq!(identity.account_number, "0042");
        assert_eq!(identity.sso_username, "cert-system-0042");
    }

    #[test]
    fn test_build_user_object_from_integral_float_customer() {
        for (body, expected) in [
            (r#"{"oracleCustomerNumber":123.0,"displayName":"Acme"}"#, "123"),
            (r#"{"oracleCustomerNumber":1.5e3,"displayName":"Acme"}"#, "1500"),
            (r#"{"oracleCustomerNumber":-0.0,"displayName":"Acme"}"#, "0"),
        ] {
            let record: UpstreamRecord = serde_json::from_str(body).unwrap();
            let identity = build_user_object(&record);
            assert_eq!(identity.account_number, expected);
            assert_eq!(identity.sso_username, format!("cert-system-{expected}"));
        }
    }

    #[test]
    fn test_fractional_customer_number_keeps_fraction() {
        let record: UpstreamRecord =
            serde_json::from_str(r#"{"oracleCustomerNumber":12.5,"displayName":"Acme"}"#)
                .unwrap();
        assert_eq!(build_user_object(&record).account_number, "12.5");
    }

    #[tokio::test]
    async fn test_remote_lookup_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/owners/1234567"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"oracleCustomerNumber":123,"displayName":"Acme"}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let record = lookup_for(&server)
            .remote_lookup("1234567")
            .await
            .unwrap();
        assert_eq!(record.display_name, "Acme");
        assert_eq!(record.oracle_customer_number.to_string(), "123");
    }

    #[tokio::test]
    async fn test_remote_lookup_bad_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let err = lookup_for(&server)
            .remote_lookup("nobody")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UpstreamStatus(404)));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_remote_lookup_non_200_success_is_still_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let err = lookup_for(&server)
            .remote_lookup("1234567")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UpstreamStatus(204)));
    }

    #[tokio::test]
    async fn test_remote_lookup_unparseable_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let err = lookup_for(&server)
            .remote_lookup("1234567")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UpstreamDecode(_)));
        assert!(err.to_string().contains("unable to decode JSON"));
    }

    #[tokio::test]
    async fn test_remote_lookup_unreachable() {
        let lookup = OwnerLookup::new("http://127.0.0.1:1/owners/", reqwest::Client::new());
        let err = lookup.remote_lookup("1234567").await.unwrap_err();
        assert!(matches!(err, AuthError::UpstreamRequest(_)));
    }
}
