//! One-shot clients for the three external credit-scoring services.
//!
//! Each call builds a fixed payload shape, POSTs it, and returns the parsed
//! body wrapped in a [`ScoreEnvelope`]. No retries, no circuit breaking; a
//! non-2xx response is logged and propagated so the dispatcher can turn it
//! into a textual tool result.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

pub const MICRO_SCORING_URL: &str =
    "https://xsyg6m7fcgbe6vkvjmgy5ibk540besqo.lambda-url.us-east-1.on.aws/";
pub const NANO_SCORING_URL: &str = "http://3.93.68.14:8000/scoring/example";
pub const AGTECH_SCORING_URL: &str =
    "https://h3un7vgepphw3mosuok4h4jnv40nzdya.lambda-url.us-east-1.on.aws/";

#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("scoring request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("scoring API error: {status} - {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub micro_url: String,
    pub nano_url: String,
    pub agtech_url: String,
    pub timeout: Duration,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            micro_url: MICRO_SCORING_URL.to_string(),
            nano_url: NANO_SCORING_URL.to_string(),
            agtech_url: AGTECH_SCORING_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Inputs to the micro scoring model: the product plus a full business and
/// customer profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicroParams {
    pub product_type: String,
    pub business_region: String,
    pub business_subcity: String,
    pub business_woreda: String,
    pub business_level: String,
    pub business_number_of_employees: i64,
    pub business_source_of_initial_capital: String,
    pub business_sector: String,
    pub business_annual_income: f64,
    pub business_association_type: String,
    pub business_starting_capital: f64,
    pub business_current_capital: f64,
    pub business_annual_profit: f64,
    pub business_establishment_year: String,
    pub business_monthly_income: f64,
    pub business_description: String,
    pub customer_age: i64,
    pub customer_level_of_education: String,
    pub customer_gender: String,
    pub customer_marital_status: String,
    pub customer_document_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NanoParams {
    pub gender: String,
    pub age: i64,
    pub business_sector: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgtechParams {
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
    pub land_area: i64,
    pub crop_type: String,
    pub yield_estimation_year: i64,
}

/// A scoring result: a caption for the model plus the scorer's raw body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreEnvelope {
    pub message: String,
    pub data: Value,
}

pub struct ScoringClient {
    client: Client,
    config: ScoringConfig,
}

impl ScoringClient {
    pub fn new(config: ScoringConfig) -> Result<Self, ScoringError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub async fn micro(&self, params: &MicroParams) -> Result<ScoreEnvelope, ScoringError> {
        let data = self
            .post(&self.config.micro_url, &micro_payload(params))
            .await?;
        Ok(ScoreEnvelope {
            message: "Here is the credit score data for micro".to_string(),
            data,
        })
    }

    pub async fn nano(&self, params: &NanoParams) -> Result<ScoreEnvelope, ScoringError> {
        let data = self
            .post(&self.config.nano_url, &nano_payload(params))
            .await?;
        Ok(ScoreEnvelope {
            message: "Here is the credit score data for nano product".to_string(),
            data,
        })
    }

    pub async fn agtech(&self, params: &AgtechParams) -> Result<ScoreEnvelope, ScoringError> {
        let data = self
            .post(&self.config.agtech_url, &agtech_payload(params))
            .await?;
        Ok(ScoreEnvelope {
            message: "Here is the credit score data for AgTech product".to_string(),
            data,
        })
    }

    async fn post(&self, url: &str, payload: &Value) -> Result<Value, ScoringError> {
        let response = self.client.post(url).json(payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("scoring API error: {status} - {body}");
            return Err(ScoringError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

/// `{product_type, business_info: {…}}` — the scorer wants the product at
/// the top level and everything else nested.
fn micro_payload(params: &MicroParams) -> Value {
    json!({
        "product_type": params.product_type,
        "business_info": {
            "business_region": params.business_region,
            "business_subcity": params.business_subcity,
            "business_woreda": params.business_woreda,
            "business_level": params.business_level,
            "business_number_of_employees": params.business_number_of_employees,
            "business_source_of_initial_capital": params.business_source_of_initial_capital,
            "business_sector": params.business_sector,
            "business_annual_income": params.business_annual_income,
            "business_association_type": params.business_association_type,
            "business_starting_capital": params.business_starting_capital,
            "business_current_capital": params.business_current_capital,
            "business_annual_profit": params.business_annual_profit,
            "business_establishment_year": params.business_establishment_year,
            "business_monthly_income": params.business_monthly_income,
            "business_description": params.business_description,
            "customer_age": params.customer_age,
            "customer_level_of_education": params.customer_level_of_education,
            "customer_gender": params.customer_gender,
            "customer_marital_status": params.customer_marital_status,
            "customer_document_type": params.customer_document_type,
        }
    })
}

fn nano_payload(params: &NanoParams) -> Value {
    json!({
        "gender": params.gender,
        "age": params.age,
        "business_sector": params.business_sector,
        "region": params.region,
    })
}

fn agtech_payload(params: &AgtechParams) -> Value {
    json!({
        "agriFinance": {
            "region": params.region,
            "latitude": params.latitude,
            "longitude": params.longitude,
            "land_area": params.land_area,
            "crop_type": params.crop_type,
            "yield_estimation_year": params.yield_estimation_year,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn micro_params() -> MicroParams {
        MicroParams {
            product_type: "safee_micro".to_string(),
            business_region: "addis_ababa".to_string(),
            business_subcity: "Bole".to_string(),
            business_woreda: "07".to_string(),
            business_level: "startup".to_string(),
            business_number_of_employees: 3,
            business_source_of_initial_capital: "own".to_string(),
            business_sector: "building_and_construction".to_string(),
            business_annual_income: 500000.0,
            business_association_type: "own".to_string(),
            business_starting_capital: 100000.0,
            business_current_capital: 200000.0,
            business_annual_profit: 150000.0,
            business_establishment_year: "2015".to_string(),
            business_monthly_income: 4000.0,
            business_description: "small shop".to_string(),
            customer_age: 25,
            customer_level_of_education: "bachelors".to_string(),
            customer_gender: "f".to_string(),
            customer_marital_status: "married".to_string(),
            customer_document_type: "PASSPORT".to_string(),
        }
    }

    fn nano_params() -> NanoParams {
        NanoParams {
            gender: "male".to_string(),
            age: 35,
            business_sector: "tech".to_string(),
            region: "california".to_string(),
        }
    }

    #[test]
    fn test_micro_payload_round_trip() {
        let params = micro_params();
        let payload = micro_payload(&params);

        // Every input field must be recoverable from the built payload.
        let mut flat = payload["business_info"].as_object().unwrap().clone();
        flat.insert("product_type".to_string(), payload["product_type"].clone());
        let recovered: MicroParams = serde_json::from_value(Value::Object(flat)).unwrap();
        assert_eq!(recovered, params);
    }

    #[test]
    fn test_nano_payload_round_trip() {
        let params = nano_params();
        let recovered: NanoParams = serde_json::from_value(nano_payload(&params)).unwrap();
        assert_eq!(recovered, params);
    }

    #[test]
    fn test_agtech_payload_round_trip() {
        let params = AgtechParams {
            region: "Afar".to_string(),
            latitude: 8.6,
            longitude: 36.5,
            land_area: 2,
            crop_type: "potato".to_string(),
            yield_estimation_year: 2025,
        };
        let payload = agtech_payload(&params);
        let recovered: AgtechParams =
            serde_json::from_value(payload["agriFinance"].clone()).unwrap();
        assert_eq!(recovered, params);
    }

    #[tokio::test]
    async fn test_nano_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/scoring/example"))
            .and(body_json(nano_payload(&nano_params())))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "score": 480,
                "model": "Micro Model"
            })))
            .mount(&server)
            .await;

        let client = ScoringClient::new(ScoringConfig {
            nano_url: format!("{}/scoring/example", server.uri()),
            ..ScoringConfig::default()
        })
        .unwrap();

        let envelope = client.nano(&nano_params()).await.unwrap();
        assert_eq!(envelope.message, "Here is the credit score data for nano product");
        assert_eq!(envelope.data["score"], 480);
    }

    #[tokio::test]
    async fn test_micro_remote_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client = ScoringClient::new(ScoringConfig {
            micro_url: server.uri(),
            ..ScoringConfig::default()
        })
        .unwrap();

        match client.micro(&micro_params()).await {
            Err(ScoringError::Status { status, body }) => {
                assert_eq!(status, 502);
                assert_eq!(body, "bad gateway");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }
}
