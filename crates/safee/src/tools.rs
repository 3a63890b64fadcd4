//! The tool registry and dispatch loop.
//!
//! Dispatch never propagates an error to its caller: every failure mode —
//! malformed arguments, an unknown name, a scoring backend rejection — is
//! rendered to a textual result that is fed back to the model as the tool
//! output. The typed [`ToolResult`] exists internally; rendering happens
//! only at the boundary in [`ToolRegistry::dispatch`].

pub mod basic;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::errors::{ToolError, ToolResult};
use crate::models::tool::{Tool, ToolCall};
use crate::scoring::{AgtechParams, MicroParams, NanoParams, ScoringClient};

/// Every tool the model can ask for, as a tagged variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegisteredTool {
    Add,
    Greet,
    Weather,
    Micro,
    Nano,
    Agtech,
}

pub struct ToolRegistry {
    scoring: ScoringClient,
}

impl ToolRegistry {
    pub fn new(scoring: ScoringClient) -> Self {
        Self { scoring }
    }

    /// The descriptors advertised to the model.
    pub fn descriptors(&self) -> Vec<Tool> {
        descriptors()
    }

    fn resolve(name: &str) -> ToolResult<RegisteredTool> {
        match name {
            "add" => Ok(RegisteredTool::Add),
            "greet" => Ok(RegisteredTool::Greet),
            "weather" => Ok(RegisteredTool::Weather),
            "micro" => Ok(RegisteredTool::Micro),
            "nano" => Ok(RegisteredTool::Nano),
            "agtech" => Ok(RegisteredTool::Agtech),
            other => Err(ToolError::NotFound(other.to_string())),
        }
    }

    /// Run one tool call to completion and render the outcome as text.
    pub async fn dispatch(&self, call: &ToolCall) -> String {
        match self.invoke(call).await {
            Ok(Value::String(text)) => text,
            Ok(value) => value.to_string(),
            Err(err) => err.to_string(),
        }
    }

    async fn invoke(&self, call: &ToolCall) -> ToolResult<Value> {
        let arguments: Value = serde_json::from_str(&call.arguments)
            .map_err(|err| ToolError::InvalidArguments(err.to_string()))?;
        let tool = Self::resolve(&call.name)?;

        match tool {
            RegisteredTool::Add => {
                let args = bind(arguments)?;
                Ok(json!(basic::add(&args)))
            }
            RegisteredTool::Greet => {
                let args = bind(arguments)?;
                Ok(json!(basic::greet(&args)))
            }
            RegisteredTool::Weather => {
                let args = bind(arguments)?;
                Ok(json!(basic::weather(&args)))
            }
            RegisteredTool::Micro => {
                let params: MicroParams = bind(arguments)?;
                let envelope = self
                    .scoring
                    .micro(&params)
                    .await
                    .map_err(|err| execution(call, err))?;
                Ok(json!(envelope))
            }
            RegisteredTool::Nano => {
                let params: NanoParams = bind(arguments)?;
                let envelope = self
                    .scoring
                    .nano(&params)
                    .await
                    .map_err(|err| execution(call, err))?;
                Ok(json!(envelope))
            }
            RegisteredTool::Agtech => {
                let params: AgtechParams = bind(arguments)?;
                let envelope = self
                    .scoring
                    .agtech(&params)
                    .await
                    .map_err(|err| execution(call, err))?;
                Ok(json!(envelope))
            }
        }
    }
}

/// Structured argument binding: the parsed JSON object must match the
/// variant's parameter type exactly.
fn bind<T: DeserializeOwned>(arguments: Value) -> ToolResult<T> {
    serde_json::from_value(arguments).map_err(|err| ToolError::InvalidArguments(err.to_string()))
}

fn execution(call: &ToolCall, err: impl std::fmt::Display) -> ToolError {
    ToolError::Execution {
        tool: call.name.clone(),
        message: err.to_string(),
    }
}

fn descriptors() -> Vec<Tool> {
    vec![
        Tool::new(
            "add",
            "Add two numbers",
            json!({
                "type": "object",
                "properties": {
                    "a": {"type": "integer", "description": "First number"},
                    "b": {"type": "integer", "description": "Second number"},
                },
                "required": ["a", "b"],
            }),
        ),
        Tool::new(
            "greet",
            "Greet a person by name",
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Person's name"},
                },
                "required": ["name"],
            }),
        ),
        Tool::new(
            "weather",
            "Get weather information for a city",
            json!({
                "type": "object",
                "properties": {
                    "city": {"type": "string", "description": "City name"},
                },
                "required": ["city"],
            }),
        ),
        Tool::new(
            "micro",
            "Calculate a micro credit score for an individual or business based on \
             product type and detailed business information. Use this when asked for \
             micro credit scores or financial eligibility.",
            json!({
                "type": "object",
                "properties": {
                    "product_type": {"type": "string", "description": "Type of product (e.g., safee_micro)"},
                    "business_region": {"type": "string", "description": "Business region (e.g., addis_ababa)"},
                    "business_subcity": {"type": "string", "description": "Business subcity (e.g., Bole)"},
                    "business_woreda": {"type": "string", "description": "Business woreda (e.g., 07)"},
                    "business_level": {"type": "string", "description": "Business level (e.g., startup)"},
                    "business_number_of_employees": {"type": "integer", "description": "Number of employees (e.g., 3)"},
                    "business_source_of_initial_capital": {"type": "string", "description": "Source of initial capital (e.g., own)"},
                    "business_sector": {"type": "string", "description": "Business sector (e.g., building_and_construction)"},
                    "business_annual_income": {"type": "number", "description": "Annual income of the business (e.g., 500000)"},
                    "business_association_type": {"type": "string", "description": "Association type (e.g., own)"},
                    "business_starting_capital": {"type": "number", "description": "Starting capital of the business (e.g., 100000)"},
                    "business_current_capital": {"type": "number", "description": "Current capital of the business (e.g., 200000)"},
                    "business_annual_profit": {"type": "number", "description": "Annual profit of the business (e.g., 150000)"},
                    "business_establishment_year": {"type": "string", "description": "Year of establishment (e.g., 2015)"},
                    "business_monthly_income": {"type": "number", "description": "Monthly income of the business (e.g., 4000)"},
                    "business_description": {"type": "string", "description": "Description of the business (e.g., small shop)"},
                    "customer_age": {"type": "integer", "description": "Age of the customer (e.g., 25)"},
                    "customer_level_of_education": {"type": "string", "description": "Level of education (e.g., bachelors)"},
                    "customer_gender": {"type": "string", "description": "Gender of the customer (e.g., f)"},
                    "customer_marital_status": {"type": "string", "description": "Marital status of the customer (e.g., married)"},
                    "customer_document_type": {"type": "string", "description": "Type of customer document (e.g., PASSPORT)"},
                },
                "required": [
                    "product_type", "business_region", "business_subcity", "business_woreda",
                    "business_level", "business_number_of_employees",
                    "business_source_of_initial_capital", "business_sector",
                    "business_annual_income", "business_association_type",
                    "business_starting_capital", "business_current_capital",
                    "business_annual_profit", "business_establishment_year",
                    "business_monthly_income", "business_description", "customer_age",
                    "customer_level_of_education", "customer_gender",
                    "customer_marital_status", "customer_document_type"
                ],
            }),
        ),
        Tool::new(
            "nano",
            "Calculate a nano credit score for an individual based on gender, age, \
             business sector, and region. Use this when asked for credit scores or \
             financial eligibility.",
            json!({
                "type": "object",
                "properties": {
                    "gender": {"type": "string", "description": "Gender of the individual (e.g., male, female)"},
                    "age": {"type": "integer", "description": "Age of the individual"},
                    "business_sector": {"type": "string", "description": "Business sector (e.g., tech, finance)"},
                    "region": {"type": "string", "description": "Region or state (e.g., California)"},
                },
                "required": ["gender", "age", "business_sector", "region"],
            }),
        ),
        Tool::new(
            "agtech",
            "Calculate an agtech credit score for a farmer or agricultural entity based \
             on region, latitude, longitude, land area, crop type, and yield estimation \
             year. Use this when asked for agtech credit scores or financial eligibility \
             for farmers.",
            json!({
                "type": "object",
                "properties": {
                    "region": {"type": "string", "description": "Region or location (e.g., Afar)"},
                    "latitude": {"type": "number", "description": "Latitude of the land (e.g., 8.6)"},
                    "longitude": {"type": "number", "description": "Longitude of the land (e.g., 36.5)"},
                    "land_area": {"type": "integer", "description": "Land area in hectares (e.g., 2)"},
                    "crop_type": {"type": "string", "description": "Type of crop (e.g., potato)"},
                    "yield_estimation_year": {"type": "integer", "description": "Year for yield estimation (e.g., 2025)"},
                },
                "required": ["region", "latitude", "longitude", "land_area", "crop_type", "yield_estimation_year"],
            }),
        ),
    ]
}
