use serde::Deserialize;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::impl_display_for_enum;
use crate::schema::{number_value, sanitize, serialize_number};

/// Customer attributes as the dashboard form holds them.
///
/// Values are kept untyped: slider widgets hand back `[8]` where `8` is meant,
/// selects sometimes produce numbers for yes/no flags.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    pub gender: Value,
    /// 0/1 flag, may arrive as a bool or a string.
    pub senior_citizen: Value,
    pub partner: Value,
    pub dependents: Value,
    /// Months with the provider.
    pub tenure: Value,
    pub contract: Value,
    pub payment_method: Value,
    pub paperless_billing: Value,
    pub monthly_charges: Value,
    pub phone_service: Value,
    pub multiple_lines: Value,
    pub internet_service: Value,
    pub online_security: Value,
    pub online_backup: Value,
    pub device_protection: Value,
    pub tech_support: Value,
    #[serde(rename = "streamingTV")]
    pub streaming_tv: Value,
    pub streaming_movies: Value,
}

/// Body of `POST /predict` on the model service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceRequest {
    pub gender: String,
    #[serde(rename = "SeniorCitizen", serialize_with = "serialize_number")]
    pub senior_citizen: f64,
    #[serde(rename = "Partner")]
    pub partner: String,
    #[serde(rename = "Dependents")]
    pub dependents: String,
    #[serde(serialize_with = "serialize_number")]
    pub tenure: f64,
    #[serde(rename = "PhoneService")]
    pub phone_service: String,
    #[serde(rename = "MultipleLines")]
    pub multiple_lines: String,
    #[serde(rename = "InternetService")]
    pub internet_service: String,
    #[serde(rename = "OnlineSecurity")]
    pub online_security: String,
    #[serde(rename = "OnlineBackup")]
    pub online_backup: String,
    #[serde(rename = "DeviceProtection")]
    pub device_protection: String,
    #[serde(rename = "TechSupport")]
    pub tech_support: String,
    #[serde(rename = "StreamingTV")]
    pub streaming_tv: String,
    #[serde(rename = "StreamingMovies")]
    pub streaming_movies: String,
    #[serde(rename = "Contract")]
    pub contract: String,
    #[serde(rename = "PaperlessBilling")]
    pub paperless_billing: String,
    #[serde(rename = "PaymentMethod")]
    pub payment_method: String,
    #[serde(rename = "MonthlyCharges", serialize_with = "serialize_number")]
    pub monthly_charges: f64,
    /// Always `tenure * monthly_charges`, never taken from the form.
    #[serde(rename = "TotalCharges", serialize_with = "serialize_number")]
    pub total_charges: f64,
}

impl CustomerProfile {
    /// Form values keyed by the model service's field names.
    fn wire_record(&self) -> Map<String, Value> {
        [
            ("gender", &self.gender),
            ("SeniorCitizen", &self.senior_citizen),
            ("Partner", &self.partner),
            ("Dependents", &self.dependents),
            ("tenure", &self.tenure),
            ("PhoneService", &self.phone_service),
            ("MultipleLines", &self.multiple_lines),
            ("InternetService", &self.internet_service),
            ("OnlineSecurity", &self.online_security),
            ("OnlineBackup", &self.online_backup),
            ("DeviceProtection", &self.device_protection),
            ("TechSupport", &self.tech_support),
            ("StreamingTV", &self.streaming_tv),
            ("StreamingMovies", &self.streaming_movies),
            ("Contract", &self.contract),
            ("PaperlessBilling", &self.paperless_billing),
            ("PaymentMethod", &self.payment_method),
            ("MonthlyCharges", &self.monthly_charges),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
    }
}

impl InferenceRequest {
    /// Coerce the profile through `schema::sanitize`, then derive `TotalCharges`.
    pub fn from_profile(profile: &CustomerProfile) -> Self {
        let mut record = profile.wire_record();
        sanitize(&mut record);

        let tenure = number(&record, "tenure");
        let monthly_charges = number(&record, "MonthlyCharges");

        InferenceRequest {
            gender: text(&record, "gender"),
            senior_citizen: number(&record, "SeniorCitizen"),
            partner: text(&record, "Partner"),
            dependents: text(&record, "Dependents"),
            tenure,
            phone_service: text(&record, "PhoneService"),
            multiple_lines: text(&record, "MultipleLines"),
            internet_service: text(&record, "InternetService"),
            online_security: text(&record, "OnlineSecurity"),
            online_backup: text(&record, "OnlineBackup"),
            device_protection: text(&record, "DeviceProtection"),
            tech_support: text(&record, "TechSupport"),
            streaming_tv: text(&record, "StreamingTV"),
            streaming_movies: text(&record, "StreamingMovies"),
            contract: text(&record, "Contract"),
            paperless_billing: text(&record, "PaperlessBilling"),
            payment_method: text(&record, "PaymentMethod"),
            monthly_charges,
            total_charges: tenure * monthly_charges,
        }
    }

    /// JSON type of each numeric field as it will go over the wire.
    pub fn numeric_types(&self) -> [(&'static str, &'static str); 4] {
        [
            ("SeniorCitizen", json_type(self.senior_citizen)),
            ("tenure", json_type(self.tenure)),
            ("MonthlyCharges", json_type(self.monthly_charges)),
            ("TotalCharges", json_type(self.total_charges)),
        ]
    }

    pub fn log_snapshot(&self) {
        let payload = serde_json::to_string_pretty(self).unwrap_or_default();
        debug!(%payload, "Constructed inference payload");
        for (field, kind) in self.numeric_types() {
            debug!(field, kind, "Payload numeric field type");
        }
    }
}

// A coerced number is a JSON number, or null when it was not a number.
fn number(record: &Map<String, Value>, field: &str) -> f64 {
    record.get(field).and_then(Value::as_f64).unwrap_or(f64::NAN)
}

fn text(record: &Map<String, Value>, field: &str) -> String {
    record
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn json_type(value: f64) -> &'static str {
    match number_value(value) {
        Value::Null => "null",
        _ => "number",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl_display_for_enum!(RiskLevel, Low, Medium, High);

/// Success body of the model service, relayed verbatim by the proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PredictionResponse {
    pub probability_of_churn: f64,
    pub predicted_churn_status: String,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub recommendations: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    pub churn_probability: f64,
    pub predicted_churn: bool,
    pub predicted_churn_status: String,
    pub risk_level: RiskLevel,
    pub recommendations: Vec<String>,
}

impl InferenceResult {
    pub const CHURN_THRESHOLD: f64 = 0.5;

    /// Whatever the service says about churn, the flag is derived from the probability.
    pub fn from_response(response: PredictionResponse) -> Self {
        InferenceResult {
            churn_probability: response.probability_of_churn,
            predicted_churn: response.probability_of_churn >= Self::CHURN_THRESHOLD,
            predicted_churn_status: response.predicted_churn_status,
            risk_level: response.risk_level,
            recommendations: response.recommendations.unwrap_or_default(),
        }
    }
}
