use chrono::NaiveDate;
use log::Level;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

pub mod changes;
pub mod conditional;
pub mod config;
pub mod country;
pub mod creator;
pub mod error;
pub mod keys;
pub mod parser;
pub mod patterns;
pub mod speed;
pub mod types;

pub use self::changes::{TagChange, TagChangesBuilder, Tags};
pub use self::conditional::{Condition, ConditionalSpeed};
pub use self::config::MaxspeedConfig;
pub use self::country::{CountryInfo, StaticCountryInfo};
pub use self::error::MaxspeedError;
pub use self::speed::{Speed, SpeedUnit};
pub use self::types::{ForwardAndBackwardMaxspeedAndType, MaxSpeedAnswer, MaxspeedAndType, RoadType};

use self::conditional::parse_conditional_speeds;
use self::keys::{with_vehicle, MAXSPEED};

/// Reads and writes speed limit tagging. Decoding lives in [`parser`],
/// encoding in [`creator`].
pub struct MaxspeedTagging<C: CountryInfo = StaticCountryInfo> {
    config: MaxspeedConfig,
    countries: C,
}

impl MaxspeedTagging<StaticCountryInfo> {
    pub fn from_config(config: MaxspeedConfig) -> Self {
        let countries = StaticCountryInfo::new(&config);
        MaxspeedTagging { config, countries }
    }
}

impl Default for MaxspeedTagging<StaticCountryInfo> {
    fn default() -> Self {
        MaxspeedTagging::from_config(MaxspeedConfig::default())
    }
}

impl<C: CountryInfo> MaxspeedTagging<C> {
    pub fn new(config: MaxspeedConfig, countries: C) -> Self {
        MaxspeedTagging { config, countries }
    }

    pub fn config(&self) -> &MaxspeedConfig {
        &self.config
    }

    /// Entries of `maxspeed:conditional` (or `maxspeed:<vehicle>:conditional`).
    pub fn conditional_speeds(&self, tags: &Tags, vehicle: Option<&str>) -> Vec<ConditionalSpeed> {
        let key = format!("{}:conditional", with_vehicle(MAXSPEED, vehicle));
        tags.get(&key)
            .map(|value| parse_conditional_speeds(value))
            .unwrap_or_default()
    }
}

// ** JSON interface **

#[derive(Deserialize)]
pub struct ParseRequest {
    pub tags: Tags,
    #[serde(default)]
    pub vehicle: Option<String>,
    #[serde(default)]
    pub config: Option<MaxspeedConfig>,
}

#[derive(Serialize)]
pub struct ParseResponse {
    pub maxspeed: Option<ForwardAndBackwardMaxspeedAndType>,
    pub conditional: Vec<ConditionalSpeed>,
}

#[derive(Deserialize)]
pub struct ApplyRequest {
    pub answer: ForwardAndBackwardMaxspeedAndType,
    pub tags: Tags,
    #[serde(default)]
    pub vehicle: Option<String>,
    #[serde(default)]
    pub check_date: Option<NaiveDate>,
    #[serde(default)]
    pub config: Option<MaxspeedConfig>,
}

pub fn parse_maxspeed_json(request_json: &str) -> Result<String, String> {
    let request: ParseRequest = serde_json::from_str(request_json).map_err(|e| e.to_string())?;
    let tagging = MaxspeedTagging::from_config(request.config.unwrap_or_default());
    let vehicle = request.vehicle.as_deref();

    let response = ParseResponse {
        maxspeed: tagging.parse(&request.tags, vehicle),
        conditional: tagging.conditional_speeds(&request.tags, vehicle),
    };
    serde_json::to_string(&response).map_err(|e| e.to_string())
}

/// `today` is used when the request does not bring its own check date.
pub fn apply_maxspeed_answer_json(request_json: &str, today: NaiveDate) -> Result<String, String> {
    let request: ApplyRequest = serde_json::from_str(request_json).map_err(|e| e.to_string())?;
    let tagging = MaxspeedTagging::from_config(request.config.unwrap_or_default());

    let changes = tagging
        .apply(
            &request.answer,
            &request.tags,
            request.vehicle.as_deref(),
            request.check_date.unwrap_or(today),
        )
        .map_err(|e| e.to_string())?;
    log::info!("Speed limit answer written as {} tag changes", changes.len());
    serde_json::to_string(&changes).map_err(|e| e.to_string())
}

#[wasm_bindgen]
pub fn rust_init() -> Result<(), JsValue> {
    console_log::init_with_level(Level::Warn).map_err(|e| JsValue::from_str(&e.to_string()))?;
    log::info!("Logger initialized from library");
    Ok(())
}

#[wasm_bindgen]
pub fn parse_maxspeed(request: String) -> Result<String, JsValue> {
    parse_maxspeed_json(&request).map_err(|e| JsValue::from_str(&e))
}

#[wasm_bindgen]
pub fn apply_maxspeed_answer(request: String) -> Result<String, JsValue> {
    let today = chrono::Utc::now().date_naive();
    apply_maxspeed_answer_json(&request, today).map_err(|e| JsValue::from_str(&e))
}
