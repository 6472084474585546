use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::Label;


#[derive(Deserialize, Default)]
pub struct PullDataRequest {
    pub uuid: Option<String>,
    // kept loose so a string or float gets the validation message, not a parse error
    pub days_back: Option<serde_json::Value>,
}

/// Body of the three generation endpoints.
#[derive(Deserialize, Default)]
pub struct ModelRequest {
    pub uuid: Option<String>,
    pub model: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct OverrideLabelRequest {
    pub uuid: Option<String>,
    pub model: Option<String>,
    pub product_id: Option<String>,
    pub new_label: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct ClearRequest {
    pub uuid: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct ModelQuery {
    pub uuid: Option<String>,
    pub model: Option<String>,
}


#[derive(Serialize, Debug)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}


#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TableState {
    Complete,
    Pending,
}

impl TableState {
    pub fn from_exists(exists: bool) -> Self {
        if exists { TableState::Complete } else { TableState::Pending }
    }
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct StatusResponse {
    pub video_description: TableState,
    pub product_info: TableState,
    pub judgement: TableState,
}


#[derive(Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct LabelCounts {
    #[serde(rename = "Yes")]
    pub yes: usize,
    #[serde(rename = "N/A")]
    pub not_applicable: usize,
    #[serde(rename = "No")]
    pub no: usize,
}

impl LabelCounts {
    /// Unknown labels are not counted.
    pub fn record(&mut self, label: &str) {
        match Label::from_name(label) {
            Some(Label::Yes) => self.yes += 1,
            Some(Label::NotApplicable) => self.not_applicable += 1,
            Some(Label::No) => self.no += 1,
            None => {}
        }
    }
}

/// One judgement row joined with its description and product info.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ResultItem {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub ground_truth_image_url: String,
    pub label: String,
    pub reason: String,
    #[serde(default)]
    pub video_description: BTreeMap<String, String>,
    #[serde(default)]
    pub product_info: BTreeMap<String, String>,
}

#[derive(Serialize, Debug)]
pub struct ResultsResponse {
    pub counts: LabelCounts,
    pub items: Vec<ResultItem>,
}
