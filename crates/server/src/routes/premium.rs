use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Serialize;

use common::types::StatusBody;
use models::{premium::format_timestamp, Entry};
use service::premium::AddPremium;

use crate::errors::ApiError;
use crate::routes::AppState;

/// Raw query pairs in request order. When a name repeats, the first value wins.
#[derive(Debug, Default)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn first(&self, name: &str) -> Option<String> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
    }
}

impl From<Vec<(String, String)>> for QueryParams {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }
}

#[derive(Debug, Serialize)]
pub struct AddedDetails {
    pub email: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub expires_at: String,
}

#[derive(Debug, Serialize)]
pub struct AddPremiumResponse {
    pub status: &'static str,
    pub message: String,
    pub details: AddedDetails,
}

#[derive(Debug, Serialize)]
pub struct ListPremiumResponse {
    pub retrieved_at: String,
    pub active_premium_users: Vec<Entry>,
}

/// `GET /add/premium?key=&addemail=&day=&type=`
pub async fn add_premium(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<AddPremiumResponse>, ApiError> {
    let q = QueryParams::from(query?.0);
    let input = AddPremium { email: q.first("addemail"), kind: q.first("type"), duration: q.first("day") };
    let entry = state.registry.add(q.first("key").as_deref(), input).await?;

    Ok(Json(AddPremiumResponse {
        status: "success",
        message: format!("Email '{}' has been added/updated.", entry.email),
        details: AddedDetails {
            expires_at: entry.expires_at.as_ref().map(format_timestamp).unwrap_or_default(),
            email: entry.email,
            kind: entry.kind,
        },
    }))
}

/// `GET /delete/premium?key=&delemail=`
pub async fn delete_premium(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<StatusBody>, ApiError> {
    let q = QueryParams::from(query?.0);
    let email = q.first("delemail");
    state.registry.delete(q.first("key").as_deref(), email.as_deref()).await?;
    let email = email.unwrap_or_default();
    Ok(Json(StatusBody::success(format!("Email '{email}' has been deleted."))))
}

/// `GET /list/email/premium.json`: purges expired entries, then lists the rest.
pub async fn list_premium(State(state): State<AppState>) -> Result<Json<ListPremiumResponse>, ApiError> {
    let listing = state.registry.list().await?;
    Ok(Json(ListPremiumResponse {
        retrieved_at: format_timestamp(&listing.retrieved_at),
        active_premium_users: listing.entries,
    }))
}
