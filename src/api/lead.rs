//! Lead API handlers, including CSV export

use crate::api::{PaginationQuery, SuccessResponse};
use crate::domain::{perms, Lead, LeadFilter};
use crate::error::Result;
use crate::middleware::BearerToken;
use crate::policy::Requirement;
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    Json,
};

/// List leads, filtered and paged, within the caller's scope
pub async fn list_leads(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Query(pagination): Query<PaginationQuery>,
    Query(filter): Query<LeadFilter>,
) -> Result<impl IntoResponse> {
    let user = state
        .authz
        .authorize(&token, &Requirement::permission(perms::VIEW_LEADS))
        .await?;
    let scope = state.authz.scope(&user).await?;

    let page = state
        .lead_service
        .list(
            &filter,
            scope.as_filter(),
            pagination.page,
            pagination.per_page,
        )
        .await?;
    Ok(Json(SuccessResponse::new(page)))
}

/// Get one lead (owner or superadmin)
pub async fn get_lead(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let user = state
        .authz
        .authorize(&token, &Requirement::permission(perms::VIEW_LEADS))
        .await?;

    let lead = state.lead_service.get(id).await?;
    state.authz.check_owner(&user, lead.owner_id).await?;

    Ok(Json(SuccessResponse::new(lead.lead)))
}

/// Export leads as a CSV attachment, within the caller's scope
pub async fn export_leads(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Query(filter): Query<LeadFilter>,
) -> Result<impl IntoResponse> {
    let user = state
        .authz
        .authorize(&token, &Requirement::permission(perms::EXPORT_LEADS))
        .await?;
    let scope = state.authz.scope(&user).await?;

    let leads = state.lead_service.export(&filter, scope.as_filter()).await?;
    let body = render_csv(&leads);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=leads.csv"),
    );

    Ok((headers, body))
}

const CSV_HEADER: &str = "id,title,address,phone_number,website_url,tags,source_url,created_at";

fn render_csv(leads: &[Lead]) -> String {
    let mut out = String::with_capacity(64 * (leads.len() + 1));
    out.push_str(CSV_HEADER);
    out.push('\n');

    for lead in leads {
        let row = [
            lead.id.to_string(),
            csv_field(lead.title.as_deref()),
            csv_field(lead.address.as_deref()),
            csv_field(lead.phone_number.as_deref()),
            csv_field(lead.website_url.as_deref()),
            csv_field(lead.tags.as_deref()),
            csv_field(lead.source_url.as_deref()),
            lead.created_at.to_rfc3339(),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

/// Quote a field when it contains a separator, quote or newline
fn csv_field(value: Option<&str>) -> String {
    let value = value.unwrap_or("");
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
