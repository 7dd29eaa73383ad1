//! Handlers for the dashboard's `/collections` resource.
//!
//! Every mutation answers with the refreshed page of the view the caller
//! sent along, so the dashboard never issues a second request.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use pagepilot_core::collections::{CollectionSpec, COLLECTIONS};
use pagepilot_core::masking::display_row;
use pagepilot_core::types::Record;
use pagepilot_db::crud::{CrudQuery, CrudView, Page};
use pagepilot_db::SortDirection;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::ApiKey;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query-string form of a view (`GET`).
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub business: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub sort_field: Option<String>,
    pub sort_direction: Option<SortDirection>,
    /// Comma-separated pointer fields.
    pub include: Option<String>,
    /// JSON object of exact-match filters.
    #[serde(rename = "where")]
    pub filters: Option<String>,
}

/// JSON-body form of a view (mutations).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ViewBody {
    pub business: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub sort_field: Option<String>,
    pub sort_direction: Option<SortDirection>,
    pub include: Vec<String>,
    #[serde(rename = "where")]
    pub filters: Record,
}

#[derive(Debug, Deserialize)]
pub struct MutationBody {
    #[serde(default)]
    pub fields: Record,
    #[serde(default)]
    pub query: ViewBody,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteBody {
    #[serde(default)]
    pub query: ViewBody,
}

/// A page with a rendered `display` object on every row.
#[derive(Debug, Serialize)]
pub struct PageView {
    pub rows: Vec<Record>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
}

impl ListParams {
    fn into_view(self) -> AppResult<ViewBody> {
        let filters = match self.filters.as_deref().filter(|s| !s.trim().is_empty()) {
            None => Record::new(),
            Some(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    return Err(AppError::BadRequest(
                        "'where' must be a JSON object".into(),
                    ))
                }
                Err(e) => return Err(AppError::BadRequest(format!("Invalid 'where': {e}"))),
            },
        };
        let include = self
            .include
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        Ok(ViewBody {
            business: self.business,
            page: self.page,
            page_size: self.page_size,
            sort_field: self.sort_field,
            sort_direction: self.sort_direction,
            include,
            filters,
        })
    }
}

impl ViewBody {
    fn into_query(self, collection: String) -> CrudQuery {
        let defaults = CrudQuery::default();
        CrudQuery {
            collection,
            tenant_id: self.business,
            filters: self.filters,
            page: self.page.unwrap_or(defaults.page),
            page_size: self.page_size.unwrap_or(defaults.page_size),
            sort_field: self.sort_field.filter(|f| !f.is_empty()),
            sort_direction: self.sort_direction.unwrap_or(defaults.sort_direction),
            include: self.include,
        }
    }
}

fn render(spec: &CollectionSpec, page: Page) -> PageView {
    let rows = page
        .rows
        .into_iter()
        .map(|mut row| {
            let display = display_row(spec, &row);
            row.insert("display".into(), Value::Object(display));
            row
        })
        .collect();
    PageView {
        rows,
        total_count: page.total_count,
        page: page.page,
        page_size: page.page_size,
    }
}

/// GET /api/v1/collections
pub async fn descriptors(_key: ApiKey) -> Json<DataResponse<&'static [CollectionSpec]>> {
    Json(DataResponse { data: COLLECTIONS })
}

/// GET /api/v1/collections/{collection}
pub async fn list(
    _key: ApiKey,
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<DataResponse<PageView>>> {
    let spec = CrudView::spec(&collection)?;
    let query = params.into_view()?.into_query(collection);
    let page = CrudView::list(state.store.as_ref(), &query).await?;
    Ok(Json(DataResponse {
        data: render(spec, page),
    }))
}

/// POST /api/v1/collections/{collection}
pub async fn create(
    _key: ApiKey,
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(body): Json<MutationBody>,
) -> AppResult<(StatusCode, Json<DataResponse<PageView>>)> {
    let spec = CrudView::spec(&collection)?;
    let query = body.query.into_query(collection);
    let page = CrudView::create(state.store.as_ref(), &query, body.fields).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: render(spec, page),
        }),
    ))
}

/// PUT /api/v1/collections/{collection}/{id}
pub async fn update(
    _key: ApiKey,
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<MutationBody>,
) -> AppResult<Json<DataResponse<PageView>>> {
    let spec = CrudView::spec(&collection)?;
    let query = body.query.into_query(collection);
    let page = CrudView::update(state.store.as_ref(), &query, &id, body.fields).await?;
    Ok(Json(DataResponse {
        data: render(spec, page),
    }))
}

/// DELETE /api/v1/collections/{collection}/{id}
///
/// The body is optional; without it the default view is returned.
pub async fn delete(
    _key: ApiKey,
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    body: Bytes,
) -> AppResult<Json<DataResponse<PageView>>> {
    let spec = CrudView::spec(&collection)?;
    let body: DeleteBody = if body.iter().all(u8::is_ascii_whitespace) {
        DeleteBody::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))?
    };
    let query = body.query.into_query(collection);
    let page = CrudView::delete(state.store.as_ref(), &query, &id).await?;
    Ok(Json(DataResponse {
        data: render(spec, page),
    }))
}
