//! Generic read-side REST controller over a document collection.
//!
//! A [`Resource`] ties a persistence model to its wire representation and
//! declares which query parameters may filter and sort it.
//! [`ResourceController`] turns that into:
//!
//!   GET {PATH}                : list, with equality filters, sort, offset, limit
//!   GET {PATH}/{ref_or_id}    : one record, 404 when it does not resolve

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query as QueryParams, State};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use eventide_core::{ResourceReference, ServiceError};
use serde::Serialize;
use tracing::{debug, info};

use crate::access::{Access, QueryResult};
use crate::document::Document;
use crate::query::{Direction, Query, SortKey};

/// Upper bound applied to any `limit` a client asks for.
pub const MAX_PAGE_LIMIT: usize = 100;

pub const HEADER_TOTAL_COUNT: &str = "X-Total-Count";
pub const HEADER_LIMIT: &str = "X-Limit";

/// A collection exposed over HTTP.
pub trait Resource: Send + Sync + 'static {
    type Db: Document;
    type Api: Serialize + Send;

    /// Mount path, e.g. `/policies`.
    const PATH: &'static str;

    /// `(query parameter, document field)` pairs accepted as equality filters.
    /// Also the set of keys accepted by `sort`.
    const SUPPORTED_FILTERS: &'static [(&'static str, &'static str)];

    /// Sort applied when the client does not pass `sort`.
    const DEFAULT_SORT: &'static [&'static str] = &[];

    /// Content-pack resources resolve `pack.name` references in addition to ids.
    const CONTENT_PACK: bool = false;

    fn from_model(model: &Self::Db) -> Self::Api;
}

pub struct ResourceController<R: Resource> {
    access: Arc<Access<R::Db>>,
}

impl<R: Resource> ResourceController<R> {
    pub fn new(access: Arc<Access<R::Db>>) -> Self {
        Self { access }
    }

    pub fn access(&self) -> &Access<R::Db> {
        &self.access
    }

    /// Translate query parameters into a [`Query`].
    pub fn build_query(&self, params: &HashMap<String, String>) -> Result<Query, ServiceError> {
        let mut query = Query::new();

        for (param, field) in R::SUPPORTED_FILTERS {
            let value = match params.get(*param) {
                Some(v) if !v.is_empty() => v,
                _ => continue,
            };
            if R::CONTENT_PACK && *param == "ref" {
                let reference = ResourceReference::from_string_reference(value)?;
                query = query.filter("pack", &reference.pack).filter("name", &reference.name);
            } else {
                query = query.filter(field, value);
            }
        }

        // Sort keys go through the same name mapping as filters; others are
        // skipped. When none survive, the default sort applies.
        let requested: Vec<SortKey> = params
            .get("sort")
            .map(|spec| {
                spec.split(',')
                    .filter(|s| !s.trim().is_empty())
                    .map(SortKey::parse)
                    .collect()
            })
            .unwrap_or_default();
        let mut sort = supported_sort::<R>(requested);
        if sort.is_empty() {
            sort = supported_sort::<R>(R::DEFAULT_SORT.iter().map(|s| SortKey::parse(s)).collect());
        }
        for (field, direction) in sort {
            query = query.sort_by(field, direction);
        }

        if let Some(offset) = parse_count(params, "offset")? {
            query = query.offset(offset);
        }
        // `limit=0` means no limit.
        if let Some(limit) = parse_count(params, "limit")?.filter(|l| *l > 0) {
            query = query.limit(limit.min(MAX_PAGE_LIMIT));
        }
        Ok(query)
    }

    /// List records matching the query parameters.
    pub fn get_all(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<(Query, QueryResult<R::Api>), ServiceError> {
        let query = self.build_query(params)?;
        info!("GET all {} with filters={:?}", R::PATH, query.filters);

        let result = self.access.query(&query)?;
        debug!(
            "GET all {} returned {} of {} record(s)",
            R::PATH,
            result.items.len(),
            result.total
        );
        let items = result.items.iter().map(R::from_model).collect();
        Ok((query, QueryResult { items, total: result.total }))
    }

    /// Resolve a path segment to a stored record.
    pub fn lookup(&self, ref_or_id: &str) -> Result<R::Db, ServiceError> {
        let found = if R::CONTENT_PACK && ResourceReference::is_resource_reference(ref_or_id) {
            // A malformed reference resolves to nothing rather than a 400.
            match ResourceReference::from_string_reference(ref_or_id) {
                Ok(reference) => self.access.query_one(
                    &Query::new()
                        .filter("pack", &reference.pack)
                        .filter("name", &reference.name),
                )?,
                Err(_) => None,
            }
        } else {
            self.access.get_by_id(ref_or_id)?
        };

        found.ok_or_else(|| {
            let what = if R::CONTENT_PACK { "ref_or_id" } else { "id" };
            ServiceError::NotFound(format!(
                "Unable to identify resource with {} \"{}\".",
                what, ref_or_id
            ))
        })
    }

    /// One record by id (or `pack.name` for content-pack resources).
    pub fn get_one(&self, ref_or_id: &str) -> Result<R::Api, ServiceError> {
        info!("GET {} with ref_or_id={}", R::PATH, ref_or_id);
        let model = self.lookup(ref_or_id)?;
        Ok(R::from_model(&model))
    }

    /// `GET {PATH}` and `GET {PATH}/{ref_or_id}`.
    pub fn router(self: Arc<Self>) -> Router {
        let item_path = format!("{}/{{ref_or_id}}", R::PATH);
        Router::new()
            .route(R::PATH, get(list_handler::<R>))
            .route(&item_path, get(get_handler::<R>))
            .with_state(self)
    }
}

fn supported_sort<R: Resource>(keys: Vec<SortKey>) -> Vec<(&'static str, Direction)> {
    keys.into_iter()
        .filter_map(|key| {
            R::SUPPORTED_FILTERS
                .iter()
                .find(|(p, _)| *p == key.field)
                .map(|(_, field)| (*field, key.direction))
        })
        .collect()
}

fn parse_count(params: &HashMap<String, String>, name: &str) -> Result<Option<usize>, ServiceError> {
    match params.get(name) {
        None => Ok(None),
        Some(raw) if raw.is_empty() => Ok(None),
        Some(raw) => raw.parse::<usize>().map(Some).map_err(|_| {
            ServiceError::Validation(format!("Invalid value for \"{}\": \"{}\"", name, raw))
        }),
    }
}

async fn list_handler<R: Resource>(
    State(ctrl): State<Arc<ResourceController<R>>>,
    QueryParams(params): QueryParams<HashMap<String, String>>,
) -> Result<Response, ServiceError> {
    let (query, result) = ctrl.get_all(&params)?;

    let mut headers = HeaderMap::new();
    headers.insert(HEADER_TOTAL_COUNT, HeaderValue::from(result.total));
    if let Some(limit) = query.limit {
        headers.insert(HEADER_LIMIT, HeaderValue::from(limit));
    }
    Ok((headers, Json(result.items)).into_response())
}

async fn get_handler<R: Resource>(
    State(ctrl): State<Arc<ResourceController<R>>>,
    Path(ref_or_id): Path<String>,
) -> Result<Json<R::Api>, ServiceError> {
    Ok(Json(ctrl.get_one(&ref_or_id)?))
}
