//! Geographic locations rooms belong to.

use serde::{Deserialize, Serialize};

use super::resource::{
    LIST_PROBE_QUERY, ListScope, RecordId, Resource, ResourceKind, ResourceRoutes,
};
use super::wire::null_to_empty;

/// A location as the upstream serialises it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Upstream-assigned id.
    pub id: RecordId,
    /// Location name.
    #[serde(rename = "tenViTri")]
    pub name: String,
    /// Province or city.
    #[serde(rename = "tinhThanh", default, deserialize_with = "null_to_empty")]
    pub province: String,
    /// Country.
    #[serde(rename = "quocGia", default, deserialize_with = "null_to_empty")]
    pub country: String,
    /// Cover image URL.
    #[serde(rename = "hinhAnh", default, deserialize_with = "null_to_empty")]
    pub image_url: String,
}

/// Create payload for a new location.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocationDraft {
    /// Location name.
    #[serde(rename = "tenViTri")]
    pub name: String,
    /// Province or city.
    #[serde(rename = "tinhThanh")]
    pub province: String,
    /// Country.
    #[serde(rename = "quocGia")]
    pub country: String,
    /// Cover image URL.
    #[serde(rename = "hinhAnh")]
    pub image_url: String,
}

const ROUTES: ResourceRoutes = ResourceRoutes {
    detail: &["/vi-tri/{id}"],
    create: &["/vi-tri"],
    update: &["/vi-tri/{id}"],
    delete: &["/vi-tri/{id}"],
    upload: &[],
};

impl Resource for Location {
    const KIND: ResourceKind = ResourceKind::Location;

    type Draft = LocationDraft;

    fn id(&self) -> RecordId {
        self.id
    }

    fn with_id(mut self, id: RecordId) -> Self {
        self.id = id;
        self
    }

    fn from_draft(draft: &Self::Draft, id: RecordId) -> Self {
        Self {
            id,
            name: draft.name.clone(),
            province: draft.province.clone(),
            country: draft.country.clone(),
            image_url: draft.image_url.clone(),
        }
    }

    fn list_routes(scope: &ListScope) -> Vec<String> {
        match scope {
            ListScope::All => vec![
                format!("/vi-tri/phan-trang-tim-kiem?{LIST_PROBE_QUERY}"),
                "/vi-tri".to_owned(),
            ],
            ListScope::ForLocation(_) | ListScope::ForUser(_) => Vec::new(),
        }
    }

    fn routes() -> &'static ResourceRoutes {
        &ROUTES
    }

    fn search_haystacks(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.province.clone(),
            self.country.clone(),
        ]
    }

    fn filter_text(&self, field: &str) -> Option<String> {
        match field {
            "province" => Some(self.province.clone()),
            "country" => Some(self.country.clone()),
            _ => None,
        }
    }
}
