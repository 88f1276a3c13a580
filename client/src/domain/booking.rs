//! Room reservations.

use serde::{Deserialize, Serialize};

use super::resource::{ListScope, RecordId, Resource, ResourceKind, ResourceRoutes};
use super::wire::null_to_empty;

/// A reservation as the upstream serialises it.
///
/// Dates stay as the upstream's strings; the list controller parses them
/// only where a date-bound filter asks for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Upstream-assigned id.
    pub id: RecordId,
    /// Room being reserved.
    #[serde(rename = "maPhong")]
    pub room_id: RecordId,
    /// Check-in date string.
    #[serde(rename = "ngayDen", default, deserialize_with = "null_to_empty")]
    pub check_in: String,
    /// Check-out date string.
    #[serde(rename = "ngayDi", default, deserialize_with = "null_to_empty")]
    pub check_out: String,
    /// Number of guests.
    #[serde(rename = "soLuongKhach", default)]
    pub guest_count: u32,
    /// User who booked.
    #[serde(rename = "maNguoiDung")]
    pub user_id: RecordId,
}

/// Create payload for a new reservation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookingDraft {
    /// Room being reserved.
    #[serde(rename = "maPhong")]
    pub room_id: RecordId,
    /// Check-in date string.
    #[serde(rename = "ngayDen")]
    pub check_in: String,
    /// Check-out date string.
    #[serde(rename = "ngayDi")]
    pub check_out: String,
    /// Number of guests.
    #[serde(rename = "soLuongKhach")]
    pub guest_count: u32,
    /// User who booked.
    #[serde(rename = "maNguoiDung")]
    pub user_id: RecordId,
}

const ROUTES: ResourceRoutes = ResourceRoutes {
    detail: &["/dat-phong/{id}"],
    create: &["/dat-phong"],
    update: &["/dat-phong/{id}"],
    delete: &["/dat-phong/{id}"],
    upload: &[],
};

impl Resource for Booking {
    const KIND: ResourceKind = ResourceKind::Booking;

    type Draft = BookingDraft;

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
            room_id: draft.room_id,
            check_in: draft.check_in.clone(),
            check_out: draft.check_out.clone(),
            guest_count: draft.guest_count,
            user_id: draft.user_id,
        }
    }

    fn list_routes(scope: &ListScope) -> Vec<String> {
        match scope {
            ListScope::All => vec!["/dat-phong".to_owned()],
            ListScope::ForUser(id) => {
                vec![format!("/dat-phong/lay-theo-nguoi-dung/{id}")]
            }
            ListScope::ForLocation(_) => Vec::new(),
        }
    }

    fn routes() -> &'static ResourceRoutes {
        &ROUTES
    }

    fn search_haystacks(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.room_id.to_string(),
            self.user_id.to_string(),
        ]
    }

    fn filter_text(&self, field: &str) -> Option<String> {
        match field {
            "room_id" => Some(self.room_id.to_string()),
            "user_id" => Some(self.user_id.to_string()),
            "check_in" => Some(self.check_in.clone()),
            "check_out" => Some(self.check_out.clone()),
            _ => None,
        }
    }
}
