//! Rentable rooms.
//!
//! The upstream serialises rooms with Vietnamese field names; the renames
//! below pin the exact wire contract so the rest of the crate works with
//! descriptive names.

use serde::{Deserialize, Serialize};

use super::resource::{
    LIST_PROBE_QUERY, ListScope, RecordId, Resource, ResourceKind, ResourceRoutes,
};
use super::wire::null_to_empty;

/// A rentable room as the upstream serialises it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Upstream-assigned id.
    pub id: RecordId,
    /// Room title.
    #[serde(rename = "tenPhong")]
    pub name: String,
    /// Maximum guest count.
    #[serde(rename = "khach", default)]
    pub max_guests: u32,
    /// Bedroom count.
    #[serde(rename = "phongNgu", default)]
    pub bedrooms: u32,
    /// Bed count.
    #[serde(rename = "giuong", default)]
    pub beds: u32,
    /// Bathroom count.
    #[serde(rename = "phongTam", default)]
    pub bathrooms: u32,
    /// Free-text description.
    #[serde(rename = "moTa", default, deserialize_with = "null_to_empty")]
    pub description: String,
    /// Nightly price in the upstream's currency unit.
    #[serde(rename = "giaTien", default)]
    pub price: i64,
    /// Washing machine available.
    #[serde(rename = "mayGiat", default)]
    pub washing_machine: bool,
    /// Iron available.
    #[serde(rename = "banLa", default)]
    pub iron: bool,
    /// Television available.
    #[serde(rename = "tivi", default)]
    pub television: bool,
    /// Air conditioning available.
    #[serde(rename = "dieuHoa", default)]
    pub air_conditioning: bool,
    /// Wifi available.
    #[serde(default)]
    pub wifi: bool,
    /// Kitchen available.
    #[serde(rename = "bep", default)]
    pub kitchen: bool,
    /// Parking available.
    #[serde(rename = "doXe", default)]
    pub parking: bool,
    /// Swimming pool available.
    #[serde(rename = "hoBoi", default)]
    pub pool: bool,
    /// Ironing board available.
    #[serde(rename = "banUi", default)]
    pub ironing_board: bool,
    /// Location the room belongs to.
    #[serde(rename = "maViTri", default)]
    pub location_id: RecordId,
    /// Photo URL.
    #[serde(rename = "hinhAnh", default, deserialize_with = "null_to_empty")]
    pub image_url: String,
}

/// Create payload for a new room.
///
/// The upstream validates the exact field set and requires a literal
/// `id: 0` on creates; keep [`RoomDraft::id`] at [`RecordId::ZERO`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoomDraft {
    /// Placeholder id; the upstream insists it is present and zero.
    pub id: RecordId,
    /// Room title.
    #[serde(rename = "tenPhong")]
    pub name: String,
    /// Maximum guest count.
    #[serde(rename = "khach")]
    pub max_guests: u32,
    /// Bedroom count.
    #[serde(rename = "phongNgu")]
    pub bedrooms: u32,
    /// Bed count.
    #[serde(rename = "giuong")]
    pub beds: u32,
    /// Bathroom count.
    #[serde(rename = "phongTam")]
    pub bathrooms: u32,
    /// Free-text description.
    #[serde(rename = "moTa")]
    pub description: String,
    /// Nightly price.
    #[serde(rename = "giaTien")]
    pub price: i64,
    /// Washing machine available.
    #[serde(rename = "mayGiat")]
    pub washing_machine: bool,
    /// Iron available.
    #[serde(rename = "banLa")]
    pub iron: bool,
    /// Television available.
    #[serde(rename = "tivi")]
    pub television: bool,
    /// Air conditioning available.
    #[serde(rename = "dieuHoa")]
    pub air_conditioning: bool,
    /// Wifi available.
    pub wifi: bool,
    /// Kitchen available.
    #[serde(rename = "bep")]
    pub kitchen: bool,
    /// Parking available.
    #[serde(rename = "doXe")]
    pub parking: bool,
    /// Swimming pool available.
    #[serde(rename = "hoBoi")]
    pub pool: bool,
    /// Ironing board available.
    #[serde(rename = "banUi")]
    pub ironing_board: bool,
    /// Location the room belongs to.
    #[serde(rename = "maViTri")]
    pub location_id: RecordId,
    /// Photo URL.
    #[serde(rename = "hinhAnh")]
    pub image_url: String,
}

const ROUTES: ResourceRoutes = ResourceRoutes {
    detail: &["/phong-thue/{id}", "/rooms/{id}"],
    create: &[
        "/phong-thue",
        "/phong-thue/them-phong-thue",
        "/api/phong-thue",
        "/rooms",
    ],
    update: &["/phong-thue/{id}"],
    delete: &["/phong-thue/{id}"],
    upload: &[
        "/phong-thue/upload-hinh-phong?maPhong={id}",
        "/rooms/{id}/upload-image",
    ],
};

impl Resource for Room {
    const KIND: ResourceKind = ResourceKind::Room;

    type Draft = RoomDraft;

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
            max_guests: draft.max_guests,
            bedrooms: draft.bedrooms,
            beds: draft.beds,
            bathrooms: draft.bathrooms,
            description: draft.description.clone(),
            price: draft.price,
            washing_machine: draft.washing_machine,
            iron: draft.iron,
            television: draft.television,
            air_conditioning: draft.air_conditioning,
            wifi: draft.wifi,
            kitchen: draft.kitchen,
            parking: draft.parking,
            pool: draft.pool,
            ironing_board: draft.ironing_board,
            location_id: draft.location_id,
            image_url: draft.image_url.clone(),
        }
    }

    fn list_routes(scope: &ListScope) -> Vec<String> {
        match scope {
            ListScope::All => vec![
                format!("/phong-thue/phan-trang-tim-kiem?{LIST_PROBE_QUERY}"),
                format!("/phong-thue?{LIST_PROBE_QUERY}"),
                format!("/rooms?{LIST_PROBE_QUERY}"),
            ],
            ListScope::ForLocation(id) => {
                vec![format!("/phong-thue/lay-phong-theo-vi-tri?maViTri={id}")]
            }
            ListScope::ForUser(_) => Vec::new(),
        }
    }

    fn routes() -> &'static ResourceRoutes {
        &ROUTES
    }

    fn search_haystacks(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.description.clone(),
            self.id.to_string(),
        ]
    }

    fn filter_text(&self, field: &str) -> Option<String> {
        match field {
            "location_id" => Some(self.location_id.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Resource, Room, RoomDraft};
    use crate::domain::resource::{ListScope, RecordId};

    fn upstream_room_body() -> &'static str {
        r#"{
            "id": 7,
            "tenPhong": "Seaside Villa",
            "khach": 6,
            "phongNgu": 3,
            "giuong": 4,
            "phongTam": 2,
            "moTa": "Villa with a sea view",
            "giaTien": 2500000,
            "mayGiat": true,
            "banLa": true,
            "tivi": true,
            "dieuHoa": true,
            "wifi": true,
            "bep": true,
            "doXe": true,
            "hoBoi": true,
            "banUi": true,
            "maViTri": 1,
            "hinhAnh": "https://example.com/villa.jpg"
        }"#
    }

    #[test]
    fn decodes_the_vietnamese_wire_names() {
        let room: Room = serde_json::from_str(upstream_room_body()).expect("room decodes");
        assert_eq!(room.name, "Seaside Villa");
        assert_eq!(room.max_guests, 6);
        assert_eq!(room.location_id, RecordId::new(1));
        assert!(room.pool);
    }

    #[test]
    fn draft_serialises_a_literal_zero_id() {
        let draft = RoomDraft {
            name: "New Room".to_owned(),
            ..RoomDraft::default()
        };
        let wire = serde_json::to_value(&draft).expect("draft encodes");
        assert_eq!(wire.get("id").and_then(serde_json::Value::as_i64), Some(0));
        assert_eq!(
            wire.get("tenPhong").and_then(serde_json::Value::as_str),
            Some("New Room")
        );
    }

    #[test]
    fn materialised_draft_carries_the_assigned_id() {
        let draft = RoomDraft {
            name: "Demo Room".to_owned(),
            price: 1200,
            ..RoomDraft::default()
        };
        let room = Room::from_draft(&draft, RecordId::new(999_001));
        assert_eq!(room.id, RecordId::new(999_001));
        assert_eq!(room.name, "Demo Room");
        assert_eq!(room.price, 1200);
    }

    #[test]
    fn by_location_scope_uses_the_dedicated_endpoint() {
        let routes = Room::list_routes(&ListScope::ForLocation(RecordId::new(5)));
        assert_eq!(routes, vec!["/phong-thue/lay-phong-theo-vi-tri?maViTri=5"]);
    }

    #[test]
    fn search_covers_name_description_and_id() {
        let room: Room = serde_json::from_str(upstream_room_body()).expect("room decodes");
        let haystacks = room.search_haystacks();
        assert!(haystacks.contains(&"Seaside Villa".to_owned()));
        assert!(haystacks.contains(&"7".to_owned()));
    }
}
