use crate::schema::resources;

/// A bookable entity. Exactly one of the profile column groups is
/// populated: `personnel_id` for PERSONNEL, `model`/`serial_number` for
/// EQUIPMENT.
#[derive(Clone, Debug, Queryable)]
pub struct ResourceData {
    pub id: u64,
    pub name: String,
    pub resource_type: String,
    pub status: String,
    pub is_active: bool,
    pub personnel_id: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
}

#[derive(Insertable)]
#[table_name = "resources"]
pub struct NewResource {
    pub name: String,
    pub resource_type: String,
    pub status: String,
    pub is_active: bool,
    pub personnel_id: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
}

#[derive(AsChangeset, Default)]
#[table_name = "resources"]
pub struct UpdateResource {
    pub status: Option<String>,
    pub is_active: Option<bool>,
}

pub const RESOURCE_TYPE_PERSONNEL: &str = "PERSONNEL";
pub const RESOURCE_TYPE_EQUIPMENT: &str = "EQUIPMENT";

pub const RESOURCE_STATUS_AVAILABLE: &str = "AVAILABLE";
pub const RESOURCE_STATUS_UNAVAILABLE: &str = "UNAVAILABLE";
pub const RESOURCE_STATUS_RETIRED: &str = "RETIRED";

pub fn is_known_type(resource_type: &str) -> bool {
    matches!(resource_type, RESOURCE_TYPE_PERSONNEL | RESOURCE_TYPE_EQUIPMENT)
}

pub fn is_known_status(status: &str) -> bool {
    matches!(
        status,
        RESOURCE_STATUS_AVAILABLE | RESOURCE_STATUS_UNAVAILABLE | RESOURCE_STATUS_RETIRED
    )
}
