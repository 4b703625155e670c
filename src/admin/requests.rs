use serde::Deserialize;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub oid: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub oid: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LogoutRequest {
    pub login_token: String,
}

#[derive(Deserialize)]
pub struct AddCategoryRequest {
    pub login_token: String,
    pub category: String,
    #[serde(default)]
    pub info: String,
}

#[derive(Deserialize)]
pub struct RequirementEntry {
    pub resource_type: String,
    pub quantity: i32,
}

#[derive(Deserialize)]
pub struct AddServiceRequest {
    pub login_token: String,
    pub name: String,
    pub category: String,
    pub duration_minutes: i32,
    pub price_cents: i32,
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub requirements: Vec<RequirementEntry>,
}

#[derive(Deserialize)]
pub struct ModifyServiceRequest {
    pub login_token: String,
    pub service_id: u64,
    pub price_cents: Option<i32>,
    pub info: Option<String>,
}

#[derive(Deserialize)]
pub struct SetServiceActiveRequest {
    pub login_token: String,
    pub service_id: u64,
    pub active: bool,
}

#[derive(Deserialize)]
pub struct RegisterEquipmentRequest {
    pub login_token: String,
    pub name: String,
    pub model: Option<String>,
    pub serial_number: Option<String>,
}

#[derive(Deserialize)]
pub struct RegisterPersonnelRequest {
    pub login_token: String,
    pub personnel_id: String,
    pub display_name: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchResourceRequest {
    pub login_token: String,
    pub resource_type: Option<String>,
    pub status: Option<String>,
    pub first_index: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct SetResourceStatusRequest {
    pub login_token: String,
    pub resource_id: u64,
    pub status: String,
}

#[derive(Deserialize)]
pub struct RetireResourceRequest {
    pub login_token: String,
    pub resource_id: u64,
}

#[derive(Deserialize)]
pub struct SearchAppointRequest {
    pub login_token: String,
    pub username: Option<String>,
    pub status: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Deserialize)]
pub struct AppointActionRequest {
    pub login_token: String,
    pub appointment_id: u64,
}

#[derive(Deserialize)]
pub struct CancelAppointRequest {
    pub login_token: String,
    pub appointment_id: u64,
    #[serde(default)]
    pub reason: String,
}
