use serde::Serialize;

#[derive(Default, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub err: String,
    pub login_token: String,
}

#[derive(Default, Serialize)]
pub struct SearchResourceItem {
    pub resource_id: u64,
    pub name: String,
    pub resource_type: String,
    pub status: String,
    pub is_active: bool,
    pub personnel_id: String,
    pub model: String,
    pub serial_number: String,
}

#[derive(Default, Serialize)]
pub struct SearchResourceResponse {
    pub success: bool,
    pub err: String,
    pub resources: Vec<SearchResourceItem>,
}

#[derive(Default, Serialize)]
pub struct SearchAppointItem {
    pub appointment_id: u64,
    pub username: String,
    pub service_id: u64,
    pub start_time: String,
    pub end_time: String,
    pub status: String,
}

#[derive(Default, Serialize)]
pub struct SearchAppointResponse {
    pub success: bool,
    pub err: String,
    pub appointments: Vec<SearchAppointItem>,
}

#[derive(Default, Serialize)]
pub struct AppointResponse {
    pub success: bool,
    pub err: String,
    pub appointment_id: u64,
    pub status: String,
}

crate::impl_err_response! {
    LoginResponse,
    SearchResourceResponse,
    SearchAppointResponse,
    AppointResponse,
}
