use serde::Serialize;

#[derive(Default, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub err: String,
    pub login_token: String,
}

#[derive(Default, Serialize)]
pub struct ViewInfoResponse {
    pub success: bool,
    pub err: String,
    pub username: String,
    pub name: String,
    pub telephone: String,
}

#[derive(Default, Serialize)]
pub struct SearchCategoryItem {
    pub name: String,
    pub info: String,
}

#[derive(Default, Serialize)]
pub struct SearchCategoryResponse {
    pub success: bool,
    pub err: String,
    pub categories: Vec<SearchCategoryItem>,
}

#[derive(Default, Serialize)]
pub struct SearchServiceItem {
    pub service_id: u64,
    pub name: String,
    pub category: String,
    pub duration_minutes: i32,
    pub price_cents: i32,
    pub info: String,
}

#[derive(Default, Serialize)]
pub struct SearchServiceResponse {
    pub success: bool,
    pub err: String,
    pub services: Vec<SearchServiceItem>,
}

#[derive(Default, Serialize)]
pub struct BookResponse {
    pub success: bool,
    pub err: String,
    pub appointment_id: u64,
    pub start_time: String,
    pub end_time: String,
    pub status: String,
}

#[derive(Default, Serialize)]
pub struct CancelResponse {
    pub success: bool,
    pub err: String,
    pub appointment_id: u64,
    pub status: String,
    pub cancelled_at: String,
}

#[derive(Default, Serialize)]
pub struct SearchAppointItem {
    pub appointment_id: u64,
    pub service_id: u64,
    pub start_time: String,
    pub end_time: String,
    pub status: String,
    pub notes: String,
}

#[derive(Default, Serialize)]
pub struct SearchAppointResponse {
    pub success: bool,
    pub err: String,
    pub appointments: Vec<SearchAppointItem>,
}

crate::impl_err_response! {
    LoginResponse,
    ViewInfoResponse,
    SearchCategoryResponse,
    SearchServiceResponse,
    BookResponse,
    CancelResponse,
    SearchAppointResponse,
}
