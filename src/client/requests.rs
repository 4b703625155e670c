use serde::Deserialize;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub telephone: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LogoutRequest {
    pub login_token: String,
}

#[derive(Deserialize)]
pub struct ViewInfoRequest {
    pub login_token: String,
}

#[derive(Deserialize)]
pub struct SearchCategoryRequest {
    pub category_name: Option<String>,
    pub first_index: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct SearchServiceRequest {
    pub service_name: Option<String>,
    pub category_name: Option<String>,
    pub first_index: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct BookRequest {
    pub login_token: String,
    pub service_id: u64,
    pub start_time: String,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct CancelRequest {
    pub login_token: String,
    pub appointment_id: u64,
    #[serde(default)]
    pub reason: String,
}

#[derive(Deserialize)]
pub struct SearchAppointRequest {
    pub login_token: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub status: Option<String>,
}
