use crate::schema::services;

#[derive(Clone, Debug, Queryable)]
pub struct ServiceData {
    pub id: u64,
    pub name: String,
    pub category: String,
    pub duration_minutes: i32,
    pub price_cents: i32,
    pub information: String,
    pub is_active: bool,
}

#[derive(Insertable)]
#[table_name = "services"]
pub struct NewService {
    pub name: String,
    pub category: String,
    pub duration_minutes: i32,
    pub price_cents: i32,
    pub information: String,
    pub is_active: bool,
}

#[derive(AsChangeset, Default)]
#[table_name = "services"]
pub struct UpdateService {
    pub price_cents: Option<i32>,
    pub information: Option<String>,
    pub is_active: Option<bool>,
}
