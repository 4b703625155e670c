use crate::schema::service_requirements;

/// One (resource type, quantity) demand row of a service. A service with
/// no rows is bookable without resource gating.
#[derive(Clone, Debug, Queryable)]
pub struct RequirementData {
    pub id: u64,
    pub service_id: u64,
    pub resource_type: String,
    pub quantity: i32,
}

#[derive(Insertable)]
#[table_name = "service_requirements"]
pub struct NewRequirement {
    pub service_id: u64,
    pub resource_type: String,
    pub quantity: i32,
}
