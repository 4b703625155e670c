use crate::schema::clients;

#[derive(Queryable, Insertable)]
#[table_name = "clients"]
pub struct ClientData {
    pub username: String,
    pub password: String,
    pub name: String,
    pub telephone: String,
    pub is_active: bool,
}
