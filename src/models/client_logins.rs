use crate::schema::client_logins;
use chrono::NaiveDateTime;

#[derive(Queryable, Insertable)]
#[table_name = "client_logins"]
pub struct ClientLoginData {
    pub token: String,
    pub username: String,
    pub login_time: NaiveDateTime,
}
