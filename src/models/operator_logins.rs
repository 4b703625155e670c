use crate::schema::operator_logins;
use chrono::NaiveDateTime;

#[derive(Queryable, Insertable)]
#[table_name = "operator_logins"]
pub struct OperatorLoginData {
    pub token: String,
    pub oid: String,
    pub login_time: NaiveDateTime,
}
