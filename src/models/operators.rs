use crate::schema::operators;

#[derive(Queryable, Insertable)]
#[table_name = "operators"]
pub struct OperatorData {
    pub oid: String,
    pub password: String,
}
