use crate::schema::categories;

#[derive(Queryable, Insertable)]
#[table_name = "categories"]
pub struct CategoryData {
    pub name: String,
    pub information: String,
}
