use rdao::FromRow;

use super::Base;

/// Registered accounts
#[derive(Debug, Clone, Default, PartialEq, FromRow)]
#[rdao(table = "user")]
pub struct User {
    pub id: i64,
    #[rdao(rename = "user_name")]
    pub name: String,
    pub age: i32,
    #[rdao(json)]
    pub tags: Vec<String>,
    #[rdao(flatten)]
    pub base: Base,
    /// Only lives in memory
    #[rdao(skip)]
    pub session: Option<String>,
}
