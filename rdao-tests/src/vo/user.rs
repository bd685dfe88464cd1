use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserVo {
    pub id: i64,
    pub name: String,
    pub age: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserQuery {
    pub keyword: String,
    pub page_no: u64,
    pub page_size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPage {
    pub total: u64,
    pub items: Vec<UserVo>,
}
