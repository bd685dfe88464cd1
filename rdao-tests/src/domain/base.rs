use chrono::NaiveDateTime;
use rdao::FromRow;

/// Audit columns shared by every table
#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct Base {
    pub create_at: Option<NaiveDateTime>,
    pub update_at: Option<NaiveDateTime>,
}
