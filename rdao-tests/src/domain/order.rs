use rdao::FromRow;
use rust_decimal::Decimal;

use super::Base;

/// Purchases, keyed by the order number handed out at checkout
#[derive(Debug, Clone, Default, PartialEq, FromRow)]
#[rdao(table)]
pub struct Order {
    #[rdao(pk)]
    pub order_no: String,
    pub user_id: i64,
    #[rdao(column_type = "DECIMAL(12,2)")]
    pub amount: Decimal,
    #[rdao(flatten)]
    pub base: Base,
}
