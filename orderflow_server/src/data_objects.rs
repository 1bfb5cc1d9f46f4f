use orderflow_common::Amount;
use orderflow_engine::db_types::{ItemId, NewOrder, OrderId, ValidationErrors};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const FIELDS: [&str; 4] = ["order_id", "user_id", "item_ids", "total_amount"];

/// The body of a `POST /orders` request.
///
/// Every field is kept as raw JSON so that a missing or mistyped field is reported against that field, next to any
/// business-rule violations, instead of failing the whole body. Unknown fields (such as `status`) are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewOrderRequest {
    #[serde(default)]
    pub order_id: Option<Value>,
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub item_ids: Option<Value>,
    #[serde(default)]
    pub total_amount: Option<Value>,
}

impl NewOrderRequest {
    /// Converts the request into a [`NewOrder`], collecting every problem with every field.
    pub fn into_new_order(self) -> Result<NewOrder, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let order_id = convert(&mut errors, "order_id", self.order_id, text_value).unwrap_or_default();
        let user_id = convert(&mut errors, "user_id", self.user_id, text_value).unwrap_or_default();
        let item_ids = convert(&mut errors, "item_ids", self.item_ids, item_list).unwrap_or_default();
        let total_amount = convert(&mut errors, "total_amount", self.total_amount, amount_value).unwrap_or_default();
        let order = NewOrder::new(OrderId::from(order_id), user_id, item_ids, total_amount);
        if let Err(rules) = order.validate() {
            // A field that could not be read at all only reports that
            let unread: Vec<&&str> = FIELDS.iter().filter(|f| !errors.contains(f)).collect();
            for field in unread {
                rules.messages(field).iter().for_each(|m| errors.add(*field, m.clone()));
            }
        }
        errors.into_result().map(|_| order)
    }
}

fn convert<T>(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<Value>,
    f: fn(Value) -> Result<T, String>,
) -> Option<T> {
    let result = match value {
        None => Err("This field is required.".to_string()),
        Some(Value::Null) => Err("This field may not be null.".to_string()),
        Some(v) => f(v),
    };
    result.map_err(|msg| errors.add(field, msg)).ok()
}

fn text_value(value: Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err("Not a valid string.".into()),
    }
}

fn item_list(value: Value) -> Result<Vec<ItemId>, String> {
    let Value::Array(items) = value else {
        return Err("Expected a list of items.".into());
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Number(n) => n.as_i64().map(ItemId::Number).ok_or_else(|| format!("{n} is not a valid item id.")),
            Value::String(s) if !s.trim().is_empty() => Ok(ItemId::Text(s)),
            other => Err(format!("{other} is not a valid item id.")),
        })
        .collect()
}

fn amount_value(value: Value) -> Result<Amount, String> {
    match value {
        Value::Number(_) | Value::String(_) => serde_json::from_value::<Amount>(value).map_err(|e| e.to_string()),
        _ => Err("A valid number is required.".into()),
    }
}
