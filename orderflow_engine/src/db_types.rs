use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use orderflow_common::Amount;
use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

/// Maximum length of the caller-assigned identifiers (`order_id`, `user_id`).
pub const MAX_ID_LENGTH: usize = 50;

/// Largest accepted order total, in cents (ten significant digits, two of them after the decimal point).
pub const MAX_TOTAL_CENTS: i64 = 99_999_999_99;

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------        ItemId         ---------------------------------------------------------
/// A reference to a catalogue item. Clients send either numeric or string identifiers, and the order in which they
/// were sent is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Number(i64),
    Text(String),
}

impl Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemId::Number(n) => write!(f, "{n}"),
            ItemId::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for ItemId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    /// The order has been stored and is waiting in the queue.
    Pending,
    /// The order processor has picked up the order.
    Processing,
    /// Processing is finished. This is a terminal state.
    Completed,
}

impl OrderStatusType {
    pub const ALL: [OrderStatusType; 3] = [Self::Pending, Self::Processing, Self::Completed];
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "PENDING"),
            OrderStatusType::Processing => write!(f, "PROCESSING"),
            OrderStatusType::Completed => write!(f, "COMPLETED"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "PROCESSING" => Ok(Self::Processing),
            "COMPLETED" => Ok(Self::Completed),
            _ => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub user_id: String,
    pub item_ids: Vec<ItemId>,
    pub total_amount: Amount,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub processing_completed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// The time spent between the processor picking the order up and finishing it. Only completed orders have one.
    pub fn processing_duration(&self) -> Option<Duration> {
        match (self.processing_started_at, self.processing_completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    /// The caller-assigned, globally unique order identifier
    pub order_id: OrderId,
    /// The customer placing the order. No referential checks are made.
    pub user_id: String,
    pub item_ids: Vec<ItemId>,
    pub total_amount: Amount,
    /// The time the order was accepted. Defaults to now.
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(order_id: OrderId, user_id: String, item_ids: Vec<ItemId>, total_amount: Amount) -> Self {
        Self { order_id, user_id, item_ids, total_amount, created_at: Utc::now() }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Checks the field-level business rules. All problems are reported, not just the first one.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        check_identifier(&mut errors, "order_id", self.order_id.as_str());
        check_identifier(&mut errors, "user_id", &self.user_id);
        if self.item_ids.is_empty() {
            errors.add("item_ids", "Items list cannot be empty.");
        }
        if !self.total_amount.is_positive() {
            errors.add("total_amount", "Total amount must be greater than zero.");
        } else if self.total_amount.cents() > MAX_TOTAL_CENTS {
            errors.add("total_amount", "Ensure that there are no more than 10 digits in total.");
        }
        errors.into_result()
    }
}

fn check_identifier(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "This field may not be blank.");
    } else if value.chars().count() > MAX_ID_LENGTH {
        errors.add(field, format!("Ensure this field has no more than {MAX_ID_LENGTH} characters."));
    }
}

//--------------------------------------   ValidationErrors    ---------------------------------------------------------
/// Field-level validation messages, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn add<F: Into<String>, M: Into<String>>(&mut self, field: F, message: M) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts = self.0.iter().map(|(field, messages)| format!("{field}: {}", messages.join(" ")));
        write!(f, "{}", parts.collect::<Vec<_>>().join("; "))
    }
}

//--------------------------------------   StatusTransition    ---------------------------------------------------------
/// A single forward step in the order lifecycle, with the time it took place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTransition {
    StartProcessing { at: DateTime<Utc> },
    Complete { at: DateTime<Utc> },
}

impl StatusTransition {
    pub fn start_processing() -> Self {
        Self::StartProcessing { at: Utc::now() }
    }

    /// The status the order must currently be in for the transition to apply
    pub fn from_status(&self) -> OrderStatusType {
        match self {
            Self::StartProcessing { .. } => OrderStatusType::Pending,
            Self::Complete { .. } => OrderStatusType::Processing,
        }
    }

    pub fn to_status(&self) -> OrderStatusType {
        match self {
            Self::StartProcessing { .. } => OrderStatusType::Processing,
            Self::Complete { .. } => OrderStatusType::Completed,
        }
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Self::StartProcessing { at } | Self::Complete { at } => *at,
        }
    }
}

//--------------------------------------     StatusCounts      ---------------------------------------------------------
/// Number of orders in each status. Every status is always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    #[serde(rename = "PENDING")]
    pub pending: i64,
    #[serde(rename = "PROCESSING")]
    pub processing: i64,
    #[serde(rename = "COMPLETED")]
    pub completed: i64,
}

impl StatusCounts {
    pub fn get(&self, status: OrderStatusType) -> i64 {
        match status {
            OrderStatusType::Pending => self.pending,
            OrderStatusType::Processing => self.processing,
            OrderStatusType::Completed => self.completed,
        }
    }

    pub fn set(&mut self, status: OrderStatusType, count: i64) {
        match status {
            OrderStatusType::Pending => self.pending = count,
            OrderStatusType::Processing => self.processing = count,
            OrderStatusType::Completed => self.completed = count,
        }
    }

    pub fn total(&self) -> i64 {
        OrderStatusType::ALL.iter().map(|s| self.get(*s)).sum()
    }
}
