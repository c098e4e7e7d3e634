use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub price: f64,
    pub available: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeal {
    pub name: String,
    pub category: Option<String>,
    pub price: f64,
    pub available: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeal {
    pub name: String,
    pub category: Option<String>,
    pub price: f64,
    pub available: bool,
}

/// Partial meal data embedded inline at the `mealRef` position by
/// denormalized writers. Only the id is guaranteed.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MealSnapshot {
    pub id: i64,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
}

/// A line item's meal is either a raw id or an embedded snapshot,
/// depending on which writer produced the document.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum MealRef {
    Id(i64),
    Embedded(MealSnapshot),
}

impl MealRef {
    /// Canonical meal identity: the embedded snapshot's id wins when present.
    pub fn meal_id(&self) -> i64 {
        match self {
            MealRef::Id(id) => *id,
            MealRef::Embedded(snapshot) => snapshot.id,
        }
    }

    pub fn snapshot(&self) -> Option<&MealSnapshot> {
        match self {
            MealRef::Id(_) => None,
            MealRef::Embedded(snapshot) => Some(snapshot),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub meal_ref: MealRef,
    pub quantity: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "preparing" => Some(OrderStatus::Preparing),
            "ready" => Some(OrderStatus::Ready),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// pending -> preparing -> ready -> completed, any non-terminal -> cancelled.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, Preparing) => true,
            (Preparing, Ready) => true,
            (Ready, Completed) => true,
            (Pending | Preparing | Ready, Cancelled) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub customer_name: Option<String>,
    pub items: Vec<LineItem>,
    pub total: f64,
    pub status: OrderStatus,
    pub staff_id: i64,
    pub staff_name: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrder {
    pub customer_name: Option<String>,
    pub items: Vec<LineItem>,
    pub staff_id: i64,
}

/// Keeps a present-but-null field distinct from an absent one: absent
/// hits the `default`, null becomes `Some(None)`.
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrder {
    /// Absent leaves the name unchanged; an explicit null clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub customer_name: Option<Option<String>>,
    pub items: Option<Vec<LineItem>>,
    pub staff_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatus {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: i64,
    pub name: String,
    pub role: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStaff {
    pub name: String,
    pub role: Option<String>,
}
