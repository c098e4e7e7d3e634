//! Reporting aggregation engine.
//!
//! Pure functions over a snapshot of orders: no I/O, no ambient clock,
//! safe to call concurrently. Callers fetch the order list (and meal
//! catalog where names/prices are needed), validate the date window, and
//! pass everything in. Output shapes are plain serializable data consumed
//! verbatim by the dashboard and export layers.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::models::{Meal, MealRef, Order};

/// Orders without a customer name are grouped under this identity.
pub const WALK_IN_CUSTOMER: &str = "Walk-in Customer";

/// Segment policy: 1 order -> New, 2..=3 -> Returning, 4+ -> Loyal.
pub const SEGMENT_RETURNING_MIN: u32 = 2;
pub const SEGMENT_LOYAL_MIN: u32 = 4;

pub const TOP_MEALS_DEFAULT_LIMIT: usize = 5;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Invalid report window: {0}")]
    InvalidWindow(String),
}

/// Inclusive calendar-date window. Time of day never participates in the
/// boundary test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ReportError> {
        if start > end {
            return Err(ReportError::InvalidWindow(format!(
                "start date {start} is after end date {end}"
            )));
        }
        Ok(DateWindow { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, ReportError> {
        let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")
            .map_err(|e| ReportError::InvalidWindow(format!("malformed start date: {e}")))?;
        let end = NaiveDate::parse_from_str(end, "%Y-%m-%d")
            .map_err(|e| ReportError::InvalidWindow(format!("malformed end date: {e}")))?;
        Self::new(start, end)
    }

    /// Single-day window, used for the default "today" reports.
    pub fn single_day(date: NaiveDate) -> Self {
        DateWindow { start: date, end: date }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailySales {
    pub date: String,
    pub amount: f64,
    pub order_count: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub total_sales: f64,
    pub total_orders: u32,
    pub average_order_value: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub daily_sales: Vec<DailySales>,
    pub summary: SalesSummary,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HourlySlot {
    pub hour: String,
    pub order_count: u32,
    pub percentage: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PeakHoursReport {
    pub hourly_data: Vec<HourlySlot>,
    pub busiest_hour: String,
    pub average_orders_per_hour: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum CustomerSegment {
    New,
    Returning,
    Loyal,
}

impl CustomerSegment {
    pub fn classify(order_count: u32) -> Self {
        if order_count >= SEGMENT_LOYAL_MIN {
            CustomerSegment::Loyal
        } else if order_count >= SEGMENT_RETURNING_MIN {
            CustomerSegment::Returning
        } else {
            CustomerSegment::New
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerStats {
    pub customer_name: String,
    pub total_orders: u32,
    pub total_spent: f64,
    pub last_order_date: String,
    pub favorite_items: Vec<String>,
    pub segment: CustomerSegment,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SegmentCounts {
    pub new: u32,
    pub returning: u32,
    pub loyal: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerReport {
    pub customers: Vec<CustomerStats>,
    pub segments: SegmentCounts,
    pub total_customers: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MealPopularity {
    pub meal_id: i64,
    pub name: String,
    pub category: Option<String>,
    pub price: f64,
    pub total_quantity: i64,
    pub revenue: f64,
}

/// Parse a stored timestamp. The store writes `YYYY-MM-DD HH:MM:SS`;
/// documents imported from elsewhere may carry the RFC 3339 `T` separator
/// or a bare date.
fn parse_created_at(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Filter to orders inside the window, paired with their parsed timestamp.
/// Orders whose timestamp cannot be parsed are dropped from the report.
fn filter_orders<'a>(
    orders: &'a [Order],
    window: Option<&DateWindow>,
) -> Vec<(&'a Order, NaiveDateTime)> {
    orders
        .iter()
        .filter_map(|order| match parse_created_at(&order.created_at) {
            Some(ts) => Some((order, ts)),
            None => {
                warn!(order_id = order.id, created_at = %order.created_at, "Skipping order with unparseable timestamp");
                None
            }
        })
        .filter(|(_, ts)| window.map_or(true, |w| w.contains(ts.date())))
        .collect()
}

/// Daily sales buckets plus the overall summary.
pub fn sales_report(orders: &[Order], window: Option<&DateWindow>) -> SalesReport {
    let mut buckets: std::collections::BTreeMap<NaiveDate, (f64, u32)> =
        std::collections::BTreeMap::new();

    for (order, ts) in filter_orders(orders, window) {
        let bucket = buckets.entry(ts.date()).or_insert((0.0, 0));
        bucket.0 += order.total;
        bucket.1 += 1;
    }

    let daily_sales: Vec<DailySales> = buckets
        .into_iter()
        .map(|(date, (amount, order_count))| DailySales {
            date: date.format("%Y-%m-%d").to_string(),
            amount,
            order_count,
        })
        .collect();

    let total_sales: f64 = daily_sales.iter().map(|d| d.amount).sum();
    let total_orders: u32 = daily_sales.iter().map(|d| d.order_count).sum();
    let average_order_value = if total_orders == 0 {
        0.0
    } else {
        total_sales / total_orders as f64
    };

    SalesReport {
        daily_sales,
        summary: SalesSummary {
            total_sales,
            total_orders,
            average_order_value,
        },
    }
}

/// Hour-of-day load distribution. Always exactly 24 slots.
pub fn peak_hours_report(orders: &[Order], window: Option<&DateWindow>) -> PeakHoursReport {
    let mut counts = [0u32; 24];
    for (_, ts) in filter_orders(orders, window) {
        counts[ts.hour() as usize] += 1;
    }

    let total_orders: u32 = counts.iter().sum();

    let hourly_data: Vec<HourlySlot> = counts
        .iter()
        .enumerate()
        .map(|(hour, &order_count)| HourlySlot {
            hour: format!("{hour:02}:00"),
            order_count,
            percentage: if total_orders == 0 {
                0.0
            } else {
                order_count as f64 / total_orders as f64
            },
        })
        .collect();

    // Ties resolve to the lowest hour: only a strictly greater count wins.
    let mut busiest = 0usize;
    for (hour, &count) in counts.iter().enumerate() {
        if count > counts[busiest] {
            busiest = hour;
        }
    }

    PeakHoursReport {
        hourly_data,
        busiest_hour: format!("{busiest:02}:00"),
        average_orders_per_hour: total_orders as f64 / 24.0,
    }
}

struct CustomerAccum {
    total_orders: u32,
    total_spent: f64,
    last_order: NaiveDateTime,
    last_order_raw: String,
    favorite_items: Vec<String>,
}

/// Per-customer stats and segment counts. Identity is the raw customer
/// name; there is no customer entity, so repeated names alias to one
/// customer and blank names alias to [`WALK_IN_CUSTOMER`].
pub fn customer_report(
    orders: &[Order],
    meals: &[Meal],
    window: Option<&DateWindow>,
) -> CustomerReport {
    let catalog: HashMap<i64, &Meal> = meals.iter().map(|m| (m.id, m)).collect();

    let mut accums: HashMap<String, CustomerAccum> = HashMap::new();
    let mut first_seen: Vec<String> = Vec::new();

    for (order, ts) in filter_orders(orders, window) {
        let name = order
            .customer_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(WALK_IN_CUSTOMER)
            .to_string();

        let accum = accums.entry(name.clone()).or_insert_with(|| {
            first_seen.push(name.clone());
            CustomerAccum {
                total_orders: 0,
                total_spent: 0.0,
                last_order: ts,
                last_order_raw: order.created_at.clone(),
                favorite_items: Vec::new(),
            }
        });

        accum.total_orders += 1;
        accum.total_spent += order.total;
        if ts > accum.last_order {
            accum.last_order = ts;
            accum.last_order_raw = order.created_at.clone();
        }

        for item in &order.items {
            match item_name(&item.meal_ref, &catalog) {
                Some(item_name) => {
                    if !accum.favorite_items.iter().any(|n| n == &item_name) {
                        accum.favorite_items.push(item_name);
                    }
                }
                None => warn!(
                    order_id = order.id,
                    meal_id = item.meal_ref.meal_id(),
                    "Skipping unresolvable meal reference in customer report"
                ),
            }
        }
    }

    let mut customers: Vec<CustomerStats> = first_seen
        .into_iter()
        .filter_map(|name| {
            accums.remove(&name).map(|accum| CustomerStats {
                segment: CustomerSegment::classify(accum.total_orders),
                customer_name: name,
                total_orders: accum.total_orders,
                total_spent: accum.total_spent,
                last_order_date: accum.last_order_raw,
                favorite_items: accum.favorite_items,
            })
        })
        .collect();

    customers.sort_by(|a, b| {
        b.total_spent
            .partial_cmp(&a.total_spent)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut segments = SegmentCounts {
        new: 0,
        returning: 0,
        loyal: 0,
    };
    for customer in &customers {
        match customer.segment {
            CustomerSegment::New => segments.new += 1,
            CustomerSegment::Returning => segments.returning += 1,
            CustomerSegment::Loyal => segments.loyal += 1,
        }
    }

    CustomerReport {
        total_customers: customers.len() as u32,
        customers,
        segments,
    }
}

fn item_name(meal_ref: &MealRef, catalog: &HashMap<i64, &Meal>) -> Option<String> {
    if let Some(snapshot) = meal_ref.snapshot() {
        if let Some(name) = &snapshot.name {
            return Some(name.clone());
        }
    }
    catalog.get(&meal_ref.meal_id()).map(|m| m.name.clone())
}

/// Top-N meals by summed quantity across the filtered orders. Display
/// price and category come from the current catalog (embedded snapshots
/// as the fallback), so revenue reflects today's price, not the price at
/// order time.
pub fn top_meals(
    orders: &[Order],
    meals: &[Meal],
    window: Option<&DateWindow>,
    limit: usize,
) -> Vec<MealPopularity> {
    let catalog: HashMap<i64, &Meal> = meals.iter().map(|m| (m.id, m)).collect();

    let mut by_meal: HashMap<i64, usize> = HashMap::new();
    let mut ranking: Vec<MealPopularity> = Vec::new();

    for (order, _) in filter_orders(orders, window) {
        for item in &order.items {
            let meal_id = item.meal_ref.meal_id();

            if let Some(&idx) = by_meal.get(&meal_id) {
                ranking[idx].total_quantity += item.quantity;
                continue;
            }

            let row = match (catalog.get(&meal_id), item.meal_ref.snapshot()) {
                (Some(meal), _) => MealPopularity {
                    meal_id,
                    name: meal.name.clone(),
                    category: meal.category.clone(),
                    price: meal.price,
                    total_quantity: item.quantity,
                    revenue: 0.0,
                },
                (None, Some(snapshot)) if snapshot.name.is_some() => MealPopularity {
                    meal_id,
                    name: snapshot.name.clone().unwrap_or_default(),
                    category: snapshot.category.clone(),
                    price: snapshot.price.unwrap_or(0.0),
                    total_quantity: item.quantity,
                    revenue: 0.0,
                },
                _ => {
                    warn!(
                        order_id = order.id,
                        meal_id, "Skipping unresolvable meal reference in popularity ranking"
                    );
                    continue;
                }
            };

            by_meal.insert(meal_id, ranking.len());
            ranking.push(row);
        }
    }

    for row in &mut ranking {
        row.revenue = row.price * row.total_quantity as f64;
    }

    // Stable sort keeps first-encountered order for equal quantities.
    ranking.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity));
    ranking.truncate(limit);
    ranking
}
