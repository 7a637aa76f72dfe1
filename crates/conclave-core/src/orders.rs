//! Supply-chain order coordination
//!
//! An order is handed to the default roster as a round-robin team and then
//! settled by a deterministic coordinator: stock, pricing and shipping come
//! from fixed tables, never from the team transcript.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::agents::ROSTER;
use crate::error::{Error, Result};
use crate::orchestration::{
    OrchestrationService, RunStatus, TeamMember, TeamRunRequest, TranscriptEntry,
};
use crate::routing::RoutingPattern;

const IN_STOCK: u32 = 600;
const RESERVED: u32 = 100;
const REORDER_POINT: u32 = 200;
const WAREHOUSE: &str = "WH-EAST-01";
const CARRIER: &str = "FastShip Logistics";
const SUPPLIER_CAPACITY: u32 = 1000;
const VOLUME_PRICE: f64 = 25.00;
const VOLUME_QUANTITY: u32 = 50;

/// Order urgency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderPriority {
    /// Standard supplier tier
    Low,
    /// Default
    #[default]
    Normal,
    /// Express shipping
    High,
    /// Overnight shipping
    Urgent,
}

impl fmt::Display for OrderPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        })
    }
}

/// Incoming order; every field is optional
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct OrderRequest {
    /// Defaults to `ORD-<UTC yyyymmddHHMMSS>`
    #[serde(default)]
    pub order_id: Option<String>,
    /// Defaults to `Unknown Product`
    #[serde(default)]
    pub product_name: Option<String>,
    /// Defaults to 1
    #[serde(default)]
    pub quantity: Option<u32>,
    /// Defaults to `normal`
    #[serde(default)]
    pub priority: Option<OrderPriority>,
    /// Delivery destination
    #[serde(default)]
    pub destination: Option<String>,
    /// Requested delivery date, free text
    #[serde(default)]
    pub required_date: Option<String>,
    /// Free-text notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// Order with defaults filled in
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct OrderDetails {
    pub order_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub priority: OrderPriority,
    pub destination: String,
    pub required_date: Option<String>,
    pub notes: String,
}

impl OrderDetails {
    /// Apply defaults; a zero quantity is rejected
    pub fn from_request(request: OrderRequest, now: DateTime<Utc>) -> Result<Self> {
        let quantity = request.quantity.unwrap_or(1);
        if quantity == 0 {
            return Err(Error::Validation("quantity must be at least 1".to_string()));
        }
        Ok(Self {
            order_id: request
                .order_id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| format!("ORD-{}", now.format("%Y%m%d%H%M%S"))),
            product_name: request
                .product_name
                .unwrap_or_else(|| "Unknown Product".to_string()),
            quantity,
            priority: request.priority.unwrap_or_default(),
            destination: request.destination.unwrap_or_default(),
            required_date: request.required_date,
            notes: request.notes.unwrap_or_default(),
        })
    }

    fn team_task(&self) -> String {
        format!(
            "Process supply chain order {}: {}x {} (priority {}, destination {}, required {}, notes: {})",
            self.order_id,
            self.quantity,
            self.product_name,
            self.priority,
            if self.destination.is_empty() { "unspecified" } else { &self.destination },
            self.required_date.as_deref().unwrap_or("not specified"),
            if self.notes.is_empty() { "none" } else { &self.notes },
        )
    }
}

/// Coordinator verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Stock covers the order
    Confirmed,
    /// Waiting on supplier coordination
    Pending,
}

impl OrderStatus {
    fn as_lower(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Pending => "pending",
        }
    }
}

/// Supplier availability and pricing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SupplierQuote {
    /// Always true for the mock supplier
    pub available: bool,
    /// `SUP-` plus the product prefix
    pub supplier_id: String,
    /// Volume-discounted unit price
    pub unit_price: f64,
    /// Days until the supplier ships
    pub lead_time_days: u32,
    /// Units the supplier can deliver
    pub capacity: u32,
    /// Supplier tier
    pub notes: String,
}

/// Warehouse stock for the product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InventorySnapshot {
    /// Units on hand
    pub in_stock: u32,
    /// Units held for other orders
    pub reserved: u32,
    /// `in_stock - reserved`
    pub available: u32,
    /// Restock threshold
    pub reorder_point: u32,
    /// Warehouse code
    pub warehouse_location: String,
    /// Snapshot time
    pub last_updated: DateTime<Utc>,
}

/// Carrier and delivery estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ShippingPlan {
    /// Carrier name
    pub carrier: String,
    /// standard, express or overnight
    pub shipping_method: String,
    /// Flat shipping cost
    pub shipping_cost: f64,
    /// Now plus the shipping lead time
    pub estimated_delivery: DateTime<Utc>,
}

/// Outcome of order coordination
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResult {
    /// Order ID (generated when absent)
    pub order_id: String,
    /// Coordinator verdict
    pub status: OrderStatus,
    /// Supplier quote
    pub supplier: SupplierQuote,
    /// Stock snapshot
    pub inventory: InventorySnapshot,
    /// Shipping plan
    pub logistics: ShippingPlan,
    /// One-paragraph summary
    pub coordinator_summary: String,
    /// Follow-up suggestions
    pub recommendations: Vec<String>,
    /// Status of the roster team run
    pub team_status: RunStatus,
    /// What each roster agent said
    pub transcript: Vec<TranscriptEntry>,
    /// Processing time
    pub timestamp: DateTime<Utc>,
}

/// Everything the coordinator decides, without the team transcript
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct Assessment {
    pub status: OrderStatus,
    pub supplier: SupplierQuote,
    pub inventory: InventorySnapshot,
    pub logistics: ShippingPlan,
    pub coordinator_summary: String,
    pub recommendations: Vec<String>,
}

fn unit_price(quantity: u32) -> f64 {
    match quantity {
        q if q >= 100 => 22.50,
        q if q >= 50 => 25.00,
        q if q >= 10 => 27.50,
        _ => 30.00,
    }
}

fn shipping(priority: OrderPriority) -> (&'static str, f64, u32) {
    match priority {
        OrderPriority::Urgent => ("overnight", 75.00, 1),
        OrderPriority::High => ("express", 45.00, 2),
        OrderPriority::Low | OrderPriority::Normal => ("standard", 25.00, 5),
    }
}

fn supplier_id(product_name: &str) -> String {
    let prefix: String = product_name.chars().take(3).collect::<String>().to_uppercase();
    format!("SUP-{:0>3}", prefix)
}

/// Settle an order against the fixed stock, price and shipping tables
pub fn assess(order: &OrderDetails, now: DateTime<Utc>) -> Assessment {
    let available = IN_STOCK - RESERVED;
    let can_fulfill = order.quantity <= available;
    let (method, cost, lead_days) = shipping(order.priority);
    let price = unit_price(order.quantity);
    let status = if can_fulfill {
        OrderStatus::Confirmed
    } else {
        OrderStatus::Pending
    };

    let mut recommendations = Vec::new();
    if !can_fulfill {
        recommendations.push(format!(
            "Insufficient stock. Consider reducing order quantity to {} or placing a backorder.",
            available
        ));
    }
    if order.priority == OrderPriority::Urgent && order.quantity > 100 {
        recommendations
            .push("Large urgent orders may require split shipments from multiple warehouses.".to_string());
    }
    if price > VOLUME_PRICE {
        recommendations.push(format!(
            "Consider increasing order to {} units for volume pricing (${:.2}/unit).",
            VOLUME_QUANTITY, VOLUME_PRICE
        ));
    }

    let stock_sentence = if can_fulfill {
        "Stock is available for immediate fulfillment."
    } else {
        "Stock shortage requires supplier coordination."
    };
    let destination = if order.destination.is_empty() {
        "default destination"
    } else {
        &order.destination
    };
    let coordinator_summary = format!(
        "Order {} for {}x {} has been {}. {} Shipping via {} to {}.",
        order.order_id,
        order.quantity,
        order.product_name,
        status.as_lower(),
        stock_sentence,
        method,
        destination
    );

    Assessment {
        status,
        supplier: SupplierQuote {
            available: true,
            supplier_id: supplier_id(&order.product_name),
            unit_price: price,
            lead_time_days: lead_days,
            capacity: SUPPLIER_CAPACITY,
            notes: if order.priority == OrderPriority::Low {
                "Standard supplier tier".to_string()
            } else {
                "Preferred supplier tier".to_string()
            },
        },
        inventory: InventorySnapshot {
            in_stock: IN_STOCK,
            reserved: RESERVED,
            available,
            reorder_point: REORDER_POINT,
            warehouse_location: WAREHOUSE.to_string(),
            last_updated: now,
        },
        logistics: ShippingPlan {
            carrier: CARRIER.to_string(),
            shipping_method: method.to_string(),
            shipping_cost: cost,
            estimated_delivery: now + ChronoDuration::days(i64::from(lead_days)),
        },
        coordinator_summary,
        recommendations,
    }
}

/// Runs orders through the roster team and the coordinator
pub struct OrderService {
    teams: Arc<OrchestrationService>,
}

impl OrderService {
    /// Create the service
    pub fn new(teams: Arc<OrchestrationService>) -> Self {
        Self { teams }
    }

    /// Process one order
    pub async fn process(&self, request: OrderRequest) -> Result<OrderResult> {
        let now = Utc::now();
        let order = OrderDetails::from_request(request, now)?;

        let members = ROSTER
            .iter()
            .map(|(name, role, _)| TeamMember::new(*name, *role))
            .collect();
        let run = self
            .teams
            .run(TeamRunRequest {
                pattern: RoutingPattern::RoundRobin,
                participants: members,
                task: order.team_task(),
            })
            .await?;

        let assessment = assess(&order, now);
        info!(
            order_id = %order.order_id,
            quantity = order.quantity,
            priority = %order.priority,
            status = ?assessment.status,
            team_status = ?run.status,
            "Order processed"
        );

        Ok(OrderResult {
            order_id: order.order_id,
            status: assessment.status,
            supplier: assessment.supplier,
            inventory: assessment.inventory,
            logistics: assessment.logistics,
            coordinator_summary: assessment.coordinator_summary,
            recommendations: assessment.recommendations,
            team_status: run.status,
            transcript: run.transcript,
            timestamp: now,
        })
    }
}
