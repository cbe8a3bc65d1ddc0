// foodloop/server/src/db/pg_store.rs

//! `OrderStore` on Postgres.
//!
//! Stock changes are single conditional statements (`quantity >= $n` in the
//! WHERE clause), so concurrent writers can never drive a row negative.
//! Checkout and status changes each run in one transaction; status changes
//! take a row lock on the order first so changes to one order are serialized.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use foodloop::models::{FoodItem, FoodItemStatus, Order, OrderLineItem, OrderStatus, StatusLogEntry};
use foodloop::store::{AppliedChange, OrderDraft, OrderStore, PlacedOrder, RestoredStock, TransitionPlanner};
use foodloop::{EngineError, EngineResult};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::{debug, instrument};
use uuid::Uuid;

const FOOD_ITEM_COLUMNS: &str =
  "id, name, price, discounted_price, quantity, status, expires_at, provider_id, category_id";

const ORDER_COLUMNS: &str = "id, user_profile_id, provider_id, status, total_amount, delivery_address, \
   delivery_notes, payment_method, estimated_delivery, is_reviewed, viewed_by_provider, created_at, updated_at";

// --- Row types ---

#[derive(Debug, FromRow)]
struct FoodItemRow {
  id: Uuid,
  name: String,
  price: Decimal,
  discounted_price: Decimal,
  quantity: i32,
  status: String,
  expires_at: DateTime<Utc>,
  provider_id: Uuid,
  category_id: Option<Uuid>,
}

impl FoodItemRow {
  fn into_model(self) -> EngineResult<FoodItem> {
    Ok(FoodItem {
      id: self.id,
      name: self.name,
      price: self.price,
      discounted_price: self.discounted_price,
      quantity: self.quantity,
      status: self.status.parse()?,
      expires_at: self.expires_at,
      provider_id: self.provider_id,
      category_id: self.category_id,
    })
  }
}

#[derive(Debug, FromRow)]
struct OrderRow {
  id: Uuid,
  user_profile_id: Uuid,
  provider_id: Uuid,
  status: String,
  total_amount: Decimal,
  delivery_address: String,
  delivery_notes: Option<String>,
  payment_method: String,
  estimated_delivery: Option<DateTime<Utc>>,
  is_reviewed: bool,
  viewed_by_provider: bool,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl OrderRow {
  fn into_model(self) -> EngineResult<Order> {
    Ok(Order {
      id: self.id,
      user_profile_id: self.user_profile_id,
      provider_id: self.provider_id,
      status: self.status.parse()?,
      total_amount: self.total_amount,
      delivery_address: self.delivery_address,
      delivery_notes: self.delivery_notes,
      payment_method: self.payment_method,
      estimated_delivery: self.estimated_delivery,
      is_reviewed: self.is_reviewed,
      viewed_by_provider: self.viewed_by_provider,
      created_at: self.created_at,
      updated_at: self.updated_at,
    })
  }
}

#[derive(Debug, FromRow)]
struct LineItemRow {
  id: Uuid,
  order_id: Uuid,
  food_item_id: Uuid,
  quantity: i32,
  price: Decimal,
}

impl From<LineItemRow> for OrderLineItem {
  fn from(row: LineItemRow) -> Self {
    OrderLineItem {
      id: row.id,
      order_id: row.order_id,
      food_item_id: row.food_item_id,
      quantity: row.quantity,
      price: row.price,
    }
  }
}

#[derive(Debug, FromRow)]
struct StatusLogRow {
  id: Uuid,
  order_id: Uuid,
  status: String,
  notes: Option<String>,
  created_at: DateTime<Utc>,
}

impl StatusLogRow {
  fn into_model(self) -> EngineResult<StatusLogEntry> {
    Ok(StatusLogEntry {
      id: self.id,
      order_id: self.order_id,
      status: self.status.parse()?,
      notes: self.notes,
      created_at: self.created_at,
    })
  }
}

fn orders_from_rows(rows: Vec<OrderRow>) -> EngineResult<Vec<Order>> {
  rows.into_iter().map(OrderRow::into_model).collect()
}

fn ensure_positive(amount: i32) -> EngineResult<()> {
  if amount <= 0 {
    return Err(EngineError::validation(format!("stock amount must be positive, got {}", amount)));
  }
  Ok(())
}

// --- Stock primitives, shared by the standalone calls and the transactional units ---

async fn decrement_on(conn: &mut PgConnection, item_id: Uuid, amount: i32) -> EngineResult<FoodItem> {
  ensure_positive(amount)?;
  let sql = format!(
    "UPDATE food_items \
     SET quantity = quantity - $2, \
         status = CASE WHEN quantity - $2 = 0 AND status = 'ACTIVE' THEN 'SOLD' ELSE status END \
     WHERE id = $1 AND quantity >= $2 \
     RETURNING {}",
    FOOD_ITEM_COLUMNS
  );
  let updated: Option<FoodItemRow> = sqlx::query_as(&sql)
    .bind(item_id)
    .bind(amount)
    .fetch_optional(&mut *conn)
    .await
    .map_err(EngineError::storage)?;
  if let Some(row) = updated {
    return row.into_model();
  }

  // Nothing matched: either the item is missing or there is not enough stock.
  let available: Option<i32> = sqlx::query_scalar("SELECT quantity FROM food_items WHERE id = $1")
    .bind(item_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(EngineError::storage)?;
  match available {
    Some(available) => Err(EngineError::InsufficientStock {
      item_id,
      requested: amount,
      available,
    }),
    None => Err(EngineError::not_found("food item", item_id)),
  }
}

async fn increment_on(
  conn: &mut PgConnection,
  item_id: Uuid,
  amount: i32,
  now: DateTime<Utc>,
) -> EngineResult<RestoredStock> {
  ensure_positive(amount)?;
  let before: Option<(String, DateTime<Utc>)> =
    sqlx::query_as("SELECT status, expires_at FROM food_items WHERE id = $1 FOR UPDATE")
      .bind(item_id)
      .fetch_optional(&mut *conn)
      .await
      .map_err(EngineError::storage)?;
  let (status, expires_at) = before.ok_or_else(|| EngineError::not_found("food item", item_id))?;
  let relisted = status.parse::<FoodItemStatus>()? == FoodItemStatus::Sold && expires_at > now;

  sqlx::query(
    "UPDATE food_items \
     SET quantity = quantity + $2, \
         status = CASE WHEN $3 THEN 'ACTIVE' ELSE status END \
     WHERE id = $1",
  )
  .bind(item_id)
  .bind(amount)
  .bind(relisted)
  .execute(&mut *conn)
  .await
  .map_err(EngineError::storage)?;

  Ok(RestoredStock {
    food_item_id: item_id,
    quantity: amount,
    relisted,
  })
}

#[derive(Debug, Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  async fn orders_where(&self, filter: &str, bind_id: Uuid, status: Option<OrderStatus>) -> EngineResult<Vec<Order>> {
    let sql = format!(
      "SELECT {} FROM orders WHERE {} = $1 AND ($2::text IS NULL OR status = $2) ORDER BY created_at DESC, seq DESC",
      ORDER_COLUMNS, filter
    );
    let rows: Vec<OrderRow> = sqlx::query_as(&sql)
      .bind(bind_id)
      .bind(status.map(OrderStatus::as_str))
      .fetch_all(&self.pool)
      .await
      .map_err(EngineError::storage)?;
    orders_from_rows(rows)
  }

  /// Flips a boolean flag from false to true. `Ok(false)` if it was already set.
  async fn set_flag_once(&self, column: &str, order_id: Uuid) -> EngineResult<bool> {
    let sql = format!("UPDATE orders SET {0} = TRUE WHERE id = $1 AND NOT {0}", column);
    let changed = sqlx::query(&sql)
      .bind(order_id)
      .execute(&self.pool)
      .await
      .map_err(EngineError::storage)?
      .rows_affected();
    if changed > 0 {
      return Ok(true);
    }
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE id = $1)")
      .bind(order_id)
      .fetch_one(&self.pool)
      .await
      .map_err(EngineError::storage)?;
    if exists {
      Ok(false)
    } else {
      Err(EngineError::not_found("order", order_id))
    }
  }
}

#[async_trait]
impl OrderStore for PgStore {
  async fn save_food_item(&self, item: FoodItem) -> EngineResult<()> {
    if item.quantity < 0 {
      return Err(EngineError::validation("food item quantity cannot be negative"));
    }
    sqlx::query(
      r#"
      INSERT INTO food_items (
          id, name, price, discounted_price, quantity, status, expires_at, provider_id, category_id
      )
      VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
      ON CONFLICT (id) DO UPDATE SET
          name = EXCLUDED.name, price = EXCLUDED.price,
          discounted_price = EXCLUDED.discounted_price, quantity = EXCLUDED.quantity,
          status = EXCLUDED.status, expires_at = EXCLUDED.expires_at,
          provider_id = EXCLUDED.provider_id, category_id = EXCLUDED.category_id
      "#,
    )
    .bind(item.id)
    .bind(&item.name)
    .bind(item.price)
    .bind(item.discounted_price)
    .bind(item.quantity)
    .bind(item.status.as_str())
    .bind(item.expires_at)
    .bind(item.provider_id)
    .bind(item.category_id)
    .execute(&self.pool)
    .await
    .map_err(EngineError::storage)?;
    Ok(())
  }

  async fn food_item(&self, item_id: Uuid) -> EngineResult<Option<FoodItem>> {
    let sql = format!("SELECT {} FROM food_items WHERE id = $1", FOOD_ITEM_COLUMNS);
    let row: Option<FoodItemRow> = sqlx::query_as(&sql)
      .bind(item_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(EngineError::storage)?;
    row.map(FoodItemRow::into_model).transpose()
  }

  async fn food_items(&self, item_ids: &[Uuid]) -> EngineResult<Vec<FoodItem>> {
    let sql = format!("SELECT {} FROM food_items WHERE id = ANY($1)", FOOD_ITEM_COLUMNS);
    let rows: Vec<FoodItemRow> = sqlx::query_as(&sql)
      .bind(item_ids)
      .fetch_all(&self.pool)
      .await
      .map_err(EngineError::storage)?;
    rows.into_iter().map(FoodItemRow::into_model).collect()
  }

  async fn expire_stale(&self, now: DateTime<Utc>) -> EngineResult<u64> {
    let result = sqlx::query("UPDATE food_items SET status = 'EXPIRED' WHERE status = 'ACTIVE' AND expires_at < $1")
      .bind(now)
      .execute(&self.pool)
      .await
      .map_err(EngineError::storage)?;
    Ok(result.rows_affected())
  }

  async fn decrement_stock(&self, item_id: Uuid, amount: i32) -> EngineResult<FoodItem> {
    let mut conn = self.pool.acquire().await.map_err(EngineError::storage)?;
    decrement_on(&mut conn, item_id, amount).await
  }

  async fn increment_stock(&self, item_id: Uuid, amount: i32, now: DateTime<Utc>) -> EngineResult<RestoredStock> {
    let mut tx = self.pool.begin().await.map_err(EngineError::storage)?;
    let restored = increment_on(&mut tx, item_id, amount, now).await?;
    tx.commit().await.map_err(EngineError::storage)?;
    Ok(restored)
  }

  #[instrument(name = "pg_store::commit_checkout", skip_all, fields(order_id = %draft.order_id))]
  async fn commit_checkout(&self, draft: OrderDraft) -> EngineResult<PlacedOrder> {
    let placed = draft.to_records();
    let decrements = draft.stock_decrements()?;
    let mut tx = self.pool.begin().await.map_err(EngineError::storage)?;

    // Any failure below drops `tx`, which rolls the whole unit back.
    for (item_id, quantity) in decrements {
      decrement_on(&mut tx, item_id, quantity).await?;
    }

    let order = &placed.order;
    sqlx::query(
      r#"
      INSERT INTO orders (
          id, user_profile_id, provider_id, status, total_amount, delivery_address,
          delivery_notes, payment_method, estimated_delivery, is_reviewed, viewed_by_provider,
          created_at, updated_at
      )
      VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
      "#,
    )
    .bind(order.id)
    .bind(order.user_profile_id)
    .bind(order.provider_id)
    .bind(order.status.as_str())
    .bind(order.total_amount)
    .bind(&order.delivery_address)
    .bind(&order.delivery_notes)
    .bind(&order.payment_method)
    .bind(order.estimated_delivery)
    .bind(order.is_reviewed)
    .bind(order.viewed_by_provider)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *tx)
    .await
    .map_err(EngineError::storage)?;

    for line in &placed.line_items {
      sqlx::query(
        "INSERT INTO order_line_items (id, order_id, food_item_id, quantity, price) VALUES ($1, $2, $3, $4, $5)",
      )
      .bind(line.id)
      .bind(line.order_id)
      .bind(line.food_item_id)
      .bind(line.quantity)
      .bind(line.price)
      .execute(&mut *tx)
      .await
      .map_err(EngineError::storage)?;
    }

    let entry = &placed.status_log;
    sqlx::query("INSERT INTO order_status_logs (id, order_id, status, notes, created_at) VALUES ($1, $2, $3, $4, $5)")
      .bind(entry.id)
      .bind(entry.order_id)
      .bind(entry.status.as_str())
      .bind(&entry.notes)
      .bind(entry.created_at)
      .execute(&mut *tx)
      .await
      .map_err(EngineError::storage)?;

    tx.commit().await.map_err(EngineError::storage)?;
    debug!(lines = placed.line_items.len(), "Checkout unit committed.");
    Ok(placed)
  }

  #[instrument(name = "pg_store::apply_status_change", skip(self, now, planner))]
  async fn apply_status_change(
    &self,
    order_id: Uuid,
    now: DateTime<Utc>,
    planner: TransitionPlanner,
  ) -> EngineResult<AppliedChange> {
    let mut tx = self.pool.begin().await.map_err(EngineError::storage)?;

    let sql = format!("SELECT {} FROM orders WHERE id = $1 FOR UPDATE", ORDER_COLUMNS);
    let row: Option<OrderRow> = sqlx::query_as(&sql)
      .bind(order_id)
      .fetch_optional(&mut *tx)
      .await
      .map_err(EngineError::storage)?;
    let mut order = row
      .ok_or_else(|| EngineError::not_found("order", order_id))?
      .into_model()?;

    let history_rows: Vec<StatusLogRow> = sqlx::query_as(
      "SELECT id, order_id, status, notes, created_at FROM order_status_logs WHERE order_id = $1 ORDER BY seq DESC",
    )
    .bind(order_id)
    .fetch_all(&mut *tx)
    .await
    .map_err(EngineError::storage)?;
    let history = history_rows
      .into_iter()
      .map(StatusLogRow::into_model)
      .collect::<EngineResult<Vec<_>>>()?;

    let change = planner(&order, &history)?;

    let mut restored = Vec::new();
    if change.restore_inventory {
      let lines: Vec<(Uuid, i32)> =
        sqlx::query_as("SELECT food_item_id, quantity FROM order_line_items WHERE order_id = $1 ORDER BY food_item_id")
          .bind(order_id)
          .fetch_all(&mut *tx)
          .await
          .map_err(EngineError::storage)?;
      for (food_item_id, quantity) in lines {
        restored.push(increment_on(&mut tx, food_item_id, quantity, now).await?);
      }
    }

    sqlx::query(
      "UPDATE orders SET status = $2, updated_at = $3, estimated_delivery = COALESCE($4, estimated_delivery) \
       WHERE id = $1",
    )
    .bind(order_id)
    .bind(change.status.as_str())
    .bind(now)
    .bind(change.estimated_delivery)
    .execute(&mut *tx)
    .await
    .map_err(EngineError::storage)?;

    let entry = StatusLogEntry {
      id: Uuid::new_v4(),
      order_id,
      status: change.status,
      notes: Some(change.notes),
      created_at: now,
    };
    sqlx::query("INSERT INTO order_status_logs (id, order_id, status, notes, created_at) VALUES ($1, $2, $3, $4, $5)")
      .bind(entry.id)
      .bind(entry.order_id)
      .bind(entry.status.as_str())
      .bind(&entry.notes)
      .bind(entry.created_at)
      .execute(&mut *tx)
      .await
      .map_err(EngineError::storage)?;

    tx.commit().await.map_err(EngineError::storage)?;

    let previous_status = order.status;
    order.status = change.status;
    order.updated_at = now;
    if change.estimated_delivery.is_some() {
      order.estimated_delivery = change.estimated_delivery;
    }
    Ok(AppliedChange {
      order,
      previous_status,
      entry,
      restored,
    })
  }

  async fn order(&self, order_id: Uuid) -> EngineResult<Option<Order>> {
    let sql = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
    let row: Option<OrderRow> = sqlx::query_as(&sql)
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(EngineError::storage)?;
    row.map(OrderRow::into_model).transpose()
  }

  async fn line_items(&self, order_id: Uuid) -> EngineResult<Vec<OrderLineItem>> {
    self.line_items_for_orders(&[order_id]).await
  }

  async fn line_items_for_orders(&self, order_ids: &[Uuid]) -> EngineResult<Vec<OrderLineItem>> {
    let rows: Vec<LineItemRow> = sqlx::query_as(
      "SELECT id, order_id, food_item_id, quantity, price FROM order_line_items WHERE order_id = ANY($1)",
    )
    .bind(order_ids)
    .fetch_all(&self.pool)
    .await
    .map_err(EngineError::storage)?;
    Ok(rows.into_iter().map(OrderLineItem::from).collect())
  }

  async fn status_history(&self, order_id: Uuid, limit: Option<usize>) -> EngineResult<Vec<StatusLogEntry>> {
    // LIMIT NULL means no limit.
    let limit = limit.map(|n| i64::try_from(n).unwrap_or(i64::MAX));
    let rows: Vec<StatusLogRow> = sqlx::query_as(
      "SELECT id, order_id, status, notes, created_at FROM order_status_logs \
       WHERE order_id = $1 ORDER BY seq DESC LIMIT $2",
    )
    .bind(order_id)
    .bind(limit)
    .fetch_all(&self.pool)
    .await
    .map_err(EngineError::storage)?;
    rows.into_iter().map(StatusLogRow::into_model).collect()
  }

  async fn orders_for_user(&self, user_profile_id: Uuid) -> EngineResult<Vec<Order>> {
    self.orders_where("user_profile_id", user_profile_id, None).await
  }

  async fn orders_for_provider(&self, provider_id: Uuid, status: Option<OrderStatus>) -> EngineResult<Vec<Order>> {
    self.orders_where("provider_id", provider_id, status).await
  }

  async fn mark_viewed(&self, order_id: Uuid) -> EngineResult<bool> {
    self.set_flag_once("viewed_by_provider", order_id).await
  }

  async fn mark_all_viewed(&self, provider_id: Uuid) -> EngineResult<u64> {
    let result =
      sqlx::query("UPDATE orders SET viewed_by_provider = TRUE WHERE provider_id = $1 AND NOT viewed_by_provider")
        .bind(provider_id)
        .execute(&self.pool)
        .await
        .map_err(EngineError::storage)?;
    Ok(result.rows_affected())
  }

  async fn mark_reviewed(&self, order_id: Uuid) -> EngineResult<bool> {
    self.set_flag_once("is_reviewed", order_id).await
  }
}
