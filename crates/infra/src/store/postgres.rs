//! Postgres-backed catalog, order ledger and user directory.
//!
//! The stock decrement is one conditional `UPDATE … WHERE stock >= $2`, so
//! concurrent placements are serialised by the row lock and stock can never
//! go negative. Edits that need domain rules (`apply_patch`) run inside a
//! transaction holding `SELECT … FOR UPDATE`.
//!
//! ## Error Mapping
//!
//! | SQLx error | PostgreSQL code | StoreError |
//! |------------|-----------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (check violation) | `23514` | `Backend` |
//! | RowNotFound | n/a | `NotFound` (mapped at call site) |
//! | anything else | any | `Backend` |

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use stockline_catalog::{Product, ProductFilter, ProductPatch};
use stockline_core::{Money, OrderId, Page, PageRequest, ProductId, UserId};
use stockline_orders::{Order, OrderFilter, OrderPatch, OrderStatus, TransitionPolicy};
use stockline_users::{Address, User};

use super::StoreError;
use super::catalog::CatalogStore;
use super::ledger::OrderLedger;
use super::users::UserDirectory;

/// Tables used by the stores. `seq` carries insertion order.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS products (
    seq        BIGSERIAL,
    id         TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    price      BIGINT NOT NULL CHECK (price >= 0),
    stock      BIGINT NOT NULL CHECK (stock >= 0)
);

CREATE TABLE IF NOT EXISTS orders (
    seq           BIGSERIAL,
    order_id      TEXT PRIMARY KEY,
    user_id       TEXT NOT NULL,
    product_id    TEXT NOT NULL,
    quantity      BIGINT NOT NULL CHECK (quantity > 0),
    total_amount  BIGINT NOT NULL CHECK (total_amount >= 0),
    status        TEXT NOT NULL,
    placed_at     TIMESTAMPTZ NOT NULL,
    delivery_date DATE
);

CREATE INDEX IF NOT EXISTS orders_status_idx ON orders (status, seq);

CREATE TABLE IF NOT EXISTS users (
    seq     BIGSERIAL,
    id      TEXT PRIMARY KEY,
    email   TEXT NOT NULL,
    country TEXT
);
"#;

/// Create the tables if they are missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct PostgresCatalogStore {
    pool: PgPool,
}

impl PostgresCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, Clone)]
pub struct PostgresOrderLedger {
    pool: PgPool,
}

impl PostgresOrderLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Read-only view of the `users` table.
#[derive(Debug, Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    #[instrument(skip(self), err)]
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query("SELECT id, email, country FROM users ORDER BY seq")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;
        rows.iter().map(user_from_row).collect()
    }
}

const PRODUCT_COLUMNS: &str = "id, name, price, stock";
const ORDER_COLUMNS: &str =
    "order_id, user_id, product_id, quantity, total_amount, status, placed_at, delivery_date";

#[async_trait]
impl CatalogStore for PostgresCatalogStore {
    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn get_product(&self, id: &ProductId) -> Result<Product, StoreError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?
            .ok_or_else(|| StoreError::not_found("product", id))?;
        product_from_row(&row)
    }

    #[instrument(skip(self, filter), err)]
    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Page<Product>, StoreError> {
        const WHERE: &str = r#"
            WHERE ($1::text IS NULL OR strpos(lower(name), lower($1)) > 0)
              AND ($2::bigint IS NULL OR price >= $2)
              AND ($3::bigint IS NULL OR price <= $3)
              AND ($4::bigint IS NULL OR stock >= $4)
              AND ($5::bigint IS NULL OR stock <= $5)
        "#;
        let search = non_blank(filter.search.as_deref());
        let min_price = filter.min_price.map(money_to_db).transpose()?;
        let max_price = filter.max_price.map(money_to_db).transpose()?;
        let min_stock = filter.min_stock.map(i64::from);
        let max_stock = filter.max_stock.map(i64::from);

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM products {WHERE}"))
            .bind(search)
            .bind(min_price)
            .bind(max_price)
            .bind(min_stock)
            .bind(max_stock)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_products", e))?;

        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products {WHERE} ORDER BY seq LIMIT $6 OFFSET $7"
        ))
        .bind(search)
        .bind(min_price)
        .bind(max_price)
        .bind(min_stock)
        .bind(max_stock)
        .bind(i64::from(page.page_size))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;

        let items = rows.iter().map(product_from_row).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total.max(0) as u64, page))
    }

    #[instrument(skip(self), err)]
    async fn list_all_products(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY seq"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_all_products", e))?;
        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self, product), fields(product_id = %product.id), err)]
    async fn create_product(&self, product: Product) -> Result<Product, StoreError> {
        sqlx::query("INSERT INTO products (id, name, price, stock) VALUES ($1, $2, $3, $4)")
            .bind(product.id.as_str())
            .bind(&product.name)
            .bind(money_to_db(product.price)?)
            .bind(i64::from(product.stock))
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_product", e))?;
        Ok(product)
    }

    #[instrument(skip(self, patch), fields(product_id = %id), err)]
    async fn update_product(
        &self,
        id: &ProductId,
        patch: &ProductPatch,
    ) -> Result<Product, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("lock_product", e))?
        .ok_or_else(|| StoreError::not_found("product", id))?;

        let mut product = product_from_row(&row)?;
        product.apply_patch(patch)?;

        sqlx::query("UPDATE products SET name = $2, price = $3, stock = $4 WHERE id = $1")
            .bind(id.as_str())
            .bind(&product.name)
            .bind(money_to_db(product.price)?)
            .bind(i64::from(product.stock))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_product", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn decrement_stock_if_sufficient(
        &self,
        id: &ProductId,
        quantity: u32,
    ) -> Result<Product, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_str())
        .bind(i64::from(quantity))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("decrement_stock", e))?;

        match row {
            Some(row) => product_from_row(&row),
            // Either the product is gone or the condition failed; tell them apart.
            None => {
                let current = self.get_product(id).await?;
                Err(StoreError::InsufficientStock {
                    available: current.stock,
                    requested: quantity,
                })
            }
        }
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn restock(&self, id: &ProductId, quantity: u32) -> Result<Product, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE products SET stock = stock + $2 WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_str())
        .bind(i64::from(quantity))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("restock", e))?
        .ok_or_else(|| StoreError::not_found("product", id))?;
        product_from_row(&row)
    }
}

#[async_trait]
impl OrderLedger for PostgresOrderLedger {
    #[instrument(skip(self, order), fields(order_id = %order.order_id), err)]
    async fn create_order(&self, order: Order) -> Result<Order, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO orders (order_id, user_id, product_id, quantity, total_amount, status, placed_at, delivery_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (order_id) DO NOTHING
            "#,
        )
        .bind(order.order_id.as_str())
        .bind(order.user_id.as_str())
        .bind(order.product_id.as_str())
        .bind(i64::from(order.quantity))
        .bind(money_to_db(order.total_amount)?)
        .bind(order.status.as_str())
        .bind(order.date)
        .bind(order.delivery_date)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_order", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!(
                "order {} already exists",
                order.order_id
            )));
        }
        Ok(order)
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn get_order(&self, id: &OrderId) -> Result<Order, StoreError> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_order", e))?
            .ok_or_else(|| StoreError::not_found("order", id))?;
        order_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn list_orders_full(&self) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY seq"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_orders_full", e))?;
        rows.iter().map(order_from_row).collect()
    }

    #[instrument(skip(self, filter), err)]
    async fn query_orders(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> Result<Page<Order>, StoreError> {
        filter.validate()?;

        const WHERE: &str = r#"
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR strpos(lower(order_id), lower($2)) > 0)
              AND ($3::bigint IS NULL OR total_amount >= $3)
              AND ($4::bigint IS NULL OR total_amount <= $4)
              AND ($5::date IS NULL OR (placed_at AT TIME ZONE 'UTC')::date >= $5)
              AND ($6::date IS NULL OR (placed_at AT TIME ZONE 'UTC')::date <= $6)
        "#;
        let status = filter.status.map(OrderStatus::as_str);
        let search = non_blank(filter.search.as_deref());
        let min_amount = filter.min_amount.map(money_to_db).transpose()?;
        let max_amount = filter.max_amount.map(money_to_db).transpose()?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM orders {WHERE}"))
            .bind(status)
            .bind(search)
            .bind(min_amount)
            .bind(max_amount)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_orders", e))?;

        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders {WHERE} ORDER BY seq LIMIT $7 OFFSET $8"
        ))
        .bind(status)
        .bind(search)
        .bind(min_amount)
        .bind(max_amount)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(i64::from(page.page_size))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("query_orders", e))?;

        let items = rows.iter().map(order_from_row).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total.max(0) as u64, page))
    }

    #[instrument(skip(self), err)]
    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE status = $1 ORDER BY seq"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_by_status", e))?;
        rows.iter().map(order_from_row).collect()
    }

    #[instrument(skip(self, patch), fields(order_id = %id), err)]
    async fn update_order(
        &self,
        id: &OrderId,
        patch: &OrderPatch,
        policy: TransitionPolicy,
    ) -> Result<Order, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1 FOR UPDATE"
        ))
        .bind(id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("lock_order", e))?
        .ok_or_else(|| StoreError::not_found("order", id))?;

        let mut order = order_from_row(&row)?;
        order.apply_patch(patch, policy)?;

        sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, quantity = $3, total_amount = $4, delivery_date = $5
            WHERE order_id = $1
            "#,
        )
        .bind(id.as_str())
        .bind(order.status.as_str())
        .bind(i64::from(order.quantity))
        .bind(money_to_db(order.total_amount)?)
        .bind(order.delivery_date)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_order", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(order)
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn money_to_db(money: Money) -> Result<i64, StoreError> {
    i64::try_from(money.minor())
        .map_err(|_| StoreError::Backend(format!("amount {money} exceeds column range")))
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| StoreError::Backend(format!("failed to decode column {name}: {e}")))
}

fn unsigned<T: TryFrom<i64>>(value: i64, name: &str) -> Result<T, StoreError> {
    T::try_from(value).map_err(|_| StoreError::Backend(format!("column {name} out of range: {value}")))
}

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    Ok(Product {
        id: ProductId::from_raw(column::<String>(row, "id")?),
        name: column(row, "name")?,
        price: Money::from_minor(unsigned(column::<i64>(row, "price")?, "price")?),
        stock: unsigned(column::<i64>(row, "stock")?, "stock")?,
    })
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    Ok(User {
        id: UserId::from_raw(column::<String>(row, "id")?),
        email: column(row, "email")?,
        address: Address {
            country: column(row, "country")?,
        },
    })
}

fn order_from_row(row: &PgRow) -> Result<Order, StoreError> {
    let status: String = column(row, "status")?;
    let status = status
        .parse::<OrderStatus>()
        .map_err(|e| StoreError::Backend(format!("stored order has invalid status: {e}")))?;

    Ok(Order {
        order_id: OrderId::from_raw(column::<String>(row, "order_id")?),
        user_id: UserId::from_raw(column::<String>(row, "user_id")?),
        product_id: ProductId::from_raw(column::<String>(row, "product_id")?),
        quantity: unsigned(column::<i64>(row, "quantity")?, "quantity")?,
        total_amount: Money::from_minor(unsigned(column::<i64>(row, "total_amount")?, "total_amount")?),
        status,
        date: column::<DateTime<Utc>>(row, "placed_at")?,
        delivery_date: column::<Option<NaiveDate>>(row, "delivery_date")?,
    })
}

/// Map SQLx errors to `StoreError` with operation context.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {operation}: {}", db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}
