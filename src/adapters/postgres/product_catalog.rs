use crate::domain::{Product, ProductId};
use crate::ports::product_catalog::{ProductCatalog as ProductCatalogTrait, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

/// PostgreSQLの行データをProductに変換する
///
/// total_stockはINTEGERで保存されているため、負の値はエラーとする。
fn map_row_to_product(row: &PgRow) -> Result<Product> {
    let total_stock_i32: i32 = row.get("total_stock");
    let total_stock: u32 = total_stock_i32.try_into().map_err(|_| {
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("total_stock out of range: {}", total_stock_i32),
        )) as Box<dyn std::error::Error + Send + Sync>
    })?;

    Ok(Product {
        product_id: ProductId::from_uuid(row.get("product_id")),
        display_name: row.get("display_name"),
        sku: row.get("sku"),
        total_stock,
        base_rental_price: row.get("base_rental_price"),
        base_security_deposit: row.get("base_security_deposit"),
    })
}

/// ProductCatalogのPostgreSQL実装
///
/// 在庫管理コンテキストが所有するproductsテーブルを読み取り専用で参照する。
pub struct ProductCatalog {
    pool: PgPool,
}

impl ProductCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductCatalogTrait for ProductCatalog {
    async fn find_by_ids(&self, product_ids: &[ProductId]) -> Result<Vec<Product>> {
        let ids: Vec<Uuid> = product_ids.iter().map(ProductId::value).collect();
        let rows = sqlx::query(
            r#"
            SELECT product_id, display_name, sku, total_stock,
                   base_rental_price, base_security_deposit
            FROM products
            WHERE product_id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_product).collect()
    }

    /// レンタル対象（is_rentable）の商品を名前順に返す
    async fn list_rentable(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, display_name, sku, total_stock,
                   base_rental_price, base_security_deposit
            FROM products
            WHERE is_rentable
            ORDER BY display_name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_product).collect()
    }
}
