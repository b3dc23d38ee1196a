use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{PricingInputError, ProductId, Quantity};

/// 商品（在庫管理コンテキストの参照モデル）
///
/// 予約コンテキストは在庫数と基本料金のみを参照し、商品を所有しない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: ProductId,
    pub display_name: String,
    pub sku: Option<String>,
    pub total_stock: u32,
    /// 1日あたりの基本レンタル料金（明細で省略された場合の既定値）
    pub base_rental_price: Decimal,
    /// 1個あたりの基本保証金（明細で省略された場合の既定値）
    pub base_security_deposit: Decimal,
}

/// 明細の入力（正規化前）
///
/// 料金・保証金を省略した場合は商品の基本値が使われる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemRequest {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub rental_price_per_unit_per_day: Option<Decimal>,
    pub security_deposit_per_unit: Option<Decimal>,
}

impl LineItemRequest {
    /// 明示された金額が負でないことを確認する
    pub fn validate(&self) -> Result<(), PricingInputError> {
        if self
            .rental_price_per_unit_per_day
            .is_some_and(|price| price.is_sign_negative())
        {
            return Err(PricingInputError::NegativeAmount("Rental price"));
        }
        if self
            .security_deposit_per_unit
            .is_some_and(|deposit| deposit.is_sign_negative())
        {
            return Err(PricingInputError::NegativeAmount("Security deposit"));
        }
        Ok(())
    }
}

/// 予約明細
///
/// 商品名とSKUは予約時点のスナップショット。
/// 小計は保持せず、レンタル日数から都度導出する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingLineItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: Option<String>,
    pub quantity: Quantity,
    pub rental_price_per_unit_per_day: Decimal,
    pub security_deposit_per_unit: Decimal,
}

impl BookingLineItem {
    /// 商品の基本値で省略項目を補って明細を確定する
    pub fn from_request(request: &LineItemRequest, product: &Product) -> Self {
        Self {
            product_id: request.product_id,
            product_name: product.display_name.clone(),
            sku: product.sku.clone(),
            quantity: request.quantity,
            rental_price_per_unit_per_day: request
                .rental_price_per_unit_per_day
                .unwrap_or(product.base_rental_price),
            security_deposit_per_unit: request
                .security_deposit_per_unit
                .unwrap_or(product.base_security_deposit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product {
            product_id: ProductId::new(),
            display_name: "Navy Sherwani".to_string(),
            sku: Some("SH-001".to_string()),
            total_stock: 3,
            base_rental_price: Decimal::from(800),
            base_security_deposit: Decimal::from(1500),
        }
    }

    #[test]
    fn test_from_request_uses_product_defaults() {
        let product = product();
        let request = LineItemRequest {
            product_id: product.product_id,
            quantity: Quantity::try_from(2).unwrap(),
            rental_price_per_unit_per_day: None,
            security_deposit_per_unit: None,
        };

        let item = BookingLineItem::from_request(&request, &product);

        assert_eq!(item.rental_price_per_unit_per_day, Decimal::from(800));
        assert_eq!(item.security_deposit_per_unit, Decimal::from(1500));
        assert_eq!(item.product_name, "Navy Sherwani");
        assert_eq!(item.sku.as_deref(), Some("SH-001"));
        assert_eq!(item.quantity.value(), 2);
    }

    #[test]
    fn test_validate_rejects_negative_price() {
        let request = LineItemRequest {
            product_id: ProductId::new(),
            quantity: Quantity::try_from(1).unwrap(),
            rental_price_per_unit_per_day: Some(Decimal::from(-10)),
            security_deposit_per_unit: None,
        };

        assert_eq!(
            request.validate(),
            Err(PricingInputError::NegativeAmount("Rental price"))
        );
    }

    #[test]
    fn test_from_request_keeps_explicit_values() {
        let product = product();
        let request = LineItemRequest {
            product_id: product.product_id,
            quantity: Quantity::try_from(1).unwrap(),
            rental_price_per_unit_per_day: Some(Decimal::from(650)),
            security_deposit_per_unit: Some(Decimal::ZERO),
        };

        let item = BookingLineItem::from_request(&request, &product);

        assert_eq!(item.rental_price_per_unit_per_day, Decimal::from(650));
        assert_eq!(item.security_deposit_per_unit, Decimal::ZERO);
    }
}
