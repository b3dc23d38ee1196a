use chrono::{DateTime, Utc};
use rental_booking_ddd::adapters::postgres::{
    PostgresBookingReadModel, PostgresCustomerDirectory, PostgresEventStore,
    PostgresInvoiceRegistry, PostgresProductCatalog, rebuild_read_model,
};
use rental_booking_ddd::application::booking::{
    BookingApplicationError, BookingLocks, ServiceDependencies, compute_availability,
    confirm_booking, create_booking, detect_overdue_bookings, get_booking, record_payment,
    revise_booking,
};
use rental_booking_ddd::domain::{
    BookingStatus, CustomerId, DiscountType, PaymentMethod, PaymentStatus, ProductId,
    RecordPayment, RentalPeriod, ReturnStatus, ReviseBooking, StaffId,
};
use rental_booking_ddd::ports::BookingReadModel;
use rust_decimal::Decimal;
use serial_test::serial;
use sqlx::PgPool;
use std::sync::Arc;

mod common;

use common::{date, line};

// ============================================================================
// PostgreSQLテスト用のヘルパー関数
// ============================================================================

/// テストの独立性を保つため、各テスト前にすべてのデータを削除します。
async fn cleanup_database(pool: &PgPool) {
    sqlx::query("TRUNCATE TABLE bookings_view, events, invoices, products, customers CASCADE")
        .execute(pool)
        .await
        .expect("Failed to truncate tables");
}

fn postgres_deps(pool: &PgPool) -> ServiceDependencies {
    ServiceDependencies {
        event_store: Arc::new(PostgresEventStore::new(pool.clone())),
        booking_read_model: Arc::new(PostgresBookingReadModel::new(pool.clone())),
        product_catalog: Arc::new(PostgresProductCatalog::new(pool.clone())),
        customer_directory: Arc::new(PostgresCustomerDirectory::new(pool.clone())),
        invoice_registry: Arc::new(PostgresInvoiceRegistry::new(pool.clone())),
        locks: Arc::new(BookingLocks::new()),
    }
}

async fn insert_customer(pool: &PgPool) -> CustomerId {
    let customer_id = CustomerId::new();
    sqlx::query("INSERT INTO customers (customer_id, full_name) VALUES ($1, $2)")
        .bind(customer_id.value())
        .bind("Asha Rao")
        .execute(pool)
        .await
        .expect("Failed to insert customer");
    customer_id
}

async fn insert_product(
    pool: &PgPool,
    name: &str,
    stock: i32,
    price: i64,
    deposit: i64,
) -> ProductId {
    let product_id = ProductId::new();
    sqlx::query(
        r#"
        INSERT INTO products (product_id, display_name, sku, total_stock,
                              base_rental_price, base_security_deposit)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(product_id.value())
    .bind(name)
    .bind(format!("SKU-{}", name.to_uppercase()))
    .bind(stock)
    .bind(Decimal::from(price))
    .bind(Decimal::from(deposit))
    .execute(pool)
    .await
    .expect("Failed to insert product");
    product_id
}

fn create_command(
    customer_id: CustomerId,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    product_id: ProductId,
    quantity: u32,
) -> rental_booking_ddd::domain::CreateBooking {
    rental_booking_ddd::domain::CreateBooking {
        customer_id,
        pickup_date: from,
        expected_return_date: to,
        items: vec![line(product_id, quantity)],
        discount_type: DiscountType::None,
        discount_value: Decimal::ZERO,
        tax_rate: None,
        security_deposit_override: None,
        initial_payment: Decimal::ZERO,
        staff_id: StaffId::new(),
    }
}

// ============================================================================
// PostgreSQLテスト
// ============================================================================

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_postgres_booking_lifecycle() {
    // Arrange
    let pool = common::create_test_pool().await;
    cleanup_database(&pool).await;
    let deps = postgres_deps(&pool);
    let customer_id = insert_customer(&pool).await;
    let camera = insert_product(&pool, "camera", 3, 500, 1000).await;

    // Act: 作成 → 支払い → 確定
    let booking = create_booking(
        &deps,
        create_command(customer_id, date(2026, 1, 1), date(2026, 1, 3), camera, 2),
    )
    .await
    .unwrap();
    record_payment(
        &deps,
        RecordPayment {
            booking_id: booking.booking_id,
            amount: Decimal::from(1000),
            method: PaymentMethod::Upi,
        },
    )
    .await
    .unwrap();
    confirm_booking(&deps, booking.booking_id).await.unwrap();

    // Assert: Read Modelから取得した金額は作成時の計算結果と一致する
    let stored = get_booking(&deps, booking.booking_id).await.unwrap();
    assert_eq!(stored.booking_status, BookingStatus::Confirmed);
    assert_eq!(stored.totals.total_amount, Decimal::from(4360));
    assert_eq!(stored.totals.balance_due, Decimal::from(3360));
    assert_eq!(stored.totals.payment_status, PaymentStatus::PartiallyPaid);
    assert_eq!(stored.items, booking.items);
    assert_eq!(stored.payments.len(), 1);
    assert_eq!(stored.payments[0].method, PaymentMethod::Upi);

    // 重なる期間の空き数はUTCの暦日で判定される
    let period = RentalPeriod::new(date(2026, 1, 3), date(2026, 1, 6)).unwrap();
    let availability = compute_availability(&deps, period, None).await.unwrap();
    assert_eq!(availability[0].available, 1);

    // 延滞検出
    let detected = detect_overdue_bookings(&deps, date(2026, 1, 5)).await.unwrap();
    assert_eq!(detected, 1);
    let overdue = get_booking(&deps, booking.booking_id).await.unwrap();
    assert_eq!(overdue.return_status, ReturnStatus::Overdue);
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_postgres_invoice_blocks_revision() {
    let pool = common::create_test_pool().await;
    cleanup_database(&pool).await;
    let deps = postgres_deps(&pool);
    let customer_id = insert_customer(&pool).await;
    let camera = insert_product(&pool, "camera", 3, 500, 1000).await;

    let booking = create_booking(
        &deps,
        create_command(customer_id, date(2026, 1, 1), date(2026, 1, 3), camera, 1),
    )
    .await
    .unwrap();
    sqlx::query("INSERT INTO invoices (invoice_id, booking_id) VALUES ($1, $2)")
        .bind(uuid::Uuid::new_v4())
        .bind(booking.booking_id.value())
        .execute(&pool)
        .await
        .unwrap();

    let result = revise_booking(
        &deps,
        ReviseBooking {
            booking_id: booking.booking_id,
            pickup_date: date(2026, 1, 1),
            expected_return_date: date(2026, 1, 4),
            items: vec![line(camera, 1)],
            discount_type: DiscountType::None,
            discount_value: Decimal::ZERO,
            tax_rate: None,
            security_deposit_override: None,
        },
    )
    .await;

    assert!(matches!(result, Err(BookingApplicationError::InvoiceAlreadyIssued)));
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_postgres_booking_codes_and_rebuild() {
    let pool = common::create_test_pool().await;
    cleanup_database(&pool).await;
    let deps = postgres_deps(&pool);
    let customer_id = insert_customer(&pool).await;
    let camera = insert_product(&pool, "camera", 5, 500, 1000).await;

    let first = create_booking(
        &deps,
        create_command(customer_id, date(2026, 2, 1), date(2026, 2, 3), camera, 1),
    )
    .await
    .unwrap();
    let second = create_booking(
        &deps,
        create_command(customer_id, date(2026, 2, 1), date(2026, 2, 3), camera, 1),
    )
    .await
    .unwrap();
    assert_eq!(first.booking_code.sequence(), Some(1));
    assert_eq!(second.booking_code.sequence(), Some(2));

    // Read Modelを消してイベントログから作り直す
    sqlx::query("TRUNCATE TABLE bookings_view")
        .execute(&pool)
        .await
        .unwrap();
    let rebuilt = rebuild_read_model(
        deps.event_store.as_ref(),
        deps.booking_read_model.as_ref(),
    )
    .await
    .unwrap();

    assert_eq!(rebuilt, 2);
    let restored = deps
        .booking_read_model
        .get_by_id(second.booking_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(restored.booking_code, second.booking_code);
    assert_eq!(restored.totals, second.totals);
}
