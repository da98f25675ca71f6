//! End-to-end flows through the [`Engine`] facade: catalog to authorization
//! to billing, the way a transport layer would drive it.

use std::sync::Arc;

use chrono::{Duration, Utc};

use simflow_core::money::Money;
use simflow_core::types::{
    AccountInvoiceStatus, CatalogItem, DiscountType, InvoiceStatus, OrderRequest,
    OrderRequestLine, OrderStatus, PaymentMethod, ProductType, Promotion, RetailerAccount,
    RetailerLevel,
};
use simflow_core::{CREDIT_FULL_BPS, CREDIT_WARN_BPS};
use simflow_engine::{CreditThresholdCrossed, Engine, EngineError};
use tokio::sync::mpsc::UnboundedReceiver;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("simflow_engine=debug")
        .with_test_writer()
        .try_init();
}

fn epin(id: &str, price_cents: i64, stock: i64) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        name: format!("ePIN {id}"),
        product_type: ProductType::Epin,
        base_price_cents: price_cents,
        stock_quantity: stock,
        stock_pool_id: None,
    }
}

fn esim(id: &str, price_cents: i64, stock: i64) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        name: format!("eSIM {id}"),
        product_type: ProductType::Esim,
        base_price_cents: price_cents,
        stock_quantity: stock,
        stock_pool_id: None,
    }
}

fn retailer(id: &str, limit: i64, used: i64) -> RetailerAccount {
    RetailerAccount {
        id: id.to_string(),
        level: RetailerLevel::Gold,
        credit_limit_cents: limit,
        used_credit_cents: used,
        invoice_status: AccountInvoiceStatus::None,
    }
}

fn save50() -> Promotion {
    let now = Utc::now();
    Promotion {
        id: "promo-save50".to_string(),
        promo_code: "SAVE50".to_string(),
        discount_type: DiscountType::Percentage,
        discount_value: 50,
        min_order_value_cents: Some(10000),
        usage_limit: Some(100),
        usage_count: 0,
        start_date: now - Duration::days(1),
        end_date: now + Duration::days(30),
    }
}

async fn engine() -> (Engine, UnboundedReceiver<CreditThresholdCrossed>) {
    init_tracing();
    let (engine, events) = Engine::with_log_channel();
    engine.upsert_item(epin("epin-1000", 10_00, 500)).await;
    engine.upsert_item(esim("esim-roam", 25_00, 1)).await;
    engine.upsert_promotion(save50()).await.unwrap();
    (engine, events)
}

#[tokio::test]
async fn credit_order_to_paid_invoice() {
    let (engine, mut events) = engine().await;
    engine
        .provision_retailer(retailer("shop-1", 1_000_00, 0))
        .await
        .unwrap();

    // 95 × 10.00 = 950.00 of a 1000.00 line: crosses the 90% alert
    let order = engine
        .authorize(OrderRequest {
            retailer_id: Some("shop-1".to_string()),
            lines: vec![OrderRequestLine {
                item_id: "epin-1000".to_string(),
                quantity: 5,
            }; 19],
            promo_code: None,
            payment_method: PaymentMethod::CreditLine,
        })
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Completed);
    assert_eq!(order.total_cents, 950_00);
    assert_eq!(
        engine.available_credit("shop-1").await.unwrap(),
        Money::from_cents(50_00)
    );

    let alert = events.try_recv().unwrap();
    assert_eq!(alert.threshold_bps, CREDIT_WARN_BPS);
    assert_eq!(alert.retailer_id, "shop-1");

    // bill the cycle
    let invoice = engine.generate_invoice("shop-1").await.unwrap();
    assert_eq!(invoice.total_amount_cents, 950_00);
    assert!(invoice
        .line_items
        .iter()
        .any(|li| li.order_id.as_deref() == Some(order.id.as_str())));

    engine.dispatch_invoice(&invoice.invoice_number).await.unwrap();
    let paid = engine
        .confirm_invoice_payment(&invoice.invoice_number)
        .await
        .unwrap();
    assert_eq!(paid.status, InvoiceStatus::Paid);

    // the line is whole again
    assert_eq!(
        engine.available_credit("shop-1").await.unwrap(),
        Money::from_cents(1_000_00)
    );
    assert_eq!(
        engine
            .retailer_account("shop-1")
            .await
            .unwrap()
            .invoice_status,
        AccountInvoiceStatus::Paid
    );
}

#[tokio::test]
async fn rejected_credit_order_retains_nothing() {
    let (engine, _events) = engine().await;
    engine
        .provision_retailer(retailer("shop-2", 50_000_00, 49_000_00))
        .await
        .unwrap();

    // 200 × 10.00 = 2000.00 against 1000.00 available
    let err = engine
        .authorize(OrderRequest {
            retailer_id: Some("shop-2".to_string()),
            lines: vec![OrderRequestLine {
                item_id: "epin-1000".to_string(),
                quantity: 5,
            }; 40],
            promo_code: None,
            payment_method: PaymentMethod::CreditLine,
        })
        .await
        .unwrap_err();

    match err {
        EngineError::CreditLimitExceeded {
            available_cents,
            requested_cents,
            ..
        } => {
            assert_eq!(available_cents, 1_000_00);
            assert_eq!(requested_cents, 2_000_00);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // stock back where it started, ledger untouched
    assert_eq!(engine.available_stock("epin-1000").await.unwrap(), 500);
    assert_eq!(
        engine
            .retailer_account("shop-2")
            .await
            .unwrap()
            .used_credit_cents,
        49_000_00
    );
}

#[tokio::test]
async fn percentage_promo_halves_the_total() {
    let (engine, _events) = engine().await;

    // 20 × 10.00 = 200.00, SAVE50 → pay 100.00
    let order = engine
        .authorize(OrderRequest {
            retailer_id: None,
            lines: vec![OrderRequestLine {
                item_id: "epin-1000".to_string(),
                quantity: 5,
            }; 4],
            promo_code: Some("save50".to_string()),
            payment_method: PaymentMethod::ExternalGateway,
        })
        .await
        .unwrap();

    assert_eq!(order.subtotal_cents, 200_00);
    assert_eq!(order.discount_cents, 100_00);
    assert_eq!(order.total_cents, 100_00);
}

#[tokio::test]
async fn invalid_promo_never_blocks_but_preview_explains() {
    let (engine, _events) = engine().await;

    // below the 100.00 minimum: checkout proceeds at full price
    let order = engine
        .authorize(OrderRequest {
            retailer_id: None,
            lines: vec![OrderRequestLine {
                item_id: "epin-1000".to_string(),
                quantity: 2,
            }],
            promo_code: Some("SAVE50".to_string()),
            payment_method: PaymentMethod::ExternalGateway,
        })
        .await
        .unwrap();
    assert_eq!(order.discount_cents, 0);
    assert_eq!(order.total_cents, 20_00);

    // the preview path names the reason
    let err = engine
        .preview_discount("SAVE50", Money::from_cents(20_00))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Promotion(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn last_esim_goes_to_exactly_one_buyer() {
    let (engine, _events) = engine().await;
    let engine = Arc::new(engine);

    let mut handles = Vec::new();
    for _ in 0..2 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .authorize(OrderRequest {
                    retailer_id: None,
                    lines: vec![OrderRequestLine {
                        item_id: "esim-roam".to_string(),
                        quantity: 1,
                    }],
                    promo_code: None,
                    payment_method: PaymentMethod::ExternalGateway,
                })
                .await
        }));
    }

    let mut authorized = 0;
    let mut out_of_stock = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(order) => {
                assert_eq!(order.status, OrderStatus::Authorized);
                authorized += 1;
            }
            Err(EngineError::OutOfStock { .. }) => out_of_stock += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(authorized, 1);
    assert_eq!(out_of_stock, 1);
    assert_eq!(engine.available_stock("esim-roam").await.unwrap(), 0);
}

#[tokio::test]
async fn gateway_abort_puts_the_esim_back_on_sale() {
    let (engine, _events) = engine().await;

    let order = engine
        .authorize(OrderRequest {
            retailer_id: None,
            lines: vec![OrderRequestLine {
                item_id: "esim-roam".to_string(),
                quantity: 1,
            }],
            promo_code: None,
            payment_method: PaymentMethod::ExternalGateway,
        })
        .await
        .unwrap();
    assert_eq!(engine.available_stock("esim-roam").await.unwrap(), 0);

    let aborted = engine.abort_order(&order.id).await.unwrap();
    assert_eq!(aborted.status, OrderStatus::Rejected);
    assert_eq!(engine.available_stock("esim-roam").await.unwrap(), 1);

    // next buyer gets it
    assert!(engine
        .authorize(OrderRequest {
            retailer_id: None,
            lines: vec![OrderRequestLine {
                item_id: "esim-roam".to_string(),
                quantity: 1,
            }],
            promo_code: None,
            payment_method: PaymentMethod::ExternalGateway,
        })
        .await
        .is_ok());
}

#[tokio::test]
async fn full_usage_emits_both_thresholds() {
    let (engine, mut events) = engine().await;
    engine
        .provision_retailer(retailer("shop-3", 100_00, 0))
        .await
        .unwrap();

    // one order consuming the entire line crosses 90% and 100% at once
    engine
        .authorize(OrderRequest {
            retailer_id: Some("shop-3".to_string()),
            lines: vec![OrderRequestLine {
                item_id: "epin-1000".to_string(),
                quantity: 5,
            }; 2],
            promo_code: None,
            payment_method: PaymentMethod::CreditLine,
        })
        .await
        .unwrap();

    let first = events.try_recv().unwrap();
    let second = events.try_recv().unwrap();
    assert_eq!(first.threshold_bps, CREDIT_WARN_BPS);
    assert_eq!(second.threshold_bps, CREDIT_FULL_BPS);
    assert_eq!(second.usage_bps, 10000);
}
