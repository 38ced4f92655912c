//! Receiving stock and re-averaging cost.

mod common;

use common::{order, product, stock_of, store};
use storefront_core::{Money, OrderStatus, StockCommitPoint, UnitCost};
use storefront_db::{ErrorKind, Storefront, StockInboundRequest};

fn batch(product_id: &str, qty: i64, cost: i64, supplier: Option<&str>) -> StockInboundRequest {
    StockInboundRequest {
        product_id: product_id.to_string(),
        quantity_added: qty,
        cost_price_at_time: Money::from_units(cost),
        supplier: supplier.map(str::to_string),
        notes: None,
    }
}

async fn cost_of(sf: &Storefront, product_id: &str) -> UnitCost {
    sf.get_product(product_id).await.unwrap().cost_price
}

fn units(v: i64) -> UnitCost {
    UnitCost::from_units(v)
}

fn decimal(s: &str) -> UnitCost {
    s.parse().unwrap()
}

#[tokio::test]
async fn test_weighted_average_over_several_batches() {
    let sf = store(StockCommitPoint::OnPlacement).await;
    // product() seeds cost at half the price: 10 @ 100
    let beans = product(&sf, "Arabica 250g", 200, 10).await;
    assert_eq!(cost_of(&sf, &beans.id).await, units(100));

    let outcome = sf
        .record_stock_inbound(&batch(&beans.id, 10, 200, Some("Dalat Farms")))
        .await
        .unwrap();
    assert_eq!(outcome.old_cost, units(100));
    assert_eq!(outcome.new_cost, units(150));
    assert_eq!(stock_of(&sf, &beans.id).await, 20);

    // 20 @ 150 + 5 @ 100 = 3500 / 25 = 140
    sf.record_stock_inbound(&batch(&beans.id, 5, 100, None))
        .await
        .unwrap();
    assert_eq!(cost_of(&sf, &beans.id).await, units(140));
    assert_eq!(stock_of(&sf, &beans.id).await, 25);
}

#[tokio::test]
async fn test_average_keeps_fractions_across_batches() {
    let sf = store(StockCommitPoint::OnPlacement).await;
    // 1 @ 1 to start
    let pin = product(&sf, "Enamel Pin", 2, 1).await;

    let outcome = sf
        .record_stock_inbound(&batch(&pin.id, 1, 2, None))
        .await
        .unwrap();
    assert_eq!(outcome.new_cost, decimal("1.5"));
    assert_eq!(cost_of(&sf, &pin.id).await, decimal("1.5"));

    // 2 @ 1.5 + 1 @ 1 = 4 / 3
    sf.record_stock_inbound(&batch(&pin.id, 1, 1, None))
        .await
        .unwrap();
    let stored = sf.get_product(&pin.id).await.unwrap();
    assert_eq!(stored.cost_price, decimal("1.3333"));
    assert_eq!(stored.stock_value(), Some(Money::from_units(4)));
}

#[tokio::test]
async fn test_sold_out_product_takes_new_batch_cost() {
    let sf = store(StockCommitPoint::OnPlacement).await;
    let beans = product(&sf, "Arabica 250g", 1_000, 2).await;

    sf.place_order(&order(&[(&beans.id, 2)])).await.unwrap();
    assert_eq!(stock_of(&sf, &beans.id).await, 0);

    sf.record_stock_inbound(&batch(&beans.id, 4, 730, None))
        .await
        .unwrap();
    assert_eq!(cost_of(&sf, &beans.id).await, units(730));
    assert_eq!(stock_of(&sf, &beans.id).await, 4);
}

#[tokio::test]
async fn test_sales_and_cancellations_do_not_touch_cost() {
    let sf = store(StockCommitPoint::OnPlacement).await;
    let beans = product(&sf, "Arabica 250g", 1_000, 10).await;

    let receipt = sf.place_order(&order(&[(&beans.id, 3)])).await.unwrap();
    sf.transition_order_status(&receipt.order_id, OrderStatus::Pending, OrderStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(cost_of(&sf, &beans.id).await, units(500));
}

#[tokio::test]
async fn test_inactive_product_can_receive_stock() {
    let sf = store(StockCommitPoint::OnPlacement).await;
    let beans = product(&sf, "Arabica 250g", 1_000, 0).await;
    sf.set_product_active(&beans.id, false).await.unwrap();

    let outcome = sf
        .record_stock_inbound(&batch(&beans.id, 6, 400, None))
        .await
        .unwrap();
    assert_eq!(outcome.new_stock, 6);
}

#[tokio::test]
async fn test_rejected_batch_leaves_no_trace() {
    let sf = store(StockCommitPoint::OnPlacement).await;
    let beans = product(&sf, "Arabica 250g", 1_000, 5).await;

    for bad in [
        batch(&beans.id, 0, 400, None),
        batch(&beans.id, -3, 400, None),
        batch(&beans.id, 3, -1, None),
        batch("not-a-uuid", 3, 400, None),
    ] {
        let err = sf.record_stock_inbound(&bad).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    let history = sf.stock_inbound_history(Some(&beans.id), 10).await.unwrap();
    assert!(history.records.is_empty());
    assert_eq!(stock_of(&sf, &beans.id).await, 5);
    assert_eq!(cost_of(&sf, &beans.id).await, units(500));
}

#[tokio::test]
async fn test_history_is_newest_first_and_filtered() {
    let sf = store(StockCommitPoint::OnPlacement).await;
    let beans = product(&sf, "Arabica 250g", 1_000, 0).await;
    let tea = product(&sf, "Lotus Tea", 600, 0).await;

    sf.record_stock_inbound(&batch(&beans.id, 10, 400, Some("Dalat Farms")))
        .await
        .unwrap();
    sf.record_stock_inbound(&batch(&tea.id, 3, 250, None))
        .await
        .unwrap();
    sf.record_stock_inbound(&batch(&beans.id, 2, 450, Some("Highland Co-op")))
        .await
        .unwrap();

    let all = sf.stock_inbound_history(None, 10).await.unwrap();
    assert_eq!(all.stats.total_records, 3);
    assert_eq!(all.stats.total_quantity, 15);

    let beans_only = sf.stock_inbound_history(Some(&beans.id), 10).await.unwrap();
    assert_eq!(beans_only.records.len(), 2);
    assert_eq!(beans_only.records[0].quantity_added, 2);
    assert_eq!(beans_only.records[1].supplier.as_deref(), Some("Dalat Farms"));
    assert_eq!(beans_only.stats.total_value, Money::from_units(4_900));
}
