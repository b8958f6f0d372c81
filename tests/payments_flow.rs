mod common;

use axum_marketplace_api::{
    access::Role,
    dto::{
        orders::{CreateOrderRequest, OrderItemInput},
        payments::PayOrderRequest,
    },
    entity::payments::{Column as PaymentCol, Entity as Payments},
    error::AppError,
    middleware::auth::AuthUser,
    services::{order_service, payment_service},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

// Paying an order is idempotent on the transaction id, and cancelling a
// paid order initiates a refund.
#[tokio::test]
async fn pay_duplicate_and_refund_flow() -> anyhow::Result<()> {
    let Some(state) = common::try_setup().await? else {
        return Ok(());
    };

    let client_id = common::create_user(&state, "client", "client@example.com").await?;
    let merchant_id = common::create_user(&state, "merchant", "merchant@example.com").await?;
    let product = common::create_product(&state, merchant_id, "Test Widget", 1500, 4).await?;

    let client = AuthUser {
        user_id: client_id,
        role: Role::Client,
    };

    let resp = order_service::place_order(
        &state,
        &client,
        CreateOrderRequest {
            merchant_id,
            items: vec![OrderItemInput {
                product_id: product.id,
                quantity: 2,
                price: None,
            }],
            promotion_code: None,
            address: "8 avenue Foch, Nantes".into(),
            note: None,
            total_price: None,
        },
    )
    .await?;
    let order = resp.data.unwrap().order;

    let payment = payment_service::pay_order(
        &state,
        &client,
        PayOrderRequest {
            order_id: order.id,
            method: "card".into(),
            transaction_id: "txn-001".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(payment.amount, order.total);
    assert_eq!(payment.status, "paid");

    // Paying the same order again fails.
    let err = payment_service::pay_order(
        &state,
        &client,
        PayOrderRequest {
            order_id: order.id,
            method: "card".into(),
            transaction_id: "txn-002".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    // A second order cannot reuse the transaction id.
    let resp = order_service::place_order(
        &state,
        &client,
        CreateOrderRequest {
            merchant_id,
            items: vec![OrderItemInput {
                product_id: product.id,
                quantity: 1,
                price: None,
            }],
            promotion_code: None,
            address: "8 avenue Foch, Nantes".into(),
            note: None,
            total_price: None,
        },
    )
    .await?;
    let second_order = resp.data.unwrap().order;
    let err = payment_service::pay_order(
        &state,
        &client,
        PayOrderRequest {
            order_id: second_order.id,
            method: "card".into(),
            transaction_id: "txn-001".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");

    // Cancelling the paid order flips its payment to refund_pending.
    order_service::cancel_order(&state, &client, order.id).await?;
    let refunding = Payments::find()
        .filter(PaymentCol::OrderId.eq(order.id))
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(refunding.status, "refund_pending");

    Ok(())
}
