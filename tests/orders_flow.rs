mod common;

use axum_marketplace_api::{
    access::Role,
    dto::orders::{CreateOrderRequest, OrderItemInput, UpdateOrderStatusRequest},
    entity::{
        products::Entity as Products,
        promotion_redemptions::{Column as RedemptionCol, Entity as PromotionRedemptions},
        promotions::{ActiveModel as PromotionActive, Entity as Promotions},
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::order_service,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

// Integration flow: client places a discounted order, stock decrements,
// cancellation restores it and terminal orders stay terminal.
#[tokio::test]
async fn place_cancel_and_stock_flow() -> anyhow::Result<()> {
    let Some(state) = common::try_setup().await? else {
        return Ok(());
    };

    let client_id = common::create_user(&state, "client", "client@example.com").await?;
    let merchant_id = common::create_user(&state, "merchant", "merchant@example.com").await?;

    let product = common::create_product(&state, merchant_id, "Test Widget", 1000, 10).await?;

    let promo = PromotionActive {
        id: Set(Uuid::new_v4()),
        merchant_id: Set(merchant_id),
        code: Set("TENOFF".into()),
        discount_kind: Set("percentage".into()),
        discount_value: Set(10),
        expires_at: Set(None),
        usage_limit: Set(5),
        used_count: Set(0),
        is_active: Set(true),
        regions: Set(serde_json::json!([])),
        product_ids: Set(serde_json::json!([])),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let client = AuthUser {
        user_id: client_id,
        role: Role::Client,
    };
    let merchant = AuthUser {
        user_id: merchant_id,
        role: Role::Merchant,
    };

    // Place an order for 2 units with a 10% promotion.
    let resp = order_service::place_order(
        &state,
        &client,
        CreateOrderRequest {
            merchant_id,
            items: vec![OrderItemInput {
                product_id: product.id,
                quantity: 2,
                price: Some(1), // declared price is ignored
            }],
            promotion_code: Some("TENOFF".into()),
            address: "12 rue de la Paix, Paris".into(),
            note: None,
            total_price: Some(999_999), // declared total is ignored
        },
    )
    .await?;

    let placed = resp.data.unwrap();
    assert_eq!(placed.order.subtotal, 2000);
    assert_eq!(placed.order.discount, 200);
    assert_eq!(placed.order.total, 1800);
    assert_eq!(placed.order.status, "pending");
    assert_eq!(placed.items.len(), 1);
    assert_eq!(placed.items[0].price, 1000);

    // Stock decreased by exactly the ordered quantity.
    let stock = Products::find_by_id(product.id)
        .one(&state.orm)
        .await?
        .unwrap()
        .stock;
    assert_eq!(stock, 8);

    // Promotion usage was recorded.
    let used = Promotions::find_by_id(promo.id)
        .one(&state.orm)
        .await?
        .unwrap()
        .used_count;
    assert_eq!(used, 1);
    let redemptions = PromotionRedemptions::find()
        .filter(RedemptionCol::PromotionId.eq(promo.id))
        .count(&state.orm)
        .await?;
    assert_eq!(redemptions, 1);

    // Ordering more than the remaining stock fails and changes nothing.
    let err = order_service::place_order(
        &state,
        &client,
        CreateOrderRequest {
            merchant_id,
            items: vec![OrderItemInput {
                product_id: product.id,
                quantity: 100,
                price: None,
            }],
            promotion_code: None,
            address: "12 rue de la Paix, Paris".into(),
            note: None,
            total_price: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");
    let stock = Products::find_by_id(product.id)
        .one(&state.orm)
        .await?
        .unwrap()
        .stock;
    assert_eq!(stock, 8);

    // Unknown status values are rejected.
    let err = order_service::update_status(
        &state,
        &merchant,
        placed.order.id,
        UpdateOrderStatusRequest {
            status: "shipped".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    // Cancelling restores the stock and marks the order cancelled.
    let cancelled = order_service::cancel_order(&state, &client, placed.order.id).await?;
    assert_eq!(cancelled.data.unwrap().status, "cancelled");
    let stock = Products::find_by_id(product.id)
        .one(&state.orm)
        .await?
        .unwrap()
        .stock;
    assert_eq!(stock, 10);

    // Cancelling a cancelled order is rejected and leaves stock alone.
    let err = order_service::cancel_order(&state, &client, placed.order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");
    let stock = Products::find_by_id(product.id)
        .one(&state.orm)
        .await?
        .unwrap()
        .stock;
    assert_eq!(stock, 10);

    Ok(())
}

// The lifecycle table is enforced: pending cannot jump straight to
// completed, and a completed order is terminal.
#[tokio::test]
async fn order_status_transitions_follow_the_table() -> anyhow::Result<()> {
    let Some(state) = common::try_setup().await? else {
        return Ok(());
    };

    let client_id = common::create_user(&state, "client", "client2@example.com").await?;
    let merchant_id = common::create_user(&state, "merchant", "merchant2@example.com").await?;
    let product = common::create_product(&state, merchant_id, "Gadget", 500, 5).await?;

    let client = AuthUser {
        user_id: client_id,
        role: Role::Client,
    };
    let merchant = AuthUser {
        user_id: merchant_id,
        role: Role::Merchant,
    };

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
            address: "3 quai des Brumes, Lyon".into(),
            note: Some("leave at the door".into()),
            total_price: None,
        },
    )
    .await?;
    let order_id = resp.data.unwrap().order.id;

    // pending -> completed is not in the table.
    let err = order_service::update_status(
        &state,
        &merchant,
        order_id,
        UpdateOrderStatusRequest {
            status: "completed".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    // pending -> accepted -> in_progress -> completed is.
    for status in ["accepted", "in_progress", "completed"] {
        order_service::update_status(
            &state,
            &merchant,
            order_id,
            UpdateOrderStatusRequest {
                status: status.into(),
            },
        )
        .await?;
    }

    // Completed orders cannot be cancelled.
    let err = order_service::cancel_order(&state, &client, order_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    Ok(())
}
