mod common;

use axum_marketplace_api::{
    access::Role,
    dto::{
        deliveries::{DispatchDeliveryRequest, UpdateDeliveryStatusRequest},
        orders::{CreateOrderRequest, OrderItemInput, UpdateOrderStatusRequest},
    },
    entity::{couriers::Entity as Couriers, orders::Entity as Orders},
    error::AppError,
    geo::GeoPoint,
    middleware::auth::AuthUser,
    services::{delivery_service, order_service},
};
use sea_orm::EntityTrait;

// Integration flow: merchant dispatches an accepted order, the nearest
// courier accepts it, a rival courier loses the race, delivery completes
// the order and credits the courier.
#[tokio::test]
async fn dispatch_accept_and_deliver_flow() -> anyhow::Result<()> {
    let Some(state) = common::try_setup().await? else {
        return Ok(());
    };

    let client_id = common::create_user(&state, "client", "client@example.com").await?;
    let merchant_id = common::create_user(&state, "merchant", "merchant@example.com").await?;
    let livreur1_id = common::create_user(&state, "livreur", "livreur1@example.com").await?;
    let livreur2_id = common::create_user(&state, "livreur", "livreur2@example.com").await?;

    // Courier 1 waits in Paris, courier 2 in Marseille.
    let courier1 = common::create_courier(&state, livreur1_id, 48.8566, 2.3522).await?;
    common::create_courier(&state, livreur2_id, 43.2965, 5.3698).await?;

    let product = common::create_product(&state, merchant_id, "Test Widget", 1000, 10).await?;

    let client = AuthUser {
        user_id: client_id,
        role: Role::Client,
    };
    let merchant = AuthUser {
        user_id: merchant_id,
        role: Role::Merchant,
    };
    let courier1_user = AuthUser {
        user_id: livreur1_id,
        role: Role::Livreur,
    };
    let courier2_user = AuthUser {
        user_id: livreur2_id,
        role: Role::Livreur,
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
            address: "Place Bellecour, Lyon".into(),
            note: None,
            total_price: None,
        },
    )
    .await?;
    let order_id = resp.data.unwrap().order.id;

    // Dispatching a pending order is rejected; it must be accepted first.
    let err = delivery_service::dispatch(
        &state,
        &merchant,
        DispatchDeliveryRequest {
            order_id,
            dest_coords: GeoPoint {
                latitude: 45.7640,
                longitude: 4.8357,
            },
            fee: 700,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    order_service::update_status(
        &state,
        &merchant,
        order_id,
        UpdateOrderStatusRequest {
            status: "accepted".into(),
        },
    )
    .await?;

    let resp = delivery_service::dispatch(
        &state,
        &merchant,
        DispatchDeliveryRequest {
            order_id,
            dest_coords: GeoPoint {
                latitude: 45.7640,
                longitude: 4.8357,
            },
            fee: 700,
        },
    )
    .await?;
    let delivery = resp.data.unwrap();
    assert_eq!(delivery.status, "pending");

    // The order now points at its delivery.
    let order = Orders::find_by_id(order_id).one(&state.orm).await?.unwrap();
    assert_eq!(order.delivery_id, Some(delivery.id));

    // Paris -> Lyon is roughly 392 km in the availability listing.
    let available = delivery_service::available_deliveries(&state, &courier1_user)
        .await?
        .data
        .unwrap();
    assert_eq!(available.items.len(), 1);
    assert_eq!(available.items[0].delivery.id, delivery.id);
    assert!(
        (available.items[0].distance_km - 392.0).abs() < 2.0,
        "got {}",
        available.items[0].distance_km
    );

    // Courier 1 wins the delivery.
    let accepted = delivery_service::accept_delivery(&state, &courier1_user, delivery.id)
        .await?
        .data
        .unwrap();
    assert_eq!(accepted.status, "in_progress");
    assert_eq!(accepted.courier_id, Some(courier1.id));

    // Courier 2 arrives late and gets a conflict, not a reassignment.
    let err = delivery_service::accept_delivery(&state, &courier2_user, delivery.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");

    // The parent order followed the delivery into in_progress.
    let order = Orders::find_by_id(order_id).one(&state.orm).await?.unwrap();
    assert_eq!(order.status, "in_progress");

    // Delivering completes the order and credits the courier.
    let delivered = delivery_service::update_status(
        &state,
        &courier1_user,
        delivery.id,
        UpdateDeliveryStatusRequest {
            status: "delivered".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(delivered.status, "delivered");
    assert!(delivered.history.iter().any(|h| h.status == "delivered"));

    let order = Orders::find_by_id(order_id).one(&state.orm).await?.unwrap();
    assert_eq!(order.status, "completed");

    let courier = Couriers::find_by_id(courier1.id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(courier.deliveries_completed, 1);
    assert_eq!(courier.total_earnings, 700);

    // Cached reads agree with the store after all the writes.
    let fetched = delivery_service::get_delivery(&state, delivery.id)
        .await?
        .data
        .unwrap();
    assert_eq!(fetched.status, "delivered");

    Ok(())
}
