use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth as auth_dto,
        couriers as courier_dto,
        deliveries as delivery_dto,
        orders as order_dto,
        payments as payment_dto,
        products as product_dto,
        promotions as promotion_dto,
        support as support_dto,
    },
    geo::GeoPoint,
    models::{
        Courier, Delivery, DeliveryStatus, DiscountKind, Order, OrderItem, OrderStatus, Payment,
        Product, Promotion, StatusChange, SupportTicket, TicketStatus, User,
    },
    response::{ApiResponse, Meta},
    routes::{
        admin, auth, couriers, deliveries, health, orders, params, payments, products, promotions,
        support,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        promotions::list_promotions,
        promotions::create_promotion,
        promotions::update_promotion,
        promotions::activate_promotion,
        promotions::deactivate_promotion,
        promotions::best_promotion,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::update_order_status,
        orders::cancel_order,
        deliveries::dispatch_delivery,
        deliveries::available_deliveries,
        deliveries::my_deliveries,
        deliveries::calculate_distance,
        deliveries::get_delivery,
        deliveries::accept_delivery,
        deliveries::assign_delivery,
        deliveries::update_delivery_status,
        deliveries::delete_delivery,
        couriers::my_stats,
        couriers::update_location,
        couriers::set_availability,
        payments::pay_order,
        support::create_ticket,
        support::list_tickets,
        support::get_ticket,
        support::assign_ticket,
        support::update_ticket_status,
        admin::list_all_orders,
        admin::list_low_stock,
        admin::adjust_inventory
    ),
    components(
        schemas(
            User,
            Product,
            Promotion,
            Order,
            OrderItem,
            Delivery,
            Courier,
            Payment,
            SupportTicket,
            StatusChange,
            OrderStatus,
            DeliveryStatus,
            TicketStatus,
            DiscountKind,
            GeoPoint,
            auth_dto::RegisterRequest,
            auth_dto::LoginRequest,
            auth_dto::LoginResponse,
            product_dto::CreateProductRequest,
            product_dto::UpdateProductRequest,
            product_dto::ProductList,
            promotion_dto::CreatePromotionRequest,
            promotion_dto::UpdatePromotionRequest,
            promotion_dto::PromotionList,
            promotion_dto::BestPromotionRequest,
            promotion_dto::BestPromotionResponse,
            order_dto::OrderItemInput,
            order_dto::CreateOrderRequest,
            order_dto::UpdateOrderStatusRequest,
            order_dto::OrderWithItems,
            order_dto::OrderList,
            delivery_dto::DispatchDeliveryRequest,
            delivery_dto::AssignDeliveryRequest,
            delivery_dto::UpdateDeliveryStatusRequest,
            delivery_dto::DistanceRequest,
            delivery_dto::DistanceResponse,
            delivery_dto::AvailableDelivery,
            delivery_dto::AvailableDeliveryList,
            delivery_dto::DeliveryList,
            courier_dto::UpdateLocationRequest,
            courier_dto::SetAvailabilityRequest,
            payment_dto::PayOrderRequest,
            support_dto::CreateTicketRequest,
            support_dto::UpdateTicketStatusRequest,
            support_dto::AssignTicketRequest,
            support_dto::TicketList,
            admin::LowStockQuery,
            admin::InventoryAdjustRequest,
            admin::ProductList,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::TicketListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<Order>,
            ApiResponse<Delivery>,
            ApiResponse<order_dto::OrderWithItems>,
            ApiResponse<order_dto::OrderList>,
            ApiResponse<admin::ProductList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Merchant catalog endpoints"),
        (name = "Promotions", description = "Promotion endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Deliveries", description = "Delivery endpoints"),
        (name = "Couriers", description = "Courier profile endpoints"),
        (name = "Payments", description = "Payment endpoints"),
        (name = "Support", description = "Support desk endpoints"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
