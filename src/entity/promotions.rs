use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "promotions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub merchant_id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub discount_kind: String,
    pub discount_value: i64,
    pub expires_at: Option<DateTimeWithTimeZone>,
    pub usage_limit: i32,
    pub used_count: i32,
    pub is_active: bool,
    /// Region names the promotion is restricted to; empty = everywhere.
    pub regions: Json,
    /// Product ids the promotion applies to; empty = all products.
    pub product_ids: Json,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::MerchantId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(has_many = "super::promotion_redemptions::Entity")]
    PromotionRedemptions,
}

impl Related<super::promotion_redemptions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PromotionRedemptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
