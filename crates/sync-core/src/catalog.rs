//! The entity catalog.
//!
//! Entity types are a closed set known at compile time. Each variant of
//! [`EntityKind`] carries a static [`EntityDescriptor`]; resolving a type by
//! name is a case-insensitive scan over [`EntityKind::ALL`].

use std::fmt;

use crate::schema::{EntityDescriptor, FieldDef, ForeignKeyDef, OnDelete, RelationshipDef, SchemaError};

/// Entity types that can be synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Customer,
    Address,
    Order,
    OrderLineItem,
    Product,
}

impl EntityKind {
    /// Every entity kind, principals before their dependents.
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Customer,
        EntityKind::Address,
        EntityKind::Product,
        EntityKind::Order,
        EntityKind::OrderLineItem,
    ];

    /// Static descriptor for this kind.
    pub fn descriptor(self) -> &'static EntityDescriptor {
        match self {
            EntityKind::Customer => &CUSTOMER,
            EntityKind::Address => &ADDRESS,
            EntityKind::Order => &ORDER,
            EntityKind::OrderLineItem => &ORDER_LINE_ITEM,
            EntityKind::Product => &PRODUCT,
        }
    }

    /// Short type name, also used as the entity name in identity mappings.
    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    /// Resolve a type by short or qualified name, ignoring case.
    pub fn resolve(name: &str) -> Result<EntityKind, SchemaError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.descriptor().matches_name(name))
            .ok_or_else(|| SchemaError::EntityNotFound(name.to_string()))
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static CUSTOMER: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Customer,
    name: "Customer",
    qualified_name: "sales::Customer",
    table: "customers",
    keys: &["id"],
    fields: &[
        FieldDef::int("id"),
        FieldDef::text("name", 200),
        FieldDef::text("email", 200).unique(),
    ],
    foreign_keys: &[],
    relationships: &[
        RelationshipDef::collection("addresses", EntityKind::Address, "customer_id"),
        RelationshipDef::collection("orders", EntityKind::Order, "customer_id"),
    ],
};

static ADDRESS: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Address,
    name: "Address",
    qualified_name: "sales::Address",
    table: "addresses",
    keys: &["id"],
    fields: &[
        FieldDef::int("id"),
        FieldDef::int("customer_id"),
        FieldDef::text("street", 200),
        FieldDef::text("city", 100),
        FieldDef::text("state", 100),
        FieldDef::text("postal_code", 20),
    ],
    foreign_keys: &[ForeignKeyDef {
        field: "customer_id",
        principal: EntityKind::Customer,
        on_delete: OnDelete::Cascade,
    }],
    relationships: &[RelationshipDef::reference(
        "customer",
        EntityKind::Customer,
        "customer_id",
    )],
};

static PRODUCT: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Product,
    name: "Product",
    qualified_name: "sales::Product",
    table: "products",
    keys: &["id"],
    fields: &[
        FieldDef::int("id"),
        FieldDef::text("sku", 50).unique(),
        FieldDef::text("name", 200),
        FieldDef::decimal("price", 18, 2),
    ],
    foreign_keys: &[],
    relationships: &[RelationshipDef::collection(
        "line_items",
        EntityKind::OrderLineItem,
        "product_id",
    )],
};

static ORDER: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Order,
    name: "Order",
    qualified_name: "sales::Order",
    table: "orders",
    keys: &["id"],
    fields: &[
        FieldDef::int("id"),
        FieldDef::int("customer_id"),
        FieldDef::timestamp("order_date"),
    ],
    foreign_keys: &[ForeignKeyDef {
        field: "customer_id",
        principal: EntityKind::Customer,
        on_delete: OnDelete::Cascade,
    }],
    relationships: &[
        RelationshipDef::reference("customer", EntityKind::Customer, "customer_id"),
        RelationshipDef::collection("line_items", EntityKind::OrderLineItem, "order_id"),
    ],
};

static ORDER_LINE_ITEM: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::OrderLineItem,
    name: "OrderLineItem",
    qualified_name: "sales::OrderLineItem",
    table: "order_line_items",
    keys: &["id"],
    fields: &[
        FieldDef::int("id"),
        FieldDef::int("order_id"),
        FieldDef::int("product_id"),
        FieldDef::int("quantity"),
        FieldDef::decimal("unit_price", 18, 2),
    ],
    foreign_keys: &[
        ForeignKeyDef {
            field: "order_id",
            principal: EntityKind::Order,
            on_delete: OnDelete::Cascade,
        },
        ForeignKeyDef {
            field: "product_id",
            principal: EntityKind::Product,
            on_delete: OnDelete::Restrict,
        },
    ],
    relationships: &[
        RelationshipDef::reference("order", EntityKind::Order, "order_id"),
        RelationshipDef::reference("product", EntityKind::Product, "product_id"),
    ],
};
