use std::collections::HashMap;

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use chrono::Datelike;
use password_hash::rand_core::OsRng;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set, Statement};
use terral_admin::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::auth::LoginForm,
    dto::orders::UpdatePaymentForm,
    dto::settings::SettingsForm,
    entity::{
        categories::ActiveModel as CategoryActive,
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::ActiveModel as OrderActive,
        payments::ActiveModel as PaymentActive,
        products::{ActiveModel as ProductActive, Entity as Products},
        users::ActiveModel as UserActive,
    },
    middleware::auth::CurrentAdmin,
    models::{DeleteOutcome, OrderStatus, PaymentStatus, UserRole},
    rules::DecisionCode,
    services::{auth_service, category_service, order_service, product_service, settings_service},
    state::AppState,
};

// Integration flow: an unpaid order refuses to advance, the admin reconciles
// the payment, the order walks the fulfilment track, and catalog deletion
// guards behave. Skipped when no database is configured.
#[tokio::test]
async fn order_payment_and_catalog_flow() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;
    let admin = seed_admin(&state).await?;

    // Catalog
    let category = CategoryActive {
        id: NotSet,
        name: Set("Test Apparel".into()),
        description: Set(None),
        image: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let mug = seed_product(&state, category.id, "Test Mug", 500).await?;
    let tote = seed_product(&state, category.id, "Test Tote", 1000).await?;

    // Customer with one unpaid order: 2 x mug @ 500, 1 x tote @ 1000.
    let customer = UserActive {
        id: NotSet,
        first_name: Set("Test".into()),
        last_name: Set("Customer".into()),
        email: Set("flow-customer@example.com".into()),
        password_hash: Set("dummy".into()),
        phone: Set(None),
        address: Set(None),
        role: Set("customer".into()),
        status: Set("active".into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let order = OrderActive {
        id: NotSet,
        user_id: Set(customer.id),
        status: Set("pending".into()),
        total_price: Set(Decimal::from(2200)),
        shipping_address: Set("Moi Avenue 12".into()),
        shipping_city: Set(Some("Nairobi".into())),
        shipping_postal_code: Set(None),
        shipping_cost: Set(Decimal::from(200)),
        phone: Set(None),
        notes: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    for (product_id, quantity, price) in [(mug.id, 2, 500), (tote.id, 1, 1000)] {
        OrderItemActive {
            id: NotSet,
            order_id: Set(order.id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            price: Set(Decimal::from(price)),
            customization_text: Set(None),
            customization_image: Set(None),
            customization_color: Set(None),
            customization_size: Set(None),
            created_at: NotSet,
        }
        .insert(&state.orm)
        .await?;
    }

    PaymentActive {
        id: NotSet,
        order_id: Set(order.id),
        status: Set("pending".into()),
        payment_method: Set(Some("mpesa".into())),
        transaction_id: Set(None),
        amount: Set(Decimal::from(2200)),
        payment_date: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    // Unpaid: delivery is refused with its dedicated code, and a generic
    // forward move is refused with the generic one.
    let decision = order_service::validate_status_update(&state, order.id, "delivered").await?;
    assert!(!decision.allowed);
    assert_eq!(decision.code, DecisionCode::PaymentRequiredForDelivery);

    let (decision, updated) =
        order_service::update_order_status(&state, &admin, order.id, "processing").await?;
    assert!(!decision.allowed);
    assert_eq!(decision.code, DecisionCode::PaymentNotCompleted);
    assert!(updated.is_none());

    // Cancellation carries no payment guard.
    let decision = order_service::validate_status_update(&state, order.id, "canceled").await?;
    assert!(decision.allowed);

    // Manual reconciliation: payment updates are never guarded.
    let payment = order_service::update_payment_status(
        &state,
        &admin,
        order.id,
        UpdatePaymentForm {
            status: "completed".into(),
            payment_method: None,
            transaction_id: Some("MPESA-TX-99".into()),
            amount: None,
        },
    )
    .await?;
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert!(payment.payment_date.is_some());

    // Paid: the order walks the whole track.
    for status in ["processing", "shipped", "delivered"] {
        let (decision, updated) =
            order_service::update_order_status(&state, &admin, order.id, status).await?;
        assert!(decision.allowed, "transition to {status}");
        assert!(updated.is_some());
    }

    let details = order_service::get_order_details(&state, order.id).await?;
    assert_eq!(details.order.status, OrderStatus::Delivered);
    assert_eq!(details.items.len(), 2);

    let validation = order_service::payment_validation(&state, order.id).await?;
    assert!(validation.success);
    assert!(validation.payment_summary.is_valid);
    assert!(validation.payment_summary.amount_matches);

    // Invoice totals come from item snapshots plus shipping.
    let invoice = order_service::invoice_data(&state, order.id).await?;
    assert_eq!(invoice.totals.subtotal, Decimal::from(2000));
    assert_eq!(
        invoice.totals.total,
        invoice.totals.subtotal + invoice.totals.shipping + invoice.totals.tax
    );
    assert_eq!(
        invoice.invoice_number,
        format!("INV-{}-{:06}", invoice.order.created_at.year(), order.id)
    );

    // The category still has products, so deletion is refused either time.
    assert!(category_service::delete_category(&state, &admin, category.id)
        .await
        .is_err());
    assert!(category_service::delete_category(&state, &admin, category.id)
        .await
        .is_err());

    // The mug is on a historic order: delete is soft, the row survives.
    let outcome = product_service::delete_product(&state, &admin, mug.id, false).await?;
    assert_eq!(outcome, DeleteOutcome::SoftDeleted);
    let still_there = Products::find_by_id(mug.id).one(&state.orm).await?;
    assert!(still_there.is_some_and(|p| p.deleted_at.is_some()));

    // Force delete purges the row and its order_items.
    let outcome = product_service::delete_product(&state, &admin, tote.id, true).await?;
    assert_eq!(outcome, DeleteOutcome::Purged);
    assert!(Products::find_by_id(tote.id).one(&state.orm).await?.is_none());
    let remaining = OrderItems::find()
        .filter(OrderItemCol::ProductId.eq(tote.id))
        .all(&state.orm)
        .await?;
    assert!(remaining.is_empty());

    // A product nothing references hard-deletes without force.
    let fresh = seed_product(&state, category.id, "Test Sticker", 100).await?;
    let outcome = product_service::delete_product(&state, &admin, fresh.id, false).await?;
    assert_eq!(outcome, DeleteOutcome::Purged);

    // A bad value anywhere in a bulk settings update leaves every row
    // untouched.
    let before = settings_service::get_value(&state, "store_name").await?;
    let mut form: SettingsForm = HashMap::new();
    form.insert("store_name".into(), "Renamed Store".into());
    form.insert("tax_rate".into(), "not-a-number".into());
    assert!(settings_service::update_settings(&state, &admin, &form)
        .await
        .is_err());
    assert_eq!(
        settings_service::get_value(&state, "store_name").await?,
        before
    );

    let mut form: SettingsForm = HashMap::new();
    form.insert("tax_rate".into(), "16".into());
    settings_service::update_settings(&state, &admin, &form).await?;
    assert_eq!(
        settings_service::tax_rate(&state).await?,
        Decimal::from(16)
    );

    // Only active admins get a session context out of login.
    seed_login_user(&state, "gate-customer@example.com", "customer", "active").await?;
    seed_login_user(&state, "gate-admin@example.com", "admin", "suspended").await?;
    for email in ["gate-customer@example.com", "gate-admin@example.com"] {
        let result = auth_service::login_admin(
            &state.pool,
            LoginForm {
                email: email.into(),
                password: "secret123".into(),
            },
        )
        .await;
        assert!(result.is_err(), "{email} must not log in");
    }

    Ok(())
}

async fn seed_login_user(
    state: &AppState,
    email: &str,
    role: &str,
    status: &str,
) -> anyhow::Result<()> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(b"secret123", &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    UserActive {
        id: NotSet,
        first_name: Set("Gate".into()),
        last_name: Set("User".into()),
        email: Set(email.into()),
        password_hash: Set(password_hash),
        phone: Set(None),
        address: Set(None),
        role: Set(role.into()),
        status: Set(status.into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;
    let pool = create_pool(database_url).await?;

    // Clean tables between runs; settings keep their seeded defaults.
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, payments, orders, products, categories, audit_logs, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        uploads_dir: std::env::temp_dir()
            .join("terral-admin-test-uploads")
            .to_string_lossy()
            .into_owned(),
        session_secure: false,
    };

    Ok(AppState { pool, orm, config })
}

async fn seed_admin(state: &AppState) -> anyhow::Result<CurrentAdmin> {
    let user = UserActive {
        id: NotSet,
        first_name: Set("Flow".into()),
        last_name: Set("Admin".into()),
        email: Set("flow-admin@example.com".into()),
        password_hash: Set("dummy".into()),
        phone: Set(None),
        address: Set(None),
        role: Set("admin".into()),
        status: Set("active".into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(CurrentAdmin {
        user_id: user.id,
        name: "Flow Admin".into(),
        role: UserRole::Admin,
    })
}

async fn seed_product(
    state: &AppState,
    category_id: i64,
    name: &str,
    price: i64,
) -> anyhow::Result<terral_admin::entity::products::Model> {
    let product = ProductActive {
        id: NotSet,
        name: Set(name.into()),
        description: Set(None),
        price: Set(Decimal::from(price)),
        stock: Set(25),
        category_id: Set(category_id),
        image: Set(None),
        status: Set("active".into()),
        is_customizable: Set(false),
        sku: Set(None),
        weight: Set(None),
        dimensions: Set(None),
        deleted_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}
