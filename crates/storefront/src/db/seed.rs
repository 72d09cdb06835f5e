//! Demo catalog seeding.
//!
//! Inserts a small catalog (three categories, three brands, five products)
//! that exercises the assistant end to end. Categories and brands are upserted
//! by name and products are skipped when a product with the same title already
//! exists in the category, so seeding twice is harmless.

use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info, instrument};

use shopbot_core::{BrandId, CategoryId, ImageId, ProductStatus, ProductTextId};

use super::RepositoryError;

/// A demo product definition.
struct DemoProduct {
    title: &'static str,
    description: &'static str,
    price: i32,
    discount: i32,
    category: &'static str,
    brand: &'static str,
    image_url: &'static str,
}

const DEMO_CATEGORIES: &[&str] = &["Electronics", "Clothing", "Books"];
const DEMO_BRANDS: &[&str] = &["Sony", "Nike", "Apple"];

const DEMO_PRODUCTS: &[DemoProduct] = &[
    DemoProduct {
        title: "Noise Cancelling Headphones",
        description: "Premium over-ear headphones with active noise cancellation. Perfect for travel.",
        price: 250,
        discount: 10,
        category: "Electronics",
        brand: "Sony",
        image_url: "/img/headphones.jpg",
    },
    DemoProduct {
        title: "Winter Puffer Jacket",
        description: "Water-resistant puffer jacket with goose down insulation for cold weather.",
        price: 180,
        discount: 0,
        category: "Clothing",
        brand: "Nike",
        image_url: "/img/winter_jacket.jpg",
    },
    DemoProduct {
        title: "Wireless Noise Cancelling Earbuds",
        description: "Compact earbuds with active noise cancellation and clear sound. Perfect for commuting.",
        price: 199,
        discount: 15,
        category: "Electronics",
        brand: "Sony",
        image_url: "/img/sony.jpg",
    },
    DemoProduct {
        title: "Basic USB Mouse",
        description: "Simple 3-button USB mouse for everyday use. No special features.",
        price: 15,
        discount: 0,
        category: "Electronics",
        brand: "Apple",
        image_url: "/img/apple.jpg",
    },
    DemoProduct {
        title: "Merino Wool Hiking Socks",
        description: "Comfortable merino wool socks, excellent for hiking and moisture wicking. Great value.",
        price: 25,
        discount: 5,
        category: "Clothing",
        brand: "Nike",
        image_url: "/img/winter_clothing.jpg",
    },
];

/// Result of a seeding run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedResult {
    /// Categories inserted or already present.
    pub categories: usize,
    /// Brands inserted or already present.
    pub brands: usize,
    /// Products inserted by this run.
    pub products_inserted: usize,
    /// Products skipped because they already existed.
    pub products_skipped: usize,
}

/// Seed the demo catalog in a single transaction.
///
/// # Arguments
///
/// * `pool` - Catalog database pool
/// * `reset` - Truncate all catalog tables first
///
/// # Errors
///
/// Returns `RepositoryError::Database` if any statement fails; nothing is
/// committed in that case.
#[instrument(skip(pool))]
pub async fn seed_demo_catalog(pool: &PgPool, reset: bool) -> Result<SeedResult, RepositoryError> {
    let mut tx = pool.begin().await?;

    if reset {
        sqlx::query(
            "TRUNCATE products, product_texts, images, brands, categories RESTART IDENTITY CASCADE",
        )
        .execute(&mut *tx)
        .await?;
        info!("Catalog tables truncated");
    }

    let mut result = SeedResult::default();

    for name in DEMO_CATEGORIES {
        upsert_category(&mut tx, name).await?;
        result.categories += 1;
    }
    for name in DEMO_BRANDS {
        upsert_brand(&mut tx, name).await?;
        result.brands += 1;
    }

    for product in DEMO_PRODUCTS {
        if insert_product(&mut tx, product).await? {
            result.products_inserted += 1;
        } else {
            result.products_skipped += 1;
        }
    }

    tx.commit().await?;

    info!(
        inserted = result.products_inserted,
        skipped = result.products_skipped,
        "Demo catalog seeded"
    );
    Ok(result)
}

async fn upsert_category(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
) -> Result<CategoryId, RepositoryError> {
    let id: CategoryId = sqlx::query_scalar(
        r"
        INSERT INTO categories (name) VALUES ($1)
        ON CONFLICT (name) DO UPDATE SET updated_at = now()
        RETURNING id
        ",
    )
    .bind(name)
    .fetch_one(&mut **tx)
    .await?;
    Ok(id)
}

async fn upsert_brand(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
) -> Result<BrandId, RepositoryError> {
    let id: BrandId = sqlx::query_scalar(
        r"
        INSERT INTO brands (name) VALUES ($1)
        ON CONFLICT (name) DO UPDATE SET updated_at = now()
        RETURNING id
        ",
    )
    .bind(name)
    .fetch_one(&mut **tx)
    .await?;
    Ok(id)
}

/// Insert one demo product with its text and image. Returns `false` if skipped.
async fn insert_product(
    tx: &mut Transaction<'_, Postgres>,
    product: &DemoProduct,
) -> Result<bool, RepositoryError> {
    let category_id = upsert_category(tx, product.category).await?;
    let brand_id = upsert_brand(tx, product.brand).await?;

    let exists: bool = sqlx::query_scalar(
        r"
        SELECT EXISTS(
            SELECT 1 FROM products p
            JOIN product_texts t ON t.id = p.text_id
            WHERE p.category_id = $1 AND t.title = $2
        )
        ",
    )
    .bind(category_id)
    .bind(product.title)
    .fetch_one(&mut **tx)
    .await?;

    if exists {
        debug!(title = product.title, "Demo product already present");
        return Ok(false);
    }

    let text_id: ProductTextId = sqlx::query_scalar(
        "INSERT INTO product_texts (title, description) VALUES ($1, $2) RETURNING id",
    )
    .bind(product.title)
    .bind(product.description)
    .fetch_one(&mut **tx)
    .await?;

    let image_id: ImageId = sqlx::query_scalar("INSERT INTO images (url) VALUES ($1) RETURNING id")
        .bind(product.image_url)
        .fetch_one(&mut **tx)
        .await?;

    sqlx::query(
        r"
        INSERT INTO products
            (category_id, brand_id, text_id, general_image_id,
             price, discount, currency, in_stock, status)
        VALUES ($1, $2, $3, $4, $5, $6, 'USD', 1, $7)
        ",
    )
    .bind(category_id)
    .bind(brand_id)
    .bind(text_id)
    .bind(image_id)
    .bind(product.price)
    .bind(product.discount)
    .bind(ProductStatus::Active.as_i16())
    .execute(&mut **tx)
    .await?;

    Ok(true)
}
