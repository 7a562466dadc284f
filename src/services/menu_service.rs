//! Menu service - products, add-ons, and item snapshots.
//!
//! Staff maintain the menu; customers only ever see the `available` part of
//! it. When an order is placed, selections are resolved against the menu
//! and copied into [`OrderItem`] snapshots so later menu edits leave
//! existing orders untouched.

use std::sync::Arc;

use crate::{
    clock::Clock,
    error::AppError,
    models::{
        order::{AddonSnapshot, ItemSelection, OrderItem},
        product::{
            Addon, AddonResponse, CreateAddonRequest, CreateProductRequest, MenuResponse, Product,
            ProductResponse, UpdateAddonRequest, UpdateProductRequest,
        },
    },
    services::order_service::optional,
    store::{self, Direction, DocumentStore, Query, Record},
};

pub struct Menu {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name is required"));
    }
    Ok(name.to_string())
}

fn validate_base_price(cents: i64) -> Result<(), AppError> {
    if cents <= 0 {
        return Err(AppError::validation("base_price_cents must be positive"));
    }
    Ok(())
}

fn validate_addon_price(cents: i64) -> Result<(), AppError> {
    if cents < 0 {
        return Err(AppError::validation("price_cents must not be negative"));
    }
    Ok(())
}

impl Menu {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn create_product(&self, request: CreateProductRequest) -> Result<Product, AppError> {
        let name = validate_name(&request.name)?;
        validate_base_price(request.base_price_cents)?;

        let now = self.clock.now();
        let mut product = Product {
            id: String::new(),
            revision: 0,
            name,
            base_price_cents: request.base_price_cents,
            category: request.category,
            available: request.available,
            description: request.description.trim().to_string(),
            created_at: now,
            updated_at: now,
        };

        let id = self
            .store
            .insert(Product::COLLECTION, store::encode(&product)?)
            .await?;
        product.assign_identity(id, 1);

        tracing::info!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// # Errors
    ///
    /// `NotFound` if no product has this id.
    pub async fn product(&self, id: &str) -> Result<Product, AppError> {
        store::load::<Product>(self.store.as_ref(), id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Product {id}")))
    }

    /// All products ordered by name.
    pub async fn products(&self) -> Result<Vec<Product>, AppError> {
        let query = Query::new().order_by("name", Direction::Asc);
        Ok(store::load_all(self.store.as_ref(), &query).await?)
    }

    pub async fn update_product(
        &self,
        id: &str,
        request: UpdateProductRequest,
    ) -> Result<Product, AppError> {
        let mut product = self.product(id).await?;

        if let Some(name) = request.name {
            product.name = validate_name(&name)?;
        }
        if let Some(cents) = request.base_price_cents {
            validate_base_price(cents)?;
            product.base_price_cents = cents;
        }
        if let Some(category) = request.category {
            product.category = category;
        }
        if let Some(available) = request.available {
            product.available = available;
        }
        if let Some(description) = request.description {
            product.description = description.trim().to_string();
        }
        product.updated_at = self.clock.now();

        product.revision = self
            .store
            .update(
                Product::COLLECTION,
                &product.id,
                store::encode_fields(&product)?,
                Some(product.revision),
            )
            .await?;

        tracing::info!(product_id = %product.id, "Product updated");
        Ok(product)
    }

    pub async fn delete_product(&self, id: &str) -> Result<(), AppError> {
        self.store.delete(Product::COLLECTION, id).await?;
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    pub async fn create_addon(&self, request: CreateAddonRequest) -> Result<Addon, AppError> {
        let name = validate_name(&request.name)?;
        validate_addon_price(request.price_cents)?;

        let mut addon = Addon {
            id: String::new(),
            revision: 0,
            name,
            price_cents: request.price_cents,
            addon_type: request.addon_type,
            available: request.available,
        };

        let id = self
            .store
            .insert(Addon::COLLECTION, store::encode(&addon)?)
            .await?;
        addon.assign_identity(id, 1);

        tracing::info!(addon_id = %addon.id, name = %addon.name, "Add-on created");
        Ok(addon)
    }

    pub async fn addon(&self, id: &str) -> Result<Addon, AppError> {
        store::load::<Addon>(self.store.as_ref(), id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Add-on {id}")))
    }

    pub async fn addons(&self) -> Result<Vec<Addon>, AppError> {
        let query = Query::new().order_by("name", Direction::Asc);
        Ok(store::load_all(self.store.as_ref(), &query).await?)
    }

    pub async fn update_addon(&self, id: &str, request: UpdateAddonRequest) -> Result<Addon, AppError> {
        let mut addon = self.addon(id).await?;

        if let Some(name) = request.name {
            addon.name = validate_name(&name)?;
        }
        if let Some(cents) = request.price_cents {
            validate_addon_price(cents)?;
            addon.price_cents = cents;
        }
        if let Some(addon_type) = request.addon_type {
            addon.addon_type = addon_type;
        }
        if let Some(available) = request.available {
            addon.available = available;
        }

        addon.revision = self
            .store
            .update(
                Addon::COLLECTION,
                &addon.id,
                store::encode_fields(&addon)?,
                Some(addon.revision),
            )
            .await?;

        tracing::info!(addon_id = %addon.id, "Add-on updated");
        Ok(addon)
    }

    pub async fn delete_addon(&self, id: &str) -> Result<(), AppError> {
        self.store.delete(Addon::COLLECTION, id).await?;
        tracing::info!(addon_id = %id, "Add-on deleted");
        Ok(())
    }

    /// The orderable menu shown on a customer link.
    pub async fn available(&self) -> Result<MenuResponse, AppError> {
        let products = Query::new()
            .eq("available", true)
            .order_by("name", Direction::Asc);
        let addons = products.clone();

        let products: Vec<Product> = store::load_all(self.store.as_ref(), &products).await?;
        let addons: Vec<Addon> = store::load_all(self.store.as_ref(), &addons).await?;

        Ok(MenuResponse {
            products: products.into_iter().map(ProductResponse::from).collect(),
            addons: addons.into_iter().map(AddonResponse::from).collect(),
        })
    }

    /// Resolve selections into order lines priced from the current menu.
    ///
    /// # Errors
    ///
    /// - `NotFound`: a product or add-on id does not exist
    /// - `Validation`: a product or add-on is not available
    pub async fn snapshot_items(&self, selections: &[ItemSelection]) -> Result<Vec<OrderItem>, AppError> {
        let mut items = Vec::with_capacity(selections.len());

        for selection in selections {
            let product = self.product(&selection.product_id).await?;
            if !product.available {
                return Err(AppError::validation(format!(
                    "{} is not available right now",
                    product.name
                )));
            }

            let mut addons = Vec::with_capacity(selection.addon_ids.len());
            for addon_id in &selection.addon_ids {
                let addon = self.addon(addon_id).await?;
                if !addon.available {
                    return Err(AppError::validation(format!(
                        "{} is not available right now",
                        addon.name
                    )));
                }
                addons.push(AddonSnapshot {
                    name: addon.name,
                    price_cents: addon.price_cents,
                });
            }

            items.push(OrderItem {
                product_id: product.id,
                product_name: product.name,
                quantity: selection.quantity,
                unit_price_cents: product.base_price_cents,
                size: selection.size,
                addons,
                drink_name: optional(selection.drink_name.clone()),
            });
        }

        Ok(items)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::models::order::Size;
    use crate::models::product::{AddonType, Category};
    use crate::store::MemoryDocumentStore;
    use chrono::{TimeZone, Utc};

    pub(crate) fn menu_with(store: Arc<dyn DocumentStore>) -> Menu {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 14, 1, 0, 0).unwrap(),
        ));
        Menu::new(store, clock)
    }

    pub(crate) fn latte_request() -> CreateProductRequest {
        CreateProductRequest {
            name: "Latte".to_string(),
            base_price_cents: 12000,
            category: Category::EspressoBased,
            available: true,
            description: String::new(),
        }
    }

    pub(crate) fn extra_shot_request() -> CreateAddonRequest {
        CreateAddonRequest {
            name: "Extra Shot".to_string(),
            price_cents: 2000,
            addon_type: AddonType::Shot,
            available: true,
        }
    }

    fn menu() -> Menu {
        menu_with(Arc::new(MemoryDocumentStore::new()))
    }

    #[tokio::test]
    async fn product_requires_name_and_positive_price() {
        let menu = menu();

        let mut request = latte_request();
        request.name = "  ".to_string();
        let err = menu.create_product(request).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut request = latte_request();
        request.base_price_cents = 0;
        let err = menu.create_product(request).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut request = extra_shot_request();
        request.price_cents = -1;
        let err = menu.create_addon(request).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn free_addon_is_allowed() {
        let menu = menu();
        let mut request = extra_shot_request();
        request.name = "Cinnamon".to_string();
        request.price_cents = 0;

        let addon = menu.create_addon(request).await.unwrap();

        assert_eq!(addon.price_cents, 0);
    }

    #[tokio::test]
    async fn products_are_listed_by_name() {
        let menu = menu();
        menu.create_product(latte_request()).await.unwrap();
        let mut americano = latte_request();
        americano.name = "Americano".to_string();
        menu.create_product(americano).await.unwrap();

        let names: Vec<String> = menu
            .products()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();

        assert_eq!(names, vec!["Americano", "Latte"]);
    }

    #[tokio::test]
    async fn update_is_partial() {
        let menu = menu();
        let latte = menu.create_product(latte_request()).await.unwrap();

        let updated = menu
            .update_product(
                &latte.id,
                UpdateProductRequest {
                    base_price_cents: Some(13000),
                    ..UpdateProductRequest::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.base_price_cents, 13000);
        assert_eq!(updated.name, "Latte");
        assert_eq!(menu.product(&latte.id).await.unwrap().base_price_cents, 13000);
    }

    #[tokio::test]
    async fn available_menu_hides_unavailable_entries() {
        let menu = menu();
        let latte = menu.create_product(latte_request()).await.unwrap();
        let mut mocha = latte_request();
        mocha.name = "Mocha".to_string();
        menu.create_product(mocha).await.unwrap();
        menu.create_addon(extra_shot_request()).await.unwrap();
        menu.update_product(
            &latte.id,
            UpdateProductRequest {
                available: Some(false),
                ..UpdateProductRequest::default()
            },
        )
        .await
        .unwrap();

        let visible = menu.available().await.unwrap();

        assert_eq!(visible.products.len(), 1);
        assert_eq!(visible.products[0].name, "Mocha");
        assert_eq!(visible.addons.len(), 1);
    }

    #[tokio::test]
    async fn snapshots_copy_current_prices() {
        let menu = menu();
        let latte = menu.create_product(latte_request()).await.unwrap();
        let shot = menu.create_addon(extra_shot_request()).await.unwrap();

        let items = menu
            .snapshot_items(&[ItemSelection {
                product_id: latte.id.clone(),
                quantity: 2,
                size: Size::Large,
                addon_ids: vec![shot.id.clone()],
                drink_name: Some(" Ana ".to_string()),
            }])
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_name, "Latte");
        assert_eq!(items[0].unit_price_cents, 12000);
        assert_eq!(items[0].addons[0].price_cents, 2000);
        assert_eq!(items[0].drink_name.as_deref(), Some("Ana"));

        // Repricing the menu leaves the snapshot alone.
        menu.update_product(
            &latte.id,
            UpdateProductRequest {
                base_price_cents: Some(99000),
                ..UpdateProductRequest::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(items[0].unit_price_cents, 12000);
    }

    #[tokio::test]
    async fn snapshot_rejects_unknown_and_unavailable() {
        let menu = menu();
        let latte = menu.create_product(latte_request()).await.unwrap();
        let selection = |product_id: &str| ItemSelection {
            product_id: product_id.to_string(),
            quantity: 1,
            size: Size::Regular,
            addon_ids: vec![],
            drink_name: None,
        };

        let err = menu.snapshot_items(&[selection("nope")]).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        menu.update_product(
            &latte.id,
            UpdateProductRequest {
                available: Some(false),
                ..UpdateProductRequest::default()
            },
        )
        .await
        .unwrap();
        let err = menu.snapshot_items(&[selection(&latte.id)]).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_removes_product() {
        let menu = menu();
        let latte = menu.create_product(latte_request()).await.unwrap();

        menu.delete_product(&latte.id).await.unwrap();

        let err = menu.product(&latte.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
