//! Menu management HTTP handlers (staff only).
//!
//! - POST|GET /api/v1/products, GET|PATCH|DELETE /api/v1/products/{id}
//! - POST|GET /api/v1/addons, GET|PATCH|DELETE /api/v1/addons/{id}

use crate::{
    error::AppError,
    models::product::{
        AddonResponse, CreateAddonRequest, CreateProductRequest, ProductResponse,
        UpdateAddonRequest, UpdateProductRequest,
    },
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// Add a product to the menu.
///
/// # Response
///
/// - **Success (201 Created)**: The stored product
/// - **Error (400)**: Blank name or non-positive price
pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    let product = state.menu.create_product(request).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// Every product, available or not, ordered by name.
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let products = state.menu.products().await?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, AppError> {
    Ok(Json(state.menu.product(&id).await?.into()))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = state.menu.update_product(&id, request).await?;
    Ok(Json(product.into()))
}

/// Existing orders keep their snapshot of a deleted product.
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.menu.delete_product(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_addon(
    State(state): State<AppState>,
    Json(request): Json<CreateAddonRequest>,
) -> Result<(StatusCode, Json<AddonResponse>), AppError> {
    let addon = state.menu.create_addon(request).await?;
    Ok((StatusCode::CREATED, Json(addon.into())))
}

pub async fn list_addons(
    State(state): State<AppState>,
) -> Result<Json<Vec<AddonResponse>>, AppError> {
    let addons = state.menu.addons().await?;
    Ok(Json(addons.into_iter().map(AddonResponse::from).collect()))
}

pub async fn get_addon(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AddonResponse>, AppError> {
    Ok(Json(state.menu.addon(&id).await?.into()))
}

pub async fn update_addon(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateAddonRequest>,
) -> Result<Json<AddonResponse>, AppError> {
    let addon = state.menu.update_addon(&id, request).await?;
    Ok(Json(addon.into()))
}

pub async fn delete_addon(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.menu.delete_addon(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
