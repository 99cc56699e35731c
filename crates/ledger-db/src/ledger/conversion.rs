//! # Unit Conversion Resolver
//!
//! Turns "qty in the requested unit" into "qty in the product's base unit".
//!
//! ```text
//! requested == base unit        → ×1
//! conversion row (unit → base)  → ×value_conv
//! no row                        → ×1, logged at debug
//! ```
//!
//! Also the write side of conversion management: create, update, delete,
//! and the priced unit list a product can be transacted in.

use sqlx::SqliteConnection;
use tracing::{debug, info};

use super::{load_product, LedgerContext};
use crate::error::{DbError, LedgerError, LedgerResult};
use crate::repository::{conversion, unit};
use ledger_core::validation::{line_amount, validate_multiplier, validate_required};
use ledger_core::{
    CoreError, Multiplier, NewUnitConversion, PricedUnit, Product, UnitConversion,
    ValidationError, UNIT_CONVERSION_PREFIX,
};

/// Multiplier from `unit_id` to `product`'s base unit.
///
/// ## Returns
/// * `Err(NotFound)` - `unit_id` is not a unit of the product's branch
pub async fn resolve(
    conn: &mut SqliteConnection,
    product: &Product,
    unit_id: &str,
) -> LedgerResult<Multiplier> {
    if unit_id == product.unit_id {
        return Ok(Multiplier::IDENTITY);
    }

    match unit::fetch_unit(conn, unit_id).await? {
        Some(found) if found.branch_id == product.branch_id => {}
        _ => {
            return Err(LedgerError::not_found(
                "Unit",
                format!("{} in branch {}", unit_id, product.branch_id),
            ))
        }
    }

    match conversion::find_value(conn, &product.id, unit_id, &product.unit_id, &product.branch_id)
        .await?
    {
        Some(value) => {
            debug!(product_id = %product.id, unit_id = %unit_id, value, "Conversion resolved");
            Ok(Multiplier::new(value))
        }
        None => {
            debug!(
                product_id = %product.id,
                unit_id = %unit_id,
                base_unit = %product.unit_id,
                "No conversion defined, treating as 1:1"
            );
            Ok(Multiplier::IDENTITY)
        }
    }
}

/// Defines a new conversion.
///
/// ## Returns
/// * `Err(NotFound)` - product or either unit missing from the branch
/// * `Err(Conflict)` - same (product, source, target, branch) already defined
pub async fn create_conversion(
    conn: &mut SqliteConnection,
    ctx: &LedgerContext<'_>,
    request: &NewUnitConversion,
) -> LedgerResult<UnitConversion> {
    validate_required("product_id", &request.product_id)?;
    validate_required("init_id", &request.init_id)?;
    validate_required("final_id", &request.final_id)?;
    validate_required("branch_id", &request.branch_id)?;
    validate_multiplier(request.value_conv)?;

    if request.init_id == request.final_id {
        return Err(ValidationError::InvalidFormat {
            field: "final_id".to_string(),
            reason: "source and target unit must differ".to_string(),
        }
        .into());
    }

    let product = load_product(conn, &request.product_id).await?;
    if product.branch_id != request.branch_id {
        return Err(LedgerError::not_found("Product", &request.product_id));
    }

    for unit_id in [&request.init_id, &request.final_id] {
        match unit::fetch_unit(conn, unit_id).await? {
            Some(found) if found.branch_id == request.branch_id => {}
            _ => return Err(LedgerError::not_found("Unit", unit_id.as_str())),
        }
    }

    let existing = conversion::find_value(
        conn,
        &request.product_id,
        &request.init_id,
        &request.final_id,
        &request.branch_id,
    )
    .await?;
    if existing.is_some() {
        return Err(duplicate(request));
    }

    let created = UnitConversion {
        id: ctx.next_id(UNIT_CONVERSION_PREFIX),
        product_id: request.product_id.clone(),
        init_id: request.init_id.clone(),
        final_id: request.final_id.clone(),
        value_conv: request.value_conv,
        branch_id: request.branch_id.clone(),
    };

    match conversion::insert_conversion(conn, &created).await {
        Ok(()) => {}
        // Lost a race with a concurrent insert of the same key.
        Err(DbError::UniqueViolation { .. }) => return Err(duplicate(request)),
        Err(err) => return Err(err.into()),
    }

    info!(
        id = %created.id,
        product_id = %created.product_id,
        init_id = %created.init_id,
        final_id = %created.final_id,
        value = created.value_conv,
        "Unit conversion created"
    );
    Ok(created)
}

/// Changes a conversion's multiplier. Existing lines keep the base
/// quantity they were recorded with.
pub async fn update_conversion(
    conn: &mut SqliteConnection,
    id: &str,
    value_conv: i64,
) -> LedgerResult<UnitConversion> {
    validate_multiplier(value_conv)?;
    conversion::update_value(conn, id, value_conv).await?;

    let updated = conversion::fetch_conversion(conn, id)
        .await?
        .ok_or_else(|| LedgerError::not_found("UnitConversion", id))?;

    debug!(id = %id, value = value_conv, "Unit conversion updated");
    Ok(updated)
}

pub async fn delete_conversion(conn: &mut SqliteConnection, id: &str) -> LedgerResult<()> {
    conversion::delete_conversion(conn, id).await?;
    debug!(id = %id, "Unit conversion deleted");
    Ok(())
}

pub async fn list_conversions(
    conn: &mut SqliteConnection,
    product_id: &str,
) -> LedgerResult<Vec<UnitConversion>> {
    let product = load_product(conn, product_id).await?;
    Ok(conversion::list_for_product(conn, product_id, &product.branch_id).await?)
}

/// Units `product_id` can be transacted in, each priced from the
/// product's purchase price. The base unit comes first.
pub async fn priced_units(
    conn: &mut SqliteConnection,
    product_id: &str,
) -> LedgerResult<Vec<PricedUnit>> {
    let product = load_product(conn, product_id).await?;
    let conversions = conversion::list_for_product(conn, product_id, &product.branch_id).await?;

    let mut units = vec![PricedUnit {
        unit_id: product.unit_id.clone(),
        multiplier: 1,
        price: product.purchase_price,
    }];

    for c in conversions.into_iter().filter(|c| c.final_id == product.unit_id) {
        let multiplier = Multiplier::new(c.value_conv);
        units.push(PricedUnit {
            unit_id: c.init_id,
            multiplier: multiplier.value(),
            price: line_amount("price", product.purchase_price, multiplier.value())?,
        });
    }

    Ok(units)
}

fn duplicate(request: &NewUnitConversion) -> LedgerError {
    CoreError::conflict(format!(
        "conversion {} → {} already defined for product {} in branch {}",
        request.init_id, request.final_id, request.product_id, request.branch_id
    ))
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::ledger::fixtures::{Fixture, BASE_UNIT, BOX_UNIT, PACK_UNIT};
    use ledger_core::{Branch, SubscriptionType, Unit, MAX_CONVERSION_VALUE};

    #[tokio::test]
    async fn test_resolve_base_defined_and_missing() {
        let fx = Fixture::new().await;
        let mut conn = fx.db.pool().acquire().await.unwrap();
        let product = load_product(&mut conn, &fx.product_id).await.unwrap();

        assert_eq!(resolve(&mut conn, &product, BASE_UNIT).await.unwrap(), Multiplier::IDENTITY);
        assert_eq!(resolve(&mut conn, &product, BOX_UNIT).await.unwrap().value(), 12);
        // PACK exists as a unit but has no conversion row.
        assert_eq!(resolve(&mut conn, &product, PACK_UNIT).await.unwrap(), Multiplier::IDENTITY);

        let err = resolve(&mut conn, &product, "CRATE").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_resolve_rejects_unit_from_other_branch() {
        let fx = Fixture::new().await;
        fx.db
            .branches()
            .insert(&Branch {
                id: "BR-2".to_string(),
                name: "Harbour Road".to_string(),
                subscription_type: SubscriptionType::Monthly,
                quota: 0,
                default_member_id: None,
            })
            .await
            .unwrap();
        fx.db
            .units()
            .insert(&Unit {
                id: "CRATE-2".to_string(),
                branch_id: "BR-2".to_string(),
                name: "Crate".to_string(),
            })
            .await
            .unwrap();

        let mut conn = fx.db.pool().acquire().await.unwrap();
        let product = load_product(&mut conn, &fx.product_id).await.unwrap();
        let err = resolve(&mut conn, &product, "CRATE-2").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_duplicate_conversion_conflicts() {
        let fx = Fixture::new().await;
        let mut conn = fx.db.pool().acquire().await.unwrap();
        let ctx = fx.context();

        let request = NewUnitConversion {
            product_id: fx.product_id.clone(),
            init_id: BOX_UNIT.to_string(),
            final_id: BASE_UNIT.to_string(),
            value_conv: 24,
            branch_id: fx.branch_id.clone(),
        };
        let err = create_conversion(&mut conn, &ctx, &request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let pack = NewUnitConversion {
            init_id: PACK_UNIT.to_string(),
            value_conv: 6,
            ..request
        };
        let created = create_conversion(&mut conn, &ctx, &pack).await.unwrap();
        assert_eq!(created.value_conv, 6);
    }

    #[tokio::test]
    async fn test_create_conversion_validates_references() {
        let fx = Fixture::new().await;
        let mut conn = fx.db.pool().acquire().await.unwrap();
        let ctx = fx.context();

        let request = NewUnitConversion {
            product_id: fx.product_id.clone(),
            init_id: "CRATE".to_string(),
            final_id: BASE_UNIT.to_string(),
            value_conv: 48,
            branch_id: fx.branch_id.clone(),
        };
        let err = create_conversion(&mut conn, &ctx, &request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let zero = NewUnitConversion {
            init_id: PACK_UNIT.to_string(),
            value_conv: 0,
            ..request
        };
        let err = create_conversion(&mut conn, &ctx, &zero).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let huge = NewUnitConversion {
            value_conv: MAX_CONVERSION_VALUE + 1,
            ..zero
        };
        let err = create_conversion(&mut conn, &ctx, &huge).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_priced_units_lists_base_first() {
        let fx = Fixture::new().await;
        let mut conn = fx.db.pool().acquire().await.unwrap();

        let units = priced_units(&mut conn, &fx.product_id).await.unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].unit_id, BASE_UNIT);
        assert_eq!(units[0].price.minor(), 1000);
        assert_eq!(units[1].unit_id, BOX_UNIT);
        assert_eq!(units[1].multiplier, 12);
        assert_eq!(units[1].price.minor(), 12000);
    }

    #[tokio::test]
    async fn test_update_and_delete_conversion() {
        let fx = Fixture::new().await;
        let mut conn = fx.db.pool().acquire().await.unwrap();
        let id = fx.box_conversion_id.clone();

        let updated = update_conversion(&mut conn, &id, 10).await.unwrap();
        assert_eq!(updated.value_conv, 10);

        delete_conversion(&mut conn, &id).await.unwrap();
        let err = delete_conversion(&mut conn, &id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(list_conversions(&mut conn, &fx.product_id).await.unwrap().is_empty());
    }
}
