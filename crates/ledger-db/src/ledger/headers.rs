//! # Header Lifecycle
//!
//! ```text
//! create ─► validate ─► origin checks (returns) ─► counterparty
//!        ─► quota::charge ─► insert
//!                                                                    │
//!                                           recalculate (report row) ◄┘
//!
//! update ─► date / description / discount / payment ─► recalculate
//!           (a sale moved to another date also rebuilds its old bucket)
//!
//! delete ─► refuse while returns reference it
//!        ─► undo every line's stock effect ─► drop report ─► drop header
//! ```

use sqlx::SqliteConnection;
use tracing::{debug, info};

use super::{lines, load_header, quota, recalc, reports, LedgerContext};
use crate::error::{LedgerError, LedgerResult};
use crate::repository::{branch, header, item};
use ledger_core::validation::{parse_optional_date, validate_amount, validate_required};
use ledger_core::{
    CoreError, Counterparty, Header, HeaderUpdate, HeaderWithItems, LineStrategy, Money,
    NewHeader, NewTransaction, PaymentStatus, TransactionKind, ValidationError,
};

// =============================================================================
// Create
// =============================================================================

/// Opens an empty header.
///
/// A quota branch is charged one unit here, on the same connection, so a
/// create that fails afterwards leaves the quota untouched once rolled back.
///
/// ## Returns
/// * `Err(InvalidInput)` - missing fields, bad date, discount on a non-sale,
///   missing or misplaced origin, supplier or member on the wrong kind
/// * `Err(NotFound)` - unknown branch or origin header
/// * `Err(QuotaExceeded)` - quota branch with nothing left
pub async fn create_header(
    conn: &mut SqliteConnection,
    ctx: &LedgerContext<'_>,
    request: &NewHeader,
) -> LedgerResult<Header> {
    validate_required("branch_id", &request.branch_id)?;
    validate_required("user_id", &request.user_id)?;

    let txn_date = parse_optional_date("txn_date", request.txn_date.as_deref())?
        .unwrap_or_else(|| ctx.today());
    let discount = checked_discount(request.kind, request.discount)?;
    let origin = checked_origin(conn, request).await?;
    let (supplier_id, member_id) = checked_counterparty(conn, request, origin.as_ref()).await?;

    quota::charge(conn, &request.branch_id).await?;

    let now = ctx.now();
    let header = Header {
        id: ctx.next_id(request.kind.header_prefix()),
        kind: request.kind,
        branch_id: request.branch_id.clone(),
        user_id: request.user_id.clone(),
        txn_date,
        description: clean_description(request.description.as_deref()),
        origin_id: origin.map(|o| o.id),
        supplier_id,
        member_id,
        discount,
        total: Money::zero(),
        profit: Money::zero(),
        payment: request
            .payment
            .unwrap_or_else(|| PaymentStatus::default_for(request.kind)),
        created_at: now,
        updated_at: now,
    };
    header::insert_header(conn, &header).await?;

    info!(
        header_id = %header.id,
        kind = %header.kind,
        branch_id = %header.branch_id,
        %txn_date,
        "Header created"
    );

    recalc::recalculate(conn, ctx, &header.id).await
}

/// Creates a header and all its lines in one go.
pub async fn create_transaction(
    conn: &mut SqliteConnection,
    ctx: &LedgerContext<'_>,
    request: &NewTransaction,
) -> LedgerResult<HeaderWithItems> {
    if request.items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        }
        .into());
    }

    let created = create_header(conn, ctx, &request.header).await?;
    for line in &request.items {
        lines::create_item(conn, ctx, &created.id, line).await?;
    }

    let header = load_header(conn, &created.id).await?;
    let items = item::list_for_header(conn, &created.id).await?;
    debug!(header_id = %header.id, lines = items.len(), total = %header.total, "Transaction created");

    Ok(HeaderWithItems { header, items })
}

// =============================================================================
// Update
// =============================================================================

/// Edits the header's own fields. Kind, branch, user and origin are fixed
/// at creation, and so is a return's counterparty.
pub async fn update_header(
    conn: &mut SqliteConnection,
    ctx: &LedgerContext<'_>,
    header_id: &str,
    update: &HeaderUpdate,
) -> LedgerResult<Header> {
    let mut current = load_header(conn, header_id).await?;
    let previous_date = current.txn_date;

    if let Some(date) = parse_optional_date("txn_date", update.txn_date.as_deref())? {
        current.txn_date = date;
    }
    if update.discount.is_some() {
        current.discount = checked_discount(current.kind, update.discount)?;
    }
    if let Some(description) = update.description.as_deref() {
        current.description = clean_description(Some(description));
    }
    if let Some(payment) = update.payment {
        current.payment = payment;
    }

    let requested = [
        (Counterparty::Supplier, update.supplier_id.as_deref()),
        (Counterparty::Member, update.member_id.as_deref()),
    ];
    for (party, id) in requested {
        let Some(id) = clean_id(id) else { continue };
        if current.kind.is_return() || current.kind.counterparty() != Some(party) {
            return Err(misplaced_counterparty(current.kind, party));
        }
        match party {
            Counterparty::Supplier => current.supplier_id = Some(id.to_string()),
            Counterparty::Member => current.member_id = Some(id.to_string()),
        }
    }
    current.updated_at = ctx.now();

    header::write_fields(conn, &current).await?;
    let updated = recalc::recalculate(conn, ctx, header_id).await?;

    if updated.kind == TransactionKind::Sale && previous_date != updated.txn_date {
        reports::sync_daily_profit(conn, ctx, previous_date, &updated.branch_id, &updated.user_id)
            .await?;
        debug!(header_id = %header_id, from = %previous_date, to = %updated.txn_date, "Sale moved to another day");
    }

    Ok(updated)
}

// =============================================================================
// Delete
// =============================================================================

/// Deletes a header with all its lines, undoing their stock effects.
///
/// ## Returns
/// * `Err(Conflict)` - return headers still reference it
/// * `Err(InsufficientStock)` - undoing a receipt would drive stock negative
pub async fn delete_header(
    conn: &mut SqliteConnection,
    ctx: &LedgerContext<'_>,
    header_id: &str,
) -> LedgerResult<Header> {
    let target = load_header(conn, header_id).await?;

    let returns = header::count_returns_against(conn, header_id).await?;
    if returns > 0 {
        return Err(CoreError::conflict(format!(
            "{} has {} return(s) recorded against it",
            header_id, returns
        ))
        .into());
    }

    let strategy = LineStrategy::for_kind(target.kind);
    let now = ctx.now();
    let items = item::list_for_header(conn, header_id).await?;
    for line in &items {
        lines::remove_line(conn, &target, strategy, line, now).await?;
    }

    reports::delete_report(conn, header_id).await?;
    header::delete_header(conn, header_id).await?;

    if target.kind == TransactionKind::Sale {
        reports::sync_daily_profit(conn, ctx, target.txn_date, &target.branch_id, &target.user_id)
            .await?;
    }

    info!(header_id = %header_id, kind = %target.kind, lines = items.len(), "Header deleted");
    Ok(target)
}

// =============================================================================
// Helpers
// =============================================================================

fn checked_discount(kind: TransactionKind, discount: Option<Money>) -> LedgerResult<Money> {
    let discount = discount.unwrap_or_else(Money::zero);
    validate_amount("discount", discount)?;

    if kind != TransactionKind::Sale && !discount.is_zero() {
        return Err(ValidationError::InvalidFormat {
            field: "discount".to_string(),
            reason: format!("{} headers cannot carry a discount", kind),
        }
        .into());
    }
    Ok(discount)
}

/// Returns need an origin header of the matching kind in the same branch;
/// every other kind must not name one.
async fn checked_origin(
    conn: &mut SqliteConnection,
    request: &NewHeader,
) -> LedgerResult<Option<Header>> {
    let origin_id = clean_id(request.origin_id.as_deref());

    let Some(expected) = request.kind.origin_kind() else {
        if origin_id.is_some() {
            return Err(ValidationError::InvalidFormat {
                field: "origin_id".to_string(),
                reason: format!("{} headers have no origin", request.kind),
            }
            .into());
        }
        return Ok(None);
    };

    let origin_id = origin_id.ok_or_else(|| ValidationError::Required {
        field: "origin_id".to_string(),
    })?;
    let origin = load_header(conn, origin_id).await?;

    if origin.branch_id != request.branch_id {
        return Err(LedgerError::not_found(
            "Header",
            format!("{} in branch {}", origin_id, request.branch_id),
        ));
    }
    if origin.kind != expected {
        return Err(ValidationError::InvalidFormat {
            field: "origin_id".to_string(),
            reason: format!("{} must reference a {} header, got {}", request.kind, expected, origin.kind),
        }
        .into());
    }

    Ok(Some(origin))
}

/// Supplier and member for a new header; each kind records at most one.
///
/// A return falls back to its origin's counterparty and may not name a
/// different one. A sale that names no member records the branch's
/// walk-in member.
async fn checked_counterparty(
    conn: &mut SqliteConnection,
    request: &NewHeader,
    origin: Option<&Header>,
) -> LedgerResult<(Option<String>, Option<String>)> {
    let supplier_id = clean_id(request.supplier_id.as_deref());
    let member_id = clean_id(request.member_id.as_deref());
    let allowed = request.kind.counterparty();

    for (party, id) in [(Counterparty::Supplier, supplier_id), (Counterparty::Member, member_id)] {
        if id.is_some() && allowed != Some(party) {
            return Err(misplaced_counterparty(request.kind, party));
        }
    }

    let Some(party) = allowed else {
        return Ok((None, None));
    };
    let requested = match party {
        Counterparty::Supplier => supplier_id,
        Counterparty::Member => member_id,
    };

    let resolved = match origin {
        Some(origin) => {
            let recorded = counterparty_of(origin, party);
            match requested {
                Some(id) if recorded.is_some_and(|r| r != id) => {
                    return Err(ValidationError::InvalidFormat {
                        field: party.field().to_string(),
                        reason: format!("must match {} on origin {}", party.field(), origin.id),
                    }
                    .into());
                }
                Some(id) => Some(id.to_string()),
                None => recorded.map(str::to_string),
            }
        }
        None => match (party, requested) {
            (_, Some(id)) => Some(id.to_string()),
            (Counterparty::Member, None) => {
                branch::fetch_branch(conn, &request.branch_id)
                    .await?
                    .ok_or_else(|| LedgerError::not_found("Branch", &request.branch_id))?
                    .default_member_id
            }
            (Counterparty::Supplier, None) => None,
        },
    };

    Ok(match party {
        Counterparty::Supplier => (resolved, None),
        Counterparty::Member => (None, resolved),
    })
}

fn counterparty_of(header: &Header, party: Counterparty) -> Option<&str> {
    match party {
        Counterparty::Supplier => header.supplier_id.as_deref(),
        Counterparty::Member => header.member_id.as_deref(),
    }
}

fn misplaced_counterparty(kind: TransactionKind, party: Counterparty) -> LedgerError {
    ValidationError::InvalidFormat {
        field: party.field().to_string(),
        reason: format!("{} headers cannot set {}", kind, party.field()),
    }
    .into()
}

fn clean_id(id: Option<&str>) -> Option<&str> {
    id.map(str::trim).filter(|id| !id.is_empty())
}

fn clean_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Unit Tests
// =============================================================================
