//! # Legacy Storage Commands
//!
//! Admin-facing import and export of browser storage dumps.
//!
//! ```text
//! import_local_storage(map) ──► lowlow_db::legacy::import_snapshot
//!                                (one transaction, ids deduplicated)
//!                           ──► admin session re-saved
//!
//! export_local_storage()    ──► users, orders, products_<id>, userCards_<id>,
//!                               companyOrders_<id>, partnershipRequests,
//!                               currentUser, schemaVersion
//! ```
//!
//! A dump may carry its own `currentUser`. Through these commands the admin
//! who runs the import stays logged in; the `lowlow` binary uses
//! [`MarketContext::import_snapshot`] instead, which adopts it.

use tracing::info;

use crate::context::MarketContext;
use crate::error::ApiError;
use lowlow_core::Role;
use lowlow_db::legacy::{self, ImportReport, Snapshot};

pub async fn import_local_storage(
    ctx: &MarketContext,
    snapshot: Snapshot,
) -> Result<ImportReport, ApiError> {
    let admin = ctx.require_role(Role::Admin, "import data")?;

    let report =
        legacy::import_snapshot(ctx.db(), &snapshot, &ctx.config().import_options()).await?;

    let admin = ctx.db().users().require(&admin.id).await?;
    ctx.start_session(admin).await?;

    info!(
        users = report.users,
        orders = report.orders,
        skipped = report.skipped,
        "Browser storage imported by admin"
    );
    Ok(report)
}

pub async fn export_local_storage(ctx: &MarketContext) -> Result<Snapshot, ApiError> {
    ctx.require_role(Role::Admin, "export data")?;
    Ok(legacy::export_snapshot(ctx.db()).await?)
}
