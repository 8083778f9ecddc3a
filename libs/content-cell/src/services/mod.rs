pub mod banners;
pub mod clinic_info;
pub mod flashcards;

pub use banners::BannerService;
pub use clinic_info::ClinicInfoService;
pub use flashcards::FlashcardService;

use serde_json::Value;

use shared_database::{Collection, Database, ListQuery, Record, StoreError};

/// Position after the current last item. Gaps left by deletes are kept.
pub(crate) async fn next_display_order(db: &Database, collection: Collection) -> Result<i64, StoreError> {
    let query = ListQuery::new().order_desc("display_order");
    let last: Option<Record<Value>> = db.find_first(collection, query).await?;

    Ok(last
        .and_then(|row| row.data.get("display_order").and_then(Value::as_i64))
        .map_or(0, |order| order + 1))
}
