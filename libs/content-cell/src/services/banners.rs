use tracing::info;
use uuid::Uuid;

use shared_database::{Collection, Database, Filter, ListQuery};

use super::next_display_order;
use crate::models::{Banner, BannerFields, ContentError, CreateBannerRequest};

const PUBLIC_BANNER_LIMIT: usize = 10;

pub struct BannerService {
    db: Database,
}

impl BannerService {
    pub fn new(db: &Database) -> Self {
        Self { db: db.clone() }
    }

    /// Banners for the home carousel, in display order.
    pub async fn list_active(&self) -> Result<Vec<Banner>, ContentError> {
        let query = ListQuery::new()
            .filter(Filter::eq("is_active", true))
            .order_asc("display_order")
            .limit(PUBLIC_BANNER_LIMIT);
        Ok(self.db.find(Collection::Banners, &query).await?)
    }

    pub async fn list_all(&self) -> Result<Vec<Banner>, ContentError> {
        let query = ListQuery::new().order_asc("display_order");
        Ok(self.db.find(Collection::Banners, &query).await?)
    }

    /// Add a banner at the end of the display order.
    pub async fn create(&self, request: CreateBannerRequest) -> Result<Banner, ContentError> {
        let image_url = request.image_url.trim();
        if image_url.is_empty() {
            return Err(ContentError::ValidationError("Image URL is required".to_string()));
        }

        let display_order = next_display_order(&self.db, Collection::Banners).await?;
        let fields = BannerFields {
            image_url: image_url.to_string(),
            display_order,
            is_active: true,
        };

        let banner = self.db.create(Collection::Banners, &fields).await?;
        info!("Banner {} added at position {}", banner.id, display_order);
        Ok(banner)
    }

    pub async fn delete(&self, banner_id: Uuid) -> Result<(), ContentError> {
        self.db
            .remove(Collection::Banners, banner_id)
            .await
            .map_err(|e| if e.is_not_found() { ContentError::NotFound("Banner") } else { e.into() })?;

        info!("Banner {} deleted", banner_id);
        Ok(())
    }
}
