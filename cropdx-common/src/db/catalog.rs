//! Default disease catalog
//!
//! Three demo diseases are inserted the first time a detection runs against
//! an empty catalog. Seeding goes through `get_or_create_disease`, so a
//! second run never duplicates rows.

use crate::db::diseases::{count_diseases, get_or_create_disease};
use crate::db::models::NewDisease;
use crate::db::settings::set_setting;
use crate::Result;
use chrono::Utc;
use once_cell::sync::Lazy;
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::info;

/// Serializes concurrent seeding attempts within the process
static SEED_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Settings key recording when the catalog was seeded
pub const CATALOG_SEEDED_AT_KEY: &str = "catalog_seeded_at";

/// The built-in catalog entries
pub fn default_catalog() -> Vec<NewDisease> {
    vec![
        NewDisease {
            name: "Banana Bacterial Wilt".to_string(),
            species: "Banana".to_string(),
            description: "Bacterial disease causing wilting and yellowing.".to_string(),
            treatment: "Rogue infected plants, sanitize tools, use clean planting material."
                .to_string(),
            healthy_image_url: "https://images.unsplash.com/photo-1598033129183-c4f50c736f10?q=80&w=1200&auto=format&fit=crop".to_string(),
            care_tips: "Maintain field hygiene; use resistant varieties; avoid tool sharing between fields.".to_string(),
        },
        NewDisease {
            name: "Maize Leaf Blight".to_string(),
            species: "Maize".to_string(),
            description: "Fungal leaf spots reducing photosynthesis.".to_string(),
            treatment: "Rotate crops, remove residue, apply recommended fungicide if severe."
                .to_string(),
            healthy_image_url: "https://images.unsplash.com/photo-1512621776951-a57141f2eefd?q=80&w=1200&auto=format&fit=crop".to_string(),
            care_tips: "Ensure spacing for airflow; balanced fertilization; timely weeding."
                .to_string(),
        },
        NewDisease {
            name: "Potato Late Blight".to_string(),
            species: "Potato".to_string(),
            description: "Oomycete disease causing dark lesions on leaves and tubers.".to_string(),
            treatment: "Use certified seed, ensure airflow, apply protective fungicide as advised."
                .to_string(),
            healthy_image_url: "https://images.unsplash.com/photo-1506806732259-39c2d0268443?q=80&w=1200&auto=format&fit=crop".to_string(),
            care_tips: "Avoid overhead irrigation late in day; remove infected leaves; monitor weather alerts.".to_string(),
        },
    ]
}

/// Insert the default catalog if the diseases table is empty
///
/// Returns the number of rows inserted (0 when the catalog already had data).
pub async fn seed_catalog_if_empty(pool: &SqlitePool) -> Result<usize> {
    let _guard = SEED_LOCK.lock().await;

    if count_diseases(pool).await? > 0 {
        return Ok(0);
    }

    let mut inserted = 0;
    for disease in default_catalog() {
        let (_, created) = get_or_create_disease(pool, &disease).await?;
        if created {
            inserted += 1;
        }
    }

    set_setting(pool, CATALOG_SEEDED_AT_KEY, &Utc::now().to_rfc3339()).await?;
    info!("Seeded disease catalog with {} entries", inserted);

    Ok(inserted)
}
