//! Deep merge of site configuration objects.

use serde_json::Value;
use sitekit_core::SiteConfig;

/// Merge `overlay` into `base`.
///
/// Objects merge per key; any other value from the overlay replaces the
/// base value, arrays included.
pub fn deep_merge(base: &mut SiteConfig, overlay: &SiteConfig) {
    for (key, overlay_val) in overlay {
        match (base.get_mut(key), overlay_val) {
            (Some(Value::Object(base_obj)), Value::Object(overlay_obj)) => {
                deep_merge(base_obj, overlay_obj);
            },
            _ => {
                base.insert(key.clone(), overlay_val.clone());
            },
        }
    }
}

/// Merge `layers` in order, later layers winning.
#[must_use]
pub fn merge_layers<'a, I>(layers: I) -> SiteConfig
where
    I: IntoIterator<Item = &'a SiteConfig>,
{
    let mut merged = SiteConfig::new();
    for layer in layers {
        deep_merge(&mut merged, layer);
    }
    merged
}
