//! Store-wide settings and the partial-update patch applied to them.
//!
//! [`StoreSettings`] is the full configuration object served by
//! `GET /settings`. [`SettingsPatch`] is its all-optional mirror, used both
//! as the `PUT /settings` write payload and as the shape of out-of-band push
//! updates merged into a cached copy without a refetch.

use serde::{Deserialize, Serialize};

use super::price::{CurrencyCode, Price};

/// Store-wide configuration.
///
/// Every field is defaulted so that a sparse server payload still
/// deserializes; the backend treats missing fields as "not configured".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreSettings {
    pub store_name: String,
    pub tagline: Option<String>,

    // Design
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub logo_url: Option<String>,
    pub favicon_url: Option<String>,

    // Social
    pub instagram_url: Option<String>,
    pub facebook_url: Option<String>,
    pub tiktok_url: Option<String>,

    // Contact
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub store_address: Option<String>,

    // SEO
    pub page_title: Option<String>,
    pub meta_description: Option<String>,

    pub currency: CurrencyCode,
    pub free_delivery_threshold: Option<Price>,
}

impl StoreSettings {
    /// Title to apply to the host document: the explicit SEO page title when
    /// set and non-empty, otherwise the store name.
    #[must_use]
    pub fn document_title(&self) -> &str {
        self.page_title
            .as_deref()
            .filter(|title| !title.is_empty())
            .unwrap_or(&self.store_name)
    }
}

/// Logical settings group, used to summarize what a patch changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsGroup {
    Design,
    Social,
    Contact,
    Seo,
}

impl std::fmt::Display for SettingsGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Design => "Design",
            Self::Social => "Social",
            Self::Contact => "Contact",
            Self::Seo => "SEO",
        })
    }
}

macro_rules! merge_optional {
    ($patch:ident, $settings:ident, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = &$patch.$field {
                $settings.$field = Some(value.clone());
            }
        )+
    };
}

/// All-optional mirror of [`StoreSettings`].
///
/// Absent fields mean "leave as-is"; there is no way to un-set a field
/// through a patch (the backend has the same rule).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiktok_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_delivery_threshold: Option<Price>,
}

impl SettingsPatch {
    /// Whether the patch carries no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Shallow-merge present fields into `settings`, leaving absent fields
    /// untouched.
    pub fn apply_to(&self, settings: &mut StoreSettings) {
        if let Some(store_name) = &self.store_name {
            settings.store_name.clone_from(store_name);
        }
        if let Some(currency) = self.currency {
            settings.currency = currency;
        }
        merge_optional!(
            self,
            settings,
            tagline,
            primary_color,
            secondary_color,
            logo_url,
            favicon_url,
            instagram_url,
            facebook_url,
            tiktok_url,
            contact_email,
            contact_phone,
            store_address,
            page_title,
            meta_description,
            free_delivery_threshold,
        );
    }

    /// The logical groups this patch touches, in a fixed display order.
    #[must_use]
    pub fn changed_groups(&self) -> Vec<SettingsGroup> {
        let mut groups = Vec::new();
        if self.primary_color.is_some()
            || self.secondary_color.is_some()
            || self.logo_url.is_some()
            || self.favicon_url.is_some()
        {
            groups.push(SettingsGroup::Design);
        }
        if self.instagram_url.is_some() || self.facebook_url.is_some() || self.tiktok_url.is_some()
        {
            groups.push(SettingsGroup::Social);
        }
        if self.contact_email.is_some()
            || self.contact_phone.is_some()
            || self.store_address.is_some()
        {
            groups.push(SettingsGroup::Contact);
        }
        if self.page_title.is_some() || self.meta_description.is_some() {
            groups.push(SettingsGroup::Seo);
        }
        groups
    }

    /// Whether applying the patch can change the document title or meta
    /// description (store name is the title fallback, so it counts).
    #[must_use]
    pub const fn touches_document_meta(&self) -> bool {
        self.page_title.is_some() || self.meta_description.is_some() || self.store_name.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_settings() -> StoreSettings {
        StoreSettings {
            store_name: "Bloomery".to_string(),
            tagline: Some("Flowers, daily".to_string()),
            primary_color: Some("#2f4f2f".to_string()),
            contact_email: Some("hello@bloomery.shop".to_string()),
            ..StoreSettings::default()
        }
    }

    #[test]
    fn document_title_prefers_page_title() {
        let mut settings = sample_settings();
        assert_eq!(settings.document_title(), "Bloomery");

        settings.page_title = Some("Bloomery | Fresh flowers".to_string());
        assert_eq!(settings.document_title(), "Bloomery | Fresh flowers");

        // An empty page title falls back to the store name.
        settings.page_title = Some(String::new());
        assert_eq!(settings.document_title(), "Bloomery");
    }

    #[test]
    fn apply_to_merges_present_fields_only() {
        let mut settings = sample_settings();
        let patch = SettingsPatch {
            primary_color: Some("#ffffff".to_string()),
            ..SettingsPatch::default()
        };

        patch.apply_to(&mut settings);

        assert_eq!(settings.primary_color.as_deref(), Some("#ffffff"));
        // Untouched fields survive.
        assert_eq!(settings.store_name, "Bloomery");
        assert_eq!(settings.tagline.as_deref(), Some("Flowers, daily"));
        assert_eq!(settings.contact_email.as_deref(), Some("hello@bloomery.shop"));
    }

    #[test]
    fn changed_groups_reports_touched_groups_in_order() {
        let patch = SettingsPatch {
            favicon_url: Some("/favicon.ico".to_string()),
            contact_phone: Some("+46 70 000 00 00".to_string()),
            meta_description: Some("Fresh flowers delivered".to_string()),
            ..SettingsPatch::default()
        };
        assert_eq!(
            patch.changed_groups(),
            vec![
                SettingsGroup::Design,
                SettingsGroup::Contact,
                SettingsGroup::Seo
            ]
        );
    }

    #[test]
    fn empty_patch_is_empty_and_touches_nothing() {
        let patch = SettingsPatch::default();
        assert!(patch.is_empty());
        assert!(patch.changed_groups().is_empty());
        assert!(!patch.touches_document_meta());
    }

    #[test]
    fn store_name_counts_as_document_meta() {
        let patch = SettingsPatch {
            store_name: Some("Bloomery & Co".to_string()),
            ..SettingsPatch::default()
        };
        assert!(patch.touches_document_meta());
        // But it belongs to no toast group.
        assert!(patch.changed_groups().is_empty());
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let patch = SettingsPatch {
            instagram_url: Some("https://instagram.com/bloomery".to_string()),
            ..SettingsPatch::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!({"instagramUrl": "https://instagram.com/bloomery"})
        );
    }
}
