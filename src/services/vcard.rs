// vCard 3.0 generation for the contact card download.
//
// The card text is a pure function of the profile, the language, and the
// optional photo bytes; the service only adds photo loading from disk.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tracing::debug;

use crate::app_config::ContactProfile;

/// Card language; unknown values fall back to English
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    En,
    Tr,
}

impl Language {
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("tr") => Language::Tr,
            _ => Language::En,
        }
    }
}

/// Build the vCard text. The photo is embedded as base64 when provided,
/// otherwise referenced by the fallback URL.
pub fn generate_vcard(profile: &ContactProfile, lang: Language, photo: Option<&[u8]>) -> String {
    let (title, location, note) = match lang {
        Language::En => (
            profile.title_en.as_str(),
            profile.location_en.as_str(),
            "Added from digital business card",
        ),
        Language::Tr => (
            profile.title_tr.as_str(),
            profile.location_tr.as_str(),
            "Dijital kartvizitten eklendi",
        ),
    };

    let photo_line = match photo {
        Some(bytes) => format!("PHOTO;ENCODING=b;TYPE=PNG:{}", BASE64.encode(bytes)),
        None => format!("PHOTO;VALUE=uri:{}", profile.photo_fallback_url),
    };

    let lines = [
        "BEGIN:VCARD".to_string(),
        "VERSION:3.0".to_string(),
        format!("FN:{}", profile.full_name),
        format!("N:{};;;;", profile.full_name),
        format!("ORG:{}", profile.organization),
        format!("TITLE:{}", title),
        format!("TEL;TYPE=WORK,VOICE:{}", profile.phone_primary),
        format!("TEL;TYPE=WORK,VOICE:{}", profile.phone_secondary),
        format!("URL:{}", profile.website_primary),
        format!("URL:{}", profile.website_secondary),
        format!("ADR;TYPE=WORK:;;{};;;;", location),
        format!("X-SOCIALPROFILE;TYPE=instagram:{}", profile.instagram_url),
        format!("NOTE:{}", note),
        photo_line,
        "END:VCARD".to_string(),
    ];

    lines.join("\n")
}

#[derive(Clone)]
pub struct VCardService {
    profile: ContactProfile,
}

impl VCardService {
    pub fn new(profile: ContactProfile) -> Self {
        Self { profile }
    }

    /// Render the card, embedding the profile photo when it can be read.
    /// A missing or unreadable photo degrades to the fallback URL.
    pub async fn render(&self, lang: Language) -> String {
        let photo = match &self.profile.photo_path {
            Some(path) => match tokio::fs::read(path).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    debug!(path = %path, error = %e, "Profile photo unreadable, using fallback URL");
                    None
                }
            },
            None => None,
        };

        generate_vcard(&self.profile, lang, photo.as_deref())
    }

    /// Download filename derived from the contact's name
    pub fn filename(&self) -> String {
        format!("{}.vcf", self.profile.full_name.replace(' ', "-"))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_profile() -> ContactProfile {
        ContactProfile {
            full_name: "Ada Example".to_string(),
            organization: "Example Co".to_string(),
            title_en: "digital business cards".to_string(),
            title_tr: "dijital kartvizitler".to_string(),
            phone_primary: "+974 5000 0000".to_string(),
            phone_secondary: "+90 530 000 00 00".to_string(),
            website_primary: "https://www.example.com".to_string(),
            website_secondary: "https://www.example.com.tr".to_string(),
            location_en: "Doha, Qatar".to_string(),
            location_tr: "Doha, Katar".to_string(),
            instagram_url: "https://www.instagram.com/example/".to_string(),
            photo_path: None,
            photo_fallback_url: "https://cdn.example.com/profile.png".to_string(),
        }
    }

    #[test]
    fn card_has_the_envelope_and_exactly_two_phones_and_urls() {
        let card = generate_vcard(&test_profile(), Language::En, None);
        let lines: Vec<&str> = card.lines().collect();

        assert_eq!(lines.first(), Some(&"BEGIN:VCARD"));
        assert_eq!(lines.get(1), Some(&"VERSION:3.0"));
        assert_eq!(lines.last(), Some(&"END:VCARD"));

        let tels = lines.iter().filter(|l| l.starts_with("TEL;")).count();
        let urls = lines.iter().filter(|l| l.starts_with("URL:")).count();
        assert_eq!(tels, 2);
        assert_eq!(urls, 2);
    }

    #[test]
    fn languages_differ_only_in_localized_fields() {
        let profile = test_profile();
        let en = generate_vcard(&profile, Language::En, None);
        let tr = generate_vcard(&profile, Language::Tr, None);

        assert!(en.contains("TITLE:digital business cards"));
        assert!(tr.contains("TITLE:dijital kartvizitler"));
        assert!(en.contains("ADR;TYPE=WORK:;;Doha, Qatar;;;;"));
        assert!(tr.contains("ADR;TYPE=WORK:;;Doha, Katar;;;;"));

        // Everything not localized is byte-identical
        for (en_line, tr_line) in en.lines().zip(tr.lines()) {
            let localized = en_line.starts_with("TITLE:")
                || en_line.starts_with("ADR;")
                || en_line.starts_with("NOTE:");
            if !localized {
                assert_eq!(en_line, tr_line);
            }
        }
    }

    #[test]
    fn photo_bytes_are_embedded_as_base64() {
        let card = generate_vcard(&test_profile(), Language::En, Some(&[1, 2, 3]));
        assert!(card.contains(&format!(
            "PHOTO;ENCODING=b;TYPE=PNG:{}",
            BASE64.encode([1, 2, 3])
        )));
        assert!(!card.contains("PHOTO;VALUE=uri:"));
    }

    #[test]
    fn missing_photo_falls_back_to_the_remote_url() {
        let card = generate_vcard(&test_profile(), Language::En, None);
        assert!(card.contains("PHOTO;VALUE=uri:https://cdn.example.com/profile.png"));
    }

    #[test]
    fn unknown_language_defaults_to_english() {
        assert_eq!(Language::from_query(Some("tr")), Language::Tr);
        assert_eq!(Language::from_query(Some("en")), Language::En);
        assert_eq!(Language::from_query(Some("de")), Language::En);
        assert_eq!(Language::from_query(None), Language::En);
    }

    #[test]
    fn filename_comes_from_the_contact_name() {
        let service = VCardService::new(test_profile());
        assert_eq!(service.filename(), "Ada-Example.vcf");
    }
}
