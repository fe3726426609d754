//! Text encoding detection and recovery for uploaded CSV files.
//!
//! Uploads come from spreadsheet exports of unknown origin. Valid UTF-8 (with
//! or without BOM) is taken as is; anything else goes through statistical
//! detection, steered by the region of the configured fallback encoding. When
//! the detector is unsure, the regional fallback wins.

use chardetng::EncodingDetector;
use encoding_rs::{
    Encoding, IBM866, ISO_8859_2, ISO_8859_5, ISO_8859_7, KOI8_R, KOI8_U, UTF_8, WINDOWS_1250,
    WINDOWS_1251, WINDOWS_1252, WINDOWS_1253, X_MAC_CYRILLIC,
};
use tracing::{debug, info, warn};

use crate::config::{Config, DEFAULT_MIN_CONFIDENCE};
use crate::error::{Error, Result};

/// Tried in order when the chosen encoding cannot decode the buffer.
/// `WINDOWS_1252` is what the `iso-8859-1` label resolves to.
fn fallback_chain() -> [&'static Encoding; 3] {
    [WINDOWS_1251, WINDOWS_1252, UTF_8]
}

/// chardetng gives no numeric score, only a guess and whether it beat the
/// competition. A guess counts as confident when it is assessed, backed by
/// enough non-ASCII evidence and consistent with the region.
const CONFIDENT: f32 = 0.9;
const UNSURE: f32 = 0.3;

/// Fewer non-ASCII bytes than this and any statistical guess is noise.
const MIN_EVIDENCE_BYTES: usize = 16;

/// Script region a fallback encoding belongs to. Supplies the top-level
/// domain hint for chardetng and the encodings that agree with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Cyrillic,
    Greek,
    CentralEuropean,
}

impl Region {
    fn of(encoding: &'static Encoding) -> Option<Self> {
        if Self::Cyrillic.encodings().contains(&encoding) {
            Some(Self::Cyrillic)
        } else if Self::Greek.encodings().contains(&encoding) {
            Some(Self::Greek)
        } else if Self::CentralEuropean.encodings().contains(&encoding) {
            Some(Self::CentralEuropean)
        } else {
            None
        }
    }

    fn tld(self) -> &'static [u8] {
        match self {
            Region::Cyrillic => b"ru",
            Region::Greek => b"gr",
            Region::CentralEuropean => b"pl",
        }
    }

    fn encodings(self) -> Vec<&'static Encoding> {
        match self {
            Region::Cyrillic => vec![
                WINDOWS_1251,
                KOI8_R,
                KOI8_U,
                IBM866,
                ISO_8859_5,
                X_MAC_CYRILLIC,
            ],
            Region::Greek => vec![WINDOWS_1253, ISO_8859_7],
            Region::CentralEuropean => vec![WINDOWS_1250, ISO_8859_2],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub encoding: &'static Encoding,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static Encoding,
    /// Set when no encoding decoded cleanly and bad sequences were replaced.
    pub lossy: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct EncodingResolver {
    min_confidence: f32,
    fallback: &'static Encoding,
    region: Option<Region>,
}

impl Default for EncodingResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CONFIDENCE, WINDOWS_1251)
    }
}

impl EncodingResolver {
    pub fn new(min_confidence: f32, fallback: &'static Encoding) -> Self {
        Self {
            min_confidence,
            fallback,
            region: Region::of(fallback),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let label = config.import_fallback_encoding.trim();
        let fallback = Encoding::for_label(label.as_bytes()).ok_or_else(|| {
            Error::Config(format!("Unknown fallback encoding: {}", label))
        })?;
        Ok(Self::new(config.import_min_confidence, fallback))
    }

    pub fn detect(&self, raw: &[u8]) -> Detection {
        if let Some((encoding, _)) = Encoding::for_bom(raw) {
            return Detection {
                encoding,
                confidence: 1.0,
            };
        }
        if std::str::from_utf8(raw).is_ok() {
            return Detection {
                encoding: UTF_8,
                confidence: 1.0,
            };
        }

        let mut detector = EncodingDetector::new();
        detector.feed(raw, true);
        let (unhinted, _) = detector.guess_assess(None, false);
        let (encoding, assessed) = detector.guess_assess(self.region.map(Region::tld), false);

        let evidence = raw.iter().filter(|byte| !byte.is_ascii()).count();
        let consistent = match self.region {
            Some(region) => encoding == unhinted || region.encodings().contains(&encoding),
            None => true,
        };
        let confident = assessed && consistent && evidence >= MIN_EVIDENCE_BYTES;
        debug!(
            hinted = encoding.name(),
            unhinted = unhinted.name(),
            assessed,
            evidence,
            "Encoding guess"
        );

        Detection {
            encoding,
            confidence: if confident { CONFIDENT } else { UNSURE },
        }
    }

    /// Decodes `raw` without ever failing; see the module docs for the order
    /// in which encodings are tried.
    pub fn resolve(&self, raw: &[u8]) -> DecodedText {
        let detection = self.detect(raw);
        info!(
            encoding = detection.encoding.name(),
            confidence = detection.confidence,
            "Detected upload encoding"
        );

        let chosen = if detection.confidence < self.min_confidence {
            debug!(
                fallback = self.fallback.name(),
                "Low detection confidence, using regional fallback"
            );
            self.fallback
        } else {
            detection.encoding
        };

        if let Some(text) = decode_strict(chosen, raw) {
            return DecodedText {
                text,
                encoding: chosen,
                lossy: false,
            };
        }

        for encoding in fallback_chain().into_iter().filter(|enc| *enc != chosen) {
            if let Some(text) = decode_strict(encoding, raw) {
                info!(
                    from = chosen.name(),
                    to = encoding.name(),
                    "Decoding failed, recovered with fallback encoding"
                );
                return DecodedText {
                    text,
                    encoding,
                    lossy: false,
                };
            }
        }

        warn!("No encoding decoded the upload cleanly, replacing unreadable bytes");
        let (text, _) = UTF_8.decode_with_bom_removal(raw);
        DecodedText {
            text: text.into_owned(),
            encoding: UTF_8,
            lossy: true,
        }
    }
}

/// Decodes with `encoding`, stripping a matching BOM, or `None` on any
/// malformed sequence.
fn decode_strict(encoding: &'static Encoding, raw: &[u8]) -> Option<String> {
    let body = match Encoding::for_bom(raw) {
        Some((bom_encoding, bom_len)) if bom_encoding == encoding => &raw[bom_len..],
        _ => raw,
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|text| text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUSSIAN: &str = "area_id,area_nm\n\
        1,Москва и Московская область\n\
        2,Санкт-Петербург и Ленинградская область\n\
        3,Новосибирская область, город Новосибирск\n\
        4,Екатеринбург, Свердловская область\n\
        5,Республика Татарстан, Казань\n\
        6,Нижегородская область, Нижний Новгород\n";

    fn cp1251(text: &str) -> Vec<u8> {
        let (bytes, _, unmappable) = WINDOWS_1251.encode(text);
        assert!(!unmappable);
        bytes.into_owned()
    }

    #[test]
    fn utf8_is_taken_verbatim() {
        let resolver = EncodingResolver::default();
        let decoded = resolver.resolve(RUSSIAN.as_bytes());
        assert_eq!(decoded.text, RUSSIAN);
        assert_eq!(decoded.encoding, UTF_8);
        assert!(!decoded.lossy);
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let mut raw = vec![0xEF, 0xBB, 0xBF];
        raw.extend_from_slice("area_id,area_nm\n1,Москва\n".as_bytes());

        let decoded = EncodingResolver::default().resolve(&raw);
        assert_eq!(decoded.text, "area_id,area_nm\n1,Москва\n");
    }

    #[test]
    fn windows_1251_is_detected() {
        let raw = cp1251(RUSSIAN);
        let decoded = EncodingResolver::default().resolve(&raw);
        assert_eq!(decoded.text, RUSSIAN);
        assert_eq!(decoded.encoding, WINDOWS_1251);
    }

    #[test]
    fn short_cyrillic_file_uses_regional_fallback() {
        let text = "area_id,area_nm\n1,Омск\n";
        let raw = cp1251(text);
        let resolver = EncodingResolver::default();

        let detection = resolver.detect(&raw);
        assert!(detection.confidence < DEFAULT_MIN_CONFIDENCE);

        let decoded = resolver.resolve(&raw);
        assert_eq!(decoded.text, text);
        assert_eq!(decoded.encoding, WINDOWS_1251);
        assert!(!decoded.lossy);
    }

    #[test]
    fn short_cyrillic_names_survive_default_detection() {
        for name in ["Омск", "Уфа", "Томск", "Пермь", "Курск", "Тверь"] {
            let text = format!("employer_id,employer_nm\n7,{}\n", name);
            let decoded = EncodingResolver::default().resolve(&cp1251(&text));
            assert_eq!(decoded.text, text);
        }
    }

    #[test]
    fn fallback_region_follows_configured_encoding() {
        assert_eq!(Region::of(WINDOWS_1251), Some(Region::Cyrillic));
        assert_eq!(Region::of(KOI8_R), Some(Region::Cyrillic));
        assert_eq!(Region::of(WINDOWS_1250), Some(Region::CentralEuropean));
        assert_eq!(Region::of(WINDOWS_1252), None);
    }

    #[test]
    fn undecodable_choice_moves_down_the_chain() {
        // 0xC3 0x28 is not valid UTF-8 but is valid windows-1251.
        let resolver = EncodingResolver::new(1.5, UTF_8);

        let decoded = resolver.resolve(&[0xC3, 0x28]);
        assert_eq!(decoded.text, "Г(");
        assert_eq!(decoded.encoding, WINDOWS_1251);
        assert!(!decoded.lossy);
    }

    #[test]
    fn unknown_fallback_label_is_a_config_error() {
        let config = Config {
            server_address: "127.0.0.1:0".into(),
            database_url: "postgres://localhost/test".into(),
            db_max_connections: 10,
            db_acquire_timeout_secs: 30,
            import_min_confidence: 0.7,
            import_fallback_encoding: "no-such-charset".into(),
            import_require_all_files: true,
            max_upload_bytes: 1024,
        };
        assert!(matches!(
            EncodingResolver::from_config(&config),
            Err(Error::Config(_))
        ));
    }
}
