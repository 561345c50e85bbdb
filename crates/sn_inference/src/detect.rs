use sn_core::{Error, LanguageDetector, Result};

#[derive(Debug, Default, Clone, Copy)]
struct ScriptCounts {
    hangul: usize,
    kana: usize,
    han: usize,
    cyrillic: usize,
    latin: usize,
}

impl ScriptCounts {
    fn of(text: &str) -> Self {
        let mut counts = Self::default();
        for c in text.chars() {
            match c {
                '\u{AC00}'..='\u{D7A3}' | '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}' => counts.hangul += 1,
                '\u{3040}'..='\u{30FF}' => counts.kana += 1,
                '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' => counts.han += 1,
                '\u{0400}'..='\u{04FF}' => counts.cyrillic += 1,
                c if c.is_ascii_alphabetic() => counts.latin += 1,
                '\u{00C0}'..='\u{024F}' => counts.latin += 1,
                _ => {}
            }
        }
        counts
    }
}

/// Classifies text by its dominant Unicode script.
///
/// Han characters count as Japanese once any kana appear, since Japanese
/// prose mixes both.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptDetector;

impl ScriptDetector {
    pub fn new() -> Self {
        Self
    }
}

impl LanguageDetector for ScriptDetector {
    fn detect(&self, text: &str) -> Result<String> {
        let counts = ScriptCounts::of(text);
        let (japanese, chinese) = if counts.kana > 0 {
            (counts.kana + counts.han, 0)
        } else {
            (0, counts.han)
        };

        [
            ("ko", counts.hangul),
            ("ja", japanese),
            ("zh", chinese),
            ("ru", counts.cyrillic),
            ("en", counts.latin),
        ]
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .max_by_key(|(_, count)| *count)
        .map(|(code, _)| code.to_string())
        .ok_or_else(|| Error::Inference("no letters to detect a language from".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_scripts() {
        let detector = ScriptDetector::new();
        assert_eq!(detector.detect("랜섬웨어 조직이 국내 기업을 공격했다").unwrap(), "ko");
        assert_eq!(detector.detect("Ransomware gang hits hospital").unwrap(), "en");
        assert_eq!(detector.detect("ランサムウェア攻撃が発生").unwrap(), "ja");
        assert_eq!(detector.detect("勒索软件攻击医院").unwrap(), "zh");
        assert_eq!(detector.detect("Атака программы-вымогателя").unwrap(), "ru");
    }

    #[test]
    fn test_mixed_text_uses_dominant_script() {
        let detector = ScriptDetector::new();
        assert_eq!(detector.detect("MS 보안 업데이트로 취약점 패치 완료").unwrap(), "ko");
        assert_eq!(detector.detect("CISA adds 3 CVEs (랜섬) to its catalog").unwrap(), "en");
    }

    #[test]
    fn test_no_letters_is_an_error() {
        assert!(ScriptDetector::new().detect("2024-05-10 12:00 !!").is_err());
        assert!(ScriptDetector::new().detect("").is_err());
    }
}
