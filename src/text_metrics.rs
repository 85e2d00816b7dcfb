use fontdb::{Database, Family, ID, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

static SHARED_METRICS: Lazy<FontMetrics> = Lazy::new(FontMetrics::new);

/// Font size plus a CSS-style family list, e.g. `14px Inter, sans-serif`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontSpec {
    pub size: f32,
    pub family: String,
}

impl FontSpec {
    pub fn new(size: f32, family: impl Into<String>) -> Self {
        Self {
            size,
            family: family.into(),
        }
    }

    /// Shorthand understood by canvas contexts.
    pub fn css(&self) -> String {
        format!("{}px {}", self.size, self.family)
    }
}

/// Anything able to report the advance width of a run of text.
pub trait TextMeasure {
    fn text_width(&self, text: &str, font: &FontSpec) -> f32;
}

impl<T: TextMeasure + ?Sized> TextMeasure for &T {
    fn text_width(&self, text: &str, font: &FontSpec) -> f32 {
        (**self).text_width(text, font)
    }
}

/// Character-class approximation; deterministic and font independent.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApproxMetrics;

impl TextMeasure for ApproxMetrics {
    fn text_width(&self, text: &str, font: &FontSpec) -> f32 {
        approx_text_width(text, font.size)
    }
}

pub fn approx_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(approx_char_factor).sum::<f32>() * font_size
}

fn approx_char_factor(ch: char) -> f32 {
    match ch {
        '\n' => 0.0,
        ' ' => 0.28,
        'i' | 'j' | 'l' | 'I' | '!' | '|' | '.' | ',' | ':' | ';' | '\'' => 0.26,
        'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '-' => 0.36,
        'm' | 'w' => 0.84,
        'M' | 'W' | '@' | '%' => 0.92,
        c if c.is_ascii_uppercase() => 0.66,
        c if c.is_ascii_digit() => 0.58,
        c if c.is_ascii() => 0.54,
        // CJK and other wide scripts
        c if (c as u32) >= 0x2E80 => 1.0,
        _ => 0.6,
    }
}

/// Measures text with real font advances looked up through the system font
/// database, falling back to [`ApproxMetrics`] when no face matches.
pub struct FontMetrics {
    inner: Mutex<FontDatabase>,
}

impl FontMetrics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(FontDatabase::new()),
        }
    }

    /// Process-wide instance; loading system fonts is only paid once.
    pub fn shared() -> &'static FontMetrics {
        &SHARED_METRICS
    }
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl TextMeasure for FontMetrics {
    fn text_width(&self, text: &str, font: &FontSpec) -> f32 {
        if text.is_empty() || font.size <= 0.0 {
            return 0.0;
        }
        let measured = self
            .inner
            .lock()
            .ok()
            .and_then(|mut db| db.measure(text, font));
        measured.unwrap_or_else(|| approx_text_width(text, font.size))
    }
}

struct FontDatabase {
    db: Database,
    loaded_system_fonts: bool,
    faces: HashMap<String, Option<LoadedFace>>,
}

impl FontDatabase {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            faces: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font: &FontSpec) -> Option<f32> {
        let key = normalize_family_key(&font.family);
        if !self.faces.contains_key(&key) {
            let face = self.load_face(&key);
            if face.is_none() {
                tracing::debug!(family = %key, "no font face found, using approximate metrics");
            }
            self.faces.insert(key.clone(), face);
        }
        let face = self.faces.get_mut(&key)?.as_mut()?;
        face.measure(text, font.size)
    }

    fn load_face(&mut self, family_list: &str) -> Option<LoadedFace> {
        let names: Vec<String> = family_list
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\'').to_string())
            .filter(|part| !part.is_empty())
            .collect();
        let mut families: Vec<Family<'_>> = names.iter().map(|name| generic_family(name)).collect();
        if families.is_empty() {
            families.push(Family::SansSerif);
        }

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id: ID = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| LoadedFace::parse(data.to_vec(), index))
            .flatten()
    }
}

fn generic_family(name: &str) -> Family<'_> {
    match name.to_ascii_lowercase().as_str() {
        "serif" => Family::Serif,
        "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => Family::SansSerif,
        "monospace" | "ui-monospace" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        _ => Family::Name(name),
    }
}

fn normalize_family_key(font_family: &str) -> String {
    let trimmed = font_family.trim();
    if trimmed.is_empty() {
        "sans-serif".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Owned font bytes plus a per-character advance cache, in font units.
struct LoadedFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: u16,
    advances: HashMap<char, Option<u16>>,
}

impl LoadedFace {
    fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
        let units_per_em = Face::parse(&data, index).ok()?.units_per_em().max(1);
        Some(Self {
            data,
            index,
            units_per_em,
            advances: HashMap::new(),
        })
    }

    fn measure(&mut self, text: &str, font_size: f32) -> Option<f32> {
        let missing: Vec<char> = text
            .chars()
            .filter(|ch| !self.advances.contains_key(ch))
            .collect();
        if !missing.is_empty() {
            let face = Face::parse(&self.data, self.index).ok()?;
            for ch in missing {
                let advance = face
                    .glyph_index(ch)
                    .and_then(|glyph| face.glyph_hor_advance(glyph));
                self.advances.insert(ch, advance);
            }
        }

        let scale = font_size / self.units_per_em as f32;
        let mut width = 0.0f32;
        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            match self.advances.get(&ch).copied().flatten() {
                Some(advance) => width += advance as f32 * scale,
                None => width += approx_char_factor(ch) * font_size,
            }
        }
        Some(width.max(0.0))
    }
}
