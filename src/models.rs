use serde::{Deserialize, Serialize};

/// Axis-aligned box in pixel coordinates of the original image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> i32 {
        self.y2.saturating_sub(self.y1)
    }

    /// A box is well formed when it has a positive extent on both axes
    pub fn is_valid(&self) -> bool {
        self.x1 < self.x2 && self.y1 < self.y2
    }
}

impl From<[i32; 4]> for BoundingBox {
    fn from([x1, y1, x2, y2]: [i32; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<BoundingBox> for [i32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// One object predicted by the detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }

    pub fn category(&self) -> Option<Category> {
        Category::from_label(&self.label)
    }

    /// Text drawn on the label background, e.g. `Matang 92%`
    pub fn caption(&self) -> String {
        format!("{} {}%", self.label, percent(self.confidence as f64))
    }
}

/// Rounds a [0, 1] ratio to a whole percentage, ties to even: `0.125` is
/// `12` and `0.375` is `38`.
pub fn percent(ratio: f64) -> i64 {
    (ratio * 100.0).round_ties_even() as i64
}

/// Widens a detector confidence to the `f64` with the same shortest decimal
/// form, so `0.92f32` is stored as `0.92` rather than `0.9200000166893005`.
pub fn widen_confidence(confidence: f32) -> f64 {
    confidence
        .to_string()
        .parse()
        .unwrap_or(confidence as f64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Matang,
    Mentah,
    Berbunga,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Matang, Category::Mentah, Category::Berbunga];

    /// Maps a detector label to its category key.
    ///
    /// Only case is normalized; surrounding whitespace is kept, so `" matang"`
    /// does not match.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_lowercase().as_str() {
            "matang" => Some(Category::Matang),
            "mentah" => Some(Category::Mentah),
            "berbunga" => Some(Category::Berbunga),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Category::Matang => "matang",
            Category::Mentah => "mentah",
            Category::Berbunga => "berbunga",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Category::Matang => "Matang",
            Category::Mentah => "Mentah",
            Category::Berbunga => "Berbunga",
        }
    }
}

/// Per-category detection counts for a single prediction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub matang: u32,
    pub mentah: u32,
    pub berbunga: u32,
}

impl CategoryStats {
    pub fn from_detections(detections: &[Detection]) -> Self {
        let mut stats = Self::default();
        for detection in detections {
            if let Some(category) = detection.category() {
                stats.record(category);
            }
        }
        stats
    }

    pub fn record(&mut self, category: Category) {
        match category {
            Category::Matang => self.matang += 1,
            Category::Mentah => self.mentah += 1,
            Category::Berbunga => self.berbunga += 1,
        }
    }

    pub fn get(&self, category: Category) -> u32 {
        match category {
            Category::Matang => self.matang,
            Category::Mentah => self.mentah,
            Category::Berbunga => self.berbunga,
        }
    }

    pub fn total(&self) -> u32 {
        self.matang + self.mentah + self.berbunga
    }
}

/// Highest-confidence detection; the first one wins on ties.
pub fn top_detection(detections: &[Detection]) -> Option<&Detection> {
    detections.iter().fold(None, |best: Option<&Detection>, d| match best {
        Some(b) if b.confidence >= d.confidence => Some(b),
        _ => Some(d),
    })
}
