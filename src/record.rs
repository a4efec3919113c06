use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Kind of a region annotation on an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkingKind {
    /// Informational region, ignored by the export pipeline.
    Hint,
    /// Region that must be kept inside the crop.
    Include,
    /// Region that must be removed by the crop.
    Exclude,
    /// The crop rectangle itself.
    Crop,
}

/// A labeled region annotation. Crop geometry is computed by the export
/// pipeline; the filter engine only reads the resulting facts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Marking {
    /// Label assigned by the detector or the user (e.g. "face", "watermark").
    pub label: String,
    pub kind: MarkingKind,
    /// Detection confidence in [0, 1]; absent for hand-drawn markings.
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Whether the crop removes this marking entirely.
    #[serde(default)]
    pub will_be_cropped_out: bool,
    /// Whether any part of this marking survives the crop.
    #[serde(default)]
    pub remains_visible_after_crop: bool,
}

/// One image of the dataset together with its caption and annotations.
///
/// Records are owned by the collection scan; the filter engine treats them
/// as read-only snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct ImageRecord {
    /// Full path of the image file.
    pub path: String,
    /// File name including the extension.
    pub name: String,
    /// Directory containing the image file.
    pub directory: String,
    /// The tag-separated caption string as stored in the sidecar text file.
    pub caption: String,
    /// Distinct tags split out of the caption, in caption order.
    pub tags: Vec<String>,
    /// Pixel dimensions; 0x0 when the image header could not be read.
    pub width: u32,
    pub height: u32,
    /// Star rating from the sidecar metadata, 0 when unrated.
    pub stars: u32,
    pub markings: Vec<Marking>,
    /// File modification time, used only for display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Local>>,
}

impl ImageRecord {
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    pub fn caption_chars(&self) -> usize {
        self.caption.chars().count()
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn has_caption(&self) -> bool {
        !self.caption.is_empty()
    }
}

/// Counts caption tokens the way the captioning model would.
///
/// The real tokenizer belongs to whichever model the captions target, so it
/// is injected; [`ApproxTokenCounter`] is a serviceable stand-in when no
/// model tokenizer is available.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// Approximate token counter: words and standalone punctuation runs each
/// count as one token.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxTokenCounter;

impl TokenCounter for ApproxTokenCounter {
    fn count(&self, text: &str) -> usize {
        let mut count = 0;
        let mut prev_alnum = false;
        let mut prev_punct = false;
        for c in text.chars() {
            if c.is_whitespace() {
                prev_alnum = false;
                prev_punct = false;
            } else if c.is_alphanumeric() {
                if !prev_alnum {
                    count += 1;
                }
                prev_alnum = true;
                prev_punct = false;
            } else {
                if !prev_punct {
                    count += 1;
                }
                prev_alnum = false;
                prev_punct = true;
            }
        }
        count
    }
}
