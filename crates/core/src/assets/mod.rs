use serde::{Deserialize, Serialize};

use crate::{config::ScrubConfig, Result, ScrollReelError};

/// Location and size of a numbered frame sequence.
///
/// Frame numbers are 1-based on disk (`frame_001.webp` is the first frame);
/// everything else in the crate addresses frames by 0-based index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceSource {
    path: String,
    count: usize,
    extension: String,
    padding: usize,
}

impl SequenceSource {
    pub const DEFAULT_EXTENSION: &'static str = "webp";
    pub const DEFAULT_PADDING: usize = 3;

    pub fn new(path: impl Into<String>, count: usize) -> Result<Self> {
        if count == 0 {
            return Err(ScrollReelError::invalid_config(
                "frame count must be a positive integer",
            ));
        }

        Ok(Self {
            path: path.into(),
            count,
            extension: Self::DEFAULT_EXTENSION.to_string(),
            padding: Self::DEFAULT_PADDING,
        })
    }

    /// Builds a source from the raw `data-frames-path` and
    /// `data-frames-count` attribute values of a canvas element.
    pub fn from_attributes(
        path: Option<&str>,
        count: Option<&str>,
        scrub: &ScrubConfig,
    ) -> Result<Self> {
        let path = path
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .ok_or_else(|| ScrollReelError::invalid_config("missing frames path"))?;
        let raw_count = count
            .map(str::trim)
            .ok_or_else(|| ScrollReelError::invalid_config("missing frames count"))?;
        let count: i64 = raw_count.parse().map_err(|_| {
            ScrollReelError::invalid_config(format!("unparsable frames count `{raw_count}`"))
        })?;
        if count <= 0 {
            return Err(ScrollReelError::invalid_config(format!(
                "frame count must be a positive integer, got {count}"
            )));
        }

        Ok(Self::new(path, count as usize)?
            .with_extension(scrub.frame_extension.clone())
            .with_padding(scrub.frame_padding))
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_padding(mut self, padding: usize) -> Self {
        self.padding = padding.max(1);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// File name of the 1-based frame `number`, e.g. `frame_007.webp`.
    pub fn frame_name(&self, number: usize) -> String {
        format!(
            "frame_{number:0width$}.{ext}",
            width = self.padding,
            ext = self.extension
        )
    }

    /// URL of the 1-based frame `number` below the sequence path.
    pub fn frame_url(&self, number: usize) -> String {
        format!(
            "{}/{}",
            self.path.trim_end_matches('/'),
            self.frame_name(number)
        )
    }
}

/// Load status of a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameStatus {
    Pending,
    Loaded,
    Failed,
}

/// How a frame request settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadOutcome {
    Loaded,
    Failed,
}

impl From<LoadOutcome> for FrameStatus {
    fn from(value: LoadOutcome) -> Self {
        match value {
            LoadOutcome::Loaded => FrameStatus::Loaded,
            LoadOutcome::Failed => FrameStatus::Failed,
        }
    }
}

/// Aggregate loading progress of a [`FrameSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSetState {
    /// Frames that settled either way. Never decreases.
    pub settled: usize,
    pub total: usize,
    /// Every frame settled. Failed frames count, so this does not imply
    /// every frame is drawable.
    pub fully_loaded: bool,
}

/// Per-frame load bookkeeping for an image sequence.
#[derive(Debug, Clone)]
pub struct FrameSet {
    statuses: Vec<FrameStatus>,
    settled: usize,
}

impl FrameSet {
    pub fn new(count: usize) -> Self {
        Self {
            statuses: vec![FrameStatus::Pending; count],
            settled: 0,
        }
    }

    /// Records how frame `index` settled and returns the new aggregate.
    ///
    /// Only the first result per frame counts; repeats and out of range
    /// indices leave the aggregate untouched.
    pub fn record_result(&mut self, index: usize, outcome: LoadOutcome) -> FrameSetState {
        match self.statuses.get_mut(index) {
            Some(status @ FrameStatus::Pending) => {
                *status = outcome.into();
                self.settled += 1;
            }
            Some(_) => tracing::debug!(frame = index, "ignoring repeated load result"),
            None => {
                tracing::warn!(frame = index, total = self.total(), "load result for unknown frame")
            }
        }
        self.state()
    }

    pub fn state(&self) -> FrameSetState {
        FrameSetState {
            settled: self.settled,
            total: self.total(),
            fully_loaded: self.is_fully_loaded(),
        }
    }

    pub fn status(&self, index: usize) -> Option<FrameStatus> {
        self.statuses.get(index).copied()
    }

    pub fn total(&self) -> usize {
        self.statuses.len()
    }

    pub fn settled(&self) -> usize {
        self.settled
    }

    pub fn loaded(&self) -> usize {
        self.count(FrameStatus::Loaded)
    }

    pub fn is_fully_loaded(&self) -> bool {
        self.settled == self.total()
    }

    /// Indices of frames that failed to load.
    pub fn failed(&self) -> Vec<usize> {
        self.statuses
            .iter()
            .enumerate()
            .filter(|(_, status)| **status == FrameStatus::Failed)
            .map(|(index, _)| index)
            .collect()
    }

    fn count(&self, wanted: FrameStatus) -> usize {
        self.statuses.iter().filter(|status| **status == wanted).count()
    }
}
