//! Core library for the Scrollreel landing page.
//!
//! The crate turns scroll position into media position: it maps element
//! geometry to a normalised progress value, pushes that value into video and
//! image sequence scrubbers once per rendered frame, and decides when each
//! scrubber is built. It knows nothing about the DOM; hosts implement the
//! small traits in [`media`], [`render`] and [`timeline`] and feed events in.

pub mod activation;
pub mod assets;
pub mod config;
pub mod error;
pub mod headless;
pub mod loader;
pub mod mapping;
pub mod media;
pub mod page;
pub mod render;
pub mod reveal;
pub mod snow;
pub mod timeline;

pub use activation::{Activation, ActivationPolicy, DeviceClass, LazyActivator, MotionPreference};
pub use assets::{FrameSet, FrameSetState, FrameStatus, LoadOutcome, SequenceSource};
pub use config::{ActivationConfig, AppConfig, RevealConfig, ScrubConfig, SnowConfig};
pub use error::{Result, ScrollReelError};
pub use loader::{CancellationToken, FrameQueue, LoadStrategy};
pub use mapping::{scroll_progress, ElementRect, Progress};
pub use media::{
    FrameFetcher, ImageSequenceScrubber, MediaKind, MediaSource, SequenceState, VideoElement,
    VideoScrubber, VideoState,
};
pub use page::PageContext;
pub use render::{FrameCanvas, FrameImage, Rect, Size};
pub use reveal::RevealTracker;
pub use snow::{SnowField, Snowflake};
pub use timeline::{ElementGeometry, ElementId, FrameGate, ScrollDriver};
