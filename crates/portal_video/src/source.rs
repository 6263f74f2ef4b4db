//! Video sources

use parking_lot::RwLock;

use portal_xr::MediaSourceId;

/// How much media data is available, in increasing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReadyState {
    HaveNothing = 0,
    HaveMetadata = 1,
    HaveCurrentData = 2,
    HaveFutureData = 3,
    HaveEnoughData = 4,
}

impl ReadyState {
    /// A frame is decoded and can be sampled
    pub fn has_frame(&self) -> bool {
        *self >= Self::HaveCurrentData
    }
}

/// A streaming media element owned by the host.
///
/// The video layer code only reads from it, apart from asking it to play.
pub trait VideoSource: Send + Sync {
    fn media_id(&self) -> MediaSourceId;
    fn ready_state(&self) -> ReadyState;
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn play(&self);
    fn is_playing(&self) -> bool;
}

#[derive(Debug)]
struct ElementState {
    ready_state: ReadyState,
    playing: bool,
    width: u32,
    height: u32,
}

/// In-process media element
#[derive(Debug)]
pub struct VideoElement {
    id: MediaSourceId,
    url: String,
    state: RwLock<ElementState>,
}

impl VideoElement {
    pub fn new(url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: MediaSourceId::next(),
            url: url.into(),
            state: RwLock::new(ElementState {
                ready_state: ReadyState::HaveNothing,
                playing: false,
                width,
                height,
            }),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Simulate decoder progress
    pub fn set_ready_state(&self, ready_state: ReadyState) {
        self.state.write().ready_state = ready_state;
    }

    pub fn pause(&self) {
        self.state.write().playing = false;
    }
}

impl VideoSource for VideoElement {
    fn media_id(&self) -> MediaSourceId {
        self.id
    }

    fn ready_state(&self) -> ReadyState {
        self.state.read().ready_state
    }

    fn width(&self) -> u32 {
        self.state.read().width
    }

    fn height(&self) -> u32 {
        self.state.read().height
    }

    fn play(&self) {
        let mut state = self.state.write();
        if !state.playing {
            log::debug!("Playing {}", self.url);
        }
        state.playing = true;
        if state.ready_state < ReadyState::HaveEnoughData {
            state.ready_state = ReadyState::HaveEnoughData;
        }
    }

    fn is_playing(&self) -> bool {
        self.state.read().playing
    }
}
