//! Image assets
//!
//! Each asset walks a small state machine: `Pending` on its current candidate
//! source, then `Loaded` with pixel dimensions or, once every candidate has
//! failed, `Failed`. The host does the actual decoding and reports back; the
//! game only asks whether an asset is ready and how big it is. A failed asset
//! is drawn as a solid placeholder.

/// Logical asset names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetId {
    Ground,
    Scroll,
    Logo,
    Mountains,
    Layer5,
    Layer23,
    Layer1,
    Enemy(u8),
    Run(u8),
    Jump,
}

impl AssetId {
    /// Ordered candidate sources; later entries are tried when earlier fail
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            AssetId::Ground => &["ground.png"],
            AssetId::Scroll => &["scroll.png"],
            AssetId::Logo => &["logo.png", "Logo.png", "LOGO.png", "logo.PNG", "Logo.PNG"],
            AssetId::Mountains => &["layer4.png"],
            AssetId::Layer5 => &["Layer5.png", "layer5.png", "LAYER5.png", "Layer5.PNG", "layer5.PNG"],
            AssetId::Layer23 => &["layer23.png"],
            AssetId::Layer1 => &["layer1.jpg"],
            AssetId::Enemy(0) => &["Assignments.png"],
            AssetId::Enemy(1) => &["Linkedin.png"],
            AssetId::Enemy(_) => &["Canvas.png"],
            AssetId::Run(0) => &["run1.png"],
            AssetId::Run(1) => &["run2.png"],
            AssetId::Run(_) => &["run3.png"],
            AssetId::Jump => &["jump.png"],
        }
    }

    /// Solid fill used while pending or after failure (CSS color)
    pub fn placeholder_color(self) -> &'static str {
        match self {
            AssetId::Ground => "#3b2f2f",
            AssetId::Scroll => "#cbb98d",
            AssetId::Layer1 => "#1d2b53",
            AssetId::Mountains | AssetId::Layer23 | AssetId::Layer5 => "#29366f",
            AssetId::Logo => "#ffffff",
            AssetId::Enemy(_) => "#e04040",
            AssetId::Run(_) | AssetId::Jump => "#ffd166",
        }
    }

    /// Every asset the game draws, in load order
    pub fn all() -> Vec<AssetId> {
        let mut ids = vec![
            AssetId::Ground,
            AssetId::Scroll,
            AssetId::Logo,
            AssetId::Mountains,
            AssetId::Layer5,
            AssetId::Layer23,
            AssetId::Layer1,
        ];
        ids.extend((0..crate::consts::OBSTACLE_VARIANTS).map(AssetId::Enemy));
        ids.extend((0..3).map(AssetId::Run));
        ids.push(AssetId::Jump);
        ids
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssetState {
    Pending { candidate: usize },
    Loaded { source: &'static str, width: u32, height: u32 },
    Failed,
}

#[derive(Debug, Clone)]
pub struct AssetSlot {
    pub id: AssetId,
    state: AssetState,
}

impl AssetSlot {
    pub fn new(id: AssetId) -> Self {
        Self {
            id,
            state: AssetState::Pending { candidate: 0 },
        }
    }

    pub fn state(&self) -> &AssetState {
        &self.state
    }

    /// Source currently being tried
    pub fn pending_source(&self) -> Option<&'static str> {
        match self.state {
            AssetState::Pending { candidate } => self.id.candidates().get(candidate).copied(),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, AssetState::Loaded { .. })
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self.state, AssetState::Pending { .. })
    }

    /// Pixel size once loaded
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self.state {
            AssetState::Loaded { width, height, .. } => Some((width, height)),
            _ => None,
        }
    }

    /// The pending candidate decoded. Zero-sized images count as failures.
    pub fn loaded(&mut self, width: u32, height: u32) -> Option<&'static str> {
        if width == 0 || height == 0 {
            return self.failed();
        }
        let source = self.pending_source()?;
        log::info!("Asset {:?} loaded from {} ({}x{})", self.id, source, width, height);
        self.state = AssetState::Loaded {
            source,
            width,
            height,
        };
        None
    }

    /// The pending candidate failed. Returns the next source to try, if any.
    pub fn failed(&mut self) -> Option<&'static str> {
        let AssetState::Pending { candidate } = self.state else {
            return None;
        };
        let tried = self.id.candidates().get(candidate).copied().unwrap_or("?");
        let next = candidate + 1;
        match self.id.candidates().get(next) {
            Some(source) => {
                log::debug!("Asset {:?}: {} failed, trying {}", self.id, tried, source);
                self.state = AssetState::Pending { candidate: next };
                Some(source)
            }
            None => {
                log::warn!("Asset {:?} unavailable (last tried {}); using placeholder", self.id, tried);
                self.state = AssetState::Failed;
                None
            }
        }
    }
}

/// All game images
#[derive(Debug, Clone)]
pub struct AssetRegistry {
    slots: Vec<AssetSlot>,
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self {
            slots: AssetId::all().into_iter().map(AssetSlot::new).collect(),
        }
    }

    pub fn slot(&self, id: AssetId) -> Option<&AssetSlot> {
        self.slots.iter().find(|s| s.id == id)
    }

    pub fn slot_mut(&mut self, id: AssetId) -> Option<&mut AssetSlot> {
        self.slots.iter_mut().find(|s| s.id == id)
    }

    pub fn is_ready(&self, id: AssetId) -> bool {
        self.slot(id).is_some_and(AssetSlot::is_ready)
    }

    /// Sources to request now, one per pending asset
    pub fn pending(&self) -> impl Iterator<Item = (AssetId, &'static str)> + '_ {
        self.slots
            .iter()
            .filter_map(|s| s.pending_source().map(|src| (s.id, src)))
    }

    pub fn all_settled(&self) -> bool {
        self.slots.iter().all(AssetSlot::is_settled)
    }

    pub fn failed_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.state == AssetState::Failed)
            .count()
    }
}
