//! Capability announcement sent in the HELO payload.
//!
//! Capabilities are an ordered, comma-separated token list. The server treats
//! it as opaque strings, so rendering must match the spellings LMS matches on
//! (including the `HasDisableDac` casing).
//!
//! # Invariants
//!
//! - Adding a predefined capability whose tag is already present removes the
//!   earlier entry and appends the new one.
//! - Custom entries are never deduplicated.
//! - Rendering emits entries in insertion order.

use std::{fmt, mem};

use crate::errors::CapabilityError;

/// One entry of the capability announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    /// Windows Media Audio decoding.
    Wma,
    /// WMA Professional decoding.
    Wmap,
    /// WMA Lossless decoding.
    Wmal,
    /// Ogg Vorbis decoding.
    Ogg,
    /// FLAC decoding.
    Flc,
    /// Raw PCM playback.
    Pcm,
    /// AIFF playback.
    Aif,
    /// MP3 decoding.
    Mp3,
    /// Apple Lossless decoding.
    Alc,
    /// AAC decoding.
    Aac,
    /// Highest supported sample rate in Hz.
    MaxSampleRate(u32),
    /// Player model token the server keys settings on.
    Model(String),
    /// Human-readable model name.
    ModelName(String),
    /// Rhapsody support marker.
    Rhap,
    /// Player reports accurate playback points.
    AccuratePlayPoints,
    /// Sync group to join on connect.
    SyncGroupId(String),
    /// Player has a digital output.
    HasDigitalOut,
    /// Player has a preamplifier.
    HasPreAmp,
    /// Player can disable its DAC.
    HasDisableDac,
    /// Firmware version string.
    Firmware(String),
    /// Player supports balance adjustment.
    Balance,
    /// Player can fetch streams over HTTPS.
    CanHttps,
    /// Arbitrary raw token passed through verbatim.
    Custom(String),
}

impl Capability {
    /// Build a custom capability from a raw token.
    ///
    /// # Errors
    ///
    /// [`CapabilityError::EmptyToken`] if the token is empty.
    pub fn custom(token: impl Into<String>) -> Result<Self, CapabilityError> {
        let token = token.into();
        if token.is_empty() {
            return Err(CapabilityError::EmptyToken);
        }
        Ok(Self::Custom(token))
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wma => f.write_str("wma"),
            Self::Wmap => f.write_str("wmap"),
            Self::Wmal => f.write_str("wmal"),
            Self::Ogg => f.write_str("ogg"),
            Self::Flc => f.write_str("flc"),
            Self::Pcm => f.write_str("pcm"),
            Self::Aif => f.write_str("aif"),
            Self::Mp3 => f.write_str("mp3"),
            Self::Alc => f.write_str("alc"),
            Self::Aac => f.write_str("aac"),
            Self::MaxSampleRate(rate) => write!(f, "MaxSampleRate={rate}"),
            Self::Model(model) => write!(f, "Model={model}"),
            Self::ModelName(name) => write!(f, "ModelName={name}"),
            Self::Rhap => f.write_str("Rhap"),
            Self::AccuratePlayPoints => f.write_str("AccuratePlayPoints=1"),
            Self::SyncGroupId(id) => write!(f, "SyncgroupID={id}"),
            Self::HasDigitalOut => f.write_str("HasDigitalOut=1"),
            Self::HasPreAmp => f.write_str("HasPreAmp=1"),
            Self::HasDisableDac => f.write_str("HasDisableDac=1"),
            Self::Firmware(version) => write!(f, "Firmware={version}"),
            Self::Balance => f.write_str("Balance=1"),
            Self::CanHttps => f.write_str("CanHTTPS=1"),
            Self::Custom(token) => f.write_str(token),
        }
    }
}

/// Ordered capability list with per-tag deduplication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    entries: Vec<Capability>,
}

impl CapabilitySet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The announcement a generic software player makes.
    #[must_use]
    pub fn default_set() -> Self {
        let mut set = Self::new();
        set.add(Capability::Model("squeezelite".to_string()));
        set.add(Capability::ModelName("SqueezeLite".to_string()));
        set.add(Capability::AccuratePlayPoints);
        set.add(Capability::HasDigitalOut);
        set.add(Capability::HasPreAmp);
        set.add(Capability::HasDisableDac);
        set
    }

    /// Append a capability.
    ///
    /// A predefined capability replaces any earlier entry with the same tag
    /// (the old entry is removed, the new one goes to the end). Custom
    /// entries always append.
    pub fn add(&mut self, capability: Capability) {
        if !matches!(capability, Capability::Custom(_)) {
            self.entries.retain(|entry| mem::discriminant(entry) != mem::discriminant(&capability));
        }
        self.entries.push(capability);
    }

    /// Whether the set holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.entries.iter()
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, entry) in self.entries.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = Self::new();
        for capability in iter {
            set.add(capability);
        }
        set
    }
}
