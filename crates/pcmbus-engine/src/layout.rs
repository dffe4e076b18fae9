//! WAV default channel ordering for the channel counts backends understand.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    Center,
    Left,
    Right,
    LowFrequency,
    BackLeft,
    BackRight,
    SideLeft,
    SideRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Mono,
    Stereo,
    /// 3.1
    Quad,
    Surround51,
    Surround71,
}

impl ChannelLayout {
    pub fn from_channels(channels: u16) -> Option<Self> {
        match channels {
            1 => Some(Self::Mono),
            2 => Some(Self::Stereo),
            4 => Some(Self::Quad),
            6 => Some(Self::Surround51),
            8 => Some(Self::Surround71),
            _ => None,
        }
    }

    pub fn channels(self) -> u16 {
        self.speakers().len() as u16
    }

    pub fn speakers(self) -> &'static [Speaker] {
        use Speaker::*;
        match self {
            Self::Mono => &[Center],
            Self::Stereo => &[Left, Right],
            Self::Quad => &[Left, Right, Center, LowFrequency],
            Self::Surround51 => &[Left, Right, Center, LowFrequency, BackLeft, BackRight],
            Self::Surround71 => &[
                Left, Right, Center, LowFrequency, BackLeft, BackRight, SideLeft, SideRight,
            ],
        }
    }
}
