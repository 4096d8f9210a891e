//! Common types for the message-passing environment.

/// Logical identity of a worker in the ring.
///
/// Ranks are dense: a run with `W` workers uses ranks `0..W`, and rank 0
/// is always the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rank(pub usize);

impl Rank {
    /// The coordinating rank.
    pub const COORDINATOR: Rank = Rank(0);

    /// Returns the rank as an index.
    pub fn index(self) -> usize {
        self.0
    }

    /// Returns true for rank 0.
    pub fn is_coordinator(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rank-{}", self.0)
    }
}

/// Protocol step an envelope belongs to.
///
/// Every receive names the tag it expects, so a peer that sends out of
/// the matched order is caught at the receiving side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageTag {
    /// Initial partition from the coordinator.
    Scatter = 1,
    /// Bottom authoritative row travelling down the ring (lands in the receiver's top halo).
    HaloFromUp = 2,
    /// Top authoritative row travelling up the ring (lands in the receiver's bottom halo).
    HaloFromDown = 3,
    /// Final partition back to the coordinator.
    Gather = 4,
    /// End-of-run rendezvous.
    Barrier = 5,
}

impl MessageTag {
    /// Wire byte for this tag.
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Parses a wire byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::Scatter),
            2 => Some(Self::HaloFromUp),
            3 => Some(Self::HaloFromDown),
            4 => Some(Self::Gather),
            5 => Some(Self::Barrier),
            _ => None,
        }
    }
}

/// A tagged block of bytes exchanged between two ranks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Protocol step
    pub tag: MessageTag,

    /// Raw cell bytes (or empty for control messages)
    pub payload: Vec<u8>,
}

impl Envelope {
    /// Creates a new envelope.
    pub fn new(tag: MessageTag, payload: Vec<u8>) -> Self {
        Self { tag, payload }
    }

    /// Creates a payload-free control envelope.
    pub fn control(tag: MessageTag) -> Self {
        Self {
            tag,
            payload: Vec::new(),
        }
    }

    /// Returns the payload size in bytes.
    pub fn size(&self) -> usize {
        self.payload.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_bytes() {
        for tag in [
            MessageTag::Scatter,
            MessageTag::HaloFromUp,
            MessageTag::HaloFromDown,
            MessageTag::Gather,
            MessageTag::Barrier,
        ] {
            assert_eq!(MessageTag::from_byte(tag.as_byte()), Some(tag));
        }
        assert_eq!(MessageTag::from_byte(0), None);
        assert_eq!(MessageTag::from_byte(200), None);
    }

    #[test]
    fn test_rank_display() {
        assert_eq!(Rank(3).to_string(), "rank-3");
        assert!(Rank::COORDINATOR.is_coordinator());
        assert!(!Rank(1).is_coordinator());
    }
}
