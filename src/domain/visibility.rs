// Per-channel show/hide selection; a rendering filter only
use super::channel::ChannelSet;

#[derive(Debug, Clone, PartialEq)]
pub struct Visibility {
    visible: Vec<bool>,
}

impl Visibility {
    /// Every channel starts visible
    pub fn all_visible(channels: &ChannelSet) -> Self {
        Self {
            visible: vec![true; channels.len()],
        }
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.visible.get(index).copied().unwrap_or(false)
    }

    /// Returns false when the index is outside the channel set
    pub fn set(&mut self, index: usize, visible: bool) -> bool {
        match self.visible.get_mut(index) {
            Some(slot) => {
                *slot = visible;
                true
            }
            None => false,
        }
    }
}
